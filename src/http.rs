//! Transport primitives for the refresh token exchange.
//!
//! The module exposes [`RefreshTransport`] so downstream code can plug custom HTTP stacks
//! into the relay, plus the default reqwest-backed client gated behind the `reqwest`
//! feature. The exchange contract is deliberately small: one `POST` against the fixed
//! refresh path carrying the refresh token, answered by a full credential pair.

// self
use crate::{_prelude::*, auth::CredentialPair, error::ConfigError};
#[cfg(feature = "reqwest")]
use crate::error::{EndpointError, TransportError};

/// Path of the refresh endpoint relative to the configured base URL.
pub const REFRESH_PATH: &str = "api/auth/refresh";

/// Boxed future returned by [`RefreshTransport::exchange`].
pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of executing the refresh token exchange.
///
/// The trait is the relay's only dependency on an HTTP stack. Implementations live behind
/// `Arc<C>` and must be `Send + Sync + 'static` so a single relay can be shared across
/// tasks; the returned futures must be `Send` for the same reason.
pub trait RefreshTransport
where
	Self: 'static + Send + Sync,
{
	/// Exchanges a refresh token for a full replacement credential pair.
	///
	/// Any non-success response must surface as an error; the relay collapses every
	/// transport failure into a "no new token" outcome.
	fn exchange<'a>(&'a self, refresh_token: &'a str) -> TransportFuture<'a, CredentialPair>;
}

/// Refresh endpoint location derived from an API base URL.
#[derive(Clone, Debug)]
pub struct RefreshEndpoint {
	base: Url,
}
impl RefreshEndpoint {
	/// Wraps the API base URL the refresh path is resolved against.
	pub fn new(base: Url) -> Self {
		Self { base }
	}

	/// Resolves the full refresh endpoint URL.
	///
	/// The base path is treated as a directory, so `https://api.example.com/v1` resolves
	/// to `https://api.example.com/v1/api/auth/refresh`.
	pub fn url(&self) -> Result<Url, ConfigError> {
		let mut base = self.base.clone();

		if !base.path().ends_with('/') {
			base.set_path(&format!("{}/", base.path()));
		}

		base.join(REFRESH_PATH).map_err(|e| ConfigError::InvalidBaseUrl { source: e })
	}
}

/// Request body sent to the refresh endpoint.
#[cfg(feature = "reqwest")]
#[derive(Serialize)]
struct RefreshRequestBody<'a> {
	refresh_token: &'a str,
}

/// Default [`RefreshTransport`] backed by a shared [`ReqwestClient`].
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestRefreshClient {
	client: ReqwestClient,
	endpoint: RefreshEndpoint,
}
#[cfg(feature = "reqwest")]
impl ReqwestRefreshClient {
	/// Creates a client with a default reqwest handle for the provided API base URL.
	pub fn new(base_url: Url) -> Self {
		Self::with_client(ReqwestClient::new(), base_url)
	}

	/// Wraps an existing [`ReqwestClient`], reusing its connection pool.
	pub fn with_client(client: ReqwestClient, base_url: Url) -> Self {
		Self { client, endpoint: RefreshEndpoint::new(base_url) }
	}
}
#[cfg(feature = "reqwest")]
impl RefreshTransport for ReqwestRefreshClient {
	fn exchange<'a>(&'a self, refresh_token: &'a str) -> TransportFuture<'a, CredentialPair> {
		Box::pin(async move {
			let url = self.endpoint.url()?;
			let response = self
				.client
				.post(url)
				.json(&RefreshRequestBody { refresh_token })
				.send()
				.await
				.map_err(TransportError::from)?;
			let status = response.status();
			let bytes = response.bytes().await.map_err(TransportError::from)?;

			if !status.is_success() {
				return Err(EndpointError::UnexpectedResponse {
					message: body_preview(&bytes),
					status: Some(status.as_u16()),
				}
				.into());
			}

			let mut deserializer = serde_json::Deserializer::from_slice(&bytes);
			let pair: CredentialPair = serde_path_to_error::deserialize(&mut deserializer)
				.map_err(|source| EndpointError::ResponseParse {
					source,
					status: Some(status.as_u16()),
				})?;

			Ok(pair)
		})
	}
}

#[cfg(feature = "reqwest")]
fn body_preview(bytes: &[u8]) -> String {
	const LIMIT: usize = 256;

	let text = String::from_utf8_lossy(bytes);
	let trimmed = text.trim();

	if trimmed.chars().count() <= LIMIT {
		trimmed.into()
	} else {
		trimmed.chars().take(LIMIT).collect()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn endpoint(base: &str) -> RefreshEndpoint {
		RefreshEndpoint::new(Url::parse(base).expect("Base URL fixture should parse."))
	}

	#[test]
	fn refresh_url_appends_the_fixed_path() {
		let resolved =
			endpoint("https://api.example.com").url().expect("Refresh URL should resolve.");

		assert_eq!(resolved.as_str(), "https://api.example.com/api/auth/refresh");
	}

	#[test]
	fn refresh_url_treats_base_path_as_directory() {
		let resolved =
			endpoint("https://api.example.com/v1").url().expect("Refresh URL should resolve.");

		assert_eq!(resolved.as_str(), "https://api.example.com/v1/api/auth/refresh");
	}

	#[cfg(feature = "reqwest")]
	#[test]
	fn body_preview_truncates_long_payloads() {
		let long = "x".repeat(1_000);
		let preview = body_preview(long.as_bytes());

		assert_eq!(preview.chars().count(), 256);
	}
}
