//! Relay-level error types shared across the coordinator, transport, and stores.

// self
use crate::_prelude::*;

/// Relay-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical relay error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Refresh endpoint misbehavior (unexpected status, malformed body).
	#[error(transparent)]
	Endpoint(#[from] EndpointError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Bearer token was rejected by the upstream API; the designated retriable kind.
	#[error("Bearer token was rejected: {reason}.")]
	Unauthorized {
		/// Upstream- or caller-supplied reason string.
		reason: String,
	},
}
impl Error {
	/// Builds the designated retriable error kind from a reason string.
	pub fn unauthorized(reason: impl Into<String>) -> Self {
		Self::Unauthorized { reason: reason.into() }
	}

	/// Returns `true` when this is the designated retriable kind; backs the default
	/// [`RetryPolicy`](crate::policy::RetryPolicy) predicate.
	pub fn is_unauthorized(&self) -> bool {
		matches!(self, Self::Unauthorized { .. })
	}
}

/// Configuration and validation failures raised by the relay.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Refresh endpoint URL cannot be derived from the configured base.
	#[error("Base URL cannot be joined with the refresh path.")]
	InvalidBaseUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}

/// Failures reported by the refresh endpoint itself.
#[derive(Debug, ThisError)]
pub enum EndpointError {
	/// Refresh endpoint answered with a non-success status.
	#[error("Refresh endpoint returned an unexpected response: {message}.")]
	UnexpectedResponse {
		/// Truncated body preview summarizing the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Refresh endpoint responded with malformed JSON that could not be parsed.
	#[error("Refresh endpoint returned malformed JSON.")]
	ResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the refresh endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the refresh endpoint.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn unauthorized_helper_matches_only_its_kind() {
		let unauthorized = Error::unauthorized("token expired");

		assert!(unauthorized.is_unauthorized());
		assert_eq!(unauthorized.to_string(), "Bearer token was rejected: token expired.");

		let io = Error::Transport(TransportError::Io(std::io::Error::other("timed out")));

		assert!(!io.is_unauthorized());
	}
}
