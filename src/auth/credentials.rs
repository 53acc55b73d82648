//! Bearer credential pair issued at login and rotated by refresh exchanges.

// self
use crate::{_prelude::*, auth::secret::TokenSecret};

const DEFAULT_TOKEN_TYPE: &str = "Bearer";

/// Access/refresh token pair persisted in session state and replaced atomically on refresh.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPair {
	/// Short-lived bearer credential attached to outgoing requests.
	pub access_token: TokenSecret,
	/// Longer-lived credential exchanged for a new access token, if one was issued.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub refresh_token: Option<TokenSecret>,
	/// Token type echoed into the `Authorization` header (usually `Bearer`).
	#[serde(default = "default_token_type")]
	pub token_type: String,
}
impl CredentialPair {
	/// Creates a pair holding only an access token with the default `Bearer` type.
	pub fn new(access_token: impl Into<String>) -> Self {
		Self {
			access_token: TokenSecret::new(access_token),
			refresh_token: None,
			token_type: DEFAULT_TOKEN_TYPE.into(),
		}
	}

	/// Attaches the refresh token issued alongside the access token.
	pub fn with_refresh_token(mut self, token: impl Into<String>) -> Self {
		self.refresh_token = Some(TokenSecret::new(token));

		self
	}

	/// Overrides the token type reported by the issuing endpoint.
	pub fn with_token_type(mut self, token_type: impl Into<String>) -> Self {
		self.token_type = token_type.into();

		self
	}

	/// Formats the `Authorization` header value for this pair.
	pub fn authorization_value(&self) -> String {
		format!("{} {}", self.token_type, self.access_token.expose())
	}
}
impl Debug for CredentialPair {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialPair")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("token_type", &self.token_type)
			.finish()
	}
}

fn default_token_type() -> String {
	DEFAULT_TOKEN_TYPE.into()
}
