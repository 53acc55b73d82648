//! Storage contracts and built-in stores for the persisted session blob.
//!
//! The blob mirrors the `auth-storage` record kept by the browser front end: a versioned
//! envelope whose `state` carries the credential pair, the signed-in user, and any other
//! top-level fields the application persists. Refresh rewrites replace `state.tokens` only;
//! everything else must survive the read-modify-write untouched.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{_prelude::*, auth::CredentialPair};

/// Storage key naming the persisted session blob.
pub const STORAGE_KEY: &str = "auth-storage";

/// Boxed future returned by [`SessionStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Persistence contract for the process-wide session blob.
pub trait SessionStore
where
	Self: Send + Sync,
{
	/// Loads the persisted blob, if one exists.
	fn load(&self) -> StoreFuture<'_, Option<SessionBlob>>;

	/// Persists or replaces the whole blob (login).
	fn save(&self, blob: SessionBlob) -> StoreFuture<'_, ()>;

	/// Replaces `state.tokens` in place, leaving every other field untouched.
	///
	/// When no blob exists yet, a fresh one is created around the provided pair so a
	/// rotation is never silently dropped.
	fn replace_tokens(&self, tokens: CredentialPair) -> StoreFuture<'_, ()>;

	/// Removes the persisted blob (logout).
	fn clear(&self) -> StoreFuture<'_, ()>;
}

/// Error type produced by [`SessionStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Versioned envelope persisted under [`STORAGE_KEY`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionBlob {
	/// Schema version of the persisted record.
	#[serde(default)]
	pub version: u32,
	/// Application session state.
	pub state: SessionState,
}
impl SessionBlob {
	/// Schema version written by this crate.
	pub const CURRENT_VERSION: u32 = 1;

	/// Wraps session state in a current-version envelope.
	pub fn new(state: SessionState) -> Self {
		Self { version: Self::CURRENT_VERSION, state }
	}

	/// Performs the targeted token replacement used by refresh rewrites.
	pub fn replace_tokens(&mut self, tokens: CredentialPair) {
		self.state.tokens = Some(tokens);
	}
}

/// Session state persisted by the application.
///
/// Unrecognized top-level fields are retained in `extra` so a partial update never clobbers
/// state written by other parts of the application.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
	/// Credential pair for the signed-in session, if any.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub tokens: Option<CredentialPair>,
	/// Opaque user payload owned by the application.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub user: Option<JsonValue>,
	/// Whether the session is considered signed in.
	#[serde(default, rename = "isAuthenticated")]
	pub is_authenticated: bool,
	/// Unrecognized top-level fields, preserved verbatim across rewrites.
	#[serde(flatten)]
	pub extra: BTreeMap<String, JsonValue>,
}
