//! Retry/refresh coordinator for bearer-authenticated requests: deduplicated token refreshes,
//! merge-safe session persistence, and transport-aware observability in one crate.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod error;
pub mod http;
pub mod obs;
pub mod policy;
pub mod relay;
pub mod store;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::CredentialPair,
		http::ReqwestRefreshClient,
		relay::Relay,
		store::{MemoryStore, SessionBlob, SessionState, SessionStore},
	};

	/// Relay type alias used by reqwest-backed integration tests.
	pub type ReqwestTestRelay = Relay<ReqwestRefreshClient>;

	/// Constructs a [`Relay`] backed by an in-memory session store and the reqwest transport
	/// used across integration tests.
	pub fn build_reqwest_test_relay(base_url: Url) -> (ReqwestTestRelay, Arc<MemoryStore>) {
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn SessionStore> = store_backend.clone();
		let relay = Relay::new(store, base_url);

		(relay, store_backend)
	}

	/// Builds a session blob holding the provided token pair plus a `user` marker field, so
	/// tests can assert that unrelated state survives refresh rewrites.
	pub fn seeded_session(access: &str, refresh: &str) -> SessionBlob {
		let state = SessionState {
			tokens: Some(CredentialPair::new(access).with_refresh_token(refresh)),
			user: Some(serde_json::json!({ "id": "user-1", "name": "Test User" })),
			is_authenticated: true,
			extra: Default::default(),
		};

		SessionBlob::new(state)
	}
}

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::Value as JsonValue;
	pub use thiserror::Error as ThisError;
	pub use time::Duration;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use httpmock as _;
