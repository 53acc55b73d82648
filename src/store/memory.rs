//! Thread-safe in-memory [`SessionStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::CredentialPair,
	store::{SessionBlob, SessionState, SessionStore, StoreError, StoreFuture},
};

type Slot = Arc<RwLock<Option<SessionBlob>>>;

/// Thread-safe storage backend that keeps the session blob in-process for tests and demos.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(Slot);
impl MemoryStore {
	fn load_now(slot: Slot) -> Option<SessionBlob> {
		slot.read().clone()
	}

	fn save_now(slot: Slot, blob: SessionBlob) -> Result<(), StoreError> {
		*slot.write() = Some(blob);

		Ok(())
	}

	fn replace_tokens_now(slot: Slot, tokens: CredentialPair) -> Result<(), StoreError> {
		let mut guard = slot.write();

		match guard.as_mut() {
			Some(blob) => blob.replace_tokens(tokens),
			None =>
				*guard = Some(SessionBlob::new(SessionState {
					tokens: Some(tokens),
					..Default::default()
				})),
		}

		Ok(())
	}

	fn clear_now(slot: Slot) -> Result<(), StoreError> {
		*slot.write() = None;

		Ok(())
	}
}
impl SessionStore for MemoryStore {
	fn load(&self) -> StoreFuture<'_, Option<SessionBlob>> {
		let slot = self.0.clone();

		Box::pin(async move { Ok(Self::load_now(slot)) })
	}

	fn save(&self, blob: SessionBlob) -> StoreFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move { Self::save_now(slot, blob) })
	}

	fn replace_tokens(&self, tokens: CredentialPair) -> StoreFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move { Self::replace_tokens_now(slot, tokens) })
	}

	fn clear(&self) -> StoreFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move { Self::clear_now(slot) })
	}
}
