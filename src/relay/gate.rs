//! Process-wide singleflight gate for coordinated token refreshes.
//!
//! The gate pairs an async mutex (the in-flight critical section) with a generation-stamped
//! memo of the most recent settled outcome. A caller snapshots the generation before
//! queueing on the mutex; if the generation has advanced by the time the lock is acquired,
//! a refresh settled while the caller waited and its outcome is joined instead of issuing a
//! second network call. The memo is written while the lock is still held, so waiters never
//! observe a refresh as settled before its persistence step has completed.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Settled result of a coordinated refresh.
#[derive(Clone, Debug)]
pub(crate) enum RefreshOutcome {
	/// The exchange succeeded and the rotated pair was persisted.
	Rotated(TokenSecret),
	/// No new token could be obtained; the cause was logged and swallowed.
	Unavailable,
}
impl RefreshOutcome {
	/// Extracts the rotated access token, if any.
	pub(crate) fn into_token(self) -> Option<String> {
		match self {
			Self::Rotated(secret) => Some(secret.into_inner()),
			Self::Unavailable => None,
		}
	}
}

#[derive(Debug, Default)]
struct RefreshMemo {
	generation: u64,
	settled: Option<RefreshOutcome>,
}

/// Singleflight guard shared by every caller of the coordinated refresh.
#[derive(Debug, Default)]
pub(crate) struct RefreshGate {
	flight: AsyncMutex<()>,
	memo: Mutex<RefreshMemo>,
}
impl RefreshGate {
	/// Snapshots the generation a caller observed before queueing on the gate.
	pub(crate) fn observed_generation(&self) -> u64 {
		self.memo.lock().generation
	}

	/// Acquires the in-flight critical section.
	pub(crate) async fn lock(&self) -> async_lock::MutexGuard<'_, ()> {
		self.flight.lock().await
	}

	/// Returns the settled outcome when a refresh completed after `observed` was taken.
	pub(crate) fn joined_outcome(&self, observed: u64) -> Option<RefreshOutcome> {
		let memo = self.memo.lock();

		if memo.generation == observed { None } else { memo.settled.clone() }
	}

	/// Records a settled refresh; must be called while the flight lock is held.
	pub(crate) fn settle(&self, outcome: RefreshOutcome) {
		let mut memo = self.memo.lock();

		memo.generation = memo.generation.wrapping_add(1);
		memo.settled = Some(outcome);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn waiter_joins_a_refresh_settled_while_queued() {
		let gate = RefreshGate::default();
		let observed = gate.observed_generation();

		{
			let _flight = gate.lock().await;

			assert!(gate.joined_outcome(observed).is_none());

			gate.settle(RefreshOutcome::Rotated(TokenSecret::new("fresh")));
		}

		let joined = gate
			.joined_outcome(observed)
			.expect("Generation advanced while queued, so the outcome should be joined.");

		assert_eq!(joined.into_token().as_deref(), Some("fresh"));
	}

	#[tokio::test]
	async fn later_caller_triggers_a_fresh_refresh() {
		let gate = RefreshGate::default();

		{
			let _flight = gate.lock().await;

			gate.settle(RefreshOutcome::Unavailable);
		}

		// A snapshot taken after settlement sees the current generation and must not join.
		let observed = gate.observed_generation();

		assert!(gate.joined_outcome(observed).is_none());
	}

	#[tokio::test]
	async fn failed_refreshes_are_shared_with_waiters() {
		let gate = RefreshGate::default();
		let observed = gate.observed_generation();

		{
			let _flight = gate.lock().await;

			gate.settle(RefreshOutcome::Unavailable);
		}

		let joined = gate
			.joined_outcome(observed)
			.expect("Waiters should observe the settled failure outcome.");

		assert!(joined.into_token().is_none());
	}
}
