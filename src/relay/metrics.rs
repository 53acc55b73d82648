// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for operation attempts and coordinated refreshes.
#[derive(Debug, Default)]
pub struct RelayMetrics {
	operation_attempts: AtomicU64,
	refresh_attempts: AtomicU64,
	refresh_joins: AtomicU64,
	refresh_success: AtomicU64,
	refresh_failure: AtomicU64,
}
impl RelayMetrics {
	/// Returns the total number of operation invocations, retries included.
	pub fn operation_attempts(&self) -> u64 {
		self.operation_attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of refreshes that actually hit the network.
	pub fn refresh_attempts(&self) -> u64 {
		self.refresh_attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of callers that joined an in-flight refresh instead of starting one.
	pub fn refresh_joins(&self) -> u64 {
		self.refresh_joins.load(Ordering::Relaxed)
	}

	/// Returns the number of refreshes that rotated and persisted a new pair.
	pub fn refresh_successes(&self) -> u64 {
		self.refresh_success.load(Ordering::Relaxed)
	}

	/// Returns the number of refreshes that collapsed to "no new token".
	pub fn refresh_failures(&self) -> u64 {
		self.refresh_failure.load(Ordering::Relaxed)
	}

	pub(crate) fn record_operation_attempt(&self) {
		self.operation_attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh_attempt(&self) {
		self.refresh_attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh_join(&self) {
		self.refresh_joins.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh_success(&self) {
		self.refresh_success.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh_failure(&self) {
		self.refresh_failure.fetch_add(1, Ordering::Relaxed);
	}
}
