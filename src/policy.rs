//! Retry policy evaluated per relay invocation.

// self
use crate::_prelude::*;

type RetriablePredicate = Arc<dyn Fn(&Error) -> bool + Send + Sync>;

/// Immutable retry configuration for a single [`Relay`](crate::relay::Relay) invocation.
///
/// The defaults reproduce the reference behavior: one retry, a one-second pause between
/// attempts, and only [`Error::Unauthorized`] treated as retriable.
#[derive(Clone)]
pub struct RetryPolicy {
	/// Maximum number of retries after the initial attempt.
	pub max_retries: u32,
	/// Pause inserted between a coordinated refresh and the next attempt.
	pub retry_delay: Duration,
	retriable: RetriablePredicate,
}
impl RetryPolicy {
	const DEFAULT_MAX_RETRIES: u32 = 1;
	const DEFAULT_RETRY_DELAY: Duration = Duration::milliseconds(1_000);

	/// Creates a policy with the reference defaults.
	pub fn new() -> Self {
		Self {
			max_retries: Self::DEFAULT_MAX_RETRIES,
			retry_delay: Self::DEFAULT_RETRY_DELAY,
			retriable: Arc::new(Error::is_unauthorized),
		}
	}

	/// Overrides the retry budget.
	pub fn with_max_retries(mut self, max_retries: u32) -> Self {
		self.max_retries = max_retries;

		self
	}

	/// Overrides the inter-retry delay (negative values clamp to zero).
	pub fn with_retry_delay(mut self, delay: Duration) -> Self {
		self.retry_delay = if delay.is_negative() { Duration::ZERO } else { delay };

		self
	}

	/// Overrides the predicate deciding which errors are worth a refresh-and-retry.
	pub fn with_retriable(
		mut self,
		predicate: impl Fn(&Error) -> bool + Send + Sync + 'static,
	) -> Self {
		self.retriable = Arc::new(predicate);

		self
	}

	/// Evaluates the retriable predicate for a failed attempt.
	pub fn is_retriable(&self, error: &Error) -> bool {
		(self.retriable)(error)
	}
}
impl Default for RetryPolicy {
	fn default() -> Self {
		Self::new()
	}
}
impl Debug for RetryPolicy {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RetryPolicy")
			.field("max_retries", &self.max_retries)
			.field("retry_delay", &self.retry_delay)
			.field("retriable", &"<predicate>")
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::error::TransportError;

	#[test]
	fn defaults_match_the_reference_behavior() {
		let policy = RetryPolicy::default();

		assert_eq!(policy.max_retries, 1);
		assert_eq!(policy.retry_delay, Duration::milliseconds(1_000));
		assert!(policy.is_retriable(&Error::unauthorized("expired")));
		assert!(!policy
			.is_retriable(&Error::Transport(TransportError::Io(std::io::Error::other("down")))));
	}

	#[test]
	fn negative_delay_clamps_to_zero() {
		let policy = RetryPolicy::new().with_retry_delay(Duration::milliseconds(-5));

		assert_eq!(policy.retry_delay, Duration::ZERO);
	}

	#[test]
	fn custom_predicate_replaces_the_default() {
		let policy = RetryPolicy::new().with_retriable(|error| {
			matches!(error, Error::Transport(_)) || error.is_unauthorized()
		});

		assert!(policy
			.is_retriable(&Error::Transport(TransportError::Io(std::io::Error::other("down")))));
	}
}
