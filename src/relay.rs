//! The authenticated-request coordinator: attempt loop, coordinated refresh, persistence glue.
//!
//! [`Relay::execute`] wraps an arbitrary bearer-token operation; on an unauthorized failure
//! it performs one coordinated refresh and retries with the rotated token. The refresh is a
//! process-wide singleflight: concurrent callers that need a new token at the same time
//! share a single network exchange and observe the same outcome. Successful exchanges are
//! persisted through [`SessionStore::replace_tokens`] before any waiter can observe them;
//! failed exchanges are logged and collapse to "no new token", so the caller always sees
//! either the operation's success or its original error.

mod gate;
mod metrics;

pub use metrics::RelayMetrics;

use gate::{RefreshGate, RefreshOutcome};

// self
use crate::{
	_prelude::*,
	http::RefreshTransport,
	obs::{self, FlowKind, FlowOutcome, FlowSpan, record_refresh_collapse},
	policy::RetryPolicy,
	store::SessionStore,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestRefreshClient;

/// Relay specialized for the crate's default reqwest transport.
#[cfg(feature = "reqwest")]
pub type ReqwestRelay = Relay<ReqwestRefreshClient>;

/// Coordinates authenticated requests against a single refresh endpoint.
///
/// The relay owns the refresh transport, the session store, and the singleflight gate, so
/// callers only supply the operation and the access token they currently hold. Callers
/// never see refresh mechanics: they receive the operation's result, or the original
/// failure when recovery was impossible.
#[derive(Clone)]
pub struct Relay<C>
where
	C: ?Sized + RefreshTransport,
{
	/// Transport used for every refresh token exchange.
	pub transport: Arc<C>,
	/// Session store holding the persisted credential pair.
	pub store: Arc<dyn SessionStore>,
	/// Shared counters for operation attempts and refresh outcomes.
	pub metrics: Arc<RelayMetrics>,
	gate: Arc<RefreshGate>,
}
impl<C> Relay<C>
where
	C: ?Sized + RefreshTransport,
{
	/// Creates a relay that reuses the caller-provided transport.
	pub fn with_transport(store: Arc<dyn SessionStore>, transport: impl Into<Arc<C>>) -> Self {
		Self {
			transport: transport.into(),
			store,
			metrics: Default::default(),
			gate: Default::default(),
		}
	}

	/// Runs `operation` with the default [`RetryPolicy`].
	pub async fn execute<T, F, Fut>(&self, token: impl Into<String>, operation: F) -> Result<T>
	where
		F: FnMut(String) -> Fut,
		Fut: Future<Output = Result<T>>,
	{
		self.execute_with_policy(token, RetryPolicy::default(), operation).await
	}

	/// Runs `operation` under the provided policy, refreshing and retrying on retriable
	/// failures.
	///
	/// Guarantees: `operation` is invoked at most `max_retries + 1` times; a non-retriable
	/// error propagates unchanged after the first occurrence; attempts are strictly
	/// sequential, each retry starting only after the coordinated refresh (and the
	/// inter-retry delay) has settled.
	pub async fn execute_with_policy<T, F, Fut>(
		&self,
		token: impl Into<String>,
		policy: RetryPolicy,
		mut operation: F,
	) -> Result<T>
	where
		F: FnMut(String) -> Fut,
		Fut: Future<Output = Result<T>>,
	{
		const KIND: FlowKind = FlowKind::Execute;

		let span = FlowSpan::new(KIND, "execute_with_policy");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let mut token = token.into();
		let result = span
			.instrument(async move {
				let mut attempt = 0;

				loop {
					self.metrics.record_operation_attempt();

					let err = match operation(token.clone()).await {
						Ok(value) => return Ok(value),
						Err(err) => err,
					};

					if !policy.is_retriable(&err) {
						return Err(err);
					}
					if attempt >= policy.max_retries {
						return Err(err);
					}

					match self.refresh_token_if_needed().await {
						// A rotated token that matches the one just rejected cannot help;
						// failing here is the guard against an infinite refresh loop.
						Some(fresh) if fresh != token => {
							token = fresh;

							if policy.retry_delay.is_positive() {
								tokio::time::sleep(policy.retry_delay.unsigned_abs()).await;
							}

							attempt += 1;
						},
						_ => return Err(err),
					}
				}
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	/// Performs the coordinated refresh, returning the rotated access token if one was
	/// obtained and persisted.
	///
	/// Callers arriving while another refresh is in flight await it and share its outcome
	/// instead of issuing a second exchange. Every failure mode (missing refresh token,
	/// transport error, non-success response, store write failure) collapses to `None`.
	pub async fn refresh_token_if_needed(&self) -> Option<String> {
		const KIND: FlowKind = FlowKind::Refresh;

		let span = FlowSpan::new(KIND, "refresh_token_if_needed");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let outcome = span
			.instrument(async move {
				let observed = self.gate.observed_generation();
				let _flight = self.gate.lock().await;

				if let Some(joined) = self.gate.joined_outcome(observed) {
					self.metrics.record_refresh_join();

					return joined;
				}

				self.metrics.record_refresh_attempt();

				let outcome = self.refresh_once().await;

				// Settled while the flight lock is still held, so waiters only ever join
				// an outcome whose persistence step has completed.
				self.gate.settle(outcome.clone());

				outcome
			})
			.await;

		match &outcome {
			RefreshOutcome::Rotated(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			RefreshOutcome::Unavailable => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		outcome.into_token()
	}

	async fn refresh_once(&self) -> RefreshOutcome {
		let blob = match self.store.load().await {
			Ok(blob) => blob,
			Err(err) => {
				self.metrics.record_refresh_failure();
				record_refresh_collapse("load_session", &err);

				return RefreshOutcome::Unavailable;
			},
		};
		let refresh_token = blob
			.and_then(|blob| blob.state.tokens)
			.and_then(|tokens| tokens.refresh_token);
		let Some(refresh_token) = refresh_token else {
			self.metrics.record_refresh_failure();
			record_refresh_collapse("read_refresh_token", &"no refresh token is persisted");

			return RefreshOutcome::Unavailable;
		};
		let pair = match self.transport.exchange(refresh_token.expose()).await {
			Ok(pair) => pair,
			Err(err) => {
				self.metrics.record_refresh_failure();
				record_refresh_collapse("exchange", &err);

				return RefreshOutcome::Unavailable;
			},
		};
		let access_token = pair.access_token.clone();

		// The rotated pair is only handed out once it is durably persisted; a write failure
		// keeps the persisted state as the single source of truth.
		if let Err(err) = self.store.replace_tokens(pair).await {
			self.metrics.record_refresh_failure();
			record_refresh_collapse("persist", &err);

			return RefreshOutcome::Unavailable;
		}

		self.metrics.record_refresh_success();

		RefreshOutcome::Rotated(access_token)
	}
}
#[cfg(feature = "reqwest")]
impl Relay<ReqwestRefreshClient> {
	/// Creates a relay with a default reqwest transport targeting `base_url`.
	pub fn new(store: Arc<dyn SessionStore>, base_url: Url) -> Self {
		Self::with_transport(store, ReqwestRefreshClient::new(base_url))
	}
}
impl<C> Debug for Relay<C>
where
	C: ?Sized + RefreshTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Relay")
			.field("refresh_attempts", &self.metrics.refresh_attempts())
			.field("refresh_joins", &self.metrics.refresh_joins())
			.finish()
	}
}
