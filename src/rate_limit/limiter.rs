//! In-process fixed-window limiter keyed by [`ClientKey`].

// self
use crate::{
	_prelude::*,
	clock::{Clock, SystemClock},
	obs::{self, FlowKind, FlowOutcome},
	rate_limit::{
		Admission, ClientKey, DelayReason, RateLimitDecision, RateLimitPolicy, RetryDirective,
	},
};

/// Fixed-window counter for one client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimitEntry {
	/// Admissions counted in the current window.
	pub count: u32,
	/// Instant the current window ends.
	pub reset_at: OffsetDateTime,
}

#[derive(Clone, Copy, Debug)]
struct ClientState {
	entry: RateLimitEntry,
	last_request: OffsetDateTime,
}

/// Per-client limiter combining a fixed window with a minimum interval between admissions.
///
/// State lives in one map guarded by a [`Mutex`] held only for the bookkeeping of a single
/// admission, so concurrent requests from the same client are decided one at a time. Call
/// [`RateLimiter::sweep`] periodically to evict idle clients.
pub struct RateLimiter {
	policy: RateLimitPolicy,
	clock: Arc<dyn Clock>,
	clients: Mutex<HashMap<ClientKey, ClientState>>,
}
impl RateLimiter {
	/// Creates a limiter driven by the system clock.
	pub fn new(policy: RateLimitPolicy) -> Self {
		Self::with_clock(policy, Arc::new(SystemClock))
	}

	/// Creates a limiter driven by `clock`.
	pub fn with_clock(policy: RateLimitPolicy, clock: Arc<dyn Clock>) -> Self {
		Self { policy, clock, clients: Default::default() }
	}

	/// Clock admission decisions are taken against.
	pub fn clock(&self) -> &Arc<dyn Clock> {
		&self.clock
	}

	/// Policy enforced by this limiter.
	pub fn policy(&self) -> &RateLimitPolicy {
		&self.policy
	}

	/// Decides whether `client` may proceed now.
	pub fn admit(&self, client: &ClientKey) -> RateLimitDecision {
		self.admit_at(client, self.clock.now())
	}

	/// Decides whether `client` may proceed at `now`, recording the admission if it does.
	///
	/// The minimum-interval check runs first; a rejected request never touches the counter.
	pub fn admit_at(&self, client: &ClientKey, now: OffsetDateTime) -> RateLimitDecision {
		let decision = self.decide(client, now);

		match &decision {
			RateLimitDecision::Allow(_) => {
				obs::record_flow_outcome(FlowKind::Admission, FlowOutcome::Success);
			},
			RateLimitDecision::Delay(directive) => {
				obs::record_flow_outcome(FlowKind::Admission, FlowOutcome::Rejected);
				tracing::debug!(
					client = %client,
					reason = directive.reason.as_str(),
					backoff_ms = directive.recommended_backoff.whole_milliseconds() as i64,
					"Rejected request."
				);
			},
		}

		decision
	}

	/// Evicts clients whose window has ended and whose last admission is older than the
	/// minimum interval. Returns how many were evicted.
	pub fn sweep(&self) -> usize {
		self.sweep_at(self.clock.now())
	}

	/// Same as [`RateLimiter::sweep`] with an explicit instant.
	pub fn sweep_at(&self, now: OffsetDateTime) -> usize {
		let min_interval = self.policy.min_interval;
		let mut clients = self.clients.lock();
		let before = clients.len();

		clients.retain(|_, state| {
			now <= state.entry.reset_at || now - state.last_request < min_interval
		});

		before - clients.len()
	}

	/// Number of clients currently holding limiter state.
	pub fn tracked_clients(&self) -> usize {
		self.clients.lock().len()
	}

	/// Snapshot of the window counter kept for `client`.
	pub fn entry(&self, client: &ClientKey) -> Option<RateLimitEntry> {
		self.clients.lock().get(client).map(|state| state.entry)
	}

	fn decide(&self, client: &ClientKey, now: OffsetDateTime) -> RateLimitDecision {
		let RateLimitPolicy { max_requests, window, min_interval } = self.policy;
		let mut clients = self.clients.lock();

		match clients.get_mut(client) {
			Some(state) if now - state.last_request < min_interval => {
				let earliest_retry_at = state.last_request + min_interval;

				RateLimitDecision::Delay(RetryDirective {
					earliest_retry_at,
					recommended_backoff: earliest_retry_at - now,
					reason: DelayReason::MinInterval,
				})
			},
			Some(state) if now <= state.entry.reset_at => {
				if state.entry.count >= max_requests {
					return RateLimitDecision::Delay(RetryDirective {
						earliest_retry_at: state.entry.reset_at,
						recommended_backoff: state.entry.reset_at - now,
						reason: DelayReason::WindowExhausted,
					});
				}

				state.entry.count += 1;
				state.last_request = now;

				RateLimitDecision::Allow(Admission {
					remaining: max_requests - state.entry.count,
					reset_in: state.entry.reset_at - now,
				})
			},
			_ => {
				clients.insert(client.clone(), ClientState {
					entry: RateLimitEntry { count: 1, reset_at: now + window },
					last_request: now,
				});

				RateLimitDecision::Allow(Admission {
					remaining: max_requests.saturating_sub(1),
					reset_in: window,
				})
			},
		}
	}
}
impl Debug for RateLimiter {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RateLimiter")
			.field("policy", &self.policy)
			.field("tracked_clients", &self.tracked_clients())
			.finish()
	}
}
