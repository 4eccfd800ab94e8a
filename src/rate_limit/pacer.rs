//! Caller-side pacing on top of [`RateLimiter`].

// self
use crate::{
	_prelude::*,
	clock::Clock,
	error::RateLimitError,
	rate_limit::{Admission, ClientKey, DelayReason, RateLimitDecision, RateLimitPolicy, RateLimiter},
};

/// Waits out minimum-interval rejections for a single caller instead of failing.
///
/// Waits go through the limiter's [`Clock`], so a pacer over a manual
/// clock advances that clock rather than sleeping. An exhausted window is still reported as a [`RateLimitError`]; sleeping for most of a
/// minute inside a search call is never what the caller wants.
#[derive(Debug)]
pub struct Pacer {
	limiter: Arc<RateLimiter>,
	key: ClientKey,
}
impl Pacer {
	/// Paces the anonymous caller with `limiter`.
	pub fn new(limiter: Arc<RateLimiter>) -> Self {
		Self { limiter, key: ClientKey::anonymous() }
	}

	/// Paces the caller with the client policy on the system clock.
	pub fn client_default() -> Self {
		Self::new(Arc::new(RateLimiter::new(RateLimitPolicy::client())))
	}

	/// Overrides the key the caller is tracked under.
	pub fn with_key(mut self, key: ClientKey) -> Self {
		self.key = key;

		self
	}

	/// Limiter shared by this pacer.
	pub fn limiter(&self) -> &Arc<RateLimiter> {
		&self.limiter
	}

	/// Resolves once the caller is admitted.
	pub async fn ready(&self) -> Result<Admission, RateLimitError> {
		loop {
			match self.limiter.admit(&self.key) {
				RateLimitDecision::Allow(admission) => return Ok(admission),
				RateLimitDecision::Delay(directive) => match directive.reason {
					DelayReason::MinInterval => {
						tracing::debug!(
							backoff_ms = directive.recommended_backoff.whole_milliseconds() as i64,
							"Pacing request."
						);
						self.limiter.clock().sleep(directive.recommended_backoff).await;
					},
					DelayReason::WindowExhausted =>
						return Err(RateLimitError { retry_after: directive.recommended_backoff }),
				},
			}
		}
	}
}
