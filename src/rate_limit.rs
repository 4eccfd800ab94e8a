//! Per-client admission control: a fixed-window counter plus a minimum-interval throttle.
//!
//! The same [`RateLimiter`] backs the gate (server policy, rejections become `429`s) and the
//! marketplace client's [`Pacer`] (client policy, min-interval rejections are slept through).
//! Rejections are values, not errors; callers decide how to surface them.

pub mod limiter;
pub mod pacer;

pub use limiter::*;
pub use pacer::*;

// self
use crate::{_prelude::*, error::ConfigError};

/// Admission policy applied per client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitPolicy {
	/// Maximum admissions per window.
	pub max_requests: u32,
	/// Length of one fixed window.
	pub window: Duration,
	/// Minimum spacing between two admissions of the same client.
	pub min_interval: Duration,
}
impl RateLimitPolicy {
	/// Policy enforced by the gate: 30 requests per minute, 500ms apart.
	pub const fn server() -> Self {
		Self {
			max_requests: 30,
			window: Duration::seconds(60),
			min_interval: Duration::milliseconds(500),
		}
	}

	/// Policy a well-behaved caller paces itself with: 30 requests per minute, 1s apart.
	pub const fn client() -> Self {
		Self { min_interval: Duration::seconds(1), ..Self::server() }
	}

	/// Rejects policies that could never admit a request or that use negative durations.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.max_requests == 0 {
			return Err(ConfigError::InvalidPolicy { reason: "max_requests must be positive" });
		}
		if !self.window.is_positive() {
			return Err(ConfigError::InvalidPolicy { reason: "window must be positive" });
		}
		if self.min_interval.is_negative() {
			return Err(ConfigError::InvalidPolicy { reason: "min_interval must not be negative" });
		}

		Ok(())
	}
}
impl Default for RateLimitPolicy {
	fn default() -> Self {
		Self::server()
	}
}

/// Identity the limiter buckets requests by.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClientKey(String);
impl ClientKey {
	const ANONYMOUS: &'static str = "anonymous";

	/// Wraps an identifier; blank identifiers collapse to [`ClientKey::anonymous`].
	pub fn new(value: impl Into<String>) -> Self {
		let value = value.into();
		let trimmed = value.trim();

		if trimmed.is_empty() {
			Self::anonymous()
		} else if trimmed.len() == value.len() {
			Self(value)
		} else {
			Self(trimmed.to_owned())
		}
	}

	/// Key shared by every caller that carries no identifying header.
	pub fn anonymous() -> Self {
		Self(Self::ANONYMOUS.into())
	}

	/// Derives a key from proxy headers: the first `X-Forwarded-For` hop, else
	/// `CF-Connecting-IP`, else anonymous.
	pub fn from_forwarded(forwarded_for: Option<&str>, connecting_ip: Option<&str>) -> Self {
		forwarded_for
			.and_then(|value| value.split(',').next())
			.map(str::trim)
			.filter(|value| !value.is_empty())
			.or_else(|| connecting_ip.map(str::trim).filter(|value| !value.is_empty()))
			.map_or_else(Self::anonymous, Self::new)
	}

	/// Returns the key as a string slice.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl Display for ClientKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// Outcome of one admission attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RateLimitDecision {
	/// The request may proceed immediately.
	Allow(Admission),
	/// The request must wait.
	Delay(RetryDirective),
}
impl RateLimitDecision {
	/// Whether the request was admitted.
	pub fn allowed(&self) -> bool {
		matches!(self, Self::Allow(_))
	}

	/// Admissions left in the current window; always zero for rejections.
	pub fn remaining(&self) -> u32 {
		match self {
			Self::Allow(admission) => admission.remaining,
			Self::Delay(_) => 0,
		}
	}

	/// Time until the window resets (admissions) or until a retry may succeed (rejections).
	pub fn reset_in(&self) -> Duration {
		match self {
			Self::Allow(admission) => admission.reset_in,
			Self::Delay(directive) => directive.recommended_backoff,
		}
	}
}

/// Details of an admitted request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Admission {
	/// Admissions left in the current window.
	pub remaining: u32,
	/// Time until the current window resets.
	pub reset_in: Duration,
}

/// Advises callers when to retry after a [`RateLimitDecision::Delay`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryDirective {
	/// Instant when it is safe to retry.
	pub earliest_retry_at: OffsetDateTime,
	/// Suggested backoff duration.
	pub recommended_backoff: Duration,
	/// Which limit caused the rejection.
	pub reason: DelayReason,
}

/// Limit that rejected a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DelayReason {
	/// The client called again before the minimum interval elapsed.
	MinInterval,
	/// The client used every admission of the current window.
	WindowExhausted,
}
impl DelayReason {
	/// Returns a stable label suitable for span or log fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			DelayReason::MinInterval => "min_interval",
			DelayReason::WindowExhausted => "window_exhausted",
		}
	}
}

/// Rounds a duration up to whole seconds, clamping negatives to zero.
pub fn ceil_secs(duration: Duration) -> u64 {
	let Ok(nanos) = u128::try_from(duration.whole_nanoseconds()) else { return 0 };

	u64::try_from(nanos.div_ceil(1_000_000_000)).unwrap_or(u64::MAX)
}
