//! Injectable time sources for token expiry and admission windows.

// self
use crate::_prelude::*;

/// Future returned by [`Clock::sleep`].
pub type ClockSleep = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Source of "now" consulted by the token manager and the rate limiter.
pub trait Clock
where
	Self: Send + Sync,
{
	/// Returns the current UTC instant.
	fn now(&self) -> OffsetDateTime;

	/// Waits until `duration` has elapsed on this clock.
	///
	/// The default waits on the tokio timer; negative durations resolve immediately.
	fn sleep(&self, duration: Duration) -> ClockSleep {
		let duration = if duration.is_negative() { Duration::ZERO } else { duration };

		Box::pin(tokio::time::sleep(duration.unsigned_abs()))
	}
}

/// Wall clock backed by [`OffsetDateTime::now_utc`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;
impl Clock for SystemClock {
	fn now(&self) -> OffsetDateTime {
		OffsetDateTime::now_utc()
	}
}

/// Hand-driven clock for deterministic tests and simulations.
///
/// Clones share the same instant, so a handle kept by a test can advance the clock seen by
/// every component it was injected into.
#[derive(Clone, Debug)]
pub struct ManualClock(Arc<Mutex<OffsetDateTime>>);
impl ManualClock {
	/// Starts the clock at `start`.
	pub fn new(start: OffsetDateTime) -> Self {
		Self(Arc::new(Mutex::new(start)))
	}

	/// Moves the clock forward by `delta`.
	pub fn advance(&self, delta: Duration) {
		*self.0.lock() += delta;
	}

	/// Jumps the clock to `instant`.
	pub fn set(&self, instant: OffsetDateTime) {
		*self.0.lock() = instant;
	}
}
impl Clock for ManualClock {
	fn now(&self) -> OffsetDateTime {
		*self.0.lock()
	}

	/// Advances the clock by `duration` and resolves at once.
	fn sleep(&self, duration: Duration) -> ClockSleep {
		if duration.is_positive() {
			self.advance(duration);
		}

		Box::pin(std::future::ready(()))
	}
}
