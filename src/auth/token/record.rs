//! Cached access token with its issue and expiry instants.

// self
use crate::{_prelude::*, auth::token::secret::TokenSecret};

/// Safety margin subtracted from `expires_in` so a token never expires mid-flight.
pub const DEFAULT_SAFETY_MARGIN: Duration = Duration::seconds(60);

/// Access token held by a [`TokenStore`](crate::store::TokenStore).
#[derive(Clone, Serialize, Deserialize)]
pub struct CachedToken {
	/// Bearer token; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Instant the identity endpoint answered.
	pub issued_at: OffsetDateTime,
	/// Instant after which the token must no longer be served from cache.
	pub expires_at: OffsetDateTime,
}
impl CachedToken {
	/// Builds a token that expires `expires_in` minus the safety margin after `issued_at`.
	///
	/// The margin shrinks to half of `expires_in` when the provider issues a lifetime shorter
	/// than twice the margin, keeping `issued_at < expires_at` for every positive lifetime.
	pub fn issued(
		access_token: impl Into<String>,
		issued_at: OffsetDateTime,
		expires_in: Duration,
		safety_margin: Duration,
	) -> Self {
		let margin = if expires_in > safety_margin * 2 { safety_margin } else { expires_in / 2 };

		Self {
			access_token: TokenSecret::new(access_token),
			issued_at,
			expires_at: issued_at + (expires_in - margin),
		}
	}

	/// Returns `true` while `instant` is strictly before the expiry instant.
	pub fn is_valid_at(&self, instant: OffsetDateTime) -> bool {
		instant < self.expires_at
	}

	/// Time left before expiry, clamped at zero.
	pub fn remaining_at(&self, instant: OffsetDateTime) -> Duration {
		let remaining = self.expires_at - instant;

		if remaining.is_negative() { Duration::ZERO } else { remaining }
	}
}
impl Debug for CachedToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CachedToken")
			.field("access_token", &"<redacted>")
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}
