//! Cached client-credentials acquisition with a singleflight guard.
//!
//! [`TokenManager::get_token`] answers from the store while the cached token is inside its
//! validity window. Once it lapses, callers serialize on the manager's exchange guard and
//! re-check the store after acquiring it, so a burst of callers observing the same expiry
//! triggers a single identity-endpoint request. Failures are never cached or retried.

// self
use crate::{
	_prelude::*,
	auth::{CachedToken, TokenSecret},
	flows::TokenManager,
	http::TokenHttpClient,
	oauth::ClientCredentialsExchange,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

impl<C> TokenManager<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Returns a bearer token that is valid at the current instant, exchanging when needed.
	pub async fn get_token(&self) -> Result<TokenSecret> {
		const KIND: FlowKind = FlowKind::TokenExchange;

		if let Some(token) = self.cached_at(self.clock.now()).await? {
			obs::record_flow_outcome(KIND, FlowOutcome::CacheHit);

			return Ok(token.access_token);
		}

		let span = FlowSpan::new(KIND, "get_token");

		span.instrument(async move {
			let _singleflight = self.exchange_guard.lock().await;

			if let Some(token) = self.cached_at(self.clock.now()).await? {
				obs::record_flow_outcome(KIND, FlowOutcome::CacheHit);

				return Ok(token.access_token);
			}

			obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

			match self.exchange().await {
				Ok(token) => {
					obs::record_flow_outcome(KIND, FlowOutcome::Success);
					tracing::info!(
						descriptor = %self.descriptor.id,
						expires_at = %token.expires_at,
						"Cached a new access token."
					);

					Ok(token.access_token)
				},
				Err(e) => {
					obs::record_flow_outcome(KIND, FlowOutcome::Failure);
					tracing::warn!(
						descriptor = %self.descriptor.id,
						error = %e,
						"Token exchange failed."
					);

					Err(e)
				},
			}
		})
		.await
	}

	/// Drops the cached token so the next [`TokenManager::get_token`] call re-exchanges.
	pub async fn invalidate(&self) -> Result<()> {
		self.store.clear().await?;

		tracing::debug!(descriptor = %self.descriptor.id, "Invalidated the cached access token.");

		Ok(())
	}

	/// Returns the cached token if it is still valid at `now`.
	pub async fn cached_at(&self, now: OffsetDateTime) -> Result<Option<CachedToken>> {
		Ok(self.store.load().await?.filter(|token| token.is_valid_at(now)))
	}

	async fn exchange(&self) -> Result<CachedToken> {
		let exchange = ClientCredentialsExchange::from_descriptor(
			&self.descriptor,
			&self.credentials,
			self.http_client.clone(),
		)?;
		let token = exchange.exchange(self.clock.as_ref(), self.safety_margin).await?;

		self.store.save(token.clone()).await?;

		Ok(token)
	}
}
