//! In-process [`TokenStore`] used by the gate and the marketplace client.

// self
use crate::{
	_prelude::*,
	auth::CachedToken,
	store::{StoreFuture, TokenStore},
};

type TokenSlot = Arc<RwLock<Option<CachedToken>>>;

/// Thread-safe single-slot token store; state resets on restart.
#[derive(Clone, Debug, Default)]
pub struct MemoryTokenStore(TokenSlot);
impl MemoryTokenStore {
	/// Returns the cached token without going through the async contract.
	pub fn snapshot(&self) -> Option<CachedToken> {
		self.0.read().clone()
	}
}
impl TokenStore for MemoryTokenStore {
	fn load(&self) -> StoreFuture<'_, Option<CachedToken>> {
		let slot = self.0.clone();

		Box::pin(async move { Ok(slot.read().clone()) })
	}

	fn save(&self, token: CachedToken) -> StoreFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move {
			*slot.write() = Some(token);

			Ok(())
		})
	}

	fn clear(&self) -> StoreFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move {
			slot.write().take();

			Ok(())
		})
	}
}
