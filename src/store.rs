//! Storage contract for the token manager's single cached token.

pub mod memory;

pub use memory::MemoryTokenStore;

// self
use crate::{_prelude::*, auth::CachedToken};

/// Boxed future returned by [`TokenStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend holding at most one [`CachedToken`].
///
/// Writes overwrite the slot; nothing is ever merged.
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Returns the cached token, if any.
	fn load(&self) -> StoreFuture<'_, Option<CachedToken>>;

	/// Replaces the cached token.
	fn save(&self, token: CachedToken) -> StoreFuture<'_, ()>;

	/// Drops the cached token so the next lookup misses.
	fn clear(&self) -> StoreFuture<'_, ()>;
}

/// Error type produced by [`TokenStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
