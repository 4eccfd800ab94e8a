//! Caller-side response cache keyed by canonical search parameters.

// crates.io
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	clock::{Clock, SystemClock},
	search::ValidatedSearch,
};

/// Default lifetime of a cached search response.
pub const DEFAULT_SEARCH_TTL: Duration = Duration::minutes(5);

#[derive(Clone, Debug)]
struct CachedResponse<V> {
	body: V,
	stored_at: OffsetDateTime,
}

/// In-memory map from [`ValidatedSearch::cache_key`] to an upstream response.
///
/// `V` defaults to the raw Browse API body; sold-item searches cache their typed page.
///
/// Entries are served while younger than the TTL. Stale entries are dropped on lookup and
/// on every insert, so the map never holds more than one TTL's worth of distinct searches.
pub struct SearchCache<V = Value> {
	ttl: Duration,
	clock: Arc<dyn Clock>,
	entries: Mutex<HashMap<String, CachedResponse<V>>>,
}
impl<V> SearchCache<V>
where
	V: Clone,
{
	/// Creates a cache with the given TTL on the system clock.
	pub fn new(ttl: Duration) -> Self {
		Self::with_clock(ttl, Arc::new(SystemClock))
	}

	/// Creates a cache with the given TTL driven by `clock`.
	pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
		Self { ttl, clock, entries: Default::default() }
	}

	/// Returns the cached body for `search` if it is still fresh.
	pub fn get(&self, search: &ValidatedSearch) -> Option<V> {
		let key = search.cache_key();
		let now = self.clock.now();
		let mut entries = self.entries.lock();

		match entries.get(&key) {
			Some(entry) if now - entry.stored_at < self.ttl => Some(entry.body.clone()),
			Some(_) => {
				entries.remove(&key);

				None
			},
			None => None,
		}
	}

	/// Stores `body` as the response for `search`, evicting stale entries first.
	pub fn insert(&self, search: &ValidatedSearch, body: V) {
		let stored_at = self.clock.now();
		let mut entries = self.entries.lock();

		self.retain_fresh(&mut entries, stored_at);
		entries.insert(search.cache_key(), CachedResponse { body, stored_at });
	}

	/// Removes every stale entry and returns how many were dropped.
	pub fn purge_expired(&self) -> usize {
		let now = self.clock.now();

		self.retain_fresh(&mut self.entries.lock(), now)
	}

	fn retain_fresh(
		&self,
		entries: &mut HashMap<String, CachedResponse<V>>,
		now: OffsetDateTime,
	) -> usize {
		let before = entries.len();

		entries.retain(|_, entry| now - entry.stored_at < self.ttl);

		before - entries.len()
	}

	/// Number of entries currently held, fresh or not.
	pub fn len(&self) -> usize {
		self.entries.lock().len()
	}

	/// Whether the cache holds no entries.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Drops every entry.
	pub fn clear(&self) {
		self.entries.lock().clear();
	}
}
impl<V> Default for SearchCache<V>
where
	V: Clone,
{
	fn default() -> Self {
		Self::new(DEFAULT_SEARCH_TTL)
	}
}
impl<V> Debug for SearchCache<V>
where
	V: Clone,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SearchCache").field("ttl", &self.ttl).field("len", &self.len()).finish()
	}
}
