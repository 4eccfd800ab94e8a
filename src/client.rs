//! Caller-side marketplace client: paced, cached searches sharing the gate's token manager.

// crates.io
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	flows::TokenManager,
	http::ReqwestHttpClient,
	obs::{self, FlowKind, FlowOutcome},
	rate_limit::Pacer,
	search::{SearchCache, SearchForwarder, SearchRequest, SoldItemsPage},
};

/// Searches the marketplace directly while pacing itself with the client policy.
///
/// Each call validates, consults the [`SearchCache`], waits for the [`Pacer`], obtains a
/// token, forwards, and caches the response. Identical searches inside the cache TTL never
/// reach the upstream. Active and sold searches keep separate caches but share one pacer.
#[derive(Debug)]
pub struct MarketplaceClient {
	tokens: Arc<TokenManager>,
	forwarder: SearchForwarder,
	cache: SearchCache,
	sold_cache: SearchCache<SoldItemsPage>,
	pacer: Pacer,
}
impl MarketplaceClient {
	/// Creates a client with a five-minute cache and the default client pacing policy.
	pub fn new(tokens: Arc<TokenManager>) -> Self {
		let forwarder = SearchForwarder::new(
			tokens.descriptor.clone(),
			ReqwestHttpClient::clone(&tokens.http_client),
		);

		Self {
			tokens,
			forwarder,
			cache: SearchCache::default(),
			sold_cache: SearchCache::default(),
			pacer: Pacer::client_default(),
		}
	}

	/// Replaces the response cache.
	pub fn with_cache(mut self, cache: SearchCache) -> Self {
		self.cache = cache;

		self
	}

	/// Replaces the sold-item cache.
	pub fn with_sold_cache(mut self, cache: SearchCache<SoldItemsPage>) -> Self {
		self.sold_cache = cache;

		self
	}

	/// Replaces the pacer.
	pub fn with_pacer(mut self, pacer: Pacer) -> Self {
		self.pacer = pacer;

		self
	}

	/// Response cache used by this client.
	pub fn cache(&self) -> &SearchCache {
		&self.cache
	}

	/// Sold-item cache used by this client.
	pub fn sold_cache(&self) -> &SearchCache<SoldItemsPage> {
		&self.sold_cache
	}

	/// Runs one search.
	pub async fn search(&self, request: &SearchRequest) -> Result<Value> {
		let search = request.validate()?;

		if let Some(body) = self.cache.get(&search) {
			obs::record_flow_outcome(FlowKind::Search, FlowOutcome::CacheHit);
			tracing::debug!(query = %search.query, "Serving search from cache.");

			return Ok(body);
		}

		self.pacer.ready().await?;

		let body = self.forwarder.forward_authorized(&*self.tokens, &search).await?;

		self.cache.insert(&search, body.clone());

		Ok(body)
	}

	/// Runs one sold-item search through the Finding API.
	pub async fn search_sold(&self, request: &SearchRequest) -> Result<SoldItemsPage> {
		let search = request.validate()?;

		if let Some(page) = self.sold_cache.get(&search) {
			obs::record_flow_outcome(FlowKind::Search, FlowOutcome::CacheHit);
			tracing::debug!(query = %search.query, "Serving sold search from cache.");

			return Ok(page);
		}

		self.pacer.ready().await?;

		let page = self.forwarder.forward_sold(self.tokens.app_id(), &search).await?;

		self.sold_cache.insert(&search, page.clone());

		Ok(page)
	}
}
