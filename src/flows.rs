//! Token manager owning the cached client-credentials token.

mod client_credentials;

// self
use crate::{
	_prelude::*,
	auth::{ClientCredentials, DEFAULT_SAFETY_MARGIN},
	clock::{Clock, SystemClock},
	http::{ReqwestHttpClient, TokenHttpClient},
	provider::MarketplaceDescriptor,
	store::{MemoryTokenStore, TokenStore},
};

/// Obtains and caches the application access token for one marketplace.
///
/// The manager owns the HTTP transport, the token store, and the clock, so the gate and the
/// marketplace client can share a single instance through [`Arc`]. A cached token is served
/// until its safety-adjusted expiry; after that exactly one caller performs the exchange
/// while overlapping callers wait on the same singleflight guard and reuse its result.
pub struct TokenManager<C = ReqwestHttpClient>
where
	C: ?Sized + TokenHttpClient,
{
	/// HTTP client wrapper used for identity-endpoint requests.
	pub http_client: Arc<C>,
	/// Descriptor naming the identity endpoint and the requested scopes.
	pub descriptor: MarketplaceDescriptor,
	credentials: ClientCredentials,
	store: Arc<dyn TokenStore>,
	clock: Arc<dyn Clock>,
	safety_margin: Duration,
	exchange_guard: Arc<AsyncMutex<()>>,
}
impl<C> TokenManager<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Creates a manager that reuses the caller-provided transport.
	pub fn with_http_client(
		descriptor: MarketplaceDescriptor,
		credentials: ClientCredentials,
		http_client: impl Into<Arc<C>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			descriptor,
			credentials,
			store: Arc::new(MemoryTokenStore::default()),
			clock: Arc::new(SystemClock),
			safety_margin: DEFAULT_SAFETY_MARGIN,
			exchange_guard: Default::default(),
		}
	}

	/// Replaces the token store.
	pub fn with_store(mut self, store: Arc<dyn TokenStore>) -> Self {
		self.store = store;

		self
	}

	/// Replaces the clock consulted for issue and expiry instants.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// Overrides the safety margin subtracted from `expires_in` (defaults to 60 seconds).
	pub fn with_safety_margin(mut self, margin: Duration) -> Self {
		self.safety_margin = if margin.is_negative() { Duration::ZERO } else { margin };

		self
	}

	/// Application identifier the manager authenticates as.
	pub fn app_id(&self) -> &str {
		&self.credentials.app_id
	}

	/// Clock shared with the manager, handy for wiring a rate limiter to the same time source.
	pub fn clock(&self) -> Arc<dyn Clock> {
		self.clock.clone()
	}
}
impl TokenManager<ReqwestHttpClient> {
	/// Creates a manager backed by its own reqwest transport.
	pub fn new(descriptor: MarketplaceDescriptor, credentials: ClientCredentials) -> Self {
		Self::with_http_client(descriptor, credentials, ReqwestHttpClient::default())
	}
}
impl<C> Debug for TokenManager<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenManager")
			.field("descriptor", &self.descriptor.id)
			.field("credentials", &self.credentials)
			.field("safety_margin", &self.safety_margin)
			.finish()
	}
}
