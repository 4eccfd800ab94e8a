//! Thin forwarding proxy to the marketplace search endpoint.

// crates.io
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::{ConfigError, TransportError, UpstreamError},
	flows::TokenManager,
	http::{BODY_PREVIEW_LIMIT, ReqwestHttpClient, TokenHttpClient},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::MarketplaceDescriptor,
	search::{FINDING_OPERATION, SoldItemsPage, ValidatedSearch},
};

const SEARCH_ENDPOINT: &str = "the search endpoint";
const FINDING_ENDPOINT: &str = "the Finding endpoint";

/// Issues item-summary searches with bearer auth and the descriptor's context headers.
#[derive(Clone, Debug)]
pub struct SearchForwarder {
	http_client: ReqwestHttpClient,
	descriptor: MarketplaceDescriptor,
}
impl SearchForwarder {
	/// Creates a forwarder for `descriptor` on top of `http_client`.
	pub fn new(descriptor: MarketplaceDescriptor, http_client: ReqwestHttpClient) -> Self {
		Self { http_client, descriptor }
	}

	/// Descriptor the forwarder targets.
	pub fn descriptor(&self) -> &MarketplaceDescriptor {
		&self.descriptor
	}

	/// Full upstream URL for `search`.
	pub fn search_url(&self, search: &ValidatedSearch) -> Url {
		let mut url = self.descriptor.endpoints.search.clone();

		url.query_pairs_mut().extend_pairs(search.query_pairs());

		url
	}

	/// Forwards `search` and returns the upstream JSON body verbatim.
	///
	/// Non-success statuses become [`UpstreamError`]s carrying the upstream status and body.
	/// A success response whose body is not JSON is reported as a `502` upstream error.
	pub async fn forward(&self, search: &ValidatedSearch, token: &TokenSecret) -> Result<Value> {
		observe("forward", self.send(search, token)).await
	}

	/// Searches sold listings through the Finding API, authenticated by `app_id`.
	///
	/// The Finding API takes the application identifier instead of a bearer token. Fails with
	/// [`ConfigError::MissingFindingEndpoint`] when the descriptor has no Finding endpoint.
	pub async fn forward_sold(
		&self,
		app_id: &str,
		search: &ValidatedSearch,
	) -> Result<SoldItemsPage> {
		observe("forward_sold", self.send_sold(app_id, search)).await
	}

	/// Obtains a token from `tokens` and forwards `search` with it.
	///
	/// An upstream `401` invalidates the cached token before the error is returned, so the
	/// next search re-exchanges instead of replaying a token the marketplace rejected.
	pub async fn forward_authorized<C>(
		&self,
		tokens: &TokenManager<C>,
		search: &ValidatedSearch,
	) -> Result<Value>
	where
		C: ?Sized + TokenHttpClient,
	{
		let token = tokens.get_token().await?;
		let result = self.forward(search, &token).await;

		if let Err(Error::Upstream(UpstreamError { status: 401, .. })) = &result {
			tokens.invalidate().await?;
		}

		result
	}

	async fn send(&self, search: &ValidatedSearch, token: &TokenSecret) -> Result<Value> {
		let context = &self.descriptor.context;
		let response = self
			.http_client
			.get(self.search_url(search))
			.header(AUTHORIZATION, token.bearer_header())
			.header("X-EBAY-C-MARKETPLACE-ID", context.marketplace_id.as_str())
			.header("X-EBAY-C-ENDUSERCTX", context.end_user_context.as_str())
			.header(CONTENT_TYPE, "application/json")
			.send()
			.await
			.map_err(|e| TransportError::network(SEARCH_ENDPOINT, e))?;
		let status = response.status();
		let body = response.bytes().await.map_err(|e| TransportError::network(SEARCH_ENDPOINT, e))?;

		if !status.is_success() {
			return Err(UpstreamError { status: status.as_u16(), body: preview(&body) }.into());
		}

		serde_json::from_slice(&body)
			.map_err(|_| UpstreamError { status: 502, body: preview(&body) }.into())
	}

	/// Full Finding API URL for a sold-item `search`.
	pub fn sold_url(&self, search: &ValidatedSearch) -> Result<Url> {
		let mut url = self.descriptor.endpoints.finding.clone().ok_or_else(|| {
			ConfigError::MissingFindingEndpoint { descriptor: self.descriptor.id.clone() }
		})?;

		url.query_pairs_mut().extend_pairs(search.sold_query_pairs());

		Ok(url)
	}

	async fn send_sold(&self, app_id: &str, search: &ValidatedSearch) -> Result<SoldItemsPage> {
		let response = self
			.http_client
			.get(self.sold_url(search)?)
			.header("X-EBAY-SOA-SECURITY-APPNAME", app_id)
			.header("X-EBAY-SOA-OPERATION-NAME", FINDING_OPERATION)
			.header("X-EBAY-SOA-GLOBAL-ID", self.descriptor.context.global_id())
			.send()
			.await
			.map_err(|e| TransportError::network(FINDING_ENDPOINT, e))?;
		let status = response.status();
		let body =
			response.bytes().await.map_err(|e| TransportError::network(FINDING_ENDPOINT, e))?;

		if !status.is_success() {
			return Err(UpstreamError { status: status.as_u16(), body: preview(&body) }.into());
		}

		Ok(SoldItemsPage::from_finding(&body, search)?)
	}
}

async fn observe<T, Fut>(stage: &'static str, send: Fut) -> Result<T>
where
	Fut: Future<Output = Result<T>>,
{
	const KIND: FlowKind = FlowKind::Search;

	let span = FlowSpan::new(KIND, stage);

	obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

	let result = span.instrument(send).await;

	match &result {
		Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
		Err(e) => {
			obs::record_flow_outcome(KIND, FlowOutcome::Failure);
			tracing::warn!(stage, error = %e, "Search forwarding failed.");
		},
	}

	result
}

fn preview(body: &[u8]) -> String {
	String::from_utf8_lossy(&body[..body.len().min(BODY_PREVIEW_LIMIT)]).into_owned()
}
