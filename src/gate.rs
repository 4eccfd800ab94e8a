//! HTTP gate: admits, validates, authenticates, and forwards search requests.
//!
//! `POST /search` takes a JSON body `{query, limit?, offset?, sort?, filter?}` and relays the
//! Browse API response; `POST /search/sold` takes the same body and answers with a sold-items
//! page from the Finding API. Both routes share one per-client limiter that runs before
//! anything else, so malformed bodies still consume quota. Every response from either route
//! carries `X-RateLimit-Limit`, `X-RateLimit-Remaining`, and `X-RateLimit-Reset`; errors are
//! JSON `{error}` envelopes, with `retryAfter` added for `429`s.

// crates.io
use axum::{
	Json, Router,
	body::Bytes,
	extract::State,
	http::{HeaderMap, StatusCode, header::RETRY_AFTER},
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
// self
use crate::{
	_prelude::*,
	error::RateLimitError,
	flows::TokenManager,
	http::ReqwestHttpClient,
	rate_limit::{self, ClientKey, RateLimitDecision, RateLimiter},
	search::{SearchForwarder, SearchRequest, SoldItemsPage},
};

/// Shared state behind the gate's routes.
#[derive(Clone, Debug)]
pub struct GateState {
	/// Token manager shared by every request.
	pub tokens: Arc<TokenManager>,
	/// Forwarder targeting the marketplace search endpoint.
	pub forwarder: Arc<SearchForwarder>,
	/// Per-client limiter.
	pub limiter: Arc<RateLimiter>,
}
impl GateState {
	/// Wires a forwarder that reuses the token manager's descriptor and HTTP client.
	pub fn new(tokens: Arc<TokenManager>, limiter: Arc<RateLimiter>) -> Self {
		let forwarder = Arc::new(SearchForwarder::new(
			tokens.descriptor.clone(),
			ReqwestHttpClient::clone(&tokens.http_client),
		));

		Self { tokens, forwarder, limiter }
	}

	async fn run_search(&self, body: &[u8]) -> Result<Value> {
		let search = SearchRequest::from_json(body)?.validate()?;

		self.forwarder.forward_authorized(&*self.tokens, &search).await
	}

	async fn run_sold(&self, body: &[u8]) -> Result<SoldItemsPage> {
		let search = SearchRequest::from_json(body)?.validate()?;

		self.forwarder.forward_sold(self.tokens.app_id(), &search).await
	}
}

/// Builds the gate router with a permissive CORS layer.
pub fn router(state: GateState) -> Router {
	Router::new()
		.route("/search", post(search))
		.route("/search/sold", post(search_sold))
		.route("/health", get(health))
		.layer(CorsLayer::permissive())
		.with_state(state)
}

/// Spawns a task that sweeps idle clients out of `limiter` every `interval`.
pub fn spawn_sweeper(limiter: Arc<RateLimiter>, interval: std::time::Duration) -> JoinHandle<()> {
	tokio::spawn(async move {
		let mut ticker = tokio::time::interval(interval);

		ticker.tick().await;

		loop {
			ticker.tick().await;

			let evicted = limiter.sweep();

			if evicted > 0 {
				tracing::debug!(evicted, tracked = limiter.tracked_clients(), "Swept rate limiter.");
			}
		}
	})
}

/// Resolves the caller's key from proxy headers.
pub fn client_key(headers: &HeaderMap) -> ClientKey {
	let header = |name: &str| headers.get(name).and_then(|value| value.to_str().ok());

	ClientKey::from_forwarded(header("x-forwarded-for"), header("cf-connecting-ip"))
}

async fn health() -> &'static str {
	"ok"
}

async fn search(State(state): State<GateState>, headers: HeaderMap, body: Bytes) -> Response {
	admitted(&state, &headers, state.run_search(&body)).await
}

async fn search_sold(
	State(state): State<GateState>,
	headers: HeaderMap,
	body: Bytes,
) -> Response {
	admitted(&state, &headers, state.run_sold(&body)).await
}

/// Runs `work` only if the caller is admitted, attaching the rate-limit headers either way.
async fn admitted<T, Fut>(state: &GateState, headers: &HeaderMap, work: Fut) -> Response
where
	T: Serialize,
	Fut: Future<Output = Result<T>>,
{
	let client = client_key(headers);
	let decision = state.limiter.admit(&client);
	let limits = rate_limit_headers(state.limiter.policy().max_requests, &decision);

	if let RateLimitDecision::Delay(directive) = decision {
		tracing::info!(client = %client, reason = directive.reason.as_str(), "Rate limit exceeded.");

		return error_response(
			&RateLimitError { retry_after: directive.recommended_backoff }.into(),
			limits,
		);
	}

	match work.await {
		Ok(value) => (limits, Json(value)).into_response(),
		Err(e) => {
			tracing::warn!(client = %client, status = e.status_code(), error = %e, "Search failed.");

			error_response(&e, limits)
		},
	}
}

fn rate_limit_headers(limit: u32, decision: &RateLimitDecision) -> [(&'static str, String); 3] {
	[
		("x-ratelimit-limit", limit.to_string()),
		("x-ratelimit-remaining", decision.remaining().to_string()),
		("x-ratelimit-reset", rate_limit::ceil_secs(decision.reset_in()).to_string()),
	]
}

fn error_response(error: &Error, limits: [(&'static str, String); 3]) -> Response {
	let status =
		StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

	match error.retry_after() {
		Some(retry_after) => {
			let seconds = rate_limit::ceil_secs(retry_after);

			(
				status,
				limits,
				[(RETRY_AFTER, seconds.to_string())],
				Json(json!({ "error": error.to_string(), "retryAfter": seconds })),
			)
				.into_response()
		},
		None => (status, limits, Json(json!({ "error": error.to_string() }))).into_response(),
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use axum::http::HeaderValue;
	// self
	use super::*;
	use crate::error::ValidationError;

	#[test]
	fn client_key_falls_back_through_proxy_headers() {
		let mut headers = HeaderMap::new();

		assert_eq!(client_key(&headers), ClientKey::anonymous());

		headers.insert("cf-connecting-ip", HeaderValue::from_static("198.51.100.9"));

		assert_eq!(client_key(&headers).as_str(), "198.51.100.9");

		headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.1, 10.0.0.2"));

		assert_eq!(client_key(&headers).as_str(), "203.0.113.1");
	}

	#[test]
	fn rate_limited_errors_carry_retry_after() {
		let limits = [
			("x-ratelimit-limit", "30".to_owned()),
			("x-ratelimit-remaining", "0".to_owned()),
			("x-ratelimit-reset", "3".to_owned()),
		];
		let response = error_response(
			&RateLimitError { retry_after: Duration::milliseconds(2_100) }.into(),
			limits.clone(),
		);

		assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
		assert_eq!(response.headers()[RETRY_AFTER], "3");
		assert_eq!(response.headers()["x-ratelimit-remaining"], "0");

		let response = error_response(&ValidationError::EmptyQuery.into(), limits);

		assert_eq!(response.status(), StatusCode::BAD_REQUEST);
		assert!(response.headers().get(RETRY_AFTER).is_none());
	}
}
