#![cfg(feature = "server")]

mod common;

// std
use std::sync::Arc;
// crates.io
use axum::{
	Router,
	body::{self, Body},
	http::{HeaderMap, Request, StatusCode},
};
use httpmock::prelude::*;
use serde_json::{Value, json};
use time::Duration;
use tower::ServiceExt;
// self
use common::*;
use marketplace_gate::{
	gate::{self, GateState},
	rate_limit::{RateLimitPolicy, RateLimiter},
};

struct Gate {
	router: Router,
	harness: Harness,
}

fn gate(server: &MockServer) -> Gate {
	let harness = harness(server);
	let limiter = Arc::new(RateLimiter::with_clock(
		RateLimitPolicy::server(),
		Arc::new(harness.clock.clone()),
	));
	let router = gate::router(GateState::new(harness.manager.clone(), limiter));

	Gate { router, harness }
}

async fn post_search(router: &Router, client: &str, body: Value) -> (StatusCode, HeaderMap, Value) {
	post_json(router, "/search", client, body).await
}

async fn post_json(
	router: &Router,
	uri: &str,
	client: &str,
	body: Value,
) -> (StatusCode, HeaderMap, Value) {
	let request = Request::builder()
		.method("POST")
		.uri(uri)
		.header("content-type", "application/json")
		.header("x-forwarded-for", client)
		.body(Body::from(body.to_string()))
		.expect("Search request should build.");
	let response = router.clone().oneshot(request).await.expect("Router should respond.");
	let status = response.status();
	let headers = response.headers().clone();
	let bytes = body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Response body should be readable.");
	let value = serde_json::from_slice(&bytes).expect("Response body should be JSON.");

	(status, headers, value)
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
	headers
		.get(name)
		.and_then(|value| value.to_str().ok())
		.unwrap_or_else(|| panic!("Header {name} should be present."))
}

async fn mock_token(server: &MockServer) -> httpmock::Mock<'_> {
	server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body(token_body("gate-token", 7_200));
		})
		.await
}

#[tokio::test]
async fn successful_search_is_forwarded_with_context_headers() {
	let server = MockServer::start_async().await;
	let Gate { router, .. } = gate(&server);
	let token = mock_token(&server).await;
	let search = server
		.mock_async(|when, then| {
			when.method(GET)
				.path(SEARCH_PATH)
				.query_param("q", "iPhone 15 Pro")
				.query_param("limit", "50")
				.query_param("offset", "0")
				.query_param("sort", "-price")
				.header("authorization", "Bearer gate-token")
				.header("x-ebay-c-marketplace-id", "EBAY_US")
				.header("x-ebay-c-enduserctx", "contextualLocation=country%3DUS");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"total\":1,\"itemSummaries\":[{\"itemId\":\"v1|123|0\"}]}");
		})
		.await;
	let (status, headers, body) =
		post_search(&router, "203.0.113.5", json!({ "query": " iPhone 15 Pro ", "sort": "-price" }))
			.await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["total"], 1);
	assert_eq!(header(&headers, "x-ratelimit-limit"), "30");
	assert_eq!(header(&headers, "x-ratelimit-remaining"), "29");
	assert_eq!(header(&headers, "x-ratelimit-reset"), "60");

	token.assert_async().await;
	search.assert_async().await;
}

#[tokio::test]
async fn thirty_first_request_in_a_window_is_rejected() {
	let server = MockServer::start_async().await;
	let Gate { router, harness } = gate(&server);
	let token = mock_token(&server).await;
	let search = server
		.mock_async(|when, then| {
			when.method(GET).path(SEARCH_PATH);
			then.status(200).header("content-type", "application/json").body("{\"total\":0}");
		})
		.await;

	for _ in 0..30 {
		let (status, _, _) = post_search(&router, "198.51.100.1", json!({ "query": "lego" })).await;

		assert_eq!(status, StatusCode::OK);

		harness.clock.advance(Duration::milliseconds(500));
	}

	let (status, headers, body) =
		post_search(&router, "198.51.100.1", json!({ "query": "lego" })).await;

	assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
	assert_eq!(header(&headers, "retry-after"), "45");
	assert_eq!(header(&headers, "x-ratelimit-remaining"), "0");
	assert_eq!(
		body,
		json!({
			"error": "Rate limit exceeded. Please wait before making more requests.",
			"retryAfter": 45
		})
	);

	token.assert_calls_async(1).await;
	search.assert_calls_async(30).await;

	let (status, _, _) = post_search(&router, "198.51.100.2", json!({ "query": "lego" })).await;

	assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn back_to_back_requests_hit_the_minimum_interval() {
	let server = MockServer::start_async().await;
	let Gate { router, .. } = gate(&server);
	let (first, _, _) = post_search(&router, "192.0.2.8", json!({ "query": "" })).await;
	let (second, headers, body) = post_search(&router, "192.0.2.8", json!({ "query": "" })).await;

	assert_eq!(first, StatusCode::BAD_REQUEST);
	assert_eq!(second, StatusCode::TOO_MANY_REQUESTS);
	assert_eq!(header(&headers, "retry-after"), "1");
	assert_eq!(body["retryAfter"], 1);
}

#[tokio::test]
async fn validation_failures_consume_quota_without_upstream_calls() {
	let server = MockServer::start_async().await;
	let Gate { router, .. } = gate(&server);
	let token = mock_token(&server).await;
	let (status, headers, body) =
		post_search(&router, "192.0.2.20", json!({ "query": "<script>" })).await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body, json!({ "error": "Query contains invalid characters" }));
	assert_eq!(header(&headers, "x-ratelimit-remaining"), "29");

	token.assert_calls_async(0).await;
}

#[tokio::test]
async fn token_failures_become_internal_errors() {
	let server = MockServer::start_async().await;
	let Gate { router, harness } = gate(&server);
	let token = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(401)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_client\"}");
		})
		.await;
	let (status, headers, body) =
		post_search(&router, "192.0.2.30", json!({ "query": "camera" })).await;
	let message = body["error"].as_str().expect("Error envelope should carry a message.");

	assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
	assert!(message.starts_with("Failed to get OAuth token: 401"));
	assert_eq!(header(&headers, "x-ratelimit-remaining"), "29");
	assert!(harness.store.snapshot().is_none());

	token.assert_async().await;
}

#[tokio::test]
async fn upstream_unauthorized_invalidates_the_cached_token() {
	let server = MockServer::start_async().await;
	let Gate { router, harness } = gate(&server);
	let token = mock_token(&server).await;
	let search = server
		.mock_async(|when, then| {
			when.method(GET).path(SEARCH_PATH);
			then.status(401)
				.header("content-type", "application/json")
				.body("{\"errors\":[{\"errorId\":1001}]}");
		})
		.await;
	let (status, _, body) = post_search(&router, "192.0.2.40", json!({ "query": "watch" })).await;

	assert_eq!(status, StatusCode::UNAUTHORIZED);
	assert_eq!(body, json!({ "error": "Marketplace search failed: 401" }));
	assert!(harness.store.snapshot().is_none());

	token.assert_calls_async(1).await;
	search.assert_calls_async(1).await;
}

#[tokio::test]
async fn sold_searches_share_the_limiter_and_relay_finding_failures() {
	let server = MockServer::start_async().await;
	let Gate { router, harness } = gate(&server);
	let finding = server
		.mock_async(|when, then| {
			when.method(GET)
				.path(FINDING_PATH)
				.query_param("keywords", "walkman")
				.query_param("paginationInput.pageNumber", "1");
			then.status(200).header("content-type", "application/json").body(
				json!({
					"findCompletedItemsResponse": [{
						"ack": ["Failure"],
						"errorMessage": [{
							"error": [{ "errorId": ["10001"], "message": ["Daily call limit reached"] }]
						}]
					}]
				})
				.to_string(),
			);
		})
		.await;
	let (status, _, _) = post_search(&router, "192.0.2.50", json!({ "query": "" })).await;

	assert_eq!(status, StatusCode::BAD_REQUEST);

	harness.clock.advance(Duration::seconds(1));

	let (status, headers, body) =
		post_json(&router, "/search/sold", "192.0.2.50", json!({ "query": "walkman" })).await;

	assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
	assert_eq!(header(&headers, "x-ratelimit-remaining"), "28");
	assert!(headers.get("retry-after").is_none());
	assert!(body["error"].is_string());

	finding.assert_calls_async(1).await;
}

#[tokio::test]
async fn health_answers_ok() {
	let server = MockServer::start_async().await;
	let Gate { router, .. } = gate(&server);
	let response = router
		.oneshot(
			Request::builder().uri("/health").body(Body::empty()).expect("Request should build."),
		)
		.await
		.expect("Router should respond.");

	assert_eq!(response.status(), StatusCode::OK);

	let bytes = body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Response body should be readable.");

	assert_eq!(&bytes[..], b"ok");
}
