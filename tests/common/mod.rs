//! Shared fixtures for integration tests.

#![allow(dead_code)]

// std
use std::sync::Arc;
// crates.io
use base64::{Engine, engine::general_purpose::STANDARD};
use httpmock::prelude::*;
use time::{OffsetDateTime, macros};
// self
use marketplace_gate::{
	auth::ClientCredentials,
	clock::ManualClock,
	flows::TokenManager,
	http::ReqwestHttpClient,
	provider::MarketplaceDescriptor,
	reqwest::Client as ReqwestClient,
	store::MemoryTokenStore,
	url::Url,
};

pub const APP_ID: &str = "demo-app";
pub const CERT_ID: &str = "demo-cert";
pub const TOKEN_PATH: &str = "/identity/v1/oauth2/token";
pub const SEARCH_PATH: &str = "/buy/browse/v1/item_summary/search";
pub const FINDING_PATH: &str = "/services/search/FindingService/v1";
pub const START: OffsetDateTime = macros::datetime!(2025-05-01 08:00 UTC);

pub fn descriptor(server: &MockServer) -> MarketplaceDescriptor {
	MarketplaceDescriptor::builder("mock-marketplace")
		.token_endpoint(
			Url::parse(&server.url(TOKEN_PATH)).expect("Mock token endpoint should parse."),
		)
		.search_endpoint(
			Url::parse(&server.url(SEARCH_PATH)).expect("Mock search endpoint should parse."),
		)
		.finding_endpoint(
			Url::parse(&server.url(FINDING_PATH)).expect("Mock finding endpoint should parse."),
		)
		.build()
		.expect("Mock descriptor should build.")
}

/// Reqwest client that accepts the self-signed certificates `httpmock` serves.
pub fn test_reqwest_http_client() -> ReqwestHttpClient {
	let client = ReqwestClient::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.build()
		.expect("Failed to build insecure Reqwest client for tests.");

	ReqwestHttpClient::with_client(client)
}

pub fn basic_header() -> String {
	format!("Basic {}", STANDARD.encode(format!("{APP_ID}:{CERT_ID}")))
}

pub fn token_body(access_token: &str, expires_in: i64) -> String {
	format!(
		"{{\"access_token\":\"{access_token}\",\"expires_in\":{expires_in},\"token_type\":\"Application Access Token\"}}"
	)
}

/// Token manager on a manual clock, plus handles to the clock and store it was built with.
pub struct Harness {
	pub manager: Arc<TokenManager>,
	pub clock: ManualClock,
	pub store: MemoryTokenStore,
}

pub fn harness(server: &MockServer) -> Harness {
	let clock = ManualClock::new(START);
	let store = MemoryTokenStore::default();
	let manager = TokenManager::<ReqwestHttpClient>::with_http_client(
		descriptor(server),
		ClientCredentials::new(APP_ID, CERT_ID),
		test_reqwest_http_client(),
	)
	.with_clock(Arc::new(clock.clone()))
	.with_store(Arc::new(store.clone()));

	Harness { manager: Arc::new(manager), clock, store }
}
