mod common;

// std
use std::{
	error::Error as StdError,
	fmt::{Display, Formatter, Result as FmtResult},
	future::Future,
	pin::Pin,
	sync::Arc,
};
// self
use common::*;
use marketplace_gate::{
	auth::ClientCredentials,
	error::{Error, TransportError},
	flows::TokenManager,
	http::{ResponseMetadata, ResponseMetadataSlot, TokenHttpClient},
	oauth::oauth2::{
		AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse, http::StatusCode,
	},
	provider::MarketplaceDescriptor,
	url::Url,
};

#[derive(Debug)]
struct FakeTransportError;
impl Display for FakeTransportError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("Connection reset by fake peer.")
	}
}
impl StdError for FakeTransportError {}

#[derive(Clone, Copy)]
enum Script {
	Respond { status: u16, body: &'static str },
	Fail,
}

#[derive(Clone, Copy)]
struct FakeHttpClient(Script);
impl TokenHttpClient for FakeHttpClient {
	type Handle = FakeHttpHandle;
	type TransportError = FakeTransportError;

	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle {
		FakeHttpHandle { slot, script: self.0 }
	}
}

struct FakeHttpHandle {
	slot: ResponseMetadataSlot,
	script: Script,
}
impl<'a> AsyncHttpClient<'a> for FakeHttpHandle {
	type Error = HttpClientError<FakeTransportError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'a + Send + Sync>>;

	fn call(&'a self, request: HttpRequest) -> Self::Future {
		let slot = self.slot.clone();
		let script = self.script;

		Box::pin(async move {
			assert!(
				slot.take().is_none(),
				"ResponseMetadataSlot must be clear before dispatching a request."
			);
			assert_eq!(request.uri().path(), TOKEN_PATH);

			match script {
				Script::Respond { status, body } => {
					slot.store(ResponseMetadata::from_response(status, body.as_bytes()));

					let mut response = HttpResponse::new(body.as_bytes().to_vec());

					*response.status_mut() =
						StatusCode::from_u16(status).expect("Scripted status should be valid.");

					Ok(response)
				},
				Script::Fail => Err(HttpClientError::Reqwest(Box::new(FakeTransportError))),
			}
		})
	}
}

fn manager(script: Script) -> TokenManager<FakeHttpClient> {
	let descriptor = MarketplaceDescriptor::builder("fake-transport")
		.token_endpoint(
			Url::parse(&format!("https://api.example.com{TOKEN_PATH}"))
				.expect("Fake token endpoint should parse."),
		)
		.search_endpoint(
			Url::parse(&format!("https://api.example.com{SEARCH_PATH}"))
				.expect("Fake search endpoint should parse."),
		)
		.build()
		.expect("Fake descriptor should build.");

	TokenManager::with_http_client(
		descriptor,
		ClientCredentials::new(APP_ID, CERT_ID),
		Arc::new(FakeHttpClient(script)),
	)
}

#[tokio::test]
async fn custom_transport_serves_tokens() {
	let manager = manager(Script::Respond {
		status: 200,
		body: "{\"access_token\":\"fake-token\",\"expires_in\":7200,\"token_type\":\"Application Access Token\"}",
	});
	let token = manager.get_token().await.expect("Scripted exchange should succeed.");

	assert_eq!(token.expose(), "fake-token");
}

#[tokio::test]
async fn non_json_failures_keep_status_and_body() {
	let manager = manager(Script::Respond { status: 503, body: "<html>maintenance</html>" });
	let err = manager.get_token().await.expect_err("Maintenance pages should fail the exchange.");
	let Error::Auth(auth) = &err else { panic!("Expected an auth error, got {err:?}.") };

	assert_eq!(auth.status, Some(503));
	assert_eq!(auth.body.as_deref(), Some("<html>maintenance</html>"));
	assert_eq!(err.to_string(), "Failed to get OAuth token: 503");
}

#[tokio::test]
async fn transport_failures_surface_as_transport_errors() {
	let manager = manager(Script::Fail);
	let err = manager.get_token().await.expect_err("Transport failures should fail the exchange.");

	assert!(matches!(err, Error::Transport(TransportError::Network { .. })));
	assert_eq!(err.status_code(), 500);
}
