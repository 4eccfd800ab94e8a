//! Client-credentials exchange built on the `oauth2` crate.

pub use oauth2;

// crates.io
use oauth2::{
	ClientId, ClientSecret, EndpointNotSet, EndpointSet, HttpClientError, RequestTokenError,
	Scope, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicRequestTokenError, BasicTokenResponse},
};
// self
use crate::{
	_prelude::*,
	auth::{CachedToken, ClientCredentials},
	clock::Clock,
	error::{AuthError, ConfigError, TransportError},
	http::{ResponseMetadata, ResponseMetadataSlot, TokenHttpClient},
	provider::MarketplaceDescriptor,
};

type TokenOnlyClient =
	BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

const IDENTITY_ENDPOINT: &str = "the identity endpoint";

/// Performs `grant_type=client_credentials` exchanges against one identity endpoint.
///
/// Client authentication is HTTP Basic (`base64(app_id:cert_id)`), and the descriptor's
/// scopes are sent space-delimited in the `scope` form field.
pub(crate) struct ClientCredentialsExchange<C>
where
	C: ?Sized + TokenHttpClient,
{
	oauth_client: TokenOnlyClient,
	scopes: Vec<String>,
	http_client: Arc<C>,
}
impl<C> ClientCredentialsExchange<C>
where
	C: ?Sized + TokenHttpClient,
{
	pub(crate) fn from_descriptor(
		descriptor: &MarketplaceDescriptor,
		credentials: &ClientCredentials,
		http_client: Arc<C>,
	) -> Result<Self> {
		let token_url = TokenUrl::new(descriptor.endpoints.token.to_string())
			.map_err(|source| ConfigError::InvalidDescriptor { source })?;
		let oauth_client = BasicClient::new(ClientId::new(credentials.app_id.clone()))
			.set_client_secret(ClientSecret::new(credentials.cert_id().to_owned()))
			.set_token_uri(token_url);

		Ok(Self { oauth_client, scopes: descriptor.scopes.clone(), http_client })
	}

	/// Runs one exchange and converts the response into a [`CachedToken`] issued at the
	/// instant `clock` reports once the identity endpoint has answered.
	pub(crate) async fn exchange(
		&self,
		clock: &dyn Clock,
		safety_margin: Duration,
	) -> Result<CachedToken> {
		let meta = ResponseMetadataSlot::default();
		let instrumented = self.http_client.with_metadata(meta.clone());
		let mut request = self.oauth_client.exchange_client_credentials();

		for scope in &self.scopes {
			request = request.add_scope(Scope::new(scope.to_owned()));
		}

		let response = request
			.request_async(&instrumented)
			.await
			.map_err(|err| map_request_error(meta.take(), err))?;

		map_token_response(response, clock.now(), safety_margin)
	}
}

fn map_token_response(
	response: BasicTokenResponse,
	issued_at: OffsetDateTime,
	safety_margin: Duration,
) -> Result<CachedToken> {
	let expires_in = response.expires_in().ok_or(ConfigError::MissingExpiresIn)?.as_secs();
	let expires_in = i64::try_from(expires_in).map_err(|_| ConfigError::ExpiresInOutOfRange)?;

	if expires_in <= 0 {
		return Err(ConfigError::NonPositiveExpiresIn.into());
	}

	Ok(CachedToken::issued(
		response.access_token().secret().to_owned(),
		issued_at,
		Duration::seconds(expires_in),
		safety_margin,
	))
}

fn map_request_error<E>(
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<E>>,
) -> Error
where
	E: 'static + Send + Sync + StdError,
{
	let ResponseMetadata { status, body } = meta.unwrap_or_default();

	match err {
		RequestTokenError::ServerResponse(response) =>
			AuthError::new(server_response_message(&response, status))
				.with_status(status)
				.with_body(body)
				.into(),
		RequestTokenError::Request(error) => map_transport_error(status, body, error),
		RequestTokenError::Parse(_, raw) => {
			let body = body.or_else(|| {
				(!raw.is_empty()).then(|| String::from_utf8_lossy(&raw).into_owned())
			});

			AuthError::new(match status {
				Some(code) if !(200..300).contains(&code) => code.to_string(),
				_ => "identity endpoint returned malformed JSON".into(),
			})
			.with_status(status)
			.with_body(body)
			.into()
		},
		RequestTokenError::Other(message) => AuthError::new(match status {
			Some(code) => format!("{code} {message}"),
			None => message,
		})
		.with_status(status)
		.with_body(body)
		.into(),
	}
}

fn server_response_message(response: &BasicErrorResponse, status: Option<u16>) -> String {
	let detail = response
		.error_description()
		.cloned()
		.unwrap_or_else(|| response.error().as_ref().to_owned());

	match status {
		Some(code) => format!("{code} {detail}"),
		None => detail,
	}
}

fn map_transport_error<E>(
	status: Option<u16>,
	body: Option<String>,
	err: HttpClientError<E>,
) -> Error
where
	E: 'static + Send + Sync + StdError,
{
	match err {
		HttpClientError::Reqwest(inner) =>
			TransportError::Network { endpoint: IDENTITY_ENDPOINT, source: inner }.into(),
		HttpClientError::Http(inner) => ConfigError::from(inner).into(),
		HttpClientError::Io(inner) => TransportError::Io(inner).into(),
		HttpClientError::Other(message) =>
			AuthError::new(message).with_status(status).with_body(body).into(),
		_ => AuthError::new("HTTP client error occurred while calling the identity endpoint")
			.with_status(status)
			.with_body(body)
			.into(),
	}
}
