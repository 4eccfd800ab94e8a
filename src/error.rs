//! Gate-level error types shared across the token manager, limiter, validator, and forwarder.

// self
use crate::_prelude::*;

/// Gate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical gate error exposed by public APIs.
///
/// Every variant maps onto one HTTP status through [`Error::status_code`], so the gate can
/// convert any failure into a JSON envelope without inspecting the variant itself.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Caller supplied a malformed search request.
	#[error(transparent)]
	Validation(#[from] ValidationError),
	/// Caller exceeded its quota or its minimum request interval.
	#[error(transparent)]
	RateLimited(#[from] RateLimitError),
	/// Token endpoint rejected the client-credentials exchange.
	#[error(transparent)]
	Auth(#[from] AuthError),
	/// Marketplace search endpoint answered with a non-success status.
	#[error(transparent)]
	Upstream(#[from] UpstreamError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Token store backend failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
}
impl Error {
	/// HTTP status code the gate answers with for this error.
	pub fn status_code(&self) -> u16 {
		match self {
			Self::Validation(_) => 400,
			Self::RateLimited(_) => 429,
			Self::Upstream(e) => e.forwarded_status(),
			Self::Auth(_) | Self::Transport(_) | Self::Config(_) | Self::Storage(_) => 500,
		}
	}

	/// Retry hint attached to rate-limit rejections.
	pub fn retry_after(&self) -> Option<Duration> {
		match self {
			Self::RateLimited(e) => Some(e.retry_after),
			_ => None,
		}
	}
}

/// Input validation failures; always user-correctable.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ValidationError {
	/// Request body was not a JSON object with the expected field types.
	#[error("Request body must be a JSON object with a string query.")]
	MalformedBody,
	/// The `query` field was missing.
	#[error("Query is required and must be a string")]
	MissingQuery,
	/// The query was blank after trimming.
	#[error("Query cannot be empty")]
	EmptyQuery,
	/// The trimmed query exceeded the maximum length.
	#[error("Query must be less than {max} characters")]
	QueryTooLong {
		/// Maximum accepted character count.
		max: usize,
	},
	/// The query contained markup-like characters.
	#[error("Query contains invalid characters")]
	InvalidCharacters,
	/// The page size was outside the accepted range.
	#[error("Limit must be between 1 and {max}")]
	LimitOutOfRange {
		/// Largest accepted page size.
		max: u32,
	},
	/// The offset was outside the accepted range.
	#[error("Offset must be between 0 and {max}")]
	OffsetOutOfRange {
		/// Largest accepted offset.
		max: u32,
	},
	/// The sort key was not one of the supported orders.
	#[error("Sort must be one of: price, -price, newlyListed, endingSoonest")]
	InvalidSort,
}

/// Rejection emitted when a caller is not admitted by the rate limiter.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Rate limit exceeded. Please wait before making more requests.")]
pub struct RateLimitError {
	/// How long the caller should wait before retrying.
	pub retry_after: Duration,
}
impl RateLimitError {
	/// Retry hint rounded up to whole seconds, as sent in `Retry-After`.
	pub fn retry_after_secs(&self) -> u64 {
		crate::rate_limit::ceil_secs(self.retry_after)
	}
}

/// Failure of the client-credentials exchange.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Failed to get OAuth token: {message}")]
pub struct AuthError {
	/// Provider- or gate-supplied summary.
	pub message: String,
	/// HTTP status code returned by the identity endpoint, when available.
	pub status: Option<u16>,
	/// Raw response body returned by the identity endpoint, when available.
	pub body: Option<String>,
}
impl AuthError {
	/// Builds an error from a summary message without upstream metadata.
	pub fn new(message: impl Into<String>) -> Self {
		Self { message: message.into(), status: None, body: None }
	}

	/// Attaches the upstream HTTP status.
	pub fn with_status(mut self, status: Option<u16>) -> Self {
		self.status = status;

		self
	}

	/// Attaches the upstream response body.
	pub fn with_body(mut self, body: Option<String>) -> Self {
		self.body = body;

		self
	}
}

/// Non-success response from the marketplace search endpoint.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Marketplace search failed: {status}")]
pub struct UpstreamError {
	/// HTTP status returned upstream.
	pub status: u16,
	/// Raw response body returned upstream.
	pub body: String,
}
impl UpstreamError {
	/// Status relayed to the gate's caller; anything that is not an error status becomes 502.
	pub fn forwarded_status(&self) -> u16 {
		if (400..=599).contains(&self.status) { self.status } else { 502 }
	}
}

/// Configuration and validation failures raised locally.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Descriptor contains an invalid URL.
	#[error("Descriptor contains an invalid URL.")]
	InvalidDescriptor {
		/// Underlying parsing failure.
		#[source]
		source: oauth2::url::ParseError,
	},
	/// Descriptor failed builder validation.
	#[error(transparent)]
	Descriptor(#[from] crate::provider::DescriptorError),
	/// Sold-item search requested on a descriptor without a Finding endpoint.
	#[error("Descriptor `{descriptor}` has no Finding API endpoint.")]
	MissingFindingEndpoint {
		/// Descriptor identifier.
		descriptor: String,
	},
	/// Required environment variable is absent.
	#[error("Environment variable `{var}` is not set.")]
	MissingEnv {
		/// Variable name.
		var: &'static str,
	},
	/// Environment variable could not be parsed.
	#[error("Environment variable `{var}` has an invalid value: {value}.")]
	InvalidEnv {
		/// Variable name.
		var: &'static str,
		/// Raw value that failed to parse.
		value: String,
	},
	/// Rate limit policy is unusable.
	#[error("Rate limit policy is invalid: {reason}.")]
	InvalidPolicy {
		/// Which constraint failed.
		reason: &'static str,
	},
	/// Token endpoint response omitted `expires_in`.
	#[error("Token endpoint response is missing expires_in.")]
	MissingExpiresIn,
	/// Token endpoint returned an excessively large `expires_in`.
	#[error("The expires_in value exceeds the supported range.")]
	ExpiresInOutOfRange,
	/// Token endpoint returned a non-positive duration.
	#[error("The expires_in value must be positive.")]
	NonPositiveExpiresIn,
}
/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling {endpoint}.")]
	Network {
		/// Which upstream endpoint was being called.
		endpoint: &'static str,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the marketplace.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(
		endpoint: &'static str,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Network { endpoint, source: Box::new(src) }
	}
}
