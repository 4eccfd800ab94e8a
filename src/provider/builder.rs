//! Descriptor builder and validation errors.

// self
use crate::{
	_prelude::*,
	provider::{
		EBAY_PUBLIC_SCOPE, MarketplaceContext, MarketplaceDescriptor, MarketplaceEndpoints,
	},
};

/// Errors raised while constructing or validating descriptors.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum DescriptorError {
	/// Identity endpoint is mandatory.
	#[error("Missing token endpoint.")]
	MissingTokenEndpoint,
	/// Search endpoint is mandatory.
	#[error("Missing search endpoint.")]
	MissingSearchEndpoint,
	/// At least one scope must be requested.
	#[error("Descriptor must request at least one scope.")]
	NoScopes,
	/// A preset URL failed to parse.
	#[error("Descriptor URL is invalid: {message}.")]
	InvalidUrl {
		/// Parser message.
		message: String,
	},
	/// Endpoints must use HTTPS unless they point at a loopback host.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Header values must be printable ASCII.
	#[error("The {header} header value is not printable ASCII.")]
	InvalidHeaderValue {
		/// Which header failed validation.
		header: &'static str,
	},
}

/// Builder for [`MarketplaceDescriptor`] values.
#[derive(Debug)]
pub struct MarketplaceDescriptorBuilder {
	/// Identifier for the descriptor being constructed.
	pub id: String,
	/// Identity endpoint used for token exchanges.
	pub token_endpoint: Option<Url>,
	/// Search endpoint requests are forwarded to.
	pub search_endpoint: Option<Url>,
	/// Optional Finding API endpoint for sold-item searches.
	pub finding_endpoint: Option<Url>,
	/// Requested scopes; defaults to the public Browse scope.
	pub scopes: Vec<String>,
	/// Marketplace-context headers.
	pub context: MarketplaceContext,
}
impl MarketplaceDescriptorBuilder {
	/// Creates a new builder seeded with the provided identifier.
	pub fn new(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			token_endpoint: None,
			search_endpoint: None,
			finding_endpoint: None,
			scopes: vec![EBAY_PUBLIC_SCOPE.into()],
			context: MarketplaceContext::default(),
		}
	}

	/// Sets the identity endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Sets the search endpoint.
	pub fn search_endpoint(mut self, url: Url) -> Self {
		self.search_endpoint = Some(url);

		self
	}

	/// Sets the Finding API endpoint used for sold-item searches.
	pub fn finding_endpoint(mut self, url: Url) -> Self {
		self.finding_endpoint = Some(url);

		self
	}

	/// Replaces the requested scopes.
	pub fn scopes<I, S>(mut self, scopes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.scopes = scopes.into_iter().map(Into::into).collect();

		self
	}

	/// Overrides the marketplace-context headers.
	pub fn context(mut self, context: MarketplaceContext) -> Self {
		self.context = context;

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<MarketplaceDescriptor, DescriptorError> {
		let token = self.token_endpoint.ok_or(DescriptorError::MissingTokenEndpoint)?;
		let search = self.search_endpoint.ok_or(DescriptorError::MissingSearchEndpoint)?;
		let scopes = self
			.scopes
			.into_iter()
			.map(|scope| scope.trim().to_owned())
			.filter(|scope| !scope.is_empty())
			.collect::<Vec<_>>();
		let descriptor = MarketplaceDescriptor {
			id: self.id,
			endpoints: MarketplaceEndpoints { token, search, finding: self.finding_endpoint },
			scopes,
			context: self.context,
		};

		descriptor.validate()?;

		Ok(descriptor)
	}
}

impl MarketplaceDescriptor {
	fn validate(&self) -> Result<(), DescriptorError> {
		if self.scopes.is_empty() {
			return Err(DescriptorError::NoScopes);
		}

		validate_endpoint("token", &self.endpoints.token)?;
		validate_endpoint("search", &self.endpoints.search)?;

		if let Some(finding) = &self.endpoints.finding {
			validate_endpoint("finding", finding)?;
		}

		validate_header("X-EBAY-C-MARKETPLACE-ID", &self.context.marketplace_id)?;
		validate_header("X-EBAY-C-ENDUSERCTX", &self.context.end_user_context)?;

		Ok(())
	}
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), DescriptorError> {
	let loopback = matches!(url.host_str(), Some("localhost" | "127.0.0.1" | "[::1]"));

	match url.scheme() {
		"https" => Ok(()),
		"http" if loopback => Ok(()),
		_ => Err(DescriptorError::InsecureEndpoint { endpoint: name, url: url.to_string() }),
	}
}

fn validate_header(header: &'static str, value: &str) -> Result<(), DescriptorError> {
	if !value.is_empty() && value.bytes().all(|b| b.is_ascii_graphic() || b == b' ') {
		Ok(())
	} else {
		Err(DescriptorError::InvalidHeaderValue { header })
	}
}
