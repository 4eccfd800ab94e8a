//! Marketplace descriptors: endpoints, OAuth scopes, and fixed request context.
//!
//! A [`MarketplaceDescriptor`] is validated data only. The token manager reads the identity
//! endpoint and scopes from it; the search forwarder reads the search and Finding endpoints
//! and the marketplace-context headers. Built-in presets cover the eBay production and
//! sandbox environments.

pub mod builder;

pub use builder::*;

// self
use crate::_prelude::*;

/// OAuth scope granting application-level access to the public Browse API.
pub const EBAY_PUBLIC_SCOPE: &str = "https://api.ebay.com/oauth/api_scope";

/// Deployment environment of the marketplace API.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
	#[default]
	/// Live marketplace traffic.
	Production,
	/// Developer sandbox.
	Sandbox,
}
impl Environment {
	/// Host serving both the identity and the Browse API for this environment.
	pub const fn api_host(self) -> &'static str {
		match self {
			Environment::Production => "https://api.ebay.com",
			Environment::Sandbox => "https://api.sandbox.ebay.com",
		}
	}

	/// Host serving the legacy Finding API, used for sold-item searches.
	pub const fn finding_host(self) -> &'static str {
		match self {
			Environment::Production => "https://svcs.ebay.com",
			Environment::Sandbox => "https://svcs.sandbox.ebay.com",
		}
	}
}
impl FromStr for Environment {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"production" | "prod" => Ok(Self::Production),
			"sandbox" => Ok(Self::Sandbox),
			other => Err(other.to_owned()),
		}
	}
}

/// Endpoint set declared by a descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketplaceEndpoints {
	/// Identity endpoint used for the client-credentials exchange.
	pub token: Url,
	/// Item-summary search endpoint requests are forwarded to.
	pub search: Url,
	/// Finding API endpoint serving completed (sold) listings, if the marketplace has one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub finding: Option<Url>,
}

/// Fixed headers describing which marketplace and buyer locale a search targets.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketplaceContext {
	/// Value of `X-EBAY-C-MARKETPLACE-ID`.
	pub marketplace_id: String,
	/// Value of `X-EBAY-C-ENDUSERCTX`.
	pub end_user_context: String,
}
impl MarketplaceContext {
	/// Finding API global id for the marketplace, e.g. `EBAY-US` for `EBAY_US`.
	pub fn global_id(&self) -> String {
		self.marketplace_id.replace('_', "-")
	}
}
impl Default for MarketplaceContext {
	fn default() -> Self {
		Self {
			marketplace_id: "EBAY_US".into(),
			end_user_context: "contextualLocation=country%3DUS".into(),
		}
	}
}

/// Immutable marketplace descriptor consumed by the token manager and the forwarder.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketplaceDescriptor {
	/// Descriptor identifier used in logs.
	pub id: String,
	/// Endpoint definitions.
	pub endpoints: MarketplaceEndpoints,
	/// Scopes requested during the client-credentials exchange.
	pub scopes: Vec<String>,
	/// Marketplace-context headers attached to every search.
	pub context: MarketplaceContext,
}
impl MarketplaceDescriptor {
	/// Creates a new builder for the provided identifier.
	pub fn builder(id: impl Into<String>) -> MarketplaceDescriptorBuilder {
		MarketplaceDescriptorBuilder::new(id)
	}

	/// Descriptor for the eBay Browse API in the given environment.
	pub fn ebay(environment: Environment) -> Result<Self, DescriptorError> {
		let parse = |host: &str, path: &str| {
			Url::parse(&format!("{host}{path}"))
				.map_err(|e| DescriptorError::InvalidUrl { message: e.to_string() })
		};
		let api = environment.api_host();

		Self::builder(match environment {
			Environment::Production => "ebay",
			Environment::Sandbox => "ebay-sandbox",
		})
		.token_endpoint(parse(api, "/identity/v1/oauth2/token")?)
		.search_endpoint(parse(api, "/buy/browse/v1/item_summary/search")?)
		.finding_endpoint(parse(
			environment.finding_host(),
			"/services/search/FindingService/v1",
		)?)
		.build()
	}

	/// Scopes joined with spaces, as sent in the `scope` form field.
	pub fn scope_param(&self) -> String {
		self.scopes.join(" ")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn ebay_presets_point_at_the_right_hosts() {
		let production = MarketplaceDescriptor::ebay(Environment::Production)
			.expect("Production preset should build.");
		let sandbox =
			MarketplaceDescriptor::ebay(Environment::Sandbox).expect("Sandbox preset should build.");

		assert_eq!(
			production.endpoints.token.as_str(),
			"https://api.ebay.com/identity/v1/oauth2/token"
		);
		assert_eq!(
			sandbox.endpoints.search.as_str(),
			"https://api.sandbox.ebay.com/buy/browse/v1/item_summary/search"
		);
		assert_eq!(
			sandbox.endpoints.finding.as_ref().map(Url::as_str),
			Some("https://svcs.sandbox.ebay.com/services/search/FindingService/v1")
		);
		assert_eq!(production.scope_param(), EBAY_PUBLIC_SCOPE);
		assert_eq!(production.context.marketplace_id, "EBAY_US");
		assert_eq!(production.context.global_id(), "EBAY-US");
	}

	#[test]
	fn environment_parses_loosely() {
		assert_eq!("Sandbox".parse::<Environment>(), Ok(Environment::Sandbox));
		assert_eq!(" prod ".parse::<Environment>(), Ok(Environment::Production));
		assert_eq!("staging".parse::<Environment>(), Err("staging".to_owned()));
	}
}
