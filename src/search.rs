//! Search request model, validation, forwarding, and caller-side caching.
//!
//! Active listings go to the Browse API; sold listings go to the Finding API through
//! [`SearchForwarder::forward_sold`] and come back as a [`SoldItemsPage`].
//!
//! A [`SearchRequest`] is the loosely typed wire body; [`SearchRequest::validate`] turns it
//! into a [`ValidatedSearch`], the only shape the [`SearchForwarder`] and [`SearchCache`]
//! accept.

pub mod cache;
pub mod forward;
pub mod sold;
pub mod validate;

pub use cache::*;
pub use forward::*;
pub use sold::*;
pub use validate::*;

// self
use crate::_prelude::*;

/// Longest accepted query, counted in UTF-16 code units after trimming.
pub const MAX_QUERY_LENGTH: usize = 200;
/// Largest accepted page size; also the default.
pub const MAX_LIMIT: u32 = 50;
/// Largest accepted result offset.
pub const MAX_OFFSET: u32 = 10_000;

/// Search body as received from a caller, before validation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
	/// Free-text query.
	pub query: Option<String>,
	/// Page size.
	pub limit: Option<i64>,
	/// Result offset.
	pub offset: Option<i64>,
	/// Sort key.
	pub sort: Option<String>,
	/// Marketplace filter expression, forwarded verbatim.
	pub filter: Option<String>,
}
impl SearchRequest {
	/// Starts a request for `query` with every optional field unset.
	pub fn new(query: impl Into<String>) -> Self {
		Self { query: Some(query.into()), ..Default::default() }
	}

	/// Sets the page size.
	pub fn with_limit(mut self, limit: i64) -> Self {
		self.limit = Some(limit);

		self
	}

	/// Sets the result offset.
	pub fn with_offset(mut self, offset: i64) -> Self {
		self.offset = Some(offset);

		self
	}

	/// Sets the sort key.
	pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
		self.sort = Some(sort.into());

		self
	}

	/// Sets the filter expression.
	pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
		self.filter = Some(filter.into());

		self
	}
}

/// Sort orders the Browse API accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SortOrder {
	/// Cheapest first.
	PriceAscending,
	/// Most expensive first.
	PriceDescending,
	/// Most recently listed first.
	NewlyListed,
	/// Auctions closest to ending first.
	EndingSoonest,
}
impl SortOrder {
	/// Wire value of the sort key.
	pub const fn as_str(self) -> &'static str {
		match self {
			SortOrder::PriceAscending => "price",
			SortOrder::PriceDescending => "-price",
			SortOrder::NewlyListed => "newlyListed",
			SortOrder::EndingSoonest => "endingSoonest",
		}
	}
}
impl FromStr for SortOrder {
	type Err = crate::error::ValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"price" => Ok(Self::PriceAscending),
			"-price" => Ok(Self::PriceDescending),
			"newlyListed" => Ok(Self::NewlyListed),
			"endingSoonest" => Ok(Self::EndingSoonest),
			_ => Err(crate::error::ValidationError::InvalidSort),
		}
	}
}
impl Display for SortOrder {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Search parameters that passed validation, with defaults applied.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ValidatedSearch {
	/// Trimmed query.
	pub query: String,
	/// Page size in `1..=MAX_LIMIT`.
	pub limit: u32,
	/// Offset in `0..=MAX_OFFSET`.
	pub offset: u32,
	/// Optional sort order.
	pub sort: Option<SortOrder>,
	/// Optional filter expression.
	pub filter: Option<String>,
}
impl ValidatedSearch {
	/// Query-string pairs in the order they are sent upstream.
	pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
		let mut pairs = vec![
			("q", self.query.clone()),
			("limit", self.limit.to_string()),
			("offset", self.offset.to_string()),
		];

		if let Some(sort) = self.sort {
			pairs.push(("sort", sort.as_str().into()));
		}
		if let Some(filter) = &self.filter {
			pairs.push(("filter", filter.clone()));
		}

		pairs
	}

	/// Canonical URL-encoded query string; equal searches produce equal keys.
	pub fn cache_key(&self) -> String {
		url::form_urlencoded::Serializer::new(String::new())
			.extend_pairs(self.query_pairs())
			.finish()
	}
}
