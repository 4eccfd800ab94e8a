//! Sold-item searches against the Finding API's `findCompletedItems` operation.
//!
//! The Finding API pages by page number rather than offset and wraps every scalar in a
//! one-element array. [`SoldItemsPage`] flattens its response into the same summary shape the
//! Browse API returns, so callers can render active and sold results alike.

// self
use crate::{_prelude::*, error::UpstreamError, search::ValidatedSearch};

/// Finding API operation serving completed listings.
pub const FINDING_OPERATION: &str = "findCompletedItems";
/// Finding API error id reported once the daily call quota is spent.
pub const FINDING_QUOTA_ERROR_ID: &str = "10001";

/// One page of sold listings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoldItemsPage {
	/// Total number of sold listings matching the query.
	pub total: u64,
	/// Page size that was requested.
	pub limit: u32,
	/// Offset that was requested.
	pub offset: u32,
	/// Listings on this page.
	pub item_summaries: Vec<SoldItem>,
}
impl SoldItemsPage {
	/// Parses a `findCompletedItems` JSON body for `search`.
	///
	/// A response acknowledged as `Failure` becomes an [`UpstreamError`] carrying the first error
	/// message; the daily-quota error maps to status `429`, anything else to `502`.
	pub fn from_finding(body: &[u8], search: &ValidatedSearch) -> Result<Self, UpstreamError> {
		let malformed = || UpstreamError {
			status: 502,
			body: "Finding API returned an unexpected response.".into(),
		};
		let envelope = serde_json::from_slice::<FindingEnvelope>(body).map_err(|_| malformed())?;
		let response = envelope.responses.into_iter().next().ok_or_else(malformed)?;

		if first(&response.ack).is_some_and(|ack| ack.eq_ignore_ascii_case("failure")) {
			return Err(finding_failure(&response.error_message));
		}

		let result = response.search_result.into_iter().next().unwrap_or_default();
		let item_summaries =
			result.item.into_iter().filter_map(SoldItem::from_finding).collect::<Vec<_>>();
		let total = response
			.pagination_output
			.first()
			.and_then(|pagination| first(&pagination.total_entries))
			.or(result.count.as_deref())
			.and_then(|total| total.parse().ok())
			.unwrap_or(item_summaries.len() as u64);

		Ok(Self { total, limit: search.limit, offset: search.offset, item_summaries })
	}
}

/// A sold listing flattened from the Finding API item shape.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoldItem {
	/// Listing identifier.
	pub item_id: String,
	/// Listing title.
	pub title: String,
	/// Gallery image, empty when the listing had none.
	pub image: SoldImage,
	/// Final selling price.
	pub price: Option<SoldPrice>,
	/// Listing page.
	pub item_web_url: String,
	/// Condition label, e.g. `Pre-owned`.
	pub condition: Option<String>,
}
impl SoldItem {
	fn from_finding(item: FindingItem) -> Option<Self> {
		let price = item
			.selling_status
			.first()
			.and_then(|status| status.current_price.first())
			.map(|price| SoldPrice {
				value: price.value.clone(),
				currency: price.currency.clone(),
			});
		let condition = item
			.condition
			.first()
			.and_then(|condition| first(&condition.display_name))
			.map(str::to_owned);

		let image_url = first(&item.gallery_url).unwrap_or_default().to_owned();

		Some(Self {
			item_id: first(&item.item_id)?.to_owned(),
			title: first(&item.title).unwrap_or_default().to_owned(),
			image: SoldImage { image_url },
			price,
			item_web_url: first(&item.view_item_url).unwrap_or_default().to_owned(),
			condition,
		})
	}
}

/// Listing image reference.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoldImage {
	/// Image URL.
	pub image_url: String,
}

/// Amount and currency as reported by the Finding API.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoldPrice {
	/// Decimal amount, kept as text.
	pub value: String,
	/// ISO currency code.
	pub currency: String,
}

impl ValidatedSearch {
	/// One-based Finding API page holding `offset`.
	pub fn page_number(&self) -> u32 {
		self.offset / self.limit.max(1) + 1
	}

	/// Query-string pairs for a `findCompletedItems` call restricted to sold listings.
	///
	/// Sort and filter have no Finding API counterpart and are not sent.
	pub fn sold_query_pairs(&self) -> Vec<(&'static str, String)> {
		vec![
			("OPERATION-NAME", FINDING_OPERATION.into()),
			("SERVICE-VERSION", "1.0.0".into()),
			("RESPONSE-DATA-FORMAT", "JSON".into()),
			("REST-PAYLOAD", String::new()),
			("keywords", self.query.clone()),
			("paginationInput.entriesPerPage", self.limit.to_string()),
			("paginationInput.pageNumber", self.page_number().to_string()),
			("itemFilter(0).name", "SoldItemsOnly".into()),
			("itemFilter(0).value", "true".into()),
		]
	}
}

fn finding_failure(errors: &[FindingErrors]) -> UpstreamError {
	let error = errors.first().and_then(|errors| errors.error.first());
	let message = error
		.and_then(|error| first(&error.message))
		.unwrap_or("Finding API rejected the request.")
		.to_owned();
	let status = match error.and_then(|error| first(&error.error_id)) {
		Some(FINDING_QUOTA_ERROR_ID) => 429,
		_ => 502,
	};

	UpstreamError { status, body: message }
}

fn first(values: &[String]) -> Option<&str> {
	values.first().map(String::as_str)
}

#[derive(Debug, Deserialize)]
struct FindingEnvelope {
	#[serde(rename = "findCompletedItemsResponse")]
	responses: Vec<FindingResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FindingResponse {
	#[serde(default)]
	ack: Vec<String>,
	#[serde(default)]
	error_message: Vec<FindingErrors>,
	#[serde(default)]
	search_result: Vec<FindingSearchResult>,
	#[serde(default)]
	pagination_output: Vec<FindingPagination>,
}

#[derive(Debug, Deserialize)]
struct FindingErrors {
	#[serde(default)]
	error: Vec<FindingError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FindingError {
	#[serde(default)]
	error_id: Vec<String>,
	#[serde(default)]
	message: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FindingSearchResult {
	#[serde(rename = "@count")]
	count: Option<String>,
	#[serde(default)]
	item: Vec<FindingItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FindingPagination {
	#[serde(default)]
	total_entries: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FindingItem {
	#[serde(default)]
	item_id: Vec<String>,
	#[serde(default)]
	title: Vec<String>,
	#[serde(default, rename = "galleryURL")]
	gallery_url: Vec<String>,
	#[serde(default)]
	selling_status: Vec<FindingSellingStatus>,
	#[serde(default, rename = "viewItemURL")]
	view_item_url: Vec<String>,
	#[serde(default)]
	condition: Vec<FindingCondition>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FindingSellingStatus {
	#[serde(default)]
	current_price: Vec<FindingPrice>,
}

#[derive(Debug, Deserialize)]
struct FindingPrice {
	#[serde(rename = "__value__")]
	value: String,
	#[serde(rename = "@currencyId")]
	currency: String,
}

#[derive(Debug, Deserialize)]
struct FindingCondition {
	#[serde(default, rename = "conditionDisplayName")]
	display_name: Vec<String>,
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::search::SearchRequest;

	const COMPLETED: &str = r#"{
		"findCompletedItemsResponse": [{
			"ack": ["Success"],
			"searchResult": [{
				"@count": "2",
				"item": [
					{
						"itemId": ["1001"],
						"title": ["Leica M6"],
						"galleryURL": ["https://i.example.com/1001.jpg"],
						"viewItemURL": ["https://www.ebay.com/itm/1001"],
						"sellingStatus": [{
							"currentPrice": [{ "@currencyId": "USD", "__value__": "2450.0" }]
						}],
						"condition": [{ "conditionDisplayName": ["Used"] }]
					},
					{ "itemId": ["1002"], "title": ["Leica M3"] }
				]
			}],
			"paginationOutput": [{ "totalEntries": ["87"] }]
		}]
	}"#;

	fn search(offset: i64, limit: i64) -> ValidatedSearch {
		SearchRequest::new("leica")
			.with_offset(offset)
			.with_limit(limit)
			.validate()
			.expect("Fixture search should validate.")
	}

	#[test]
	fn offsets_map_to_one_based_pages() {
		assert_eq!(search(0, 50).page_number(), 1);
		assert_eq!(search(49, 50).page_number(), 1);
		assert_eq!(search(45, 20).page_number(), 3);

		let pairs = search(45, 20).sold_query_pairs();

		assert!(pairs.contains(&("paginationInput.entriesPerPage", "20".into())));
		assert!(pairs.contains(&("paginationInput.pageNumber", "3".into())));
		assert!(pairs.contains(&("itemFilter(0).name", "SoldItemsOnly".into())));
	}

	#[test]
	fn completed_items_flatten_into_summaries() {
		let page = SoldItemsPage::from_finding(COMPLETED.as_bytes(), &search(0, 20))
			.expect("Completed items should parse.");

		assert_eq!(page.total, 87);
		assert_eq!((page.limit, page.offset), (20, 0));
		assert_eq!(page.item_summaries.len(), 2);
		assert_eq!(
			page.item_summaries[0].price,
			Some(SoldPrice { value: "2450.0".into(), currency: "USD".into() })
		);
		assert_eq!(page.item_summaries[0].condition.as_deref(), Some("Used"));
		assert_eq!(page.item_summaries[1].image, SoldImage::default());
		assert_eq!(page.item_summaries[1].price, None);
	}

	#[test]
	fn failures_surface_as_upstream_errors() {
		let quota = br#"{"findCompletedItemsResponse":[{"ack":["Failure"],"errorMessage":[{"error":[{"errorId":["10001"],"message":["Service call has exceeded the number of times the operation is allowed to be called"]}]}]}]}"#;
		let err = SoldItemsPage::from_finding(quota, &search(0, 20))
			.expect_err("Quota failures should be reported.");

		assert_eq!(err.status, 429);
		assert!(err.body.starts_with("Service call has exceeded"));

		let err = SoldItemsPage::from_finding(b"<html/>", &search(0, 20))
			.expect_err("Non-JSON bodies should be reported.");

		assert_eq!(err.status, 502);
	}
}
