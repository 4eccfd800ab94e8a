//! Input validation for search bodies.

// crates.io
use serde_json::{Map, Value};
// self
use crate::{
	_prelude::*,
	error::ValidationError,
	search::{MAX_LIMIT, MAX_OFFSET, MAX_QUERY_LENGTH, SearchRequest, SortOrder, ValidatedSearch},
};

impl SearchRequest {
	/// Parses a JSON body, tolerating missing and `null` fields.
	///
	/// Type mismatches surface as the validation error of the field they affect, so a numeric
	/// `query` reads as a missing one and a string `limit` as an out-of-range one.
	pub fn from_json(body: &[u8]) -> Result<Self, ValidationError> {
		let value = serde_json::from_slice::<Value>(body)
			.map_err(|_| ValidationError::MalformedBody)?;
		let Value::Object(fields) = value else { return Err(ValidationError::MalformedBody) };

		Ok(Self {
			query: string_field(&fields, "query", ValidationError::MissingQuery)?,
			limit: integer_field(&fields, "limit", ValidationError::LimitOutOfRange {
				max: MAX_LIMIT,
			})?,
			offset: integer_field(&fields, "offset", ValidationError::OffsetOutOfRange {
				max: MAX_OFFSET,
			})?,
			sort: string_field(&fields, "sort", ValidationError::InvalidSort)?,
			filter: string_field(&fields, "filter", ValidationError::MalformedBody)?,
		})
	}

	/// Checks every field and applies defaults (`limit = 50`, `offset = 0`).
	///
	/// Checks run in a fixed order and the first failure wins: query presence, blank query,
	/// query length, markup characters, limit, offset, sort. An empty `sort` or `filter`
	/// counts as absent.
	pub fn validate(&self) -> Result<ValidatedSearch, ValidationError> {
		let query = self.query.as_deref().ok_or(ValidationError::MissingQuery)?.trim();

		if query.is_empty() {
			return Err(ValidationError::EmptyQuery);
		}
		if query.encode_utf16().count() > MAX_QUERY_LENGTH {
			return Err(ValidationError::QueryTooLong { max: MAX_QUERY_LENGTH });
		}
		if query.contains(['<', '>', '{', '}']) {
			return Err(ValidationError::InvalidCharacters);
		}

		let limit = match self.limit {
			None => MAX_LIMIT,
			Some(limit) => u32::try_from(limit)
				.ok()
				.filter(|limit| (1..=MAX_LIMIT).contains(limit))
				.ok_or(ValidationError::LimitOutOfRange { max: MAX_LIMIT })?,
		};
		let offset = match self.offset {
			None => 0,
			Some(offset) => u32::try_from(offset)
				.ok()
				.filter(|offset| *offset <= MAX_OFFSET)
				.ok_or(ValidationError::OffsetOutOfRange { max: MAX_OFFSET })?,
		};
		let sort = match self.sort.as_deref() {
			None | Some("") => None,
			Some(sort) => Some(sort.parse::<SortOrder>()?),
		};
		let filter = self.filter.as_deref().filter(|filter| !filter.is_empty()).map(str::to_owned);

		Ok(ValidatedSearch { query: query.to_owned(), limit, offset, sort, filter })
	}
}

fn string_field(
	fields: &Map<String, Value>,
	name: &str,
	mismatch: ValidationError,
) -> Result<Option<String>, ValidationError> {
	match fields.get(name) {
		None | Some(Value::Null) => Ok(None),
		Some(Value::String(value)) => Ok(Some(value.clone())),
		Some(_) => Err(mismatch),
	}
}

fn integer_field(
	fields: &Map<String, Value>,
	name: &str,
	mismatch: ValidationError,
) -> Result<Option<i64>, ValidationError> {
	match fields.get(name) {
		None | Some(Value::Null) => Ok(None),
		Some(Value::Number(number)) => number.as_i64().map(Some).ok_or(mismatch),
		Some(_) => Err(mismatch),
	}
}
