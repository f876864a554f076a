//! Listing records plus the client-side sort and search engine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::numeric::parse_numeric_or_zero;

pub const STOCK_NUMBER_FIELD: &str = "StockNumber";
pub const SCORE_FIELD: &str = "Score";
pub const SALE_PRICE_FIELD: &str = "Sale Price";
pub const PRICE_PER_ACRE_FIELD: &str = "Price/Acre";

/// One property record as exposed by the backend.
///
/// The field set is open: whatever keys the API sends are kept, in order, and
/// flow through sort, search and export untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Listing {
    fields: Map<String, Value>,
}

impl Listing {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn stock_number(&self) -> Option<String> {
        self.field_text(STOCK_NUMBER_FIELD)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// String form of a field; `None` for missing or null values.
    pub fn field_text(&self, key: &str) -> Option<String> {
        self.fields.get(key).and_then(value_text)
    }

    fn matches_term(&self, lowered_term: &str) -> bool {
        self.fields
            .values()
            .filter_map(value_text)
            .any(|text| text.to_lowercase().contains(lowered_term))
    }
}

impl From<Map<String, Value>> for Listing {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseOptionError {
    kind: &'static str,
    value: String,
}

impl ParseOptionError {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortSpec {
    #[default]
    #[serde(rename = "score-desc")]
    ScoreDesc,
    #[serde(rename = "score-asc")]
    ScoreAsc,
    #[serde(rename = "price-desc")]
    PriceDesc,
    #[serde(rename = "price-asc")]
    PriceAsc,
}

impl SortSpec {
    pub const ALL: [SortSpec; 4] = [
        SortSpec::ScoreDesc,
        SortSpec::ScoreAsc,
        SortSpec::PriceDesc,
        SortSpec::PriceAsc,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ScoreDesc => "score-desc",
            Self::ScoreAsc => "score-asc",
            Self::PriceDesc => "price-desc",
            Self::PriceAsc => "price-asc",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::ScoreDesc => "Score (high to low)",
            Self::ScoreAsc => "Score (low to high)",
            Self::PriceDesc => "Price (high to low)",
            Self::PriceAsc => "Price (low to high)",
        }
    }

    fn sort_field(self) -> &'static str {
        match self {
            Self::ScoreDesc | Self::ScoreAsc => SCORE_FIELD,
            Self::PriceDesc | Self::PriceAsc => SALE_PRICE_FIELD,
        }
    }

    fn descending(self) -> bool {
        matches!(self, Self::ScoreDesc | Self::PriceDesc)
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortSpec {
    type Err = ParseOptionError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|spec| spec.as_str() == raw.trim())
            .ok_or_else(|| ParseOptionError::new("sort", raw))
    }
}

/// Server-side listing filter; the client only forwards it to the API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingFilter {
    #[default]
    All,
    Priced,
    Nonpriced,
}

impl ListingFilter {
    pub const ALL: [ListingFilter; 3] = [
        ListingFilter::All,
        ListingFilter::Priced,
        ListingFilter::Nonpriced,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Priced => "priced",
            Self::Nonpriced => "nonpriced",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::All => "All Properties",
            Self::Priced => "Priced",
            Self::Nonpriced => "Non-Priced",
        }
    }
}

impl fmt::Display for ListingFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListingFilter {
    type Err = ParseOptionError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|filter| filter.as_str() == raw.trim())
            .ok_or_else(|| ParseOptionError::new("filter", raw))
    }
}

/// Stable in-place sort; ties keep their input order.
pub fn sort_listings(listings: &mut [Listing], spec: SortSpec) {
    let field = spec.sort_field();
    listings.sort_by(|a, b| {
        let left = parse_numeric_or_zero(a.get(field));
        let right = parse_numeric_or_zero(b.get(field));
        let ordering = left.total_cmp(&right);
        if spec.descending() {
            ordering.reverse()
        } else {
            ordering
        }
    });
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult<'a> {
    pub rows: Vec<&'a Listing>,
    pub total_count: usize,
}

impl SearchResult<'_> {
    pub fn visible_count(&self) -> usize {
        self.rows.len()
    }

    /// Zero visible rows is its own display state, not just an empty table.
    pub fn is_empty_state(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Case-insensitive substring search across every field of every listing.
pub fn search_listings<'a>(listings: &'a [Listing], term: &str) -> SearchResult<'a> {
    let lowered = normalize_term(term);
    let rows = if lowered.is_empty() {
        listings.iter().collect()
    } else {
        listings
            .iter()
            .filter(|listing| listing.matches_term(&lowered))
            .collect()
    };

    SearchResult {
        rows,
        total_count: listings.len(),
    }
}

pub fn normalize_term(term: &str) -> String {
    term.trim().to_lowercase()
}

/// Text form of a JSON value as shown to users and matched by search.
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number_text(number)),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

fn number_text(number: &serde_json::Number) -> String {
    if let Some(int) = number.as_i64() {
        return int.to_string();
    }
    if let Some(uint) = number.as_u64() {
        return uint.to_string();
    }
    // f64 Display already drops a trailing `.0`.
    number
        .as_f64()
        .map(|float| float.to_string())
        .unwrap_or_else(|| number.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn listing(value: Value) -> Listing {
        serde_json::from_value(value).expect("fixture should be an object")
    }

    fn stock_numbers(listings: &[Listing]) -> Vec<String> {
        listings
            .iter()
            .map(|listing| listing.stock_number().unwrap_or_default())
            .collect()
    }

    fn fixture() -> Vec<Listing> {
        vec![
            listing(json!({"StockNumber": "A1", "Score": "0.82", "Sale Price": "$100,000", "County": "Pima"})),
            listing(json!({"StockNumber": "A2", "Score": "0.40", "Sale Price": "$250,000", "County": "Maricopa"})),
            listing(json!({"StockNumber": "A3", "Score": 0.91, "Sale Price": "N/A", "County": null})),
            listing(json!({"StockNumber": "A4", "Score": "N/A", "Sale Price": "$75,500", "County": "Yavapai"})),
        ]
    }

    #[test]
    fn price_asc_orders_formatted_prices_numerically() {
        let mut listings = vec![
            listing(json!({"StockNumber": "A1", "Score": "0.82", "Sale Price": "$100,000"})),
            listing(json!({"StockNumber": "A2", "Score": "0.40", "Sale Price": "$250,000"})),
        ];

        sort_listings(&mut listings, SortSpec::PriceAsc);
        assert_eq!(stock_numbers(&listings), vec!["A1", "A2"]);

        sort_listings(&mut listings, SortSpec::PriceDesc);
        assert_eq!(stock_numbers(&listings), vec!["A2", "A1"]);
    }

    #[test]
    fn unparsable_sort_keys_count_as_zero() {
        let mut listings = fixture();
        sort_listings(&mut listings, SortSpec::ScoreDesc);
        assert_eq!(stock_numbers(&listings), vec!["A3", "A1", "A2", "A4"]);

        sort_listings(&mut listings, SortSpec::PriceAsc);
        assert_eq!(stock_numbers(&listings), vec!["A3", "A4", "A1", "A2"]);
    }

    #[test]
    fn score_asc_reverses_score_desc() {
        let mut listings = fixture();
        sort_listings(&mut listings, SortSpec::ScoreDesc);
        let descending = stock_numbers(&listings);

        sort_listings(&mut listings, SortSpec::ScoreAsc);
        let mut ascending = stock_numbers(&listings);
        ascending.reverse();

        assert_eq!(descending, ascending);
    }

    #[test]
    fn ties_keep_input_order() {
        let mut listings = vec![
            listing(json!({"StockNumber": "T1", "Score": "0.5"})),
            listing(json!({"StockNumber": "T2", "Score": "0.9"})),
            listing(json!({"StockNumber": "T3", "Score": "0.5"})),
        ];

        sort_listings(&mut listings, SortSpec::ScoreAsc);
        assert_eq!(stock_numbers(&listings), vec!["T1", "T3", "T2"]);
    }

    #[test]
    fn sorting_never_touches_field_values() {
        let original = fixture();
        let mut listings = original.clone();
        sort_listings(&mut listings, SortSpec::PriceDesc);

        for listing in &original {
            assert!(listings.contains(listing));
        }
    }

    #[test]
    fn empty_term_returns_everything_in_order() {
        let listings = fixture();
        let result = search_listings(&listings, "   ");

        assert_eq!(result.visible_count(), listings.len());
        assert_eq!(result.total_count, listings.len());
        assert!(!result.is_empty_state());
        assert!(result
            .rows
            .iter()
            .zip(listings.iter())
            .all(|(found, original)| std::ptr::eq(*found, original)));
    }

    #[test]
    fn search_is_case_insensitive_across_all_fields() {
        let listings = fixture();
        let result = search_listings(&listings, "  MARICOPA ");
        assert_eq!(result.visible_count(), 1);
        assert_eq!(result.rows[0].stock_number().as_deref(), Some("A2"));

        let numeric = search_listings(&listings, "0.91");
        assert_eq!(numeric.visible_count(), 1);
        assert_eq!(numeric.rows[0].stock_number().as_deref(), Some("A3"));
    }

    #[test]
    fn null_fields_never_match() {
        let listings = fixture();
        let result = search_listings(&listings, "null");
        assert!(result.is_empty_state());
    }

    #[test]
    fn non_matching_term_sets_empty_state() {
        let listings = fixture();
        let result = search_listings(&listings, "xyz-no-match");

        assert_eq!(result.visible_count(), 0);
        assert_eq!(result.total_count, 4);
        assert!(result.is_empty_state());
    }

    #[test]
    fn unknown_keys_survive_round_trip_in_order() {
        let record = listing(json!({"Zeta": 1, "StockNumber": "Q9", "Alpha": [1, 2]}));
        let keys: Vec<&str> = record.keys().collect();
        assert_eq!(keys, vec!["Zeta", "StockNumber", "Alpha"]);
        assert_eq!(record.field_text("Alpha").as_deref(), Some("[1,2]"));
    }

    #[test]
    fn sort_and_filter_options_parse_from_query_strings() {
        assert_eq!("price-asc".parse::<SortSpec>(), Ok(SortSpec::PriceAsc));
        assert_eq!("nonpriced".parse::<ListingFilter>(), Ok(ListingFilter::Nonpriced));
        assert!("cheapest".parse::<SortSpec>().is_err());
        assert_eq!(SortSpec::default(), SortSpec::ScoreDesc);
        assert_eq!(ListingFilter::default().to_string(), "all");
    }

    #[test]
    fn numbers_stringify_without_trailing_zero() {
        assert_eq!(value_text(&json!(12.0)).as_deref(), Some("12"));
        assert_eq!(value_text(&json!(0.5)).as_deref(), Some("0.5"));
        assert_eq!(value_text(&json!(7)).as_deref(), Some("7"));
        assert_eq!(value_text(&Value::Null), None);
    }
}
