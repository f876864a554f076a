//! Boundary to the analytics backend: response models, the `DashboardApi`
//! seam, a blocking reqwest client and an in-memory demo backend.

use std::collections::HashMap;
use std::time::Duration;

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::listing::{value_text, Listing, ListingFilter, PRICE_PER_ACRE_FIELD};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("invalid API URL {url}: {message}")]
    InvalidUrl { url: String, message: String },
    #[error("HTTP client build error: {0}")]
    ClientBuild(String),
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("{url} returned HTTP {status}: {message}")]
    Status {
        url: String,
        status: u16,
        message: String,
    },
    #[error("could not decode response from {url}: {message}")]
    Decode { url: String, message: String },
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }

    fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Status { status, .. } => *status >= 500,
            Self::InvalidUrl { .. } | Self::ClientBuild(_) | Self::Decode { .. } => false,
        }
    }

    fn decode(url: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Decode {
            url: url.into(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingsEnvelope {
    pub listings: Vec<Listing>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySummary {
    #[serde(rename = "stockNumber", deserialize_with = "string_or_number")]
    pub stock_number: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub price: Value,
    #[serde(default)]
    pub acres: Value,
    #[serde(default)]
    pub score: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryField {
    pub name: String,
    pub field: String,
    #[serde(default)]
    pub value: Value,
}

impl CategoryField {
    pub fn value_text(&self) -> String {
        value_text(&self.value).unwrap_or_else(|| "N/A".to_string())
    }
}

/// Named display group on the property page, in backend order.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryRecord {
    pub name: String,
    pub fields: Vec<CategoryField>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDetail {
    pub summary: PropertySummary,
    #[serde(
        default,
        deserialize_with = "categories_from_map",
        serialize_with = "categories_to_map"
    )]
    pub categories: Vec<CategoryRecord>,
    #[serde(default)]
    pub map: Option<Coordinates>,
}

impl PropertyDetail {
    pub fn category(&self, name: &str) -> Option<&CategoryRecord> {
        self.categories.iter().find(|category| category.name == name)
    }
}

/// Chart-library figure; only `data` and `layout` are interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    pub data: Value,
    pub layout: Value,
}

impl Figure {
    /// Validates a raw payload. A figure without a `data` array is unusable.
    pub fn from_value(raw: &Value) -> Result<Self, String> {
        let object = raw
            .as_object()
            .ok_or_else(|| "figure payload is not an object".to_string())?;
        let data = object
            .get("data")
            .filter(|data| data.is_array())
            .cloned()
            .ok_or_else(|| "figure is missing a `data` array".to_string())?;
        let layout = object
            .get("layout")
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()));

        Ok(Self { data, layout })
    }
}

/// Per-property opportunity charts. Payloads stay raw so each chart can fail
/// validation on its own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpportunityCharts {
    #[serde(default)]
    pub radar_chart: Option<Value>,
    #[serde(default)]
    pub quadrant_chart: Option<Value>,
    #[serde(default)]
    pub growth_gap_chart: Option<Value>,
    #[serde(default)]
    pub advantage_chart: Option<Value>,
}

impl OpportunityCharts {
    pub fn named(&self) -> Vec<(&'static str, &'static str, Option<&Value>)> {
        vec![
            ("radar_chart", "Opportunity Radar", self.radar_chart.as_ref()),
            ("quadrant_chart", "Opportunity Quadrant", self.quadrant_chart.as_ref()),
            ("growth_gap_chart", "Growth Gap", self.growth_gap_chart.as_ref()),
            ("advantage_chart", "Competitive Advantage", self.advantage_chart.as_ref()),
        ]
    }
}

/// Portfolio-wide figures for the opportunity dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioVisualizations {
    #[serde(default)]
    pub opportunity_quadrant: Option<Value>,
    #[serde(default)]
    pub growth_gap_chart: Option<Value>,
    #[serde(default)]
    pub price_to_potential_map: Option<Value>,
    #[serde(default)]
    pub competitive_advantage_matrix: Option<Value>,
    #[serde(default)]
    pub radar_chart: Option<Value>,
}

impl PortfolioVisualizations {
    pub fn named(&self) -> Vec<(&'static str, &'static str, Option<&Value>)> {
        vec![
            (
                "opportunity-quadrant",
                "Opportunity Quadrant",
                self.opportunity_quadrant.as_ref(),
            ),
            ("growth-gap-chart", "Growth Gap", self.growth_gap_chart.as_ref()),
            (
                "price-potential-map",
                "Price to Potential",
                self.price_to_potential_map.as_ref(),
            ),
            (
                "competitive-advantage",
                "Competitive Advantage",
                self.competitive_advantage_matrix.as_ref(),
            ),
            ("example-radar", "Example Radar", self.radar_chart.as_ref()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyOption {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiReport {
    pub report: String,
}

pub trait DashboardApi: Send + Sync + 'static {
    fn listings(&self, filter: ListingFilter) -> Result<Vec<Listing>, ApiError>;
    fn property(&self, stock_number: &str) -> Result<PropertyDetail, ApiError>;
    fn property_opportunity(&self, stock_number: &str) -> Result<OpportunityCharts, ApiError>;
    fn ai_report(&self, stock_number: &str) -> Result<AiReport, ApiError>;
    fn opportunity_visualizations(&self) -> Result<PortfolioVisualizations, ApiError>;
    fn opportunity_properties(&self) -> Result<Vec<PropertyOption>, ApiError>;
    fn radar_chart(&self, property_id: &str) -> Result<Value, ApiError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpApiConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

impl Default for HttpApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            timeout_ms: 10_000,
            max_retries: 2,
            retry_backoff_ms: 200,
        }
    }
}

pub struct HttpDashboardApi {
    client: reqwest::blocking::Client,
    cfg: HttpApiConfig,
}

impl HttpDashboardApi {
    pub fn new(cfg: HttpApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()
            .map_err(|err| ApiError::ClientBuild(err.to_string()))?;
        Ok(Self { client, cfg })
    }

    pub fn endpoint(
        &self,
        segments: &[&str],
        query: Option<(&str, &str)>,
    ) -> Result<reqwest::Url, ApiError> {
        let invalid = |message: String| ApiError::InvalidUrl {
            url: self.cfg.base_url.clone(),
            message,
        };

        let mut url = reqwest::Url::parse(&self.cfg.base_url).map_err(|err| invalid(err.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid("base URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        if let Some((key, value)) = query {
            url.query_pairs_mut().append_pair(key, value);
        }

        Ok(url)
    }

    fn get_json<T: DeserializeOwned>(&self, url: reqwest::Url) -> Result<T, ApiError> {
        let body = retry(&self.cfg, || self.get_bytes(&url))?;
        serde_json::from_slice(&body).map_err(|err| ApiError::decode(url.as_str(), err))
    }

    fn get_bytes(&self, url: &reqwest::Url) -> Result<Vec<u8>, ApiError> {
        debug!(component = "api", event = "api.request", url = %url);
        let response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|err| ApiError::Transport {
                url: url.to_string(),
                message: err.to_string(),
            })?;

        let status = response.status();
        let body = response.bytes().map_err(|err| ApiError::Transport {
            url: url.to_string(),
            message: err.to_string(),
        })?;

        if !status.is_success() {
            return Err(ApiError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                message: error_message(&body).unwrap_or_else(|| status.to_string()),
            });
        }

        Ok(body.to_vec())
    }
}

impl DashboardApi for HttpDashboardApi {
    fn listings(&self, filter: ListingFilter) -> Result<Vec<Listing>, ApiError> {
        let url = self.endpoint(&["api", "listings"], Some(("filter", filter.as_str())))?;
        let envelope: ListingsEnvelope = self.get_json(url)?;
        Ok(envelope.listings)
    }

    fn property(&self, stock_number: &str) -> Result<PropertyDetail, ApiError> {
        self.get_json(self.endpoint(&["api", "property", stock_number], None)?)
    }

    fn property_opportunity(&self, stock_number: &str) -> Result<OpportunityCharts, ApiError> {
        self.get_json(self.endpoint(&["api", "property", stock_number, "opportunity"], None)?)
    }

    fn ai_report(&self, stock_number: &str) -> Result<AiReport, ApiError> {
        self.get_json(self.endpoint(&["api", "property", stock_number, "ai-report"], None)?)
    }

    fn opportunity_visualizations(&self) -> Result<PortfolioVisualizations, ApiError> {
        self.get_json(self.endpoint(&["api", "opportunity", "visualizations"], None)?)
    }

    fn opportunity_properties(&self) -> Result<Vec<PropertyOption>, ApiError> {
        self.get_json(self.endpoint(&["api", "opportunity", "properties"], None)?)
    }

    fn radar_chart(&self, property_id: &str) -> Result<Value, ApiError> {
        self.get_json(self.endpoint(&["api", "opportunity", "radar-chart", property_id], None)?)
    }
}

fn retry<T>(
    cfg: &HttpApiConfig,
    mut f: impl FnMut() -> Result<T, ApiError>,
) -> Result<T, ApiError> {
    let mut attempt: u32 = 0;
    loop {
        match f() {
            Ok(value) => return Ok(value),
            Err(err) if attempt >= cfg.max_retries || !err.is_retryable() => return Err(err),
            Err(err) => {
                attempt = attempt.saturating_add(1);
                let shift = attempt.saturating_sub(1).min(10);
                let sleep_ms = cfg.retry_backoff_ms.saturating_mul(1u64 << shift);
                warn!(
                    component = "api",
                    event = "api.retry",
                    attempt,
                    sleep_ms,
                    error = %err
                );
                std::thread::sleep(Duration::from_millis(sleep_ms));
            }
        }
    }
}

fn error_message(body: &[u8]) -> Option<String> {
    let parsed: Value = serde_json::from_slice(body).ok()?;
    parsed.get("error")?.as_str().map(str::to_string)
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(text),
        Value::Number(number) => Ok(number.to_string()),
        other => Err(D::Error::custom(format!(
            "expected string or number, found {other}"
        ))),
    }
}

fn categories_from_map<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<CategoryRecord>, D::Error> {
    let raw = Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default();
    raw.into_iter()
        .map(|(name, fields)| {
            let fields = match fields {
                Value::Null => Vec::new(),
                other => serde_json::from_value(other).map_err(|err| {
                    D::Error::custom(format!("category `{name}` is malformed: {err}"))
                })?,
            };
            Ok(CategoryRecord { name, fields })
        })
        .collect()
}

fn categories_to_map<S: Serializer>(
    categories: &[CategoryRecord],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let map: Map<String, Value> = categories
        .iter()
        .map(|category| {
            let fields = category
                .fields
                .iter()
                .map(|field| json!({"name": field.name, "field": field.field, "value": field.value}))
                .collect();
            (category.name.clone(), Value::Array(fields))
        })
        .collect();
    map.serialize(serializer)
}

/// Backend stand-in used by the demo server and the tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDashboardApi {
    pub listings: Vec<Listing>,
    pub properties: HashMap<String, PropertyDetail>,
    pub opportunity: HashMap<String, OpportunityCharts>,
    pub reports: HashMap<String, String>,
    pub visualizations: PortfolioVisualizations,
    pub property_options: Vec<PropertyOption>,
    pub radar_charts: HashMap<String, Value>,
}

impl InMemoryDashboardApi {
    pub fn demo() -> Self {
        crate::demo::demo_api()
    }

    fn not_found(path: String, what: &str) -> ApiError {
        ApiError::Status {
            url: path,
            status: 404,
            message: format!("{what} not found"),
        }
    }
}

impl DashboardApi for InMemoryDashboardApi {
    fn listings(&self, filter: ListingFilter) -> Result<Vec<Listing>, ApiError> {
        let priced = |listing: &Listing| {
            listing
                .field_text(PRICE_PER_ACRE_FIELD)
                .is_some_and(|text| !text.is_empty() && text != "N/A")
        };

        Ok(self
            .listings
            .iter()
            .filter(|listing| match filter {
                ListingFilter::All => true,
                ListingFilter::Priced => priced(*listing),
                ListingFilter::Nonpriced => !priced(*listing),
            })
            .cloned()
            .collect())
    }

    fn property(&self, stock_number: &str) -> Result<PropertyDetail, ApiError> {
        self.properties.get(stock_number).cloned().ok_or_else(|| {
            Self::not_found(
                format!("/api/property/{stock_number}"),
                &format!("Property with stock number {stock_number}"),
            )
        })
    }

    fn property_opportunity(&self, stock_number: &str) -> Result<OpportunityCharts, ApiError> {
        self.opportunity.get(stock_number).cloned().ok_or_else(|| {
            Self::not_found(
                format!("/api/property/{stock_number}/opportunity"),
                "Opportunity analysis",
            )
        })
    }

    fn ai_report(&self, stock_number: &str) -> Result<AiReport, ApiError> {
        self.reports
            .get(stock_number)
            .map(|report| AiReport {
                report: report.clone(),
            })
            .ok_or_else(|| {
                Self::not_found(format!("/api/property/{stock_number}/ai-report"), "AI report")
            })
    }

    fn opportunity_visualizations(&self) -> Result<PortfolioVisualizations, ApiError> {
        Ok(self.visualizations.clone())
    }

    fn opportunity_properties(&self) -> Result<Vec<PropertyOption>, ApiError> {
        Ok(self.property_options.clone())
    }

    fn radar_chart(&self, property_id: &str) -> Result<Value, ApiError> {
        self.radar_charts.get(property_id).cloned().ok_or_else(|| {
            Self::not_found(
                format!("/api/opportunity/radar-chart/{property_id}"),
                "Radar chart",
            )
        })
    }
}
