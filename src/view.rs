//! Per-page view state machines.
//!
//! Every fetch is tagged with a [`RequestTicket`]. A completion whose ticket
//! is older than the latest one issued for the same slot is discarded, so the
//! most recently issued request always wins regardless of arrival order.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::{
    AiReport, ApiError, Coordinates, OpportunityCharts, PortfolioVisualizations, PropertyDetail,
    PropertyOption,
};
use crate::export::{listings_to_csv, property_to_json, ExportError, ExportFile};
use crate::histogram::{price_per_acre_distribution, score_distribution, BinSet};
use crate::listing::{
    normalize_term, search_listings, sort_listings, Listing, ListingFilter, ParseOptionError,
    SearchResult, SortSpec,
};
use crate::table::{listing_rows, ListingRow};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    #[error("{section}: {message}")]
    Network {
        section: String,
        message: String,
        not_found: bool,
    },
    #[error("{section}: unexpected data ({message})")]
    DataFormat { section: String, message: String },
}

impl ViewError {
    pub fn from_api(section: &str, err: ApiError) -> Self {
        match err {
            ApiError::Decode { message, .. } => Self::DataFormat {
                section: section.to_string(),
                message,
            },
            other => Self::Network {
                section: section.to_string(),
                not_found: other.is_not_found(),
                message: match other {
                    ApiError::Status { message, .. } => message,
                    other => other.to_string(),
                },
            },
        }
    }

    pub fn data_format(section: &str, message: impl Into<String>) -> Self {
        Self::DataFormat {
            section: section.to_string(),
            message: message.into(),
        }
    }

    pub fn section(&self) -> &str {
        match self {
            Self::Network { section, .. } | Self::DataFormat { section, .. } => section,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Network { not_found: true, .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadState<T> {
    Idle,
    Loading,
    Loaded(T),
    Failed(ViewError),
}

impl<T> LoadState<T> {
    pub fn loaded(&self) -> Option<&T> {
        match self {
            Self::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ViewError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Loaded(_) => "loaded",
            Self::Failed(_) => "failed",
        }
    }
}

impl<T> From<Result<T, ViewError>> for LoadState<T> {
    fn from(result: Result<T, ViewError>) -> Self {
        match result {
            Ok(value) => Self::Loaded(value),
            Err(err) => Self::Failed(err),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    generation: u64,
}

impl RequestTicket {
    pub fn generation(self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    Stale,
}

/// One independently loadable, retryable slot.
#[derive(Debug, Clone)]
pub struct Loader<T> {
    state: LoadState<T>,
    generation: u64,
}

impl<T> Default for Loader<T> {
    fn default() -> Self {
        Self {
            state: LoadState::Idle,
            generation: 0,
        }
    }
}

impl<T> Loader<T> {
    pub fn state(&self) -> &LoadState<T> {
        &self.state
    }

    /// Enters `Loading` and supersedes any request still in flight.
    pub fn begin(&mut self) -> RequestTicket {
        self.generation += 1;
        self.state = LoadState::Loading;
        RequestTicket {
            generation: self.generation,
        }
    }

    /// Lazy activation: `None` once loaded, so the cached value is reused.
    pub fn activate(&mut self) -> Option<RequestTicket> {
        match self.state {
            LoadState::Loaded(_) => None,
            _ => Some(self.begin()),
        }
    }

    /// True while no newer request has been issued for this slot.
    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        ticket.generation == self.generation
    }

    pub fn complete(&mut self, ticket: RequestTicket, result: Result<T, ViewError>) -> Completion {
        if !self.is_current(ticket) {
            debug!(
                component = "view",
                event = "view.stale_response",
                ticket_generation = ticket.generation,
                current_generation = self.generation
            );
            return Completion::Stale;
        }

        self.state = match result {
            Ok(value) => LoadState::Loaded(value),
            Err(err) => {
                warn!(
                    component = "view",
                    event = "view.load.error",
                    section = err.section(),
                    error = %err
                );
                LoadState::Failed(err)
            }
        };
        Completion::Applied
    }

    fn loaded_mut(&mut self) -> Option<&mut T> {
        match &mut self.state {
            LoadState::Loaded(value) => Some(value),
            _ => None,
        }
    }
}

/// Everything the dashboard page shows for one render pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardRender {
    pub rows: Vec<ListingRow>,
    pub visible_count: usize,
    pub total_count: usize,
    pub empty_state: bool,
    pub score_bins: BinSet,
    pub price_bins: BinSet,
}

/// State of one dashboard page view.
#[derive(Debug, Clone, Default)]
pub struct DashboardView {
    filter: ListingFilter,
    sort: SortSpec,
    search_term: String,
    listings: Loader<Vec<Listing>>,
}

impl DashboardView {
    pub fn new(filter: ListingFilter, sort: SortSpec) -> Self {
        Self {
            filter,
            sort,
            ..Self::default()
        }
    }

    pub fn filter(&self) -> ListingFilter {
        self.filter
    }

    pub fn sort(&self) -> SortSpec {
        self.sort
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn state(&self) -> &LoadState<Vec<Listing>> {
        self.listings.state()
    }

    pub fn begin_load(&mut self) -> RequestTicket {
        self.listings.begin()
    }

    /// Refetches unless listings are already held: first render, retry after
    /// a failure, or a reload while an earlier request is still out.
    pub fn reload_unless_loaded(&mut self) -> Option<RequestTicket> {
        match self.listings.state() {
            LoadState::Loaded(_) => None,
            _ => Some(self.listings.begin()),
        }
    }

    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        self.listings.is_current(ticket)
    }

    /// A view already holding `result`, for a response whose page view has
    /// moved on to a newer request.
    pub fn settled(
        filter: ListingFilter,
        sort: SortSpec,
        search_term: &str,
        result: Result<Vec<Listing>, ViewError>,
    ) -> Self {
        let mut view = Self::new(filter, sort);
        view.set_search(search_term);
        let ticket = view.begin_load();
        view.complete_load(ticket, result);
        view
    }

    /// Switching filters refetches; selecting the active filter is a no-op.
    pub fn set_filter(&mut self, filter: ListingFilter) -> Option<RequestTicket> {
        if filter == self.filter && !matches!(self.listings.state(), LoadState::Idle) {
            return None;
        }
        self.filter = filter;
        Some(self.listings.begin())
    }

    pub fn complete_load(
        &mut self,
        ticket: RequestTicket,
        result: Result<Vec<Listing>, ViewError>,
    ) -> Completion {
        let completion = self.listings.complete(ticket, result);
        if completion == Completion::Applied {
            let sort = self.sort;
            if let Some(listings) = self.listings.loaded_mut() {
                sort_listings(listings, sort);
                info!(
                    component = "view",
                    event = "view.load.ok",
                    section = "listings",
                    filter = %self.filter,
                    count = listings.len()
                );
            }
        }
        completion
    }

    pub fn set_sort(&mut self, sort: SortSpec) {
        self.sort = sort;
        if let Some(listings) = self.listings.loaded_mut() {
            sort_listings(listings, sort);
        }
    }

    pub fn set_search(&mut self, term: &str) {
        self.search_term = normalize_term(term);
    }

    pub fn listings(&self) -> &[Listing] {
        self.listings.state().loaded().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn visible(&self) -> SearchResult<'_> {
        search_listings(self.listings(), &self.search_term)
    }

    pub fn render(&self) -> DashboardRender {
        let visible = self.visible();
        DashboardRender {
            rows: listing_rows(visible.rows.iter().copied()),
            visible_count: visible.visible_count(),
            total_count: visible.total_count,
            empty_state: visible.is_empty_state(),
            score_bins: score_distribution(self.listings()),
            price_bins: price_per_acre_distribution(self.listings()),
        }
    }

    /// Exports the whole collection in its current order, ignoring search.
    pub fn export_csv(&self, date: NaiveDate) -> Result<Option<ExportFile>, ExportError> {
        let file = listings_to_csv(self.listings(), date)?;
        match &file {
            Some(file) => info!(
                component = "view",
                event = "export.csv",
                filename = %file.filename,
                rows = self.listings().len()
            ),
            None => debug!(component = "view", event = "export.csv.skipped"),
        }
        Ok(file)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PropertySection {
    Map,
    Opportunity,
    AiReport,
}

impl PropertySection {
    pub const ALL: [PropertySection; 3] = [
        PropertySection::Map,
        PropertySection::Opportunity,
        PropertySection::AiReport,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Map => "map",
            Self::Opportunity => "opportunity",
            Self::AiReport => "ai-report",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Map => "Property Map",
            Self::Opportunity => "Opportunity Analysis",
            Self::AiReport => "AI Report",
        }
    }
}

impl fmt::Display for PropertySection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PropertySection {
    type Err = ParseOptionError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|section| section.as_str() == raw)
            .ok_or_else(|| ParseOptionError::new("section", raw))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapSection {
    pub stock_number: String,
    pub location: String,
    pub coordinates: Option<Coordinates>,
}

impl MapSection {
    pub fn from_detail(detail: &PropertyDetail) -> Self {
        Self {
            stock_number: detail.summary.stock_number.clone(),
            location: detail.summary.location.clone(),
            coordinates: detail.map,
        }
    }

    pub fn embed_url(&self) -> Option<String> {
        let coords = self.coordinates?;
        let pad = 0.01;
        Some(format!(
            "https://www.openstreetmap.org/export/embed.html?bbox={:.5}%2C{:.5}%2C{:.5}%2C{:.5}&layer=mapnik&marker={:.5}%2C{:.5}",
            coords.longitude - pad,
            coords.latitude - pad,
            coords.longitude + pad,
            coords.latitude + pad,
            coords.latitude,
            coords.longitude
        ))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SectionPayload {
    Map(MapSection),
    Opportunity(OpportunityCharts),
    AiReport(AiReport),
}

impl SectionPayload {
    fn section(&self) -> PropertySection {
        match self {
            Self::Map(_) => PropertySection::Map,
            Self::Opportunity(_) => PropertySection::Opportunity,
            Self::AiReport(_) => PropertySection::AiReport,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionRequest {
    /// Already loaded for this page view.
    Cached,
    Fetch(RequestTicket),
}

/// State of one property detail page view.
#[derive(Debug, Clone)]
pub struct PropertyView {
    stock_number: String,
    detail: Loader<PropertyDetail>,
    map: Loader<SectionPayload>,
    opportunity: Loader<SectionPayload>,
    ai_report: Loader<SectionPayload>,
}

impl PropertyView {
    pub fn new(stock_number: impl Into<String>) -> Self {
        Self {
            stock_number: stock_number.into(),
            detail: Loader::default(),
            map: Loader::default(),
            opportunity: Loader::default(),
            ai_report: Loader::default(),
        }
    }

    fn loader(&self, section: PropertySection) -> &Loader<SectionPayload> {
        match section {
            PropertySection::Map => &self.map,
            PropertySection::Opportunity => &self.opportunity,
            PropertySection::AiReport => &self.ai_report,
        }
    }

    fn loader_mut(&mut self, section: PropertySection) -> &mut Loader<SectionPayload> {
        match section {
            PropertySection::Map => &mut self.map,
            PropertySection::Opportunity => &mut self.opportunity,
            PropertySection::AiReport => &mut self.ai_report,
        }
    }

    pub fn stock_number(&self) -> &str {
        &self.stock_number
    }

    pub fn detail(&self) -> &LoadState<PropertyDetail> {
        self.detail.state()
    }

    pub fn begin_load(&mut self) -> RequestTicket {
        self.detail.begin()
    }

    pub fn complete_load(
        &mut self,
        ticket: RequestTicket,
        result: Result<PropertyDetail, ViewError>,
    ) -> Completion {
        self.detail.complete(ticket, result)
    }

    pub fn settled(
        stock_number: impl Into<String>,
        result: Result<PropertyDetail, ViewError>,
    ) -> Self {
        let mut view = Self::new(stock_number);
        let ticket = view.begin_load();
        view.complete_load(ticket, result);
        view
    }

    pub fn section(&self, section: PropertySection) -> &LoadState<SectionPayload> {
        self.loader(section).state()
    }

    /// Called when a tab becomes visible. The map is built straight from the
    /// loaded detail; the other sections need a fetch unless already cached.
    pub fn activate_section(&mut self, section: PropertySection) -> SectionRequest {
        let map = match (section, self.detail.state().loaded()) {
            (PropertySection::Map, Some(detail)) => Some(MapSection::from_detail(detail)),
            _ => None,
        };

        let loader = self.loader_mut(section);
        let Some(ticket) = loader.activate() else {
            return SectionRequest::Cached;
        };

        match map {
            Some(map) => {
                loader.complete(ticket, Ok(SectionPayload::Map(map)));
                SectionRequest::Cached
            }
            None => SectionRequest::Fetch(ticket),
        }
    }

    pub fn is_section_current(&self, section: PropertySection, ticket: RequestTicket) -> bool {
        self.loader(section).is_current(ticket)
    }

    pub fn complete_section(
        &mut self,
        section: PropertySection,
        ticket: RequestTicket,
        result: Result<SectionPayload, ViewError>,
    ) -> Completion {
        let result = result.and_then(|payload| {
            if payload.section() == section {
                Ok(payload)
            } else {
                Err(ViewError::data_format(
                    section.title(),
                    format!("received a {} payload", payload.section()),
                ))
            }
        });
        self.loader_mut(section).complete(ticket, result)
    }

    pub fn export_json(&self) -> Result<Option<ExportFile>, ExportError> {
        match self.detail.state().loaded() {
            Some(detail) => property_to_json(detail).map(Some),
            None => Ok(None),
        }
    }
}

static UNSELECTED_RADAR: LoadState<Value> = LoadState::Idle;

/// State of one opportunity dashboard page view.
#[derive(Debug, Clone, Default)]
pub struct OpportunityView {
    visualizations: Loader<PortfolioVisualizations>,
    properties: Loader<Vec<PropertyOption>>,
    radar: HashMap<String, Loader<Value>>,
}

impl OpportunityView {
    pub fn visualizations(&self) -> &LoadState<PortfolioVisualizations> {
        self.visualizations.state()
    }

    pub fn properties(&self) -> &LoadState<Vec<PropertyOption>> {
        self.properties.state()
    }

    pub fn begin_visualizations(&mut self) -> RequestTicket {
        self.visualizations.begin()
    }

    pub fn complete_visualizations(
        &mut self,
        ticket: RequestTicket,
        result: Result<PortfolioVisualizations, ViewError>,
    ) -> Completion {
        self.visualizations.complete(ticket, result)
    }

    pub fn begin_properties(&mut self) -> RequestTicket {
        self.properties.begin()
    }

    pub fn complete_properties(
        &mut self,
        ticket: RequestTicket,
        result: Result<Vec<PropertyOption>, ViewError>,
    ) -> Completion {
        self.properties.complete(ticket, result)
    }

    /// `Idle` until the property has been selected at least once.
    pub fn radar(&self, property_id: &str) -> &LoadState<Value> {
        self.radar
            .get(property_id)
            .map(Loader::state)
            .unwrap_or(&UNSELECTED_RADAR)
    }

    /// `None` when this property's radar chart is already cached.
    pub fn select_property(&mut self, property_id: &str) -> Option<RequestTicket> {
        self.radar
            .entry(property_id.to_string())
            .or_default()
            .activate()
    }

    pub fn is_radar_current(&self, property_id: &str, ticket: RequestTicket) -> bool {
        self.radar
            .get(property_id)
            .is_some_and(|loader| loader.is_current(ticket))
    }

    pub fn complete_radar(
        &mut self,
        property_id: &str,
        ticket: RequestTicket,
        result: Result<Value, ViewError>,
    ) -> Completion {
        self.radar
            .entry(property_id.to_string())
            .or_default()
            .complete(ticket, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::PropertySummary;
    use serde_json::json;

    fn listing(value: Value) -> Listing {
        serde_json::from_value(value).unwrap()
    }

    fn sample_listings() -> Vec<Listing> {
        vec![
            listing(json!({"StockNumber": "A1", "Score": "0.82", "Sale Price": "$100,000", "Price/Acre": "$25,000"})),
            listing(json!({"StockNumber": "A2", "Score": "0.40", "Sale Price": "$250,000", "Price/Acre": "$41,000"})),
        ]
    }

    fn network_error() -> ViewError {
        ViewError::from_api(
            "Listings",
            ApiError::Transport {
                url: "http://backend/api/listings".to_string(),
                message: "connection refused".to_string(),
            },
        )
    }

    fn detail(stock: &str, map: Option<Coordinates>) -> PropertyDetail {
        PropertyDetail {
            summary: PropertySummary {
                stock_number: stock.to_string(),
                location: "Tucson, AZ".to_string(),
                price: json!("$1"),
                acres: json!("1.00"),
                score: json!("0.50"),
                company: None,
                phone: None,
            },
            categories: Vec::new(),
            map,
        }
    }

    #[test]
    fn dashboard_moves_from_loading_to_loaded_and_sorts() {
        let mut view = DashboardView::new(ListingFilter::All, SortSpec::PriceAsc);
        let ticket = view.begin_load();
        assert!(view.state().is_loading());

        let completion = view.complete_load(ticket, Ok(sample_listings().into_iter().rev().collect()));
        assert_eq!(completion, Completion::Applied);

        let order: Vec<_> = view.listings().iter().filter_map(Listing::stock_number).collect();
        assert_eq!(order, vec!["A1", "A2"]);
    }

    #[test]
    fn failed_load_can_be_retried() {
        let mut view = DashboardView::default();
        let ticket = view.begin_load();
        view.complete_load(ticket, Err(network_error()));
        assert!(view.state().error().is_some());
        assert!(view.listings().is_empty());

        let retry = view.begin_load();
        assert!(view.state().is_loading());
        view.complete_load(retry, Ok(sample_listings()));
        assert_eq!(view.listings().len(), 2);
    }

    #[test]
    fn stale_response_after_newer_request_is_discarded() {
        let mut view = DashboardView::default();
        let first = view.begin_load();
        let second = view.set_filter(ListingFilter::Priced).unwrap();

        assert_eq!(view.complete_load(second, Ok(sample_listings())), Completion::Applied);
        assert_eq!(view.complete_load(first, Ok(Vec::new())), Completion::Stale);
        assert_eq!(view.listings().len(), 2);
        assert_eq!(view.filter(), ListingFilter::Priced);
    }

    #[test]
    fn reload_refetches_only_until_listings_are_held() {
        let mut view = DashboardView::default();
        let first = view.reload_unless_loaded().unwrap();
        let second = view.reload_unless_loaded().unwrap();
        assert!(!view.is_current(first));
        assert!(view.is_current(second));

        view.complete_load(second, Err(network_error()));
        let retry = view.reload_unless_loaded().unwrap();
        view.complete_load(retry, Ok(sample_listings()));
        assert!(view.reload_unless_loaded().is_none());
    }

    #[test]
    fn settled_view_carries_the_fetched_result() {
        let view = DashboardView::settled(
            ListingFilter::Priced,
            SortSpec::PriceDesc,
            " A1 ",
            Ok(sample_listings()),
        );
        assert_eq!(view.filter(), ListingFilter::Priced);
        assert_eq!(view.search_term(), "a1");
        assert_eq!(view.listings()[0].stock_number().as_deref(), Some("A2"));

        let failed = PropertyView::settled("AZ-9", Err(network_error()));
        assert!(failed.detail().error().is_some());
        assert_eq!(LoadState::<()>::from(Err(network_error())).name(), "failed");
    }

    #[test]
    fn reselecting_the_active_filter_does_not_refetch() {
        let mut view = DashboardView::default();
        let ticket = view.begin_load();
        view.complete_load(ticket, Ok(sample_listings()));

        assert!(view.set_filter(ListingFilter::All).is_none());
        assert!(view.set_filter(ListingFilter::Nonpriced).is_some());
    }

    #[test]
    fn search_reports_counts_and_empty_state() {
        let mut view = DashboardView::default();
        let ticket = view.begin_load();
        view.complete_load(ticket, Ok(sample_listings()));

        view.set_search("xyz-no-match");
        let render = view.render();
        assert!(render.empty_state);
        assert_eq!(render.visible_count, 0);
        assert_eq!(render.total_count, 2);
        assert_eq!(render.score_bins.total(), 2, "charts use the whole collection");

        view.set_search("");
        let render = view.render();
        assert!(!render.empty_state);
        assert_eq!(render.rows.len(), 2);
        assert_eq!(render.rows[0].stock_number.as_deref(), Some("A1"));
    }

    #[test]
    fn resorting_does_not_refetch_and_export_keeps_sort_order() {
        let mut view = DashboardView::default();
        let ticket = view.begin_load();
        view.complete_load(ticket, Ok(sample_listings()));
        view.set_sort(SortSpec::PriceDesc);
        view.set_search("A1");

        let date = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        let file = view.export_csv(date).unwrap().unwrap();
        let mut lines = file.body.lines().skip(1);
        assert!(lines.next().unwrap().starts_with("\"A2\""));
        assert!(lines.next().unwrap().starts_with("\"A1\""));
    }

    #[test]
    fn export_is_skipped_until_listings_exist() {
        let view = DashboardView::default();
        let date = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        assert_eq!(view.export_csv(date).unwrap(), None);
    }

    #[test]
    fn sections_fetch_lazily_and_cache_once_loaded() {
        let mut view = PropertyView::new("AZ-1");
        assert!(matches!(view.section(PropertySection::AiReport), LoadState::Idle));

        let SectionRequest::Fetch(ticket) = view.activate_section(PropertySection::AiReport) else {
            panic!("first activation should fetch");
        };
        assert!(view.is_section_current(PropertySection::AiReport, ticket));
        view.complete_section(
            PropertySection::AiReport,
            ticket,
            Ok(SectionPayload::AiReport(AiReport {
                report: "Summary:".to_string(),
            })),
        );

        assert_eq!(
            view.activate_section(PropertySection::AiReport),
            SectionRequest::Cached
        );
    }

    #[test]
    fn failed_section_is_isolated_and_retryable() {
        let mut view = PropertyView::new("AZ-1");
        let ticket = view.begin_load();
        view.complete_load(ticket, Ok(detail("AZ-1", None)));

        let SectionRequest::Fetch(ticket) = view.activate_section(PropertySection::Opportunity) else {
            panic!("opportunity should fetch");
        };
        view.complete_section(
            PropertySection::Opportunity,
            ticket,
            Err(ViewError::data_format("Opportunity Analysis", "missing charts")),
        );

        assert!(view.section(PropertySection::Opportunity).error().is_some());
        assert!(view.detail().loaded().is_some());
        assert!(matches!(
            view.activate_section(PropertySection::Opportunity),
            SectionRequest::Fetch(_)
        ));
    }

    #[test]
    fn map_section_resolves_from_loaded_detail_without_fetch() {
        let mut view = PropertyView::new("AZ-2");
        let ticket = view.begin_load();
        let coords = Coordinates {
            latitude: 32.2226,
            longitude: -110.9747,
        };
        view.complete_load(ticket, Ok(detail("AZ-2", Some(coords))));

        assert_eq!(view.activate_section(PropertySection::Map), SectionRequest::Cached);
        let Some(SectionPayload::Map(map)) = view.section(PropertySection::Map).loaded() else {
            panic!("map should be loaded");
        };
        assert_eq!(map.coordinates, Some(coords));
        assert!(map.embed_url().unwrap().contains("marker=32.22260%2C-110.97470"));
    }

    #[test]
    fn mismatched_section_payload_is_a_data_format_error() {
        let mut view = PropertyView::new("AZ-3");
        let SectionRequest::Fetch(ticket) = view.activate_section(PropertySection::AiReport) else {
            panic!("should fetch");
        };
        view.complete_section(
            PropertySection::AiReport,
            ticket,
            Ok(SectionPayload::Opportunity(OpportunityCharts::default())),
        );

        assert!(matches!(
            view.section(PropertySection::AiReport).error(),
            Some(ViewError::DataFormat { .. })
        ));
    }

    #[test]
    fn property_export_requires_loaded_detail() {
        let mut view = PropertyView::new("AZ-4");
        assert_eq!(view.export_json().unwrap(), None);

        let ticket = view.begin_load();
        view.complete_load(ticket, Ok(detail("AZ-4", None)));
        let file = view.export_json().unwrap().unwrap();
        assert_eq!(file.filename, "property_AZ-4.json");
    }

    #[test]
    fn radar_charts_are_cached_per_property() {
        let mut view = OpportunityView::default();
        let ticket = view.select_property("7").unwrap();
        assert!(view.is_radar_current("7", ticket));
        assert!(!view.is_radar_current("8", ticket));
        view.complete_radar("7", ticket, Ok(json!({"data": []})));

        assert!(view.select_property("7").is_none());
        assert!(view.radar("7").loaded().is_some());
        assert_eq!(view.radar("9").name(), "idle");
        assert!(view.select_property("8").is_some());
    }

    #[test]
    fn api_errors_map_to_view_taxonomy() {
        let not_found = ViewError::from_api(
            "Property",
            ApiError::Status {
                url: "u".to_string(),
                status: 404,
                message: "Property with stock number 9 not found".to_string(),
            },
        );
        assert!(not_found.is_not_found());
        assert_eq!(not_found.to_string(), "Property: Property with stock number 9 not found");

        let decode = ViewError::from_api(
            "Listings",
            ApiError::Decode {
                url: "u".to_string(),
                message: "missing field `listings`".to_string(),
            },
        );
        assert!(matches!(decode, ViewError::DataFormat { .. }));
        assert_eq!(decode.section(), "Listings");
    }
}
