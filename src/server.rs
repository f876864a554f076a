//! HTTP routes for the dashboard, property and opportunity pages.
//!
//! Each rendered page gets a page id naming a view held in a bounded registry.
//! Follow-up requests from that page (re-sorts, sections, radar charts,
//! exports) carry the id and reuse the held view. A response always renders a
//! settled state: when the held view has moved on to a newer request, the
//! fetched result is served as is instead of the newer request's placeholder.

use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::api::DashboardApi;
use crate::controller::ViewController;
use crate::export::{ExportError, ExportFile};
use crate::listing::{ListingFilter, SortSpec};
use crate::observability::{
    log_dashboard_request, log_opportunity_request, log_page_evicted, log_page_opened,
    log_property_request, log_radar_request, log_section_request, log_stale_response,
    FragmentSource, PageKind,
};
use crate::pages::{
    render_dashboard_page, render_opportunity_page, render_property_page, render_radar_fragment,
    render_section_fragment,
};
use crate::view::{
    DashboardView, LoadState, OpportunityView, PropertySection, PropertyView, RequestTicket,
    SectionRequest, ViewError,
};

/// Live page views kept per page kind.
pub const PAGE_CAPACITY: usize = 256;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardQuery {
    pub page: Option<String>,
    pub filter: Option<String>,
    pub sort: Option<String>,
    pub q: Option<String>,
}

impl DashboardQuery {
    pub fn page(&self) -> Option<u64> {
        parse_page(self.page.as_deref())
    }

    pub fn filter(&self) -> ListingFilter {
        parse_or_default("filter", self.filter.as_deref())
    }

    pub fn sort(&self) -> SortSpec {
        parse_or_default("sort", self.sort.as_deref())
    }

    pub fn search_term(&self) -> &str {
        self.q.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct PageQuery {
    page: Option<String>,
}

impl PageQuery {
    fn page(&self) -> Option<u64> {
        parse_page(self.page.as_deref())
    }
}

struct PageEntry<V> {
    view: V,
    last_used: u64,
}

/// Held page views by page id. Ids are never reused; once full, opening a
/// page evicts the least recently used one.
struct PageRegistry<V> {
    kind: PageKind,
    capacity: usize,
    next_page: u64,
    clock: u64,
    pages: HashMap<u64, PageEntry<V>>,
}

impl<V> PageRegistry<V> {
    fn new(kind: PageKind, capacity: usize) -> Self {
        Self {
            kind,
            capacity: capacity.max(1),
            next_page: 0,
            clock: 0,
            pages: HashMap::new(),
        }
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn open(&mut self, view: V) -> (u64, &mut V) {
        while self.pages.len() >= self.capacity {
            self.evict_least_recent();
        }
        self.next_page += 1;
        let page = self.next_page;
        let last_used = self.tick();
        log_page_opened(self.kind, page, self.pages.len() + 1);
        let entry = self.pages.entry(page).or_insert(PageEntry { view, last_used });
        (page, &mut entry.view)
    }

    /// The held view for `page`, or a fresh one under a new id when `page`
    /// is absent, unknown or evicted.
    fn get_or_open(&mut self, page: Option<u64>, make: impl FnOnce() -> V) -> (u64, &mut V) {
        match page.filter(|page| self.pages.contains_key(page)) {
            Some(page) => {
                let last_used = self.tick();
                let entry = self
                    .pages
                    .entry(page)
                    .or_insert_with(|| PageEntry { view: make(), last_used });
                entry.last_used = last_used;
                (page, &mut entry.view)
            }
            None => self.open(make()),
        }
    }

    fn get_mut(&mut self, page: u64) -> Option<&mut V> {
        let last_used = self.tick();
        self.pages.get_mut(&page).map(|entry| {
            entry.last_used = last_used;
            &mut entry.view
        })
    }

    fn evict_least_recent(&mut self) {
        let oldest = self
            .pages
            .iter()
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(page, _)| *page);
        if let Some(page) = oldest {
            self.pages.remove(&page);
            log_page_evicted(self.kind, page);
        }
    }
}

#[derive(Clone)]
struct DashboardAppState {
    controller: ViewController,
    dashboards: Arc<Mutex<PageRegistry<DashboardView>>>,
    properties: Arc<Mutex<PageRegistry<PropertyView>>>,
    opportunities: Arc<Mutex<PageRegistry<OpportunityView>>>,
}

pub fn dashboard_router(api: Arc<dyn DashboardApi>) -> Router {
    dashboard_router_with_capacity(api, PAGE_CAPACITY)
}

/// Same routes with `capacity` held views per page kind.
pub fn dashboard_router_with_capacity(api: Arc<dyn DashboardApi>, capacity: usize) -> Router {
    let state = DashboardAppState {
        controller: ViewController::new(api),
        dashboards: Arc::new(Mutex::new(PageRegistry::new(PageKind::Dashboard, capacity))),
        properties: Arc::new(Mutex::new(PageRegistry::new(PageKind::Property, capacity))),
        opportunities: Arc::new(Mutex::new(PageRegistry::new(PageKind::Opportunity, capacity))),
    };

    Router::new()
        .route("/", get(|| async { Redirect::to("/dashboard") }))
        .route("/dashboard", get(get_dashboard_html))
        .route("/dashboard/charts", get(get_dashboard_charts))
        .route("/dashboard/export.csv", get(get_dashboard_csv))
        .route("/property/{stock}", get(get_property_html))
        .route("/property/{stock}/sections/{section}", get(get_property_section))
        .route("/property/{stock}/export.json", get(get_property_json))
        .route("/opportunity", get(get_opportunity_html))
        .route("/opportunity/radar/{property_id}", get(get_radar_fragment))
        .with_state(state)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn parse_page(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|raw| raw.trim().parse().ok())
}

fn parse_or_default<T>(kind: &str, raw: Option<&str>) -> T
where
    T: FromStr + Default,
    T::Err: Display,
{
    match raw.map(str::trim).filter(|raw| !raw.is_empty()) {
        None => T::default(),
        Some(raw) => raw.parse().unwrap_or_else(|err| {
            warn!(component = "http", event = "http.query.invalid", kind, value = raw, error = %err);
            T::default()
        }),
    }
}

/// State for a response that is not applied to a held view.
fn settle<T>(result: Result<T, ViewError>) -> LoadState<T> {
    if let Err(err) = &result {
        warn!(
            component = "http",
            event = "view.load.error",
            section = err.section(),
            error = %err
        );
    }
    LoadState::from(result)
}

/// Sort and search apply to the held listings; only a filter change (or a
/// view without loaded listings) fetches.
async fn get_dashboard_html(
    State(state): State<DashboardAppState>,
    Query(query): Query<DashboardQuery>,
) -> Html<String> {
    let (page, ticket) = {
        let mut registry = lock(&state.dashboards);
        let (page, view) = registry.get_or_open(query.page(), || {
            DashboardView::new(query.filter(), query.sort())
        });
        view.set_sort(query.sort());
        view.set_search(query.search_term());
        match view
            .set_filter(query.filter())
            .or_else(|| view.reload_unless_loaded())
        {
            Some(ticket) => (page, ticket),
            None => {
                log_dashboard_request(page, view, false);
                return Html(render_dashboard_page(page, view));
            }
        }
    };

    let result = state.controller.load_listings(query.filter()).await;

    let mut registry = lock(&state.dashboards);
    if let Some(view) = registry
        .get_mut(page)
        .filter(|view| view.is_current(ticket))
    {
        view.complete_load(ticket, result);
        log_dashboard_request(page, view, true);
        return Html(render_dashboard_page(page, view));
    }
    drop(registry);

    log_stale_response(PageKind::Dashboard, page, "listings");
    let view = DashboardView::settled(query.filter(), query.sort(), query.search_term(), result);
    log_dashboard_request(page, &view, true);
    Html(render_dashboard_page(page, &view))
}

/// Runs `f` on the held dashboard view when it has listings, otherwise on a
/// one-off fetch for the query. The flag reports whether a fetch happened.
async fn with_dashboard<R>(
    state: &DashboardAppState,
    query: &DashboardQuery,
    f: impl FnOnce(&DashboardView) -> R,
) -> (R, bool) {
    if let Some(page) = query.page() {
        let mut registry = lock(&state.dashboards);
        if let Some(view) = registry
            .get_mut(page)
            .filter(|view| view.state().loaded().is_some())
        {
            return (f(view), false);
        }
    }

    let result = state.controller.load_listings(query.filter()).await;
    let view = DashboardView::settled(query.filter(), query.sort(), query.search_term(), result);
    (f(&view), true)
}

async fn get_dashboard_charts(
    State(state): State<DashboardAppState>,
    Query(query): Query<DashboardQuery>,
) -> Response {
    let (response, fetched) = with_dashboard(&state, &query, |view| {
        if let Some(err) = view.state().error() {
            return error_json(StatusCode::BAD_GATEWAY, err);
        }
        let render = view.render();
        Json(json!({
            "filter": view.filter(),
            "score_bins": render.score_bins,
            "price_bins": render.price_bins,
        }))
        .into_response()
    })
    .await;

    info!(
        component = "http",
        event = "http.charts.request",
        page = query.page(),
        fetched,
        status = response.status().as_u16()
    );
    response
}

async fn get_dashboard_csv(
    State(state): State<DashboardAppState>,
    Query(query): Query<DashboardQuery>,
) -> Response {
    let today = chrono::Utc::now().date_naive();
    let (response, fetched) = with_dashboard(&state, &query, |view| match view.state().error() {
        Some(err) => error_json(StatusCode::BAD_GATEWAY, err),
        None => export_response(view.export_csv(today)),
    })
    .await;

    info!(
        component = "http",
        event = "http.export_csv.request",
        page = query.page(),
        fetched,
        status = response.status().as_u16()
    );
    response
}

/// Always a fresh page view. Only a loaded detail is held, so a missing or
/// failed property never takes a registry slot.
async fn get_property_html(
    State(state): State<DashboardAppState>,
    Path(stock): Path<String>,
) -> Response {
    let result = state.controller.load_property(&stock).await;
    let view = PropertyView::settled(stock, result);

    if view.detail().loaded().is_none() {
        let status = match view.detail().error() {
            Some(err) if err.is_not_found() => StatusCode::NOT_FOUND,
            _ => StatusCode::OK,
        };
        log_property_request(None, &view);
        return (status, Html(render_property_page(None, &view))).into_response();
    }

    let mut registry = lock(&state.properties);
    let (page, view) = registry.open(view);
    log_property_request(Some(page), view);
    Html(render_property_page(Some(page), view)).into_response()
}

async fn get_property_section(
    State(state): State<DashboardAppState>,
    Path((stock, section)): Path<(String, String)>,
    Query(query): Query<PageQuery>,
) -> Response {
    let section: PropertySection = match section.parse() {
        Ok(section) => section,
        Err(err) => {
            return (StatusCode::NOT_FOUND, Json(json!({"error": err.to_string()}))).into_response();
        }
    };
    let page = query.page();

    let ticket: Option<RequestTicket> = {
        let mut registry = lock(&state.properties);
        let held = page
            .and_then(|page| registry.get_mut(page))
            .filter(|view| view.stock_number() == stock);
        match held {
            Some(view) => match view.activate_section(section) {
                SectionRequest::Fetch(ticket) => Some(ticket),
                SectionRequest::Cached => {
                    let cached = view.section(section);
                    log_section_request(page, &stock, section, FragmentSource::Cached, cached.name());
                    return Html(render_section_fragment(section, cached)).into_response();
                }
            },
            None => None,
        }
    };

    let result = state.controller.load_section(&stock, section).await;

    let source = match (page, ticket) {
        (Some(page), Some(ticket)) => {
            let mut registry = lock(&state.properties);
            if let Some(view) = registry
                .get_mut(page)
                .filter(|view| view.is_section_current(section, ticket))
            {
                view.complete_section(section, ticket, result);
                let applied = view.section(section);
                log_section_request(Some(page), &stock, section, FragmentSource::Fetched, applied.name());
                return Html(render_section_fragment(section, applied)).into_response();
            }
            log_stale_response(PageKind::Property, page, section.as_str());
            FragmentSource::Superseded
        }
        _ => FragmentSource::Detached,
    };

    let settled = settle(result);
    log_section_request(page, &stock, section, source, settled.name());
    Html(render_section_fragment(section, &settled)).into_response()
}

async fn get_property_json(
    State(state): State<DashboardAppState>,
    Path(stock): Path<String>,
    Query(query): Query<PageQuery>,
) -> Response {
    let held = query.page().and_then(|page| {
        lock(&state.properties)
            .get_mut(page)
            .filter(|view| view.stock_number() == stock)
            .map(|view| view.export_json())
    });
    let from_page = held.is_some();

    let exported = match held {
        Some(exported) => exported,
        None => {
            let result = state.controller.load_property(&stock).await;
            PropertyView::settled(stock.clone(), result).export_json()
        }
    };

    let response = export_response(exported);
    info!(
        component = "http",
        event = "http.export_json.request",
        page = query.page(),
        stock_number = %stock,
        from_page,
        status = response.status().as_u16()
    );
    response
}

async fn get_opportunity_html(State(state): State<DashboardAppState>) -> Html<String> {
    let mut view = OpportunityView::default();
    let visualizations_ticket = view.begin_visualizations();
    let properties_ticket = view.begin_properties();

    let (visualizations, properties) = tokio::join!(
        state.controller.load_visualizations(),
        state.controller.load_property_options()
    );
    view.complete_visualizations(visualizations_ticket, visualizations);
    view.complete_properties(properties_ticket, properties);

    let mut registry = lock(&state.opportunities);
    let (page, view) = registry.open(view);
    log_opportunity_request(page, view);
    Html(render_opportunity_page(page, view))
}

async fn get_radar_fragment(
    State(state): State<DashboardAppState>,
    Path(property_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Html<String> {
    let page = query.page();

    let ticket: Option<RequestTicket> = {
        let mut registry = lock(&state.opportunities);
        match page.and_then(|page| registry.get_mut(page)) {
            Some(view) => match view.select_property(&property_id) {
                Some(ticket) => Some(ticket),
                None => {
                    let cached = view.radar(&property_id);
                    log_radar_request(page, &property_id, FragmentSource::Cached, cached.name());
                    return Html(render_radar_fragment(&property_id, cached));
                }
            },
            None => None,
        }
    };

    let result = state.controller.load_radar(&property_id).await;

    let source = match (page, ticket) {
        (Some(page), Some(ticket)) => {
            let mut registry = lock(&state.opportunities);
            if let Some(view) = registry
                .get_mut(page)
                .filter(|view| view.is_radar_current(&property_id, ticket))
            {
                view.complete_radar(&property_id, ticket, result);
                let applied = view.radar(&property_id);
                log_radar_request(Some(page), &property_id, FragmentSource::Fetched, applied.name());
                return Html(render_radar_fragment(&property_id, applied));
            }
            log_stale_response(PageKind::Opportunity, page, &property_id);
            FragmentSource::Superseded
        }
        _ => FragmentSource::Detached,
    };

    let settled = settle(result);
    log_radar_request(page, &property_id, source, settled.name());
    Html(render_radar_fragment(&property_id, &settled))
}

fn error_json(status: StatusCode, err: &ViewError) -> Response {
    (
        status,
        Json(json!({"error": err.to_string(), "section": err.section()})),
    )
        .into_response()
}

fn export_response(exported: Result<Option<ExportFile>, ExportError>) -> Response {
    match exported {
        Ok(Some(file)) => download(file),
        Ok(None) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            warn!(component = "http", event = "export.error", error = %err);
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": err.to_string()})))
                .into_response()
        }
    }
}

fn download(file: ExportFile) -> Response {
    let headers = [
        (header::CONTENT_TYPE, file.content_type.to_string()),
        (header::CONTENT_DISPOSITION, file.content_disposition()),
    ];
    (headers, file.body).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_issues_fresh_ids_and_evicts_least_recently_used() {
        let mut registry: PageRegistry<&str> = PageRegistry::new(PageKind::Property, 2);
        let (first, _) = registry.open("a");
        let (second, _) = registry.open("b");
        assert!(registry.get_mut(first).is_some(), "touch the first page");

        let (third, _) = registry.open("c");
        assert!(third > second);
        assert_eq!(registry.pages.len(), 2);
        assert!(registry.get_mut(second).is_none(), "least recent page is evicted");
        assert_eq!(registry.get_mut(first), Some(&mut "a"));
        assert_eq!(registry.get_mut(third), Some(&mut "c"));
    }

    #[test]
    fn get_or_open_reuses_live_pages_and_replaces_unknown_ones() {
        let mut registry: PageRegistry<u32> = PageRegistry::new(PageKind::Dashboard, 4);
        let (first, _) = registry.get_or_open(None, || 7);
        let (again, value) = registry.get_or_open(Some(first), || 9);
        assert_eq!(first, again);
        assert_eq!(*value, 7);

        let (fresh, value) = registry.get_or_open(Some(999), || 11);
        assert_ne!(fresh, 999);
        assert_eq!(*value, 11);
    }

    #[test]
    fn capacity_is_at_least_one() {
        let mut registry: PageRegistry<u32> = PageRegistry::new(PageKind::Opportunity, 0);
        let (first, _) = registry.open(1);
        let (second, _) = registry.open(2);
        assert!(registry.get_mut(first).is_none());
        assert_eq!(registry.get_mut(second), Some(&mut 2));
    }

    #[test]
    fn unknown_query_values_fall_back_to_defaults() {
        let query = DashboardQuery {
            page: Some("seven".to_string()),
            filter: Some("bogus".to_string()),
            sort: Some("price-asc".to_string()),
            q: None,
        };
        assert_eq!(query.page(), None);
        assert_eq!(query.filter(), ListingFilter::All);
        assert_eq!(query.sort(), SortSpec::PriceAsc);
        assert_eq!(query.search_term(), "");
        assert_eq!(DashboardQuery::default().sort(), SortSpec::ScoreDesc);
        assert_eq!(parse_page(Some(" 12 ")), Some(12));
    }
}
