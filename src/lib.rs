//! ADLA property dashboard.
//!
//! Client-side view layer over the land-analytics backend: listing sort and
//! search, table and histogram transforms, CSV/JSON export, per-page view
//! state machines and the axum server that renders them.

mod api;
mod config;
mod controller;
mod demo;
mod export;
mod histogram;
mod listing;
mod numeric;
mod observability;
mod pages;
mod readiness;
mod report;
mod server;
mod table;
mod view;

pub use api::{
    AiReport, ApiError, CategoryField, CategoryRecord, Coordinates, DashboardApi, Figure,
    HttpApiConfig, HttpDashboardApi, InMemoryDashboardApi, ListingsEnvelope, OpportunityCharts,
    PortfolioVisualizations, PropertyDetail, PropertyOption, PropertySummary,
};
pub use config::{ConfigError, DashboardConfig, DEFAULT_DASHBOARD_ADDR};
pub use controller::{
    ViewController, LISTINGS_SECTION, PROPERTY_SECTION, RADAR_SECTION, SELECTOR_SECTION,
    VISUALIZATIONS_SECTION,
};
pub use export::{
    csv_filename, listings_to_csv, property_json_filename, property_to_json, ExportError,
    ExportFile, CSV_CONTENT_TYPE, JSON_CONTENT_TYPE,
};
pub use histogram::{
    price_per_acre_bins, price_per_acre_distribution, score_bins, score_distribution, BinSet,
    HistogramBin,
};
pub use listing::{
    normalize_term, search_listings, sort_listings, value_text, Listing, ListingFilter,
    ParseOptionError, SearchResult, SortSpec, PRICE_PER_ACRE_FIELD, SALE_PRICE_FIELD,
    SCORE_FIELD, STOCK_NUMBER_FIELD,
};
pub use numeric::{parse_numeric, parse_numeric_or_zero, parse_numeric_str};
pub use observability::{
    init_logging, log_app_bind, log_app_start, log_source_selected, FragmentSource, LogFormat,
    LoggingConfig, LoggingInitError, PageKind,
};
pub use pages::{
    escape_html, query_href, render_dashboard_page, render_opportunity_page,
    render_property_page, render_radar_fragment, render_section_fragment, CATEGORY_ORDER,
    EMPTY_SEARCH, NO_COORDINATES, NO_DATA,
};
pub use readiness::{wait_until_ready, ReadinessConfig, ReadinessError};
pub use report::{parse_report, ReportBlock};
pub use server::{dashboard_router, dashboard_router_with_capacity, DashboardQuery, PAGE_CAPACITY};
pub use table::{
    category_rows, cell_style, format_display_value, format_thousands, listing_row,
    listing_rows, property_href, CategoryRow, CellStyle, DashboardColumn, ListingRow,
    TableCell, DASHBOARD_COLUMNS, NOT_AVAILABLE,
};
pub use view::{
    Completion, DashboardRender, DashboardView, LoadState, Loader, MapSection, OpportunityView,
    PropertySection, PropertyView, RequestTicket, SectionPayload, SectionRequest, ViewError,
};
