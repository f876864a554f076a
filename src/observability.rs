//! Logging setup and the structured events the dashboard server emits.
//!
//! Events carry `component` and `event` fields so JSON output can be filtered
//! per page kind without matching on messages.

use std::net::SocketAddr;

use thiserror::Error;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::config::{env_string, parse_bool, DashboardConfig};
use crate::view::{DashboardView, OpportunityView, PropertySection, PropertyView};

const ROUTES: &str = "/dashboard,/property/{stock},/opportunity";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "pretty" => Some(Self::Pretty),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `adla_dashboard=debug`.
    pub filter: String,
    pub format: LogFormat,
    pub include_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            format: LogFormat::Pretty,
            include_target: true,
        }
    }
}

impl LoggingConfig {
    /// Reads `ADLA_LOG_LEVEL`, `ADLA_LOG_FORMAT` and `ADLA_LOG_TARGET`;
    /// unparsable values keep their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            filter: env_string("ADLA_LOG_LEVEL").unwrap_or(defaults.filter),
            format: env_string("ADLA_LOG_FORMAT")
                .and_then(|raw| LogFormat::parse(&raw))
                .unwrap_or(defaults.format),
            include_target: env_string("ADLA_LOG_TARGET")
                .and_then(|raw| parse_bool(&raw))
                .unwrap_or(defaults.include_target),
        }
    }
}

#[derive(Debug, Error)]
pub enum LoggingInitError {
    #[error("logging already initialized: {0}")]
    AlreadyInitialized(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Installs the global subscriber. JSON output puts event fields at the top
/// level so `event` can be matched directly.
pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingInitError> {
    let env_filter = EnvFilter::try_new(&config.filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(config.include_target)
        .with_ansi(config.format == LogFormat::Pretty);

    match config.format {
        LogFormat::Json => {
            tracing::subscriber::set_global_default(builder.json().flatten_event(true).finish())?
        }
        LogFormat::Pretty => tracing::subscriber::set_global_default(builder.pretty().finish())?,
    }
    Ok(())
}

fn source_name(config: &DashboardConfig) -> &'static str {
    if config.use_demo {
        "demo"
    } else {
        "http"
    }
}

pub fn log_app_start(logging: &LoggingConfig, config: &DashboardConfig) {
    info!(
        component = "dashboard_server",
        event = "app.start",
        log_filter = %logging.filter,
        log_format = ?logging.format,
        bind_addr = %config.bind_addr,
        source = source_name(config),
        readiness_attempts = config.readiness.max_attempts
    );
}

/// Records which backend feeds the views. The demo has no base URL.
pub fn log_source_selected(config: &DashboardConfig) {
    if config.use_demo {
        info!(
            component = "dashboard_server",
            event = "source.selected",
            source = "demo",
            reason = "ADLA_DASHBOARD_USE_DEMO"
        );
    } else {
        info!(
            component = "dashboard_server",
            event = "source.selected",
            source = "http",
            base_url = %config.api.base_url,
            timeout_ms = config.api.timeout_ms,
            max_retries = config.api.max_retries
        );
    }
}

pub fn log_app_bind(bound_addr: SocketAddr) {
    info!(
        component = "dashboard_server",
        event = "app.bind",
        bind_addr = %bound_addr,
        routes = ROUTES
    );
}

/// Page kinds whose views are held between requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Dashboard,
    Property,
    Opportunity,
}

impl PageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Property => "property",
            Self::Opportunity => "opportunity",
        }
    }
}

/// Where the state behind a fragment response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentSource {
    /// Already loaded in the held page view.
    Cached,
    /// Fetched and applied to the held page view.
    Fetched,
    /// Fetched after the page view issued a newer request; served as is.
    Superseded,
    /// No held page view; fetched for this response only.
    Detached,
}

impl FragmentSource {
    fn as_str(self) -> &'static str {
        match self {
            Self::Cached => "cached",
            Self::Fetched => "fetched",
            Self::Superseded => "superseded",
            Self::Detached => "detached",
        }
    }
}

pub(crate) fn log_page_opened(kind: PageKind, page: u64, live: usize) {
    debug!(
        component = "pages",
        event = "page.opened",
        kind = kind.as_str(),
        page,
        live
    );
}

pub(crate) fn log_page_evicted(kind: PageKind, page: u64) {
    info!(
        component = "pages",
        event = "page.evicted",
        kind = kind.as_str(),
        page
    );
}

pub(crate) fn log_stale_response(kind: PageKind, page: u64, slot: &str) {
    info!(
        component = "http",
        event = "view.stale_response",
        kind = kind.as_str(),
        page,
        slot
    );
}

pub(crate) fn log_dashboard_request(page: u64, view: &DashboardView, fetched: bool) {
    info!(
        component = "http",
        event = "http.dashboard.request",
        page,
        filter = %view.filter(),
        sort = %view.sort(),
        search = view.search_term(),
        fetched,
        state = view.state().name()
    );
}

pub(crate) fn log_property_request(page: Option<u64>, view: &PropertyView) {
    info!(
        component = "http",
        event = "http.property.request",
        page,
        stock_number = view.stock_number(),
        state = view.detail().name()
    );
}

pub(crate) fn log_opportunity_request(page: u64, view: &OpportunityView) {
    info!(
        component = "http",
        event = "http.opportunity.request",
        page,
        visualizations = view.visualizations().name(),
        properties = view.properties().name()
    );
}

pub(crate) fn log_section_request(
    page: Option<u64>,
    stock_number: &str,
    section: PropertySection,
    source: FragmentSource,
    state: &str,
) {
    info!(
        component = "http",
        event = "http.section.request",
        page,
        stock_number,
        section = section.as_str(),
        source = source.as_str(),
        state
    );
}

pub(crate) fn log_radar_request(
    page: Option<u64>,
    property_id: &str,
    source: FragmentSource,
    state: &str,
) {
    info!(
        component = "http",
        event = "http.radar.request",
        page,
        property_id,
        source = source.as_str(),
        state
    );
}
