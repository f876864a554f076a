use std::io;
use std::io::Write;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use adla_dashboard::{
    dashboard_router, dashboard_router_with_capacity, log_app_bind, log_app_start,
    log_source_selected, wait_until_ready, Completion, DashboardConfig, DashboardView,
    HttpApiConfig, InMemoryDashboardApi, LoggingConfig, ReadinessConfig, ViewError,
};
use tower::util::ServiceExt;
use tracing::dispatcher::with_default;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriter;

#[derive(Clone, Default)]
struct SharedWriter {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedWriter {
    fn output_string(&self) -> String {
        let bytes = self
            .inner
            .lock()
            .expect("writer lock should not be poisoned");
        String::from_utf8_lossy(&bytes).to_string()
    }
}

struct SharedWriterGuard {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl<'a> MakeWriter<'a> for SharedWriter {
    type Writer = SharedWriterGuard;

    fn make_writer(&'a self) -> Self::Writer {
        SharedWriterGuard {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Write for SharedWriterGuard {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut out = self
            .inner
            .lock()
            .expect("writer lock should not be poisoned");
        out.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn capture_logs(max_level: Level, f: impl FnOnce()) -> String {
    let writer = SharedWriter::default();
    let subscriber = tracing_subscriber::fmt()
        .json()
        .with_ansi(false)
        .with_max_level(max_level)
        .with_writer(writer.clone())
        .finish();
    let dispatch = tracing::Dispatch::new(subscriber);

    with_default(&dispatch, f);
    writer.output_string()
}

fn dashboard_config(use_demo: bool) -> DashboardConfig {
    DashboardConfig {
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 5000),
        api: HttpApiConfig::default(),
        use_demo,
        readiness: ReadinessConfig::default(),
    }
}

async fn send(app: &axum::Router, uri: &str) -> StatusCode {
    app.clone()
        .oneshot(
            Request::builder()
                .uri(uri)
                .body(Body::empty())
                .expect("request should build"),
        )
        .await
        .expect("request should succeed")
        .status()
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("single-thread runtime should build")
        .block_on(future)
}

#[test]
fn server_lifecycle_helpers_emit_baseline_events() {
    let logs = capture_logs(Level::INFO, || {
        let demo = dashboard_config(true);
        log_app_start(&LoggingConfig::default(), &demo);
        log_source_selected(&demo);
        log_source_selected(&dashboard_config(false));
        log_app_bind(demo.bind_addr);
    });

    assert!(logs.contains("\"event\":\"app.start\""));
    assert!(logs.contains("\"bind_addr\":\"127.0.0.1:5000\""));
    assert!(logs.contains("\"event\":\"source.selected\""));
    assert!(logs.contains("\"reason\":\"ADLA_DASHBOARD_USE_DEMO\""));
    assert!(logs.contains(&format!(
        "\"base_url\":\"{}\"",
        HttpApiConfig::default().base_url
    )));
    assert!(logs.contains("\"event\":\"app.bind\""));
}

#[test]
fn dashboard_route_emits_http_dashboard_event() {
    let logs = capture_logs(Level::INFO, || {
        block_on(async {
            let app = dashboard_router(Arc::new(InMemoryDashboardApi::demo()));

            let response = app
                .oneshot(
                    Request::builder()
                        .uri("/dashboard?filter=priced")
                        .body(Body::empty())
                        .expect("request should build"),
                )
                .await
                .expect("dashboard request should succeed");

            assert_eq!(response.status(), StatusCode::OK);
        });
    });

    assert!(logs.contains("\"event\":\"http.dashboard.request\""));
    assert!(logs.contains("\"filter\":\"priced\""));
}

#[test]
fn page_eviction_and_detached_sections_are_logged() {
    let logs = capture_logs(Level::INFO, || {
        block_on(async {
            let app = dashboard_router_with_capacity(Arc::new(InMemoryDashboardApi::demo()), 1);
            assert_eq!(send(&app, "/property/AZ-1001").await, StatusCode::OK);
            assert_eq!(send(&app, "/property/AZ-1002").await, StatusCode::OK);
            assert_eq!(
                send(&app, "/property/AZ-1001/sections/ai-report?page=1").await,
                StatusCode::OK
            );
        });
    });

    assert!(logs.contains("\"event\":\"page.evicted\""));
    assert!(logs.contains("\"event\":\"http.section.request\""));
    assert!(logs.contains("\"source\":\"detached\""));
}

#[test]
fn superseded_listing_load_is_logged_and_dropped() {
    let logs = capture_logs(Level::DEBUG, || {
        let mut view = DashboardView::default();
        let first = view.begin_load();
        let second = view.begin_load();

        let stale = view.complete_load(
            first,
            Err(ViewError::DataFormat {
                section: "Listings".to_string(),
                message: "late reply".to_string(),
            }),
        );
        assert_eq!(stale, Completion::Stale);
        assert!(view.state().is_loading());

        assert_eq!(view.complete_load(second, Ok(Vec::new())), Completion::Applied);
    });

    assert!(logs.contains("\"event\":\"view.stale_response\""));
}

#[test]
fn readiness_check_logs_retries_and_exhaustion() {
    let logs = capture_logs(Level::DEBUG, || {
        block_on(async {
            let (_cancel_tx, cancel_rx) = tokio::sync::watch::channel(false);
            let cfg = ReadinessConfig {
                max_attempts: 2,
                initial_delay_ms: 1,
            };

            let result = wait_until_ready("analytics backend", cfg, cancel_rx, || async {
                Err::<(), _>("connection refused".to_string())
            })
            .await;

            assert!(result.is_err());
        });
    });

    assert!(logs.contains("\"event\":\"backend.readiness.retry\""));
    assert!(logs.contains("\"event\":\"backend.readiness.exhausted\""));
}
