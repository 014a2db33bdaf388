//! Prometheus metrics for the session manager.
//!
//! Exposes:
//! - `tg_session_manager_action_duration_seconds` (histogram)
//! - `tg_session_manager_action_total` (counter with status)
//! - `tg_session_manager_action_inflight` (gauge)
//! - `tg_session_manager_item_total` (per-dialog outcomes of bulk actions)
//! - process metrics via `process` collector

use std::convert::Infallible;
use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use once_cell::sync::Lazy;
use prometheus::process_collector::ProcessCollector;
use prometheus::{
    default_registry, register_histogram_vec, register_int_counter_vec, register_int_gauge_vec,
    Encoder, HistogramVec, IntCounterVec, IntGaugeVec, TextEncoder,
};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

static PROCESS_COLLECTOR: Lazy<()> = Lazy::new(|| {
    if let Err(err) = default_registry().register(Box::new(ProcessCollector::for_self())) {
        warn!("Failed to register process collector: {}", err);
    }
});

static ACTION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    // Exponential buckets from 50ms up to ~7 minutes; bulk actions wait on prompts.
    let buckets =
        prometheus::exponential_buckets(0.05, 2.0, 14).expect("failed to create histogram buckets");
    register_histogram_vec!(
        "tg_session_manager_action_duration_seconds",
        "Menu action duration in seconds",
        &["action"],
        buckets
    )
    .expect("failed to register action duration histogram")
});

static ACTION_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "tg_session_manager_action_total",
        "Total menu actions by status",
        &["action", "status"]
    )
    .expect("failed to register action counter")
});

static ACTION_INFLIGHT: Lazy<IntGaugeVec> = Lazy::new(|| {
    register_int_gauge_vec!(
        "tg_session_manager_action_inflight",
        "Number of in-flight menu actions",
        &["action"]
    )
    .expect("failed to register inflight gauge")
});

static ITEM_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "tg_session_manager_item_total",
        "Per-dialog outcomes of bulk actions",
        &["action", "status"]
    )
    .expect("failed to register item counter")
});

/// Ensure collectors are registered.
fn init_collectors() {
    Lazy::force(&PROCESS_COLLECTOR);
    Lazy::force(&ACTION_DURATION);
    Lazy::force(&ACTION_TOTAL);
    Lazy::force(&ACTION_INFLIGHT);
    Lazy::force(&ITEM_TOTAL);
}

fn status_label(success: bool) -> &'static str {
    if success {
        "ok"
    } else {
        "error"
    }
}

/// Increment inflight gauge for an action.
pub fn record_action_start(action: &'static str) {
    init_collectors();
    ACTION_INFLIGHT.with_label_values(&[action]).inc();
}

/// Record action completion with duration and status.
pub fn record_action_result(action: &'static str, duration: Duration, success: bool) {
    init_collectors();
    ACTION_INFLIGHT.with_label_values(&[action]).dec();
    ACTION_DURATION
        .with_label_values(&[action])
        .observe(duration.as_secs_f64());
    ACTION_TOTAL
        .with_label_values(&[action, status_label(success)])
        .inc();
}

/// Count one dialog processed by a bulk action.
pub fn record_item(action: &'static str, success: bool) {
    init_collectors();
    ITEM_TOTAL
        .with_label_values(&[action, status_label(success)])
        .inc();
}

async fn metrics_response() -> Result<Response<Full<Bytes>>, Infallible> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        error!("Failed to encode metrics: {}", err);
        let mut response = Response::new(Full::from("encode error"));
        *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        return Ok(response);
    }

    let mut response = Response::new(Full::from(buffer));
    if let Ok(value) = encoder.format_type().parse::<hyper::header::HeaderValue>() {
        response
            .headers_mut()
            .insert(hyper::header::CONTENT_TYPE, value);
    }
    Ok(response)
}

async fn handle_request(req: Request<Incoming>) -> Result<Response<Full<Bytes>>, Infallible> {
    match req.uri().path() {
        "/metrics" => metrics_response().await,
        _ => {
            let mut response = Response::new(Full::new(Bytes::new()));
            *response.status_mut() = StatusCode::NOT_FOUND;
            Ok(response)
        }
    }
}

async fn serve(addr: SocketAddr) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "Prometheus metrics endpoint started");

    loop {
        let (stream, peer) = listener.accept().await?;
        let service = service_fn(handle_request);
        let io = TokioIo::new(stream);

        tokio::spawn(async move {
            if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                warn!(?peer, "Metrics connection error: {}", err);
            }
        });
    }
}

/// Spawn the metrics HTTP endpoint on the given address.
pub fn spawn_metrics_server(addr: SocketAddr) {
    init_collectors();
    tokio::spawn(async move {
        if let Err(err) = serve(addr).await {
            error!(%addr, "Metrics server failed: {}", err);
        }
    });
}
