//! Prometheus metrics for chirp-service.
//!
//! Exposes HTTP and domain collectors plus the `/metrics` handler.

use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, Encoder,
    HistogramVec, IntCounter, IntCounterVec, TextEncoder,
};

lazy_static! {
    /// HTTP requests by method, matched route pattern and status code.
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "chirp_http_requests_total",
        "Total HTTP requests handled",
        &["method", "route", "status"]
    )
    .expect("failed to register chirp_http_requests_total");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "chirp_http_request_duration_seconds",
        "HTTP request latency",
        &["method", "route"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]
    )
    .expect("failed to register chirp_http_request_duration_seconds");

    pub static ref CHEEPS_POSTED_TOTAL: IntCounter = register_int_counter!(
        "chirp_cheeps_posted_total",
        "Cheeps accepted"
    )
    .expect("failed to register chirp_cheeps_posted_total");

    pub static ref COMMENTS_POSTED_TOTAL: IntCounter = register_int_counter!(
        "chirp_comments_posted_total",
        "Comments accepted"
    )
    .expect("failed to register chirp_comments_posted_total");

    /// Follow graph changes (follow/unfollow) that actually altered an edge.
    pub static ref FOLLOW_EVENTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "chirp_follow_events_total",
        "Follow graph mutations",
        &["action"]
    )
    .expect("failed to register chirp_follow_events_total");
}

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
