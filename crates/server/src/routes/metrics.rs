//! Prometheus scrape endpoint

use axum::{Extension, http::header, response::IntoResponse};
use metrics_exporter_prometheus::PrometheusHandle;

/// Content type of the Prometheus text exposition format
const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// GET /metrics - HTTP and resource outcome metrics
pub async fn get(Extension(handle): Extension<PrometheusHandle>) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)], handle.render())
}
