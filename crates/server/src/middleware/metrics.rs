//! Prometheus metrics collection middleware
//!
//! Records `http_requests_total` (counter) and `http_request_duration_seconds`
//! (histogram) for every request, labelled by method, route and status.

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;

/// Route label for a request: the matched route template when routing
/// succeeded, otherwise the raw path with id-like segments collapsed.
fn route_label(request: &Request) -> String {
    if let Some(matched) = request.extensions().get::<MatchedPath>() {
        return matched.as_str().to_string();
    }

    request
        .uri()
        .path()
        .split('/')
        .map(|seg| {
            if uuid::Uuid::try_parse(seg).is_ok() {
                ":id"
            } else {
                seg
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Middleware that records request count and duration metrics.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let route = route_label(&request);

    let start = Instant::now();
    let response = next.run(request).await;
    let duration = start.elapsed().as_secs_f64();

    let status = response.status().as_u16().to_string();

    metrics::counter!(
        "http_requests_total",
        "method" => method.clone(),
        "route" => route.clone(),
        "status" => status
    )
    .increment(1);

    metrics::histogram!(
        "http_request_duration_seconds",
        "method" => method,
        "route" => route
    )
    .record(duration);

    response
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http};

    use super::*;

    #[test]
    fn unmatched_ids_are_collapsed() {
        let request = http::Request::builder()
            .uri("/patient/67e55044-10b1-426f-9247-bb680e5fe0c8")
            .body(Body::empty())
            .unwrap();
        assert_eq!(route_label(&request), "/patient/:id");
    }
}
