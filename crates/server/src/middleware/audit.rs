//! Audit logging for resource creation

use axum::{
    body::Body,
    extract::Request,
    http::{Method, header},
    middleware::Next,
    response::Response,
};

use super::request_id::RequestId;

/// Log every POST with its outcome and, when something was created, where it lives
pub async fn audit_middleware(request: Request<Body>, next: Next) -> Response {
    if *request.method() != Method::POST {
        return next.run(request).await;
    }

    let path = request.uri().path().to_string();
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|r| r.0.clone())
        .unwrap_or_else(|| "unknown".to_string());

    let response = next.run(request).await;

    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");

    tracing::info!(
        target: "audit",
        request_id = %request_id,
        path = %path,
        status = response.status().as_u16(),
        location = %location,
        "Create request"
    );

    response
}
