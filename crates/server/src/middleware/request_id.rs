use axum::{body::Body, extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Instrument;
use uuid::Uuid;

/// Header name for request ID
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

/// Longest client-supplied request ID we propagate
const MAX_REQUEST_ID_LEN: usize = 128;

/// Request ID attached to the request extensions
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Reuse the caller's `X-Request-ID` when it is sane, otherwise mint one,
/// and echo it on the response
pub async fn request_id_middleware(mut request: Request<Body>, next: Next) -> Response {
    let id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && v.len() <= MAX_REQUEST_ID_LEN)
        .map(String::from)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    request.extensions_mut().insert(RequestId(id.clone()));

    let mut response = next
        .run(request)
        .instrument(tracing::info_span!("request", request_id = %id))
        .await;

    if let Ok(value) = HeaderValue::from_str(&id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
