//! medibridge-server library crate
//!
//! Exposes `build_app`, `config`, `db` and `logging` for the binary and for
//! integration tests. The actual binary entrypoint is in `main.rs`.

pub mod config;
pub mod db;
mod error;
pub mod logging;
mod middleware;
mod routes;

use axum::{Extension, Router, middleware as axum_mw, routing::get};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use db::SharedStore;

/// Build the full application router with all routes and middleware.
///
/// Extracted from `main()` so tests can construct the app over any
/// [`db::DocumentStore`] without binding to a TCP port.
pub fn build_app(store: SharedStore, config: &Config) -> Router {
    // Install Prometheus metrics recorder.
    // A second install (e.g. across tests) is ignored; the handle still renders.
    let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
    let prometheus_handle = recorder.handle();
    let _ = metrics::set_global_recorder(recorder);

    let public_routes = Router::new()
        .route("/metadata", get(routes::metadata::get))
        .route("/health", get(routes::health::check))
        .route("/metrics", get(routes::metrics::get))
        .layer(Extension(prometheus_handle));

    // Build CORS layer
    let cors = if config.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers(Any)
    };

    Router::new()
        .merge(public_routes)
        .merge(routes::resource_routes())
        .with_state(store)
        .layer(axum_mw::from_fn(middleware::audit_middleware))
        .layer(axum_mw::from_fn(middleware::request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum_mw::from_fn(middleware::metrics_middleware))
}
