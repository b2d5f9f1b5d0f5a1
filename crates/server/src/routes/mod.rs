pub mod health;
pub mod metadata;
pub mod metrics;
mod resource;

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    routing::{get, post},
};
use medibridge_core::ResourceKind;
use serde_json::Value as JsonValue;

use crate::db::SharedStore;
use resource::IdentifierQuery;

/// Build read/create routes for every resource kind
pub fn resource_routes() -> Router<SharedStore> {
    ResourceKind::ALL
        .into_iter()
        .fold(Router::new(), |router, kind| {
            let base = format!("/{}", kind.path());
            router
                .route(
                    &base,
                    post(
                        move |store: State<SharedStore>,
                              body: Result<Json<JsonValue>, JsonRejection>| {
                            resource::create(kind, store, body)
                        },
                    ),
                )
                .route(
                    &format!("{base}/by-identifier"),
                    get(
                        move |store: State<SharedStore>,
                              query: Result<Query<IdentifierQuery>, QueryRejection>| {
                            resource::by_identifier(kind, store, query)
                        },
                    ),
                )
                .route(
                    &format!("{base}/{{id}}"),
                    get(move |store: State<SharedStore>, id: Path<String>| {
                        resource::read(kind, store, id)
                    }),
                )
        })
}
