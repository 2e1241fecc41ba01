pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod kv;
pub mod models;
pub mod routes;
pub mod state;

use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, Method, header};
use axum::routing::get;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_scalar::{Scalar, Servable as ScalarServable};

use crate::config::CorsConfig;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "nn-stack API",
        version = "0.1.0",
        description = "JSON procedures of the nn-stack scaffold. Every procedure is a `POST` \
                       with a JSON body; failures answer with `{code, message}`."
    ),
    tags(
        (name = "Health", description = "Reachability of the server and its bindings"),
        (name = "Users", description = "User CRUD"),
        (name = "Todos", description = "Todo CRUD"),
        (name = "Planets", description = "Static demo catalogue"),
        (name = "Storage", description = "Presigned uploads, listing and deletion of stored objects"),
    ),
)]
struct ApiDoc;

/// Build the application router.
pub fn build_router(state: AppState) -> axum::Router {
    let cors = cors_layer(&state.config.server.cors);

    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .merge(routes::rpc_routes())
        .split_for_parts();

    router
        .route("/", get(handlers::root::index))
        .merge(routes::object_routes())
        .with_state(state)
        .route(
            "/api-docs/openapi.json",
            get({
                let api = api.clone();
                move || async move { axum::Json(api) }
            }),
        )
        .merge(Scalar::with_url("/scalar", api))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allow_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-requested-with"),
        ])
        .max_age(Duration::from_secs(config.max_age))
}
