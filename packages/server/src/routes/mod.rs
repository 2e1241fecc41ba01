use axum::Router;
use axum::routing::get;
use common::procedures::LOCAL_OBJECTS;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers::{health, objects, planet, storage, todos, users};
use crate::state::AppState;

/// Every RPC procedure, one `POST /rpc/{namespace}/{procedure}` route each.
pub fn rpc_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(health::connection))
        .routes(routes!(health::kv))
        .routes(routes!(health::db))
        .routes(routes!(health::r2))
        .routes(routes!(users::get_users))
        .routes(routes!(users::create_user))
        .routes(routes!(users::update_user))
        .routes(routes!(users::delete_user))
        .routes(routes!(todos::get_todos))
        .routes(routes!(todos::create_todo))
        .routes(routes!(todos::update_todo))
        .routes(routes!(todos::delete_todo))
        .routes(routes!(planet::list))
        .routes(routes!(storage::presign))
        .routes(routes!(storage::list))
        .routes(routes!(storage::delete))
}

/// Upload and download routes of the local object store.
pub fn object_routes() -> Router<AppState> {
    Router::new().route(
        &format!("{LOCAL_OBJECTS}/{{key}}"),
        get(objects::get_object).put(objects::put_object),
    )
}
