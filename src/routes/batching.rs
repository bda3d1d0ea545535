//! Batching routes. Handlers resolve the entity from the table segment at request time.

use crate::handlers::{find, find_grouped};
use crate::routes::common_routes;
use crate::state::AppState;
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

pub fn batching_routes(state: AppState) -> Router {
    Router::new()
        .route("/grouped/:table", get(find_grouped))
        .route("/:table", get(find))
        .with_state(state)
}

/// Common routes at the root plus batching routes nested under `prefix` (e.g. `/api/batching`).
pub fn app(state: AppState, prefix: &str) -> Router {
    let prefix = prefix.trim_end_matches('/');
    let batching = batching_routes(state.clone());
    let router = Router::new().merge(common_routes(state));
    let router = if prefix.is_empty() {
        router.merge(batching)
    } else {
        router.nest(prefix, batching)
    };
    router.layer(TraceLayer::new_for_http())
}
