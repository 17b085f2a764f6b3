use axum::{Router, routing::get};

use crate::presentation::AppState;

pub(crate) mod app_error;
pub(crate) mod extract;
pub(crate) mod handlers;
pub(crate) mod middleware;
pub(crate) mod openapi;
pub(crate) mod routes;

pub(crate) fn routes(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(handlers::healthz))
        .merge(routes::router(state.clone()))
        .with_state(state)
}
