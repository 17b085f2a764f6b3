use axum::{Router, middleware, routing::get};

use crate::presentation::AppState;
use crate::presentation::http::handlers::stats::stats;
use crate::presentation::http::handlers::tags::trending_tags;
use crate::presentation::http::middleware::auth::session_middleware;

pub(crate) mod auth;
pub(crate) mod posts;
pub(crate) mod users;

pub(crate) fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/api/auth", auth::router())
        .nest("/api/posts", posts::router())
        .nest("/api/users", users::router())
        .route("/api/tags/trending", get(trending_tags))
        .route("/api/stats", get(stats))
        .layer(middleware::from_fn_with_state(state, session_middleware))
}
