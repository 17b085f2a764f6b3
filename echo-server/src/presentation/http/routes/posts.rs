use axum::Router;
use axum::routing::{get, post};

use crate::presentation::AppState;
use crate::presentation::http::handlers::posts::{
    add_comment, create_post, delete_post, get_post, list_posts, search_posts, toggle_bookmark,
    toggle_dislike, toggle_like,
};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_posts).post(create_post))
        .route("/search", get(search_posts))
        .route("/{id}", get(get_post).delete(delete_post))
        .route("/{id}/like", post(toggle_like))
        .route("/{id}/dislike", post(toggle_dislike))
        .route("/{id}/comments", post(add_comment))
        .route("/{id}/bookmark", post(toggle_bookmark))
}
