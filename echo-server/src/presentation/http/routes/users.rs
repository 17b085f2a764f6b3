use axum::Router;
use axum::routing::{get, post, put};

use crate::presentation::AppState;
use crate::presentation::http::handlers::users::{
    ban_user, bookmarks, get_user, list_users, online_users, promote_user, unban_user,
    update_profile,
};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/online", get(online_users))
        .route("/{username}", get(get_user))
        .route("/{username}/bookmarks", get(bookmarks))
        .route("/{username}/profile", put(update_profile))
        .route("/{username}/ban", post(ban_user))
        .route("/{username}/unban", post(unban_user))
        .route("/{username}/promote", post(promote_user))
}
