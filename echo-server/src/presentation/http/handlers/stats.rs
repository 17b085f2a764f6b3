use axum::{Json, extract::State};
use serde::Serialize;
use utoipa::ToSchema;

use crate::application::feed_service::FeedStats;
use crate::presentation::AppState;
use crate::presentation::http::app_error::AppResult;

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct StatsDto {
    pub(crate) total_users: usize,
    pub(crate) total_posts: usize,
    pub(crate) online_users: usize,
    /// Likes, dislikes and comments over all posts.
    pub(crate) total_interactions: usize,
}

impl From<FeedStats> for StatsDto {
    fn from(stats: FeedStats) -> Self {
        Self {
            total_users: stats.total_users,
            total_posts: stats.total_posts,
            online_users: stats.online_users,
            total_interactions: stats.total_interactions,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/stats",
    tag = "stats",
    responses(
        (status = 200, description = "Feed counters", body = StatsDto),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn stats(State(state): State<AppState>) -> AppResult<Json<StatsDto>> {
    let stats = state.feed_service.stats().await?;
    Ok(Json(stats.into()))
}
