use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::post::TagCount;
use crate::presentation::AppState;
use crate::presentation::http::app_error::AppResult;
use crate::presentation::http::extract::AppQuery;

const DEFAULT_TRENDING: usize = 8;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct TrendingQuery {
    #[validate(range(min = 1, max = 50))]
    pub(crate) limit: Option<usize>,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct TagCountDto {
    /// Lowercase, with a leading `#`.
    pub(crate) tag: String,
    pub(crate) count: usize,
}

impl From<TagCount> for TagCountDto {
    fn from(entry: TagCount) -> Self {
        Self {
            tag: entry.tag,
            count: entry.count,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/tags/trending",
    tag = "posts",
    params(
        ("limit" = Option<usize>, Query, description = "How many tags to return (1..=50, default 8)")
    ),
    responses(
        (status = 200, description = "Tags by number of posts, most used first", body = [TagCountDto]),
        (status = 400, description = "Validation error"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn trending_tags(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<TrendingQuery>,
) -> AppResult<Json<Vec<TagCountDto>>> {
    query.validate()?;
    let limit = query.limit.unwrap_or(DEFAULT_TRENDING);

    let tags = state.feed_service.trending_tags(limit).await?;
    Ok(Json(tags.into_iter().map(TagCountDto::from).collect()))
}
