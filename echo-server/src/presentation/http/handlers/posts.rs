use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::ActorDto;
use crate::application::feed_service::ListPostsResult;
use crate::data::post_repository::Pagination;
use crate::domain::interaction;
use crate::domain::post::{Comment, CreatePostRequest, FeedSort, Post};
use crate::presentation::AppState;
use crate::presentation::http::app_error::AppResult;
use crate::presentation::http::extract::{AppJson, AppPath, AppQuery, OptionalJson};
use crate::presentation::http::middleware::auth::Session;

const DEFAULT_LIMIT: u32 = 20;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct CreatePostDto {
    pub(crate) username: Option<String>,
    #[validate(length(min = 1))]
    pub(crate) title: String,
    #[validate(length(min = 1))]
    pub(crate) description: String,
    /// Hashtags, with or without `#`; entries may hold several space-separated tags.
    #[serde(default)]
    pub(crate) tags: Vec<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct CreateCommentDto {
    pub(crate) username: Option<String>,
    #[validate(length(min = 1))]
    pub(crate) text: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct ListPostsQuery {
    pub(crate) sort: Option<String>,
    #[validate(range(min = 1, max = 100))]
    pub(crate) limit: Option<u32>,
    pub(crate) offset: Option<u32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct SearchQuery {
    #[serde(default)]
    pub(crate) q: String,
    #[validate(range(min = 1, max = 100))]
    pub(crate) limit: Option<u32>,
    pub(crate) offset: Option<u32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct CommentDto {
    pub(crate) id: Uuid,
    pub(crate) username: String,
    pub(crate) text: String,
    pub(crate) timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct PostDto {
    pub(crate) id: Uuid,
    pub(crate) username: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) timestamp: DateTime<Utc>,
    pub(crate) likes: Vec<String>,
    pub(crate) dislikes: Vec<String>,
    pub(crate) comments: Vec<CommentDto>,
    pub(crate) tags: Vec<String>,
    pub(crate) score: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct BookmarkResponseDto {
    pub(crate) post_id: Uuid,
    pub(crate) bookmarked: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct ListPostsResponseDto {
    pub(crate) posts: Vec<PostDto>,
    pub(crate) sort: String,
    pub(crate) total: usize,
    pub(crate) limit: u32,
    pub(crate) offset: u32,
}

impl From<Comment> for CommentDto {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            username: comment.username,
            text: comment.text,
            timestamp: comment.timestamp,
        }
    }
}

impl From<Post> for PostDto {
    fn from(post: Post) -> Self {
        let score = interaction::popularity_score(&post);
        Self {
            id: post.id,
            username: post.username,
            title: post.title,
            description: post.description,
            timestamp: post.timestamp,
            likes: post.likes.into_iter().collect(),
            dislikes: post.dislikes.into_iter().collect(),
            comments: post.comments.into_iter().map(CommentDto::from).collect(),
            tags: post.tags,
            score,
        }
    }
}

impl ListPostsResponseDto {
    fn new(result: ListPostsResult, pagination: Pagination) -> Self {
        Self {
            posts: result.posts.into_iter().map(PostDto::from).collect(),
            sort: result.sort.to_string(),
            total: result.total,
            limit: pagination.limit,
            offset: pagination.offset,
        }
    }
}

fn pagination(limit: Option<u32>, offset: Option<u32>) -> Pagination {
    Pagination {
        limit: limit.unwrap_or(DEFAULT_LIMIT),
        offset: offset.unwrap_or(0),
    }
}

#[utoipa::path(
    get,
    path = "/api/posts",
    tag = "posts",
    params(
        ("sort" = Option<String>, Query, description = "`recent` (default) or `popular`"),
        ("limit" = Option<u32>, Query, description = "Items per page (1..=100)"),
        ("offset" = Option<u32>, Query, description = "Offset from the beginning (>= 0)")
    ),
    responses(
        (status = 200, description = "Posts listed", body = ListPostsResponseDto),
        (status = 400, description = "Validation error"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn list_posts(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ListPostsQuery>,
) -> AppResult<Json<ListPostsResponseDto>> {
    query.validate()?;
    let sort: FeedSort = query.sort.as_deref().unwrap_or_default().parse()?;
    let pagination = pagination(query.limit, query.offset);

    let result = state.feed_service.list_posts(sort, pagination).await?;
    Ok(Json(ListPostsResponseDto::new(result, pagination)))
}

#[utoipa::path(
    get,
    path = "/api/posts/search",
    tag = "posts",
    params(
        ("q" = String, Query, description = "Case-insensitive text matched against title, description, author and tags"),
        ("limit" = Option<u32>, Query, description = "Items per page (1..=100)"),
        ("offset" = Option<u32>, Query, description = "Offset from the beginning (>= 0)")
    ),
    responses(
        (status = 200, description = "Matching posts, newest first", body = ListPostsResponseDto),
        (status = 400, description = "Empty query"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn search_posts(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<SearchQuery>,
) -> AppResult<Json<ListPostsResponseDto>> {
    query.validate()?;
    let pagination = pagination(query.limit, query.offset);

    let result = state.feed_service.search_posts(&query.q, pagination).await?;
    Ok(Json(ListPostsResponseDto::new(result, pagination)))
}

#[utoipa::path(
    get,
    path = "/api/posts/{id}",
    tag = "posts",
    params(
        ("id" = Uuid, Path, description = "Post id")
    ),
    responses(
        (status = 200, description = "Post found", body = PostDto),
        (status = 400, description = "Malformed id"),
        (status = 404, description = "Post not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn get_post(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<PostDto>> {
    let post = state.feed_service.get_post(id).await?;
    Ok(Json(post.into()))
}

#[utoipa::path(
    post,
    path = "/api/posts",
    tag = "posts",
    security(
        (),
        ("bearer_auth" = [])
    ),
    request_body = CreatePostDto,
    responses(
        (status = 201, description = "Post created", body = PostDto),
        (status = 400, description = "Validation error"),
        (status = 401, description = "No acting user"),
        (status = 403, description = "User is banned or unknown"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn create_post(
    State(state): State<AppState>,
    session: Session,
    AppJson(dto): AppJson<CreatePostDto>,
) -> AppResult<(StatusCode, Json<PostDto>)> {
    dto.validate()?;
    let actor = session.actor(dto.username)?;
    let req = CreatePostRequest {
        title: dto.title,
        description: dto.description,
        tags: dto.tags,
    };

    let post = state.feed_service.create_post(&actor, req).await?;
    Ok((StatusCode::CREATED, Json(post.into())))
}

#[utoipa::path(
    delete,
    path = "/api/posts/{id}",
    tag = "posts",
    security(
        (),
        ("bearer_auth" = [])
    ),
    params(
        ("id" = Uuid, Path, description = "Post id")
    ),
    request_body(content = ActorDto, description = "Optional when a bearer token is sent"),
    responses(
        (status = 204, description = "Post deleted"),
        (status = 401, description = "No acting user"),
        (status = 403, description = "Only the author or an admin may delete"),
        (status = 404, description = "Post not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn delete_post(
    State(state): State<AppState>,
    session: Session,
    AppPath(id): AppPath<Uuid>,
    OptionalJson(dto): OptionalJson<ActorDto>,
) -> AppResult<StatusCode> {
    let actor = session.actor(dto.username)?;
    state.feed_service.delete_post(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/posts/{id}/like",
    tag = "posts",
    security(
        (),
        ("bearer_auth" = [])
    ),
    params(
        ("id" = Uuid, Path, description = "Post id")
    ),
    request_body(content = ActorDto, description = "Optional when a bearer token is sent"),
    responses(
        (status = 200, description = "Like toggled", body = PostDto),
        (status = 401, description = "No acting user"),
        (status = 403, description = "User is banned or unknown"),
        (status = 404, description = "Post not found")
    )
)]
pub(crate) async fn toggle_like(
    State(state): State<AppState>,
    session: Session,
    AppPath(id): AppPath<Uuid>,
    OptionalJson(dto): OptionalJson<ActorDto>,
) -> AppResult<Json<PostDto>> {
    let actor = session.actor(dto.username)?;
    let post = state.feed_service.toggle_like(&actor, id).await?;
    Ok(Json(post.into()))
}

#[utoipa::path(
    post,
    path = "/api/posts/{id}/dislike",
    tag = "posts",
    security(
        (),
        ("bearer_auth" = [])
    ),
    params(
        ("id" = Uuid, Path, description = "Post id")
    ),
    request_body(content = ActorDto, description = "Optional when a bearer token is sent"),
    responses(
        (status = 200, description = "Dislike toggled", body = PostDto),
        (status = 401, description = "No acting user"),
        (status = 403, description = "User is banned or unknown"),
        (status = 404, description = "Post not found")
    )
)]
pub(crate) async fn toggle_dislike(
    State(state): State<AppState>,
    session: Session,
    AppPath(id): AppPath<Uuid>,
    OptionalJson(dto): OptionalJson<ActorDto>,
) -> AppResult<Json<PostDto>> {
    let actor = session.actor(dto.username)?;
    let post = state.feed_service.toggle_dislike(&actor, id).await?;
    Ok(Json(post.into()))
}

#[utoipa::path(
    post,
    path = "/api/posts/{id}/comments",
    tag = "posts",
    security(
        (),
        ("bearer_auth" = [])
    ),
    params(
        ("id" = Uuid, Path, description = "Post id")
    ),
    request_body = CreateCommentDto,
    responses(
        (status = 201, description = "Comment added", body = CommentDto),
        (status = 400, description = "Empty comment"),
        (status = 401, description = "No acting user"),
        (status = 403, description = "User is banned or unknown"),
        (status = 404, description = "Post not found")
    )
)]
pub(crate) async fn add_comment(
    State(state): State<AppState>,
    session: Session,
    AppPath(id): AppPath<Uuid>,
    AppJson(dto): AppJson<CreateCommentDto>,
) -> AppResult<(StatusCode, Json<CommentDto>)> {
    dto.validate()?;
    let actor = session.actor(dto.username)?;

    let comment = state.feed_service.add_comment(&actor, id, &dto.text).await?;
    Ok((StatusCode::CREATED, Json(comment.into())))
}

#[utoipa::path(
    post,
    path = "/api/posts/{id}/bookmark",
    tag = "posts",
    security(
        (),
        ("bearer_auth" = [])
    ),
    params(
        ("id" = Uuid, Path, description = "Post id")
    ),
    request_body(content = ActorDto, description = "Optional when a bearer token is sent"),
    responses(
        (status = 200, description = "Bookmark toggled", body = BookmarkResponseDto),
        (status = 401, description = "No acting user"),
        (status = 403, description = "User is banned or unknown"),
        (status = 404, description = "Post not found")
    )
)]
pub(crate) async fn toggle_bookmark(
    State(state): State<AppState>,
    session: Session,
    AppPath(id): AppPath<Uuid>,
    OptionalJson(dto): OptionalJson<ActorDto>,
) -> AppResult<Json<BookmarkResponseDto>> {
    let actor = session.actor(dto.username)?;
    let bookmarked = state.feed_service.toggle_bookmark(&actor, id).await?;
    Ok(Json(BookmarkResponseDto {
        post_id: id,
        bookmarked,
    }))
}
