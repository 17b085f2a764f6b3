use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::data::user_repository::BanOutcome;
use crate::domain::user::{ProfileUpdate, User};
use crate::presentation::AppState;
use crate::presentation::http::app_error::AppResult;
use crate::presentation::http::extract::{AppJson, AppPath, OptionalJson};
use crate::presentation::http::handlers::posts::PostDto;
use crate::presentation::http::middleware::auth::Session;

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct UserDto {
    pub(crate) username: String,
    pub(crate) is_admin: bool,
    pub(crate) banned: bool,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) last_seen: Option<DateTime<Utc>>,
    pub(crate) avatar: String,
    pub(crate) bio: String,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            username: user.username,
            is_admin: user.is_admin,
            banned: user.banned,
            created_at: user.created_at,
            last_seen: user.last_seen,
            avatar: user.avatar,
            bio: user.bio,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct ProfileDto {
    pub(crate) username: Option<String>,
    pub(crate) bio: Option<String>,
    #[validate(length(min = 1, max = 2048))]
    pub(crate) avatar: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub(crate) struct ModerationDto {
    pub(crate) by: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct ModerationResponseDto {
    pub(crate) user: UserDto,
    pub(crate) removed_posts: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct OnlineUsersDto {
    pub(crate) online_users: Vec<String>,
}

impl From<BanOutcome> for ModerationResponseDto {
    fn from(outcome: BanOutcome) -> Self {
        Self {
            user: outcome.user.into(),
            removed_posts: outcome.removed_posts,
        }
    }
}

impl From<User> for ModerationResponseDto {
    fn from(user: User) -> Self {
        Self {
            user: user.into(),
            removed_posts: 0,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/users",
    tag = "users",
    responses(
        (status = 200, description = "All users", body = [UserDto]),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<UserDto>>> {
    let users = state.user_service.list_users().await?;
    Ok(Json(users.into_iter().map(UserDto::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/users/online",
    tag = "users",
    responses((status = 200, description = "Users seen recently", body = OnlineUsersDto))
)]
pub(crate) async fn online_users(State(state): State<AppState>) -> Json<OnlineUsersDto> {
    Json(OnlineUsersDto {
        online_users: state.user_service.online_users(),
    })
}

#[utoipa::path(
    get,
    path = "/api/users/{username}",
    tag = "users",
    params(
        ("username" = String, Path, description = "Username, case-insensitive")
    ),
    responses(
        (status = 200, description = "User found", body = UserDto),
        (status = 404, description = "User not found")
    )
)]
pub(crate) async fn get_user(
    State(state): State<AppState>,
    AppPath(username): AppPath<String>,
) -> AppResult<Json<UserDto>> {
    let user = state.user_service.get_user(&username).await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    get,
    path = "/api/users/{username}/bookmarks",
    tag = "users",
    params(
        ("username" = String, Path, description = "Username, case-insensitive")
    ),
    responses(
        (status = 200, description = "Bookmarked posts, oldest bookmark first", body = [PostDto]),
        (status = 404, description = "User not found")
    )
)]
pub(crate) async fn bookmarks(
    State(state): State<AppState>,
    AppPath(username): AppPath<String>,
) -> AppResult<Json<Vec<PostDto>>> {
    let posts = state.feed_service.bookmarks(&username).await?;
    Ok(Json(posts.into_iter().map(PostDto::from).collect()))
}

#[utoipa::path(
    put,
    path = "/api/users/{username}/profile",
    tag = "users",
    security(
        (),
        ("bearer_auth" = [])
    ),
    params(
        ("username" = String, Path, description = "Profile owner")
    ),
    request_body = ProfileDto,
    responses(
        (status = 200, description = "Profile updated", body = UserDto),
        (status = 400, description = "Validation error"),
        (status = 401, description = "No acting user"),
        (status = 403, description = "Not your profile"),
        (status = 404, description = "User not found")
    )
)]
pub(crate) async fn update_profile(
    State(state): State<AppState>,
    session: Session,
    AppPath(username): AppPath<String>,
    AppJson(dto): AppJson<ProfileDto>,
) -> AppResult<Json<UserDto>> {
    dto.validate()?;
    let actor = session.actor(dto.username)?;
    let update = ProfileUpdate {
        bio: dto.bio,
        avatar: dto.avatar,
    };

    let user = state
        .user_service
        .update_profile(&actor, &username, update)
        .await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    post,
    path = "/api/users/{username}/ban",
    tag = "moderation",
    security(
        (),
        ("bearer_auth" = [])
    ),
    params(
        ("username" = String, Path, description = "User to ban")
    ),
    request_body(content = ModerationDto, description = "Optional when a bearer token is sent"),
    responses(
        (status = 200, description = "User banned, their posts removed", body = ModerationResponseDto),
        (status = 401, description = "No acting user"),
        (status = 403, description = "Admin rights required"),
        (status = 404, description = "User not found")
    )
)]
pub(crate) async fn ban_user(
    State(state): State<AppState>,
    session: Session,
    AppPath(username): AppPath<String>,
    OptionalJson(dto): OptionalJson<ModerationDto>,
) -> AppResult<Json<ModerationResponseDto>> {
    let actor = session.actor(dto.by)?;
    let outcome = state.moderation_service.ban(&actor, &username).await?;
    Ok(Json(outcome.into()))
}

#[utoipa::path(
    post,
    path = "/api/users/{username}/unban",
    tag = "moderation",
    security(
        (),
        ("bearer_auth" = [])
    ),
    params(
        ("username" = String, Path, description = "User to unban")
    ),
    request_body(content = ModerationDto, description = "Optional when a bearer token is sent"),
    responses(
        (status = 200, description = "User unbanned", body = ModerationResponseDto),
        (status = 401, description = "No acting user"),
        (status = 403, description = "Admin rights required"),
        (status = 404, description = "User not found")
    )
)]
pub(crate) async fn unban_user(
    State(state): State<AppState>,
    session: Session,
    AppPath(username): AppPath<String>,
    OptionalJson(dto): OptionalJson<ModerationDto>,
) -> AppResult<Json<ModerationResponseDto>> {
    let actor = session.actor(dto.by)?;
    let user = state.moderation_service.unban(&actor, &username).await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    post,
    path = "/api/users/{username}/promote",
    tag = "moderation",
    security(
        (),
        ("bearer_auth" = [])
    ),
    params(
        ("username" = String, Path, description = "User to promote")
    ),
    request_body(content = ModerationDto, description = "Optional when a bearer token is sent"),
    responses(
        (status = 200, description = "User is now an admin", body = ModerationResponseDto),
        (status = 401, description = "No acting user"),
        (status = 403, description = "Admin rights required"),
        (status = 404, description = "User not found")
    )
)]
pub(crate) async fn promote_user(
    State(state): State<AppState>,
    session: Session,
    AppPath(username): AppPath<String>,
    OptionalJson(dto): OptionalJson<ModerationDto>,
) -> AppResult<Json<ModerationResponseDto>> {
    let actor = session.actor(dto.by)?;
    let user = state.moderation_service.promote(&actor, &username).await?;
    Ok(Json(user.into()))
}
