use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::presentation::http::handlers::auth::{AuthResponseDto, LoginDto, RegisterDto};
use crate::presentation::http::handlers::posts::{
    BookmarkResponseDto, CommentDto, CreateCommentDto, CreatePostDto, ListPostsQuery,
    ListPostsResponseDto, PostDto, SearchQuery,
};
use crate::presentation::http::handlers::stats::StatsDto;
use crate::presentation::http::handlers::tags::{TagCountDto, TrendingQuery};
use crate::presentation::http::handlers::users::{
    ModerationDto, ModerationResponseDto, OnlineUsersDto, ProfileDto, UserDto,
};
use crate::presentation::http::handlers::{ActorDto, StatusDto};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::presentation::http::handlers::healthz,
        crate::presentation::http::handlers::auth::register,
        crate::presentation::http::handlers::auth::login,
        crate::presentation::http::handlers::auth::logout,
        crate::presentation::http::handlers::posts::list_posts,
        crate::presentation::http::handlers::posts::search_posts,
        crate::presentation::http::handlers::posts::get_post,
        crate::presentation::http::handlers::posts::create_post,
        crate::presentation::http::handlers::posts::delete_post,
        crate::presentation::http::handlers::posts::toggle_like,
        crate::presentation::http::handlers::posts::toggle_dislike,
        crate::presentation::http::handlers::posts::add_comment,
        crate::presentation::http::handlers::posts::toggle_bookmark,
        crate::presentation::http::handlers::tags::trending_tags,
        crate::presentation::http::handlers::users::list_users,
        crate::presentation::http::handlers::users::online_users,
        crate::presentation::http::handlers::users::get_user,
        crate::presentation::http::handlers::users::bookmarks,
        crate::presentation::http::handlers::users::update_profile,
        crate::presentation::http::handlers::users::ban_user,
        crate::presentation::http::handlers::users::unban_user,
        crate::presentation::http::handlers::users::promote_user,
        crate::presentation::http::handlers::stats::stats
    ),
    components(
        schemas(
            ActorDto,
            StatusDto,
            RegisterDto,
            LoginDto,
            AuthResponseDto,
            UserDto,
            ProfileDto,
            ModerationDto,
            ModerationResponseDto,
            OnlineUsersDto,
            CreatePostDto,
            CreateCommentDto,
            ListPostsQuery,
            SearchQuery,
            PostDto,
            CommentDto,
            ListPostsResponseDto,
            BookmarkResponseDto,
            TrendingQuery,
            TagCountDto,
            StatsDto
        )
    ),
    tags(
        (name = "health", description = "Liveness probe"),
        (name = "auth", description = "Registration and sessions"),
        (name = "posts", description = "Feed, reactions, comments, tags and bookmarks"),
        (name = "users", description = "Profiles and presence"),
        (name = "moderation", description = "Admin actions"),
        (name = "stats", description = "Feed counters")
    ),
    modifiers(&SecurityAddon)
)]
pub(crate) struct ApiDoc;

pub(crate) struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let mut components = openapi.components.take().unwrap_or_default();
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
        openapi.components = Some(components);
    }
}
