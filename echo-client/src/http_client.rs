use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::error::{EchoClientError, EchoClientResult};
use crate::models::{
    AuthResponse, BookmarkResponse, Comment, FeedSort, ListPostsResponse, ModerationResponse,
    Post, Stats, TagCount, User,
};

/// От чьего имени выполняется запрос: токен в заголовке и/или имя в теле.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Actor<'a> {
    pub(crate) token: Option<&'a str>,
    pub(crate) username: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct CredentialsDto<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct ActorDto<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct ModerationDto<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    by: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct CreatePostDto<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<&'a str>,
    title: &'a str,
    description: &'a str,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    tags: &'a [String],
}

#[derive(Debug, Serialize)]
struct CreateCommentDto<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<&'a str>,
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct ProfileDto<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bio: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    avatar: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct ListPostsQuery<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    sort: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    q: Option<&'a str>,
    limit: u32,
    offset: u32,
}

#[derive(Debug, Serialize)]
struct TrendingQuery {
    limit: usize,
}

#[derive(Debug, Deserialize)]
struct ErrorResponseDto {
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OnlineUsersDto {
    online_users: Vec<String>,
}

#[derive(Debug, Clone)]
/// HTTP-клиент для REST API `echo-server`.
pub(crate) struct HttpClient {
    base_url: String,
    client: Client,
}

impl HttpClient {
    pub(crate) fn new(base_url: impl Into<String>) -> EchoClientResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let request = self.client.request(method, self.endpoint(path));
        match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn decode_error(response: reqwest::Response) -> EchoClientError {
        let status = response.status();

        let message = match response.json::<ErrorResponseDto>().await {
            Ok(body) => body.error,
            Err(_) => None,
        };
        EchoClientError::from_http_status(status, message)
    }

    async fn send(request: RequestBuilder) -> EchoClientResult<reqwest::Response> {
        let response = request
            .send()
            .await
            .map_err(EchoClientError::from_reqwest)?;
        if !response.status().is_success() {
            return Err(Self::decode_error(response).await);
        }
        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> EchoClientResult<T> {
        Self::send(request)
            .await?
            .json::<T>()
            .await
            .map_err(EchoClientError::from_reqwest)
    }

    pub(crate) async fn health(&self) -> EchoClientResult<()> {
        Self::send(self.request(Method::GET, "/healthz", None)).await?;
        Ok(())
    }

    pub(crate) async fn register(&self, username: &str, password: &str) -> EchoClientResult<User> {
        let payload = CredentialsDto { username, password };
        Self::send_json(
            self.request(Method::POST, "/api/auth/register", None)
                .json(&payload),
        )
        .await
    }

    pub(crate) async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> EchoClientResult<AuthResponse> {
        let payload = CredentialsDto { username, password };
        Self::send_json(
            self.request(Method::POST, "/api/auth/login", None)
                .json(&payload),
        )
        .await
    }

    pub(crate) async fn logout(&self, actor: Actor<'_>) -> EchoClientResult<()> {
        let payload = ActorDto {
            username: actor.username,
        };
        Self::send(
            self.request(Method::POST, "/api/auth/logout", actor.token)
                .json(&payload),
        )
        .await?;
        Ok(())
    }

    pub(crate) async fn list_posts(
        &self,
        sort: FeedSort,
        limit: u32,
        offset: u32,
    ) -> EchoClientResult<ListPostsResponse> {
        let query = ListPostsQuery {
            sort: Some(sort.as_str()),
            q: None,
            limit,
            offset,
        };
        Self::send_json(self.request(Method::GET, "/api/posts", None).query(&query)).await
    }

    pub(crate) async fn search_posts(
        &self,
        q: &str,
        limit: u32,
        offset: u32,
    ) -> EchoClientResult<ListPostsResponse> {
        let query = ListPostsQuery {
            sort: None,
            q: Some(q),
            limit,
            offset,
        };
        Self::send_json(
            self.request(Method::GET, "/api/posts/search", None)
                .query(&query),
        )
        .await
    }

    pub(crate) async fn get_post(&self, id: Uuid) -> EchoClientResult<Post> {
        Self::send_json(self.request(Method::GET, &format!("/api/posts/{id}"), None)).await
    }

    pub(crate) async fn create_post(
        &self,
        actor: Actor<'_>,
        title: &str,
        description: &str,
        tags: &[String],
    ) -> EchoClientResult<Post> {
        let payload = CreatePostDto {
            username: actor.username,
            title,
            description,
            tags,
        };
        Self::send_json(
            self.request(Method::POST, "/api/posts", actor.token)
                .json(&payload),
        )
        .await
    }

    pub(crate) async fn delete_post(&self, actor: Actor<'_>, id: Uuid) -> EchoClientResult<()> {
        let payload = ActorDto {
            username: actor.username,
        };
        Self::send(
            self.request(Method::DELETE, &format!("/api/posts/{id}"), actor.token)
                .json(&payload),
        )
        .await?;
        Ok(())
    }

    /// `reaction`: `like` или `dislike`.
    pub(crate) async fn react(
        &self,
        actor: Actor<'_>,
        id: Uuid,
        reaction: &str,
    ) -> EchoClientResult<Post> {
        let payload = ActorDto {
            username: actor.username,
        };
        Self::send_json(
            self.request(
                Method::POST,
                &format!("/api/posts/{id}/{reaction}"),
                actor.token,
            )
            .json(&payload),
        )
        .await
    }

    pub(crate) async fn add_comment(
        &self,
        actor: Actor<'_>,
        id: Uuid,
        text: &str,
    ) -> EchoClientResult<Comment> {
        let payload = CreateCommentDto {
            username: actor.username,
            text,
        };
        Self::send_json(
            self.request(
                Method::POST,
                &format!("/api/posts/{id}/comments"),
                actor.token,
            )
            .json(&payload),
        )
        .await
    }

    pub(crate) async fn toggle_bookmark(
        &self,
        actor: Actor<'_>,
        id: Uuid,
    ) -> EchoClientResult<BookmarkResponse> {
        let payload = ActorDto {
            username: actor.username,
        };
        Self::send_json(
            self.request(
                Method::POST,
                &format!("/api/posts/{id}/bookmark"),
                actor.token,
            )
            .json(&payload),
        )
        .await
    }

    pub(crate) async fn bookmarks(&self, username: &str) -> EchoClientResult<Vec<Post>> {
        Self::send_json(self.request(
            Method::GET,
            &format!("/api/users/{username}/bookmarks"),
            None,
        ))
        .await
    }

    pub(crate) async fn trending_tags(&self, limit: usize) -> EchoClientResult<Vec<TagCount>> {
        Self::send_json(
            self.request(Method::GET, "/api/tags/trending", None)
                .query(&TrendingQuery { limit }),
        )
        .await
    }

    pub(crate) async fn list_users(&self) -> EchoClientResult<Vec<User>> {
        Self::send_json(self.request(Method::GET, "/api/users", None)).await
    }

    pub(crate) async fn online_users(&self) -> EchoClientResult<Vec<String>> {
        let dto: OnlineUsersDto =
            Self::send_json(self.request(Method::GET, "/api/users/online", None)).await?;
        Ok(dto.online_users)
    }

    pub(crate) async fn get_user(&self, username: &str) -> EchoClientResult<User> {
        Self::send_json(self.request(Method::GET, &format!("/api/users/{username}"), None)).await
    }

    pub(crate) async fn update_profile(
        &self,
        actor: Actor<'_>,
        username: &str,
        bio: Option<&str>,
        avatar: Option<&str>,
    ) -> EchoClientResult<User> {
        let payload = ProfileDto {
            username: actor.username,
            bio,
            avatar,
        };
        Self::send_json(
            self.request(
                Method::PUT,
                &format!("/api/users/{username}/profile"),
                actor.token,
            )
            .json(&payload),
        )
        .await
    }

    /// `action`: `ban`, `unban` или `promote`.
    pub(crate) async fn moderate(
        &self,
        actor: Actor<'_>,
        username: &str,
        action: &str,
    ) -> EchoClientResult<ModerationResponse> {
        let payload = ModerationDto {
            by: actor.username,
        };
        Self::send_json(
            self.request(
                Method::POST,
                &format!("/api/users/{username}/{action}"),
                actor.token,
            )
            .json(&payload),
        )
        .await
    }

    pub(crate) async fn stats(&self) -> EchoClientResult<Stats> {
        Self::send_json(self.request(Method::GET, "/api/stats", None)).await
    }
}
