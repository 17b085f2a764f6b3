//! Клиентская библиотека для работы с echo-server по HTTP.
//!
//! `EchoClient` хранит сессию (JWT-токен и имя пользователя) после `login`
//! и подставляет её в действия, которые выполняются от имени пользователя.
//! Без токена можно работать от имени пользователя через `act_as`: сервер
//! доверяет имени из тела запроса.
#![warn(missing_docs)]

mod error;
mod http_client;
mod models;

pub use error::{EchoClientError, EchoClientResult};
pub use models::{
    AuthResponse, BookmarkResponse, Comment, FeedSort, ListPostsResponse, ModerationResponse,
    Post, Stats, TagCount, User,
};
pub use uuid::Uuid;

use http_client::{Actor, HttpClient};

#[derive(Debug, Clone)]
/// Клиент ленты echo-server.
pub struct EchoClient {
    http: HttpClient,
    token: Option<String>,
    username: Option<String>,
}

impl EchoClient {
    /// Создаёт клиент для сервера с базовым URL, например `http://127.0.0.1:8080`.
    pub fn new(base_url: impl Into<String>) -> EchoClientResult<Self> {
        Ok(Self {
            http: HttpClient::new(base_url)?,
            token: None,
            username: None,
        })
    }

    /// Восстанавливает сохранённую сессию.
    pub fn set_session(&mut self, token: Option<String>, username: impl Into<String>) {
        self.token = token;
        self.username = Some(username.into());
    }

    /// Действует от имени пользователя без токена.
    pub fn act_as(&mut self, username: impl Into<String>) {
        self.token = None;
        self.username = Some(username.into());
    }

    /// Забывает токен и имя пользователя.
    pub fn clear_session(&mut self) {
        self.token = None;
        self.username = None;
    }

    /// Текущий JWT-токен, если он есть.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Имя пользователя текущей сессии.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    fn actor(&self) -> EchoClientResult<Actor<'_>> {
        if self.token.is_none() && self.username.is_none() {
            return Err(EchoClientError::MissingActor);
        }
        Ok(Actor {
            token: self.token.as_deref(),
            username: self.username.as_deref(),
        })
    }

    /// Проверяет, что сервер отвечает.
    pub async fn health(&self) -> EchoClientResult<()> {
        self.http.health().await
    }

    /// Регистрирует пользователя. Сессия не меняется.
    pub async fn register(&self, username: &str, password: &str) -> EchoClientResult<User> {
        self.http.register(username, password).await
    }

    /// Выполняет вход и запоминает токен.
    pub async fn login(&mut self, username: &str, password: &str) -> EchoClientResult<AuthResponse> {
        let auth = self.http.login(username, password).await?;
        self.token = Some(auth.access_token.clone());
        self.username = Some(auth.user.username.clone());
        Ok(auth)
    }

    /// Выходит из сети и очищает сессию.
    pub async fn logout(&mut self) -> EchoClientResult<()> {
        self.http.logout(self.actor()?).await?;
        self.clear_session();
        Ok(())
    }

    /// Страница ленты в заданном порядке.
    pub async fn list_posts(
        &self,
        sort: FeedSort,
        limit: u32,
        offset: u32,
    ) -> EchoClientResult<ListPostsResponse> {
        self.http.list_posts(sort, limit, offset).await
    }

    /// Поиск по заголовку, тексту, автору и тегам без учёта регистра.
    pub async fn search_posts(
        &self,
        query: &str,
        limit: u32,
        offset: u32,
    ) -> EchoClientResult<ListPostsResponse> {
        self.http.search_posts(query, limit, offset).await
    }

    /// Пост по идентификатору.
    pub async fn get_post(&self, id: Uuid) -> EchoClientResult<Post> {
        self.http.get_post(id).await
    }

    /// Публикует пост от имени текущего пользователя.
    ///
    /// Теги можно передавать с `#` или без; сервер приводит их к `#tag`.
    pub async fn create_post(
        &self,
        title: &str,
        description: &str,
        tags: &[String],
    ) -> EchoClientResult<Post> {
        self.http
            .create_post(self.actor()?, title, description, tags)
            .await
    }

    /// Удаляет пост. Доступно автору и администраторам.
    pub async fn delete_post(&self, id: Uuid) -> EchoClientResult<()> {
        self.http.delete_post(self.actor()?, id).await
    }

    /// Ставит или снимает лайк.
    pub async fn like(&self, id: Uuid) -> EchoClientResult<Post> {
        self.http.react(self.actor()?, id, "like").await
    }

    /// Ставит или снимает дизлайк.
    pub async fn dislike(&self, id: Uuid) -> EchoClientResult<Post> {
        self.http.react(self.actor()?, id, "dislike").await
    }

    /// Добавляет комментарий к посту.
    pub async fn add_comment(&self, id: Uuid, text: &str) -> EchoClientResult<Comment> {
        self.http.add_comment(self.actor()?, id, text).await
    }

    /// Добавляет пост в закладки или убирает его оттуда.
    pub async fn toggle_bookmark(&self, id: Uuid) -> EchoClientResult<BookmarkResponse> {
        self.http.toggle_bookmark(self.actor()?, id).await
    }

    /// Закладки пользователя, самые старые первыми.
    pub async fn bookmarks(&self, username: &str) -> EchoClientResult<Vec<Post>> {
        self.http.bookmarks(username).await
    }

    /// Самые частые теги ленты.
    pub async fn trending_tags(&self, limit: usize) -> EchoClientResult<Vec<TagCount>> {
        self.http.trending_tags(limit).await
    }

    /// Все зарегистрированные пользователи.
    pub async fn list_users(&self) -> EchoClientResult<Vec<User>> {
        self.http.list_users().await
    }

    /// Имена пользователей онлайн.
    pub async fn online_users(&self) -> EchoClientResult<Vec<String>> {
        self.http.online_users().await
    }

    /// Профиль пользователя.
    pub async fn get_user(&self, username: &str) -> EchoClientResult<User> {
        self.http.get_user(username).await
    }

    /// Меняет описание и/или аватар своего профиля.
    pub async fn update_profile(
        &self,
        bio: Option<&str>,
        avatar: Option<&str>,
    ) -> EchoClientResult<User> {
        let actor = self.actor()?;
        let target = self.username.as_deref().ok_or(EchoClientError::MissingActor)?;
        self.http.update_profile(actor, target, bio, avatar).await
    }

    /// Блокирует пользователя и удаляет его посты. Только для администраторов.
    pub async fn ban(&self, username: &str) -> EchoClientResult<ModerationResponse> {
        self.http.moderate(self.actor()?, username, "ban").await
    }

    /// Снимает блокировку. Только для администраторов.
    pub async fn unban(&self, username: &str) -> EchoClientResult<ModerationResponse> {
        self.http.moderate(self.actor()?, username, "unban").await
    }

    /// Выдаёт права администратора. Только для администраторов.
    pub async fn promote(&self, username: &str) -> EchoClientResult<ModerationResponse> {
        self.http.moderate(self.actor()?, username, "promote").await
    }

    /// Счётчики ленты.
    pub async fn stats(&self) -> EchoClientResult<Stats> {
        self.http.stats().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> EchoClient {
        EchoClient::new("http://127.0.0.1:8080").expect("client builds")
    }

    #[test]
    fn actor_requires_session() {
        let client = client();
        assert!(matches!(client.actor(), Err(EchoClientError::MissingActor)));
    }

    #[test]
    fn act_as_drops_token() {
        let mut client = client();
        client.set_session(Some("abc".to_string()), "alice");
        assert_eq!(client.token(), Some("abc"));

        client.act_as("bob");
        assert_eq!(client.token(), None);
        assert_eq!(client.username(), Some("bob"));

        let actor = client.actor().expect("actor is set");
        assert_eq!(actor.username, Some("bob"));
        assert!(actor.token.is_none());
    }

    #[test]
    fn clear_session_forgets_everything() {
        let mut client = client();
        client.set_session(Some("abc".to_string()), "alice");
        client.clear_session();
        assert!(client.token().is_none());
        assert!(client.username().is_none());
    }

    #[tokio::test]
    async fn bookmark_without_session_fails_locally() {
        let client = client();
        let err = client
            .toggle_bookmark(Uuid::new_v4())
            .await
            .expect_err("no session");
        assert!(matches!(err, EchoClientError::MissingActor));
    }

    #[tokio::test]
    async fn update_profile_without_session_fails_locally() {
        let client = client();
        let err = client
            .update_profile(Some("bio"), None)
            .await
            .expect_err("no session");
        assert!(matches!(err, EchoClientError::MissingActor));
    }
}
