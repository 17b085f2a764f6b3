use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Публичная модель пользователя.
pub struct User {
    /// Логин (уникален без учёта регистра).
    pub username: String,
    /// Есть ли права администратора.
    pub is_admin: bool,
    /// Заблокирован ли пользователь.
    pub banned: bool,
    /// Дата и время регистрации (UTC).
    pub created_at: DateTime<Utc>,
    /// Время последнего входа, если он был.
    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
    /// URL аватара.
    pub avatar: String,
    /// Короткое описание профиля.
    #[serde(default)]
    pub bio: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Комментарий к посту.
pub struct Comment {
    /// Идентификатор комментария.
    pub id: Uuid,
    /// Автор комментария.
    pub username: String,
    /// Текст.
    pub text: String,
    /// Время создания (UTC).
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Публичная модель поста.
pub struct Post {
    /// Идентификатор поста.
    pub id: Uuid,
    /// Автор поста.
    pub username: String,
    /// Заголовок.
    pub title: String,
    /// Текст поста.
    pub description: String,
    /// Время публикации (UTC).
    pub timestamp: DateTime<Utc>,
    /// Кто поставил лайк.
    pub likes: Vec<String>,
    /// Кто поставил дизлайк.
    pub dislikes: Vec<String>,
    /// Комментарии в порядке добавления.
    pub comments: Vec<Comment>,
    /// Хэштеги в нижнем регистре, с `#`.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Рейтинг для сортировки `popular`.
    pub score: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Ответ после успешного входа.
pub struct AuthResponse {
    /// JWT access token.
    pub access_token: String,
    /// Данные пользователя.
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Страница ленты или результатов поиска.
pub struct ListPostsResponse {
    /// Посты текущей страницы.
    pub posts: Vec<Post>,
    /// Применённая сортировка (`recent` или `popular`).
    pub sort: String,
    /// Сколько постов подошло всего.
    pub total: u64,
    /// Размер страницы.
    pub limit: u32,
    /// Смещение от начала выборки.
    pub offset: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Результат действия администратора.
pub struct ModerationResponse {
    /// Пользователь после изменения.
    pub user: User,
    /// Сколько постов удалено вместе с баном.
    pub removed_posts: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Хэштег и число постов с ним.
pub struct TagCount {
    /// Тег с `#`.
    pub tag: String,
    /// Сколько постов его используют.
    pub count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// Состояние закладки после переключения.
pub struct BookmarkResponse {
    /// Пост, для которого переключили закладку.
    pub post_id: Uuid,
    /// Есть ли теперь пост в закладках.
    pub bookmarked: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// Счётчики ленты.
pub struct Stats {
    /// Зарегистрированные пользователи.
    pub total_users: u64,
    /// Посты в ленте.
    pub total_posts: u64,
    /// Пользователи онлайн.
    pub online_users: u64,
    /// Лайки, дизлайки и комментарии по всем постам.
    pub total_interactions: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
/// Порядок ленты.
pub enum FeedSort {
    /// Сначала новые.
    #[default]
    Recent,
    /// По рейтингу, при равенстве сначала новые.
    Popular,
}

impl FeedSort {
    /// Значение параметра `sort` в запросе.
    pub fn as_str(self) -> &'static str {
        match self {
            FeedSort::Recent => "recent",
            FeedSort::Popular => "popular",
        }
    }
}

impl fmt::Display for FeedSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedSort {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "recent" => Ok(FeedSort::Recent),
            "popular" => Ok(FeedSort::Popular),
            other => Err(format!("unknown sort '{other}', expected recent or popular")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FeedSort, Post, TagCount};

    #[test]
    fn feed_sort_parses_case_insensitively() {
        assert_eq!("Popular".parse::<FeedSort>(), Ok(FeedSort::Popular));
        assert_eq!("recent".parse::<FeedSort>(), Ok(FeedSort::Recent));
        assert!("oldest".parse::<FeedSort>().is_err());
    }

    #[test]
    fn post_deserializes_from_server_json() {
        let raw = r#"{
            "id": "6f1c1c2e-8f5b-4c55-9d61-0d5d2b8c9a10",
            "username": "alice",
            "title": "Hello",
            "description": "This is long enough",
            "timestamp": "2024-05-01T12:00:00Z",
            "likes": ["bob"],
            "dislikes": [],
            "comments": [{
                "id": "0b7a2f8e-1c34-4e55-8a7d-2f1e6a9b3c40",
                "username": "bob",
                "text": "nice",
                "timestamp": "2024-05-01T12:05:00Z"
            }],
            "score": 3
        }"#;

        let post: Post = serde_json::from_str(raw).expect("valid post json");
        assert_eq!(post.likes, ["bob"]);
        assert_eq!(post.comments[0].text, "nice");
        assert_eq!(post.score, 3);
        assert!(post.tags.is_empty());
    }

    #[test]
    fn tagged_post_and_trending_deserialize() {
        let raw = r##"{
            "id": "6f1c1c2e-8f5b-4c55-9d61-0d5d2b8c9a10",
            "username": "alice",
            "title": "Hello",
            "description": "This is long enough",
            "timestamp": "2024-05-01T12:00:00Z",
            "likes": [],
            "dislikes": [],
            "comments": [],
            "tags": ["#rust"],
            "score": 0
        }"##;
        let post: Post = serde_json::from_str(raw).expect("valid post json");
        assert_eq!(post.tags, ["#rust"]);

        let trending: Vec<TagCount> =
            serde_json::from_str(r##"[{"tag": "#rust", "count": 2}]"##).expect("valid json");
        assert_eq!(trending[0].count, 2);
    }
}
