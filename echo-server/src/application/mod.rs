pub(crate) mod auth_service;
pub(crate) mod feed_service;
pub(crate) mod moderation_service;
pub(crate) mod user_service;

use crate::data::user_repository::UserRepository;
use crate::domain::error::DomainError;
use crate::domain::user::User;

/// Resolves the acting user. Unknown and banned users may not act.
pub(crate) async fn require_active_user<U: UserRepository>(
    users: &U,
    username: &str,
) -> Result<User, DomainError> {
    let user = users
        .get_user(username)
        .await?
        .ok_or(DomainError::PermissionDenied("unknown user"))?;

    if user.banned {
        return Err(DomainError::PermissionDenied("user is banned"));
    }
    Ok(user)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use chrono::Utc;

    use crate::data::post_repository::PostRepository;
    use crate::data::repositories::json::post_repository::JsonPostRepository;
    use crate::data::repositories::json::store::FeedStore;
    use crate::data::repositories::json::user_repository::JsonUserRepository;
    use crate::data::user_repository::{NewUser, UserRepository};
    use crate::domain::interaction;
    use crate::domain::post::Post;
    use crate::domain::user::User;

    pub(crate) fn repos() -> (JsonPostRepository, JsonUserRepository) {
        let store = Arc::new(FeedStore::in_memory());
        (
            JsonPostRepository::new(store.clone()),
            JsonUserRepository::new(store),
        )
    }

    pub(crate) async fn add_user(users: &JsonUserRepository, username: &str, is_admin: bool) -> User {
        users
            .create_user(NewUser {
                username: username.to_string(),
                password_hash: "unused".to_string(),
                is_admin,
            })
            .await
            .expect("test user must be created")
    }

    pub(crate) async fn ban(users: &JsonUserRepository, username: &str) {
        users
            .ban_user(username)
            .await
            .expect("ban")
            .expect("user exists");
    }

    /// Stores a post written straight through the repository.
    pub(crate) async fn publish(posts: &JsonPostRepository, author: &str, title: &str) -> Post {
        let title = title.to_string();
        posts
            .insert_post(
                author,
                Box::new(move |user: &User| {
                    interaction::create_post(
                        &user.username,
                        &title,
                        "This is long enough",
                        &[],
                        Utc::now(),
                    )
                }),
            )
            .await
            .expect("test post must be stored")
    }
}
