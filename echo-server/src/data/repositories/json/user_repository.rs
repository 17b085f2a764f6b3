use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use super::store::{FeedStore, StoredUser};
use crate::data::user_repository::{
    BanOutcome, NewUser, UserCredentials, UserMutation, UserRepository,
};
use crate::domain::error::DomainError;
use crate::domain::user::{User, same_username};

#[derive(Clone)]
pub(crate) struct JsonUserRepository {
    store: Arc<FeedStore>,
}

impl JsonUserRepository {
    pub(crate) fn new(store: Arc<FeedStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl UserRepository for JsonUserRepository {
    async fn create_user(&self, input: NewUser) -> Result<User, DomainError> {
        let username = input.username.clone();
        self.store
            .write(move |snapshot| {
                if snapshot
                    .users
                    .iter()
                    .any(|stored| stored.user.is(&input.username))
                {
                    return Err(DomainError::DuplicateUser(input.username));
                }

                let user = User::new(input.username, input.is_admin, Utc::now())?;
                snapshot
                    .users
                    .push(StoredUser::new(user.clone(), input.password_hash));
                Ok(Some(user))
            })
            .await?
            .ok_or_else(|| DomainError::Unexpected(format!("user {username} was not stored")))
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserCredentials>, DomainError> {
        Ok(self
            .store
            .read(|snapshot| {
                snapshot
                    .users
                    .iter()
                    .find(|stored| stored.user.is(username))
                    .map(|stored| UserCredentials {
                        user: stored.user.clone(),
                        password_hash: stored.password_hash.clone(),
                    })
            })
            .await)
    }

    async fn get_user(&self, username: &str) -> Result<Option<User>, DomainError> {
        Ok(self
            .store
            .read(|snapshot| {
                snapshot
                    .users
                    .iter()
                    .find(|stored| stored.user.is(username))
                    .map(|stored| stored.user.clone())
            })
            .await)
    }

    async fn list_users(&self) -> Result<Vec<User>, DomainError> {
        Ok(self
            .store
            .read(|snapshot| {
                snapshot
                    .users
                    .iter()
                    .map(|stored| stored.user.clone())
                    .collect()
            })
            .await)
    }

    async fn update_user(
        &self,
        username: &str,
        mutation: UserMutation,
    ) -> Result<Option<User>, DomainError> {
        let username = username.to_string();
        self.store
            .write(move |snapshot| {
                let Some(stored) = snapshot
                    .users
                    .iter_mut()
                    .find(|stored| stored.user.is(&username))
                else {
                    return Ok(None);
                };
                let canonical = stored.user.username.clone();
                mutation(&mut stored.user)?;
                // username is the key and stays as stored
                stored.user.username = canonical;
                Ok(Some(stored.user.clone()))
            })
            .await
    }

    async fn ban_user(&self, username: &str) -> Result<Option<BanOutcome>, DomainError> {
        let username = username.to_string();
        self.store
            .write(move |snapshot| {
                let Some(stored) = snapshot
                    .users
                    .iter_mut()
                    .find(|stored| stored.user.is(&username))
                else {
                    return Ok(None);
                };
                stored.user.banned = true;
                let user = stored.user.clone();

                let removed_posts =
                    snapshot.remove_posts(|post| same_username(&post.username, &user.username));

                Ok(Some(BanOutcome {
                    user,
                    removed_posts,
                }))
            })
            .await
    }
}
