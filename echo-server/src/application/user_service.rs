use std::sync::Arc;

use tracing::info;

use super::require_active_user;
use crate::data::user_repository::UserRepository;
use crate::domain::error::DomainError;
use crate::domain::user::{ProfileUpdate, User};
use crate::infrastructure::presence::PresenceRegistry;

pub(crate) struct UserService<U: UserRepository> {
    users: U,
    presence: Arc<PresenceRegistry>,
}

impl<U: UserRepository> UserService<U> {
    pub(crate) fn new(users: U, presence: Arc<PresenceRegistry>) -> Self {
        Self { users, presence }
    }

    pub(crate) async fn list_users(&self) -> Result<Vec<User>, DomainError> {
        self.users.list_users().await
    }

    pub(crate) async fn get_user(&self, username: &str) -> Result<User, DomainError> {
        self.users
            .get_user(username)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("user {username}")))
    }

    /// Users may only edit their own bio and avatar.
    pub(crate) async fn update_profile(
        &self,
        actor: &str,
        target: &str,
        update: ProfileUpdate,
    ) -> Result<User, DomainError> {
        let actor = require_active_user(&self.users, actor).await?;
        if !actor.is(target) {
            return Err(DomainError::PermissionDenied(
                "users can only edit their own profile",
            ));
        }
        let update = update.validate()?;

        let user = self
            .users
            .update_user(
                &actor.username,
                Box::new(move |user: &mut User| {
                    if let Some(bio) = update.bio {
                        user.bio = bio;
                    }
                    if let Some(avatar) = update.avatar {
                        user.avatar = avatar;
                    }
                    Ok(())
                }),
            )
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("user {target}")))?;

        info!(username = %user.username, "profile updated");
        Ok(user)
    }

    pub(crate) fn online_users(&self) -> Vec<String> {
        self.presence.online_users()
    }
}
