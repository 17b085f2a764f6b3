use async_trait::async_trait;

use crate::domain::error::DomainError;
use crate::domain::user::User;

pub(crate) type UserMutation = Box<dyn FnOnce(&mut User) -> Result<(), DomainError> + Send>;

#[derive(Debug, Clone)]
pub(crate) struct UserCredentials {
    pub(crate) user: User,
    pub(crate) password_hash: String,
}

#[derive(Debug, Clone)]
pub(crate) struct NewUser {
    pub(crate) username: String,
    pub(crate) password_hash: String,
    pub(crate) is_admin: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct BanOutcome {
    pub(crate) user: User,
    pub(crate) removed_posts: usize,
}

/// Username lookups are case-insensitive.
#[async_trait]
pub(crate) trait UserRepository: Send + Sync {
    async fn create_user(&self, input: NewUser) -> Result<User, DomainError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<UserCredentials>, DomainError>;
    async fn get_user(&self, username: &str) -> Result<Option<User>, DomainError>;
    async fn list_users(&self) -> Result<Vec<User>, DomainError>;
    async fn update_user(
        &self,
        username: &str,
        mutation: UserMutation,
    ) -> Result<Option<User>, DomainError>;
    /// Flags the user as banned and hard-deletes every post they authored, atomically.
    async fn ban_user(&self, username: &str) -> Result<Option<BanOutcome>, DomainError>;
}
