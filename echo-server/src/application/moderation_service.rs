use tracing::{info, warn};

use super::require_active_user;
use crate::data::user_repository::{BanOutcome, UserRepository};
use crate::domain::error::DomainError;
use crate::domain::user::User;

/// Admin-only actions on accounts. There is no demotion.
pub(crate) struct ModerationService<U: UserRepository> {
    users: U,
}

impl<U: UserRepository> ModerationService<U> {
    pub(crate) fn new(users: U) -> Self {
        Self { users }
    }

    /// Bans `target` and hard-deletes every post they wrote.
    pub(crate) async fn ban(&self, actor: &str, target: &str) -> Result<BanOutcome, DomainError> {
        let admin = self.require_admin(actor).await?;
        if admin.is(target) {
            return Err(DomainError::PermissionDenied("admins cannot ban themselves"));
        }

        let outcome = self
            .users
            .ban_user(target)
            .await?
            .ok_or_else(|| user_not_found(target))?;

        warn!(
            target = %outcome.user.username,
            by = %admin.username,
            removed_posts = outcome.removed_posts,
            "user banned"
        );
        Ok(outcome)
    }

    /// Clears the ban flag. Removed posts stay removed.
    pub(crate) async fn unban(&self, actor: &str, target: &str) -> Result<User, DomainError> {
        let admin = self.require_admin(actor).await?;
        let user = self
            .users
            .update_user(
                target,
                Box::new(|user: &mut User| {
                    user.banned = false;
                    Ok(())
                }),
            )
            .await?
            .ok_or_else(|| user_not_found(target))?;

        info!(target = %user.username, by = %admin.username, "user unbanned");
        Ok(user)
    }

    pub(crate) async fn promote(&self, actor: &str, target: &str) -> Result<User, DomainError> {
        let admin = self.require_admin(actor).await?;
        let user = self
            .users
            .update_user(
                target,
                Box::new(|user: &mut User| {
                    user.is_admin = true;
                    Ok(())
                }),
            )
            .await?
            .ok_or_else(|| user_not_found(target))?;

        info!(target = %user.username, by = %admin.username, "user promoted");
        Ok(user)
    }

    async fn require_admin(&self, actor: &str) -> Result<User, DomainError> {
        let user = require_active_user(&self.users, actor).await?;
        if !user.is_admin {
            return Err(DomainError::PermissionDenied("admin rights required"));
        }
        Ok(user)
    }
}

fn user_not_found(username: &str) -> DomainError {
    DomainError::NotFound(format!("user {username}"))
}

#[cfg(test)]
mod tests {
    use super::ModerationService;
    use crate::application::test_support::{self, add_user, publish};
    use crate::data::post_repository::PostRepository;
    use crate::data::user_repository::UserRepository;
    use crate::domain::error::DomainError;

    #[tokio::test]
    async fn ban_cascades_to_posts_and_unban_does_not_restore_them() {
        let (posts, users) = test_support::repos();
        add_user(&users, "root", true).await;
        add_user(&users, "alice", false).await;
        add_user(&users, "bob", false).await;
        for author in ["alice", "alice", "bob"] {
            publish(&posts, author, "Hello").await;
        }
        let service = ModerationService::new(users.clone());

        let outcome = service.ban("root", "Alice").await.expect("ban");
        assert!(outcome.user.banned);
        assert_eq!(outcome.removed_posts, 2);
        let remaining = posts.list_posts().await.expect("list");
        assert!(remaining.iter().all(|post| post.username == "bob"));

        let user = service.unban("root", "alice").await.expect("unban");
        assert!(!user.banned);
        assert_eq!(posts.list_posts().await.expect("list").len(), 1);
    }

    #[tokio::test]
    async fn non_admin_cannot_moderate() {
        let (_, users) = test_support::repos();
        add_user(&users, "alice", false).await;
        add_user(&users, "bob", false).await;
        let service = ModerationService::new(users.clone());

        let ban = service.ban("alice", "bob").await;
        let promote = service.promote("alice", "alice").await;

        assert!(matches!(ban, Err(DomainError::PermissionDenied(_))));
        assert!(matches!(promote, Err(DomainError::PermissionDenied(_))));
        let bob = users.get_user("bob").await.expect("get").expect("exists");
        assert!(!bob.banned);
    }

    #[tokio::test]
    async fn banned_admin_loses_moderation_rights() {
        let (_, users) = test_support::repos();
        add_user(&users, "root", true).await;
        add_user(&users, "other", true).await;
        add_user(&users, "bob", false).await;
        test_support::ban(&users, "other").await;
        let service = ModerationService::new(users);

        let err = service.ban("other", "bob").await.expect_err("denied");
        assert!(matches!(err, DomainError::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn promote_grants_admin_and_unknown_target_is_not_found() {
        let (_, users) = test_support::repos();
        add_user(&users, "root", true).await;
        add_user(&users, "bob", false).await;
        let service = ModerationService::new(users);

        let bob = service.promote("root", "bob").await.expect("promote");
        assert!(bob.is_admin);

        let err = service.ban("bob", "ghost").await.expect_err("missing");
        assert!(matches!(err, DomainError::NotFound(_)));

        let err = service.ban("root", "root").await.expect_err("self ban");
        assert!(matches!(err, DomainError::PermissionDenied(_)));
    }
}
