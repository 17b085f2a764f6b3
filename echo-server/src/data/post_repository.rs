use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::domain::post::Post;
use crate::domain::user::User;

/// Builds a new post for the acting user inside the store write.
pub(crate) type NewPost = Box<dyn FnOnce(&User) -> Result<Post, DomainError> + Send>;

/// Applied to a single post inside one atomic store write.
pub(crate) type PostMutation<T> =
    Box<dyn FnOnce(&User, &mut Post) -> Result<T, DomainError> + Send>;

/// Decides whether the acting user may remove the post.
pub(crate) type DeleteGuard = Box<dyn FnOnce(&User, &Post) -> Result<(), DomainError> + Send>;

#[derive(Debug, Clone, Copy)]
pub(crate) struct Pagination {
    pub(crate) limit: u32,
    pub(crate) offset: u32,
}

/// Every write takes the acting username and resolves it in the same store
/// write as the change: an unknown or banned actor fails with
/// `PermissionDenied` and nothing is stored.
#[async_trait]
pub(crate) trait PostRepository: Send + Sync {
    async fn insert_post(&self, actor: &str, build: NewPost) -> Result<Post, DomainError>;
    async fn get_post(&self, id: Uuid) -> Result<Option<Post>, DomainError>;
    /// Posts in insertion order.
    async fn list_posts(&self) -> Result<Vec<Post>, DomainError>;
    /// `None` when the post does not exist.
    async fn update_post<T: Send + 'static>(
        &self,
        actor: &str,
        id: Uuid,
        mutation: PostMutation<T>,
    ) -> Result<Option<(Post, T)>, DomainError>;
    async fn delete_post(
        &self,
        actor: &str,
        id: Uuid,
        guard: DeleteGuard,
    ) -> Result<bool, DomainError>;
    /// Flips the bookmark and returns whether it is now set; `None` for a missing post.
    async fn toggle_bookmark(&self, actor: &str, id: Uuid) -> Result<Option<bool>, DomainError>;
    /// Bookmarked posts, oldest bookmark first; `None` for an unknown user.
    async fn bookmarks_of(&self, username: &str) -> Result<Option<Vec<Post>>, DomainError>;
}
