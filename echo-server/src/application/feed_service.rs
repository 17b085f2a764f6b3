use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::data::post_repository::{Pagination, PostRepository};
use crate::data::user_repository::UserRepository;
use crate::domain::error::DomainError;
use crate::domain::interaction;
use crate::domain::post::{Comment, CreatePostRequest, FeedSort, Post, TagCount};
use crate::domain::user::User;
use crate::infrastructure::presence::PresenceRegistry;

#[derive(Debug, Clone)]
pub(crate) struct ListPostsResult {
    pub(crate) posts: Vec<Post>,
    pub(crate) sort: FeedSort,
    pub(crate) total: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FeedStats {
    pub(crate) total_users: usize,
    pub(crate) total_posts: usize,
    pub(crate) online_users: usize,
    pub(crate) total_interactions: usize,
}

pub(crate) struct FeedService<P: PostRepository, U: UserRepository> {
    posts: P,
    users: U,
    presence: Arc<PresenceRegistry>,
}

impl<P: PostRepository, U: UserRepository> FeedService<P, U> {
    pub(crate) fn new(posts: P, users: U, presence: Arc<PresenceRegistry>) -> Self {
        Self {
            posts,
            users,
            presence,
        }
    }

    pub(crate) async fn create_post(
        &self,
        actor: &str,
        req: CreatePostRequest,
    ) -> Result<Post, DomainError> {
        let now = Utc::now();
        let post = self
            .posts
            .insert_post(
                actor,
                Box::new(move |author: &User| {
                    interaction::create_post(
                        &author.username,
                        &req.title,
                        &req.description,
                        &req.tags,
                        now,
                    )
                }),
            )
            .await?;
        info!(post_id = %post.id, author = %post.username, "post created");
        Ok(post)
    }

    pub(crate) async fn get_post(&self, id: Uuid) -> Result<Post, DomainError> {
        self.posts
            .get_post(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    pub(crate) async fn list_posts(
        &self,
        sort: FeedSort,
        pagination: Pagination,
    ) -> Result<ListPostsResult, DomainError> {
        let posts = self.posts.list_posts().await?;
        Ok(paginate(interaction::sort_feed(posts, sort), sort, pagination))
    }

    /// Matching posts, newest first.
    pub(crate) async fn search_posts(
        &self,
        query: &str,
        pagination: Pagination,
    ) -> Result<ListPostsResult, DomainError> {
        if query.trim().is_empty() {
            return Err(DomainError::Validation {
                field: "q",
                message: "must not be empty",
            });
        }

        let posts = self
            .posts
            .list_posts()
            .await?
            .into_iter()
            .filter(|post| interaction::matches_query(post, query))
            .collect();
        Ok(paginate(
            interaction::sort_recent(posts),
            FeedSort::Recent,
            pagination,
        ))
    }

    pub(crate) async fn toggle_like(&self, actor: &str, id: Uuid) -> Result<Post, DomainError> {
        self.react(actor, id, interaction::toggle_like).await
    }

    pub(crate) async fn toggle_dislike(&self, actor: &str, id: Uuid) -> Result<Post, DomainError> {
        self.react(actor, id, interaction::toggle_dislike).await
    }

    async fn react(
        &self,
        actor: &str,
        id: Uuid,
        toggle: fn(&mut Post, &str),
    ) -> Result<Post, DomainError> {
        let (post, ()) = self
            .posts
            .update_post(
                actor,
                id,
                Box::new(move |user: &User, post: &mut Post| {
                    toggle(post, &user.username);
                    Ok(())
                }),
            )
            .await?
            .ok_or_else(|| not_found(id))?;
        Ok(post)
    }

    pub(crate) async fn add_comment(
        &self,
        actor: &str,
        id: Uuid,
        text: &str,
    ) -> Result<Comment, DomainError> {
        let text = text.to_string();
        let now = Utc::now();

        let (_, comment) = self
            .posts
            .update_post(
                actor,
                id,
                Box::new(move |user: &User, post: &mut Post| {
                    interaction::add_comment(post, &user.username, &text, now)
                }),
            )
            .await?
            .ok_or_else(|| not_found(id))?;
        Ok(comment)
    }

    pub(crate) async fn delete_post(&self, actor: &str, id: Uuid) -> Result<(), DomainError> {
        let deleted = self
            .posts
            .delete_post(
                actor,
                id,
                Box::new(move |user: &User, post: &Post| {
                    if interaction::can_delete(post, user) {
                        return Ok(());
                    }
                    warn!(post_id = %id, actor = %user.username, "delete rejected");
                    Err(DomainError::PermissionDenied(
                        "only the author or an admin can delete a post",
                    ))
                }),
            )
            .await?;

        if !deleted {
            return Err(not_found(id));
        }
        info!(post_id = %id, actor = %actor, "post deleted");
        Ok(())
    }

    /// Returns whether the post is bookmarked after the toggle.
    pub(crate) async fn toggle_bookmark(&self, actor: &str, id: Uuid) -> Result<bool, DomainError> {
        self.posts
            .toggle_bookmark(actor, id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    pub(crate) async fn bookmarks(&self, username: &str) -> Result<Vec<Post>, DomainError> {
        self.posts
            .bookmarks_of(username)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("user {username}")))
    }

    /// Most used tags across the feed.
    pub(crate) async fn trending_tags(&self, limit: usize) -> Result<Vec<TagCount>, DomainError> {
        let posts = self.posts.list_posts().await?;
        Ok(interaction::trending_tags(&posts, limit))
    }

    pub(crate) async fn stats(&self) -> Result<FeedStats, DomainError> {
        let posts = self.posts.list_posts().await?;
        let total_users = self.users.list_users().await?.len();

        Ok(FeedStats {
            total_users,
            total_posts: posts.len(),
            online_users: self.presence.online_count(),
            total_interactions: posts.iter().map(interaction::interaction_count).sum(),
        })
    }
}

fn paginate(posts: Vec<Post>, sort: FeedSort, pagination: Pagination) -> ListPostsResult {
    let total = posts.len();
    let posts = posts
        .into_iter()
        .skip(pagination.offset as usize)
        .take(pagination.limit as usize)
        .collect();
    ListPostsResult { posts, sort, total }
}

fn not_found(id: Uuid) -> DomainError {
    DomainError::NotFound(format!("post id: {id}"))
}
