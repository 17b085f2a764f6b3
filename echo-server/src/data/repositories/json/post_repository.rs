use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use super::store::FeedStore;
use crate::data::post_repository::{DeleteGuard, NewPost, PostMutation, PostRepository};
use crate::domain::error::DomainError;
use crate::domain::post::Post;

#[derive(Clone)]
pub(crate) struct JsonPostRepository {
    store: Arc<FeedStore>,
}

impl JsonPostRepository {
    pub(crate) fn new(store: Arc<FeedStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl PostRepository for JsonPostRepository {
    async fn insert_post(&self, actor: &str, build: NewPost) -> Result<Post, DomainError> {
        let actor = actor.to_string();
        self.store
            .write(move |snapshot| {
                let user = snapshot.active_user(&actor)?;
                let post = build(&user)?;
                if snapshot.posts.iter().any(|existing| existing.id == post.id) {
                    return Err(DomainError::Unexpected(format!(
                        "duplicate post id: {}",
                        post.id
                    )));
                }
                snapshot.posts.push(post.clone());
                Ok(Some(post))
            })
            .await?
            .ok_or_else(|| DomainError::Unexpected("post was not stored".to_string()))
    }

    async fn get_post(&self, id: Uuid) -> Result<Option<Post>, DomainError> {
        Ok(self
            .store
            .read(|snapshot| snapshot.posts.iter().find(|post| post.id == id).cloned())
            .await)
    }

    async fn list_posts(&self) -> Result<Vec<Post>, DomainError> {
        Ok(self.store.read(|snapshot| snapshot.posts.clone()).await)
    }

    async fn update_post<T: Send + 'static>(
        &self,
        actor: &str,
        id: Uuid,
        mutation: PostMutation<T>,
    ) -> Result<Option<(Post, T)>, DomainError> {
        let actor = actor.to_string();
        self.store
            .write(move |snapshot| {
                let user = snapshot.active_user(&actor)?;
                let Some(post) = snapshot.posts.iter_mut().find(|post| post.id == id) else {
                    return Ok(None);
                };
                let output = mutation(&user, post)?;
                Ok(Some((post.clone(), output)))
            })
            .await
    }

    async fn delete_post(
        &self,
        actor: &str,
        id: Uuid,
        guard: DeleteGuard,
    ) -> Result<bool, DomainError> {
        let actor = actor.to_string();
        let deleted = self
            .store
            .write(move |snapshot| {
                let user = snapshot.active_user(&actor)?;
                let Some(post) = snapshot.posts.iter().find(|post| post.id == id) else {
                    return Ok(None);
                };
                guard(&user, post)?;
                Ok((snapshot.remove_posts(|post| post.id == id) > 0).then_some(()))
            })
            .await?;
        Ok(deleted.is_some())
    }

    async fn toggle_bookmark(&self, actor: &str, id: Uuid) -> Result<Option<bool>, DomainError> {
        let actor = actor.to_string();
        self.store
            .write(move |snapshot| {
                let user = snapshot.active_user(&actor)?;
                if !snapshot.posts.iter().any(|post| post.id == id) {
                    return Ok(None);
                }
                let stored = snapshot
                    .users
                    .iter_mut()
                    .find(|stored| stored.user.is(&user.username))
                    .ok_or_else(|| {
                        DomainError::Unexpected(format!("user {} vanished", user.username))
                    })?;

                match stored.bookmarks.iter().position(|saved| *saved == id) {
                    Some(index) => {
                        stored.bookmarks.remove(index);
                        Ok(Some(false))
                    }
                    None => {
                        stored.bookmarks.push(id);
                        Ok(Some(true))
                    }
                }
            })
            .await
    }

    async fn bookmarks_of(&self, username: &str) -> Result<Option<Vec<Post>>, DomainError> {
        Ok(self
            .store
            .read(|snapshot| {
                let stored = snapshot
                    .users
                    .iter()
                    .find(|stored| stored.user.is(username))?;
                Some(
                    stored
                        .bookmarks
                        .iter()
                        .filter_map(|id| snapshot.posts.iter().find(|post| post.id == *id))
                        .cloned()
                        .collect(),
                )
            })
            .await)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use uuid::Uuid;

    use super::JsonPostRepository;
    use crate::data::post_repository::PostRepository;
    use crate::data::repositories::json::store::{FeedStore, StoredUser};
    use crate::domain::error::DomainError;
    use crate::domain::interaction;
    use crate::domain::post::Post;
    use crate::domain::user::User;

    async fn repo() -> JsonPostRepository {
        let store = Arc::new(FeedStore::in_memory());
        store
            .write(|snapshot| {
                for (name, banned) in [("alice", false), ("bob", false), ("mallory", true)] {
                    let mut user = User::new(name, false, Utc::now())?;
                    user.banned = banned;
                    snapshot.users.push(StoredUser::new(user, "hash".to_string()));
                }
                Ok(Some(()))
            })
            .await
            .expect("seed users");
        JsonPostRepository::new(store)
    }

    async fn insert(repo: &JsonPostRepository, title: &str) -> Post {
        let title = title.to_string();
        repo.insert_post(
            "alice",
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
        .expect("insert")
    }

    fn allow_all() -> crate::data::post_repository::DeleteGuard {
        Box::new(|_: &User, _: &Post| Ok(()))
    }

    #[tokio::test]
    async fn list_keeps_insertion_order() {
        let repo = repo().await;
        for title in ["first", "second", "third"] {
            insert(&repo, title).await;
        }

        let titles: Vec<_> = repo
            .list_posts()
            .await
            .expect("list")
            .into_iter()
            .map(|post| post.title)
            .collect();
        assert_eq!(titles, ["first", "second", "third"]);
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_id() {
        let repo = repo().await;
        let post = insert(&repo, "first").await;

        let err = repo
            .insert_post("alice", Box::new(move |_: &User| Ok(post)))
            .await
            .expect_err("duplicate id");
        assert!(matches!(err, DomainError::Unexpected(_)));
        assert_eq!(repo.list_posts().await.expect("list").len(), 1);
    }

    #[tokio::test]
    async fn writes_by_banned_or_unknown_actor_store_nothing() {
        let repo = repo().await;
        let post = insert(&repo, "first").await;

        for actor in ["mallory", "ghost"] {
            let err = repo
                .insert_post(
                    actor,
                    Box::new(|user: &User| {
                        interaction::create_post(
                            &user.username,
                            "Spam",
                            "This is long enough",
                            &[],
                            Utc::now(),
                        )
                    }),
                )
                .await
                .expect_err("actor must be rejected");
            assert!(matches!(err, DomainError::PermissionDenied(_)));

            let err = repo
                .update_post(
                    actor,
                    post.id,
                    Box::new(|user: &User, post: &mut Post| {
                        interaction::toggle_like(post, &user.username);
                        Ok(())
                    }),
                )
                .await
                .expect_err("actor must be rejected");
            assert!(matches!(err, DomainError::PermissionDenied(_)));

            let err = repo
                .delete_post(actor, post.id, allow_all())
                .await
                .expect_err("actor must be rejected");
            assert!(matches!(err, DomainError::PermissionDenied(_)));
        }

        let stored = repo.list_posts().await.expect("list");
        assert_eq!(stored.len(), 1);
        assert!(stored[0].likes.is_empty());
    }

    #[tokio::test]
    async fn update_applies_mutation_atomically() {
        let repo = repo().await;
        let post = insert(&repo, "first").await;

        let (updated, liked) = repo
            .update_post(
                "bob",
                post.id,
                Box::new(|user: &User, post: &mut Post| {
                    interaction::toggle_like(post, &user.username);
                    Ok(post.likes.len())
                }),
            )
            .await
            .expect("update")
            .expect("post exists");
        assert!(updated.likes.contains("bob"));
        assert_eq!(liked, 1);

        let err = repo
            .update_post(
                "alice",
                post.id,
                Box::new(|user: &User, post: &mut Post| {
                    interaction::toggle_like(post, &user.username);
                    Err::<(), _>(DomainError::Unexpected("rejected".to_string()))
                }),
            )
            .await
            .expect_err("mutation error must propagate");
        assert!(matches!(err, DomainError::Unexpected(_)));

        let stored = repo.get_post(post.id).await.expect("get").expect("exists");
        assert!(!stored.likes.contains("alice"));
    }

    #[tokio::test]
    async fn update_and_delete_report_missing_posts() {
        let repo = repo().await;
        let missing = Uuid::new_v4();

        let updated = repo
            .update_post("alice", missing, Box::new(|_: &User, _: &mut Post| Ok(())))
            .await
            .expect("update");
        assert!(updated.is_none());
        assert!(
            !repo
                .delete_post("alice", missing, allow_all())
                .await
                .expect("delete")
        );
        assert!(
            repo.toggle_bookmark("alice", missing)
                .await
                .expect("bookmark")
                .is_none()
        );
    }

    #[tokio::test]
    async fn delete_guard_runs_before_removal() {
        let repo = repo().await;
        let post = insert(&repo, "first").await;

        let err = repo
            .delete_post(
                "bob",
                post.id,
                Box::new(|_: &User, _: &Post| Err(DomainError::PermissionDenied("not yours"))),
            )
            .await
            .expect_err("guard rejects");
        assert!(matches!(err, DomainError::PermissionDenied("not yours")));
        assert!(repo.get_post(post.id).await.expect("get").is_some());

        assert!(
            repo.delete_post("alice", post.id, allow_all())
                .await
                .expect("delete")
        );
        assert!(repo.get_post(post.id).await.expect("get").is_none());
    }

    #[tokio::test]
    async fn bookmarks_toggle_and_follow_deletes() {
        let repo = repo().await;
        let first = insert(&repo, "first").await;
        let second = insert(&repo, "second").await;

        for id in [second.id, first.id] {
            assert_eq!(repo.toggle_bookmark("BOB", id).await.expect("toggle"), Some(true));
        }
        let titles: Vec<_> = repo
            .bookmarks_of("bob")
            .await
            .expect("bookmarks")
            .expect("bob exists")
            .into_iter()
            .map(|post| post.title)
            .collect();
        assert_eq!(titles, ["second", "first"]);

        assert_eq!(
            repo.toggle_bookmark("bob", second.id).await.expect("toggle"),
            Some(false)
        );
        repo.delete_post("alice", first.id, allow_all())
            .await
            .expect("delete");
        assert!(
            repo.bookmarks_of("bob")
                .await
                .expect("bookmarks")
                .expect("bob exists")
                .is_empty()
        );
        assert!(repo.bookmarks_of("ghost").await.expect("bookmarks").is_none());
    }
}
