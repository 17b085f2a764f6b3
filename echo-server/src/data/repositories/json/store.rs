use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use super::persistence::Persistence;
#[cfg(test)]
use super::persistence::MemoryPersistence;
use crate::domain::error::DomainError;
use crate::domain::post::Post;
use crate::domain::user::User;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct StoredUser {
    #[serde(flatten)]
    pub(crate) user: User,
    pub(crate) password_hash: String,
    /// Saved post ids, oldest first.
    #[serde(default)]
    pub(crate) bookmarks: Vec<Uuid>,
}

impl StoredUser {
    pub(crate) fn new(user: User, password_hash: String) -> Self {
        Self {
            user,
            password_hash,
            bookmarks: Vec::new(),
        }
    }
}

/// Whole document persisted by the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct Snapshot {
    #[serde(default)]
    pub(crate) users: Vec<StoredUser>,
    #[serde(default)]
    pub(crate) posts: Vec<Post>,
}

impl Snapshot {
    fn with_defaults(mut self) -> Self {
        self.users = self
            .users
            .into_iter()
            .map(|stored| StoredUser {
                user: stored.user.with_defaults(),
                ..stored
            })
            .collect();
        self
    }

    /// Resolves the acting user inside a write, so a ban committed earlier is always seen.
    pub(crate) fn active_user(&self, username: &str) -> Result<User, DomainError> {
        let user = self
            .users
            .iter()
            .find(|stored| stored.user.is(username))
            .map(|stored| stored.user.clone())
            .ok_or(DomainError::PermissionDenied("unknown user"))?;

        if user.banned {
            return Err(DomainError::PermissionDenied("user is banned"));
        }
        Ok(user)
    }

    /// Drops matching posts and every bookmark that pointed at them.
    pub(crate) fn remove_posts<F>(&mut self, doomed: F) -> usize
    where
        F: Fn(&Post) -> bool,
    {
        let removed: Vec<Uuid> = self
            .posts
            .iter()
            .filter(|post| doomed(post))
            .map(|post| post.id)
            .collect();
        if removed.is_empty() {
            return 0;
        }

        self.posts.retain(|post| !removed.contains(&post.id));
        for stored in &mut self.users {
            stored.bookmarks.retain(|id| !removed.contains(id));
        }
        removed.len()
    }
}

/// Single in-process owner of users and posts.
///
/// Writes are serialized by the mutex and applied to a draft; the draft replaces the
/// current state only after the persistence layer accepted it.
pub(crate) struct FeedStore {
    state: Mutex<Snapshot>,
    persistence: Arc<dyn Persistence>,
}

impl FeedStore {
    pub(crate) async fn open(persistence: Arc<dyn Persistence>) -> Result<Self, DomainError> {
        let snapshot = persistence.load().await?.unwrap_or_default().with_defaults();
        info!(
            users = snapshot.users.len(),
            posts = snapshot.posts.len(),
            "feed store loaded"
        );

        Ok(Self {
            state: Mutex::new(snapshot),
            persistence,
        })
    }

    pub(crate) async fn read<T, F>(&self, view: F) -> T
    where
        F: FnOnce(&Snapshot) -> T,
    {
        let state = self.state.lock().await;
        view(&state)
    }

    /// Runs `change` on a draft of the current state.
    ///
    /// `Ok(None)` means nothing changed and the save is skipped. On any error the
    /// current state stays as it was.
    pub(crate) async fn write<T, F>(&self, change: F) -> Result<Option<T>, DomainError>
    where
        F: FnOnce(&mut Snapshot) -> Result<Option<T>, DomainError> + Send,
        T: Send,
    {
        let mut state = self.state.lock().await;
        let mut draft = state.clone();

        let Some(out) = change(&mut draft)? else {
            return Ok(None);
        };

        self.persistence.save(&draft).await?;
        *state = draft;
        Ok(Some(out))
    }
}

#[cfg(test)]
impl FeedStore {
    pub(crate) fn in_memory() -> Self {
        Self::with_persistence(Arc::new(MemoryPersistence::new()))
    }

    pub(crate) fn with_persistence(persistence: Arc<dyn Persistence>) -> Self {
        Self {
            state: Mutex::new(Snapshot::default()),
            persistence,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;

    use super::{FeedStore, Snapshot, StoredUser};
    use crate::data::repositories::json::persistence::{MemoryPersistence, Persistence};
    use crate::domain::error::DomainError;
    use crate::domain::interaction;
    use crate::domain::user::User;

    fn stored(username: &str) -> StoredUser {
        StoredUser::new(
            User::new(username, false, Utc::now()).expect("valid user"),
            "hash".to_string(),
        )
    }

    #[tokio::test]
    async fn write_persists_before_publishing() {
        let persistence = Arc::new(MemoryPersistence::new());
        let store = FeedStore::with_persistence(persistence.clone());

        store
            .write(|snapshot| {
                snapshot.users.push(stored("alice"));
                Ok(Some(()))
            })
            .await
            .expect("write must succeed");

        let saved = persistence.last_saved().expect("snapshot must be saved");
        assert_eq!(saved.users.len(), 1);
        assert_eq!(store.read(|snapshot| snapshot.users.len()).await, 1);
    }

    #[tokio::test]
    async fn failed_change_leaves_state_untouched() {
        let store = FeedStore::in_memory();

        let err = store
            .write(|snapshot| {
                snapshot.users.push(stored("alice"));
                Err::<Option<()>, _>(DomainError::Unexpected("boom".to_string()))
            })
            .await
            .expect_err("write must fail");

        assert!(matches!(err, DomainError::Unexpected(_)));
        assert_eq!(store.read(|snapshot| snapshot.users.len()).await, 0);
    }

    #[tokio::test]
    async fn failed_save_leaves_state_untouched() {
        let persistence = Arc::new(MemoryPersistence::new());
        persistence.set_fail_saves(true);
        let store = FeedStore::with_persistence(persistence.clone());

        let result = store
            .write(|snapshot| {
                let post = interaction::create_post(
                    "alice",
                    "Hello",
                    "This is long enough",
                    &[],
                    Utc::now(),
                )?;
                snapshot.posts.push(post);
                Ok(Some(()))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(store.read(|snapshot| snapshot.posts.len()).await, 0);
        assert!(persistence.last_saved().is_none());
    }

    #[test]
    fn active_user_rejects_unknown_and_banned() {
        let mut snapshot = Snapshot::default();
        snapshot.users.push(stored("alice"));
        let mut banned = stored("bob");
        banned.user.banned = true;
        snapshot.users.push(banned);

        assert_eq!(snapshot.active_user("ALICE").expect("active").username, "alice");
        assert!(matches!(
            snapshot.active_user("bob"),
            Err(DomainError::PermissionDenied("user is banned"))
        ));
        assert!(matches!(
            snapshot.active_user("ghost"),
            Err(DomainError::PermissionDenied("unknown user"))
        ));
    }

    #[test]
    fn remove_posts_clears_bookmarks() {
        let mut snapshot = Snapshot::default();
        let kept =
            interaction::create_post("alice", "Kept", "This is long enough", &[], Utc::now())
                .expect("valid post");
        let gone =
            interaction::create_post("bob", "Gone", "This is long enough", &[], Utc::now())
                .expect("valid post");
        let mut reader = stored("carol");
        reader.bookmarks = vec![kept.id, gone.id];
        snapshot.users.push(reader);
        snapshot.posts = vec![kept.clone(), gone];

        let removed = snapshot.remove_posts(|post| post.username == "bob");

        assert_eq!(removed, 1);
        assert_eq!(snapshot.posts.len(), 1);
        assert_eq!(snapshot.users[0].bookmarks, [kept.id]);
    }

    #[tokio::test]
    async fn open_restores_saved_snapshot() {
        let persistence = Arc::new(MemoryPersistence::new());
        {
            let store = FeedStore::with_persistence(persistence.clone());
            store
                .write(|snapshot| {
                    snapshot.users.push(stored("alice"));
                    Ok(Some(()))
                })
                .await
                .expect("write must succeed");
        }

        let reopened = FeedStore::open(persistence as Arc<dyn Persistence>)
            .await
            .expect("open must succeed");
        let names = reopened
            .read(|snapshot| {
                snapshot
                    .users
                    .iter()
                    .map(|stored| stored.user.username.clone())
                    .collect::<Vec<_>>()
            })
            .await;
        assert_eq!(names, ["alice"]);
    }
}
