use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::domain::user::same_username;

/// Who logged in recently. Lives only in memory; a restart forgets everyone.
pub(crate) struct PresenceRegistry {
    ttl: chrono::Duration,
    seen: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl PresenceRegistry {
    pub(crate) fn new(ttl: Duration) -> Self {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::days(365));
        Self {
            ttl,
            seen: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn mark_online(&self, username: &str) {
        self.mark_online_at(username, Utc::now());
    }

    fn mark_online_at(&self, username: &str, at: DateTime<Utc>) {
        self.lock().insert(username.to_string(), at);
    }

    pub(crate) fn mark_offline(&self, username: &str) {
        self.lock().retain(|name, _| !same_username(name, username));
    }

    /// Online usernames, sorted. Expired entries are dropped first.
    pub(crate) fn online_users(&self) -> Vec<String> {
        self.prune_at(Utc::now());
        let mut names: Vec<String> = self.lock().keys().cloned().collect();
        names.sort();
        names
    }

    pub(crate) fn online_count(&self) -> usize {
        self.prune_at(Utc::now());
        self.lock().len()
    }

    pub(crate) fn prune(&self) -> usize {
        self.prune_at(Utc::now())
    }

    fn prune_at(&self, now: DateTime<Utc>) -> usize {
        let cutoff = now.checked_sub_signed(self.ttl).unwrap_or(DateTime::<Utc>::MIN_UTC);
        let mut seen = self.lock();
        let before = seen.len();
        seen.retain(|_, at| *at > cutoff);
        before - seen.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, DateTime<Utc>>> {
        self.seen.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Periodically drops expired entries until the runtime shuts down.
pub(crate) fn spawn_sweeper(registry: Arc<PresenceRegistry>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // первый tick срабатывает сразу
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = registry.prune();
            if removed > 0 {
                debug!(removed, "presence entries expired");
            }
        }
    })
}
