use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ListKind, StoreError, User, UserStore};

/// Process-local user store. Every mutation holds the write lock for its whole
/// read-modify-write, so it never loses concurrent updates.
#[derive(Default)]
pub struct MemoryUserStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    by_id: HashMap<Uuid, User>,
    by_username: HashMap<String, Uuid>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .by_username
            .get(username)
            .and_then(|id| inner.by_id.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.inner.read().await.by_id.get(&id).cloned())
    }

    async fn create(&self, username: &str, password_hash: &str) -> Result<User, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.by_username.contains_key(username) {
            return Err(StoreError::DuplicateUsername);
        }
        let user = User::new(username, password_hash);
        inner.by_username.insert(user.username.clone(), user.id);
        inner.by_id.insert(user.id, user.clone());
        Ok(user)
    }

    async fn save(&self, user: &User) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let Some(previous) = inner.by_id.get(&user.id).map(|u| u.username.clone()) else {
            // Same as an UPDATE matching no row.
            return Ok(());
        };
        if previous != user.username {
            if inner.by_username.contains_key(&user.username) {
                return Err(StoreError::DuplicateUsername);
            }
            inner.by_username.remove(&previous);
            inner.by_username.insert(user.username.clone(), user.id);
        }
        inner.by_id.insert(user.id, user.clone());
        Ok(())
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> Result<(), StoreError> {
        if let Some(user) = self.inner.write().await.by_id.get_mut(&id) {
            user.password_hash = password_hash.to_owned();
        }
        Ok(())
    }

    async fn add_to_set(
        &self,
        id: Uuid,
        kind: ListKind,
        movie_id: i64,
    ) -> Result<Option<Vec<i64>>, StoreError> {
        let mut inner = self.inner.write().await;
        Ok(inner.by_id.get_mut(&id).map(|user| {
            user.add_to(kind, movie_id);
            user.list(kind).to_vec()
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn create_rejects_duplicate_username() {
        let store = MemoryUserStore::new();
        store.create("alice", "h1").await.expect("first create");
        let err = store.create("alice", "h2").await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateUsername));
    }

    #[tokio::test]
    async fn lookups_by_username_and_id_agree() {
        let store = MemoryUserStore::new();
        let created = store.create("alice", "h1").await.unwrap();
        let by_name = store.find_by_username("alice").await.unwrap().unwrap();
        let by_id = store.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_name, created);
        assert_eq!(by_id, created);
        assert!(store.find_by_username("bob").await.unwrap().is_none());
        assert!(store.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_replaces_record() {
        let store = MemoryUserStore::new();
        let mut user = store.create("alice", "old-hash").await.unwrap();
        user.password_hash = "new-hash".into();
        store.save(&user).await.unwrap();
        let stored = store.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(stored.password_hash, "new-hash");
    }

    #[tokio::test]
    async fn set_password_hash_keeps_lists() {
        let store = MemoryUserStore::new();
        let user = store.create("alice", "old-hash").await.unwrap();
        store.add_to_set(user.id, ListKind::Favorites, 550).await.unwrap();
        store.set_password_hash(user.id, "new-hash").await.unwrap();
        let stored = store.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.password_hash, "new-hash");
        assert_eq!(stored.favorites, vec![550]);
    }

    #[tokio::test]
    async fn save_keeps_usernames_unique() {
        let store = MemoryUserStore::new();
        store.create("alice", "h").await.unwrap();
        let mut bob = store.create("bob", "h").await.unwrap();
        bob.username = "alice".into();
        let err = store.save(&bob).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateUsername));
    }

    #[tokio::test]
    async fn add_to_set_unknown_user_is_none() {
        let store = MemoryUserStore::new();
        let res = store
            .add_to_set(Uuid::new_v4(), ListKind::Favorites, 550)
            .await
            .unwrap();
        assert!(res.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_add_to_set_loses_nothing() {
        let store = Arc::new(MemoryUserStore::new());
        let user_id = store.create("alice", "h").await.unwrap().id;

        let mut handles = Vec::new();
        // Every id twice, so the already-present branch runs under contention.
        for movie_id in (0..50i64).chain(0..50i64) {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .add_to_set(user_id, ListKind::Watchlist, movie_id)
                    .await
                    .unwrap()
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        let stored = store.find_by_id(user_id).await.unwrap().unwrap();
        let mut ids = stored.watchlist.clone();
        ids.sort_unstable();
        assert_eq!(ids, (0..50).collect::<Vec<_>>());
        assert!(stored.favorites.is_empty());
    }
}
