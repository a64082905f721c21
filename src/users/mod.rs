mod memory;
mod repo;
mod repo_types;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

pub use memory::MemoryUserStore;
pub use repo::PgUserStore;
pub use repo_types::{ListKind, User};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("username already taken")]
    DuplicateUsername,

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Persistence for user records. Each call is atomic for the one user it touches.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Fails with [`StoreError::DuplicateUsername`] if the username is taken.
    async fn create(&self, username: &str, password_hash: &str) -> Result<User, StoreError>;

    async fn save(&self, user: &User) -> Result<(), StoreError>;

    /// Replaces only the password hash, leaving both lists untouched.
    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> Result<(), StoreError>;

    /// Adds `movie_id` to the list if absent and returns the resulting list,
    /// or `None` when no user has this id. Concurrent calls never lose an id.
    async fn add_to_set(
        &self,
        id: Uuid,
        kind: ListKind,
        movie_id: i64,
    ) -> Result<Option<Vec<i64>>, StoreError>;
}
