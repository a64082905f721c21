use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{ListKind, StoreError, User, UserStore};

/// PostgreSQL-backed user store.
#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    /// Find a user by username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, favorites, watchlist
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, favorites, watchlist
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    /// Create a new user with hashed password.
    async fn create(&self, username: &str, password_hash: &str) -> Result<User, StoreError> {
        // The unique index decides races between two registrations of one name.
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash)
            VALUES ($1, $2)
            ON CONFLICT (username) DO NOTHING
            RETURNING id, username, password_hash, favorites, watchlist
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .fetch_optional(&self.db)
        .await?;
        user.ok_or(StoreError::DuplicateUsername)
    }

    async fn save(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE users
            SET username = $2, password_hash = $3, favorites = $4, watchlist = $5
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.favorites)
        .bind(&user.watchlist)
        .execute(&self.db)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                StoreError::DuplicateUsername
            }
            other => StoreError::Database(other),
        })?;
        Ok(())
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn add_to_set(
        &self,
        id: Uuid,
        kind: ListKind,
        movie_id: i64,
    ) -> Result<Option<Vec<i64>>, StoreError> {
        // Single statement: the row lock serializes concurrent appends.
        let sql = format!(
            r#"
            UPDATE users
            SET {col} = CASE WHEN $2 = ANY({col}) THEN {col} ELSE array_append({col}, $2) END
            WHERE id = $1
            RETURNING {col}
            "#,
            col = kind.column()
        );
        let list = sqlx::query_scalar::<_, Vec<i64>>(&sql)
            .bind(id)
            .bind(movie_id)
            .fetch_optional(&self.db)
            .await?;
        Ok(list)
    }
}
