use tracing::{info, warn};
use uuid::Uuid;

use super::dto::Credentials;
use crate::{error::AppError, state::AppState, users::User};

/// A freshly issued token together with the user it was issued for.
#[derive(Debug)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// Both fields present and non-empty, else `MissingField`.
fn require_fields(creds: Credentials) -> Result<(String, String), AppError> {
    match (creds.username, creds.password) {
        (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
            Ok((username, password))
        }
        _ => Err(AppError::MissingField),
    }
}

pub async fn register(state: &AppState, creds: Credentials) -> Result<Session, AppError> {
    let (username, password) = require_fields(creds)?;

    // Cheap early exit before paying for the hash; `create` still enforces uniqueness.
    if state.users.find_by_username(&username).await?.is_some() {
        warn!(username = %username, "username already registered");
        return Err(AppError::DuplicateUsername);
    }

    let hash = state.hasher.hash(password).await?;
    let user = state.users.create(&username, &hash).await.map_err(|e| {
        warn!(username = %username, error = %e, "create user failed");
        AppError::from(e)
    })?;

    let token = state.jwt.sign(user.id, &user.username)?;
    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok(Session { token, user })
}

pub async fn login(state: &AppState, creds: Credentials) -> Result<Session, AppError> {
    let (username, password) = require_fields(creds)?;

    let Some(user) = state.users.find_by_username(&username).await? else {
        warn!(username = %username, "login unknown username");
        return Err(AppError::InvalidCredentials);
    };

    let ok = state
        .hasher
        .verify(password.clone(), user.password_hash.clone())
        .await?;
    if !ok {
        warn!(username = %username, user_id = %user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    // The credentials are valid; a failed upgrade must not fail the login.
    if state.hasher.needs_rehash(&user.password_hash) {
        match rehash(state, user.id, password).await {
            Ok(()) => info!(user_id = %user.id, "password rehashed with current work factor"),
            Err(e) => warn!(user_id = %user.id, error = ?e, "password rehash failed"),
        }
    }

    let token = state.jwt.sign(user.id, &user.username)?;
    info!(user_id = %user.id, username = %user.username, "user logged in");
    Ok(Session { token, user })
}

async fn rehash(state: &AppState, user_id: Uuid, password: String) -> anyhow::Result<()> {
    let hash = state.hasher.hash(password).await?;
    state.users.set_password_hash(user_id, &hash).await?;
    Ok(())
}

pub async fn profile(state: &AppState, user_id: Uuid) -> Result<User, AppError> {
    state.users.find_by_id(user_id).await?.ok_or_else(|| {
        warn!(user_id = %user_id, "token refers to missing user");
        AppError::NotFound
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::{
        auth::password::Argon2Hasher,
        config::HashingConfig,
        users::{ListKind, MemoryUserStore, StoreError, UserStore},
    };

    fn creds(username: &str, password: &str) -> Credentials {
        Credentials {
            username: Some(username.into()),
            password: Some(password.into()),
        }
    }

    #[tokio::test]
    async fn register_twice_is_duplicate() {
        let state = AppState::fake();
        register(&state, creds("alice", "pw1")).await.expect("first");
        let err = register(&state, creds("alice", "other")).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateUsername));
    }

    #[tokio::test]
    async fn register_requires_both_fields() {
        let state = AppState::fake();
        for (u, p) in [("", "pw"), ("alice", ""), ("", "")] {
            let err = register(&state, creds(u, p)).await.unwrap_err();
            assert!(matches!(err, AppError::MissingField));
        }
        assert!(state.users.find_by_username("alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn register_stores_hash_not_plaintext() {
        let state = AppState::fake();
        let session = register(&state, creds("alice", "pw1")).await.unwrap();
        let stored = state.users.find_by_id(session.user.id).await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "pw1");
        assert!(stored.favorites.is_empty() && stored.watchlist.is_empty());
    }

    #[tokio::test]
    async fn issued_token_carries_id_and_username() {
        let state = AppState::fake();
        let session = register(&state, creds("alice", "pw1")).await.unwrap();
        let claims = state.jwt.verify(&session.token).unwrap();
        assert_eq!(claims.id, session.user.id);
        assert_eq!(claims.username, "alice");
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_look_the_same() {
        let state = AppState::fake();
        register(&state, creds("alice", "pw1")).await.unwrap();

        let wrong = login(&state, creds("alice", "nope")).await.unwrap_err();
        let unknown = login(&state, creds("nobody", "pw1")).await.unwrap_err();
        assert!(matches!(wrong, AppError::InvalidCredentials));
        assert!(matches!(unknown, AppError::InvalidCredentials));
        assert_eq!(wrong.status(), unknown.status());
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn login_returns_same_user_as_register() {
        let state = AppState::fake();
        let registered = register(&state, creds("alice", "pw1")).await.unwrap();
        let logged_in = login(&state, creds("alice", "pw1")).await.unwrap();
        assert_eq!(registered.user.id, logged_in.user.id);
        assert!(state.jwt.verify(&logged_in.token).is_ok());
    }

    #[tokio::test]
    async fn login_upgrades_stale_hash() {
        let state = AppState::fake();
        let user = register(&state, creds("alice", "pw1")).await.unwrap().user;

        // Pretend the account was created before the work factor changed.
        let weak = crate::auth::password::Argon2Hasher::new(crate::config::HashingConfig {
            memory_kib: 32,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap();
        let mut stale = state.users.find_by_id(user.id).await.unwrap().unwrap();
        stale.password_hash = weak.hash("pw1".into()).await.unwrap();
        state.users.save(&stale).await.unwrap();

        login(&state, creds("alice", "pw1")).await.expect("login");
        let stored = state.users.find_by_id(user.id).await.unwrap().unwrap();
        assert_ne!(stored.password_hash, stale.password_hash);
        assert!(!state.hasher.needs_rehash(&stored.password_hash));
    }

    #[tokio::test]
    async fn null_fields_count_as_missing() {
        let state = AppState::fake();
        let cases = [
            Credentials { username: None, password: Some("pw".into()) },
            Credentials { username: Some("alice".into()), password: None },
            Credentials { username: None, password: None },
        ];
        for creds in cases {
            let err = login(&state, creds).await.unwrap_err();
            assert!(matches!(err, AppError::MissingField));
        }
    }

    /// Delegates to the in-memory store but cannot persist password hashes.
    struct ReadOnlyHashes(MemoryUserStore);

    #[async_trait]
    impl UserStore for ReadOnlyHashes {
        async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
            self.0.find_by_username(username).await
        }
        async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
            self.0.find_by_id(id).await
        }
        async fn create(&self, username: &str, password_hash: &str) -> Result<User, StoreError> {
            self.0.create(username, password_hash).await
        }
        async fn save(&self, user: &User) -> Result<(), StoreError> {
            self.0.save(user).await
        }
        async fn set_password_hash(&self, _id: Uuid, _hash: &str) -> Result<(), StoreError> {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        }
        async fn add_to_set(
            &self,
            id: Uuid,
            kind: ListKind,
            movie_id: i64,
        ) -> Result<Option<Vec<i64>>, StoreError> {
            self.0.add_to_set(id, kind, movie_id).await
        }
    }

    #[tokio::test]
    async fn failed_rehash_still_logs_in() {
        let fake = AppState::fake();
        let store = Arc::new(ReadOnlyHashes(MemoryUserStore::new()));
        let state = AppState::from_parts(fake.config.clone(), store.clone()).unwrap();

        let weak = Argon2Hasher::new(HashingConfig {
            memory_kib: 32,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap();
        let stale_hash = weak.hash("pw1".into()).await.unwrap();
        let user = store.create("alice", &stale_hash).await.unwrap();
        assert!(state.hasher.needs_rehash(&stale_hash));

        let session = login(&state, creds("alice", "pw1")).await.expect("login");
        assert_eq!(session.user.id, user.id);
        assert!(state.jwt.verify(&session.token).is_ok());
        let stored = store.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.password_hash, stale_hash);
    }

    #[tokio::test]
    async fn profile_of_missing_user_is_not_found() {
        let state = AppState::fake();
        let err = profile(&state, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }
}
