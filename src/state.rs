use std::sync::Arc;

use tracing::warn;

use crate::{
    auth::{jwt::JwtKeys, password::Argon2Hasher},
    config::{AppConfig, HashingConfig, JwtConfig},
    db,
    users::{MemoryUserStore, PgUserStore, UserStore},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserStore>,
    pub hasher: Argon2Hasher,
    pub jwt: JwtKeys,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let users = match config.database_url.as_deref() {
            Some(url) => {
                let pool = db::connect(url).await?;
                db::migrate(&pool).await?;
                Arc::new(PgUserStore::new(pool)) as Arc<dyn UserStore>
            }
            None => {
                warn!("DATABASE_URL not set; accounts live in memory and vanish on restart");
                Arc::new(MemoryUserStore::new()) as Arc<dyn UserStore>
            }
        };

        Self::from_parts(config, users)
    }

    pub fn from_parts(config: Arc<AppConfig>, users: Arc<dyn UserStore>) -> anyhow::Result<Self> {
        let hasher = Argon2Hasher::new(config.hashing)?;
        let jwt = JwtKeys::from_config(&config.jwt);
        Ok(Self {
            config,
            users,
            hasher,
            jwt,
        })
    }

    /// In-memory state with a deliberately cheap hasher, for tests.
    pub fn fake() -> Self {
        let config = Arc::new(AppConfig {
            database_url: None,
            jwt: JwtConfig {
                secret: "test".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_seconds: 3600,
            },
            hashing: HashingConfig {
                memory_kib: 64,
                iterations: 1,
                parallelism: 1,
            },
            host: "127.0.0.1".into(),
            port: 0,
        });
        Self::from_parts(config, Arc::new(MemoryUserStore::new())).expect("fake state ok")
    }
}
