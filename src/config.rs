use std::str::FromStr;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_seconds: i64,
}

/// Argon2 work factor. Higher values make every login slower on purpose.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct HashingConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            memory_kib: argon2::Params::DEFAULT_M_COST,
            iterations: argon2::Params::DEFAULT_T_COST,
            parallelism: argon2::Params::DEFAULT_P_COST,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// `None` runs the service on the in-memory user store.
    pub database_url: Option<String>,
    pub jwt: JwtConfig,
    pub hashing: HashingConfig,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty());
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "marquee".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "marquee-users".into()),
            ttl_seconds: env_or("JWT_TTL_SECONDS", 3600),
        };
        let defaults = HashingConfig::default();
        let hashing = HashingConfig {
            memory_kib: env_or("ARGON2_MEMORY_KIB", defaults.memory_kib),
            iterations: env_or("ARGON2_ITERATIONS", defaults.iterations),
            parallelism: env_or("ARGON2_PARALLELISM", defaults.parallelism),
        };
        Ok(Self {
            database_url,
            jwt,
            hashing,
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: pick_port(std::env::var("APP_PORT").ok(), std::env::var("PORT").ok()),
        })
    }
}

/// `APP_PORT` wins, then `PORT`, then 5000. Unparseable values are skipped.
fn pick_port(app_port: Option<String>, port: Option<String>) -> u16 {
    [app_port, port]
        .into_iter()
        .flatten()
        .find_map(|v| v.parse::<u16>().ok())
        .unwrap_or(5000)
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_or_parses_present_value() {
        std::env::set_var("MARQUEE_TEST_ENV_OR_PRESENT", "42");
        assert_eq!(env_or("MARQUEE_TEST_ENV_OR_PRESENT", 7u32), 42);
    }

    #[test]
    fn port_prefers_app_port_then_port() {
        let some = |v: &str| Some(v.to_owned());
        assert_eq!(pick_port(some("8080"), some("9090")), 8080);
        assert_eq!(pick_port(None, some("9090")), 9090);
        assert_eq!(pick_port(some("not-a-port"), some("9090")), 9090);
        assert_eq!(pick_port(None, None), 5000);
    }

    #[test]
    fn env_or_falls_back_on_garbage_or_missing() {
        std::env::set_var("MARQUEE_TEST_ENV_OR_GARBAGE", "forty-two");
        assert_eq!(env_or("MARQUEE_TEST_ENV_OR_GARBAGE", 7u32), 7);
        assert_eq!(env_or("MARQUEE_TEST_ENV_OR_MISSING", 3600i64), 3600);
    }
}
