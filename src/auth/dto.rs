use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::users::User;

/// Request body for registration and login. Absent or null fields read as `None`.
#[derive(Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Response returned after registration.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub token: String,
    pub user: PublicUser,
}

/// Response returned after login; includes both lists.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: SessionUser,
}

#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub username: String,
    pub favorites: Vec<i64>,
    pub watchlist: Vec<i64>,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
        }
    }
}

impl From<User> for SessionUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            favorites: u.favorites,
            watchlist: u.watchlist,
        }
    }
}
