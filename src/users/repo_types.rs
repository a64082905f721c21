use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,                     // unique user ID
    pub username: String,             // login key, unique
    #[serde(skip_serializing)]
    pub password_hash: String,        // Argon2 PHC string, not exposed in JSON
    pub favorites: Vec<i64>,          // catalog ids, no repeats
    pub watchlist: Vec<i64>,          // catalog ids, no repeats
}

/// Which of the two per-user id lists an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Favorites,
    Watchlist,
}

impl ListKind {
    pub(crate) fn column(self) -> &'static str {
        match self {
            ListKind::Favorites => "favorites",
            ListKind::Watchlist => "watchlist",
        }
    }
}

impl User {
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            password_hash: password_hash.into(),
            favorites: Vec::new(),
            watchlist: Vec::new(),
        }
    }

    pub fn list(&self, kind: ListKind) -> &[i64] {
        match kind {
            ListKind::Favorites => &self.favorites,
            ListKind::Watchlist => &self.watchlist,
        }
    }

    /// Appends `movie_id` unless it is already present. Returns whether the list changed.
    pub fn add_to(&mut self, kind: ListKind, movie_id: i64) -> bool {
        let list = match kind {
            ListKind::Favorites => &mut self.favorites,
            ListKind::Watchlist => &mut self.watchlist,
        };
        if list.contains(&movie_id) {
            return false;
        }
        list.push(movie_id);
        true
    }
}
