//! Account service for the movie browser: registration, login, and the
//! per-user favorites and watchlist, behind a token-gated JSON API.

pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod library;
pub mod state;
pub mod users;
