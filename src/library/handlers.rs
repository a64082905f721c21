use axum::{extract::State, routing::post, Json, Router};
use tracing::instrument;

use super::{dto::MovieRef, services::add_to_list};
use crate::{
    auth::extractors::AuthUser,
    error::{AppError, JsonBody},
    state::AppState,
    users::ListKind,
};

pub fn list_routes() -> Router<AppState> {
    Router::new()
        .route("/user/favorites", post(add_favorite))
        .route("/user/watchlist", post(add_watchlist))
}

// `AuthUser` comes first so an unauthenticated request is rejected before its body is read.

#[instrument(skip_all)]
pub async fn add_favorite(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    JsonBody(body): JsonBody<MovieRef>,
) -> Result<Json<Vec<i64>>, AppError> {
    let movie_id = body.movie_id.ok_or(AppError::MissingField)?;
    let list = add_to_list(&state, claims.id, ListKind::Favorites, movie_id).await?;
    Ok(Json(list))
}

#[instrument(skip_all)]
pub async fn add_watchlist(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    JsonBody(body): JsonBody<MovieRef>,
) -> Result<Json<Vec<i64>>, AppError> {
    let movie_id = body.movie_id.ok_or(AppError::MissingField)?;
    let list = add_to_list(&state, claims.id, ListKind::Watchlist, movie_id).await?;
    Ok(Json(list))
}
