use tracing::{info, warn};
use uuid::Uuid;

use crate::{error::AppError, state::AppState, users::ListKind};

/// Idempotent append: an id already in the list leaves it unchanged.
/// Returns the list as stored after the call.
pub async fn add_to_list(
    state: &AppState,
    user_id: Uuid,
    kind: ListKind,
    movie_id: i64,
) -> Result<Vec<i64>, AppError> {
    let Some(list) = state.users.add_to_set(user_id, kind, movie_id).await? else {
        warn!(user_id = %user_id, list = ?kind, "token refers to missing user");
        return Err(AppError::NotFound);
    };
    info!(user_id = %user_id, list = ?kind, movie_id, len = list.len(), "list updated");
    Ok(list)
}
