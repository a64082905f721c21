use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{Credentials, LoginResponse, RegisterResponse},
        extractors::AuthUser,
        services,
    },
    error::{AppError, JsonBody},
    state::AppState,
    users::User,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/user", get(get_user))
}

#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<Credentials>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let session = services::register(&state, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            token: session.token,
            user: session.user.into(),
        }),
    ))
}

#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<Credentials>,
) -> Result<Json<LoginResponse>, AppError> {
    let session = services::login(&state, payload).await?;
    Ok(Json(LoginResponse {
        token: session.token,
        user: session.user.into(),
    }))
}

/// The caller's own record, password hash omitted.
#[instrument(skip_all)]
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<User>, AppError> {
    let user = services::profile(&state, claims.id).await?;
    Ok(Json(user))
}
