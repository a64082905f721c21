use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::error;

use crate::auth::jwt::TokenError;
use crate::users::StoreError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Please enter all fields")]
    MissingField,

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("User already exists")]
    DuplicateUsername,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("No token, authorization denied")]
    Unauthorized,

    #[error("Token is not valid")]
    BadToken(TokenError),

    #[error("User not found")]
    NotFound,

    #[error("Server Error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingField
            | AppError::MalformedPayload(_)
            | AppError::DuplicateUsername
            | AppError::InvalidCredentials
            | AppError::BadToken(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateUsername => AppError::DuplicateUsername,
            StoreError::Database(e) => AppError::Internal(anyhow::Error::new(e).context("user store")),
        }
    }
}

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub msg: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Internal(ref e) = self {
            // The cause stays in the logs; the caller only sees "Server Error".
            error!(error = ?e, "request failed");
        }
        let status = self.status();
        (status, Json(ErrorBody { msg: self.to_string() })).into_response()
    }
}

/// `Json` extractor whose rejections keep the `{msg}` error shape.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(malformed(rejection)),
        }
    }
}

fn malformed(rejection: JsonRejection) -> AppError {
    AppError::MalformedPayload(rejection.body_text())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_error_taxonomy() {
        assert_eq!(AppError::MissingField.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::DuplicateUsername.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::InvalidCredentials.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::BadToken(TokenError::Expired).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::Internal(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_error_hides_its_cause() {
        let err = AppError::Internal(anyhow::anyhow!("connection refused to 10.0.0.3"));
        assert_eq!(err.to_string(), "Server Error");
    }

    #[test]
    fn expired_and_invalid_tokens_share_one_message() {
        assert_eq!(
            AppError::BadToken(TokenError::Expired).to_string(),
            AppError::BadToken(TokenError::Invalid).to_string()
        );
    }

    #[test]
    fn duplicate_username_from_store() {
        let err: AppError = StoreError::DuplicateUsername.into();
        assert!(matches!(err, AppError::DuplicateUsername));
    }
}
