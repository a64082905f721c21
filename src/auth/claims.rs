use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT payload carried in `x-auth-token`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub id: Uuid,         // user ID
    pub username: String, // login name at issue time
    pub iat: i64,         // issued at (unix timestamp)
    pub exp: i64,         // expires at (unix timestamp)
    pub iss: String,      // issuer
    pub aud: String,      // audience
}
