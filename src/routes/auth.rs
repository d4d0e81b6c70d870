//! Caller identity extraction.
//!
//! Token verification happens upstream (the API gateway strips the bearer
//! token and forwards the verified subject in a header); this extractor only
//! lifts that header into a typed user id.

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::AppError;

/// Header carrying the gateway-verified user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Authenticated caller of the current request.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| AppError::Unauthorized(format!("missing {USER_ID_HEADER} header")))?;

        let value = value
            .to_str()
            .map_err(|_| AppError::Unauthorized(format!("malformed {USER_ID_HEADER} header")))?;

        let user_id = Uuid::parse_str(value)
            .map_err(|_| AppError::Unauthorized(format!("malformed {USER_ID_HEADER} header")))?;

        Ok(AuthUser(user_id))
    }
}
