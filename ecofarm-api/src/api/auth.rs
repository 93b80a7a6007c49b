//! Acting user extraction
//!
//! Authentication happens upstream; the gateway forwards the authenticated
//! user id in `X-User-Id`. Handlers that take [`ActingUser`] reject
//! requests without a valid UUID there with 401.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::ApiError;

/// Header carrying the authenticated user id
pub const USER_ID_HEADER: &str = "x-user-id";

/// The user on whose behalf the request runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActingUser(pub Uuid);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for ActingUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| ApiError::Unauthorized("missing X-User-Id header".to_string()))?;

        let text = value
            .to_str()
            .map_err(|_| ApiError::Unauthorized("X-User-Id is not valid text".to_string()))?;

        Uuid::parse_str(text.trim())
            .map(ActingUser)
            .map_err(|_| ApiError::Unauthorized("X-User-Id is not a valid UUID".to_string()))
    }
}
