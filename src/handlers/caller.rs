use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::errors::AppError;

pub const USER_ID_HEADER: &str = "x-sharer-user-id";

/// Numeric identity of the caller, taken from the `X-Sharer-User-Id` header and
/// trusted as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerId(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for CallerId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| AppError::Validation("missing X-Sharer-User-Id header".to_string()))?;

        raw.to_str()
            .ok()
            .and_then(|v| v.trim().parse::<i64>().ok())
            .map(CallerId)
            .ok_or_else(|| AppError::Validation("X-Sharer-User-Id must be an integer".to_string()))
    }
}
