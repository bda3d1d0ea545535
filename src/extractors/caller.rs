//! Extract the caller credential from `Authorization: Bearer <token>`.

use crate::access::Caller;
use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

pub const AUTHORIZATION_SCHEME: &str = "Bearer ";

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.strip_prefix(AUTHORIZATION_SCHEME))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        Ok(Caller { token })
    }
}
