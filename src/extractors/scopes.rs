//! Extract the scope-bypass signal from the `X-Ignore-Scopes` header.

use crate::error::AppError;
use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};

pub const IGNORE_SCOPES_HEADER: &str = "X-Ignore-Scopes";

/// Whether the request asks for default scopes to be lifted. Absent header is `false`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IgnoreScopes(pub bool);

/// Boolean flag as accepted in headers and query strings.
pub fn parse_flag(name: &str, raw: &str) -> Result<bool, AppError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" => Ok(true),
        "0" | "false" | "" => Ok(false),
        other => Err(AppError::Validation(format!("{} must be a boolean, got '{}'", name, other))),
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for IgnoreScopes
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(IGNORE_SCOPES_HEADER) else {
            return Ok(IgnoreScopes(false));
        };
        let raw = value
            .to_str()
            .map_err(|_| AppError::Validation(format!("{} must be a boolean", IGNORE_SCOPES_HEADER)))?;
        parse_flag(IGNORE_SCOPES_HEADER, raw).map(IgnoreScopes)
    }
}
