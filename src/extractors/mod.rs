//! Request extractors: caller credential and the scope-bypass header.

pub mod caller;
pub mod scopes;

pub use caller::AUTHORIZATION_SCHEME;
pub use scopes::{parse_flag, IgnoreScopes, IGNORE_SCOPES_HEADER};
