//! Router construction.

pub mod batching;
pub mod common;

pub use batching::{app, batching_routes};
pub use common::common_routes;
