//! HTTP handlers for the batching endpoints.

pub mod batching;
pub use batching::*;
