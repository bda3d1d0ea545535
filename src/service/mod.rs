//! Request resolution: find (filter, order, page) and find-grouped.

mod find;
mod grouped;

pub use find::{plan_order, FindResolver};
pub use grouped::GroupedResolver;

use crate::access::Caller;
use crate::query::RawParams;

/// Everything a resolver needs from one HTTP request.
#[derive(Clone, Debug, Default)]
pub struct BatchingRequest {
    /// Table segment of the route, after the batching prefix.
    pub table: String,
    pub params: RawParams,
    pub caller: Caller,
    /// `X-Ignore-Scopes` header value.
    pub ignore_scopes: bool,
}

impl BatchingRequest {
    pub fn new(table: impl Into<String>, params: RawParams) -> Self {
        BatchingRequest {
            table: table.into(),
            params,
            ..Default::default()
        }
    }

    pub fn with_caller(mut self, caller: Caller) -> Self {
        self.caller = caller;
        self
    }

    pub fn ignoring_scopes(mut self) -> Self {
        self.ignore_scopes = true;
        self
    }
}
