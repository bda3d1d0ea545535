//! Record sources: the relational read capability the resolvers run queries through.

mod memory;
mod postgres;

pub use memory::MemoryRecordSource;
pub use postgres::PgRecordSource;

use crate::error::AppError;
use crate::query::{Record, SelectQuery};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Run one filtered, ordered, paged read. Rows come back in engine order.
    async fn fetch(&self, query: &SelectQuery<'_>) -> Result<Vec<Record>, AppError>;

    /// False when the engine ignores `SelectQuery::order`; the find resolver then sorts in memory.
    fn orders_natively(&self) -> bool {
        true
    }

    /// Liveness probe used by `/ready`.
    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

pub type RecordSourceRef = Arc<dyn RecordSource>;
