//! Batching routes: registry-driven read endpoints that filter, order (including a
//! caller-supplied custom value order), page and group rows of one table per request.

pub mod access;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod query;
pub mod routes;
pub mod service;
pub mod source;
pub mod sql;
pub mod state;

pub use access::{AccessPolicy, Caller, PermissionGate, PermissionGateRef, TokenGate};
pub use config::{
    introspect_columns, load_from_path, parse_config, resolve, BatchingConfig, EntityDescriptor, EntityRegistry,
    Settings,
};
pub use error::{AppError, ConfigError};
pub use query::{GroupClause, OrderingDirective, Pagination, RawParams, Record, RequestFilters, SelectQuery, GROUP_SLOT};
pub use routes::{app, batching_routes, common_routes};
pub use service::{BatchingRequest, FindResolver, GroupedResolver};
pub use source::{MemoryRecordSource, PgRecordSource, RecordSource, RecordSourceRef};
pub use state::AppState;
