//! Shared application state for all routes. The registry is immutable after startup.

use crate::access::AccessPolicy;
use crate::config::EntityRegistry;
use crate::source::RecordSourceRef;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<EntityRegistry>,
    pub policy: AccessPolicy,
    pub source: RecordSourceRef,
}

impl AppState {
    pub fn new(registry: EntityRegistry, policy: AccessPolicy, source: RecordSourceRef) -> Self {
        AppState {
            registry: Arc::new(registry),
            policy,
            source,
        }
    }
}
