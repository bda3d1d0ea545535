#![allow(dead_code)]

use batching_routes::{
    AccessPolicy, AppState, Caller, EntityDescriptor, EntityRegistry, MemoryRecordSource, PermissionGate,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Gate that grants everything to token "root" and records every permission check.
#[derive(Default)]
pub struct RecordingGate {
    pub checks: AtomicUsize,
    pub guards: Mutex<Vec<String>>,
}

impl PermissionGate for RecordingGate {
    fn authenticate(&self, caller: &Caller) -> bool {
        caller.token.is_some()
    }

    fn allows(&self, caller: &Caller, guard: &str, permission: &str) -> bool {
        self.checks.fetch_add(1, Ordering::SeqCst);
        self.guards.lock().unwrap().push(guard.to_string());
        caller.token.as_deref() == Some("root") && guard == permission
    }
}

impl RecordingGate {
    pub fn checks(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }
}

/// `tables` (id, name, tenant) with a tenant scope and `viewer` as bypass permission.
pub fn tables_entity() -> EntityDescriptor {
    let mut e = EntityDescriptor::new("tables", &["id", "name", "tenant"]);
    e.columns[0].pg_type = Some("int8".into());
    e.global_access_permissions = vec!["viewer".into()];
    e.scopes.push(batching_routes::config::ScopeFilter {
        name: "tenant".into(),
        column: "tenant".into(),
        condition: batching_routes::config::ScopeCondition::Equals(json!(1)),
    });
    e
}

pub fn users_entity() -> EntityDescriptor {
    let mut e = EntityDescriptor::new("users", &["id", "email", "password"]);
    e.hidden_columns.insert("password".into());
    e.authenticate = true;
    e
}

pub fn rows() -> Vec<Value> {
    vec![
        json!({"id": 3, "name": "Foo", "tenant": 1}),
        json!({"id": 1, "name": "Foo", "tenant": 1}),
        json!({"id": 2, "name": "Foo", "tenant": 1}),
        json!({"id": 3, "name": "Bar", "tenant": 2}),
    ]
}

pub fn users() -> Vec<Value> {
    vec![
        json!({"id": 2, "email": "b@x.io", "password": "secret-b"}),
        json!({"id": 1, "email": "a@x.io", "password": "secret-a"}),
    ]
}

pub struct Fixture {
    pub state: AppState,
    pub gate: Arc<RecordingGate>,
    pub source: Arc<MemoryRecordSource>,
}

pub fn fixture_with(source: MemoryRecordSource) -> Fixture {
    let gate = Arc::new(RecordingGate::default());
    let source = Arc::new(source);
    let registry = EntityRegistry::new(vec![tables_entity(), users_entity()]);
    let state = AppState::new(registry, AccessPolicy::new(gate.clone()), source.clone());
    Fixture { state, gate, source }
}

pub fn fixture() -> Fixture {
    fixture_with(
        MemoryRecordSource::new()
            .with_table("tables", rows())
            .with_table("users", users()),
    )
}

pub fn ids(records: &[serde_json::Map<String, Value>]) -> Vec<i64> {
    records.iter().map(|r| r["id"].as_i64().unwrap()).collect()
}
