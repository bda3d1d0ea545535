//! Resolved entity registry: config validated and flattened for request-time lookup.

use crate::error::AppError;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

#[derive(Clone, Debug)]
pub struct ColumnInfo {
    pub name: String,
    /// PostgreSQL type name for SQL casts when binding literal values.
    pub pg_type: Option<String>,
}

/// Condition of a default scope.
#[derive(Clone, Debug, PartialEq)]
pub enum ScopeCondition {
    Equals(Value),
    IsNull,
}

#[derive(Clone, Debug)]
pub struct ScopeFilter {
    pub name: String,
    pub column: String,
    pub condition: ScopeCondition,
}

#[derive(Clone, Debug)]
pub struct EntityDescriptor {
    pub schema_name: String,
    pub table_name: String,
    /// Ordered as declared (or as introspected); the first column is the default sort column.
    pub columns: Vec<ColumnInfo>,
    /// Column names stripped from every response.
    pub hidden_columns: HashSet<String>,
    pub global_access_permissions: Vec<String>,
    /// Reject unauthenticated callers before resolution.
    pub authenticate: bool,
    pub scopes: Vec<ScopeFilter>,
}

impl EntityDescriptor {
    /// Minimal descriptor with untyped columns, no scopes and no authentication.
    pub fn new(table_name: impl Into<String>, columns: &[&str]) -> Self {
        EntityDescriptor {
            schema_name: "public".into(),
            table_name: table_name.into(),
            columns: columns
                .iter()
                .map(|c| ColumnInfo {
                    name: (*c).to_string(),
                    pg_type: None,
                })
                .collect(),
            hidden_columns: HashSet::new(),
            global_access_permissions: Vec::new(),
            authenticate: false,
            scopes: Vec::new(),
        }
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn first_column(&self) -> Option<&str> {
        self.columns.first().map(|c| c.name.as_str())
    }

    /// Configured permission identifiers able to lift default scopes; empty when unset.
    pub fn global_access_permissions(&self) -> &[String] {
        &self.global_access_permissions
    }
}

/// Immutable table-name lookup built once at startup.
#[derive(Clone, Debug, Default)]
pub struct EntityRegistry {
    entities: Vec<EntityDescriptor>,
    by_table: HashMap<String, usize>,
}

impl EntityRegistry {
    /// First registration wins for a repeated table name.
    pub fn new(entities: Vec<EntityDescriptor>) -> Self {
        let mut by_table = HashMap::new();
        for (i, e) in entities.iter().enumerate() {
            by_table.entry(e.table_name.clone()).or_insert(i);
        }
        EntityRegistry { entities, by_table }
    }

    pub fn get(&self, table_name: &str) -> Option<&EntityDescriptor> {
        self.by_table.get(table_name).map(|&i| &self.entities[i])
    }

    /// Resolve the table segment of a batching route to its entity.
    pub fn resolve(&self, route_resource: &str) -> Result<&EntityDescriptor, AppError> {
        self.get(route_resource).ok_or_else(|| {
            AppError::NotFound(format!("model not found for table: {}", route_resource))
        })
    }

    pub fn entities(&self) -> &[EntityDescriptor] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
