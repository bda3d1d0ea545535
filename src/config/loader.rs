//! Load the registration file, fill column listings from PostgreSQL, and resolve the registry.

use crate::config::resolved::{ColumnInfo, EntityDescriptor, EntityRegistry, ScopeCondition, ScopeFilter};
use crate::config::types::*;
use crate::config::{validate, validate_column_refs};
use crate::error::{AppError, ConfigError};
use sqlx::PgPool;
use std::path::Path;

/// Build the immutable registry from a config (validates first).
pub fn resolve(config: &BatchingConfig) -> Result<EntityRegistry, ConfigError> {
    validate(config)?;

    let mut entities = Vec::with_capacity(config.entities.len());
    for e in &config.entities {
        if e.columns.is_empty() {
            return Err(ConfigError::Validation(format!(
                "table {} has no columns (declare them or introspect before resolving)",
                e.table_name
            )));
        }
        validate_column_refs(e, e.columns.iter().map(|c| c.0.name.as_str()))?;

        let columns = e
            .columns
            .iter()
            .map(|c| ColumnInfo {
                name: c.0.name.clone(),
                pg_type: c.0.pg_type.clone(),
            })
            .collect();
        let scopes = e
            .scopes
            .iter()
            .map(|s| ScopeFilter {
                name: s.name.clone(),
                column: s.column.clone(),
                condition: match &s.equals {
                    Some(v) => ScopeCondition::Equals(v.clone()),
                    None => ScopeCondition::IsNull,
                },
            })
            .collect();

        entities.push(EntityDescriptor {
            schema_name: e.schema.clone(),
            table_name: e.table_name.clone(),
            columns,
            hidden_columns: e.hidden.iter().cloned().collect(),
            global_access_permissions: e.global_access_permissions.clone(),
            authenticate: e.authenticate,
            scopes,
        });
    }

    tracing::info!(entities = entities.len(), "batching registry resolved");
    Ok(EntityRegistry::new(entities))
}

/// Read the JSON registration file.
pub async fn load_from_path(path: impl AsRef<Path>) -> Result<BatchingConfig, ConfigError> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    parse_config(&raw)
}

pub fn parse_config(raw: &str) -> Result<BatchingConfig, ConfigError> {
    serde_json::from_str(raw).map_err(|e| ConfigError::Load(e.to_string()))
}

/// Fill the column listing of every entity that declares none, in ordinal order, and the
/// type of every declared column that has none.
pub async fn introspect_columns(pool: &PgPool, config: &mut BatchingConfig) -> Result<(), AppError> {
    const SQL: &str = "SELECT column_name::text, udt_name::text FROM information_schema.columns \
                       WHERE table_schema = $1 AND table_name = $2 ORDER BY ordinal_position";
    let needs_lookup = |e: &EntityConfig| e.columns.is_empty() || e.columns.iter().any(|c| c.0.pg_type.is_none());
    for entity in config.entities.iter_mut().filter(|e| needs_lookup(e)) {
        let rows = sqlx::query_as::<_, (String, String)>(SQL)
            .bind(entity.schema.clone())
            .bind(entity.table_name.clone())
            .fetch_all(pool)
            .await?;
        if rows.is_empty() {
            tracing::warn!(table = %entity.table_name, schema = %entity.schema, "no columns found in information_schema");
            continue;
        }
        tracing::debug!(table = %entity.table_name, columns = rows.len(), "introspected columns");
        apply_introspected(entity, rows);
    }
    Ok(())
}

/// Merge `(name, udt_name)` rows into an entity: all of them when none are declared,
/// otherwise only the missing types of declared columns.
pub fn apply_introspected(entity: &mut EntityConfig, rows: Vec<(String, String)>) {
    if entity.columns.is_empty() {
        entity.columns = rows
            .into_iter()
            .map(|(name, udt)| ColumnEntry(ColumnConfig { name, pg_type: Some(udt) }))
            .collect();
        return;
    }
    for column in entity.columns.iter_mut().filter(|c| c.0.pg_type.is_none()) {
        match rows.iter().find(|(name, _)| *name == column.0.name) {
            Some((_, udt)) => column.0.pg_type = Some(udt.clone()),
            None => tracing::warn!(table = %entity.table_name, column = %column.0.name, "declared column not found in information_schema"),
        }
    }
}
