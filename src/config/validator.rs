//! Config validation: identifiers, duplicate registrations, column references.

use crate::config::{BatchingConfig, EntityConfig};
use crate::error::ConfigError;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

fn identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static identifier pattern"))
}

pub fn is_identifier(s: &str) -> bool {
    identifier_re().is_match(s)
}

fn check_identifier(s: &str) -> Result<(), ConfigError> {
    if is_identifier(s) {
        Ok(())
    } else {
        Err(ConfigError::InvalidIdentifier(s.to_string()))
    }
}

pub fn validate(config: &BatchingConfig) -> Result<(), ConfigError> {
    let mut table_names = HashSet::new();
    for entity in &config.entities {
        check_identifier(&entity.schema)?;
        check_identifier(&entity.table_name)?;
        if !table_names.insert(entity.table_name.as_str()) {
            return Err(ConfigError::DuplicateTable(entity.table_name.clone()));
        }
        for c in &entity.columns {
            check_identifier(&c.0.name)?;
        }
        for scope in &entity.scopes {
            check_identifier(&scope.column)?;
            if scope.is_null == scope.equals.is_some() {
                return Err(ConfigError::Validation(format!(
                    "scope {} on {} must set exactly one of equals / is_null",
                    scope.name, entity.table_name
                )));
            }
        }
        if !entity.columns.is_empty() {
            validate_column_refs(entity, entity.columns.iter().map(|c| c.0.name.as_str()))?;
        }
    }

    let mut tokens = HashSet::new();
    for t in &config.access_tokens {
        if t.token.is_empty() || t.guard.is_empty() {
            return Err(ConfigError::Validation("access token and guard must not be empty".into()));
        }
        if !tokens.insert((t.guard.as_str(), t.token.as_str())) {
            return Err(ConfigError::Validation(format!("duplicate token for guard {}", t.guard)));
        }
    }
    Ok(())
}

/// Hidden and scope columns must exist in the entity's column list.
pub fn validate_column_refs<'a>(
    entity: &EntityConfig,
    columns: impl IntoIterator<Item = &'a str>,
) -> Result<(), ConfigError> {
    let known: HashSet<&str> = columns.into_iter().collect();
    let referenced = entity
        .hidden
        .iter()
        .map(String::as_str)
        .chain(entity.scopes.iter().map(|s| s.column.as_str()));
    for col in referenced {
        if !known.contains(col) {
            return Err(ConfigError::UnknownColumn {
                table: entity.table_name.clone(),
                column: col.to_string(),
            });
        }
    }
    Ok(())
}
