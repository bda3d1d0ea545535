//! Raw registration types matching the batching JSON config file.

use serde::{Deserialize, Deserializer, Serialize};

fn default_schema() -> String {
    "public".into()
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ColumnConfig {
    pub name: String,
    /// PostgreSQL type used for parameter casts (e.g. "int8", "uuid", "timestamptz").
    #[serde(default)]
    pub pg_type: Option<String>,
}

/// Columns may be listed as bare names or as objects with a type.
#[derive(Clone, Debug, Serialize)]
pub struct ColumnEntry(pub ColumnConfig);

impl<'de> Deserialize<'de> for ColumnEntry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let v = serde_json::Value::deserialize(deserializer)?;
        match v {
            serde_json::Value::String(name) => Ok(ColumnEntry(ColumnConfig { name, pg_type: None })),
            serde_json::Value::Object(_) => serde_json::from_value::<ColumnConfig>(v)
                .map(ColumnEntry)
                .map_err(serde::de::Error::custom),
            _ => Err(serde::de::Error::custom("column must be a name or an object with name")),
        }
    }
}

/// A default filter applied to every query unless bypassed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScopeConfig {
    pub name: String,
    pub column: String,
    #[serde(default)]
    pub equals: Option<serde_json::Value>,
    #[serde(default)]
    pub is_null: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EntityConfig {
    pub table_name: String,
    #[serde(default = "default_schema")]
    pub schema: String,
    /// Empty means "introspect from information_schema at startup".
    #[serde(default)]
    pub columns: Vec<ColumnEntry>,
    #[serde(default)]
    pub hidden: Vec<String>,
    #[serde(default)]
    pub global_access_permissions: Vec<String>,
    #[serde(default = "default_true")]
    pub authenticate: bool,
    #[serde(default)]
    pub scopes: Vec<ScopeConfig>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccessTokenConfig {
    pub token: String,
    pub guard: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BatchingConfig {
    #[serde(default)]
    pub entities: Vec<EntityConfig>,
    #[serde(default)]
    pub access_tokens: Vec<AccessTokenConfig>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_defaults() {
        let cfg: BatchingConfig = serde_json::from_str(
            r#"{"entities": [{"table_name": "products", "columns": ["id", {"name": "price", "pg_type": "numeric"}]}]}"#,
        )
        .unwrap();
        let e = &cfg.entities[0];
        assert_eq!(e.schema, "public");
        assert!(e.authenticate);
        assert!(e.global_access_permissions.is_empty());
        assert_eq!(e.columns[0].0.name, "id");
        assert_eq!(e.columns[1].0.pg_type.as_deref(), Some("numeric"));
    }

    #[test]
    fn rejects_numeric_column_entry() {
        let r: Result<BatchingConfig, _> =
            serde_json::from_str(r#"{"entities": [{"table_name": "t", "columns": [1]}]}"#);
        assert!(r.is_err());
    }
}
