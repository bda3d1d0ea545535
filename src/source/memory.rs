//! In-process record source over fixed rows. Backs tests and local demos.

use crate::config::ScopeCondition;
use crate::error::AppError;
use crate::query::{canonical_key, slot_in_sequence, sort_records, Record, SelectQuery, GROUP_SLOT};
use crate::source::RecordSource;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug)]
pub struct MemoryRecordSource {
    tables: HashMap<String, Vec<Record>>,
    native_ordering: bool,
    fetches: AtomicUsize,
}

impl Default for MemoryRecordSource {
    fn default() -> Self {
        MemoryRecordSource {
            tables: HashMap::new(),
            native_ordering: true,
            fetches: AtomicUsize::new(0),
        }
    }
}

impl MemoryRecordSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register rows for a table. Non-object values are skipped.
    pub fn with_table(mut self, table: impl Into<String>, rows: Vec<Value>) -> Self {
        let rows = rows
            .into_iter()
            .filter_map(|v| match v {
                Value::Object(m) => Some(m),
                _ => None,
            })
            .collect();
        self.tables.insert(table.into(), rows);
        self
    }

    /// Behave like an engine that cannot order: rows come back in stored order.
    pub fn without_native_ordering(mut self) -> Self {
        self.native_ordering = false;
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

fn matches(record: &Record, query: &SelectQuery<'_>) -> bool {
    for f in &query.filters {
        let wanted: HashSet<String> = f.values.iter().map(canonical_key).collect();
        let have = record.get(&f.column).map(canonical_key);
        if !have.map(|h| wanted.contains(&h)).unwrap_or(false) {
            return false;
        }
    }
    if query.apply_scopes {
        for scope in &query.entity.scopes {
            let v = record.get(&scope.column).unwrap_or(&Value::Null);
            let ok = match &scope.condition {
                ScopeCondition::Equals(expected) => !v.is_null() && canonical_key(v) == canonical_key(expected),
                ScopeCondition::IsNull => v.is_null(),
            };
            if !ok {
                return false;
            }
        }
    }
    true
}

#[async_trait]
impl RecordSource for MemoryRecordSource {
    async fn fetch(&self, query: &SelectQuery<'_>) -> Result<Vec<Record>, AppError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let Some(rows) = self.tables.get(&query.entity.table_name) else {
            return Ok(Vec::new());
        };
        let mut out: Vec<Record> = rows.iter().filter(|r| matches(r, query)).cloned().collect();
        if let Some(group) = &query.group {
            for r in &mut out {
                let slot = r
                    .get(&group.column)
                    .and_then(|v| slot_in_sequence(&group.sequence, v))
                    .map_or(Value::Null, |s| Value::from(s as u64));
                r.insert(GROUP_SLOT.to_string(), slot);
            }
        }
        if self.native_ordering {
            if let Some(order) = &query.order {
                sort_records(&mut out, order);
            }
        }
        let offset = query.offset.unwrap_or(0) as usize;
        let limit = query.limit.map(|n| n as usize).unwrap_or(usize::MAX);
        Ok(out.into_iter().skip(offset).take(limit).collect())
    }

    fn orders_natively(&self) -> bool {
        self.native_ordering
    }
}
