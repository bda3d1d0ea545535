//! In-memory ordering and grouping of fetched records.

use crate::query::{canonical_key, compare_values, OrderClause, OrderingDirective, Record, GROUP_SLOT};
use serde_json::Value;
use std::collections::HashMap;

/// Position of each canonical value in `sequence`; the first occurrence wins.
fn positions(sequence: &[Value]) -> HashMap<String, usize> {
    let mut map = HashMap::with_capacity(sequence.len());
    for (i, v) in sequence.iter().enumerate() {
        map.entry(canonical_key(v)).or_insert(i);
    }
    map
}

/// Stable sort by the clause. For custom order, values absent from the sequence go last.
pub fn sort_records(records: &mut [Record], order: &OrderClause) {
    let column = order.column.as_str();
    match &order.directive {
        OrderingDirective::Ascending => {
            records.sort_by(|a, b| compare_values(field(a, column), field(b, column)));
        }
        OrderingDirective::Descending => {
            records.sort_by(|a, b| compare_values(field(b, column), field(a, column)));
        }
        OrderingDirective::Custom(sequence) => {
            let index = positions(sequence);
            records.sort_by_key(|r| {
                index
                    .get(&canonical_key(field(r, column)))
                    .copied()
                    .unwrap_or(usize::MAX)
            });
        }
    }
}

fn field<'r>(record: &'r Record, column: &str) -> &'r Value {
    record.get(column).unwrap_or(&Value::Null)
}

/// Split records into `groups` buckets by their [`GROUP_SLOT`] tag, removing the tag.
/// Records keep fetch order inside a group; untagged records are dropped.
pub fn group_by_slot(records: Vec<Record>, groups: usize) -> Vec<Vec<Record>> {
    let mut out: Vec<Vec<Record>> = vec![Vec::new(); groups];
    for mut record in records {
        let slot = record.remove(GROUP_SLOT).and_then(|v| v.as_u64());
        if let Some(bucket) = slot.and_then(|s| out.get_mut(s as usize)) {
            bucket.push(record);
        }
    }
    out
}

/// Index of the first value in `sequence` matching `value` by canonical text.
pub fn slot_in_sequence(sequence: &[Value], value: &Value) -> Option<usize> {
    let key = canonical_key(value);
    sequence.iter().position(|v| canonical_key(v) == key)
}
