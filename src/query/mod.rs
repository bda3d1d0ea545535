//! Abstract read query: what the resolvers build and what a record source executes.

pub mod ordering;
pub mod params;
pub mod values;

pub use ordering::*;
pub use params::*;
pub use values::*;

use crate::config::EntityDescriptor;
use crate::error::AppError;
use serde_json::Value;
use std::str::FromStr;

/// One fetched row: column name -> JSON value.
pub type Record = serde_json::Map<String, Value>;

/// Output column carrying the group index of a row when a [`GroupClause`] is set.
pub const GROUP_SLOT: &str = "__group_slot";

/// `order_by_direction` as accepted on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
    Custom,
}

impl FromStr for OrderDirection {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ASC" => Ok(OrderDirection::Asc),
            "DESC" => Ok(OrderDirection::Desc),
            "CUSTOM" => Ok(OrderDirection::Custom),
            _ => Err(AppError::Validation(format!(
                "order_by_direction must be one of ASC, DESC, CUSTOM, got '{}'",
                s
            ))),
        }
    }
}

/// Resolved ordering for one column.
#[derive(Clone, Debug, PartialEq)]
pub enum OrderingDirective {
    Ascending,
    Descending,
    /// Records follow the position of their column value within this sequence.
    Custom(Vec<Value>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct OrderClause {
    pub column: String,
    pub directive: OrderingDirective,
}

/// `column IN (values)`; an empty value list matches nothing.
#[derive(Clone, Debug, PartialEq)]
pub struct InFilter {
    pub column: String,
    pub values: Vec<Value>,
}

/// Tag each row with the index of the first `sequence` value equal to its `column` value.
/// The engine does the comparison so it follows the column's own equality.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupClause {
    pub column: String,
    pub sequence: Vec<Value>,
}

/// Single-table read handed to a [`crate::source::RecordSource`].
#[derive(Clone, Debug)]
pub struct SelectQuery<'a> {
    pub entity: &'a EntityDescriptor,
    pub filters: Vec<InFilter>,
    /// When false the entity's default scopes are lifted.
    pub apply_scopes: bool,
    pub order: Option<OrderClause>,
    pub group: Option<GroupClause>,
    pub limit: Option<u32>,
    pub offset: Option<u64>,
}

impl<'a> SelectQuery<'a> {
    pub fn new(entity: &'a EntityDescriptor) -> Self {
        SelectQuery {
            entity,
            filters: Vec::new(),
            apply_scopes: true,
            order: None,
            group: None,
            limit: None,
            offset: None,
        }
    }

    /// Add every request filter as an IN predicate, typing literals by column.
    pub fn with_filters(mut self, filters: &RequestFilters) -> Self {
        for (column, raw) in filters.iter() {
            let info = self.entity.column(column);
            self.filters.push(InFilter {
                column: column.to_string(),
                values: raw.iter().map(|s| typed_value(info, s)).collect(),
            });
        }
        self
    }
}

/// Drop hidden columns from every record.
pub fn strip_hidden(entity: &EntityDescriptor, records: &mut [Record]) {
    if entity.hidden_columns.is_empty() {
        return;
    }
    for r in records.iter_mut() {
        r.retain(|k, _| !entity.hidden_columns.contains(k));
    }
}
