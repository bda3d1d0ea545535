//! Renders a [`SelectQuery`] as parameterised PostgreSQL.

use crate::config::EntityDescriptor;
use crate::config::ScopeCondition;
use crate::query::{OrderingDirective, SelectQuery, GROUP_SLOT};
use serde_json::Value;

/// Quote identifier for PostgreSQL (safe: names come from the registry or are escaped).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Full qualified table name.
fn qualified_table(schema: &str, table: &str) -> String {
    format!("{}.{}", quoted(schema), quoted(table))
}

#[derive(Debug, Default)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf::default()
    }

    fn push_param(&mut self, v: Value) -> u32 {
        let n = self.params.len() as u32 + 1;
        self.params.push(v);
        n
    }

    /// Push a value and return its placeholder, cast to the column type when known.
    /// Untyped columns are compared as text (see [`compared`]), so the value is bound as text.
    fn placeholder(&mut self, entity: &EntityDescriptor, column: &str, v: Value) -> String {
        match column_type(entity, column) {
            Some(t) => format!("${}::{}", self.push_param(v), t),
            None => format!("${}", self.push_param(Value::String(pg_text(&v)))),
        }
    }
}

fn column_type<'e>(entity: &'e EntityDescriptor, column: &str) -> Option<&'e str> {
    entity.column(column).and_then(|c| c.pg_type.as_deref())
}

/// Column as the left side of a comparison: `"col"`, or `"col"::text` when its type is unknown.
fn compared(entity: &EntityDescriptor, column: &str, col: String) -> String {
    match column_type(entity, column) {
        Some(_) => col,
        None => format!("{}::text", col),
    }
}

/// Text PostgreSQL prints for a value of this JSON shape.
fn pg_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// SELECT list: each column as-is, except custom enum (schema.typename) and numeric as col::text so rows decode as strings.
/// The text aliases shadow the column names, so ORDER BY must use the qualified column.
fn select_column_list(entity: &EntityDescriptor) -> String {
    entity
        .columns
        .iter()
        .map(|c| {
            let q = quoted(&c.name);
            let pg_type = c.pg_type.as_deref().unwrap_or("");
            if pg_type.contains('.') || pg_type == "numeric" {
                format!("{}::text AS {}", q, q)
            } else {
                q
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// `CASE col WHEN $a THEN 0 WHEN $b THEN 1 ...` over a value sequence, without the END.
fn case_positions(q: &mut QueryBuf, entity: &EntityDescriptor, column: &str, expr: &str, values: &[Value]) -> String {
    let whens: Vec<String> = values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let ph = q.placeholder(entity, column, v.clone());
            format!("WHEN {} THEN {}", ph, i)
        })
        .collect();
    format!("CASE {} {}", compared(entity, column, expr.to_string()), whens.join(" "))
}

/// SELECT cols [, group slot] FROM table [WHERE filters AND scopes] [ORDER BY ...] [LIMIT n] [OFFSET m].
/// Custom ordering becomes `CASE col WHEN $a THEN 0 WHEN $b THEN 1 ... ELSE n END`.
pub fn select(query: &SelectQuery<'_>) -> QueryBuf {
    let entity = query.entity;
    let mut q = QueryBuf::new();
    let table = qualified_table(&entity.schema_name, &entity.table_name);

    let mut where_parts = Vec::new();
    for f in &query.filters {
        if f.values.is_empty() {
            where_parts.push("FALSE".to_string());
            continue;
        }
        let placeholders: Vec<String> = f
            .values
            .iter()
            .map(|v| q.placeholder(entity, &f.column, v.clone()))
            .collect();
        where_parts.push(format!(
            "{} IN ({})",
            compared(entity, &f.column, quoted(&f.column)),
            placeholders.join(", ")
        ));
    }
    if query.apply_scopes {
        for scope in &entity.scopes {
            match &scope.condition {
                ScopeCondition::Equals(v) => {
                    let ph = q.placeholder(entity, &scope.column, v.clone());
                    where_parts.push(format!("{} = {}", compared(entity, &scope.column, quoted(&scope.column)), ph));
                }
                ScopeCondition::IsNull => where_parts.push(format!("{} IS NULL", quoted(&scope.column))),
            }
        }
    }
    let where_clause = if where_parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", where_parts.join(" AND "))
    };

    let order_clause = match &query.order {
        None => String::new(),
        Some(order) => {
            let col = format!("{}.{}", table, quoted(&order.column));
            match &order.directive {
                OrderingDirective::Ascending => format!(" ORDER BY {} ASC", col),
                OrderingDirective::Descending => format!(" ORDER BY {} DESC", col),
                OrderingDirective::Custom(values) => {
                    let case = case_positions(&mut q, entity, &order.column, &col, values);
                    format!(" ORDER BY {} ELSE {} END", case, values.len())
                }
            }
        }
    };
    let mut columns = select_column_list(entity);
    if let Some(group) = &query.group {
        let slot = if group.sequence.is_empty() {
            "NULL::int4".to_string()
        } else {
            let col = format!("{}.{}", table, quoted(&group.column));
            format!("{} END", case_positions(&mut q, entity, &group.column, &col, &group.sequence))
        };
        columns.push_str(&format!(", {} AS {}", slot, quoted(GROUP_SLOT)));
    }
    let limit_clause = query.limit.map(|n| format!(" LIMIT {}", n)).unwrap_or_default();
    let offset_clause = query.offset.map(|n| format!(" OFFSET {}", n)).unwrap_or_default();

    q.sql = format!(
        "SELECT {} FROM {}{}{}{}{}",
        columns,
        table,
        where_clause,
        order_clause,
        limit_clause,
        offset_clause
    );
    q
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScopeFilter;
    use crate::query::{GroupClause, InFilter, OrderClause};
    use serde_json::json;

    fn orders() -> EntityDescriptor {
        let mut e = EntityDescriptor::new("orders", &["id", "total", "deleted_at"]);
        e.columns[0].pg_type = Some("int8".into());
        e.columns[1].pg_type = Some("numeric".into());
        e.scopes.push(ScopeFilter {
            name: "live".into(),
            column: "deleted_at".into(),
            condition: ScopeCondition::IsNull,
        });
        e
    }

    #[test]
    fn plain_ascending_page() {
        let e = orders();
        let mut query = SelectQuery::new(&e);
        query.order = Some(OrderClause { column: "id".into(), directive: OrderingDirective::Ascending });
        query.limit = Some(10);
        query.offset = Some(20);
        let q = select(&query);
        assert_eq!(
            q.sql,
            "SELECT \"id\", \"total\"::text AS \"total\", \"deleted_at\" FROM \"public\".\"orders\" \
             WHERE \"deleted_at\" IS NULL ORDER BY \"public\".\"orders\".\"id\" ASC LIMIT 10 OFFSET 20"
        );
        assert!(q.params.is_empty());
    }

    #[test]
    fn custom_order_binds_sequence() {
        let e = orders();
        let mut query = SelectQuery::new(&e);
        query.apply_scopes = false;
        query.filters.push(InFilter { column: "id".into(), values: vec![json!(3), json!(2), json!(1)] });
        query.order = Some(OrderClause {
            column: "id".into(),
            directive: OrderingDirective::Custom(vec![json!(3), json!(2), json!(1)]),
        });
        let q = select(&query);
        assert!(q.sql.contains("WHERE \"id\" IN ($1::int8, $2::int8, $3::int8)"));
        assert!(q
            .sql
            .ends_with("ORDER BY CASE \"public\".\"orders\".\"id\" WHEN $4::int8 THEN 0 WHEN $5::int8 THEN 1 WHEN $6::int8 THEN 2 ELSE 3 END"));
        assert!(!q.sql.contains("IS NULL"));
        assert_eq!(q.params.len(), 6);
    }

    #[test]
    fn empty_in_matches_nothing() {
        let e = orders();
        let mut query = SelectQuery::new(&e);
        query.apply_scopes = false;
        query.filters.push(InFilter { column: "id".into(), values: vec![] });
        assert!(select(&query).sql.contains("WHERE FALSE"));
    }

    #[test]
    fn untrusted_identifier_is_escaped() {
        let e = orders();
        let mut query = SelectQuery::new(&e);
        query.apply_scopes = false;
        query.filters.push(InFilter { column: "a\"b".into(), values: vec![json!("x")] });
        assert!(select(&query).sql.contains("\"a\"\"b\"::text IN ($1)"));
    }

    #[test]
    fn numeric_sort_uses_the_column_not_its_text_alias() {
        let e = orders();
        let mut query = SelectQuery::new(&e);
        query.apply_scopes = false;
        query.order = Some(OrderClause { column: "total".into(), directive: OrderingDirective::Descending });
        let sql = select(&query).sql;
        assert!(sql.contains("\"total\"::text AS \"total\""));
        assert!(sql.ends_with("ORDER BY \"public\".\"orders\".\"total\" DESC"));
    }

    #[test]
    fn untyped_column_compares_as_text() {
        let mut e = orders();
        e.columns.push(crate::config::ColumnInfo { name: "flag".into(), pg_type: None });
        e.scopes[0] = ScopeFilter {
            name: "flagged".into(),
            column: "flag".into(),
            condition: ScopeCondition::Equals(json!(true)),
        };
        let mut query = SelectQuery::new(&e);
        query.filters.push(InFilter { column: "flag".into(), values: vec![json!("true"), json!(false)] });
        let q = select(&query);
        assert!(q.sql.contains("WHERE \"flag\"::text IN ($1, $2) AND \"flag\"::text = $3"));
        assert_eq!(q.params, vec![json!("true"), json!("false"), json!("true")]);
    }

    #[test]
    fn group_slot_is_computed_by_the_engine() {
        let e = orders();
        let mut query = SelectQuery::new(&e);
        query.apply_scopes = false;
        query.filters.push(InFilter { column: "total".into(), values: vec![json!("12.5"), json!("9")] });
        query.group = Some(GroupClause { column: "total".into(), sequence: vec![json!("12.5"), json!("9")] });
        let q = select(&query);
        assert!(q.sql.contains(
            ", CASE \"public\".\"orders\".\"total\" WHEN $3::numeric THEN 0 WHEN $4::numeric THEN 1 END AS \"__group_slot\" FROM"
        ));
        assert!(q.sql.contains("WHERE \"total\" IN ($1::numeric, $2::numeric)"));
        assert_eq!(q.params.len(), 4);

        query.group = Some(GroupClause { column: "total".into(), sequence: vec![] });
        assert!(select(&query).sql.contains(", NULL::int4 AS \"__group_slot\" FROM"));
    }
}
