//! Find: parse params, resolve the order column, pick the ordering, execute, post-sort.

use crate::access::AccessPolicy;
use crate::config::{EntityDescriptor, EntityRegistry};
use crate::error::AppError;
use crate::query::{
    sort_records, strip_hidden, typed_value, FindParams, OrderClause, OrderDirection, OrderingDirective, Record,
    SelectQuery,
};
use crate::service::BatchingRequest;
use crate::source::RecordSource;

pub struct FindResolver<'a> {
    registry: &'a EntityRegistry,
    policy: &'a AccessPolicy,
    source: &'a dyn RecordSource,
}

impl<'a> FindResolver<'a> {
    pub fn new(registry: &'a EntityRegistry, policy: &'a AccessPolicy, source: &'a dyn RecordSource) -> Self {
        FindResolver {
            registry,
            policy,
            source,
        }
    }

    pub async fn find(&self, req: &BatchingRequest) -> Result<Vec<Record>, AppError> {
        let entity = self.registry.resolve(&req.table)?;
        self.policy.ensure_authenticated(entity, &req.caller)?;
        let params = FindParams::parse(&req.params)?;
        let order = plan_order(entity, &params)?;

        let bypass = self
            .policy
            .should_bypass_scopes(entity, &req.caller, req.ignore_scopes || params.without_scopes);

        let mut query = SelectQuery::new(entity).with_filters(&params.filters);
        query.apply_scopes = !bypass;
        query.limit = Some(params.pagination.limit);
        query.offset = Some(params.pagination.offset());
        query.order = Some(order.clone());
        tracing::debug!(
            table = %entity.table_name,
            order_column = %order.column,
            order = ?order.directive,
            filters = params.filters.len(),
            bypass,
            "find resolved"
        );

        let mut records = self.source.fetch(&query).await?;
        if !self.source.orders_natively() {
            sort_records(&mut records, &order);
        }
        strip_hidden(entity, &mut records);
        Ok(records)
    }
}

/// Validate filter and order columns, then choose the ordering.
///
/// Without `order_by_field` the first filter key is used, or the first column when no filters
/// are given. Without `order_by_direction`, filters imply CUSTOM and no filters imply ASC.
pub fn plan_order(entity: &EntityDescriptor, params: &FindParams) -> Result<OrderClause, AppError> {
    for (column, _) in params.filters.iter() {
        if !entity.has_column(column) {
            return Err(AppError::InvalidArgument(format!(
                "filter '{}' is not a column of table {}",
                column, entity.table_name
            )));
        }
    }

    let column = match &params.order_by_field {
        Some(field) if entity.has_column(field) => field.clone(),
        Some(field) => {
            return Err(AppError::InvalidArgument(format!(
                "order_by_field '{}' is not a column of table {}",
                field, entity.table_name
            )))
        }
        None => params
            .filters
            .first_key()
            .or_else(|| entity.first_column())
            .map(str::to_string)
            .ok_or_else(|| AppError::InvalidArgument(format!("table {} has no columns", entity.table_name)))?,
    };

    let direction = params.order_by_direction.unwrap_or(if params.filters.is_empty() {
        OrderDirection::Asc
    } else {
        OrderDirection::Custom
    });

    let directive = match direction {
        OrderDirection::Asc => OrderingDirective::Ascending,
        OrderDirection::Desc => OrderingDirective::Descending,
        OrderDirection::Custom => {
            let values = params.filters.get(&column).ok_or_else(|| {
                AppError::InvalidArgument(format!(
                    "CUSTOM ordering by '{}' on table {} needs a '{}' filter",
                    column, entity.table_name, column
                ))
            })?;
            if values.is_empty() {
                return Err(AppError::Unprocessable(format!(
                    "CUSTOM ordering by '{}' on table {} needs at least one value",
                    column, entity.table_name
                )));
            }
            let info = entity.column(&column);
            OrderingDirective::Custom(values.iter().map(|s| typed_value(info, s)).collect())
        }
    };

    Ok(OrderClause { column, directive })
}
