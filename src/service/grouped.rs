//! Find grouped: every parameter is an IN filter; rows are grouped by the first parameter's
//! column and the groups follow that parameter's value order.

use crate::access::AccessPolicy;
use crate::config::EntityRegistry;
use crate::error::AppError;
use crate::query::{canonical_key, group_by_slot, strip_hidden, typed_value, GroupClause, Record, SelectQuery};
use std::collections::HashSet;
use crate::service::BatchingRequest;
use crate::source::RecordSource;

pub struct GroupedResolver<'a> {
    registry: &'a EntityRegistry,
    policy: &'a AccessPolicy,
    source: &'a dyn RecordSource,
}

impl<'a> GroupedResolver<'a> {
    pub fn new(registry: &'a EntityRegistry, policy: &'a AccessPolicy, source: &'a dyn RecordSource) -> Self {
        GroupedResolver {
            registry,
            policy,
            source,
        }
    }

    pub async fn find_grouped(&self, req: &BatchingRequest) -> Result<Vec<Vec<Record>>, AppError> {
        let entity = self.registry.resolve(&req.table)?;
        self.policy.ensure_authenticated(entity, &req.caller)?;
        let bypass = self.policy.should_bypass_scopes(entity, &req.caller, req.ignore_scopes);

        let filters = req.params.filters_excluding(&[]);
        let Some(key) = filters.first_key() else {
            return Ok(Vec::new());
        };
        let info = entity.column(key);
        // Repeated literals collapse onto their first position.
        let mut seen = HashSet::new();
        let sequence: Vec<_> = filters
            .get(key)
            .unwrap_or_default()
            .iter()
            .map(|s| typed_value(info, s))
            .filter(|v| seen.insert(canonical_key(v)))
            .collect();
        let group_count = sequence.len();

        let mut query = SelectQuery::new(entity).with_filters(&filters);
        query.apply_scopes = !bypass;
        query.group = Some(GroupClause {
            column: key.to_string(),
            sequence,
        });
        tracing::debug!(table = %entity.table_name, group_by = %key, groups = group_count, bypass, "find grouped resolved");

        let records = self.source.fetch(&query).await?;
        let mut groups = group_by_slot(records, group_count);
        for g in &mut groups {
            strip_hidden(entity, g);
        }
        Ok(groups)
    }
}
