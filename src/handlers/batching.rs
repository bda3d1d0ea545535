//! Batching handlers: `GET /{table}` and `GET /grouped/{table}`.

use crate::access::Caller;
use crate::error::AppError;
use crate::extractors::IgnoreScopes;
use crate::query::{RawParams, Record};
use crate::service::{BatchingRequest, FindResolver, GroupedResolver};
use crate::state::AppState;
use axum::{
    extract::{Path, RawQuery, State},
    Json,
};

fn request(table: String, query: Option<String>, caller: Caller, ignore: bool) -> Result<BatchingRequest, AppError> {
    Ok(BatchingRequest {
        table,
        params: RawParams::parse(query.as_deref())?,
        caller,
        ignore_scopes: ignore,
    })
}

pub async fn find(
    State(state): State<AppState>,
    Path(table): Path<String>,
    caller: Caller,
    IgnoreScopes(ignore): IgnoreScopes,
    RawQuery(query): RawQuery,
) -> Result<Json<Vec<Record>>, AppError> {
    let req = request(table, query, caller, ignore)?;
    let rows = FindResolver::new(&state.registry, &state.policy, state.source.as_ref())
        .find(&req)
        .await?;
    Ok(Json(rows))
}

pub async fn find_grouped(
    State(state): State<AppState>,
    Path(table): Path<String>,
    caller: Caller,
    IgnoreScopes(ignore): IgnoreScopes,
    RawQuery(query): RawQuery,
) -> Result<Json<Vec<Vec<Record>>>, AppError> {
    let req = request(table, query, caller, ignore)?;
    let groups = GroupedResolver::new(&state.registry, &state.policy, state.source.as_ref())
        .find_grouped(&req)
        .await?;
    Ok(Json(groups))
}
