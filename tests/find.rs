mod common;

use batching_routes::{AppError, BatchingRequest, Caller, FindResolver, MemoryRecordSource, RawParams};
use common::{fixture, fixture_with, ids, rows, users, Fixture};

fn req(table: &str, pairs: &[(&str, &str)]) -> BatchingRequest {
    BatchingRequest::new(table, RawParams::from_pairs(pairs.iter().copied()))
}

async fn run(f: &Fixture, req: &BatchingRequest) -> Result<Vec<serde_json::Map<String, serde_json::Value>>, AppError> {
    FindResolver::new(&f.state.registry, &f.state.policy, f.state.source.as_ref())
        .find(req)
        .await
}

fn post_sorting() -> Fixture {
    fixture_with(
        MemoryRecordSource::new()
            .with_table("tables", rows())
            .with_table("users", users())
            .without_native_ordering(),
    )
}

#[tokio::test]
async fn unknown_table_is_not_found_naming_resource() {
    let f = fixture();
    let err = run(&f, &req("ghosts", &[])).await.unwrap_err();
    assert!(matches!(&err, AppError::NotFound(m) if m.contains("ghosts")));
    assert_eq!(f.source.fetch_count(), 0);
}

#[tokio::test]
async fn no_filters_sorts_ascending_by_first_column() {
    for f in [fixture(), post_sorting()] {
        let out = run(&f, &req("tables", &[])).await.unwrap();
        assert_eq!(ids(&out), vec![1, 2, 3]);
    }
}

#[tokio::test]
async fn filter_without_direction_mirrors_value_order() {
    for f in [fixture(), post_sorting()] {
        let out = run(&f, &req("tables", &[("id", "3,2,1")])).await.unwrap();
        assert_eq!(ids(&out), vec![3, 2, 1]);
    }
}

#[tokio::test]
async fn explicit_desc_ignores_filter_order() {
    for f in [fixture(), post_sorting()] {
        let out = run(&f, &req("tables", &[("id", "3,1,2"), ("order_by_direction", "DESC")]))
            .await
            .unwrap();
        assert_eq!(ids(&out), vec![3, 2, 1]);
    }
}

#[tokio::test]
async fn explicit_order_field_with_custom() {
    let f = fixture();
    let out = run(
        &f,
        &req("tables", &[("name", "Foo"), ("id", "2,3,1"), ("order_by_field", "id")]),
    )
    .await
    .unwrap();
    assert_eq!(ids(&out), vec![2, 3, 1]);
}

#[tokio::test]
async fn unknown_order_field_is_invalid_argument() {
    let f = fixture();
    let err = run(&f, &req("tables", &[("order_by_field", "colour")])).await.unwrap_err();
    assert!(matches!(&err, AppError::InvalidArgument(m) if m.contains("colour") && m.contains("tables")));
    assert_eq!(f.source.fetch_count(), 0);
}

#[tokio::test]
async fn custom_with_empty_values_is_unprocessable() {
    let f = fixture();
    let err = run(&f, &req("tables", &[("id", ""), ("order_by_direction", "CUSTOM")]))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unprocessable(_)));
    assert_eq!(f.source.fetch_count(), 0);
}

#[tokio::test]
async fn custom_without_filter_is_invalid_argument() {
    let f = fixture();
    let err = run(&f, &req("tables", &[("order_by_direction", "CUSTOM")])).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidArgument(_)));
}

#[tokio::test]
async fn control_params_are_validated() {
    let f = fixture();
    for pairs in [[("limit", "5000")], [("page", "0")], [("order_by_direction", "RANDOM")]] {
        let err = run(&f, &req("tables", &pairs)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}

#[tokio::test]
async fn pagination_applies_limit_and_offset() {
    let f = fixture();
    let out = run(&f, &req("tables", &[("limit", "1"), ("page", "2")])).await.unwrap();
    assert_eq!(ids(&out), vec![2]);
    let out = run(&f, &req("tables", &[("limit", "0")])).await.unwrap();
    assert!(out.is_empty());
}

#[tokio::test]
async fn scopes_apply_without_bypass_signal() {
    let f = fixture();
    let out = run(&f, &req("tables", &[("id", "3")]).with_caller(Caller::bearer("root")))
        .await
        .unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(f.gate.checks(), 0);
}

#[tokio::test]
async fn bypass_signal_checks_permissions_once() {
    let f = fixture();
    let r = req("tables", &[("id", "3")]).with_caller(Caller::bearer("root")).ignoring_scopes();
    let out = run(&f, &r).await.unwrap();
    assert_eq!(out.len(), 2);
    assert_eq!(f.gate.checks(), 1);
    assert_eq!(*f.gate.guards.lock().unwrap(), vec!["viewer".to_string()]);
}

#[tokio::test]
async fn bypass_denied_keeps_scopes() {
    let f = fixture();
    let r = req("tables", &[("id", "3")]).with_caller(Caller::bearer("guest")).ignoring_scopes();
    let out = run(&f, &r).await.unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(f.gate.checks(), 1);
}

#[tokio::test]
async fn without_scopes_query_flag_is_a_bypass_signal() {
    let f = fixture();
    let r = req("tables", &[("id", "3"), ("without_scopes", "true")]).with_caller(Caller::bearer("root"));
    let out = run(&f, &r).await.unwrap();
    assert_eq!(out.len(), 2);
}

#[tokio::test]
async fn hidden_columns_are_stripped() {
    let f = fixture();
    let out = run(&f, &req("users", &[]).with_caller(Caller::bearer("any"))).await.unwrap();
    assert_eq!(ids(&out), vec![1, 2]);
    assert!(out.iter().all(|r| !r.contains_key("password")));
}

#[tokio::test]
async fn authenticated_entity_rejects_anonymous() {
    let f = fixture();
    let err = run(&f, &req("users", &[])).await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
    assert_eq!(f.source.fetch_count(), 0);
}
