//! Both phases together: strip indexes from a template, then create them
//! through the in-memory table store the way a deployment would.

use gsi_deploy_core::{
    extract, CancelSignal, FailurePolicy, GsiError, IndexState, MemoryTableStore,
    ReconcileConfig, ReconciliationEngine, SkipReason, StoreCall, TableIndexPlan, TableStore,
    Template,
};
use serde_json::json;
use std::sync::Arc;

fn template() -> Template {
    Template::new(json!({
        "Resources": {
            "Orders": {
                "Type": "AWS::DynamoDB::Table",
                "Properties": {
                    "TableName": "orders",
                    "AttributeDefinitions": [
                        {"AttributeName": "id", "AttributeType": "S"},
                        {"AttributeName": "status", "AttributeType": "S"},
                        {"AttributeName": "createdAt", "AttributeType": "N"}
                    ],
                    "KeySchema": [{"AttributeName": "id", "KeyType": "HASH"}],
                    "GlobalSecondaryIndexes": [
                        {
                            "IndexName": "status-index",
                            "KeySchema": [{"AttributeName": "status", "KeyType": "HASH"}],
                            "Projection": {"ProjectionType": "ALL"}
                        },
                        {
                            "IndexName": "recent-index",
                            "KeySchema": [
                                {"AttributeName": "status", "KeyType": "HASH"},
                                {"AttributeName": "createdAt", "KeyType": "RANGE"}
                            ],
                            "Projection": {"ProjectionType": "KEYS_ONLY"}
                        }
                    ]
                }
            },
            "Customers": {
                "Type": "AWS::DynamoDB::Table",
                "Properties": {
                    "TableName": "customers",
                    "AttributeDefinitions": [
                        {"AttributeName": "id", "AttributeType": "S"},
                        {"AttributeName": "email", "AttributeType": "S"}
                    ],
                    "KeySchema": [{"AttributeName": "id", "KeyType": "HASH"}],
                    "GlobalSecondaryIndexes": [
                        {
                            "IndexName": "email-index",
                            "KeySchema": [{"AttributeName": "email", "KeyType": "HASH"}],
                            "Projection": {"ProjectionType": "ALL"}
                        }
                    ]
                }
            }
        }
    }))
}

fn deployed_store() -> MemoryTableStore {
    let store = MemoryTableStore::new().with_activation_delay(Some(2));
    store.create_table("orders");
    store.create_table("customers");
    store
}

fn engine(store: &MemoryTableStore, config: ReconcileConfig) -> ReconciliationEngine {
    let store: Arc<dyn TableStore> = Arc::new(store.clone());
    ReconciliationEngine::new(store, config)
}

fn extracted() -> Vec<TableIndexPlan> {
    let mut template = template();
    extract(&mut template).unwrap()
}

#[tokio::test(start_paused = true)]
async fn every_deferred_index_ends_up_on_its_table() {
    let plans = extracted();
    let store = deployed_store();

    let report = engine(&store, ReconcileConfig::default())
        .reconcile(&plans, &CancelSignal::never())
        .await
        .unwrap();

    assert!(!report.cancelled);
    assert!(!report.has_failures());
    let orders = report.table("orders").unwrap();
    assert_eq!(orders.state_of("status-index"), Some(&IndexState::Active));
    assert_eq!(orders.state_of("recent-index"), Some(&IndexState::Submitted));
    assert_eq!(
        report.table("customers").unwrap().state_of("email-index"),
        Some(&IndexState::Submitted)
    );
    assert_eq!(
        store.created_index_names(),
        vec!["status-index", "recent-index", "email-index"]
    );
}

#[tokio::test(start_paused = true)]
async fn create_calls_carry_the_full_required_set() {
    let plans = extracted();
    let store = deployed_store();

    engine(&store, ReconcileConfig::default())
        .reconcile(&plans, &CancelSignal::never())
        .await
        .unwrap();

    let orders_calls: Vec<_> = store
        .create_calls()
        .into_iter()
        .filter(|c| c.table_name == "orders")
        .collect();
    assert_eq!(orders_calls.len(), 2);
    for call in &orders_calls {
        assert_eq!(call.attribute_definitions, plans[0].required_attributes);
    }
}

#[tokio::test(start_paused = true)]
async fn next_create_waits_for_previous_index_to_turn_active() {
    let plans = extracted();
    let store = deployed_store();

    engine(&store, ReconcileConfig::default())
        .reconcile(&plans[..1], &CancelSignal::never())
        .await
        .unwrap();

    // create, two describes until ACTIVE, then the next describe + create
    let calls = store.calls();
    let second_create = calls
        .iter()
        .rposition(|c| matches!(c, StoreCall::Create(_)))
        .unwrap();
    let describes_before = calls[..second_create]
        .iter()
        .filter(|c| matches!(c, StoreCall::Describe { .. }))
        .count();
    assert!(describes_before >= 3, "calls: {:?}", calls);
}

#[tokio::test(start_paused = true)]
async fn rerun_after_partial_failure_resumes() {
    let plans = extracted();
    let store = deployed_store();
    store.fail_next_create("recent-index", GsiError::throttled("slow down"));

    let err = engine(&store, ReconcileConfig::default())
        .reconcile(&plans, &CancelSignal::never())
        .await
        .unwrap_err();
    assert_eq!(err.index_name(), Some("recent-index"));
    assert!(matches!(err.root(), GsiError::Throttled(_)));

    let report = engine(&store, ReconcileConfig::default())
        .reconcile(&plans, &CancelSignal::never())
        .await
        .unwrap();
    let orders = report.table("orders").unwrap();
    assert_eq!(
        orders.state_of("status-index"),
        Some(&IndexState::Skipped(SkipReason::AlreadyExists))
    );
    assert_eq!(orders.state_of("recent-index"), Some(&IndexState::Submitted));
    assert_eq!(
        store.created_index_names(),
        vec!["status-index", "recent-index", "recent-index", "email-index"]
    );
}

#[tokio::test(start_paused = true)]
async fn isolated_table_failure_leaves_other_tables_done() {
    let plans = extracted();
    let store = MemoryTableStore::new().with_activation_delay(Some(1));
    store.create_table("customers");

    let config = ReconcileConfig::default().with_failure_policy(FailurePolicy::IsolateTables);
    let report = engine(&store, config)
        .reconcile(&plans, &CancelSignal::never())
        .await
        .unwrap();

    let orders = report.table("orders").unwrap();
    assert!(orders.error.is_some());
    assert_eq!(orders.state_of("recent-index"), Some(&IndexState::NotAttempted));
    assert_eq!(
        report.table("customers").unwrap().state_of("email-index"),
        Some(&IndexState::Submitted)
    );
}

#[test]
fn plans_survive_a_plan_file() {
    let plans = extracted();
    let written = serde_json::to_string_pretty(&plans).unwrap();
    let read: Vec<TableIndexPlan> = serde_json::from_str(&written).unwrap();
    assert_eq!(read, plans);
}
