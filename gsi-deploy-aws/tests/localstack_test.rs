//! Opt-in infra tests that boot LocalStack via testcontainers.
//!
//! Run (requires Docker):
//!   cargo test -p gsi-deploy-aws --features localstack-tests --test localstack_test -- --nocapture

#![cfg(feature = "localstack-tests")]

use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode, KeySchemaElement, KeyType, ScalarAttributeType,
};
use gsi_deploy_aws::{DynamoDbConfig, DynamoDbTableStore};
use gsi_deploy_core::{
    extract, CancelSignal, IndexState, ReconcileConfig, ReconciliationEngine, Template, TableStore,
};
use std::sync::Arc;
use std::time::Duration;
use testcontainers::core::IntoContainerPort;
use testcontainers::{runners::AsyncRunner, GenericImage, ImageExt};

const LOCALSTACK_EDGE_PORT: u16 = 4566;
const REGION: &str = "us-east-1";

fn set_localstack_env() {
    // Dummy credentials accepted by LocalStack
    std::env::set_var("AWS_ACCESS_KEY_ID", "test");
    std::env::set_var("AWS_SECRET_ACCESS_KEY", "test");
    std::env::set_var("AWS_REGION", REGION);
    std::env::set_var("AWS_EC2_METADATA_DISABLED", "true");
}

async fn create_orders_table(client: &aws_sdk_dynamodb::Client) {
    let pk = AttributeDefinition::builder()
        .attribute_name("orderId")
        .attribute_type(ScalarAttributeType::S)
        .build()
        .unwrap();
    let key = KeySchemaElement::builder()
        .attribute_name("orderId")
        .key_type(KeyType::Hash)
        .build()
        .unwrap();

    for _ in 0..60 {
        let created = client
            .create_table()
            .table_name("orders")
            .attribute_definitions(pk.clone())
            .key_schema(key.clone())
            .billing_mode(BillingMode::PayPerRequest)
            .send()
            .await;
        if created.is_ok() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
    panic!("LocalStack did not accept CreateTable in time");
}

#[tokio::test]
async fn localstack_extract_then_reconcile() {
    let image = GenericImage::new("localstack/localstack", "latest")
        .with_exposed_port(LOCALSTACK_EDGE_PORT.tcp())
        .with_env_var("SERVICES", "dynamodb")
        .with_env_var("DEFAULT_REGION", REGION);
    let container = image
        .start()
        .await
        .expect("failed to start LocalStack; is Docker running?");
    let host_port = container
        .get_host_port_ipv4(LOCALSTACK_EDGE_PORT)
        .await
        .expect("LocalStack edge port mapped");
    let endpoint = format!("http://127.0.0.1:{}", host_port);

    set_localstack_env();
    let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let store = DynamoDbTableStore::new(
        &sdk_config,
        DynamoDbConfig {
            region: Some(REGION.to_string()),
            endpoint: Some(endpoint),
            timeout_ms: Some(10_000),
        },
    );

    let client = aws_sdk_dynamodb::Client::from_conf(
        aws_sdk_dynamodb::config::Builder::from(&sdk_config)
            .endpoint_url(format!("http://127.0.0.1:{}", host_port))
            .build(),
    );
    create_orders_table(&client).await;

    let mut template = Template::from_json_str(
        r#"{
            "Resources": {
                "Orders": {
                    "Type": "AWS::DynamoDB::Table",
                    "Properties": {
                        "TableName": "orders",
                        "AttributeDefinitions": [
                            {"AttributeName": "orderId", "AttributeType": "S"},
                            {"AttributeName": "status", "AttributeType": "S"},
                            {"AttributeName": "customerId", "AttributeType": "S"}
                        ],
                        "KeySchema": [{"AttributeName": "orderId", "KeyType": "HASH"}],
                        "GlobalSecondaryIndexes": [
                            {
                                "IndexName": "by-status",
                                "KeySchema": [{"AttributeName": "status", "KeyType": "HASH"}],
                                "Projection": {"ProjectionType": "ALL"}
                            },
                            {
                                "IndexName": "by-customer",
                                "KeySchema": [{"AttributeName": "customerId", "KeyType": "HASH"}],
                                "Projection": {"ProjectionType": "KEYS_ONLY"}
                            }
                        ]
                    }
                }
            }
        }"#,
    )
    .unwrap();
    let plans = extract(&mut template).unwrap();

    let store: Arc<dyn TableStore> = Arc::new(store);
    let config = ReconcileConfig::default()
        .with_poll_interval(Duration::from_secs(1))
        .with_max_poll_attempts(60);
    let engine = ReconciliationEngine::new(Arc::clone(&store), config);

    let report = engine
        .reconcile(&plans, &CancelSignal::never())
        .await
        .unwrap();
    let table = report.table("orders").unwrap();
    assert_eq!(table.state_of("by-status"), Some(&IndexState::Active));
    assert_eq!(table.state_of("by-customer"), Some(&IndexState::Submitted));

    let described = store.describe_table("orders").await.unwrap();
    assert!(described.index("by-status").is_some());
    assert!(described.index("by-customer").is_some());
}
