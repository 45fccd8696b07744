//! DynamoDB table store implementation
//!
//! Provides `DynamoDbTableStore`, which implements `TableStore` on top of the
//! `DescribeTable` and `UpdateTable` operations.

mod convert;

use crate::error::AwsStoreError;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::Client;
use aws_smithy_types::timeout::TimeoutConfig;
use gsi_deploy_core::{CreateIndexRequest, Result, TableDescription, TableStore};
use std::time::Duration;

/// DynamoDB table store configuration
#[derive(Debug, Clone, Default)]
pub struct DynamoDbConfig {
    /// AWS region (optional, uses SDK default if not specified)
    pub region: Option<String>,
    /// Optional endpoint override (e.g. LocalStack)
    pub endpoint: Option<String>,
    /// Timeout in milliseconds
    pub timeout_ms: Option<u64>,
}

impl DynamoDbConfig {
    pub fn for_region(region: impl Into<String>) -> Self {
        Self {
            region: Some(region.into()),
            ..Self::default()
        }
    }
}

/// DynamoDB-backed table store
#[derive(Clone)]
pub struct DynamoDbTableStore {
    client: Client,
    region: Option<String>,
}

impl std::fmt::Debug for DynamoDbTableStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamoDbTableStore")
            .field("region", &self.region)
            .finish()
    }
}

impl DynamoDbTableStore {
    /// Create a table store from a loaded SDK configuration
    ///
    /// Configuration:
    /// - `region`: Override SDK region (uses SDK default if not specified)
    /// - `endpoint`: Override the service endpoint
    /// - `timeout_ms`: Operation timeout in milliseconds
    pub fn new(sdk_config: &aws_config::SdkConfig, config: DynamoDbConfig) -> Self {
        // Inherit HTTP client, retry config, credentials and sleep impl
        let mut builder = aws_sdk_dynamodb::config::Builder::from(sdk_config);

        if let Some(region) = config.region.clone() {
            builder = builder.region(aws_sdk_dynamodb::config::Region::new(region));
        }

        if let Some(endpoint) = config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        if let Some(timeout_ms) = config.timeout_ms {
            let timeout_config = TimeoutConfig::builder()
                .operation_timeout(Duration::from_millis(timeout_ms))
                .build();
            builder = builder.timeout_config(timeout_config);
        }

        let region = config
            .region
            .or_else(|| sdk_config.region().map(|r| r.to_string()));

        Self {
            client: Client::from_conf(builder.build()),
            region,
        }
    }

    /// Load the default credential chain and build a store from it
    pub async fn connect(config: DynamoDbConfig) -> Self {
        let sdk_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
        Self::new(&sdk_config, config)
    }

    /// Create from a pre-built client (for testing)
    pub fn from_client(client: Client) -> Self {
        Self {
            client,
            region: None,
        }
    }

    /// Region requests are sent to, if known
    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }
}

#[async_trait]
impl TableStore for DynamoDbTableStore {
    async fn describe_table(&self, table_name: &str) -> Result<TableDescription> {
        let output = self
            .client
            .describe_table()
            .table_name(table_name)
            .send()
            .await
            .map_err(|e| AwsStoreError::from_sdk("DescribeTable", e))?;

        let table = output.table().ok_or_else(|| {
            AwsStoreError::response(format!(
                "DescribeTable returned no description for '{}'",
                table_name
            ))
        })?;

        Ok(convert::table_from_sdk(table_name, table))
    }

    async fn update_table(&self, request: &CreateIndexRequest) -> Result<TableDescription> {
        let attribute_definitions = request
            .attribute_definitions
            .iter()
            .map(convert::attribute_definition_to_sdk)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let update = convert::create_action(&request.index)?;

        tracing::debug!(
            table = %request.table_name,
            index = %request.index.index_name,
            attributes = attribute_definitions.len(),
            "UpdateTable"
        );

        let output = self
            .client
            .update_table()
            .table_name(&request.table_name)
            .set_attribute_definitions(Some(attribute_definitions))
            .global_secondary_index_updates(update)
            .send()
            .await
            .map_err(|e| AwsStoreError::from_sdk("UpdateTable", e))?;

        let table = output.table_description().ok_or_else(|| {
            AwsStoreError::response(format!(
                "UpdateTable returned no description for '{}'",
                request.table_name
            ))
        })?;

        Ok(convert::table_from_sdk(&request.table_name, table))
    }
}
