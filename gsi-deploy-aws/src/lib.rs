//! DynamoDB backend for deferred global secondary index deployment
//!
//! Provides [`DynamoDbTableStore`], a [`TableStore`] that talks to the real
//! service, and [`reconcile_in_region`] for the common case of reconciling a
//! set of plans against one region with the default credential chain.

pub mod dynamodb;
pub mod error;

pub use dynamodb::{DynamoDbConfig, DynamoDbTableStore};
pub use error::{AwsStoreError, Result};

use gsi_deploy_core::{CancelSignal, ReconcileConfig, ReconcileReport, TableIndexPlan, TableStore};
use std::sync::Arc;

/// Reconcile `plans` against the tables in `region`
pub async fn reconcile_in_region(
    plans: &[TableIndexPlan],
    region: &str,
    config: ReconcileConfig,
    cancel: &CancelSignal,
) -> gsi_deploy_core::Result<ReconcileReport> {
    let store = DynamoDbTableStore::connect(DynamoDbConfig::for_region(region)).await;
    let store: Arc<dyn TableStore> = Arc::new(store);
    gsi_deploy_core::reconcile(store, plans, config, cancel).await
}
