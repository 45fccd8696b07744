//! Deferred global secondary index deployment
//!
//! The table service accepts at most one new global secondary index per table
//! update, and rejects attribute definitions that no key schema uses. A
//! template that declares several indexes therefore cannot be applied in one
//! step. This crate splits the work into two phases:
//!
//! 1. [`extract`]: before deployment, remove every table's
//!    `GlobalSecondaryIndexes` (and the attribute definitions only they use)
//!    from the template, returning one [`TableIndexPlan`] per table.
//! 2. [`reconcile`]: after deployment, create the deferred indexes one at a
//!    time through a [`TableStore`], waiting for each to become active before
//!    requesting the next.
//!
//! The plans are plain values: the caller threads them from the first phase
//! to the second (in memory, or through a plan file).
//!
//! # Implementations
//!
//! - [`MemoryTableStore`]: In-memory table store for testing
//! - `DynamoDbTableStore` (in `gsi-deploy-aws`): the real service

mod backoff;
pub mod catalog;
pub mod config;
mod error;
pub mod extract;
pub mod memory;
pub mod model;
pub mod reconcile;
pub mod store;
pub mod template;

pub use catalog::AttributeCatalog;
pub use config::{FailurePolicy, PollBackoff, ReconcileConfig};
pub use error::{GsiError, Result};
pub use extract::{extract, IndexPlanExtractor};
pub use memory::{MemoryTableStore, StoreCall};
pub use model::{
    AttributeDefinition, AttributeType, IndexSpec, KeySchemaElement, KeyType, Projection,
    ProjectionType, ProvisionedThroughput, TableIndexPlan,
};
pub use reconcile::{
    reconcile, CancelHandle, CancelSignal, IndexOutcome, IndexState, ReconcileReport,
    ReconciliationEngine, SkipReason, TableReport,
};
pub use store::{
    CreateIndexRequest, IndexDescription, IndexStatus, TableDescription, TableStatus, TableStore,
};
pub use template::Template;
