//! Index reconciliation
//!
//! Drives the table service through describe → create → poll for every
//! pending index of every [`TableIndexPlan`].
//!
//! # Per-index state machine
//!
//! ```text
//! Pending ─┬─ empty key schema ─────────────▶ Skipped(EmptyKeySchema)
//!          ├─ already in describe output ───▶ Skipped(AlreadyExists)
//!          └─ create accepted ─▶ Creating ─┬─ last index of table ─▶ Submitted
//!                                          ├─ status ACTIVE ───────▶ Active
//!                                          └─ create/poll fails ───▶ Failed (error returned)
//! ```
//!
//! # Ordering
//!
//! Within a table, indexes are created strictly in plan order and the next
//! create is only issued once the previous index is `ACTIVE` (or was skipped),
//! because the service allows one index build per table at a time. Tables are
//! processed in plan order; with `table_concurrency > 1` several tables run at
//! once but each table stays sequential.
//!
//! # Idempotency
//!
//! Every index is looked up before it is created, so re-running after a
//! partial failure resumes where the previous run stopped.

use crate::backoff::PollDelay;
use crate::config::{FailurePolicy, ReconcileConfig};
use crate::error::{GsiError, Result};
use crate::model::{IndexSpec, TableIndexPlan};
use crate::store::{CreateIndexRequest, IndexStatus, TableStore};
use futures::stream::{self, StreamExt};
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Why an index was not created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// An index with the same name already exists on the remote table
    AlreadyExists,
    /// The index has no key schema and cannot be created
    EmptyKeySchema,
}

/// Terminal state of one index after reconciliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexState {
    Skipped(SkipReason),
    /// Created and confirmed `ACTIVE`
    Active,
    /// Create accepted but not awaited (last index of its table, or cancelled mid-wait)
    Submitted,
    /// Create or poll failed
    Failed,
    /// Never reached because of cancellation or an earlier failure
    NotAttempted,
}

impl fmt::Display for IndexState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skipped(SkipReason::AlreadyExists) => f.write_str("skipped (exists)"),
            Self::Skipped(SkipReason::EmptyKeySchema) => f.write_str("skipped (no key schema)"),
            Self::Active => f.write_str("active"),
            Self::Submitted => f.write_str("submitted"),
            Self::Failed => f.write_str("failed"),
            Self::NotAttempted => f.write_str("not attempted"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexOutcome {
    pub index_name: String,
    pub state: IndexState,
}

/// Per-table reconciliation result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableReport {
    pub table_name: String,
    pub indexes: Vec<IndexOutcome>,
    /// Set when the table failed under [`FailurePolicy::IsolateTables`]
    pub error: Option<String>,
}

impl TableReport {
    fn new(table_name: &str) -> Self {
        Self {
            table_name: table_name.to_string(),
            indexes: Vec::new(),
            error: None,
        }
    }

    fn record(&mut self, index_name: &str, state: IndexState) {
        self.indexes.push(IndexOutcome {
            index_name: index_name.to_string(),
            state,
        });
    }

    pub fn state_of(&self, index_name: &str) -> Option<&IndexState> {
        self.indexes
            .iter()
            .find(|o| o.index_name == index_name)
            .map(|o| &o.state)
    }
}

/// Result of a reconciliation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub tables: Vec<TableReport>,
    /// The run stopped early because the cancel signal was raised
    pub cancelled: bool,
}

impl ReconcileReport {
    pub fn table(&self, table_name: &str) -> Option<&TableReport> {
        self.tables.iter().find(|t| t.table_name == table_name)
    }

    /// Number of indexes in a given state across all tables
    pub fn count(&self, state: &IndexState) -> usize {
        self.tables
            .iter()
            .flat_map(|t| t.indexes.iter())
            .filter(|o| &o.state == state)
            .count()
    }

    /// Number of skipped indexes, whatever the reason
    pub fn skipped_count(&self) -> usize {
        self.tables
            .iter()
            .flat_map(|t| t.indexes.iter())
            .filter(|o| matches!(o.state, IndexState::Skipped(_)))
            .count()
    }

    pub fn has_failures(&self) -> bool {
        self.tables.iter().any(|t| t.error.is_some())
    }
}

/// Cooperative cancellation for a reconciliation run
///
/// Cloneable; raising the paired [`CancelHandle`] stops all tables at their
/// next check (before an index, or during a poll wait).
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: Option<watch::Receiver<bool>>,
}

/// Raises a [`CancelSignal`]
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

impl CancelSignal {
    /// Create a linked handle and signal
    pub fn channel() -> (CancelHandle, CancelSignal) {
        let (tx, rx) = watch::channel(false);
        (CancelHandle { tx }, CancelSignal { rx: Some(rx) })
    }

    /// A signal that is never raised
    pub fn never() -> Self {
        Self { rx: None }
    }

    pub fn is_cancelled(&self) -> bool {
        self.rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Resolves once cancellation is raised; pends forever otherwise
    pub async fn cancelled(&self) {
        if let Some(rx) = &self.rx {
            let mut rx = rx.clone();
            if rx.wait_for(|raised| *raised).await.is_ok() {
                return;
            }
        }
        std::future::pending::<()>().await
    }
}

struct TableRun {
    report: TableReport,
    /// Cancellation stopped this table before all its indexes were handled
    interrupted: bool,
}

struct TableFailure {
    report: TableReport,
    error: GsiError,
}

fn log_summary(report: &ReconcileReport, message: &str) {
    info!(
        tables = report.tables.len(),
        active = report.count(&IndexState::Active),
        submitted = report.count(&IndexState::Submitted),
        skipped = report.skipped_count(),
        failed = report.count(&IndexState::Failed),
        cancelled = report.cancelled,
        "{}",
        message
    );
}

/// Creates deferred indexes through a [`TableStore`]
#[derive(Debug, Clone)]
pub struct ReconciliationEngine {
    store: Arc<dyn TableStore>,
    config: ReconcileConfig,
}

impl ReconciliationEngine {
    pub fn new(store: Arc<dyn TableStore>, config: ReconcileConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// Reconcile every plan.
    ///
    /// Under [`FailurePolicy::FailFast`] the first error aborts the run and is
    /// returned; indexes already created stay as they are. Cancellation is not
    /// an error: the report comes back with `cancelled` set.
    pub async fn reconcile(
        &self,
        plans: &[TableIndexPlan],
        cancel: &CancelSignal,
    ) -> Result<ReconcileReport> {
        let concurrency = self.config.table_concurrency.max(1);
        let mut results = stream::iter(plans)
            .map(|plan| self.reconcile_table(plan, cancel))
            .buffered(concurrency);

        let mut report = ReconcileReport::default();
        let mut interrupted = false;
        while let Some(result) = results.next().await {
            match result {
                Ok(run) => {
                    interrupted |= run.interrupted;
                    report.tables.push(run.report);
                }
                Err(failure) => {
                    warn!(
                        table = %failure.report.table_name,
                        error = %failure.error,
                        "table failed"
                    );
                    let mut table = failure.report;
                    table.error = Some(failure.error.to_string());
                    report.tables.push(table);

                    if self.config.failure_policy == FailurePolicy::FailFast {
                        log_summary(&report, "reconciliation aborted");
                        return Err(GsiError::Aborted {
                            report: Box::new(report),
                            source: Box::new(failure.error),
                        });
                    }
                }
            }
        }

        // a signal raised after the last index finished cut nothing short
        report.cancelled = interrupted;
        log_summary(&report, "reconciliation finished");
        Ok(report)
    }

    async fn reconcile_table(
        &self,
        plan: &TableIndexPlan,
        cancel: &CancelSignal,
    ) -> std::result::Result<TableRun, TableFailure> {
        let table = plan.table_name.as_str();
        let mut report = TableReport::new(table);
        let mut interrupted = false;

        for name in &plan.skipped_indexes {
            info!(table, index = %name, "skipping index with empty key schema");
            report.record(name, IndexState::Skipped(SkipReason::EmptyKeySchema));
        }

        let last = plan.last_submittable();
        let mut indexes = plan.pending_indexes.iter().enumerate();

        while let Some((pos, index)) = indexes.next() {
            if cancel.is_cancelled() {
                warn!(table, index = %index.index_name, "cancelled before index");
                interrupted = true;
                report.record(&index.index_name, IndexState::NotAttempted);
                for (_, rest) in indexes.by_ref() {
                    report.record(&rest.index_name, IndexState::NotAttempted);
                }
                break;
            }

            match self
                .reconcile_index(plan, index, Some(pos) == last, cancel)
                .await
            {
                Ok(state) => {
                    // only a cancelled wait hands back Submitted for a non-last index
                    if state == IndexState::Submitted && Some(pos) != last {
                        interrupted = true;
                    }
                    report.record(&index.index_name, state);
                }
                Err(error) => {
                    report.record(&index.index_name, IndexState::Failed);
                    for (_, rest) in indexes.by_ref() {
                        report.record(&rest.index_name, IndexState::NotAttempted);
                    }
                    return Err(TableFailure { report, error });
                }
            }
        }

        Ok(TableRun {
            report,
            interrupted,
        })
    }

    async fn reconcile_index(
        &self,
        plan: &TableIndexPlan,
        index: &IndexSpec,
        is_last: bool,
        cancel: &CancelSignal,
    ) -> Result<IndexState> {
        let table = plan.table_name.as_str();
        let name = index.index_name.as_str();

        if !index.has_key_schema() {
            warn!(table, index = name, "index has an empty key schema, not submitting");
            return Ok(IndexState::Skipped(SkipReason::EmptyKeySchema));
        }

        let description = self
            .store
            .describe_table(table)
            .await
            .map_err(|e| e.for_index(table, name))?;
        if let Some(existing) = description.index(name) {
            info!(table, index = name, status = %existing.status, "index already exists, skipping");
            return Ok(IndexState::Skipped(SkipReason::AlreadyExists));
        }

        let request = CreateIndexRequest::new(table, index.clone(), plan.required_attributes.clone());
        info!(
            table,
            index = name,
            key_attributes = ?plan
                .required_definitions_for(index)
                .iter()
                .map(|d| d.attribute_name.as_str())
                .collect::<Vec<_>>(),
            "creating index"
        );
        self.store
            .update_table(&request)
            .await
            .map_err(|e| e.for_index(table, name))?;

        if is_last {
            info!(table, index = name, "index creation submitted, not waiting for last index");
            return Ok(IndexState::Submitted);
        }

        self.wait_until_active(table, name, cancel).await
    }

    async fn wait_until_active(
        &self,
        table: &str,
        index: &str,
        cancel: &CancelSignal,
    ) -> Result<IndexState> {
        let mut delay = PollDelay::new(&self.config);

        for attempt in 1..=self.config.max_poll_attempts {
            let wait = delay.next_delay();
            info!(table, index, attempt, wait_secs = wait.as_secs_f64(), "waiting for index to become active");

            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = cancel.cancelled() => {
                    warn!(table, index, "cancelled while waiting for index");
                    return Ok(IndexState::Submitted);
                }
            }

            let description = self
                .store
                .describe_table(table)
                .await
                .map_err(|e| e.for_index(table, index))?;

            match description.index(index).map(|i| &i.status) {
                Some(IndexStatus::Active) => {
                    info!(table, index, attempt, "index is active");
                    return Ok(IndexState::Active);
                }
                Some(IndexStatus::Deleting) => {
                    return Err(GsiError::UnexpectedIndexStatus {
                        table: table.to_string(),
                        index: index.to_string(),
                        status: IndexStatus::Deleting.to_string(),
                    });
                }
                status => {
                    debug!(table, index, attempt, status = ?status, "index not active yet");
                }
            }
        }

        Err(GsiError::Timeout {
            table: table.to_string(),
            index: index.to_string(),
            attempts: self.config.max_poll_attempts,
        })
    }
}

/// Reconcile `plans` against `store`
pub async fn reconcile(
    store: Arc<dyn TableStore>,
    plans: &[TableIndexPlan],
    config: ReconcileConfig,
    cancel: &CancelSignal,
) -> Result<ReconcileReport> {
    ReconciliationEngine::new(store, config)
        .reconcile(plans, cancel)
        .await
}
