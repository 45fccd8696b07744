//! Reconciliation configuration

use std::time::Duration;

/// Default wait between index status polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(15);

/// Default poll bound: one hour at the default interval
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 240;

/// How the wait between polls evolves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollBackoff {
    /// Always wait `poll_interval`
    #[default]
    Fixed,
    /// Double the wait after every poll, capped at `max_interval`
    Exponential { max_interval: Duration },
}

/// What happens to the remaining tables when one table's index fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Abort everything and return the error
    #[default]
    FailFast,
    /// Record the error on the failing table's report and carry on with the others
    IsolateTables,
}

/// Configuration for [`ReconciliationEngine`](crate::reconcile::ReconciliationEngine)
#[derive(Debug, Clone)]
pub struct ReconcileConfig {
    /// Wait before each status poll of a freshly created index.
    ///
    /// Default: 15 seconds
    pub poll_interval: Duration,

    /// Polls allowed per index before giving up with a `Timeout` error.
    ///
    /// Default: 240
    pub max_poll_attempts: u32,

    /// Default: fixed interval
    pub backoff: PollBackoff,

    /// Tables reconciled at the same time. Indexes of one table are always
    /// created one after another.
    ///
    /// Default: 1
    pub table_concurrency: usize,

    /// Default: fail fast
    pub failure_policy: FailurePolicy,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_poll_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
            backoff: PollBackoff::Fixed,
            table_concurrency: 1,
            failure_policy: FailurePolicy::FailFast,
        }
    }
}

impl ReconcileConfig {
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_poll_attempts(mut self, attempts: u32) -> Self {
        self.max_poll_attempts = attempts;
        self
    }

    pub fn with_backoff(mut self, backoff: PollBackoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_table_concurrency(mut self, tables: usize) -> Self {
        self.table_concurrency = tables;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }
}
