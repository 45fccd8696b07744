//! Delay schedule between index status polls

use crate::config::{PollBackoff, ReconcileConfig};
use std::time::Duration;

pub(crate) struct PollDelay {
    base: Duration,
    backoff: PollBackoff,
    attempt: u32,
}

impl PollDelay {
    pub(crate) fn new(config: &ReconcileConfig) -> Self {
        Self {
            base: config.poll_interval,
            backoff: config.backoff,
            attempt: 0,
        }
    }

    /// Get the next delay and advance the attempt counter.
    pub(crate) fn next_delay(&mut self) -> Duration {
        let delay = match self.backoff {
            PollBackoff::Fixed => self.base,
            PollBackoff::Exponential { max_interval } => {
                let factor = 1u32.checked_shl(self.attempt).unwrap_or(u32::MAX);
                self.base.saturating_mul(factor).min(max_interval)
            }
        };
        self.attempt = self.attempt.saturating_add(1);
        delay
    }
}
