//! Polling for asynchronous provider operations.
//!
//! The waiter is the only place the flow suspends. Polling is bounded: a
//! permanently stuck operation surfaces as a timeout instead of hanging
//! the run forever.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::Operation;
use crate::error::{Error, Result};
use crate::providers::Compute;

/// Polling policy for operation waits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollPolicy {
    /// Delay before the second and later polls, in milliseconds
    #[serde(default = "default_interval")]
    pub interval_ms: u64,

    /// Backoff multiplier (1.0 keeps the interval fixed)
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    /// Cap on the delay between polls, in milliseconds
    #[serde(default = "default_max_interval")]
    pub max_interval_ms: u64,

    /// Maximum number of polls before giving up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_interval() -> u64 {
    1000
}
fn default_multiplier() -> f64 {
    1.0
}
fn default_max_interval() -> u64 {
    30_000
}
fn default_max_attempts() -> u32 {
    120
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval_ms: default_interval(),
            multiplier: default_multiplier(),
            max_interval_ms: default_max_interval(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl PollPolicy {
    /// Delay to sleep after a given poll (1-indexed)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::from_millis(self.interval_ms);
        }

        let delay = self.interval_ms as f64 * self.multiplier.powi((attempt - 1) as i32);
        let capped = delay.min(self.max_interval_ms as f64) as u64;
        Duration::from_millis(capped)
    }
}

/// Polls an operation until it reaches DONE, fails, or times out
pub struct OperationWaiter {
    compute: Arc<dyn Compute>,
    project: String,
    zone: String,
    policy: PollPolicy,
}

impl OperationWaiter {
    pub fn new(
        compute: Arc<dyn Compute>,
        project: impl Into<String>,
        zone: impl Into<String>,
        policy: PollPolicy,
    ) -> Self {
        Self {
            compute,
            project: project.into(),
            zone: zone.into(),
            policy,
        }
    }

    /// Block until the operation reports DONE.
    ///
    /// DONE with an error payload fails with [`Error::Operation`] carrying
    /// the payload verbatim. Exhausting the attempt limit fails with
    /// [`Error::Timeout`].
    pub async fn wait(&self, operation: &Operation) -> Result<Operation> {
        info!(operation = %operation.name, "waiting for operation to finish");

        let mut waited = Duration::ZERO;

        for attempt in 1..=self.policy.max_attempts {
            let current = self
                .compute
                .get_zone_operation(&self.project, &self.zone, &operation.name)
                .await?;

            if current.is_done() {
                if let Some(payload) = current.error {
                    return Err(Error::Operation {
                        operation: current.name,
                        payload,
                    });
                }
                info!(operation = %current.name, attempts = attempt, "operation done");
                return Ok(current);
            }

            debug!(
                operation = %current.name,
                status = ?current.status,
                attempt,
                "operation still in progress"
            );

            if attempt < self.policy.max_attempts {
                let delay = self.policy.delay_for_attempt(attempt);
                waited += delay;
                tokio::time::sleep(delay).await;
            }
        }

        Err(Error::Timeout {
            operation: operation.name.clone(),
            attempts: self.policy.max_attempts,
            waited_secs: waited.as_secs(),
        })
    }
}
