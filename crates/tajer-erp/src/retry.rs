// SPDX-FileCopyrightText: 2026 Tajer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded exponential backoff for ERP calls.
//!
//! A call gets at most `max_attempts` tries. The delay before retry `n`
//! (1-based) is `base_delay * 2^(n-1)`, and the summed delays of one call
//! never exceed `max_total_wait`: the last delay is shortened to fit and no
//! retry is scheduled once the budget is spent.

use std::future::Future;
use std::time::Duration;

use tajer_config::model::ErpConfig;
use tajer_core::TajerError;
use tracing::warn;

/// Outcome of a single attempt that did not succeed.
#[derive(Debug)]
pub enum AttemptError {
    /// Network failure, timeout, 429 or 5xx. Worth another try.
    Transient(TajerError),
    /// Anything the ERP will answer the same way again (4xx, bad payload).
    Permanent(TajerError),
}

impl AttemptError {
    fn into_inner(self) -> TajerError {
        match self {
            AttemptError::Transient(e) | AttemptError::Permanent(e) => e,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_total_wait: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &ErpConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_total_wait: Duration::from_millis(config.max_total_wait_ms),
        }
    }

    /// The delays slept before each retry, in order.
    pub fn delays(&self) -> Vec<Duration> {
        let mut delays = Vec::new();
        let mut budget = self.max_total_wait;
        let mut next = self.base_delay;
        for _ in 1..self.max_attempts {
            if budget.is_zero() {
                break;
            }
            let delay = next.min(budget);
            delays.push(delay);
            budget -= delay;
            next = next.saturating_mul(2);
        }
        delays
    }

    /// Runs `attempt` until it succeeds, fails permanently, or the policy
    /// is exhausted. The last error is returned on exhaustion.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut attempt: F) -> Result<T, TajerError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AttemptError>>,
    {
        let delays = self.delays();
        let total = delays.len() + 1;
        let mut delays = delays.into_iter();
        let mut tries = 0;

        loop {
            tries += 1;
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(AttemptError::Transient(e)) => match delays.next() {
                    Some(delay) => {
                        warn!(
                            operation,
                            attempt = tries,
                            max_attempts = total,
                            delay_ms = delay.as_millis() as u64,
                            error = %e,
                            "ERP call failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    None => {
                        return Err(TajerError::Erp {
                            message: format!("{operation} failed after {tries} attempts: {e}"),
                            source: Some(Box::new(e)),
                        });
                    }
                },
                Err(permanent) => return Err(permanent.into_inner()),
            }
        }
    }
}
