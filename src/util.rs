// src/util.rs

//! Uniform retry policy for external calls (model provider, vector store).

use anyhow::{Context, Result};
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Exponential backoff with full jitter: attempt `n` sleeps a uniformly random
/// duration in `0..min(2^n seconds, max_delay)`.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let cap = 2f64
            .powi(attempt.min(31) as i32)
            .min(self.max_delay.as_secs_f64());
        if cap <= 0.0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(rand::rng().random_range(0.0..cap))
    }
}

/// Runs `op` until it succeeds or the attempt ceiling is reached. Applied
/// identically to every external call; provider errors are not classified.
pub async fn with_backoff<T, Fut, Op>(policy: &RetryPolicy, label: &str, mut op: Op) -> Result<T>
where
    Op: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < policy.max_attempts => {
                let delay = policy.delay_for(attempt);
                warn!(
                    error = %err,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "{label} failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => {
                return Err(err).with_context(|| format!("{label} failed after {attempt} attempts"));
            }
        }
    }
}
