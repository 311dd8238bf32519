//! Booking Submission
//!
//! Sends a completed draft to the backend, retrying transient failures with
//! exponential backoff.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::booking::record::StepRecord;
use crate::error::{BookingError, SubmitError};

// == Booking Request ==
/// Every step record of a session, in step order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub session_id: String,
    pub steps: Vec<StepRecord>,
}

// == Confirmation ==
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confirmation {
    pub confirmation_id: String,
    /// Attempts used, including the successful one
    pub attempts: u32,
}

// == Submitter Trait ==
/// Backend that accepts bookings.
#[async_trait]
pub trait BookingSubmitter: Send + Sync {
    /// Returns the backend's confirmation id.
    async fn submit(&self, booking: &BookingRequest) -> Result<String, SubmitError>;
}

// == Simulated Submitter ==
/// Stand-in backend that fails a configurable share of requests.
#[derive(Debug, Clone)]
pub struct SimulatedSubmitter {
    failure_rate: f64,
    latency: Duration,
}

impl SimulatedSubmitter {
    /// Non-finite rates are treated as zero.
    pub fn new(failure_rate: f64, latency: Duration) -> Self {
        let failure_rate = if failure_rate.is_finite() {
            failure_rate.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            failure_rate,
            latency,
        }
    }
}

impl Default for SimulatedSubmitter {
    fn default() -> Self {
        Self::new(0.1, Duration::from_millis(200))
    }
}

#[async_trait]
impl BookingSubmitter for SimulatedSubmitter {
    async fn submit(&self, booking: &BookingRequest) -> Result<String, SubmitError> {
        tokio::time::sleep(self.latency).await;

        let failed = rand::thread_rng().gen_bool(self.failure_rate);
        if failed {
            return Err(SubmitError::Network(format!(
                "simulated failure submitting session {}",
                booking.session_id
            )));
        }
        Ok(format!("BK-{:08X}", rand::random::<u32>()))
    }
}

// == Retry Policy ==
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Wait after the zero-based `attempt` fails: `base_delay * 2^attempt`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(1u32 << attempt.min(16))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(1000))
    }
}

// == Submit With Retry ==
/// Submits `booking`, retrying network errors until `policy` is exhausted.
pub async fn submit_with_retry(
    submitter: &dyn BookingSubmitter,
    booking: &BookingRequest,
    policy: &RetryPolicy,
) -> Result<Confirmation, BookingError> {
    let mut attempt = 0;

    loop {
        match submitter.submit(booking).await {
            Ok(confirmation_id) => {
                info!(
                    session = %booking.session_id,
                    confirmation = %confirmation_id,
                    attempts = attempt + 1,
                    "Booking submitted"
                );
                return Ok(Confirmation {
                    confirmation_id,
                    attempts: attempt + 1,
                });
            }
            Err(e) if e.is_retryable() && attempt + 1 < policy.max_attempts => {
                let backoff = policy.delay_after(attempt);
                warn!(
                    session = %booking.session_id,
                    error = %e,
                    attempt = attempt + 1,
                    max_attempts = policy.max_attempts,
                    backoff_ms = backoff.as_millis() as u64,
                    "Retrying booking submission"
                );
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
            Err(e) => {
                warn!(
                    session = %booking.session_id,
                    error = %e,
                    attempts = attempt + 1,
                    "Booking submission failed"
                );
                return Err(BookingError::SubmissionFailed {
                    attempts: attempt + 1,
                    reason: e.to_string(),
                });
            }
        }
    }
}
