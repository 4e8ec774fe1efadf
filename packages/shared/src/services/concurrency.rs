use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::{error, warn};

use crate::config::RetryPolicy;
use crate::services::errors::service_errors::ServiceError;

/// Runs a read-modify-write attempt until it stops reporting a conflict or
/// the policy's attempt budget is spent.
///
/// Every attempt must re-read the fields it writes: the closure is called
/// afresh each time. Errors other than `ServiceError::Conflict` end the loop
/// immediately.
pub async fn retry_on_conflict<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut attempt: F,
) -> Result<T, ServiceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ServiceError>>,
{
    let mut tries = 1;
    loop {
        match attempt().await {
            Err(ServiceError::Conflict(msg)) if tries < policy.max_attempts => {
                let backoff = jittered(policy.backoff_for(tries));
                warn!(
                    "{} conflicted on attempt {}/{} ({}), retrying in {:?}",
                    operation, tries, policy.max_attempts, msg, backoff
                );
                tokio::time::sleep(backoff).await;
                tries += 1;
            }
            Err(ServiceError::Conflict(msg)) => {
                warn!(
                    "{} gave up after {} conflicting attempts",
                    operation, tries
                );
                return Err(ServiceError::Conflict(format!(
                    "{} gave up after {} attempts: {}",
                    operation, tries, msg
                )));
            }
            other => return other,
        }
    }
}

// Spread competing writers so they do not collide again in lockstep
fn jittered(backoff: Duration) -> Duration {
    let millis = backoff.as_millis() as u64;
    if millis < 2 {
        return backoff;
    }
    Duration::from_millis(rand::thread_rng().gen_range(millis / 2..=millis))
}

/// Bounds a coordinator call by `deadline`. Writes already issued when the
/// deadline fires are not rolled back.
pub async fn with_deadline<T, Fut>(
    deadline: Duration,
    operation: &str,
    call: Fut,
) -> Result<T, ServiceError>
where
    Fut: Future<Output = Result<T, ServiceError>>,
{
    match tokio::time::timeout(deadline, call).await {
        Ok(result) => result,
        Err(_) => {
            error!("{} exceeded its {:?} deadline", operation, deadline);
            Err(ServiceError::DeadlineExceeded {
                operation: operation.to_string(),
                deadline,
            })
        }
    }
}
