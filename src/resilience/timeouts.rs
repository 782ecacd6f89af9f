//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap remote calls with a deadline
//! - Surface an elapsed deadline as an ordinary error of the caller's type
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from other errors
//! - The circuit breaker imposes no deadline of its own; a timed-out call is
//!   simply a failed call to it

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

/// A call did not finish within its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("timed out after {}ms", .0.as_millis())]
pub struct TimeoutError(pub Duration);

/// Run `future`, failing with `TimeoutError` converted into `E` if it outlives `duration`.
pub async fn with_timeout<F, T, E>(duration: Duration, future: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<TimeoutError>,
{
    match tokio::time::timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(TimeoutError(duration).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum CallError {
        Timeout(Duration),
        Remote,
    }

    impl From<TimeoutError> for CallError {
        fn from(err: TimeoutError) -> Self {
            CallError::Timeout(err.0)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_elapsed() {
        let result: Result<(), CallError> = with_timeout(Duration::from_millis(100), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok(())
        })
        .await;
        assert_eq!(result, Err(CallError::Timeout(Duration::from_millis(100))));
    }

    #[tokio::test]
    async fn test_inner_result_passes_through() {
        let ok: Result<u8, CallError> = with_timeout(Duration::from_secs(1), async { Ok(3) }).await;
        assert_eq!(ok, Ok(3));

        let err: Result<u8, CallError> =
            with_timeout(Duration::from_secs(1), async { Err(CallError::Remote) }).await;
        assert_eq!(err, Err(CallError::Remote));
    }

    #[test]
    fn test_display() {
        assert_eq!(TimeoutError(Duration::from_millis(1500)).to_string(), "timed out after 1500ms");
    }
}
