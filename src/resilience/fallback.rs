//! Fallback recovery.
//!
//! Maps the error branch of a breaker-guarded call to a substitute value, so the
//! caller always gets an answer. The reason for every substitution is counted,
//! keeping "remote failing" apart from "breaker protecting the remote".

use crate::observability::metrics;
use crate::resilience::circuit_breaker::BreakerError;

/// Why a fallback value was served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// The breaker short-circuited the call.
    CircuitOpen,
    /// The call ran and failed.
    OperationFailed,
}

impl FallbackReason {
    pub fn of<E>(err: &BreakerError<E>) -> Self {
        if err.is_open() {
            FallbackReason::CircuitOpen
        } else {
            FallbackReason::OperationFailed
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackReason::CircuitOpen => "circuit_open",
            FallbackReason::OperationFailed => "operation_failed",
        }
    }
}

/// Return the success value, or hand the error to `fallback` and return its value.
pub fn recover<T, E, R>(breaker: &str, result: Result<T, BreakerError<E>>, fallback: R) -> T
where
    R: FnOnce(BreakerError<E>) -> T,
{
    match result {
        Ok(value) => value,
        Err(err) => {
            let reason = FallbackReason::of(&err);
            metrics::record_fallback(breaker, reason.as_str());
            fallback(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recover_passes_through_success() {
        let value = recover::<_, &str, _>("test", Ok(5), |_| unreachable!());
        assert_eq!(value, 5);
    }

    #[test]
    fn test_recover_hands_over_original_error() {
        let value = recover("test", Err(BreakerError::Operation("timeout")), |err| {
            assert_eq!(FallbackReason::of(&err), FallbackReason::OperationFailed);
            err.into_operation().map_or(0, str::len)
        });
        assert_eq!(value, 7);
    }

    #[test]
    fn test_recover_from_open() {
        let err: BreakerError<&str> = BreakerError::Open { name: "test".into() };
        assert_eq!(FallbackReason::of(&err).as_str(), "circuit_open");
        assert_eq!(recover("test", Err::<u8, _>(err), |_| 9), 9);
    }
}
