//! Property-based tests for when a circuit breaker trips.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};

use price_service::resilience::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
use proptest::prelude::*;

/// Valid breaker configs: threshold in (0, 1], `minimum_calls` within the window.
fn breaker_config_strategy() -> impl Strategy<Value = CircuitBreakerConfig> {
    (1usize..=20)
        .prop_flat_map(|window| (Just(window), 0..=window, 1u32..=100))
        .prop_map(|(window, minimum_calls, percent)| CircuitBreakerConfig {
            failure_rate_threshold: f64::from(percent) / 100.0,
            minimum_calls,
            sliding_window_size: window,
            open_duration_secs: 3600,
        })
}

/// What the breaker looked like right after one call.
#[derive(Debug)]
struct Observation {
    state: CircuitState,
    buffered: usize,
    failed: usize,
    short_circuited: bool,
}

/// Feed `outcomes` (true = success) through `attempt`, returning an observation
/// per call and how often the operation actually ran.
fn run_outcomes(config: &CircuitBreakerConfig, outcomes: &[bool]) -> (Vec<Observation>, u32) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap();

    runtime.block_on(async {
        let breaker = CircuitBreaker::new("prop", config.clone());
        let invoked = AtomicU32::new(0);
        let mut observations = Vec::with_capacity(outcomes.len());

        for &ok in outcomes {
            let result = breaker
                .attempt(|| async {
                    invoked.fetch_add(1, Ordering::SeqCst);
                    if ok {
                        Ok(())
                    } else {
                        Err("remote failure")
                    }
                })
                .await;
            let snapshot = breaker.snapshot();
            observations.push(Observation {
                state: snapshot.state,
                buffered: snapshot.buffered_calls,
                failed: snapshot.failed_calls,
                short_circuited: result.is_err_and(|e| e.is_open()),
            });
        }

        (observations, invoked.load(Ordering::SeqCst))
    })
}

proptest! {
    /// Property: the breaker opens exactly when the window first holds at least
    /// `minimum_calls` outcomes with a failure rate at or above the threshold,
    /// and never runs the operation again while open.
    #[test]
    fn opens_only_at_minimum_calls_and_threshold(
        config in breaker_config_strategy(),
        outcomes in prop::collection::vec(any::<bool>(), 0..60),
    ) {
        let (observations, invoked) = run_outcomes(&config, &outcomes);

        let mut window: VecDeque<bool> = VecDeque::new();
        let mut failures = 0usize;
        let mut opened_at = None;

        for (i, (&ok, seen)) in outcomes.iter().zip(&observations).enumerate() {
            if window.len() == config.sliding_window_size && window.pop_front() == Some(false) {
                failures -= 1;
            }
            if !ok {
                failures += 1;
            }
            window.push_back(ok);

            let should_open = window.len() >= config.minimum_calls
                && failures as f64 / window.len() as f64 >= config.failure_rate_threshold;

            prop_assert!(!seen.short_circuited, "call {} short-circuited while closed", i);
            prop_assert_eq!(
                seen.state == CircuitState::Open,
                should_open,
                "call {}: window {:?}, config {:?}", i, window, config
            );

            if should_open {
                prop_assert!(seen.buffered >= config.minimum_calls);
                prop_assert!(seen.failed as f64 / seen.buffered as f64 >= config.failure_rate_threshold);
                opened_at = Some(i);
                break;
            }
        }

        match opened_at {
            Some(i) => {
                for seen in &observations[i + 1..] {
                    prop_assert_eq!(seen.state, CircuitState::Open);
                    prop_assert!(seen.short_circuited);
                }
                prop_assert_eq!(invoked as usize, i + 1);
            }
            None => {
                prop_assert_eq!(invoked as usize, outcomes.len());
            }
        }
    }
}
