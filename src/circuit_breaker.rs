//! # Circuit Breaker Module
//!
//! This module implements the circuit breaker pattern for categorizer calls.
//! When the categorizer fails repeatedly, further calls are skipped for a
//! cool-down period and the affected products stay uncategorized.

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::config::RecoveryConfig;

#[derive(Debug, Default)]
struct BreakerState {
    failure_count: u32,
    last_failure_time: Option<Instant>,
}

/// Circuit breaker for categorizer calls
///
/// # State Machine
///
/// - **Closed**: Normal operation, calls pass through
/// - **Open**: Failure threshold reached, calls are skipped
/// - **Half-Open**: Reset timeout elapsed, the next call is let through
///
/// # Configuration
///
/// Uses `RecoveryConfig` for:
/// - `circuit_breaker_threshold`: Consecutive failures before opening (default: 5)
/// - `circuit_breaker_reset_secs`: Time before attempting reset (default: 60s)
#[derive(Debug)]
pub struct CircuitBreaker {
    state: Mutex<BreakerState>,
    threshold: u32,
    reset_after: Duration,
}

impl CircuitBreaker {
    /// Create a new circuit breaker with the given configuration
    ///
    /// # Examples
    ///
    /// ```rust
    /// use diet_import::config::RecoveryConfig;
    /// use diet_import::circuit_breaker::CircuitBreaker;
    ///
    /// let breaker = CircuitBreaker::new(&RecoveryConfig::default());
    /// assert!(!breaker.is_open());
    /// ```
    pub fn new(config: &RecoveryConfig) -> Self {
        Self {
            state: Mutex::new(BreakerState::default()),
            threshold: config.circuit_breaker_threshold,
            reset_after: Duration::from_secs(config.circuit_breaker_reset_secs),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        // Counters stay meaningful even if a holder panicked
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Check if the circuit is open (calls should be skipped)
    ///
    /// Resets to closed once the reset timeout has elapsed.
    pub fn is_open(&self) -> bool {
        let mut state = self.lock();

        if state.failure_count >= self.threshold {
            if let Some(last_time) = state.last_failure_time {
                if last_time.elapsed() < self.reset_after {
                    return true;
                }
                state.failure_count = 0;
                state.last_failure_time = None;
            }
        }
        false
    }

    /// Record a failed or timed out call
    pub fn record_failure(&self) {
        let mut state = self.lock();
        state.failure_count += 1;
        state.last_failure_time = Some(Instant::now());
    }

    /// Record a successful call, closing the circuit
    pub fn record_success(&self) {
        let mut state = self.lock();
        state.failure_count = 0;
        state.last_failure_time = None;
    }

    pub fn failure_count(&self) -> u32 {
        self.lock().failure_count
    }
}
