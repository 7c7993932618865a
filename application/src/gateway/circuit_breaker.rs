//! Per-provider-family circuit breakers
//!
//! A breaker stops calls to a family that keeps failing. State lives for
//! the process, is shared by all concurrent runs, and is touched only by
//! the gateway. Transitions are serialized behind a mutex: each critical
//! section is a handful of field updates and never spans an await.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use synthesis_domain::ProviderFamily;
use tokio::time::Instant;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub struct BreakerConfig {
    /// Failures within `failure_window` that open the circuit
    pub failure_threshold: u32,
    pub failure_window: Duration,
    /// Time spent open before a single trial call is allowed
    pub cooldown: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            failure_window: Duration::from_secs(60),
            cooldown: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Calls flow normally
    Closed,
    /// Calls are rejected without touching the provider
    Open,
    /// Cooldown elapsed; one trial call decides the next state
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Point-in-time view of a breaker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerSnapshot {
    pub state: CircuitState,
    pub consecutive_failures: u32,
    pub last_transition: Instant,
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    consecutive_failures: u32,
    window_start: Option<Instant>,
    last_transition: Instant,
    trial_in_flight: bool,
}

impl BreakerInner {
    fn set_state(&mut self, label: &str, next: CircuitState, now: Instant) {
        if self.state != next {
            info!(
                family = label,
                from = self.state.as_str(),
                to = next.as_str(),
                "Circuit breaker state transition"
            );
            self.state = next;
            self.last_transition = now;
        }
    }

    /// Open -> HalfOpen once the cooldown has elapsed
    fn refresh(&mut self, label: &str, cooldown: Duration, now: Instant) {
        if self.state == CircuitState::Open && now.duration_since(self.last_transition) >= cooldown
        {
            self.set_state(label, CircuitState::HalfOpen, now);
            self.trial_in_flight = false;
        }
    }
}

/// The call was short-circuited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerOpen {
    pub family: ProviderFamily,
}

impl std::fmt::Display for BreakerOpen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "circuit open for provider family '{}'", self.family)
    }
}

#[derive(Debug)]
pub struct CircuitBreaker {
    family: ProviderFamily,
    config: BreakerConfig,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    pub fn new(family: ProviderFamily, config: BreakerConfig) -> Self {
        Self {
            family,
            config,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                window_start: None,
                last_transition: Instant::now(),
                trial_in_flight: false,
            }),
        }
    }

    pub fn family(&self) -> ProviderFamily {
        self.family
    }

    fn lock(&self) -> MutexGuard<'_, BreakerInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Current state, with an elapsed cooldown reported as half-open
    pub fn snapshot(&self) -> BreakerSnapshot {
        let mut inner = self.lock();
        inner.refresh(self.family.as_str(), self.config.cooldown, Instant::now());
        BreakerSnapshot {
            state: inner.state,
            consecutive_failures: inner.consecutive_failures,
            last_transition: inner.last_transition,
        }
    }

    pub fn state(&self) -> CircuitState {
        self.snapshot().state
    }

    /// Ask to make a call.
    ///
    /// In the half-open state only one caller gets a permit; the others are
    /// rejected until that trial resolves.
    pub fn try_acquire(self: &Arc<Self>) -> Result<BreakerPermit, BreakerOpen> {
        let mut inner = self.lock();
        inner.refresh(self.family.as_str(), self.config.cooldown, Instant::now());

        let trial = match inner.state {
            CircuitState::Closed => false,
            CircuitState::Open => return Err(BreakerOpen { family: self.family }),
            CircuitState::HalfOpen => {
                if inner.trial_in_flight {
                    return Err(BreakerOpen { family: self.family });
                }
                inner.trial_in_flight = true;
                true
            }
        };

        Ok(BreakerPermit {
            breaker: Arc::clone(self),
            trial,
            resolved: false,
        })
    }

    fn on_success(&self, trial: bool) {
        let mut inner = self.lock();
        let now = Instant::now();
        match inner.state {
            CircuitState::Closed => {
                inner.consecutive_failures = 0;
                inner.window_start = None;
            }
            CircuitState::HalfOpen if trial => {
                inner.consecutive_failures = 0;
                inner.window_start = None;
                inner.trial_in_flight = false;
                inner.set_state(self.family.as_str(), CircuitState::Closed, now);
            }
            // A call admitted before the circuit opened; it says nothing
            // about recovery.
            _ => debug!(family = self.family.as_str(), "Ignoring stale success"),
        }
    }

    fn on_failure(&self, trial: bool) {
        let mut inner = self.lock();
        let now = Instant::now();
        match inner.state {
            CircuitState::Closed => {
                let window_expired = inner
                    .window_start
                    .is_none_or(|start| now.duration_since(start) > self.config.failure_window);
                if window_expired {
                    inner.window_start = Some(now);
                    inner.consecutive_failures = 0;
                }
                inner.consecutive_failures += 1;
                if inner.consecutive_failures >= self.config.failure_threshold {
                    inner.set_state(self.family.as_str(), CircuitState::Open, now);
                }
            }
            CircuitState::HalfOpen if trial => {
                inner.trial_in_flight = false;
                inner.set_state(self.family.as_str(), CircuitState::Open, now);
            }
            _ => debug!(family = self.family.as_str(), "Ignoring stale failure"),
        }
    }

    fn release_trial(&self) {
        let mut inner = self.lock();
        inner.trial_in_flight = false;
    }
}

/// Admission to make one call through a breaker.
///
/// Resolve it with exactly one outcome. Dropping an unresolved permit
/// (the call was cancelled) records nothing and frees the half-open
/// trial slot.
#[derive(Debug)]
pub struct BreakerPermit {
    breaker: Arc<CircuitBreaker>,
    trial: bool,
    resolved: bool,
}

impl BreakerPermit {
    pub fn is_trial(&self) -> bool {
        self.trial
    }

    pub fn record_success(mut self) {
        self.resolved = true;
        self.breaker.on_success(self.trial);
    }

    pub fn record_failure(mut self) {
        self.resolved = true;
        self.breaker.on_failure(self.trial);
    }

    /// The call failed for a reason that says nothing about provider health
    pub fn record_neutral(mut self) {
        self.resolved = true;
        if self.trial {
            self.breaker.release_trial();
        }
    }
}

impl Drop for BreakerPermit {
    fn drop(&mut self) {
        if !self.resolved && self.trial {
            self.breaker.release_trial();
        }
    }
}

/// One breaker per provider family, created on first use
#[derive(Debug, Default)]
pub struct BreakerRegistry {
    config: BreakerConfig,
    breakers: Mutex<HashMap<ProviderFamily, Arc<CircuitBreaker>>>,
}

impl BreakerRegistry {
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            breakers: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &BreakerConfig {
        &self.config
    }

    pub fn get(&self, family: ProviderFamily) -> Arc<CircuitBreaker> {
        let mut breakers = self.breakers.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(
            breakers
                .entry(family)
                .or_insert_with(|| Arc::new(CircuitBreaker::new(family, self.config.clone()))),
        )
    }

    /// State of a family's breaker; families never called report closed
    pub fn state(&self, family: ProviderFamily) -> CircuitState {
        self.get(family).state()
    }
}
