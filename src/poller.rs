//! Bounded retry around a readiness probe
//!
//! A probe is re-run from scratch on every attempt. Between unsuccessful
//! attempts the poller sleeps for the configured interval, and it gives up once
//! the elapsed time reaches the budget.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, info};

use crate::clock::Clock;
use crate::config::ReadinessConfig;
use crate::models::TrinoError;

/// Outcome of a single probe invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt<T> {
    Ready(T),
    /// Not ready yet; carries what was observed, for diagnostics.
    Pending(String),
}

/// One readiness check, invoked repeatedly by `ReadinessPoller`.
///
/// Transient errors count as "not ready"; any other error aborts polling.
pub trait Probe {
    type Output;

    fn name(&self) -> &str;

    async fn attempt(&mut self) -> Result<Attempt<Self::Output>, TrinoError>;
}

/// Adapts a closure into a `Probe`.
pub struct FnProbe<F> {
    name: String,
    f: F,
}

pub fn probe_fn<F>(name: impl Into<String>, f: F) -> FnProbe<F> {
    FnProbe {
        name: name.into(),
        f,
    }
}

impl<F, Fut, T> Probe for FnProbe<F>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Attempt<T>, TrinoError>>,
{
    type Output = T;

    fn name(&self) -> &str {
        &self.name
    }

    async fn attempt(&mut self) -> Result<Attempt<T>, TrinoError> {
        (self.f)().await
    }
}

#[derive(Debug, Clone)]
pub struct ReadinessPoller<C> {
    clock: C,
    config: ReadinessConfig,
}

impl<C: Clock> ReadinessPoller<C> {
    pub fn new(clock: C, config: ReadinessConfig) -> Self {
        Self { clock, config }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn config(&self) -> ReadinessConfig {
        self.config
    }

    /// Runs `probe` until it reports ready or the budget is spent.
    ///
    /// Returns `TrinoError::ReadinessTimeout` with the elapsed time and the
    /// last observation when the budget runs out.
    pub async fn wait_for<P: Probe>(&self, probe: &mut P) -> Result<P::Output, TrinoError> {
        let start = self.clock.now();
        let mut attempts = 0;
        let mut last_observed = String::from("no attempt made");

        while self.elapsed_since(start) < self.config.budget {
            attempts += 1;
            match probe.attempt().await {
                Ok(Attempt::Ready(value)) => {
                    info!(
                        "{} ready after {} attempt(s) in {:?}",
                        probe.name(),
                        attempts,
                        self.elapsed_since(start)
                    );
                    return Ok(value);
                }
                Ok(Attempt::Pending(observed)) => last_observed = observed,
                Err(e) if e.is_transient() => last_observed = e.to_string(),
                Err(e) => return Err(e),
            }

            debug!(
                "{} not ready after waiting for {:?} ({}). Retrying...",
                probe.name(),
                self.elapsed_since(start),
                last_observed
            );
            self.clock.sleep(self.config.interval).await;
        }

        Err(TrinoError::ReadinessTimeout {
            check: probe.name().to_string(),
            elapsed: self.elapsed_since(start),
            attempts,
            last_observed,
        })
    }

    fn elapsed_since(&self, start: Duration) -> Duration {
        self.clock.now().saturating_sub(start)
    }
}
