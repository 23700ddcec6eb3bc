//! Breaker-guarded calls with a registered fallback.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use crate::observability::metrics;
use crate::resilience::circuit_breaker::CircuitBreaker;

/// Fallback strategy: receives the original input and the failure, if the call was tried.
pub type Fallback<I, T, E> = Arc<dyn Fn(I, Option<&E>) -> T + Send + Sync>;

/// A call site bound to a breaker and its fallback.
///
/// [`Guarded::call`] makes at most one attempt and never surfaces the error: a rejected
/// or failed call yields the fallback value instead.
pub struct Guarded<I, T, E> {
    breaker: Arc<CircuitBreaker>,
    fallback: Fallback<I, T, E>,
}

impl<I, T, E> Clone for Guarded<I, T, E> {
    fn clone(&self) -> Self {
        Self {
            breaker: self.breaker.clone(),
            fallback: self.fallback.clone(),
        }
    }
}

impl<I, T, E> Guarded<I, T, E> {
    pub fn new(breaker: Arc<CircuitBreaker>, fallback: Fallback<I, T, E>) -> Self {
        Self { breaker, fallback }
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }
}

impl<I, T, E> Guarded<I, T, E>
where
    I: Clone,
    E: Display,
{
    pub async fn call<F, Fut>(&self, input: I, op: F) -> T
    where
        F: FnOnce(I) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let name = self.breaker.name();
        let Some(permit) = self.breaker.try_acquire() else {
            tracing::debug!(breaker = %name, "Breaker open, short-circuiting to fallback");
            metrics::record_fallback(name, "short_circuit");
            return (self.fallback)(input, None);
        };

        match op(input.clone()).await {
            Ok(value) => {
                permit.success();
                value
            }
            Err(error) => {
                let trial = permit.is_trial();
                permit.failure();
                tracing::warn!(breaker = %name, trial, error = %error, "Remote call failed, using fallback");
                metrics::record_fallback(name, "failure");
                (self.fallback)(input, Some(&error))
            }
        }
    }
}
