//! Service instance abstraction.
//!
//! # Responsibilities
//! - Represent a single live address of a logical service
//! - Track in-flight requests (for Least Connections and limits)
//! - Track health state (Healthy/Unhealthy) with hysteresis

use std::net::SocketAddr;
use std::ops::Deref;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;

use url::Url;

/// Health State enum.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    Unknown = 0,
    Healthy = 1,
    Unhealthy = 2,
}

impl From<u8> for HealthState {
    fn from(val: u8) -> Self {
        match val {
            1 => HealthState::Healthy,
            2 => HealthState::Unhealthy,
            _ => HealthState::Unknown,
        }
    }
}

/// Consecutive outcomes required to flip health state.
#[derive(Debug, Clone, Copy)]
pub struct HealthThresholds {
    pub healthy: usize,
    pub unhealthy: usize,
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self {
            healthy: 2,
            unhealthy: 3,
        }
    }
}

/// A single instance of a logical service.
#[derive(Debug)]
pub struct Instance {
    pub name: String,
    pub service: String,
    pub addr: SocketAddr,
    /// Maximum concurrent requests allowed.
    pub max_connections: usize,
    active_connections: AtomicUsize,

    state: AtomicU8,
    consecutive_failures: AtomicUsize,
    consecutive_successes: AtomicUsize,
    thresholds: HealthThresholds,
}

impl Instance {
    pub fn new(
        name: impl Into<String>,
        service: impl Into<String>,
        addr: SocketAddr,
        max_connections: usize,
        thresholds: HealthThresholds,
    ) -> Self {
        Self {
            name: name.into(),
            service: service.into(),
            addr,
            max_connections,
            active_connections: AtomicUsize::new(0),
            state: AtomicU8::new(HealthState::Unknown as u8),
            consecutive_failures: AtomicUsize::new(0),
            consecutive_successes: AtomicUsize::new(0),
            thresholds,
        }
    }

    /// Absolute URL of `path_and_query` on this instance.
    pub fn url_for(&self, path_and_query: &str) -> Result<Url, url::ParseError> {
        Url::parse(&format!("http://{}{}", self.addr, path_and_query))
    }

    /// Get the current number of in-flight requests.
    pub fn active_connections(&self) -> usize {
        self.active_connections.load(Ordering::Relaxed)
    }

    fn dec_connections(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    /// Try to create a guard that counts one in-flight request.
    pub fn try_create_guard(self: &Arc<Self>) -> Option<InstanceGuard> {
        let mut prev = self.active_connections.load(Ordering::Relaxed);
        loop {
            if prev >= self.max_connections {
                return None;
            }
            match self.active_connections.compare_exchange_weak(
                prev,
                prev + 1,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(x) => prev = x,
            }
        }
        Some(InstanceGuard {
            instance: self.clone(),
        })
    }

    // --- Health Logic ---

    pub fn health(&self) -> HealthState {
        HealthState::from(self.state.load(Ordering::Relaxed))
    }

    /// Return true if the instance is considered healthy (Healthy or Unknown).
    pub fn is_healthy(&self) -> bool {
        self.health() != HealthState::Unhealthy
    }

    /// Report a successful request/check.
    pub fn mark_success(&self) {
        self.consecutive_failures.store(0, Ordering::Relaxed);
        if self.health() == HealthState::Healthy {
            return;
        }

        let successes = self.consecutive_successes.fetch_add(1, Ordering::Relaxed) + 1;
        if successes >= self.thresholds.healthy {
            self.state.store(HealthState::Healthy as u8, Ordering::Relaxed);
            self.consecutive_successes.store(0, Ordering::Relaxed);
            tracing::info!(instance = %self.name, service = %self.service, addr = %self.addr, "Instance marked healthy");
        }
    }

    /// Report a failed request/check.
    pub fn mark_failure(&self) {
        self.consecutive_successes.store(0, Ordering::Relaxed);
        if self.health() == HealthState::Unhealthy {
            return;
        }

        let failures = self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
        if failures >= self.thresholds.unhealthy {
            self.state.store(HealthState::Unhealthy as u8, Ordering::Relaxed);
            self.consecutive_failures.store(0, Ordering::Relaxed);
            tracing::warn!(instance = %self.name, service = %self.service, addr = %self.addr, "Instance marked unhealthy");
        }
    }
}

/// A RAII guard that manages the in-flight request count.
#[derive(Debug)]
pub struct InstanceGuard {
    instance: Arc<Instance>,
}

impl Deref for InstanceGuard {
    type Target = Instance;
    fn deref(&self) -> &Self::Target {
        &self.instance
    }
}

impl Drop for InstanceGuard {
    fn drop(&mut self) {
        self.instance.dec_connections();
    }
}

#[cfg(test)]
pub(crate) fn test_instance(service: &str, addr: &str) -> Arc<Instance> {
    Arc::new(Instance::new(
        addr,
        service,
        addr.parse().unwrap(),
        100,
        HealthThresholds::default(),
    ))
}
