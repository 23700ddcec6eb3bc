//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the billing mesh.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration shared by the billing service, the edge router and the fixture upstreams.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Billing service listener.
    pub billing: ListenerConfig,

    /// Edge router listener.
    pub edge: ListenerConfig,

    /// Ordered prefix rules mapping request paths to logical services.
    pub routes: Vec<RouteConfig>,

    /// Known instances of every logical service.
    pub instances: Vec<InstanceConfig>,

    /// Instance selection strategy.
    pub load_balancing: LoadBalancingConfig,

    /// Logical names of the two enrichment upstreams.
    pub upstreams: UpstreamsConfig,

    /// Circuit breaker tuning, applied to every breaker in the registry.
    pub breaker: BreakerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Aggregation fan-out settings.
    pub aggregation: AggregationConfig,

    /// Local bill storage.
    pub storage: StorageConfig,

    /// Health check settings.
    pub health_check: HealthCheckConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            billing: ListenerConfig::new("0.0.0.0:8083"),
            edge: ListenerConfig::new("0.0.0.0:8888"),
            routes: default_routes(),
            instances: default_instances(),
            load_balancing: LoadBalancingConfig::default(),
            upstreams: UpstreamsConfig::default(),
            breaker: BreakerConfig::default(),
            timeouts: TimeoutConfig::default(),
            aggregation: AggregationConfig::default(),
            storage: StorageConfig::default(),
            health_check: HealthCheckConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8083").
    pub bind_address: String,
}

impl ListenerConfig {
    pub fn new(bind_address: impl Into<String>) -> Self {
        Self {
            bind_address: bind_address.into(),
        }
    }
}

/// Route configuration mapping a path prefix to a logical service.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RouteConfig {
    /// Route identifier for logging/metrics.
    pub name: String,

    /// Path prefix to match, e.g. "/customers/".
    pub path_prefix: String,

    /// Logical service name to forward to.
    pub service: String,
}

fn default_routes() -> Vec<RouteConfig> {
    [
        ("customers", "/customers/", "customer-service"),
        ("products", "/products/", "inventory-service"),
        ("bills", "/API/", "billing-service"),
    ]
    .into_iter()
    .map(|(name, prefix, service)| RouteConfig {
        name: name.to_string(),
        path_prefix: prefix.to_string(),
        service: service.to_string(),
    })
    .collect()
}

/// A single instance of a logical service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InstanceConfig {
    /// Unique instance identifier.
    pub name: String,

    /// Logical service this instance belongs to.
    pub service: String,

    /// Instance address (e.g., "127.0.0.1:8081").
    pub address: String,

    /// Maximum concurrent requests forwarded to this instance.
    #[serde(default = "default_max_instance_conns")]
    pub max_connections: usize,
}

fn default_max_instance_conns() -> usize {
    100
}

fn default_instances() -> Vec<InstanceConfig> {
    [
        ("customer-1", "customer-service", "127.0.0.1:8081"),
        ("inventory-1", "inventory-service", "127.0.0.1:8082"),
        ("billing-1", "billing-service", "127.0.0.1:8083"),
    ]
    .into_iter()
    .map(|(name, service, address)| InstanceConfig {
        name: name.to_string(),
        service: service.to_string(),
        address: address.to_string(),
        max_connections: default_max_instance_conns(),
    })
    .collect()
}

/// Instance selection strategy.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    #[default]
    RoundRobin,
    LeastConnections,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct LoadBalancingConfig {
    pub strategy: Strategy,
}

/// Binding of a remote lookup client to a logical service and a breaker name.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct UpstreamConfig {
    /// Logical service name resolved through discovery.
    pub service: String,

    /// Circuit breaker name tracking this upstream.
    pub breaker: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamsConfig {
    pub customer: UpstreamConfig,
    pub inventory: UpstreamConfig,
}

impl Default for UpstreamsConfig {
    fn default() -> Self {
        Self {
            customer: UpstreamConfig {
                service: "customer-service".to_string(),
                breaker: "customerService".to_string(),
            },
            inventory: UpstreamConfig {
                service: "inventory-service".to_string(),
                breaker: "inventoryService".to_string(),
            },
        }
    }
}

/// Circuit breaker configuration.
///
/// The breaker keeps the outcomes of the last `sliding_window_size` calls and opens once
/// at least `minimum_calls` were recorded and the failure rate reaches
/// `failure_rate_threshold` percent.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct BreakerConfig {
    /// Failure rate in percent (0, 100] that opens the breaker.
    pub failure_rate_threshold: f64,

    /// Number of trailing call outcomes considered.
    pub sliding_window_size: usize,

    /// Calls required in the window before the rate is evaluated.
    pub minimum_calls: usize,

    /// Time spent open before a trial call is let through, in milliseconds.
    pub open_cooldown_ms: u64,
}

impl BreakerConfig {
    pub fn open_cooldown(&self) -> Duration {
        Duration::from_millis(self.open_cooldown_ms)
    }
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_rate_threshold: 50.0,
            sliding_window_size: 10,
            minimum_calls: 5,
            open_cooldown_ms: 10_000,
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Deadline of a single remote lookup (connect + response + body) in milliseconds.
    pub lookup_ms: u64,

    /// Connection establishment timeout in milliseconds.
    pub connect_ms: u64,

    /// Deadline of a request forwarded by the edge router, in seconds.
    pub forward_secs: u64,

    /// Deadline of a whole request served by the billing service, in seconds.
    pub billing_request_secs: u64,
}

impl TimeoutConfig {
    pub fn lookup(&self) -> Duration {
        Duration::from_millis(self.lookup_ms)
    }

    pub fn connect(&self) -> Duration {
        Duration::from_millis(self.connect_ms)
    }

    pub fn forward(&self) -> Duration {
        Duration::from_secs(self.forward_secs)
    }

    pub fn billing_request(&self) -> Duration {
        Duration::from_secs(self.billing_request_secs)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            lookup_ms: 2_000,
            connect_ms: 1_000,
            forward_secs: 30,
            billing_request_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Upper bound on concurrent product lookups for one bill.
    pub max_concurrent_lookups: usize,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            max_concurrent_lookups: 8,
        }
    }
}

/// Local bill storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON snapshot loaded at startup and written on shutdown.
    pub snapshot_path: Option<String>,

    /// Insert the demo bills when the store starts empty.
    pub seed_demo_data: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            snapshot_path: None,
            seed_demo_data: true,
        }
    }
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Enable active health checks.
    pub enabled: bool,

    /// Health check interval in seconds.
    pub interval_secs: u64,

    /// Health check timeout in seconds.
    pub timeout_secs: u64,

    /// Path to probe for HTTP health checks.
    pub path: String,

    /// Number of consecutive failures before marking unhealthy.
    pub unhealthy_threshold: u32,

    /// Number of consecutive successes before marking healthy.
    pub healthy_threshold: u32,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: 10,
            timeout_secs: 5,
            path: "/health".to_string(),
            unhealthy_threshold: 3,
            healthy_threshold: 2,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Pretty output for development, JSON for production.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
