//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (routes and upstreams reference services with instances)
//! - Validate value ranges (thresholds, timeouts, bounds)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use crate::config::schema::AppConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address '{value}'")]
    InvalidAddress { field: String, value: String },

    #[error("route '{route}': path prefix '{prefix}' must start with '/'")]
    InvalidPrefix { route: String, prefix: String },

    #[error("{context}: service '{service}' has no instances")]
    UnknownService { context: String, service: String },

    #[error("{field}: {reason}")]
    OutOfRange { field: &'static str, reason: &'static str },
}

/// Validate a parsed configuration, collecting every error.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "billing.bind_address", &config.billing.bind_address);
    check_address(&mut errors, "edge.bind_address", &config.edge.bind_address);

    let mut services = HashSet::new();
    for instance in &config.instances {
        check_address(
            &mut errors,
            &format!("instances.{}.address", instance.name),
            &instance.address,
        );
        services.insert(instance.service.as_str());
    }

    for route in &config.routes {
        if !route.path_prefix.starts_with('/') {
            errors.push(ValidationError::InvalidPrefix {
                route: route.name.clone(),
                prefix: route.path_prefix.clone(),
            });
        }
        if !services.contains(route.service.as_str()) {
            errors.push(ValidationError::UnknownService {
                context: format!("route '{}'", route.name),
                service: route.service.clone(),
            });
        }
    }

    for (context, upstream) in [
        ("upstreams.customer", &config.upstreams.customer),
        ("upstreams.inventory", &config.upstreams.inventory),
    ] {
        if !services.contains(upstream.service.as_str()) {
            errors.push(ValidationError::UnknownService {
                context: context.to_string(),
                service: upstream.service.clone(),
            });
        }
    }

    let breaker = &config.breaker;
    if !(breaker.failure_rate_threshold > 0.0 && breaker.failure_rate_threshold <= 100.0) {
        errors.push(ValidationError::OutOfRange {
            field: "breaker.failure_rate_threshold",
            reason: "must be within (0, 100]",
        });
    }
    if breaker.sliding_window_size == 0 {
        errors.push(ValidationError::OutOfRange {
            field: "breaker.sliding_window_size",
            reason: "must be at least 1",
        });
    }
    if breaker.minimum_calls == 0 || breaker.minimum_calls > breaker.sliding_window_size {
        errors.push(ValidationError::OutOfRange {
            field: "breaker.minimum_calls",
            reason: "must be between 1 and sliding_window_size",
        });
    }
    if breaker.open_cooldown_ms == 0 {
        errors.push(ValidationError::OutOfRange {
            field: "breaker.open_cooldown_ms",
            reason: "must be greater than 0",
        });
    }
    for (field, value) in [
        ("timeouts.lookup_ms", config.timeouts.lookup_ms),
        ("timeouts.connect_ms", config.timeouts.connect_ms),
        ("timeouts.forward_secs", config.timeouts.forward_secs),
        ("timeouts.billing_request_secs", config.timeouts.billing_request_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::OutOfRange {
                field,
                reason: "must be greater than 0",
            });
        }
    }
    if config.timeouts.billing_request_secs.saturating_mul(1_000) < config.timeouts.lookup_ms {
        errors.push(ValidationError::OutOfRange {
            field: "timeouts.billing_request_secs",
            reason: "must cover at least one lookup deadline",
        });
    }
    if config.aggregation.max_concurrent_lookups == 0 {
        errors.push(ValidationError::OutOfRange {
            field: "aggregation.max_concurrent_lookups",
            reason: "must be at least 1",
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::RouteConfig;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(validate_config(&AppConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = AppConfig::default();
        config.routes.push(RouteConfig {
            name: "broken".into(),
            path_prefix: "orders/".into(),
            service: "order-service".into(),
        });
        config.breaker.minimum_calls = 50;
        config.aggregation.max_concurrent_lookups = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::InvalidPrefix {
            route: "broken".into(),
            prefix: "orders/".into(),
        }));
        assert!(errors.contains(&ValidationError::UnknownService {
            context: "route 'broken'".into(),
            service: "order-service".into(),
        }));
    }

    #[test]
    fn test_upstream_without_instances() {
        let mut config = AppConfig::default();
        config.instances.retain(|i| i.service != "inventory-service");
        // the products route also loses its service
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| matches!(
            e,
            ValidationError::UnknownService { context, .. } if context == "upstreams.inventory"
        )));
    }

    #[test]
    fn test_zero_timeouts_are_rejected() {
        let mut config = AppConfig::default();
        config.timeouts.forward_secs = 0;
        config.timeouts.connect_ms = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::OutOfRange {
                    field: "timeouts.connect_ms",
                    reason: "must be greater than 0",
                },
                ValidationError::OutOfRange {
                    field: "timeouts.forward_secs",
                    reason: "must be greater than 0",
                },
            ]
        );
    }

    #[test]
    fn test_billing_deadline_shorter_than_lookup() {
        let mut config = AppConfig::default();
        config.timeouts.billing_request_secs = 1;
        config.timeouts.lookup_ms = 1_500;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().starts_with("timeouts.billing_request_secs"));
    }

    #[test]
    fn test_threshold_range() {
        let mut config = AppConfig::default();
        config.breaker.failure_rate_threshold = 0.0;
        assert!(validate_config(&config).is_err());

        config.breaker.failure_rate_threshold = 100.0;
        assert!(validate_config(&config).is_ok());
    }
}
