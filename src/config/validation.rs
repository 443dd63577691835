//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, divisors > 0)
//! - Detect duplicate pool contracts
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;

use crate::config::schema::RelayConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Check every semantic constraint, collecting all violations.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.node.rpc_url.trim().is_empty() {
        push(&mut errors, "node.rpc_url", "must not be empty");
    } else if url::Url::parse(&config.node.rpc_url).is_err() {
        push(&mut errors, "node.rpc_url", "is not a valid URL");
    }
    for (i, u) in config.node.failover_urls.iter().enumerate() {
        if url::Url::parse(u).is_err() {
            push(
                &mut errors,
                &format!("node.failover_urls[{}]", i),
                "is not a valid URL",
            );
        }
    }
    if config.node.chain_id.trim().is_empty() {
        push(&mut errors, "node.chain_id", "must not be empty");
    }
    if config.node.rpc_timeout_secs == 0 {
        push(&mut errors, "node.rpc_timeout_secs", "must be greater than 0");
    }

    if config.queue.confirmation_timeout_ms == 0 {
        push(
            &mut errors,
            "queue.confirmation_timeout_ms",
            "must be greater than 0",
        );
    }
    if config.queue.tick_period_ms == 0 {
        push(&mut errors, "queue.tick_period_ms", "must be greater than 0");
    }
    if config.queue.rc_limit_divisor == 0 {
        push(&mut errors, "queue.rc_limit_divisor", "must be greater than 0");
    }

    if config.scanner.enabled && config.scanner.sweep_interval_secs == 0 {
        push(
            &mut errors,
            "scanner.sweep_interval_secs",
            "must be greater than 0",
        );
    }
    if config.scanner.accounts_page_size == 0 {
        push(
            &mut errors,
            "scanner.accounts_page_size",
            "must be greater than 0",
        );
    }

    let mut seen = HashSet::new();
    for (i, pool) in config.pools.iter().enumerate() {
        if pool.contract.trim().is_empty() {
            push(
                &mut errors,
                &format!("pools[{}].contract", i),
                "must not be empty",
            );
        } else if !seen.insert(pool.contract.as_str()) {
            push(
                &mut errors,
                &format!("pools[{}].contract", i),
                "duplicates an earlier pool",
            );
        }
    }

    if !LOG_LEVELS.contains(&config.observability.log_level.as_str()) {
        push(
            &mut errors,
            "observability.log_level",
            "must be one of trace, debug, info, warn, error",
        );
    }
    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<std::net::SocketAddr>()
            .is_err()
    {
        push(
            &mut errors,
            "observability.metrics_address",
            "is not a valid socket address",
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn push(errors: &mut Vec<ValidationError>, field: &str, message: &str) {
    errors.push(ValidationError {
        field: field.to_string(),
        message: message.to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::PoolConfig;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&RelayConfig::default()).is_ok());
    }

    #[test]
    fn test_invalid_rpc_url_rejected() {
        let mut config = RelayConfig::default();
        config.node.rpc_url = "not a url".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "node.rpc_url"));
    }

    #[test]
    fn test_all_errors_are_collected() {
        let mut config = RelayConfig::default();
        config.node.rpc_url = String::new();
        config.queue.rc_limit_divisor = 0;
        config.scanner.accounts_page_size = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_duplicate_pool_contracts_rejected() {
        let mut config = RelayConfig::default();
        config.pools.push(PoolConfig {
            contract: "pool-a".to_string(),
            label: "first".to_string(),
        });
        config.pools.push(PoolConfig {
            contract: "pool-a".to_string(),
            label: "second".to_string(),
        });
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "pools[1].contract");
    }

    #[test]
    fn test_bad_metrics_address_rejected_only_when_enabled() {
        let mut config = RelayConfig::default();
        config.observability.metrics_address = "nowhere".to_string();
        assert!(validate_config(&config).is_err());

        config.observability.metrics_enabled = false;
        assert!(validate_config(&config).is_ok());
    }
}
