//! Configuration validation

use crate::{AppConfig, ConfigError, Result};
use rust_decimal::Decimal;

/// Validation error details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate the entire application configuration
pub fn validate_config(config: &AppConfig) -> Result<()> {
    let mut errors = Vec::new();

    if let Err(e) = validate_log_level(&config.network.log_level) {
        errors.push(e);
    }

    if config.network.metrics_port == 0 {
        errors.push(ValidationError::new(
            "network.metrics_port",
            "metrics port must be greater than 0",
        ));
    }

    if !rate_in_unit_interval(config.pricing.tax_rate) {
        errors.push(ValidationError::new(
            "pricing.tax_rate",
            "must be between 0 and 1",
        ));
    }

    if !rate_in_unit_interval(config.pricing.admin_commission_rate) {
        errors.push(ValidationError::new(
            "pricing.admin_commission_rate",
            "must be between 0 and 1",
        ));
    }

    if config.distance.timeout_ms == 0 {
        errors.push(ValidationError::new(
            "distance.timeout_ms",
            "must be greater than 0",
        ));
    }

    if config.distance.max_retries == 0 {
        errors.push(ValidationError::new(
            "distance.max_retries",
            "must allow at least one attempt",
        ));
    }

    if config.dispatch.assignment_ttl_secs == 0 {
        errors.push(ValidationError::new(
            "dispatch.assignment_ttl_secs",
            "must be greater than 0",
        ));
    }

    if config.dispatch.sweep_interval_secs == 0 {
        errors.push(ValidationError::new(
            "dispatch.sweep_interval_secs",
            "must be greater than 0",
        ));
    }

    if config.dispatch.notify_capacity == 0 {
        errors.push(ValidationError::new(
            "dispatch.notify_capacity",
            "must be greater than 0",
        ));
    }

    if config.database.path.is_empty() {
        errors.push(ValidationError::new(
            "database.path",
            "database path is required",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        let message = errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        Err(ConfigError::ValidationError(message))
    }
}

fn rate_in_unit_interval(rate: Decimal) -> bool {
    rate >= Decimal::ZERO && rate <= Decimal::ONE
}

fn validate_log_level(level: &str) -> std::result::Result<(), ValidationError> {
    match level {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        other => Err(ValidationError::new(
            "network.log_level",
            format!("unknown log level: {other}"),
        )),
    }
}
