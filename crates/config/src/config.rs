//! Core configuration structures for the CourseMax marketplace services

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Network/runtime configuration
    pub network: NetworkConfig,

    /// Receipt and commission configuration
    pub pricing: PricingConfig,

    /// Distance provider configuration
    pub distance: DistanceConfig,

    /// Driver dispatch configuration
    pub dispatch: DispatchSettings,

    /// Storage configuration
    pub database: DatabaseConfig,
}

/// Runtime environment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Environment type (production, staging, local)
    pub environment: Environment,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable metrics collection
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,

    /// Metrics server port
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

/// Environment types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Production,
    Staging,
    #[default]
    Local,
}

/// Receipt calculation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Combined sales-tax rate applied to product subtotals
    #[serde(default = "default_tax_rate")]
    pub tax_rate: Decimal,

    /// Platform commission rate over the grand total
    #[serde(default)]
    pub admin_commission_rate: Decimal,
}

/// Distance provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistanceConfig {
    /// Per-call timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum attempts per provider call, including the first
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial retry delay in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub initial_retry_delay_ms: u64,
}

/// Driver dispatch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchSettings {
    /// How long a batch stays claimable, in seconds
    #[serde(default = "default_assignment_ttl_secs")]
    pub assignment_ttl_secs: u64,

    /// Interval between expiry sweeps, in seconds
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Broadcast channel capacity for driver notifications
    #[serde(default = "default_notify_capacity")]
    pub notify_capacity: usize,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database path
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_metrics_port() -> u16 {
    9090
}

fn default_tax_rate() -> Decimal {
    Decimal::new(15, 2)
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    200
}

fn default_assignment_ttl_secs() -> u64 {
    900
}

fn default_sweep_interval_secs() -> u64 {
    300
}

fn default_notify_capacity() -> usize {
    256
}

fn default_db_path() -> String {
    "coursemax.db".to_string()
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Local,
            log_level: default_log_level(),
            metrics_enabled: true,
            metrics_port: default_metrics_port(),
        }
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            tax_rate: default_tax_rate(),
            admin_commission_rate: Decimal::ZERO,
        }
    }
}

impl Default for DistanceConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            max_retries: default_max_retries(),
            initial_retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            assignment_ttl_secs: default_assignment_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            notify_capacity: default_notify_capacity(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.network.environment, Environment::Local);
        assert_eq!(config.pricing.tax_rate, Decimal::from_str("0.15").unwrap());
        assert_eq!(config.pricing.admin_commission_rate, Decimal::ZERO);
        assert_eq!(config.distance.timeout_ms, 10_000);
        assert_eq!(config.dispatch.sweep_interval_secs, 300);
    }
}
