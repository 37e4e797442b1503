//! Configuration module for the relay gateway
//!
//! Provides layered configuration loading from files, environment variables,
//! and defaults.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`RELAY_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)

pub mod endpoint;
pub mod error;
pub mod fallback;
pub mod logging;
pub mod routing;
pub mod server;

pub use endpoint::Endpoint;
pub use error::ConfigError;
pub use fallback::{CacheConfig, FallbackConfig};
pub use logging::{LogFormat, LoggingConfig};
pub use routing::RoutingConfig;
pub use server::ServerConfig;

// Re-exported so config consumers see one surface.
pub use crate::breaker::BreakerConfig;
pub use crate::health::HealthCheckConfig;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Unified configuration for the relay gateway.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// HTTP server settings
    pub server: ServerConfig,
    /// Logging settings
    pub logging: LoggingConfig,
    /// Background health probe settings
    pub health_check: HealthCheckConfig,
    /// Global circuit breaker defaults
    pub breaker: BreakerConfig,
    /// Response cache settings
    pub cache: CacheConfig,
    /// Fallback chain settings
    pub fallback: FallbackConfig,
    /// Routing policy
    pub routing: RoutingConfig,
    /// Static endpoint definitions
    pub endpoints: Vec<Endpoint>,
}

impl RelayConfig {
    /// Load configuration from a TOML file.
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply environment variable overrides.
    ///
    /// Supports RELAY_* environment variables for common settings.
    /// Invalid values are silently ignored (defaults are kept).
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(port) = std::env::var("RELAY_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }
        if let Ok(host) = std::env::var("RELAY_HOST") {
            self.server.host = host;
        }
        if let Ok(level) = std::env::var("RELAY_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("RELAY_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }
        if let Ok(health) = std::env::var("RELAY_HEALTH_CHECK") {
            self.health_check.enabled = health.to_lowercase() == "true";
        }
        self
    }

    /// Validate configuration.
    ///
    /// Catches the misconfigurations that would otherwise only surface as
    /// runtime routing failures: dangling endpoint references, a missing
    /// "general" intent, an empty degraded message.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::validation(
                "server.port",
                "port must be non-zero",
            ));
        }

        if self.endpoints.is_empty() {
            return Err(ConfigError::validation(
                "endpoints",
                "at least one endpoint must be configured",
            ));
        }

        let mut names = HashSet::new();
        for (i, endpoint) in self.endpoints.iter().enumerate() {
            if endpoint.name.is_empty() {
                return Err(ConfigError::validation(
                    format!("endpoints[{}].name", i),
                    "name cannot be empty",
                ));
            }
            if endpoint.url.is_empty() {
                return Err(ConfigError::validation(
                    format!("endpoints[{}].url", i),
                    "URL cannot be empty",
                ));
            }
            if !names.insert(endpoint.name.as_str()) {
                return Err(ConfigError::validation(
                    format!("endpoints[{}].name", i),
                    format!("duplicate endpoint name '{}'", endpoint.name),
                ));
            }
        }

        if !self.routing.intents.contains_key("general") {
            return Err(ConfigError::validation(
                "routing.intents",
                "an intent mapping for \"general\" is required",
            ));
        }
        for (intent, target) in &self.routing.intents {
            if !names.contains(target.as_str()) {
                return Err(ConfigError::validation(
                    format!("routing.intents.{}", intent),
                    format!("unknown endpoint '{}'", target),
                ));
            }
        }
        for (primary, fallbacks) in &self.routing.fallbacks {
            if !names.contains(primary.as_str()) {
                return Err(ConfigError::validation(
                    format!("routing.fallbacks.{}", primary),
                    format!("unknown endpoint '{}'", primary),
                ));
            }
            for target in fallbacks {
                if !names.contains(target.as_str()) {
                    return Err(ConfigError::validation(
                        format!("routing.fallbacks.{}", primary),
                        format!("unknown fallback endpoint '{}'", target),
                    ));
                }
            }
        }

        for tier in &self.fallback.tiers {
            if !names.contains(tier.as_str()) {
                return Err(ConfigError::validation(
                    "fallback.tiers",
                    format!("unknown endpoint '{}'", tier),
                ));
            }
        }
        if self.fallback.degraded_text.trim().is_empty() {
            return Err(ConfigError::validation(
                "fallback.degraded_text",
                "degraded response text cannot be empty",
            ));
        }

        Ok(())
    }

    /// Endpoint lookup by name.
    pub fn endpoint(&self, name: &str) -> Option<&Endpoint> {
        self.endpoints.iter().find(|e| e.name == name)
    }
}
