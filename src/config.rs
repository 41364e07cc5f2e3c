//! Configuration management for Tollgate.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::error::{Result, TollgateError};
use crate::ratelimit::LimiterConfig;

/// Prefix for environment variable overrides, e.g. `TOLLGATE_SERVER__HTTP_ADDR`.
const ENV_PREFIX: &str = "TOLLGATE";

/// Main configuration for the Tollgate service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TollgateConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limiting: RateLimitingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP listen address
    #[serde(default = "default_http_addr")]
    pub http_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
        }
    }
}

fn default_http_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8000))
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitingConfig {
    /// Seconds between stale window sweeps; 0 disables sweeping
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// Limits for protected endpoints
    #[serde(default = "default_endpoints")]
    pub endpoints: Vec<EndpointLimit>,
}

impl Default for RateLimitingConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: default_sweep_interval(),
            endpoints: default_endpoints(),
        }
    }
}

impl RateLimitingConfig {
    /// The sweep interval, or `None` if sweeping is disabled.
    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval_secs > 0).then(|| Duration::from_secs(self.sweep_interval_secs))
    }

    /// Find the limit configured for a route path.
    pub fn endpoint(&self, path: &str) -> Option<&EndpointLimit> {
        self.endpoints.iter().find(|e| e.path == path)
    }
}

fn default_sweep_interval() -> u64 {
    60
}

fn default_endpoints() -> Vec<EndpointLimit> {
    vec![EndpointLimit {
        path: "/".to_string(),
        max_calls: 5,
        period_secs: 60,
    }]
}

/// Rate limit applied to a single route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointLimit {
    /// Route path, e.g. `/`
    pub path: String,
    /// Requests allowed per client within the period
    pub max_calls: u32,
    /// Length of the trailing window in seconds
    pub period_secs: u64,
}

impl EndpointLimit {
    /// Validate into a limiter configuration.
    pub fn limiter_config(&self) -> Result<LimiterConfig> {
        let period = Duration::from_secs(self.period_secs);
        LimiterConfig::new(self.max_calls, period).map_err(|e| match e {
            TollgateError::Config(msg) => {
                TollgateError::Config(format!("endpoint {}: {}", self.path, msg))
            }
            other => other,
        })
    }
}

impl TollgateConfig {
    /// Load configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: TollgateConfig = serde_yaml::from_str(yaml)
            .map_err(|e| TollgateError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file path.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading configuration file");

        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Load configuration from an optional file, overridden by
    /// `TOLLGATE_*` environment variables.
    ///
    /// Nested keys are separated by a double underscore, so
    /// `TOLLGATE_RATE_LIMITING__SWEEP_INTERVAL_SECS=30` sets
    /// `rate_limiting.sweep_interval_secs`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            info!(path = %path.display(), "Loading configuration file");
            builder = builder.add_source(config::File::from(path));
        }

        let config: TollgateConfig = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| TollgateError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Check every endpoint limit and reject duplicate paths.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for endpoint in &self.rate_limiting.endpoints {
            endpoint.limiter_config()?;
            if !seen.insert(endpoint.path.as_str()) {
                return Err(TollgateError::Config(format!(
                    "duplicate rate limit for endpoint {}",
                    endpoint.path
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = TollgateConfig::default();
        assert_eq!(config.server.http_addr, "127.0.0.1:8000".parse::<SocketAddr>().unwrap());
        assert_eq!(
            config.rate_limiting.sweep_interval(),
            Some(Duration::from_secs(60))
        );

        let root = config.rate_limiting.endpoint("/").unwrap();
        assert_eq!(root.max_calls, 5);
        assert_eq!(root.period_secs, 60);
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
server:
  http_addr: 0.0.0.0:9000
rate_limiting:
  sweep_interval_secs: 0
  endpoints:
    - path: /
      max_calls: 2
      period_secs: 10
"#;
        let config = TollgateConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.server.http_addr, "0.0.0.0:9000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.rate_limiting.sweep_interval(), None);

        let limit = config.rate_limiting.endpoint("/").unwrap().limiter_config().unwrap();
        assert_eq!(limit.max_calls(), 2);
        assert_eq!(limit.period(), Duration::from_secs(10));
    }

    #[test]
    fn test_parse_partial_config_uses_defaults() {
        let yaml = r#"
server:
  http_addr: 127.0.0.1:8123
"#;
        let config = TollgateConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.rate_limiting.endpoints, default_endpoints());
        assert_eq!(config.rate_limiting.sweep_interval_secs, 60);
    }

    #[test]
    fn test_zero_max_calls_rejected() {
        let yaml = r#"
rate_limiting:
  endpoints:
    - path: /
      max_calls: 0
      period_secs: 60
"#;
        let err = TollgateConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, TollgateError::Config(_)));
        assert!(err.to_string().contains("max_calls"));
    }

    #[test]
    fn test_zero_period_rejected() {
        let yaml = r#"
rate_limiting:
  endpoints:
    - path: /
      max_calls: 5
      period_secs: 0
"#;
        assert!(matches!(
            TollgateConfig::from_yaml(yaml),
            Err(TollgateError::Config(_))
        ));
    }

    #[test]
    fn test_negative_max_calls_rejected() {
        let yaml = r#"
rate_limiting:
  endpoints:
    - path: /
      max_calls: -1
      period_secs: 60
"#;
        assert!(matches!(
            TollgateConfig::from_yaml(yaml),
            Err(TollgateError::Config(_))
        ));
    }

    #[test]
    fn test_duplicate_endpoint_rejected() {
        let yaml = r#"
rate_limiting:
  endpoints:
    - path: /
      max_calls: 5
      period_secs: 60
    - path: /
      max_calls: 1
      period_secs: 1
"#;
        let err = TollgateConfig::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "rate_limiting:\n  endpoints:\n    - path: /\n      max_calls: 3\n      period_secs: 30"
        )
        .unwrap();

        let config = TollgateConfig::from_file(file.path()).unwrap();
        assert_eq!(config.rate_limiting.endpoint("/").unwrap().max_calls, 3);
    }

    #[test]
    fn test_load_layers_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "server:\n  http_addr: 127.0.0.1:8555").unwrap();

        let config = TollgateConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.server.http_addr, "127.0.0.1:8555".parse::<SocketAddr>().unwrap());
        assert_eq!(config.rate_limiting.endpoints, default_endpoints());
    }

    #[test]
    fn test_load_env_override() {
        // other load tests do not assert on this key
        const VAR: &str = "TOLLGATE_RATE_LIMITING__SWEEP_INTERVAL_SECS";
        std::env::set_var(VAR, "7");
        let result = TollgateConfig::load(None);
        std::env::remove_var(VAR);

        let config = result.unwrap();
        assert_eq!(config.rate_limiting.sweep_interval_secs, 7);
        assert_eq!(
            config.rate_limiting.sweep_interval(),
            Some(Duration::from_secs(7))
        );
        assert_eq!(config.rate_limiting.endpoints, default_endpoints());
    }

    #[test]
    fn test_from_file_missing() {
        let result = TollgateConfig::from_file("/nonexistent/tollgate.yaml");
        assert!(matches!(result, Err(TollgateError::Io(_))));
    }
}
