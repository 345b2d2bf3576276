use crate::{MetricsError, Result};
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MetricsConfig {
    /// Metrics server host
    #[serde(default = "default_host")]
    pub host: String,

    /// Metrics server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    9090
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl MetricsConfig {
    /// Endpoint settings, or `None` when no metrics endpoint was asked for
    ///
    /// Setting `METRICS_PORT` or `METRICS_ENABLED` turns the endpoint on;
    /// `METRICS_ENABLED=false` turns it off regardless of the port.
    pub fn from_env() -> Result<Option<Self>> {
        Self::resolve(
            env::var("METRICS_ENABLED").ok(),
            env::var("METRICS_HOST").ok(),
            env::var("METRICS_PORT").ok(),
        )
    }

    fn resolve(
        enabled: Option<String>,
        host: Option<String>,
        port: Option<String>,
    ) -> Result<Option<Self>> {
        let switched_off = enabled
            .as_deref()
            .is_some_and(|v| matches!(v.trim().to_lowercase().as_str(), "false" | "0" | "no"));
        if switched_off || (enabled.is_none() && port.is_none()) {
            return Ok(None);
        }

        let port = match port {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| MetricsError::Config(format!("METRICS_PORT is not a port: {}", raw)))?,
            None => default_port(),
        };

        Ok(Some(Self {
            host: host.unwrap_or_else(default_host),
            port,
        }))
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(v: &str) -> Option<String> {
        Some(v.to_string())
    }

    #[test]
    fn test_disabled_unless_requested() {
        assert_eq!(MetricsConfig::resolve(None, None, None).unwrap(), None);
        assert_eq!(
            MetricsConfig::resolve(some("false"), None, some("9100")).unwrap(),
            None
        );
    }

    #[test]
    fn test_port_or_flag_enables() {
        let config = MetricsConfig::resolve(None, some("127.0.0.1"), some("9100"))
            .unwrap()
            .unwrap();
        assert_eq!(config.address(), "127.0.0.1:9100");

        let config = MetricsConfig::resolve(some("true"), None, None).unwrap().unwrap();
        assert_eq!(config, MetricsConfig::default());

        assert!(MetricsConfig::resolve(None, None, some("ninety")).is_err());
    }
}
