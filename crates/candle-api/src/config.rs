use candle_core::config::parse_env;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Server host
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Enable CORS
    #[serde(default = "default_cors")]
    pub cors_enabled: bool,

    /// CORS allowed origins (comma-separated)
    #[serde(default)]
    pub cors_origins: Option<String>,

    /// Upper bound on a requested page size
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    4000
}

fn default_cors() -> bool {
    true
}

fn default_max_page_size() -> u32 {
    3000
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_enabled: default_cors(),
            cors_origins: None,
            max_page_size: default_max_page_size(),
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> candle_core::Result<Self> {
        Ok(Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| default_host()),
            port: parse_env("API_PORT")?.unwrap_or_else(default_port),
            cors_enabled: parse_env("API_CORS_ENABLED")?.unwrap_or_else(default_cors),
            cors_origins: std::env::var("API_CORS_ORIGINS")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            max_page_size: parse_env::<u32>("API_MAX_PAGE_SIZE")?
                .unwrap_or_else(default_max_page_size)
                .max(1),
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Configured origins, or `None` to allow any
    pub fn allowed_origins(&self) -> Option<Vec<String>> {
        self.cors_origins.as_ref().map(|origins| {
            origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_origins() {
        let mut config = ApiConfig::default();
        assert_eq!(config.allowed_origins(), None);

        config.cors_origins = Some("https://a.example, https://b.example,".to_string());
        assert_eq!(
            config.allowed_origins(),
            Some(vec!["https://a.example".to_string(), "https://b.example".to_string()])
        );
        assert_eq!(config.address(), "0.0.0.0:4000");
    }
}
