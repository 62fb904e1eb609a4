//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtSettings,
    /// Payment gateway configuration.
    #[serde(default)]
    pub paystack: PaystackConfig,
    /// Fee accounting configuration.
    #[serde(default)]
    pub fees: FeesConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// JWT settings as read from configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Access token expiration in seconds.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: u64,
}

fn default_access_token_expiry() -> u64 {
    3600 // 1 hour
}

/// Paystack-compatible gateway configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PaystackConfig {
    /// Secret key sent as bearer token.
    #[serde(default)]
    pub secret_key: String,
    /// Gateway base URL.
    #[serde(default = "default_paystack_base_url")]
    pub base_url: String,
    /// URL the gateway redirects to after checkout.
    #[serde(default)]
    pub callback_url: Option<String>,
    /// Request timeout in seconds.
    #[serde(default = "default_gateway_timeout")]
    pub timeout_secs: u64,
}

impl Default for PaystackConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            base_url: default_paystack_base_url(),
            callback_url: None,
            timeout_secs: default_gateway_timeout(),
        }
    }
}

fn default_paystack_base_url() -> String {
    "https://api.paystack.co".to_string()
}

fn default_gateway_timeout() -> u64 {
    15
}

/// Fee accounting configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FeesConfig {
    /// Substring that marks a manual income category as fee-related.
    #[serde(default = "default_category_marker")]
    pub category_marker: String,
}

impl Default for FeesConfig {
    fn default() -> Self {
        Self {
            category_marker: default_category_marker(),
        }
    }
}

fn default_category_marker() -> String {
    "Fee".to_string()
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("SCHOLARIS").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_environment() {
        temp_env::with_vars(
            [
                ("SCHOLARIS__DATABASE__URL", Some("postgres://localhost/scholaris")),
                ("SCHOLARIS__JWT__SECRET", Some("secret")),
                ("SCHOLARIS__FEES__CATEGORY_MARKER", Some("Tuition")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.database.url, "postgres://localhost/scholaris");
                assert_eq!(config.jwt.secret, "secret");
                assert_eq!(config.fees.category_marker, "Tuition");
                assert_eq!(config.server.port, 8080);
                assert_eq!(config.paystack.base_url, "https://api.paystack.co");
                assert_eq!(config.paystack.timeout_secs, 15);
            },
        );
    }

    #[test]
    fn test_defaults() {
        assert_eq!(FeesConfig::default().category_marker, "Fee");
        assert_eq!(ServerConfig::default().host, "0.0.0.0");
        assert!(PaystackConfig::default().callback_url.is_none());
    }
}
