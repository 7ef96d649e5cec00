use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("DATABASE_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("DATABASE_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5432),
            database: std::env::var("DATABASE_NAME")
                .unwrap_or_else(|_| "marketplace_api".to_string()),
            username: std::env::var("DATABASE_USER").unwrap_or_else(|_| "postgres".to_string()),
            password: if let Ok(path) = std::env::var("DATABASE_PASSWORD_FILE") {
                std::fs::read_to_string(&path)
                    .map(|p| p.trim().to_string())
                    .unwrap_or_else(|e| {
                        panic!("Failed to read DATABASE_PASSWORD_FILE at {}: {}", path, e)
                    })
            } else {
                std::env::var("DATABASE_PASSWORD").unwrap_or_else(|_| "postgres".to_string())
            },
            max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(10),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("SERVER_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
        }
    }
}

/// Stripe payment configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StripeConfig {
    /// Stripe secret key for API authentication
    pub secret_key: String,
    /// Stripe webhook secret for verifying webhook signatures
    pub webhook_secret: String,
    /// ISO currency code used for payment intents (e.g. "usd")
    pub currency: String,
}

impl Default for StripeConfig {
    fn default() -> Self {
        Self {
            secret_key: if let Ok(path) = std::env::var("STRIPE_SECRET_KEY_FILE") {
                std::fs::read_to_string(&path)
                    .map(|s| s.trim().to_string())
                    .unwrap_or_else(|e| {
                        panic!("Failed to read STRIPE_SECRET_KEY_FILE at {}: {}", path, e)
                    })
            } else {
                std::env::var("STRIPE_SECRET_KEY").unwrap_or_default()
            },
            webhook_secret: if let Ok(path) = std::env::var("STRIPE_WEBHOOK_SECRET_FILE") {
                std::fs::read_to_string(&path)
                    .map(|s| s.trim().to_string())
                    .unwrap_or_else(|e| {
                        panic!("Failed to read STRIPE_WEBHOOK_SECRET_FILE at {}: {}", path, e)
                    })
            } else {
                std::env::var("STRIPE_WEBHOOK_SECRET").unwrap_or_default()
            },
            currency: std::env::var("STRIPE_CURRENCY")
                .unwrap_or_else(|_| "usd".to_string())
                .to_lowercase(),
        }
    }
}

impl StripeConfig {
    /// Returns true when both secrets are present
    pub fn is_configured(&self) -> bool {
        !self.secret_key.is_empty() && !self.webhook_secret.is_empty()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub exact_matches: Vec<String>,
    pub wildcard_suffixes: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        let raw_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        let mut exact_matches = Vec::new();
        let mut wildcard_suffixes = Vec::new();

        for origin in raw_origins.split(',') {
            let s = origin.trim();
            if s.is_empty() {
                continue;
            }

            if let Some(suffix) = s.strip_prefix('*') {
                let safe_suffix = if suffix.starts_with('.') || suffix.starts_with('-') {
                    suffix.to_string()
                } else {
                    format!(".{}", suffix)
                };
                wildcard_suffixes.push(safe_suffix);
            } else {
                exact_matches.push(s.to_string());
            }
        }

        Self {
            exact_matches,
            wildcard_suffixes,
        }
    }
}

/// Aggregate application configuration loaded from the environment
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub stripe: StripeConfig,
    pub cors: CorsConfig,
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_database_config_defaults() {
        std::env::remove_var("DATABASE_HOST");
        std::env::remove_var("DATABASE_PORT");
        std::env::remove_var("DATABASE_NAME");

        let config = DatabaseConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 5432);
        assert_eq!(config.database, "marketplace_api");
    }

    #[test]
    #[serial]
    fn test_database_config_reads_env() {
        std::env::set_var("DATABASE_HOST", "db.internal");
        std::env::set_var("DATABASE_PORT", "5433");

        let config = DatabaseConfig::default();
        assert_eq!(config.host, "db.internal");
        assert_eq!(config.port, 5433);

        std::env::remove_var("DATABASE_HOST");
        std::env::remove_var("DATABASE_PORT");
    }

    #[test]
    #[serial]
    fn test_cors_config_splits_wildcards() {
        std::env::set_var(
            "CORS_ALLOWED_ORIGINS",
            "https://shop.example.com, *.example.net",
        );

        let config = CorsConfig::default();
        assert_eq!(config.exact_matches, vec!["https://shop.example.com"]);
        assert_eq!(config.wildcard_suffixes, vec![".example.net"]);

        std::env::remove_var("CORS_ALLOWED_ORIGINS");
    }

    #[test]
    #[serial]
    fn test_stripe_currency_is_lowercased() {
        std::env::set_var("STRIPE_CURRENCY", "EUR");

        let config = StripeConfig::default();
        assert_eq!(config.currency, "eur");

        std::env::remove_var("STRIPE_CURRENCY");
    }

    #[test]
    fn test_stripe_config_not_configured_when_secrets_empty() {
        let config = StripeConfig {
            secret_key: String::new(),
            webhook_secret: String::new(),
            currency: "usd".to_string(),
        };
        assert!(!config.is_configured());
    }

    #[test]
    fn test_stripe_config_configured() {
        let config = StripeConfig {
            secret_key: "sk_test_dummy".to_string(),
            webhook_secret: "whsec_dummy".to_string(),
            currency: "usd".to_string(),
        };
        assert!(config.is_configured());
    }
}
