use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub kafka: KafkaConfig,
    pub search: SearchConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    /// Prefix of the `X-{app}-alert` headers, shared with the gateway
    pub application_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Base connection URL; the path is swapped for each service database
    pub url: Option<String>,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    /// Keep records in process memory instead of PostgreSQL
    pub in_memory: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KafkaConfig {
    pub enabled: bool,
    pub bootstrap_servers: String,
    pub message_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub enabled: bool,
    pub url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

/// Partial configuration read from `FMS_CONFIG_FILE`; every field is optional
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
struct FileConfig {
    port: Option<u16>,
    application_name: Option<String>,
    database_url: Option<String>,
    database_max_connections: Option<u32>,
    kafka_enabled: Option<bool>,
    kafka_bootstrap_servers: Option<String>,
    search_enabled: Option<bool>,
    search_url: Option<String>,
    jwt_secret: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        let base = match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        };

        // File first, environment last so a single variable can still win
        let base = match env::var("FMS_CONFIG_FILE") {
            Ok(path) => match base.clone().with_file(&path) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Ignoring configuration file: {}", e);
                    base
                }
            },
            Err(_) => base,
        };

        base.with_env_overrides()
    }

    /// Overlay the values present in a YAML file
    pub fn with_file(self, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        self.with_yaml(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    fn with_yaml(mut self, raw: &str) -> Result<Self, serde_yaml::Error> {
        let file: FileConfig = serde_yaml::from_str(raw)?;

        if let Some(v) = file.port {
            self.server.port = v;
        }
        if let Some(v) = file.application_name {
            self.server.application_name = v;
        }
        if let Some(v) = file.database_url {
            self.database.url = Some(v);
        }
        if let Some(v) = file.database_max_connections {
            self.database.max_connections = v;
        }
        if let Some(v) = file.kafka_enabled {
            self.kafka.enabled = v;
        }
        if let Some(v) = file.kafka_bootstrap_servers {
            self.kafka.bootstrap_servers = v;
        }
        if let Some(v) = file.search_enabled {
            self.search.enabled = v;
        }
        if let Some(v) = file.search_url {
            self.search.url = v;
        }
        if let Some(v) = file.jwt_secret {
            self.security.jwt_secret = v;
        }

        Ok(self)
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Some(v) = env::var("FMS_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse().ok())
        {
            self.server.port = v;
        }
        if let Ok(v) = env::var("FMS_APPLICATION_NAME") {
            self.server.application_name = v;
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_ACQUIRE_TIMEOUT_SECS") {
            self.database.acquire_timeout_secs = v.parse().unwrap_or(self.database.acquire_timeout_secs);
        }
        if let Ok(v) = env::var("DATABASE_IN_MEMORY") {
            self.database.in_memory = v.parse().unwrap_or(self.database.in_memory);
        }

        // Kafka overrides
        if let Ok(v) = env::var("KAFKA_ENABLED") {
            self.kafka.enabled = v.parse().unwrap_or(self.kafka.enabled);
        }
        if let Ok(v) = env::var("KAFKA_BOOTSTRAP_SERVERS") {
            self.kafka.bootstrap_servers = v;
        }
        if let Ok(v) = env::var("KAFKA_MESSAGE_TIMEOUT_MS") {
            self.kafka.message_timeout_ms = v.parse().unwrap_or(self.kafka.message_timeout_ms);
        }

        // Search overrides
        if let Ok(v) = env::var("SEARCH_ENABLED") {
            self.search.enabled = v.parse().unwrap_or(self.search.enabled);
        }
        if let Ok(v) = env::var("SEARCH_URL") {
            self.search.url = v;
        }
        if let Ok(v) = env::var("SEARCH_TIMEOUT_SECS") {
            self.search.timeout_secs = v.parse().unwrap_or(self.search.timeout_secs);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 8081,
                application_name: "fmsApp".to_string(),
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                acquire_timeout_secs: 30,
                in_memory: true,
            },
            kafka: KafkaConfig {
                enabled: false,
                bootstrap_servers: "localhost:9092".to_string(),
                message_timeout_ms: 5000,
            },
            search: SearchConfig {
                enabled: false,
                url: "http://localhost:9200".to_string(),
                timeout_secs: 10,
            },
            security: SecurityConfig {
                jwt_secret: "fms-development-secret-change-me".to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
                enable_cors: true,
                cors_origins: vec!["http://localhost:8080".to_string(), "http://localhost:9000".to_string()],
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                port: 8081,
                application_name: "fmsApp".to_string(),
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                acquire_timeout_secs: 10,
                in_memory: false,
            },
            kafka: KafkaConfig {
                enabled: true,
                bootstrap_servers: "kafka:9092".to_string(),
                message_timeout_ms: 5000,
            },
            search: SearchConfig {
                enabled: true,
                url: "http://elasticsearch:9200".to_string(),
                timeout_secs: 10,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                enable_cors: true,
                cors_origins: vec!["https://staging.fms.example.com".to_string()],
            },
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                port: 8081,
                application_name: "fmsApp".to_string(),
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                acquire_timeout_secs: 5,
                in_memory: false,
            },
            kafka: KafkaConfig {
                enabled: true,
                bootstrap_servers: "kafka:9092".to_string(),
                message_timeout_ms: 3000,
            },
            search: SearchConfig {
                enabled: true,
                url: "http://elasticsearch:9200".to_string(),
                timeout_secs: 5,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 4,
                enable_cors: false,
                cors_origins: vec!["https://fms.example.com".to_string()],
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert!(config.database.in_memory);
        assert!(!config.kafka.enabled);
        assert_eq!(config.server.application_name, "fmsApp");
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(!config.database.in_memory);
        assert!(config.kafka.enabled);
        assert!(config.security.jwt_secret.is_empty());
    }

    #[test]
    fn yaml_overlay_only_touches_present_keys() {
        let config = AppConfig::development()
            .with_yaml("port: 9100\nkafka-enabled: true\nsearch-url: http://es:9200\n")
            .unwrap();
        assert_eq!(config.server.port, 9100);
        assert!(config.kafka.enabled);
        assert_eq!(config.search.url, "http://es:9200");
        assert_eq!(config.kafka.bootstrap_servers, "localhost:9092");
        assert!(config.database.in_memory);
    }

    #[test]
    fn yaml_overlay_rejects_wrong_types() {
        assert!(AppConfig::development().with_yaml("port: not-a-number\n").is_err());
    }
}
