use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::metadata;
use crate::shortcode;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub metadata: MetadataConfig,
    pub short_code_length: usize,
    /// Path to an HTML file replacing the built-in preview template
    pub preview_template_path: Option<String>,
    /// Take the client IP from X-Forwarded-For / X-Real-IP
    pub trust_proxy_headers: bool,
    pub cors_permissive: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataConfig {
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database: DatabaseConfig {
                url: "sqlite://./linkpeek.db".to_string(),
                max_connections: 5,
            },
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            metadata: MetadataConfig {
                user_agent: metadata::DEFAULT_USER_AGENT.to_string(),
                timeout_secs: metadata::DEFAULT_TIMEOUT.as_secs(),
            },
            short_code_length: shortcode::DEFAULT_CODE_LENGTH,
            preview_template_path: None,
            trust_proxy_headers: false,
            cors_permissive: true,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let database_url = lookup("DATABASE_URL").unwrap_or(defaults.database.url);
        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(v) => v
                .parse::<u32>()
                .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?,
            None => defaults.database.max_connections,
        };

        let host = lookup("HOST").unwrap_or(defaults.server.host);
        let port = match lookup("PORT") {
            Some(v) => v.parse::<u16>().context("PORT must be a valid port number")?,
            None => defaults.server.port,
        };

        let short_code_length = match lookup("SHORT_CODE_LENGTH") {
            Some(v) => v
                .parse::<usize>()
                .context("SHORT_CODE_LENGTH must be an integer")?,
            None => defaults.short_code_length,
        };
        if !(4..=64).contains(&short_code_length) {
            anyhow::bail!("SHORT_CODE_LENGTH must be between 4 and 64, got {short_code_length}");
        }

        let timeout_secs = match lookup("METADATA_TIMEOUT_SECS") {
            Some(v) => v
                .parse::<u64>()
                .context("METADATA_TIMEOUT_SECS must be an integer")?,
            None => defaults.metadata.timeout_secs,
        };
        let user_agent = lookup("METADATA_USER_AGENT").unwrap_or(defaults.metadata.user_agent);

        let preview_template_path = lookup("PREVIEW_TEMPLATE_PATH").filter(|p| !p.is_empty());

        let trust_proxy_headers = lookup("TRUST_PROXY_HEADERS")
            .map(|v| parse_bool(&v))
            .unwrap_or(defaults.trust_proxy_headers);
        let cors_permissive = lookup("CORS_PERMISSIVE")
            .map(|v| parse_bool(&v))
            .unwrap_or(defaults.cors_permissive);

        Ok(Config {
            database: DatabaseConfig {
                url: database_url,
                max_connections: max_connections.max(1),
            },
            server: ServerConfig { host, port },
            metadata: MetadataConfig {
                user_agent,
                timeout_secs,
            },
            short_code_length,
            preview_template_path,
            trust_proxy_headers,
            cors_permissive,
        })
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes")
}
