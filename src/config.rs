use crate::connection::config::DriverConfig;
use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub graph_url: String,
    /// Overrides the URL's `max_sessions` when set
    pub max_sessions: Option<usize>,
    /// Overrides the URL's `acquire_timeout_ms` when set
    pub acquire_timeout: Option<Duration>,
    pub unique_names: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let host = env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .context("APP_PORT must be a valid u16")?;

        let graph_url = env::var("GRAPH_URL")
            .unwrap_or_else(|_| "graph://localhost:7687/neo4j".to_string());

        let max_sessions = env::var("GRAPH_MAX_SESSIONS")
            .ok()
            .map(|raw| raw.parse::<usize>())
            .transpose()
            .context("GRAPH_MAX_SESSIONS must be a valid usize")?;

        let acquire_timeout = env::var("GRAPH_ACQUIRE_TIMEOUT_MS")
            .ok()
            .map(|raw| raw.parse::<u64>().map(Duration::from_millis))
            .transpose()
            .context("GRAPH_ACQUIRE_TIMEOUT_MS must be a valid u64")?;

        let unique_names = parse_flag(
            &env::var("FRUIT_UNIQUE_NAMES").unwrap_or_else(|_| "false".to_string()),
        )
        .context("FRUIT_UNIQUE_NAMES must be a boolean")?;

        Ok(Self {
            host,
            port,
            graph_url,
            max_sessions,
            acquire_timeout,
            unique_names,
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Driver settings: the URL first, then any explicit session limits
    pub fn driver_config(&self) -> Result<DriverConfig> {
        let mut config = DriverConfig::from_url(&self.graph_url)
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("invalid GRAPH_URL '{}'", self.graph_url))?;

        if let Some(max) = self.max_sessions {
            config = config.max_sessions(max);
        }
        if let Some(timeout) = self.acquire_timeout {
            config = config.acquire_timeout(timeout);
        }
        Ok(config)
    }
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(anyhow::anyhow!("unrecognized flag value '{}'", other)),
    }
}
