use std::time::Duration;

const URL_SCHEME: &str = "graph://";

/// Graph driver configuration
///
/// Connection strings look like `graph://host:port/database?max_sessions=16`.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Store host (informational for the in-process store)
    pub host: String,

    /// Store port (informational for the in-process store)
    pub port: u16,

    /// Database name
    pub database: String,

    /// Maximum number of concurrently open sessions
    pub max_sessions: usize,

    /// How long `open_session` waits for a free slot
    pub acquire_timeout: Duration,
}

impl DriverConfig {
    pub fn new() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 7687,
            database: "neo4j".to_string(),
            max_sessions: 16,
            acquire_timeout: Duration::from_secs(5),
        }
    }

    pub fn host(mut self, host: &str) -> Self {
        self.host = host.to_string();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn database(mut self, database: &str) -> Self {
        self.database = database.to_string();
        self
    }

    pub fn max_sessions(mut self, max: usize) -> Self {
        self.max_sessions = max;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Parse from a connection string
    ///
    /// ```
    /// use fruitgraph::DriverConfig;
    ///
    /// let config = DriverConfig::from_url("graph://db.local:7687/fruits?max_sessions=4").unwrap();
    /// assert_eq!(config.database, "fruits");
    /// assert_eq!(config.max_sessions, 4);
    /// ```
    pub fn from_url(url: &str) -> Result<Self, String> {
        let rest = url
            .strip_prefix(URL_SCHEME)
            .ok_or_else(|| format!("URL must start with '{}'", URL_SCHEME))?;

        let (location, query) = match rest.split_once('?') {
            Some((location, query)) => (location, Some(query)),
            None => (rest, None),
        };

        let (host_port, database) = location
            .split_once('/')
            .ok_or_else(|| "Invalid host/database format".to_string())?;
        if database.is_empty() {
            return Err("Database name cannot be empty".to_string());
        }

        let (host, port) = match host_port.split_once(':') {
            Some((host, port)) => (
                host,
                port.parse::<u16>().map_err(|_| "Invalid port".to_string())?,
            ),
            None => (host_port, 7687),
        };

        let mut config = Self::new().host(host).port(port).database(database);

        for pair in query.into_iter().flat_map(|q| q.split('&')).filter(|p| !p.is_empty()) {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| format!("Invalid option '{}'", pair))?;
            match key {
                "max_sessions" => {
                    config.max_sessions = value
                        .parse()
                        .map_err(|_| "max_sessions must be an integer".to_string())?;
                }
                "acquire_timeout_ms" => {
                    let ms: u64 = value
                        .parse()
                        .map_err(|_| "acquire_timeout_ms must be an integer".to_string())?;
                    config.acquire_timeout = Duration::from_millis(ms);
                }
                other => return Err(format!("Unknown option '{}'", other)),
            }
        }

        Ok(config)
    }

    pub fn to_url(&self) -> String {
        format!(
            "{}{}:{}/{}?max_sessions={}",
            URL_SCHEME, self.host, self.port, self.database, self.max_sessions
        )
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.host.is_empty() {
            return Err("Host cannot be empty".to_string());
        }

        if self.database.is_empty() {
            return Err("Database name cannot be empty".to_string());
        }

        if self.max_sessions == 0 {
            return Err("max_sessions must be > 0".to_string());
        }

        Ok(())
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DriverConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 7687);
        assert_eq!(config.max_sessions, 16);
    }

    #[test]
    fn test_from_url() {
        let config = DriverConfig::from_url(
            "graph://db.example.com:7688/production?max_sessions=3&acquire_timeout_ms=250",
        )
        .unwrap();

        assert_eq!(config.host, "db.example.com");
        assert_eq!(config.port, 7688);
        assert_eq!(config.database, "production");
        assert_eq!(config.max_sessions, 3);
        assert_eq!(config.acquire_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_from_url_default_port() {
        let config = DriverConfig::from_url("graph://localhost/fruits").unwrap();
        assert_eq!(config.port, 7687);
        assert_eq!(config.to_url(), "graph://localhost:7687/fruits?max_sessions=16");
    }

    #[test]
    fn test_invalid_url() {
        assert!(DriverConfig::from_url("bolt://localhost/neo4j").is_err());
        assert!(DriverConfig::from_url("graph://localhost").is_err());
        assert!(DriverConfig::from_url("graph://localhost:port/db").is_err());
        assert!(DriverConfig::from_url("graph://localhost/db?pool=2").is_err());
    }

    #[test]
    fn test_validate() {
        assert!(DriverConfig::new().validate().is_ok());
        assert!(DriverConfig::new().max_sessions(0).validate().is_err());
        assert!(DriverConfig::new().database("").validate().is_err());
    }
}
