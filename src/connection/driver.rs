use super::{GraphSession, Session, SessionProvider, config::DriverConfig};
use crate::core::{DbError, Params, Result};
use crate::result::QueryResult;
use crate::storage::GraphStore;
use crate::transaction::AccessMode;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Session bookkeeping shared between the driver and its sessions
#[derive(Debug, Default)]
pub struct SessionCounters {
    opened: AtomicUsize,
    closed: AtomicUsize,
    active: AtomicUsize,
}

impl SessionCounters {
    /// Reserve a slot if fewer than `max` sessions are active
    fn try_reserve(&self, max: usize) -> bool {
        self.active
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |active| {
                (active < max).then_some(active + 1)
            })
            .is_ok()
    }

    pub(crate) fn record_close(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Driver for the in-process graph store
///
/// Hands out [`GraphSession`]s over one shared store, capped at
/// `max_sessions` concurrently open sessions.
pub struct Driver {
    config: DriverConfig,
    store: Arc<RwLock<GraphStore>>,
    counters: Arc<SessionCounters>,
    next_id: AtomicU64,
}

impl Driver {
    /// Create a driver over a fresh, empty store
    pub fn new(config: DriverConfig) -> Result<Self> {
        Self::with_store(config, Arc::new(RwLock::new(GraphStore::new())))
    }

    /// Create a driver over an existing store
    pub fn with_store(config: DriverConfig, store: Arc<RwLock<GraphStore>>) -> Result<Self> {
        config.validate().map_err(DbError::Config)?;

        Ok(Self {
            config,
            store,
            counters: Arc::new(SessionCounters::default()),
            next_id: AtomicU64::new(1),
        })
    }

    /// Create a driver from a `graph://` connection string
    pub fn from_url(url: &str) -> Result<Self> {
        let config = DriverConfig::from_url(url).map_err(DbError::Config)?;
        Self::new(config)
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<RwLock<GraphStore>> {
        &self.store
    }

    /// Open a session, waiting up to `acquire_timeout` for a free slot
    pub async fn session(&self) -> Result<GraphSession> {
        let start = Instant::now();

        loop {
            if self.counters.try_reserve(self.config.max_sessions) {
                self.counters.opened.fetch_add(1, Ordering::SeqCst);
                let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                return Ok(GraphSession::new(
                    id,
                    Arc::clone(&self.store),
                    Arc::clone(&self.counters),
                ));
            }

            if start.elapsed() >= self.config.acquire_timeout {
                warn!(
                    max_sessions = self.config.max_sessions,
                    "no session available before timeout"
                );
                return Err(DbError::SessionUnavailable(format!(
                    "all {} sessions in use",
                    self.config.max_sessions
                )));
            }

            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    /// Run a single write statement in a short-lived session
    pub async fn execute(&self, query: &str, params: Params) -> Result<QueryResult> {
        let mut session = self.session().await?;
        let result = session.run(query, &params, AccessMode::Write).await;
        session.close().await?;
        result
    }

    pub fn stats(&self) -> DriverStats {
        DriverStats {
            opened: self.counters.opened.load(Ordering::SeqCst),
            closed: self.counters.closed.load(Ordering::SeqCst),
            active: self.counters.active.load(Ordering::SeqCst),
            max_sessions: self.config.max_sessions,
        }
    }
}

#[async_trait]
impl SessionProvider for Driver {
    async fn open_session(&self) -> Result<Box<dyn Session>> {
        let session = self.session().await?;
        debug!(session_id = session.id(), "session handed out");
        Ok(Box::new(session))
    }
}

/// Session statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverStats {
    pub opened: usize,
    pub closed: usize,
    pub active: usize,
    pub max_sessions: usize,
}

impl std::fmt::Display for DriverStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Driver Stats: {}/{} active, {} opened, {} closed",
            self.active, self.max_sessions, self.opened, self.closed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    #[tokio::test]
    async fn test_session_lifecycle_is_counted() {
        let driver = Driver::new(DriverConfig::new()).unwrap();

        let mut session = driver.open_session().await.unwrap();
        assert_eq!(driver.stats().active, 1);

        session.close().await.unwrap();
        session.close().await.unwrap();

        let stats = driver.stats();
        assert_eq!(stats.opened, 1);
        assert_eq!(stats.closed, 1);
        assert_eq!(stats.active, 0);
    }

    #[tokio::test]
    async fn test_closed_session_rejects_queries() {
        let driver = Driver::new(DriverConfig::new()).unwrap();
        let mut session = driver.open_session().await.unwrap();
        session.close().await.unwrap();

        let err = match session
            .read_transaction("MATCH (f:Fruit) RETURN f", Params::new())
            .await
        {
            Ok(_) => panic!("closed session must reject queries"),
            Err(err) => err,
        };
        assert!(matches!(err, DbError::SessionClosed(_)));
    }

    #[tokio::test]
    async fn test_acquire_times_out_when_exhausted() {
        let config = DriverConfig::new()
            .max_sessions(1)
            .acquire_timeout(Duration::from_millis(30));
        let driver = Driver::new(config).unwrap();

        let held = driver.session().await.unwrap();
        let err = match driver.open_session().await {
            Ok(_) => panic!("second session must not be granted"),
            Err(err) => err,
        };
        assert!(matches!(err, DbError::SessionUnavailable(_)));

        drop(held);
        assert!(driver.open_session().await.is_ok());
    }

    #[tokio::test]
    async fn test_execute_then_read() {
        let driver = Driver::new(DriverConfig::new()).unwrap();
        for name in ["fig", "date"] {
            let mut params = Params::new();
            params.insert("name".into(), name.into());
            driver
                .execute("CREATE (f:Fruit {name: $name})", params)
                .await
                .unwrap();
        }

        let mut session = driver.open_session().await.unwrap();
        let records: Vec<_> = session
            .read_transaction("MATCH (f:Fruit) RETURN f.name AS name ORDER BY f.name", Params::new())
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        session.close().await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("name").unwrap().as_string().unwrap(), "date");
        assert_eq!(driver.stats().closed, 3);
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(matches!(
            Driver::new(DriverConfig::new().max_sessions(0)),
            Err(DbError::Config(_))
        ));
        assert!(Driver::from_url("graph://localhost:7687/neo4j").is_ok());
    }
}
