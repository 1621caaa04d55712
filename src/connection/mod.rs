pub mod config;
pub mod driver;

use crate::core::{DbError, Params, Result};
use crate::executor::Executor;
use crate::result::{QueryResult, Record};
use crate::storage::GraphStore;
use crate::transaction::AccessMode;
use async_trait::async_trait;
use driver::SessionCounters;
use futures::stream::{self, BoxStream, StreamExt};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Records produced by one transaction, in store order
pub type RecordStream = BoxStream<'static, Result<Record>>;

/// A connection-bound context for issuing queries
///
/// A session is owned by exactly one pipeline and must be closed exactly
/// once. Every operation after `close` fails with [`DbError::SessionClosed`].
#[async_trait]
pub trait Session: Send {
    fn id(&self) -> u64;

    /// Run `query` in a read-only transaction
    async fn read_transaction(&mut self, query: &str, params: Params) -> Result<RecordStream>;

    /// Run `query` in a write transaction; on failure nothing is applied
    async fn write_transaction(&mut self, query: &str, params: Params) -> Result<RecordStream>;

    /// Release the session. Closing twice is a no-op.
    async fn close(&mut self) -> Result<()>;
}

/// Source of sessions, e.g. a driver
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn open_session(&self) -> Result<Box<dyn Session>>;
}

/// Session over the in-process graph store
pub struct GraphSession {
    id: u64,
    store: Arc<RwLock<GraphStore>>,
    executor: Executor,
    counters: Arc<SessionCounters>,
    open: bool,
}

impl GraphSession {
    pub(crate) fn new(id: u64, store: Arc<RwLock<GraphStore>>, counters: Arc<SessionCounters>) -> Self {
        debug!(session_id = id, "session opened");
        Self {
            id,
            store,
            executor: Executor::new(),
            counters,
            open: true,
        }
    }

    /// Run one statement and return the materialized result
    pub async fn run(&mut self, query: &str, params: &Params, mode: AccessMode) -> Result<QueryResult> {
        if !self.open {
            return Err(DbError::SessionClosed(self.id));
        }

        let result = match mode {
            AccessMode::Read => {
                let store = self.store.read().await;
                self.executor.execute_read(&store, query, params)
            }
            AccessMode::Write => {
                let mut store = self.store.write().await;
                self.executor.execute_write(&mut store, query, params)
            }
        };
        result.inspect_err(|err| debug!(session_id = self.id, error = %err, "statement failed"))
    }

    fn release(&mut self) -> bool {
        if !self.open {
            return false;
        }
        self.open = false;
        self.counters.record_close();
        true
    }
}

#[async_trait]
impl Session for GraphSession {
    fn id(&self) -> u64 {
        self.id
    }

    async fn read_transaction(&mut self, query: &str, params: Params) -> Result<RecordStream> {
        let result = self.run(query, &params, AccessMode::Read).await?;
        Ok(stream::iter(result.records.into_iter().map(Ok)).boxed())
    }

    async fn write_transaction(&mut self, query: &str, params: Params) -> Result<RecordStream> {
        let result = self.run(query, &params, AccessMode::Write).await?;
        Ok(stream::iter(result.records.into_iter().map(Ok)).boxed())
    }

    async fn close(&mut self) -> Result<()> {
        if self.release() {
            debug!(session_id = self.id, "session closed");
        }
        Ok(())
    }
}

impl Drop for GraphSession {
    fn drop(&mut self) {
        if self.release() {
            warn!(session_id = self.id, "session dropped without close");
        }
    }
}
