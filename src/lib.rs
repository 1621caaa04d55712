// ============================================================================
// fruitgraph Library
// ============================================================================

pub mod config;
pub mod connection;
pub mod core;
pub mod fruit;
pub mod result;
pub mod scoped;
pub mod storage;
pub mod transaction;
pub mod web;
mod executor;
mod parser;

pub use crate::core::{DbError, Node, NodeId, Params, Result, Value};
pub use crate::result::{Counters, QueryResult, Record};
pub use crate::storage::GraphStore;

pub use connection::{
    GraphSession, RecordStream, Session, SessionProvider,
    config::DriverConfig,
    driver::{Driver, DriverStats},
};
pub use fruit::{Fruit, FruitResource, NewFruit};
pub use scoped::{SessionGuard, resource_stream, single};
pub use web::{AppState, build_router};

/// Build the HTTP application over a driver
///
/// # Examples
///
/// ```
/// use fruitgraph::{Driver, DriverConfig, app};
/// use std::sync::Arc;
///
/// let driver = Arc::new(Driver::new(DriverConfig::new()).unwrap());
/// let router = app(driver);
/// # let _ = router;
/// ```
pub fn app(driver: std::sync::Arc<Driver>) -> axum::Router {
    build_router(AppState::new(FruitResource::new(driver)))
}
