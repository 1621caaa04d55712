#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use axum::response::Response;
use fruitgraph::{
    DbError, Driver, DriverConfig, Node, Params, Record, RecordStream, Result, Session,
    SessionProvider, Value,
};
use futures::StreamExt;
use futures::stream;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

pub fn driver() -> Arc<Driver> {
    Arc::new(Driver::new(DriverConfig::new()).unwrap())
}

pub async fn seeded_driver(names: &[&str]) -> Arc<Driver> {
    let driver = driver();
    for name in names {
        seed(&driver, name).await;
    }
    driver
}

pub async fn seed(driver: &Driver, name: &str) {
    let mut params = Params::new();
    params.insert("name".into(), Value::from(name));
    driver
        .execute("CREATE (f:Fruit {name: $name})", params)
        .await
        .unwrap();
}

pub async fn unique_names(driver: &Driver) {
    driver
        .execute(
            "CREATE CONSTRAINT ON (f:Fruit) ASSERT f.name IS UNIQUE",
            Params::new(),
        )
        .await
        .unwrap();
}

/// Poll until every session the driver handed out has been closed
pub async fn wait_for_idle(driver: &Driver) {
    for _ in 0..100 {
        let stats = driver.stats();
        if stats.active == 0 && stats.opened == stats.closed {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("sessions still open: {}", driver.stats());
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Opening a session fails
    Open,
    /// Every transaction fails before producing records
    Query,
    /// The record stream fails after its first record
    MidStream,
    /// Writes return a fruit node without a name
    NamelessRecord,
}

/// Wraps a driver and injects one kind of failure
pub struct FaultyProvider {
    driver: Arc<Driver>,
    fault: Fault,
}

impl FaultyProvider {
    pub fn new(driver: Arc<Driver>, fault: Fault) -> Arc<Self> {
        Arc::new(Self { driver, fault })
    }
}

#[async_trait]
impl SessionProvider for FaultyProvider {
    async fn open_session(&self) -> Result<Box<dyn Session>> {
        if self.fault == Fault::Open {
            return Err(DbError::SessionUnavailable("injected open failure".into()));
        }
        let inner = self.driver.open_session().await?;
        Ok(Box::new(FaultySession {
            inner,
            fault: self.fault,
        }))
    }
}

struct FaultySession {
    inner: Box<dyn Session>,
    fault: Fault,
}

impl FaultySession {
    fn inject(&self, records: RecordStream) -> Result<RecordStream> {
        match self.fault {
            Fault::Query => Err(DbError::ExecutionError("injected query failure".into())),
            Fault::MidStream => Ok(records
                .take(1)
                .chain(stream::once(async {
                    Err(DbError::ExecutionError("injected stream failure".into()))
                }))
                .boxed()),
            Fault::Open | Fault::NamelessRecord => Ok(records),
        }
    }
}

#[async_trait]
impl Session for FaultySession {
    fn id(&self) -> u64 {
        self.inner.id()
    }

    async fn read_transaction(&mut self, query: &str, params: Params) -> Result<RecordStream> {
        let records = self.inner.read_transaction(query, params).await?;
        self.inject(records)
    }

    async fn write_transaction(&mut self, query: &str, params: Params) -> Result<RecordStream> {
        if self.fault == Fault::Query {
            return Err(DbError::ExecutionError("injected query failure".into()));
        }
        let records = self.inner.write_transaction(query, params).await?;
        if self.fault == Fault::NamelessRecord {
            drop(records);
            let keys: Arc<[String]> = Arc::from(vec!["f".to_string()]);
            let node = Node::new(0, "Fruit");
            let record = Record::new(keys, vec![Value::Node(node)]);
            return Ok(stream::iter(vec![Ok(record)]).boxed());
        }
        Ok(records)
    }

    async fn close(&mut self) -> Result<()> {
        self.inner.close().await
    }
}

pub async fn send(router: &Router, request: Request<Body>) -> Response {
    router.clone().oneshot(request).await.unwrap()
}

pub async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn assert_status(response: &Response, expected: StatusCode) {
    assert_eq!(response.status(), expected, "unexpected status");
}
