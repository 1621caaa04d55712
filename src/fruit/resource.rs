use super::model::{Fruit, NewFruit};
use crate::connection::{Session, SessionProvider};
use crate::core::{DbError, NodeId, Params, Result, Value};
use crate::scoped::{resource_stream, single};
use futures::TryStreamExt;
use futures::stream::BoxStream;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info};

pub const LIST_NAMES: &str = "MATCH (f:Fruit) RETURN f.name AS name ORDER BY f.name";
pub const CREATE_FRUIT: &str = "CREATE (f:Fruit {name: $name}) RETURN f";
pub const FIND_FRUIT: &str = "MATCH (f:Fruit) WHERE id(f) = $id RETURN f";

/// Fruit queries, each run in its own session
#[derive(Clone)]
pub struct FruitResource {
    provider: Arc<dyn SessionProvider>,
}

impl FruitResource {
    pub fn new(provider: Arc<dyn SessionProvider>) -> Self {
        Self { provider }
    }

    /// Names of all fruits in alphabetical order
    ///
    /// Lazy: no session is opened until the stream is polled. The session is
    /// released once the last name has been read, after an error, or when
    /// the stream is dropped.
    pub fn stream_names(&self) -> BoxStream<'static, Result<String>> {
        resource_stream(
            acquire(Arc::clone(&self.provider)),
            |session| session.read_transaction(LIST_NAMES, Params::new()),
            |record| record.get("name").and_then(Value::as_string).map_err(DbError::mapping),
        )
    }

    /// Create a fruit and return its location, `/fruits/<id>`
    pub async fn create(&self, fruit: NewFruit) -> Result<String> {
        fruit.validate()?;

        let mut params = Params::new();
        params.insert("name".into(), Value::from(fruit.name.trim()));

        let created = single(resource_stream(
            acquire(Arc::clone(&self.provider)),
            move |session| session.write_transaction(CREATE_FRUIT, params),
            |record| Fruit::from_record(record, "f"),
        ))
        .await?;

        info!(fruit_id = created.id, name = %created.name, "fruit created");
        Ok(created.location())
    }

    /// Look a fruit up by id; `None` when no such fruit exists
    pub async fn find(&self, id: NodeId) -> Result<Option<Fruit>> {
        let mut params = Params::new();
        params.insert("id".into(), Value::Integer(id));

        let found: Vec<Fruit> = resource_stream(
            acquire(Arc::clone(&self.provider)),
            move |session| session.read_transaction(FIND_FRUIT, params),
            |record| Fruit::from_record(record, "f"),
        )
        .try_collect()
        .await?;

        debug!(fruit_id = id, found = !found.is_empty(), "fruit lookup");
        Ok(found.into_iter().next())
    }
}

fn acquire(provider: Arc<dyn SessionProvider>) -> impl Future<Output = Result<Box<dyn Session>>> + Send {
    async move { provider.open_session().await }
}
