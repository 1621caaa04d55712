//! Resource-scoped query pipelines.
//!
//! [`resource_stream`] acquires a session lazily, runs one transaction in it,
//! maps each record and releases the session exactly once: after the last
//! record, after the first error, or when the consumer drops the stream
//! early. [`single`] drives such a stream to a single value.

use crate::connection::{RecordStream, Session};
use crate::core::{DbError, Result};
use crate::result::Record;
use futures::future::BoxFuture;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use std::future::Future;
use tracing::{debug, warn};

/// Owns a session until it is released
///
/// `release` closes the session and waits for the acknowledgment. A guard
/// dropped while still holding its session schedules the close on the
/// current tokio runtime instead.
pub struct SessionGuard {
    id: u64,
    session: Option<Box<dyn Session>>,
}

impl SessionGuard {
    pub fn new(session: Box<dyn Session>) -> Self {
        Self {
            id: session.id(),
            session: Some(session),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn session(&mut self) -> Result<&mut Box<dyn Session>> {
        self.session
            .as_mut()
            .ok_or(DbError::SessionClosed(self.id))
    }

    pub async fn release(&mut self) {
        if let Some(mut session) = self.session.take() {
            close_session(self.id, &mut session).await;
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        let id = self.id;

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                debug!(session_id = id, "pipeline cancelled, releasing session");
                handle.spawn(async move {
                    close_session(id, &mut session).await;
                });
            }
            Err(_) => {
                warn!(session_id = id, "no runtime to release session on");
            }
        }
    }
}

async fn close_session(id: u64, session: &mut Box<dyn Session>) {
    match session.close().await {
        Ok(()) => debug!(session_id = id, "session released"),
        Err(err) => warn!(session_id = id, error = %err, "session close failed"),
    }
}

enum Phase<A, B> {
    Acquire { acquire: A, body: B },
    Streaming { guard: SessionGuard, records: RecordStream },
    Done,
}

type Step<T, A, B, M> = Option<(Result<T>, (Phase<A, B>, M))>;

/// Lazy stream over the records of one transaction
///
/// * `acquire` opens the session; nothing happens until the first poll.
/// * `body` runs the transaction in the session.
/// * `map` converts each record; a mapping error ends the stream.
///
/// Every failure is yielded once, after the session has been released, and
/// then the stream ends.
pub fn resource_stream<A, B, M, T>(acquire: A, body: B, map: M) -> BoxStream<'static, Result<T>>
where
    A: Future<Output = Result<Box<dyn Session>>> + Send + 'static,
    B: for<'s> FnOnce(&'s mut Box<dyn Session>) -> BoxFuture<'s, Result<RecordStream>>
        + Send
        + 'static,
    M: FnMut(Record) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    stream::unfold((Phase::Acquire { acquire, body }, map), |(phase, map)| async move {
        match phase {
            Phase::Done => None,
            Phase::Acquire { acquire, body } => open(acquire, body, map).await,
            Phase::Streaming { guard, records } => next_record(guard, records, map).await,
        }
    })
    .fuse()
    .boxed()
}

async fn open<A, B, M, T>(acquire: A, body: B, map: M) -> Step<T, A, B, M>
where
    A: Future<Output = Result<Box<dyn Session>>>,
    B: for<'s> FnOnce(&'s mut Box<dyn Session>) -> BoxFuture<'s, Result<RecordStream>>,
    M: FnMut(Record) -> Result<T>,
{
    let mut guard = match acquire.await {
        Ok(session) => SessionGuard::new(session),
        Err(err) => {
            warn!(error = %err, "session acquisition failed");
            return Some((Err(err), (Phase::Done, map)));
        }
    };

    let records = match guard.session() {
        Ok(session) => body(session).await,
        Err(err) => Err(err),
    };

    match records {
        Ok(records) => next_record(guard, records, map).await,
        Err(err) => {
            warn!(session_id = guard.id(), error = %err, "transaction failed");
            guard.release().await;
            Some((Err(err), (Phase::Done, map)))
        }
    }
}

async fn next_record<A, B, M, T>(
    mut guard: SessionGuard,
    mut records: RecordStream,
    mut map: M,
) -> Step<T, A, B, M>
where
    M: FnMut(Record) -> Result<T>,
{
    let failure = match records.next().await {
        Some(Ok(record)) => match map(record) {
            Ok(item) => return Some((Ok(item), (Phase::Streaming { guard, records }, map))),
            Err(err) => {
                warn!(session_id = guard.id(), error = %err, "record mapping failed");
                err
            }
        },
        Some(Err(err)) => {
            warn!(session_id = guard.id(), error = %err, "record stream failed");
            err
        }
        None => {
            guard.release().await;
            return None;
        }
    };

    drop(records);
    guard.release().await;
    Some((Err(failure), (Phase::Done, map)))
}

/// Drive `stream` to completion and return its only item
///
/// The stream is fully drained before returning so its session has been
/// released by the time the value is available.
pub async fn single<T>(mut stream: BoxStream<'static, Result<T>>) -> Result<T> {
    let Some(item) = stream.try_next().await? else {
        return Err(DbError::ExecutionError(
            "statement returned no records".into(),
        ));
    };

    let mut extra = 0usize;
    while stream.try_next().await?.is_some() {
        extra += 1;
    }

    match extra {
        0 => Ok(item),
        extra => Err(DbError::ExecutionError(format!(
            "expected a single record, got {}",
            extra + 1
        ))),
    }
}
