/**
 * Client Sessions
 *
 * A `Session` groups every stream opened by one client identity. It owns
 * a single inbound queue that all producers of that identity publish to,
 * and the table of open connections keyed by client-chosen connection id.
 *
 * # Inbound Queue
 *
 * The queue is a `tokio::sync::broadcast` channel. Every open connection
 * holds its own receiver, so each connection sees every message published
 * while it is open, in publish order. While no connection is open,
 * messages go to a bounded backlog instead, and the next connection to
 * subscribe receives that backlog first. Both bounds drop the oldest
 * message when full, so producers never block.
 *
 * # Connection Table
 *
 * Registering an id that is already present replaces the old record and
 * cancels its stream. A stream that ends only removes its own record, so a
 * late exit never evicts the connection that replaced it.
 */

use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::backend::realtime::sink::{ConnectionSink, SharedSink};
use crate::shared::{Inbound, StructuredEvent};

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One open stream of a session
#[derive(Debug)]
pub struct ConnectionRecord {
    connection_id: String,
    stream_id: Uuid,
    sink: SharedSink,
    opened_at: DateTime<Utc>,
    closed: CancellationToken,
}

impl ConnectionRecord {
    fn new(connection_id: String, sink: ConnectionSink) -> Self {
        Self {
            connection_id,
            stream_id: Uuid::new_v4(),
            sink: sink.shared(),
            opened_at: Utc::now(),
            closed: CancellationToken::new(),
        }
    }

    /// Client-chosen id, possibly empty
    pub fn connection_id(&self) -> &str {
        &self.connection_id
    }

    /// Unique id of this stream, distinct across replacements
    pub fn stream_id(&self) -> Uuid {
        self.stream_id
    }

    pub fn sink(&self) -> &SharedSink {
        &self.sink
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    /// Ask the stream to stop
    pub fn close(&self) {
        self.closed.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Completes once [`ConnectionRecord::close`] has been called
    pub async fn closed(&self) {
        self.closed.cancelled().await
    }
}

/// Result of publishing into a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Handed to this many open connections
    Live(usize),
    /// No connection open, kept in the backlog
    Queued,
}

/// Receiving side handed to a new connection
pub struct Subscription {
    /// Messages published while no connection was open, oldest first
    pub backlog: VecDeque<Inbound>,
    pub receiver: broadcast::Receiver<Inbound>,
}

struct Inbox {
    sender: broadcast::Sender<Inbound>,
    backlog: VecDeque<Inbound>,
    capacity: usize,
}

impl Inbox {
    fn enqueue(&mut self, message: Inbound, identity: &str) {
        if self.backlog.len() >= self.capacity {
            self.backlog.pop_front();
            tracing::warn!(
                "[Hub] Backlog full for session {}, dropped oldest message",
                identity
            );
        }
        self.backlog.push_back(message);
    }
}

/// All streams and the inbound queue of one client identity
pub struct Session {
    identity_key: String,
    created_at: DateTime<Utc>,
    inbox: Mutex<Inbox>,
    connections: Mutex<HashMap<String, Arc<ConnectionRecord>>>,
}

impl Session {
    /// Create an empty session whose queue holds at most `capacity` messages
    pub fn new(identity_key: impl Into<String>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, _) = broadcast::channel(capacity);
        Self {
            identity_key: identity_key.into(),
            created_at: Utc::now(),
            inbox: Mutex::new(Inbox {
                sender,
                backlog: VecDeque::new(),
                capacity,
            }),
            connections: Mutex::new(HashMap::new()),
        }
    }

    pub fn identity_key(&self) -> &str {
        &self.identity_key
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Publish one message to the session's open connections
    ///
    /// Never blocks. With no connection open the message is kept for the
    /// next one.
    pub fn publish(&self, message: impl Into<Inbound>) -> Delivery {
        let message = message.into();
        tracing::trace!(
            "[Hub] Publishing {} message to session {}",
            message.source(),
            self.identity_key
        );
        let mut inbox = lock(&self.inbox);
        match inbox.sender.send(message) {
            Ok(receivers) => Delivery::Live(receivers),
            Err(broadcast::error::SendError(message)) => {
                inbox.enqueue(message, &self.identity_key);
                Delivery::Queued
            }
        }
    }

    /// Publish a structured event
    pub fn push_event(&self, event: StructuredEvent) -> Delivery {
        self.publish(Inbound::Structured(event))
    }

    /// Publish a raw byte chunk
    pub fn push_raw(&self, chunk: impl Into<Bytes>) -> Delivery {
        self.publish(Inbound::Raw(chunk.into()))
    }

    /// Publish a text chunk
    pub fn push_text(&self, text: impl Into<String>) -> Delivery {
        self.publish(Inbound::Text(text.into()))
    }

    /// Publish a frame that is already in wire syntax
    pub fn push_preformatted(&self, frame: impl Into<String>) -> Delivery {
        self.publish(Inbound::Preformatted(frame.into()))
    }

    /// Start receiving, draining the offline backlog
    pub fn subscribe(&self) -> Subscription {
        let mut inbox = lock(&self.inbox);
        let receiver = inbox.sender.subscribe();
        Subscription {
            backlog: std::mem::take(&mut inbox.backlog),
            receiver,
        }
    }

    /// Messages waiting for a connection
    pub fn backlog_len(&self) -> usize {
        lock(&self.inbox).backlog.len()
    }

    /// Register a stream under `connection_id`
    ///
    /// A record already registered under the same id is removed, closed
    /// and given a best-effort flush.
    pub async fn register_connection(
        &self,
        connection_id: impl Into<String>,
        sink: ConnectionSink,
    ) -> Arc<ConnectionRecord> {
        let connection_id = connection_id.into();
        let record = Arc::new(ConnectionRecord::new(connection_id.clone(), sink));
        let previous = lock(&self.connections).insert(connection_id, record.clone());

        if let Some(previous) = previous {
            tracing::info!(
                "[Hub] Replacing connection '{}' of session {}",
                previous.connection_id(),
                self.identity_key
            );
            previous.close();
            // the old stream may be mid-retry, skip it rather than wait
            if let Ok(mut sink) = previous.sink().try_lock() {
                if let Err(e) = sink.flush().await {
                    tracing::debug!("[Hub] Flush of replaced connection failed: {}", e);
                }
            }
        }
        record
    }

    /// Remove whatever record is registered under `connection_id`
    pub fn deregister_connection(&self, connection_id: &str) -> Option<Arc<ConnectionRecord>> {
        lock(&self.connections).remove(connection_id)
    }

    /// Remove `record` if it is still the one registered under its id
    pub fn deregister_stream(&self, record: &ConnectionRecord) -> bool {
        let mut connections = lock(&self.connections);
        let current = connections
            .get(record.connection_id())
            .is_some_and(|r| r.stream_id() == record.stream_id());
        if current {
            connections.remove(record.connection_id());
        }
        current
    }

    /// Sink registered under `connection_id`
    ///
    /// An empty id that matches nothing falls back to any open connection.
    pub fn get_connection(&self, connection_id: &str) -> Option<SharedSink> {
        let connections = lock(&self.connections);
        connections
            .get(connection_id)
            .or_else(|| {
                if connection_id.is_empty() {
                    connections.values().next()
                } else {
                    None
                }
            })
            .map(|record| record.sink().clone())
    }

    /// Snapshot of the open records
    pub fn connections(&self) -> Vec<Arc<ConnectionRecord>> {
        lock(&self.connections).values().cloned().collect()
    }

    /// Sorted ids of the open connections
    pub fn connection_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = lock(&self.connections).keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn connection_count(&self) -> usize {
        lock(&self.connections).len()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("identity_key", &self.identity_key)
            .field("created_at", &self.created_at)
            .field("connections", &self.connection_ids())
            .finish()
    }
}
