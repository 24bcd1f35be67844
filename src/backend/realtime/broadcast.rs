/**
 * Announcement Broadcasting
 *
 * Writes one `announce` frame to every connection of every session,
 * bypassing the session queues. Targets are snapshotted when the call
 * starts, so streams opened afterwards do not receive it.
 *
 * # Failure Handling
 *
 * Each connection is written independently through the retry executor,
 * and all targets are written concurrently, so a client that stopped
 * reading only delays its own frame. A connection that still fails is
 * logged and skipped; the broadcast reports how many connections
 * succeeded. The failed connection itself is torn down by its own
 * multiplexer.
 */

use futures_util::future::join_all;
use std::sync::Arc;

use crate::backend::realtime::frame::{self, FrameWriter};
use crate::backend::realtime::registry::SessionRegistry;
use crate::backend::realtime::session::ConnectionRecord;
use crate::shared::{SharedError, StructuredEvent};

/// Sends announcements to every open connection
///
/// Cheap to clone; all clones share the same registry.
#[derive(Clone)]
pub struct Broadcaster {
    registry: SessionRegistry,
    writer: FrameWriter,
}

impl Broadcaster {
    pub fn new(registry: SessionRegistry, writer: FrameWriter) -> Self {
        Self { registry, writer }
    }

    /// Write `message` as an `announce` frame to every open connection
    ///
    /// # Returns
    ///
    /// Number of connections the frame was flushed to. Fails only when the
    /// message itself is not a valid announcement (empty).
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use chathub::backend::realtime::{Broadcaster, FrameWriter, SessionRegistry};
    ///
    /// # async fn example() {
    /// let broadcaster = Broadcaster::new(SessionRegistry::default(), FrameWriter::default());
    /// let delivered = broadcaster.broadcast("maintenance at noon").await.unwrap();
    /// println!("Announcement delivered to {} connections", delivered);
    /// # }
    /// ```
    pub async fn broadcast(&self, message: &str) -> Result<usize, SharedError> {
        let rendered = frame::render_event(&StructuredEvent::announce(message))?;

        let targets: Vec<(String, Arc<ConnectionRecord>)> = self
            .registry
            .snapshot()
            .into_iter()
            .flat_map(|session| {
                let identity = session.identity_key().to_string();
                session
                    .connections()
                    .into_iter()
                    .map(move |record| (identity.clone(), record))
            })
            .collect();

        if targets.is_empty() {
            tracing::debug!("[Realtime] No connections to receive announcement");
            return Ok(0);
        }

        let writes = targets
            .iter()
            .filter(|(_, record)| !record.is_closed())
            .map(|(identity, record)| self.deliver(identity, record, &rendered));
        let delivered = join_all(writes).await.into_iter().filter(|ok| *ok).count();

        tracing::info!(
            "[Realtime] Announcement delivered to {}/{} connections",
            delivered,
            targets.len()
        );
        Ok(delivered)
    }

    async fn deliver(&self, identity: &str, record: &ConnectionRecord, rendered: &str) -> bool {
        let mut sink = record.sink().lock().await;
        match self.writer.send(&mut sink, rendered).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    "[Realtime] Announcement to '{}' of {} failed: {}",
                    record.connection_id(),
                    identity,
                    e
                );
                false
            }
        }
    }
}
