//! Real-time Streaming Hub
//!
//! This module keeps long-lived Server-Sent Events streams open to browser
//! clients and multiplexes everything the server has to say to a client
//! onto them: structured events, raw and text chunks, preformatted frames,
//! periodic heartbeats and global announcements.
//!
//! # Architecture
//!
//! - **`retry`** - Bounded exponential backoff executor
//! - **`sink`** - Buffered byte sink for one client stream
//! - **`frame`** - Wire-format rendering and retrying frame writer
//! - **`session`** - Per-identity inbound queue and connection table
//! - **`registry`** - Identity → session map
//! - **`multiplexer`** - Per-connection event loop
//! - **`broadcast`** - Announcements to every open connection
//! - **`monitor`** - Periodic connection report
//! - **`subscription`** - `GET /sse` handler
//!
//! # Module Structure
//!
//! ```text
//! realtime/
//! ├── mod.rs          - Hub handle and module exports
//! ├── retry.rs        - Backoff executor
//! ├── sink.rs         - Connection sink
//! ├── frame.rs        - Frame rendering and writing
//! ├── session.rs      - Sessions and connection records
//! ├── registry.rs     - Session registry
//! ├── multiplexer.rs  - Stream event loop
//! ├── broadcast.rs    - Announcement broadcaster
//! ├── monitor.rs      - Connection monitor
//! └── subscription.rs - SSE subscription handler
//! ```
//!
//! # Concurrency
//!
//! Producers publish into a session without blocking. Each open stream is
//! served by its own task. Writes to one stream are serialized by the
//! stream's sink mutex, so a multiplexer frame and a broadcast frame never
//! interleave. Map locks are only held long enough to copy handles out.
//!
//! # Example
//!
//! ```rust,no_run
//! use chathub::backend::realtime::{sink, Hub};
//! use chathub::shared::{HubConfig, StructuredEvent};
//!
//! # async fn example() {
//! let hub = Hub::new(&HubConfig::default());
//! let (sink, _body) = sink::pipe();
//! hub.open_stream("alice", "tab-1", sink).await;
//! hub.session("alice").push_event(StructuredEvent::info("hello"));
//! # }
//! ```

pub mod broadcast;
pub mod frame;
pub mod monitor;
pub mod multiplexer;
pub mod registry;
pub mod retry;
pub mod session;
pub mod sink;
pub mod subscription;

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::backend::error::HubError;
use crate::shared::HubConfig;

pub use broadcast::Broadcaster;
pub use frame::FrameWriter;
pub use multiplexer::{StreamExit, StreamMultiplexer};
pub use registry::SessionRegistry;
pub use retry::{retry, RetryError, RetryPolicy};
pub use session::{ConnectionRecord, Delivery, Session};
pub use sink::{ConnectionSink, SharedSink};
pub use subscription::handle_stream;

/// Handle to the streaming hub
///
/// Cheap to clone; every clone shares the same registry and shutdown token.
#[derive(Clone)]
pub struct Hub {
    registry: SessionRegistry,
    broadcaster: Broadcaster,
    writer: FrameWriter,
    heartbeat: Duration,
    shutdown: CancellationToken,
}

impl Hub {
    /// Build a hub from configuration
    pub fn new(config: &HubConfig) -> Self {
        Self::with_settings(
            SessionRegistry::new(config.queue_capacity),
            RetryPolicy::new(config.retry_attempts, config.retry_base()),
            config.heartbeat(),
        )
    }

    /// Build a hub around an existing registry
    ///
    /// A zero `heartbeat` is replaced with [`multiplexer::DEFAULT_HEARTBEAT`].
    pub fn with_settings(
        registry: SessionRegistry,
        policy: RetryPolicy,
        heartbeat: Duration,
    ) -> Self {
        let writer = FrameWriter::new(policy);
        Self {
            broadcaster: Broadcaster::new(registry.clone(), writer),
            registry,
            writer,
            heartbeat: multiplexer::heartbeat_period(heartbeat),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }

    pub fn heartbeat(&self) -> Duration {
        self.heartbeat
    }

    /// Token cancelled when the server shuts down
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Stop every stream and background task
    pub fn shutdown(&self) {
        tracing::info!("[Hub] Shutting down {} session(s)", self.registry.len());
        self.shutdown.cancel();
    }

    /// Session of `identity`, created on first use
    pub fn session(&self, identity: &str) -> Arc<Session> {
        self.registry.get_or_create(identity)
    }

    /// Register `sink` as `connection_id` of `identity` and start serving it
    ///
    /// A stream already open under the same id is replaced. The returned
    /// task finishes when the new stream ends.
    pub async fn open_stream(
        &self,
        identity: &str,
        connection_id: &str,
        sink: ConnectionSink,
    ) -> JoinHandle<Result<StreamExit, HubError>> {
        let session = self.session(identity);
        let record = session.register_connection(connection_id, sink).await;
        tracing::info!(
            "[Hub] Stream '{}' opened for {} ({} open)",
            connection_id,
            identity,
            session.connection_count()
        );
        let multiplexer = StreamMultiplexer::new(
            session,
            record,
            self.writer,
            self.heartbeat,
            self.shutdown.child_token(),
        );
        tokio::spawn(multiplexer.drive())
    }

    /// Spawn the connection monitor if `every` is set
    pub fn spawn_monitor(&self, every: Option<Duration>) -> Option<JoinHandle<()>> {
        every.map(|every| monitor::spawn(self.registry.clone(), every, self.shutdown.clone()))
    }
}
