/**
 * Stream Multiplexer
 *
 * One multiplexer runs per open stream. It waits on four things at once:
 *
 * - the session's inbound queue
 * - the heartbeat ticker
 * - the connection's own close signal (replacement)
 * - the server shutdown token
 *
 * and turns whichever is ready into exactly one written and flushed frame.
 * Selection is fair, so a busy queue cannot starve the heartbeat.
 *
 * # Termination
 *
 * The loop ends when the connection is closed or the server shuts down
 * (clean exit), or when a write or flush still fails after the retry
 * budget (error exit). A client that disconnects is noticed at the latest
 * on the next heartbeat, whose flush fails on the broken pipe.
 *
 * Malformed structured events are logged and dropped; they never end the
 * stream.
 */

use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast::error::RecvError;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::backend::error::HubError;
use crate::backend::realtime::frame::{self, FrameWriter};
use crate::backend::realtime::session::{ConnectionRecord, Session, Subscription};
use crate::shared::Inbound;

/// Heartbeat used when a zero period is requested
pub const DEFAULT_HEARTBEAT: Duration = Duration::from_secs(2);

/// `period`, or [`DEFAULT_HEARTBEAT`] when it is zero
pub(crate) fn heartbeat_period(period: Duration) -> Duration {
    if period.is_zero() {
        tracing::warn!("[Hub] Zero heartbeat period, using {:?}", DEFAULT_HEARTBEAT);
        DEFAULT_HEARTBEAT
    } else {
        period
    }
}

/// Why a stream stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamExit {
    /// Another stream registered under the same connection id
    Replaced,
    /// The server is shutting down
    Shutdown,
}

/// Per-connection event loop
pub struct StreamMultiplexer {
    session: Arc<Session>,
    record: Arc<ConnectionRecord>,
    writer: FrameWriter,
    heartbeat: Duration,
    shutdown: CancellationToken,
}

impl StreamMultiplexer {
    pub fn new(
        session: Arc<Session>,
        record: Arc<ConnectionRecord>,
        writer: FrameWriter,
        heartbeat: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            session,
            record,
            writer,
            heartbeat: heartbeat_period(heartbeat),
            shutdown,
        }
    }

    /// Run the loop until the stream ends
    pub async fn run(&self) -> Result<StreamExit, HubError> {
        let Subscription { backlog, mut receiver } = self.session.subscribe();

        for message in backlog {
            if let Some(exit) = self.exit_reason() {
                return Ok(exit);
            }
            self.deliver(&message).await?;
        }

        let start = tokio::time::Instant::now() + self.heartbeat;
        let mut ticker = tokio::time::interval_at(start, self.heartbeat);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut cycle: u64 = 0;

        loop {
            cycle += 1;
            if let Some(exit) = self.exit_reason() {
                return Ok(exit);
            }

            tokio::select! {
                _ = self.shutdown.cancelled() => return Ok(StreamExit::Shutdown),
                _ = self.record.closed() => return Ok(StreamExit::Replaced),
                received = receiver.recv() => match received {
                    Ok(message) => self.deliver(&message).await?,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(
                            "[Hub] Connection '{}' of {} lagged, skipped {} messages",
                            self.record.connection_id(),
                            self.session.identity_key(),
                            skipped
                        );
                    }
                    // the session owns the sender, so this only happens at teardown
                    Err(RecvError::Closed) => return Ok(StreamExit::Shutdown),
                },
                _ = ticker.tick() => {
                    if let Some(exit) = self.exit_reason() {
                        return Ok(exit);
                    }
                    let heartbeat = frame::render_heartbeat(cycle, Utc::now());
                    tracing::trace!(
                        "[Hub] Heartbeat {} on '{}'",
                        cycle,
                        self.record.connection_id()
                    );
                    self.write_frame(&heartbeat).await?;
                }
            }
        }
    }

    /// Run the loop, then deregister and close the stream
    pub async fn drive(self) -> Result<StreamExit, HubError> {
        let started = Instant::now();
        let result = {
            let _registration = Registration {
                session: &self.session,
                record: &self.record,
            };
            self.run().await
        };

        {
            let mut sink = self.record.sink().lock().await;
            if let Err(e) = sink.close().await {
                tracing::debug!("[Hub] Closing sink failed: {}", e);
            }
        }

        match &result {
            Ok(exit) => tracing::info!(
                "[Hub] Stream '{}' of {} ended ({:?}) after {:?}",
                self.record.connection_id(),
                self.session.identity_key(),
                exit,
                started.elapsed()
            ),
            Err(e) => tracing::warn!(
                "[Hub] Stream '{}' of {} terminated after {:?}: {}",
                self.record.connection_id(),
                self.session.identity_key(),
                started.elapsed(),
                e
            ),
        }
        result
    }

    fn exit_reason(&self) -> Option<StreamExit> {
        if self.shutdown.is_cancelled() {
            Some(StreamExit::Shutdown)
        } else if self.record.is_closed() {
            Some(StreamExit::Replaced)
        } else {
            None
        }
    }

    async fn deliver(&self, message: &Inbound) -> Result<(), HubError> {
        match frame::render_inbound(message) {
            Ok(rendered) => {
                tracing::debug!(
                    "[Hub] Writing {} frame to '{}'",
                    message.source(),
                    self.record.connection_id()
                );
                self.write_frame(&rendered).await
            }
            Err(e) => {
                tracing::warn!(
                    "[Hub] Dropping malformed event for {}: {}",
                    self.session.identity_key(),
                    e
                );
                Ok(())
            }
        }
    }

    async fn write_frame(&self, rendered: &str) -> Result<(), HubError> {
        let mut sink = self.record.sink().lock().await;
        self.writer.send(&mut sink, rendered).await
    }
}

/// Deregisters a stream when its loop ends, even by panicking
struct Registration<'a> {
    session: &'a Session,
    record: &'a ConnectionRecord,
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        self.session.deregister_stream(self.record);
        self.record.close();
    }
}
