//! Stream helpers
//!
//! Builders for fast test hubs and a reader that splits a client byte
//! stream back into frames.

use axum::body::Body;
use futures_util::TryStreamExt;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::io::StreamReader;

use chathub::backend::realtime::{Hub, RetryPolicy, SessionRegistry};

/// How long a test waits for the next frame
pub const FRAME_TIMEOUT: Duration = Duration::from_secs(3);

/// Hub with a tiny retry base and the given heartbeat
pub fn fast_hub(heartbeat: Duration) -> Hub {
    Hub::with_settings(
        SessionRegistry::new(64),
        RetryPolicy::new(3, Duration::from_millis(1)),
        heartbeat,
    )
}

/// Hub that never heartbeats during a test
pub fn quiet_hub() -> Hub {
    fast_hub(Duration::from_secs(3600))
}

/// Splits a byte stream into `\n\n`-terminated frames
pub struct FrameReader<R> {
    inner: R,
    buffer: String,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buffer: String::new(),
        }
    }

    /// Next complete frame, panicking on timeout or end of stream
    pub async fn next_frame(&mut self) -> String {
        match tokio::time::timeout(FRAME_TIMEOUT, self.try_next_frame()).await {
            Ok(Some(frame)) => frame,
            Ok(None) => panic!("stream ended, partial data: {:?}", self.buffer),
            Err(_) => panic!("timed out waiting for frame, partial data: {:?}", self.buffer),
        }
    }

    /// Next frame that is not a heartbeat
    pub async fn next_event(&mut self) -> String {
        loop {
            let frame = self.next_frame().await;
            if !frame.starts_with("data: Cycle: ") {
                return frame;
            }
        }
    }

    /// Next complete frame, `None` at end of stream
    pub async fn try_next_frame(&mut self) -> Option<String> {
        loop {
            if let Some(end) = self.buffer.find("\n\n") {
                let frame: String = self.buffer.drain(..end + 2).collect();
                return Some(frame);
            }
            let mut chunk = [0u8; 1024];
            let n = self.inner.read(&mut chunk).await.ok()?;
            if n == 0 {
                return None;
            }
            self.buffer.push_str(std::str::from_utf8(&chunk[..n]).expect("utf-8 frames"));
        }
    }

    /// Wait for end of stream, returning whatever frames were still buffered
    pub async fn drain_to_end(&mut self) -> Vec<String> {
        let mut frames = Vec::new();
        let drained = tokio::time::timeout(FRAME_TIMEOUT, async {
            while let Some(frame) = self.try_next_frame().await {
                frames.push(frame);
            }
        })
        .await;
        assert!(drained.is_ok(), "stream did not end");
        assert!(self.buffer.is_empty(), "partial frame left: {:?}", self.buffer);
        frames
    }
}

/// Frame reader over an HTTP response body
pub fn body_frames(body: Body) -> FrameReader<impl AsyncRead + Unpin> {
    let stream = body.into_data_stream().map_err(std::io::Error::other);
    FrameReader::new(StreamReader::new(stream))
}
