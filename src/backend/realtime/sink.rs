//! Connection Sink
//!
//! Buffered, flushable byte sink attached to one open stream. Frames are
//! staged whole in memory and only reach the client on [`ConnectionSink::flush`].
//! A flush that fails halfway keeps the unwritten tail, so retrying it never
//! duplicates bytes the client already received.
//!
//! HTTP streams are backed by one half of an in-memory duplex pipe; the
//! other half becomes the response body (see [`pipe`]).

use bytes::{Buf, BytesMut};
use std::fmt;
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt, DuplexStream};
use tokio::sync::Mutex;

/// Capacity of the in-memory pipe behind an HTTP stream
pub const PIPE_CAPACITY: usize = 64 * 1024;

/// Most bytes a sink keeps staged before refusing new frames
pub const MAX_PENDING: usize = 1024 * 1024;

/// Sink shared by a connection's multiplexer and the broadcaster
///
/// The mutex keeps frames from different writers from interleaving.
pub type SharedSink = Arc<Mutex<ConnectionSink>>;

/// Buffered writer over a client stream
pub struct ConnectionSink {
    writer: Box<dyn AsyncWrite + Send + Unpin>,
    pending: BytesMut,
}

impl ConnectionSink {
    /// Wrap any async writer
    pub fn new<W>(writer: W) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            writer: Box::new(writer),
            pending: BytesMut::with_capacity(4096),
        }
    }

    /// Wrap the sink for sharing
    pub fn shared(self) -> SharedSink {
        Arc::new(Mutex::new(self))
    }

    /// Stage one frame
    ///
    /// Fails without staging anything while earlier frames are still stuck
    /// in the buffer and this frame would push it past [`MAX_PENDING`].
    pub fn write_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        if !self.pending.is_empty() && self.pending.len() + frame.len() > MAX_PENDING {
            return Err(io::Error::new(
                io::ErrorKind::WouldBlock,
                format!("sink buffer full ({} bytes pending)", self.pending.len()),
            ));
        }
        self.pending.extend_from_slice(frame);
        Ok(())
    }

    /// Push every staged byte to the client
    pub async fn flush(&mut self) -> io::Result<()> {
        while !self.pending.is_empty() {
            let written = self.writer.write(&self.pending).await?;
            if written == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "client stream accepted no bytes",
                ));
            }
            self.pending.advance(written);
        }
        self.writer.flush().await
    }

    /// Best-effort flush followed by shutting the stream down
    pub async fn close(&mut self) -> io::Result<()> {
        let flushed = self.flush().await;
        self.pending.clear();
        let shutdown = self.writer.shutdown().await;
        flushed.and(shutdown)
    }

    /// Bytes staged but not yet flushed
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

impl fmt::Debug for ConnectionSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSink")
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

/// Create a sink and the reader the client bytes come out of
///
/// Dropping the reader makes every later flush fail with a broken pipe,
/// which is how a client disconnect reaches the multiplexer.
pub fn pipe() -> (ConnectionSink, DuplexStream) {
    let (writer, reader) = tokio::io::duplex(PIPE_CAPACITY);
    (ConnectionSink::new(writer), reader)
}


#[cfg(test)]
mod tests {
    use super::testing::FlakyWriter;
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn test_frames_reach_reader_on_flush() {
        let (mut sink, mut reader) = pipe();
        sink.write_frame(b"data: a\n\n").unwrap();
        sink.write_frame(b"data: b\n\n").unwrap();
        assert_eq!(sink.pending(), 18);
        sink.flush().await.unwrap();
        assert_eq!(sink.pending(), 0);

        let mut buf = vec![0u8; 18];
        reader.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"data: a\n\ndata: b\n\n");
    }

    #[tokio::test]
    async fn test_flush_fails_after_reader_dropped() {
        let (mut sink, reader) = pipe();
        drop(reader);
        sink.write_frame(b"data: x\n\n").unwrap();
        assert!(sink.flush().await.is_err());
    }

    #[tokio::test]
    async fn test_failed_flush_keeps_frame_for_retry() {
        let writer = FlakyWriter::failing(1);
        let mut sink = ConnectionSink::new(writer.clone());
        sink.write_frame(b"data: once\n\n").unwrap();
        assert!(sink.flush().await.is_err());
        assert_eq!(sink.pending(), 12);
        sink.flush().await.unwrap();
        assert_eq!(writer.contents(), "data: once\n\n");
    }

    #[tokio::test]
    async fn test_staged_frames_written_in_one_flush() {
        let mock = tokio_test::io::Builder::new()
            .write(b"event: info\ndata: x\n\n")
            .build();
        let mut sink = ConnectionSink::new(mock);
        sink.write_frame(b"event: info\n").unwrap();
        sink.write_frame(b"data: x\n\n").unwrap();
        sink.flush().await.unwrap();
    }

    #[test]
    fn test_buffer_limit_rejects_when_backed_up() {
        let mut sink = ConnectionSink::new(FlakyWriter::default());
        sink.write_frame(&vec![b'x'; MAX_PENDING]).unwrap();
        let err = sink.write_frame(b"more").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WouldBlock);
        assert_eq!(sink.pending(), MAX_PENDING);
    }

    #[tokio::test]
    async fn test_close_shuts_down_reader() {
        let (mut sink, mut reader) = pipe();
        sink.write_frame(b"data: bye\n\n").unwrap();
        sink.close().await.unwrap();
        let mut out = String::new();
        reader.read_to_string(&mut out).await.unwrap();
        assert_eq!(out, "data: bye\n\n");
    }
}
