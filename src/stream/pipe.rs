//! Unbuffered, closable byte pipe.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::Notify;
use tracing::trace;

use crate::error::WinrmError;
use crate::Result;

/// Buffer size used by [`PipeReader::read_to_end`].
const READ_BUFFER_SIZE: usize = 4096;

#[derive(Debug, Default)]
struct PipeState {
    /// Block handed over by the writer and not yet fully read.
    pending: Vec<u8>,
    /// Read offset into `pending`.
    pos: usize,
    /// `Some` once the writer closed; the inner value is the close error
    /// (`None` is a clean end of stream).
    closed: Option<Option<WinrmError>>,
    reader_dropped: bool,
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<PipeState>,
    /// Wakes the reader when data or a close arrives.
    readable: Notify,
    /// Wakes the writer when its block was consumed or the reader left.
    writable: Notify,
    /// Serializes concurrent writers.
    write_lock: tokio::sync::Mutex<()>,
}

impl Shared {
    fn lock(&self) -> Result<MutexGuard<'_, PipeState>> {
        self.state.lock().map_err(|_| WinrmError::LockPoisoned)
    }
}

/// Create a connected writer/reader pair.
///
/// The pipe holds no buffer of its own: a write completes only once the
/// reader has taken every byte of it.
pub fn pipe() -> (PipeWriter, PipeReader) {
    let shared = Arc::new(Shared::default());
    (
        PipeWriter {
            shared: Arc::clone(&shared),
        },
        PipeReader { shared },
    )
}

/// Producer half of a [`pipe`].
#[derive(Debug)]
pub struct PipeWriter {
    shared: Arc<Shared>,
}

impl PipeWriter {
    /// Hand `data` to the reader, waiting until it has been consumed.
    ///
    /// Fails with [`WinrmError::Closed`] if the writer was already closed
    /// or the reader was dropped.
    pub async fn write(&self, data: &[u8]) -> Result<usize> {
        let _serial = self.shared.write_lock.lock().await;

        {
            let mut state = self.shared.lock()?;
            if state.closed.is_some() || state.reader_dropped {
                return Err(WinrmError::Closed);
            }
            if data.is_empty() {
                return Ok(0);
            }
            state.pending = data.to_vec();
            state.pos = 0;
        }
        self.shared.readable.notify_one();

        loop {
            {
                let mut state = self.shared.lock()?;
                if state.pending.is_empty() {
                    trace!("pipe: {} bytes consumed", data.len());
                    return Ok(data.len());
                }
                if state.reader_dropped {
                    state.pending.clear();
                    return Err(WinrmError::Closed);
                }
            }
            self.shared.writable.notified().await;
        }
    }

    /// Close the writer. Once remaining bytes are read, the reader sees
    /// `err`, or end of stream when `err` is `None`.
    ///
    /// A second close fails with [`WinrmError::Closed`].
    pub fn close_with_error(&self, err: Option<WinrmError>) -> Result<()> {
        {
            let mut state = self.shared.lock()?;
            if state.closed.is_some() {
                return Err(WinrmError::Closed);
            }
            state.closed = Some(err);
        }
        self.shared.readable.notify_one();
        Ok(())
    }

    /// Close the writer cleanly.
    pub fn close(&self) -> Result<()> {
        self.close_with_error(None)
    }

    /// Whether the writer has been closed.
    pub fn is_closed(&self) -> bool {
        self.shared
            .lock()
            .map(|state| state.closed.is_some())
            .unwrap_or(true)
    }
}

impl Drop for PipeWriter {
    fn drop(&mut self) {
        if !self.is_closed() {
            let _ = self.close_with_error(Some(WinrmError::InvalidState(
                "stream writer dropped without close".into(),
            )));
        }
    }
}

/// Consumer half of a [`pipe`].
#[derive(Debug)]
pub struct PipeReader {
    shared: Arc<Shared>,
}

impl PipeReader {
    /// Read available bytes into `buf`, waiting for the writer if needed.
    ///
    /// Returns `Ok(0)` at a clean end of stream, or the writer's close error
    /// once every written byte has been read.
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        loop {
            {
                let mut state = self.shared.lock()?;
                if state.pos < state.pending.len() {
                    let n = buf.len().min(state.pending.len() - state.pos);
                    let start = state.pos;
                    buf[..n].copy_from_slice(&state.pending[start..start + n]);
                    state.pos += n;
                    if state.pos == state.pending.len() {
                        state.pending.clear();
                        state.pos = 0;
                        drop(state);
                        self.shared.writable.notify_one();
                    }
                    return Ok(n);
                }
                if let Some(reason) = &state.closed {
                    return match reason {
                        None => Ok(0),
                        Some(err) => Err(err.clone()),
                    };
                }
            }
            self.shared.readable.notified().await;
        }
    }

    /// Read until end of stream, appending to `out`.
    ///
    /// On a close error the bytes read so far stay in `out`.
    pub async fn read_to_end(&mut self, out: &mut Vec<u8>) -> Result<usize> {
        let mut buf = [0u8; READ_BUFFER_SIZE];
        let mut total = 0;
        loop {
            match self.read(&mut buf).await? {
                0 => return Ok(total),
                n => {
                    out.extend_from_slice(&buf[..n]);
                    total += n;
                }
            }
        }
    }
}

impl Drop for PipeReader {
    fn drop(&mut self) {
        if let Ok(mut state) = self.shared.lock() {
            state.reader_dropped = true;
        }
        self.shared.writable.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_write_then_read() {
        let (writer, mut reader) = pipe();

        let handle = tokio::spawn(async move {
            let n = writer.write(b"hello").await.unwrap();
            writer.close().unwrap();
            n
        });

        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"hello");
        assert_eq!(handle.await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_write_blocks_until_read() {
        let (writer, mut reader) = pipe();

        let handle = tokio::spawn(async move { writer.write(b"abc").await });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!handle.is_finished());

        let mut buf = [0u8; 2];
        assert_eq!(reader.read(&mut buf).await.unwrap(), 2);
        assert_eq!(&buf, b"ab");
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!handle.is_finished());

        assert_eq!(reader.read(&mut buf).await.unwrap(), 1);
        assert_eq!(buf[0], b'c');
        let written = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(written, 3);
    }

    #[test]
    fn test_reader_wakes_writer() {
        use tokio_test::{assert_pending, assert_ready_eq, task};

        let (writer, mut reader) = pipe();
        let mut write = task::spawn(async move { writer.write(b"abc").await });
        assert_pending!(write.poll());

        let mut buf = [0u8; 8];
        let mut read = task::spawn(reader.read(&mut buf));
        assert_ready_eq!(read.poll(), Ok(3));
        drop(read);

        assert!(write.is_woken());
        assert_ready_eq!(write.poll(), Ok(3));
        assert_eq!(&buf[..3], b"abc");
    }

    #[tokio::test]
    async fn test_write_after_close_fails() {
        let (writer, _reader) = pipe();
        writer.close().unwrap();

        assert_eq!(writer.write(b"data").await, Err(WinrmError::Closed));
        assert_eq!(writer.write(b"").await, Err(WinrmError::Closed));
    }

    #[tokio::test]
    async fn test_double_close_fails() {
        let (writer, _reader) = pipe();
        writer.close_with_error(Some(WinrmError::Canceled)).unwrap();
        assert_eq!(writer.close(), Err(WinrmError::Closed));
    }

    #[tokio::test]
    async fn test_close_error_seen_by_reader() {
        let (writer, mut reader) = pipe();
        writer.close_with_error(Some(WinrmError::Canceled)).unwrap();

        let mut buf = [0u8; 8];
        assert_eq!(reader.read(&mut buf).await, Err(WinrmError::Canceled));
        // Sticky.
        assert_eq!(reader.read(&mut buf).await, Err(WinrmError::Canceled));
    }

    #[tokio::test]
    async fn test_clean_close_is_eof() {
        let (writer, mut reader) = pipe();
        writer.close().unwrap();

        let mut buf = [0u8; 8];
        assert_eq!(reader.read(&mut buf).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_partial_data_then_error() {
        let (writer, mut reader) = pipe();

        tokio::spawn(async move {
            writer.write(b"partial").await.unwrap();
            writer
                .close_with_error(Some(WinrmError::Parse("bad body".into())))
                .unwrap();
        });

        let mut out = Vec::new();
        let err = reader.read_to_end(&mut out).await.unwrap_err();
        assert_eq!(out, b"partial");
        assert!(matches!(err, WinrmError::Parse(_)));
    }

    #[tokio::test]
    async fn test_write_fails_when_reader_dropped() {
        let (writer, reader) = pipe();

        let handle = tokio::spawn(async move { writer.write(b"nobody listens").await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(reader);

        let result = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(result, Err(WinrmError::Closed));
    }

    #[tokio::test]
    async fn test_dropped_writer_unblocks_reader() {
        let (writer, mut reader) = pipe();
        drop(writer);

        let mut buf = [0u8; 4];
        assert!(matches!(
            reader.read(&mut buf).await,
            Err(WinrmError::InvalidState(_))
        ));
    }
}
