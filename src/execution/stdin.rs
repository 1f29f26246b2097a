//! Stdin delivery for remote commands.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use super::command::CommandCore;
use crate::error::WinrmError;
use crate::Result;

/// Write end of a command's stdin.
///
/// Every write is split into blocks that fit the negotiated envelope size
/// and sent with one `Send` request each.
pub struct CommandWriter {
    core: Arc<CommandCore>,
    eof: Mutex<bool>,
}

impl CommandWriter {
    pub(super) fn new(core: Arc<CommandCore>) -> Self {
        Self {
            core,
            eof: Mutex::new(false),
        }
    }

    /// Send `data` to the command's stdin.
    ///
    /// Fails with [`WinrmError::Closed`] after [`close`](Self::close). If a
    /// request fails after some blocks were delivered, the error is
    /// [`WinrmError::PartialWrite`] carrying the delivered byte count.
    pub async fn write(&self, data: &[u8]) -> Result<usize> {
        let eof = self.eof.lock().await;
        if *eof {
            return Err(WinrmError::Closed);
        }
        self.send_blocks(data).await
    }

    /// Mark stdin closed, then write `data` through [`write`](Self::write).
    ///
    /// The closed check in `write` sees the mark, so nothing is sent and the
    /// call fails with [`WinrmError::Closed`]. The end-of-input flag is never
    /// sent by this call, and a later [`close`](Self::close) fails too.
    pub async fn write_and_close(&self, data: &[u8]) -> Result<usize> {
        *self.eof.lock().await = true;
        debug!(command = %self.core.id, "stdin marked closed before write");
        self.write(data).await
    }

    /// Signal end of input to the remote command.
    ///
    /// A second close fails with [`WinrmError::Closed`].
    pub async fn close(&self) -> Result<()> {
        let mut eof = self.eof.lock().await;
        if *eof {
            return Err(WinrmError::Closed);
        }
        *eof = true;
        debug!(command = %self.core.id, "closing stdin");
        self.core.send_input(&[], true).await
    }

    /// Whether stdin has been closed.
    pub async fn is_closed(&self) -> bool {
        *self.eof.lock().await
    }

    async fn send_blocks(&self, data: &[u8]) -> Result<usize> {
        let block_size = self.core.check()?.client.parameters().max_input_chunk();

        let mut written = 0;
        for block in data.chunks(block_size) {
            if let Err(source) = self.core.send_input(block, false).await {
                return Err(match written {
                    0 => source,
                    _ => WinrmError::PartialWrite {
                        written,
                        source: Box::new(source),
                    },
                });
            }
            written += block.len();
        }

        if written < data.len() {
            return Err(WinrmError::ShortWrite);
        }
        Ok(written)
    }
}
