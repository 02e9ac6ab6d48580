use std::fmt;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{TransferError, TransferResult};
use crate::util::timeout::timeout;

/* Link to the desktop tool. Generic over the stream so tests can run it over a duplex pipe. */
pub struct Connection<S> {
    stream: S,
    peer: String,
    read_timeout: Duration,
}

impl<S: AsyncRead + AsyncWrite + Unpin> Connection<S> {
    pub fn new(stream: S, peer: String, read_timeout: Duration) -> Self {
        Self {
            stream,
            peer,
            read_timeout,
        }
    }

    /* Fills the whole buffer or fails. Short reads are retried, EOF is an error. */
    pub async fn read_exact(&mut self, buf: &mut [u8]) -> TransferResult<()> {
        self.stream.read_exact(buf).await.map(|_| ()).map_err(TransferError::from)
    }

    /* Same, but gives up if the peer stalls for longer than the read timeout. */
    pub async fn read_exact_timeout(&mut self, buf: &mut [u8]) -> TransferResult<()> {
        let t = self.read_timeout;
        timeout(self.read_exact(buf), t).await
    }

    /* Waits for the start of the next packet for as long as it takes. An idle link between
     * scripts is normal. A clean close at this point is `NoData`, not an IO error. */
    pub async fn read_packet_start(&mut self, buf: &mut [u8]) -> TransferResult<()> {
        if buf.is_empty() {
            return Ok(());
        }
        let first = self.stream.read(buf).await?;
        if first == 0 {
            return Err(TransferError::NoData);
        }
        self.read_exact_timeout(&mut buf[first..]).await
    }

    pub async fn send_message(&mut self, msg: &str) -> TransferResult<()> {
        self.stream.write_all(msg.as_bytes()).await?;
        self.stream.flush().await?;
        Ok(())
    }
}

impl<S> fmt::Display for Connection<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "connection to {}", self.peer)
    }
}
