//! Newline-framed byte stream transport

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, instrument};

use crate::common::errors::{ClientError, Result};
use crate::common::traits::Connector;

/// Frame delimiter
pub const DELIMITER: u8 = b'\n';

/// Largest frame accepted from the peer, delimiter excluded
pub const MAX_FRAME_LEN: usize = 1024 * 1024;

/// Connector for plain TCP
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

#[async_trait]
impl Connector for TcpConnector {
    type Stream = TcpStream;

    #[instrument(skip(self))]
    async fn connect(&self, address: &str) -> Result<TcpStream> {
        let stream = TcpStream::connect(address)
            .await
            .map_err(|e| ClientError::Connect(format!("{address}: {e}")))?;
        stream
            .set_nodelay(true)
            .map_err(|e| ClientError::Connect(e.to_string()))?;
        debug!("Connected to {}", address);
        Ok(stream)
    }
}

/// Owns one live connection and moves whole frames over it.
///
/// Writes are never short and reads only complete on a delimiter or on
/// end of stream, however the peer's bytes are split or coalesced.
pub struct Transport<S> {
    /// `None` once closed
    stream: Option<BufReader<S>>,
}

impl<S> Transport<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap an already connected stream
    pub fn new(stream: S) -> Self {
        Self {
            stream: Some(BufReader::new(stream)),
        }
    }

    /// Open a connection through `connector`
    pub async fn open<C>(connector: &C, address: &str) -> Result<Self>
    where
        C: Connector<Stream = S>,
    {
        let stream = connector.connect(address).await?;
        Ok(Self::new(stream))
    }

    /// Check whether the connection is still held
    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    fn stream_mut(&mut self) -> Result<&mut BufReader<S>> {
        self.stream
            .as_mut()
            .ok_or_else(|| ClientError::Send("connection already closed".to_string()))
    }

    /// Write the whole buffer and flush it
    pub async fn send_all(&mut self, bytes: &[u8]) -> Result<()> {
        let stream = self.stream_mut()?;
        // write_all keeps writing the remainder after short writes and
        // reports a zero-length write as an error.
        stream
            .write_all(bytes)
            .await
            .map_err(|e| ClientError::Send(e.to_string()))?;
        stream
            .flush()
            .await
            .map_err(|e| ClientError::Send(e.to_string()))?;
        Ok(())
    }

    /// Read one frame, without its delimiter.
    ///
    /// Bytes left over at end of stream are returned as a final frame; an
    /// end of stream with nothing buffered is [`ClientError::EndOfStream`].
    pub async fn receive_frame(&mut self) -> Result<Vec<u8>> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| ClientError::Receive("connection already closed".to_string()))?;

        let mut frame = Vec::new();
        let read = (&mut *stream)
            .take(MAX_FRAME_LEN as u64 + 1)
            .read_until(DELIMITER, &mut frame)
            .await
            .map_err(|e| ClientError::Receive(e.to_string()))?;

        if read == 0 {
            return Err(ClientError::EndOfStream);
        }

        if frame.last() == Some(&DELIMITER) {
            frame.pop();
        } else if frame.len() > MAX_FRAME_LEN {
            return Err(ClientError::FrameTooLarge {
                limit: MAX_FRAME_LEN,
            });
        }

        Ok(frame)
    }

    /// Release the connection. Later calls do nothing.
    pub async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.get_mut().shutdown().await {
                debug!("Error while shutting down connection: {}", e);
            }
        }
    }
}
