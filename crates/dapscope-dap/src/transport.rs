//! DAP transport layer: Content-Length based message framing.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::DapError;
use crate::protocol::Message;

const HEADER_SEPARATOR: &[u8] = b"\r\n\r\n";

/// Upper bound on header bytes buffered before a separator must appear.
const MAX_HEADER_LEN: usize = 8 * 1024;

/// Largest body a frame may declare.
const MAX_BODY_LEN: usize = 64 * 1024 * 1024;

const READ_CHUNK: usize = 4096;

/// Encode a message into a DAP wire-format frame with Content-Length header.
///
/// The length is the UTF-8 byte length of the JSON body.
pub fn encode_message(message: &Message) -> Result<Vec<u8>, DapError> {
    let body = serde_json::to_vec(message)
        .map_err(|e| DapError::Protocol(format!("cannot serialize message: {e}")))?;
    let header = format!("Content-Length: {}\r\n\r\n", body.len());
    let mut buf = Vec::with_capacity(header.len() + body.len());
    buf.extend_from_slice(header.as_bytes());
    buf.extend_from_slice(&body);
    Ok(buf)
}

/// Decode one frame from the front of `data`.
///
/// Returns `Ok(None)` while the buffer does not yet hold a complete frame,
/// otherwise the parsed message and the number of bytes it occupied.
pub fn decode_message(data: &[u8]) -> Result<Option<(Message, usize)>, DapError> {
    let Some(sep_pos) = find_separator(data) else {
        if data.len() > MAX_HEADER_LEN {
            return Err(DapError::Protocol(format!(
                "no header terminator within {MAX_HEADER_LEN} bytes"
            )));
        }
        return Ok(None);
    };

    let header = std::str::from_utf8(&data[..sep_pos])
        .map_err(|e| DapError::Protocol(format!("header is not UTF-8: {e}")))?;
    let content_length = parse_content_length(header)?;

    if content_length > MAX_BODY_LEN {
        return Err(DapError::Protocol(format!(
            "Content-Length {content_length} exceeds the {MAX_BODY_LEN} byte limit"
        )));
    }

    let body_start = sep_pos + HEADER_SEPARATOR.len();
    let total = body_start
        .checked_add(content_length)
        .ok_or_else(|| DapError::Protocol(format!("Content-Length {content_length} overflows")))?;
    if data.len() < total {
        return Ok(None);
    }

    let message: Message = serde_json::from_slice(&data[body_start..total])
        .map_err(|e| DapError::Protocol(format!("invalid message body: {e}")))?;
    Ok(Some((message, total)))
}

fn find_separator(data: &[u8]) -> Option<usize> {
    data.windows(HEADER_SEPARATOR.len())
        .position(|w| w == HEADER_SEPARATOR)
}

/// Parse the Content-Length value from the header section.
fn parse_content_length(header: &str) -> Result<usize, DapError> {
    for line in header.split("\r\n") {
        let line = line.trim();
        if let Some(value) = line.strip_prefix("Content-Length:") {
            let value = value.trim();
            return value.parse::<usize>().map_err(|e| {
                DapError::Protocol(format!("invalid Content-Length value '{value}': {e}"))
            });
        }
    }
    Err(DapError::Protocol("missing Content-Length header".into()))
}

/// Reads framed messages from a byte stream.
///
/// Framing does not depend on how the stream splits its reads.
#[derive(Debug)]
pub struct MessageReader<R> {
    inner: R,
    buf: Vec<u8>,
}

impl<R: AsyncRead + Unpin> MessageReader<R> {
    /// Wrap a readable stream.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: Vec::new(),
        }
    }

    /// Read the next complete message.
    ///
    /// Fails with [`DapError::ConnectionClosed`] when the stream ends before
    /// a full frame has arrived.
    pub async fn read_message(&mut self) -> Result<Message, DapError> {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            if let Some((message, consumed)) = decode_message(&self.buf)? {
                self.buf.drain(..consumed);
                return Ok(message);
            }
            let n = self.inner.read(&mut chunk).await?;
            if n == 0 {
                return Err(DapError::ConnectionClosed);
            }
            self.buf.extend_from_slice(&chunk[..n]);
        }
    }
}

/// Writes framed messages to a byte stream.
#[derive(Debug)]
pub struct MessageWriter<W> {
    inner: W,
}

impl<W: AsyncWrite + Unpin> MessageWriter<W> {
    /// Wrap a writable stream.
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Write one message and flush it.
    pub async fn write_message(&mut self, message: &Message) -> Result<(), DapError> {
        let frame = encode_message(message)?;
        self.inner.write_all(&frame).await?;
        self.inner.flush().await?;
        Ok(())
    }

    /// Shut down the write side of the stream.
    pub async fn shutdown(&mut self) -> Result<(), DapError> {
        self.inner.shutdown().await?;
        Ok(())
    }
}
