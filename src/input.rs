//! Reading RESP frames from a client connection.
//!
//! Bytes are accumulated in a [`BytesMut`] buffer owned by the connection. A frame split over
//! several reads stays buffered until the rest of it arrives, and bytes following a complete
//! frame are kept for the next call.

use bytes::BytesMut;
use thiserror::Error;
use tokio::io::AsyncReadExt;

use crate::resp::{RespError, RespValue};

#[derive(Error, Debug, PartialEq)]
pub enum CommandReadError {
    #[error("I/O error: {0}")]
    IoError(String),
    #[error("Connection closed")]
    ConnectionClosed,
    #[error("Connection closed in the middle of a frame")]
    ConnectionReset,
    #[error("RESP parse error: {0}")]
    RespParseError(#[from] RespError),
}

impl CommandReadError {
    pub fn as_string(&self) -> String {
        match self {
            CommandReadError::IoError(msg) => RespValue::Error(format!("ERR {}", msg)).encode(),
            CommandReadError::ConnectionClosed | CommandReadError::ConnectionReset => {
                RespValue::Error("ERR connection closed".to_string()).encode()
            }
            CommandReadError::RespParseError(err) => err.as_string(),
        }
    }
}

/// Reads from `stream` until `buffer` holds one complete frame and returns it.
///
/// A clean end of stream between frames is reported as [`CommandReadError::ConnectionClosed`].
pub async fn read_resp_frame<R>(
    stream: &mut R,
    buffer: &mut BytesMut,
) -> Result<RespValue, CommandReadError>
where
    R: AsyncReadExt + Unpin,
{
    loop {
        if let Some(frame) = RespValue::parse_next(buffer)? {
            return Ok(frame);
        }

        let number_of_bytes = stream
            .read_buf(buffer)
            .await
            .map_err(|e| CommandReadError::IoError(e.to_string()))?;

        if number_of_bytes == 0 {
            if buffer.is_empty() {
                return Err(CommandReadError::ConnectionClosed);
            }

            return Err(CommandReadError::ConnectionReset);
        }
    }
}
