use std::sync::Arc;

use bytes::BytesMut;
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    sync::Mutex,
};
use tracing::{debug, error, warn};

use crate::{
    commands::process_request,
    input::{read_resp_frame, CommandReadError},
    key_value_store::KeyValueStore,
};

/// Serves one client until it disconnects.
///
/// Requests are answered in the order they arrive. A malformed frame gets a protocol error
/// reply and the buffered bytes are dropped, since the next frame boundary can not be found.
///
/// The socket keeps being read while a request runs. When the client hangs up before the reply
/// is ready, the request is dropped, so a pending BLPOP gives up its place in the wait queue.
pub async fn handle_client_connection<S>(
    stream: S,
    client_address: String,
    store: Arc<Mutex<KeyValueStore>>,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (mut reader, mut writer) = tokio::io::split(stream);
    let mut buffer = BytesMut::with_capacity(4096);

    loop {
        let input = match read_resp_frame(&mut reader, &mut buffer).await {
            Ok(input) => input,
            Err(CommandReadError::ConnectionClosed) => {
                debug!(client = %client_address, "Client disconnected");
                break;
            }
            Err(e @ CommandReadError::RespParseError(_)) => {
                warn!(client = %client_address, error = %e, "Discarding malformed input");
                buffer.clear();

                if let Err(e) = write_to_stream(&mut writer, e.as_string().as_bytes()).await {
                    error!(client = %client_address, error = %e, "Error writing to stream");
                    break;
                }

                continue;
            }
            Err(e) => {
                warn!(client = %client_address, error = %e, "Closing connection");
                break;
            }
        };

        let request = process_request(input, Arc::clone(&store));
        tokio::pin!(request);

        let response = loop {
            tokio::select! {
                biased;

                response = &mut request => break Some(response),
                read = reader.read_buf(&mut buffer) => match read {
                    // Bytes read here are kept for the next frame
                    Ok(number_of_bytes) if number_of_bytes > 0 => continue,
                    Ok(_) => break None,
                    Err(e) => {
                        warn!(client = %client_address, error = %e, "Read failed during request");
                        break None;
                    }
                },
            }
        };

        let Some(response) = response else {
            debug!(client = %client_address, "Client disconnected before the reply was ready");
            break;
        };

        if let Err(e) = write_to_stream(&mut writer, response.as_bytes()).await {
            error!(client = %client_address, error = %e, "Error writing to stream");
            break;
        }
    }
}

async fn write_to_stream<W>(writer: &mut W, data: &[u8]) -> Result<(), CommandReadError>
where
    W: AsyncWrite + Unpin,
{
    writer
        .write_all(data)
        .await
        .map_err(|e| CommandReadError::IoError(e.to_string()))?;
    writer
        .flush()
        .await
        .map_err(|e| CommandReadError::IoError(e.to_string()))
}
