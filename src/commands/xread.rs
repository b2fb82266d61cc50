use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    commands::{command_error::CommandError, stream_utils::parse_stream_entries_to_resp},
    key_value_store::KeyValueStore,
    resp::RespValue,
    stream::StreamId,
};

/// The ID a stream is read after.
#[derive(Debug, PartialEq)]
enum ReadAfter {
    Id(StreamId),
    /// `$`, the last ID of the stream at the time of the call
    LastId,
}

#[derive(Debug)]
pub struct XreadArguments {
    key_stream_pairs: Vec<(String, ReadAfter)>,
}

impl XreadArguments {
    /// Parses `STREAMS key [key ...] id [id ...]`.
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() < 3 {
            return Err(CommandError::wrong_number_of_arguments("xread"));
        }

        if arguments[0].to_uppercase() != "STREAMS" {
            return Err(CommandError::SyntaxError);
        }

        let data = &arguments[1..];

        if data.len() % 2 != 0 {
            return Err(CommandError::UnbalancedXreadStreams);
        }

        let (keys, stream_ids) = data.split_at(data.len() / 2);
        let mut key_stream_pairs = Vec::with_capacity(keys.len());

        for (key, stream_id) in keys.iter().zip(stream_ids) {
            let read_after = match stream_id.as_str() {
                "$" => ReadAfter::LastId,
                id => ReadAfter::Id(id.parse::<StreamId>()?),
            };

            key_stream_pairs.push((key.clone(), read_after));
        }

        Ok(Self { key_stream_pairs })
    }
}

/// Handles the XREAD command.
///
/// Each stream contributes the entries whose ID is strictly greater than the requested one.
/// Streams without such entries are left out of the reply, which is a null array when no
/// stream has any.
pub async fn xread(
    store: Arc<Mutex<KeyValueStore>>,
    arguments: Vec<String>,
) -> Result<RespValue, CommandError> {
    let xread_arguments = XreadArguments::parse(arguments)?;

    let mut store_guard = store.lock().await;
    let mut streams: Vec<RespValue> = Vec::new();

    for (key, read_after) in xread_arguments.key_stream_pairs {
        let after = match read_after {
            ReadAfter::Id(id) => id,
            ReadAfter::LastId => store_guard
                .last_stream_id(&key)?
                .unwrap_or(StreamId::ZERO),
        };

        let entries = store_guard.stream_entries_after(&key, after)?;

        if entries.is_empty() {
            continue;
        }

        streams.push(RespValue::Array(vec![
            RespValue::BulkString(key),
            parse_stream_entries_to_resp(entries),
        ]));
    }

    if streams.is_empty() {
        return Ok(RespValue::NullArray);
    }

    Ok(RespValue::Array(streams))
}
