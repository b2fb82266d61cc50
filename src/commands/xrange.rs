use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    commands::{
        command_error::CommandError,
        stream_utils::{parse_range_end, parse_range_start, parse_stream_entries_to_resp},
    },
    key_value_store::KeyValueStore,
    resp::RespValue,
    stream::StreamId,
};

pub struct XrangeArguments {
    key: String,
    start: StreamId,
    end: StreamId,
}

impl XrangeArguments {
    /// Parses `key start end`. `-` and `+` stand for the smallest and largest IDs, and an ID
    /// without a sequence number gets sequence 0.
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 3 {
            return Err(CommandError::wrong_number_of_arguments("xrange"));
        }

        Ok(Self {
            key: arguments[0].clone(),
            start: parse_range_start(&arguments[1])?,
            end: parse_range_end(&arguments[2])?,
        })
    }
}

pub async fn xrange(
    store: Arc<Mutex<KeyValueStore>>,
    arguments: Vec<String>,
) -> Result<RespValue, CommandError> {
    let xrange_arguments = XrangeArguments::parse(arguments)?;

    let mut store_guard = store.lock().await;
    let entries = store_guard.stream_range(
        &xrange_arguments.key,
        xrange_arguments.start,
        xrange_arguments.end,
    )?;

    Ok(parse_stream_entries_to_resp(entries))
}
