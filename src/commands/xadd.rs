use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use tokio::sync::Mutex;

use crate::{
    commands::command_error::CommandError, key_value_store::KeyValueStore, resp::RespValue,
    stream::StreamFields,
};

/// Represents the parsed arguments for the XADD command.
pub struct XaddArguments {
    key: String,
    /// `*`, `<ms>-*` or an explicit `<ms>-<seq>`
    stream_id: String,
    fields: StreamFields,
}

impl XaddArguments {
    /// Parses `key id field value [field value ...]`.
    ///
    /// Fields must come in field/value pairs, anything else is an arity error.
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() < 4 || arguments.len() % 2 != 0 {
            return Err(CommandError::wrong_number_of_arguments("xadd"));
        }

        let fields = arguments[2..]
            .chunks_exact(2)
            .map(|pair| (pair[0].clone(), pair[1].clone()))
            .collect();

        Ok(Self {
            key: arguments[0].clone(),
            stream_id: arguments[1].clone(),
            fields,
        })
    }
}

/// Handles the XADD command, replying with the ID the entry was stored under.
pub async fn xadd(
    store: Arc<Mutex<KeyValueStore>>,
    arguments: Vec<String>,
) -> Result<RespValue, CommandError> {
    let xadd_arguments = XaddArguments::parse(arguments)?;

    let now_in_milliseconds = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as u64)
        .unwrap_or_default();

    let mut store_guard = store.lock().await;
    let stream_id = store_guard.add_stream_entry(
        &xadd_arguments.key,
        &xadd_arguments.stream_id,
        xadd_arguments.fields,
        now_in_milliseconds,
    )?;

    Ok(RespValue::BulkString(stream_id.to_string()))
}
