use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{commands::command_error::CommandError, key_value_store::KeyValueStore, resp::RespValue};

pub struct DelArguments {
    keys: Vec<String>,
}

impl DelArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.is_empty() {
            return Err(CommandError::wrong_number_of_arguments("del"));
        }

        Ok(Self { keys: arguments })
    }
}

/// Handles the DEL command, replying with the number of keys that were removed.
pub async fn del(
    store: Arc<Mutex<KeyValueStore>>,
    arguments: Vec<String>,
) -> Result<RespValue, CommandError> {
    let del_arguments = DelArguments::parse(arguments)?;

    let mut store_guard = store.lock().await;
    let removed = del_arguments
        .keys
        .iter()
        .filter(|key| store_guard.delete(key))
        .count();

    Ok(RespValue::Integer(removed as i64))
}
