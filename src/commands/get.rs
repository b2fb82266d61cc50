use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{commands::command_error::CommandError, key_value_store::KeyValueStore, resp::RespValue};

pub struct GetArguments {
    key: String,
}

impl GetArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 1 {
            return Err(CommandError::wrong_number_of_arguments("get"));
        }

        Ok(Self {
            key: arguments[0].clone(),
        })
    }
}

pub async fn get(
    store: Arc<Mutex<KeyValueStore>>,
    arguments: Vec<String>,
) -> Result<RespValue, CommandError> {
    let get_arguments = GetArguments::parse(arguments)?;

    let mut store_guard = store.lock().await;

    match store_guard.get(&get_arguments.key)? {
        Some(value) => Ok(RespValue::BulkString(value)),
        None => Ok(RespValue::NullBulkString),
    }
}
