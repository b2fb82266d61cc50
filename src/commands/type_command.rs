use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{commands::command_error::CommandError, key_value_store::KeyValueStore, resp::RespValue};

pub struct TypeArguments {
    key: String,
}

impl TypeArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 1 {
            return Err(CommandError::wrong_number_of_arguments("type"));
        }

        Ok(Self {
            key: arguments[0].clone(),
        })
    }
}

/// Handles the TYPE command, replying `string`, `array`, `stream` or `none`.
pub async fn type_command(
    store: Arc<Mutex<KeyValueStore>>,
    arguments: Vec<String>,
) -> Result<RespValue, CommandError> {
    let type_arguments = TypeArguments::parse(arguments)?;

    let mut store_guard = store.lock().await;

    Ok(RespValue::SimpleString(
        store_guard.type_of(&type_arguments.key).to_string(),
    ))
}
