use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{commands::command_error::CommandError, key_value_store::KeyValueStore, resp::RespValue};

pub struct LlenArguments {
    key: String,
}

impl LlenArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 1 {
            return Err(CommandError::wrong_number_of_arguments("llen"));
        }

        Ok(Self {
            key: arguments[0].clone(),
        })
    }
}

pub async fn llen(
    store: Arc<Mutex<KeyValueStore>>,
    arguments: Vec<String>,
) -> Result<RespValue, CommandError> {
    let llen_arguments = LlenArguments::parse(arguments)?;

    let mut store_guard = store.lock().await;
    let length = store_guard.list_length(&llen_arguments.key)?;

    Ok(RespValue::Integer(length as i64))
}
