use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    commands::command_error::CommandError,
    key_value_store::{KeyValueStore, ListEnd},
    resp::RespValue,
};

/// Parsed arguments shared by RPUSH and LPUSH.
pub struct PushArrayOperations {
    key: String,
    values: Vec<String>,
}

impl PushArrayOperations {
    pub fn parse(arguments: Vec<String>, command: &str) -> Result<Self, CommandError> {
        if arguments.len() < 2 {
            return Err(CommandError::wrong_number_of_arguments(command));
        }

        let mut arguments = arguments.into_iter();
        let key = arguments.next().unwrap_or_default();

        Ok(Self {
            key,
            values: arguments.collect(),
        })
    }
}

/// Handles RPUSH, appending the values to the tail of the list.
pub async fn rpush(
    store: Arc<Mutex<KeyValueStore>>,
    arguments: Vec<String>,
) -> Result<RespValue, CommandError> {
    push(store, PushArrayOperations::parse(arguments, "rpush")?, ListEnd::Tail).await
}

/// Handles LPUSH, prepending the values to the head of the list as one block.
pub async fn lpush(
    store: Arc<Mutex<KeyValueStore>>,
    arguments: Vec<String>,
) -> Result<RespValue, CommandError> {
    push(store, PushArrayOperations::parse(arguments, "lpush")?, ListEnd::Head).await
}

async fn push(
    store: Arc<Mutex<KeyValueStore>>,
    push_arguments: PushArrayOperations,
    end: ListEnd,
) -> Result<RespValue, CommandError> {
    let mut store_guard = store.lock().await;
    let length = store_guard.push(&push_arguments.key, push_arguments.values, end)?;

    Ok(RespValue::Integer(length as i64))
}
