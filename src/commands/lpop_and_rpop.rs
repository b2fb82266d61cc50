use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    commands::command_error::CommandError,
    key_value_store::{KeyValueStore, ListEnd},
    resp::RespValue,
};

/// Parsed arguments shared by LPOP and RPOP.
#[derive(Debug, PartialEq)]
pub struct PopArguments {
    key: String,
    /// Number of elements to pop, when given the reply is always an array
    count: Option<usize>,
}

impl PopArguments {
    pub fn parse(arguments: Vec<String>, command: &str) -> Result<Self, CommandError> {
        if arguments.is_empty() || arguments.len() > 2 {
            return Err(CommandError::wrong_number_of_arguments(command));
        }

        let count = match arguments.get(1) {
            Some(count) => Some(
                count
                    .parse::<usize>()
                    .map_err(|_| CommandError::NotPositive)?,
            ),
            None => None,
        };

        Ok(Self {
            key: arguments[0].clone(),
            count,
        })
    }
}

pub async fn lpop(
    store: Arc<Mutex<KeyValueStore>>,
    arguments: Vec<String>,
) -> Result<RespValue, CommandError> {
    pop(store, PopArguments::parse(arguments, "lpop")?, ListEnd::Head).await
}

pub async fn rpop(
    store: Arc<Mutex<KeyValueStore>>,
    arguments: Vec<String>,
) -> Result<RespValue, CommandError> {
    pop(store, PopArguments::parse(arguments, "rpop")?, ListEnd::Tail).await
}

async fn pop(
    store: Arc<Mutex<KeyValueStore>>,
    pop_arguments: PopArguments,
    end: ListEnd,
) -> Result<RespValue, CommandError> {
    let mut store_guard = store.lock().await;
    let popped = store_guard.pop(
        &pop_arguments.key,
        end,
        pop_arguments.count.unwrap_or(1),
    )?;

    match (pop_arguments.count, popped) {
        (None, Some(mut values)) if !values.is_empty() => {
            Ok(RespValue::BulkString(values.remove(0)))
        }
        (None, _) => Ok(RespValue::NullBulkString),
        (Some(_), None) => Ok(RespValue::NullArray),
        (Some(_), Some(values)) => Ok(RespValue::Array(
            values.into_iter().map(RespValue::BulkString).collect(),
        )),
    }
}
