use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{commands::command_error::CommandError, key_value_store::KeyValueStore, resp::RespValue};

/// Represents the parsed arguments for the LRANGE command.
///
/// The LRANGE command returns a range of elements from a list stored at the given key.
/// Both indexes are inclusive and may be negative to count from the end of the list.
pub struct LrangeArguments {
    /// The key name to retrieve from the store
    key: String,
    /// The starting index for the range
    start_index: i64,
    /// The ending index for the range
    end_index: i64,
}

impl LrangeArguments {
    /// Parses and validates the arguments for the LRANGE command.
    ///
    /// # Arguments
    ///
    /// * `arguments` - A vector of command arguments: [key, start_index, end_index]
    ///
    /// # Returns
    ///
    /// * `Ok(LrangeArguments)` - If the arguments are valid
    /// * `Err(CommandError::WrongNumberOfArguments)` - If the number of arguments is not exactly 3
    /// * `Err(CommandError::NotAnInteger)` - If start or end index is not a valid integer
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 3 {
            return Err(CommandError::wrong_number_of_arguments("lrange"));
        }

        let Ok(start_index) = arguments[1].parse::<i64>() else {
            return Err(CommandError::NotAnInteger);
        };

        let Ok(end_index) = arguments[2].parse::<i64>() else {
            return Err(CommandError::NotAnInteger);
        };

        Ok(Self {
            key: arguments[0].clone(),
            start_index,
            end_index,
        })
    }
}

/// Handles the LRANGE command.
///
/// A missing key, an empty list or a range outside the list all reply with an empty array.
///
/// # Examples
///
/// ```ignore
/// // LRANGE fruits -2 -1  (get last 2 elements)
/// let result = lrange(store, vec!["fruits".to_string(), "-2".to_string(), "-1".to_string()]).await;
/// // Returns: RespValue::Array([BulkString("mango"), BulkString("raspberry")])
/// ```
pub async fn lrange(
    store: Arc<Mutex<KeyValueStore>>,
    arguments: Vec<String>,
) -> Result<RespValue, CommandError> {
    let lrange_arguments = LrangeArguments::parse(arguments)?;

    let mut store_guard = store.lock().await;
    let range = store_guard.list_range(
        &lrange_arguments.key,
        lrange_arguments.start_index,
        lrange_arguments.end_index,
    )?;

    Ok(RespValue::Array(
        range.into_iter().map(RespValue::BulkString).collect(),
    ))
}
