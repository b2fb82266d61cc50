use std::{
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use tokio::{
    sync::Mutex,
    time::{sleep_until, Instant},
};
use tracing::debug;

use crate::{commands::command_error::CommandError, key_value_store::KeyValueStore, resp::RespValue};

/// Represents the parsed arguments for the SET command
#[derive(Debug, PartialEq)]
pub struct SetArguments {
    /// The key name to store the value under
    key: String,
    /// The value to be stored under the given key
    value: String,
    /// Time to live of the key value pair
    time_to_live: Option<Duration>,
}

impl SetArguments {
    /// Parses `key value [PX milliseconds]`.
    ///
    /// # Returns
    ///
    /// * `Err(CommandError::WrongNumberOfArguments)` - If the key or value is missing
    /// * `Err(CommandError::SyntaxError)` - If an option other than `PX` is given, `PX` is given
    ///   twice or its value is missing
    /// * `Err(CommandError::NotAnInteger)` - If the `PX` value is not an integer
    /// * `Err(CommandError::InvalidExpireTime)` - If the `PX` value is zero or negative
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() < 2 {
            return Err(CommandError::wrong_number_of_arguments("set"));
        }

        let mut time_to_live: Option<Duration> = None;
        let mut options = arguments[2..].iter();

        while let Some(option) = options.next() {
            if option.to_uppercase() != "PX" || time_to_live.is_some() {
                return Err(CommandError::SyntaxError);
            }

            let Some(milliseconds) = options.next() else {
                return Err(CommandError::SyntaxError);
            };

            let milliseconds = milliseconds
                .parse::<i64>()
                .map_err(|_| CommandError::NotAnInteger)?;

            if milliseconds <= 0 {
                return Err(CommandError::InvalidExpireTime("set".to_string()));
            }

            time_to_live = Some(Duration::from_millis(milliseconds as u64));
        }

        Ok(Self {
            key: arguments[0].clone(),
            value: arguments[1].clone(),
            time_to_live,
        })
    }
}

/// Handles the SET command.
///
/// Stores the value under the key, replacing whatever the key held before. When a time to live
/// is given a timer task removes the key once it elapses, unless the key was written again in
/// the meantime.
pub async fn set(
    store: Arc<Mutex<KeyValueStore>>,
    arguments: Vec<String>,
) -> Result<RespValue, CommandError> {
    let set_arguments = SetArguments::parse(arguments)?;

    let expiration = match set_arguments.time_to_live {
        Some(time_to_live) => Some(expiration_deadline(time_to_live)?),
        None => None,
    };

    let write_id = {
        let mut store_guard = store.lock().await;
        store_guard.set(&set_arguments.key, set_arguments.value, expiration)
    };

    if let Some(expiration) = expiration {
        let key = set_arguments.key;

        tokio::spawn(async move {
            sleep_until(expiration).await;

            if store.lock().await.expire_if_unchanged(&key, write_id) {
                debug!(key = %key, "Expired key");
            }
        });
    }

    Ok(RespValue::SimpleString("OK".to_string()))
}

/// The expiry moment must be representable as Unix milliseconds in an `i64`, like in Redis.
fn expiration_deadline(time_to_live: Duration) -> Result<Instant, CommandError> {
    let since_epoch = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();

    since_epoch
        .checked_add(time_to_live)
        .filter(|expires_at| expires_at.as_millis() <= i64::MAX as u128)
        .and_then(|_| Instant::now().checked_add(time_to_live))
        .ok_or_else(|| CommandError::InvalidExpireTime("set".to_string()))
}
