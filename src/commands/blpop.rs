use std::{sync::Arc, time::Duration};

use tokio::{
    sync::Mutex,
    time::{timeout_at, Instant},
};
use tracing::debug;

use crate::{
    commands::command_error::CommandError,
    key_value_store::{BlockingPop, KeyValueStore},
    resp::RespValue,
};

#[derive(Debug, PartialEq)]
pub struct BlpopArguments {
    key: String,
    /// `None` blocks until an element arrives
    timeout: Option<Duration>,
}

impl BlpopArguments {
    /// Parses `key timeout`, where the timeout is a number of seconds and `0` waits forever.
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 2 {
            return Err(CommandError::wrong_number_of_arguments("blpop"));
        }

        let seconds = arguments[1]
            .parse::<f64>()
            .ok()
            .filter(|seconds| seconds.is_finite())
            .ok_or(CommandError::TimeoutNotFloat)?;

        if seconds < 0.0 {
            return Err(CommandError::TimeoutIsNegative);
        }

        let timeout = if seconds == 0.0 {
            None
        } else {
            Some(Duration::try_from_secs_f64(seconds).map_err(|_| CommandError::TimeoutNotFloat)?)
        };

        Ok(Self {
            key: arguments[0].clone(),
            timeout,
        })
    }
}

/// Handles the BLPOP command.
///
/// Pops the head of the list right away when it has elements. Otherwise the client is queued
/// behind earlier waiters on the same key and the store lock is released until a push hands it
/// an element or the timeout elapses, in which case the reply is a null array.
pub async fn blpop(
    store: Arc<Mutex<KeyValueStore>>,
    arguments: Vec<String>,
) -> Result<RespValue, CommandError> {
    let blpop_arguments = BlpopArguments::parse(arguments)?;
    let key = blpop_arguments.key;

    let deadline = blpop_arguments
        .timeout
        .and_then(|timeout| Instant::now().checked_add(timeout));

    let blocking_pop = {
        let mut store_guard = store.lock().await;
        store_guard.pop_or_wait(&key, deadline)?
    };

    let value = match blocking_pop {
        BlockingPop::Ready(value) => Some(value),
        BlockingPop::Waiting {
            waiter_id,
            mut receiver,
        } => {
            debug!(key = %key, waiter_id, "Client blocked");

            match deadline {
                None => receiver.await.ok(),
                Some(deadline) => match timeout_at(deadline, &mut receiver).await {
                    Ok(received) => received.ok(),
                    Err(_) => {
                        store.lock().await.cancel_waiter(&key, waiter_id);
                        // A push may have handed over an element right before the waiter was
                        // removed
                        receiver.try_recv().ok()
                    }
                },
            }
        }
    };

    match value {
        Some(value) => Ok(RespValue::Array(vec![
            RespValue::BulkString(key),
            RespValue::BulkString(value),
        ])),
        None => Ok(RespValue::NullArray),
    }
}
