use thiserror::Error;

use crate::{key_value_store::StoreError, resp::RespValue};

#[derive(Error, Debug, PartialEq, Clone)]
pub enum CommandError {
    #[error("ERR unknown command")]
    UnknownCommand,
    #[error("ERR wrong number of arguments for '{0}' command")]
    WrongNumberOfArguments(String),
    #[error("ERR value is not an integer or out of range")]
    NotAnInteger,
    #[error("ERR value is out of range, must be positive")]
    NotPositive,
    #[error("ERR syntax error")]
    SyntaxError,
    #[error("ERR invalid expire time in '{0}' command")]
    InvalidExpireTime(String),
    #[error("ERR timeout is negative")]
    TimeoutIsNegative,
    #[error("ERR timeout is not a float or out of range")]
    TimeoutNotFloat,
    #[error(
        "ERR Unbalanced 'xread' list of streams: for each stream key an ID or '$' must be specified."
    )]
    UnbalancedXreadStreams,
    #[error("{0}")]
    StoreError(#[from] StoreError),
}

impl CommandError {
    pub fn wrong_number_of_arguments(command: &str) -> Self {
        CommandError::WrongNumberOfArguments(command.to_lowercase())
    }

    pub fn as_string(&self) -> String {
        RespValue::Error(self.to_string()).encode()
    }
}
