use crate::{commands::command_error::CommandError, resp::RespValue};

pub struct PingArguments {
    message: Option<String>,
}

impl PingArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.is_empty() {
            return Ok(Self { message: None });
        }

        Ok(Self {
            message: Some(arguments.join(" ")),
        })
    }
}

/// Handles the PING command.
///
/// Without arguments the reply is `PONG`. Any arguments are sent back joined by spaces as an
/// error reply.
pub fn ping(arguments: Vec<String>) -> Result<RespValue, CommandError> {
    let ping_arguments = PingArguments::parse(arguments)?;

    match ping_arguments.message {
        None => Ok(RespValue::SimpleString("PONG".to_string())),
        Some(message) => Ok(RespValue::Error(message)),
    }
}
