use crate::{commands::command_error::CommandError, resp::RespValue};

pub struct EchoArguments {
    messages: Vec<String>,
}

impl EchoArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.is_empty() {
            return Err(CommandError::wrong_number_of_arguments("echo"));
        }

        Ok(Self {
            messages: arguments,
        })
    }
}

/// Handles the ECHO command.
///
/// A single argument is echoed back as a bulk string, several arguments as an array.
pub fn echo(arguments: Vec<String>) -> Result<RespValue, CommandError> {
    let mut echo_arguments = EchoArguments::parse(arguments)?;

    if echo_arguments.messages.len() == 1 {
        return Ok(RespValue::BulkString(echo_arguments.messages.remove(0)));
    }

    Ok(RespValue::Array(
        echo_arguments
            .messages
            .into_iter()
            .map(RespValue::BulkString)
            .collect(),
    ))
}
