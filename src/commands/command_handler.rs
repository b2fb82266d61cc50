use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::{
    commands::{
        blpop::blpop,
        command_error::CommandError,
        del::del,
        echo::echo,
        get::get,
        llen::llen,
        lpop_and_rpop::{lpop, rpop},
        lrange::lrange,
        ping::ping,
        rpush_and_lpush::{lpush, rpush},
        set::set,
        type_command::type_command,
        xadd::xadd,
        xrange::xrange,
        xread::xread,
    },
    key_value_store::KeyValueStore,
    resp::{RespValue, NOT_IMPLEMENTED},
};

/// A command frame split into its upper-cased name and its positional arguments.
#[derive(Debug, PartialEq, Clone)]
pub struct CommandHandler {
    pub name: String,
    pub arguments: Vec<String>,
}

impl CommandHandler {
    /// Builds a handler from a decoded frame.
    ///
    /// Only a non-empty array of bulk strings is a command. Anything else, the null array
    /// included, is rejected as an unknown command.
    pub fn new(input: RespValue) -> Result<Self, CommandError> {
        let RespValue::Array(elements) = input else {
            return Err(CommandError::UnknownCommand);
        };

        let mut elements = elements.into_iter();

        let name = match elements.next() {
            Some(RespValue::BulkString(s)) => s.to_uppercase(),
            _ => return Err(CommandError::UnknownCommand),
        };

        let mut arguments: Vec<String> = Vec::with_capacity(elements.len());

        for element in elements {
            let RespValue::BulkString(argument) = element else {
                return Err(CommandError::UnknownCommand);
            };

            arguments.push(argument);
        }

        Ok(Self { name, arguments })
    }

    pub async fn handle_command(
        &self,
        store: Arc<Mutex<KeyValueStore>>,
    ) -> Result<RespValue, CommandError> {
        let arguments = self.arguments.clone();

        match self.name.as_str() {
            "PING" => ping(arguments),
            "ECHO" => echo(arguments),
            "GET" => get(store, arguments).await,
            "SET" => set(store, arguments).await,
            "DEL" => del(store, arguments).await,
            "RPUSH" => rpush(store, arguments).await,
            "LPUSH" => lpush(store, arguments).await,
            "LRANGE" => lrange(store, arguments).await,
            "LLEN" => llen(store, arguments).await,
            "LPOP" => lpop(store, arguments).await,
            "RPOP" => rpop(store, arguments).await,
            "BLPOP" => blpop(store, arguments).await,
            "TYPE" => type_command(store, arguments).await,
            "XADD" => xadd(store, arguments).await,
            "XRANGE" => xrange(store, arguments).await,
            "XREAD" => xread(store, arguments).await,
            _ => Err(CommandError::UnknownCommand),
        }
    }
}

/// Runs one decoded request against the store and returns the encoded reply.
///
/// Command failures become error replies, so the connection always has something to write.
pub async fn process_request(input: RespValue, store: Arc<Mutex<KeyValueStore>>) -> String {
    // Frames with an unsupported type tag decode to this sentinel, which is sent back as is
    if matches!(&input, RespValue::Error(message) if message == NOT_IMPLEMENTED) {
        return input.encode();
    }

    let command_handler = match CommandHandler::new(input) {
        Ok(handler) => handler,
        Err(e) => return e.as_string(),
    };

    debug!(
        command = %command_handler.name,
        arguments = command_handler.arguments.len(),
        "Handling command"
    );

    match command_handler.handle_command(store).await {
        Ok(response) => response.encode(),
        Err(e) => {
            debug!(command = %command_handler.name, error = %e, "Command failed");
            e.as_string()
        }
    }
}
