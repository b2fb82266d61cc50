mod blpop;
mod command_error;
mod command_handler;
mod del;
mod echo;
mod get;
mod llen;
mod lpop_and_rpop;
mod lrange;
mod ping;
mod rpush_and_lpush;
mod set;
mod stream_utils;
mod type_command;
mod xadd;
mod xrange;
mod xread;

pub use command_error::CommandError;
pub use command_handler::{process_request, CommandHandler};
