//! A Redis-like in-memory server.
//!
//! Clients talk to the server over the Redis Serialization Protocol (RESP). Keys hold one of
//! three kinds of values:
//!
//! - Strings (GET, SET with an optional PX expiry, DEL)
//! - Lists (LPUSH, RPUSH, LPOP, RPOP, BLPOP, LRANGE, LLEN)
//! - Streams (XADD, XRANGE, XREAD)
//!
//! PING, ECHO and TYPE are supported as well. Every connection runs on its own Tokio task and
//! all of them share one [`key_value_store::KeyValueStore`] behind a mutex.

pub mod commands;
pub mod connection;
pub mod input;
pub mod key_value_store;
pub mod resp;
pub mod server;
pub mod state;
pub mod stream;
