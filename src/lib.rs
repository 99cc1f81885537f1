//! An in-memory key/value server speaking RESP/RESP3.
//!
//! This crate provides a Redis-compatible server supporting:
//!
//! - Basic key-value operations (GET, SET with expiry, INCR, TYPE, KEYS)
//! - List operations (LPUSH, RPUSH, LPOP, RPOP, BLPOP, LRANGE, LLEN)
//! - Stream operations (XADD, XRANGE, XREAD with blocking tail reads)
//! - Pub/sub channels (SUBSCRIBE, UNSUBSCRIBE, PUBLISH)
//! - Transactions (MULTI, EXEC, DISCARD)
//!
//! All shared state is owned by a single executor task; per-connection
//! reader and writer tasks only move frames between the socket and the
//! executor's queues, which keeps request/response order per connection
//! and makes the domain logic lock-free.

pub mod blocked;
pub mod client;
pub mod command;
pub mod commands;
pub mod connection;
pub mod executor;
pub mod pubsub;
pub mod resp;
pub mod server;
pub mod store;
pub mod stream;
