mod blpop;
mod command_error;
mod echo;
mod get;
mod incr;
mod keys;
mod llen;
mod lpop_and_rpop;
mod lrange;
mod ping;
pub mod pub_sub;
mod rpush_and_lpush;
mod set;
mod stream_utils;
pub mod transactions;
mod type_command;
mod xadd;
mod xrange;
mod xread;

pub use blpop::{BlpopArguments, blpop};
pub use command_error::CommandError;
pub use echo::{EchoArguments, echo};
pub use get::{GetArguments, get};
pub use incr::{IncrArguments, incr};
pub use keys::{KeysArguments, keys};
pub use llen::{LlenArguments, llen};
pub use lpop_and_rpop::{PopArguments, pop};
pub use lrange::{LrangeArguments, lrange};
pub use ping::{PingArguments, ping};
pub use rpush_and_lpush::{PushArguments, push};
pub use set::{SetArguments, set};
pub use type_command::{TypeArguments, type_command};
pub use xadd::{XaddArguments, xadd};
pub use xrange::{XrangeArguments, xrange};
pub use xread::{XreadArguments, XreadStart, xread};

use bytes::Bytes;

/// Decodes an argument that must be valid UTF-8 (numbers, options, IDs).
pub(crate) fn utf8_argument(argument: &Bytes) -> Result<&str, CommandError> {
    std::str::from_utf8(argument).map_err(|_| CommandError::Syntax)
}

/// Parses an argument as a signed 64-bit integer.
pub(crate) fn integer_argument(argument: &Bytes) -> Result<i64, CommandError> {
    utf8_argument(argument)?
        .parse::<i64>()
        .map_err(|_| CommandError::NotAnInteger)
}
