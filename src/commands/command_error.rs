use thiserror::Error;

use crate::resp::RespValue;
use crate::stream::StreamIdError;

/// Every way a well-formed RESP frame can fail to execute as a command.
///
/// None of these abort the executor; they are rendered as RESP simple
/// errors on the originating connection via [`to_resp`](CommandError::to_resp).
#[derive(Error, Debug, PartialEq)]
pub enum CommandError {
    #[error("invalid command frame")]
    InvalidFrame,
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    #[error("wrong number of arguments for '{0}' command")]
    WrongArity(&'static str),
    #[error("value is not an integer or out of range")]
    NotAnInteger,
    #[error("timeout is not a float or out of range")]
    InvalidTimeout,
    #[error("timeout is negative")]
    NegativeTimeout,
    #[error("timeout is not an integer or out of range")]
    InvalidBlockDuration,
    #[error("syntax error")]
    Syntax,
    #[error("invalid expire time in 'set' command")]
    InvalidExpireTime,
    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,
    #[error("MULTI calls can not be nested")]
    NestedMulti,
    #[error("EXEC without MULTI")]
    ExecWithoutMulti,
    #[error("DISCARD without MULTI")]
    DiscardWithoutMulti,
    #[error("Can't execute '{0}': only SUBSCRIBE / UNSUBSCRIBE / PING are allowed in this context")]
    NotAllowedWhileSubscribed(&'static str),
    #[error("Unbalanced 'xread' list of streams: for each stream key an ID or '$' must be specified")]
    UnbalancedStreams,
    #[error("invalid pattern for 'keys' command")]
    InvalidPattern,
    #[error("{0}")]
    StreamId(#[from] StreamIdError),
}

impl CommandError {
    /// Renders the error as the simple-error reply sent to the client.
    /// Type errors carry their own `WRONGTYPE` code; everything else is an
    /// `ERR`.
    pub fn to_resp(&self) -> RespValue {
        let message = match self {
            CommandError::WrongType => self.to_string(),
            _ => format!("ERR {}", self),
        };
        RespValue::SimpleError(message)
    }
}
