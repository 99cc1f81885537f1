use bytes::Bytes;

use crate::commands::CommandError;
use crate::resp::RespValue;

#[derive(Debug, Clone, PartialEq)]
pub struct PingArguments {
    pub message: Option<Bytes>,
}

impl PingArguments {
    pub fn parse(arguments: Vec<Bytes>) -> Result<Self, CommandError> {
        match arguments.len() {
            0 => Ok(PingArguments { message: None }),
            1 => Ok(PingArguments {
                message: Some(arguments[0].clone()),
            }),
            _ => Err(CommandError::WrongArity("ping")),
        }
    }
}

/// PING replies `+PONG` (or echoes its argument). A subscribed connection
/// instead gets the push-shaped `["pong", <message-or-empty>]` array so the
/// reply can be told apart from channel traffic.
pub fn ping(arguments: &PingArguments, subscribed: bool) -> RespValue {
    if subscribed {
        let message = arguments.message.clone().unwrap_or_else(Bytes::new);
        return RespValue::Array(vec![RespValue::bulk("pong"), RespValue::BulkString(message)]);
    }

    match &arguments.message {
        None => RespValue::SimpleString("PONG".to_string()),
        Some(message) => RespValue::BulkString(message.clone()),
    }
}
