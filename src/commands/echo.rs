use bytes::Bytes;

use crate::commands::CommandError;
use crate::resp::RespValue;

#[derive(Debug, Clone, PartialEq)]
pub struct EchoArguments {
    pub message: Bytes,
}

impl EchoArguments {
    pub fn parse(arguments: Vec<Bytes>) -> Result<Self, CommandError> {
        if arguments.len() != 1 {
            return Err(CommandError::WrongArity("echo"));
        }

        Ok(EchoArguments {
            message: arguments[0].clone(),
        })
    }
}

pub fn echo(arguments: &EchoArguments) -> RespValue {
    RespValue::BulkString(arguments.message.clone())
}
