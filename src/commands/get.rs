use bytes::Bytes;

use crate::commands::CommandError;
use crate::resp::RespValue;
use crate::store::{DataType, Store};

#[derive(Debug, Clone, PartialEq)]
pub struct GetArguments {
    pub key: Bytes,
}

impl GetArguments {
    pub fn parse(arguments: Vec<Bytes>) -> Result<Self, CommandError> {
        if arguments.len() != 1 {
            return Err(CommandError::WrongArity("get"));
        }

        Ok(GetArguments {
            key: arguments[0].clone(),
        })
    }
}

/// Handles the GET command.
///
/// Bulk payloads pass through untouched and integer counters are
/// stringified; an absent or expired key is a null reply. Structured kinds
/// (lists, streams) are a type error.
pub fn get(arguments: &GetArguments, store: &mut Store) -> Result<RespValue, CommandError> {
    let Some(entry) = store.get(&arguments.key) else {
        return Ok(RespValue::Null);
    };

    match &entry.data {
        DataType::String(data) => Ok(RespValue::BulkString(data.clone())),
        DataType::Integer(value) => Ok(RespValue::bulk(value.to_string())),
        DataType::List(_) | DataType::Stream(_) => Err(CommandError::WrongType),
    }
}
