use bytes::Bytes;

use crate::commands::CommandError;
use crate::resp::RespValue;
use crate::store::{DataType, Store};

#[derive(Debug, Clone, PartialEq)]
pub struct LlenArguments {
    pub key: Bytes,
}

impl LlenArguments {
    pub fn parse(arguments: Vec<Bytes>) -> Result<Self, CommandError> {
        if arguments.len() != 1 {
            return Err(CommandError::WrongArity("llen"));
        }

        Ok(LlenArguments {
            key: arguments[0].clone(),
        })
    }
}

pub fn llen(arguments: &LlenArguments, store: &mut Store) -> Result<RespValue, CommandError> {
    match store.get(&arguments.key) {
        None => Ok(RespValue::Integer(0)),
        Some(entry) => match &entry.data {
            DataType::List(list) => Ok(RespValue::Integer(list.len() as i64)),
            _ => Err(CommandError::WrongType),
        },
    }
}
