use bytes::Bytes;

use crate::commands::CommandError;
use crate::resp::RespValue;
use crate::store::{DataType, Store};

#[derive(Debug, Clone, PartialEq)]
pub struct IncrArguments {
    pub key: Bytes,
}

impl IncrArguments {
    pub fn parse(arguments: Vec<Bytes>) -> Result<Self, CommandError> {
        if arguments.len() != 1 {
            return Err(CommandError::WrongArity("incr"));
        }

        Ok(IncrArguments {
            key: arguments[0].clone(),
        })
    }
}

/// Handles the INCR command.
///
/// An absent key starts at 1. A stored bulk string that parses as a base-10
/// integer is promoted to a native counter on first increment; anything
/// else is `value is not an integer or out of range`. Expiry on the key is
/// left untouched.
pub fn incr(arguments: &IncrArguments, store: &mut Store) -> Result<RespValue, CommandError> {
    let Some(entry) = store.get_mut(&arguments.key) else {
        store.set(arguments.key.clone(), DataType::Integer(1), None);
        return Ok(RespValue::Integer(1));
    };

    let next = match &entry.data {
        DataType::Integer(value) => value.checked_add(1).ok_or(CommandError::NotAnInteger)?,
        DataType::String(data) => {
            let current = std::str::from_utf8(data)
                .ok()
                .and_then(|text| text.parse::<i64>().ok())
                .ok_or(CommandError::NotAnInteger)?;
            current.checked_add(1).ok_or(CommandError::NotAnInteger)?
        }
        DataType::List(_) | DataType::Stream(_) => return Err(CommandError::NotAnInteger),
    };

    entry.data = DataType::Integer(next);
    Ok(RespValue::Integer(next))
}
