use bytes::Bytes;

use crate::commands::{CommandError, integer_argument};
use crate::resp::RespValue;
use crate::store::{DataType, Store};

#[derive(Debug, Clone, PartialEq)]
pub struct LrangeArguments {
    pub key: Bytes,
    pub start: i64,
    pub stop: i64,
}

impl LrangeArguments {
    pub fn parse(arguments: Vec<Bytes>) -> Result<Self, CommandError> {
        if arguments.len() != 3 {
            return Err(CommandError::WrongArity("lrange"));
        }

        Ok(LrangeArguments {
            key: arguments[0].clone(),
            start: integer_argument(&arguments[1])?,
            stop: integer_argument(&arguments[2])?,
        })
    }
}

/// Handles the LRANGE command with the standard index rules: negative
/// indices count from the tail, the stop index is inclusive, and both ends
/// are clamped into the list.
pub fn lrange(arguments: &LrangeArguments, store: &mut Store) -> Result<RespValue, CommandError> {
    let Some(entry) = store.get(&arguments.key) else {
        return Ok(RespValue::Array(vec![]));
    };
    let DataType::List(list) = &entry.data else {
        return Err(CommandError::WrongType);
    };

    let length = list.len() as i64;
    let start = clamp_index(arguments.start, length);
    let stop = clamp_index(arguments.stop, length);

    if start >= length || start > stop {
        return Ok(RespValue::Array(vec![]));
    }

    let stop = stop.min(length - 1);
    let elements = list
        .iter()
        .skip(start as usize)
        .take((stop - start + 1) as usize)
        .cloned()
        .map(RespValue::BulkString)
        .collect();

    Ok(RespValue::Array(elements))
}

fn clamp_index(index: i64, length: i64) -> i64 {
    if index < 0 {
        (length + index).max(0)
    } else {
        index
    }
}
