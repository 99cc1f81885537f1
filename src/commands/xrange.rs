use bytes::Bytes;

use crate::commands::stream_utils::{entries_to_resp, parse_range_bound};
use crate::commands::{CommandError, utf8_argument};
use crate::resp::RespValue;
use crate::store::{DataType, Store};
use crate::stream::{StreamEntry, StreamId};

#[derive(Debug, Clone, PartialEq)]
pub struct XrangeArguments {
    pub key: Bytes,
    pub start: StreamId,
    pub end: StreamId,
}

impl XrangeArguments {
    pub fn parse(arguments: Vec<Bytes>) -> Result<Self, CommandError> {
        if arguments.len() != 3 {
            return Err(CommandError::WrongArity("xrange"));
        }

        Ok(XrangeArguments {
            key: arguments[0].clone(),
            start: parse_range_bound(utf8_argument(&arguments[1])?, false)?,
            end: parse_range_bound(utf8_argument(&arguments[2])?, true)?,
        })
    }
}

/// Handles the XRANGE command: entries with IDs inside the inclusive
/// bounds, in ascending order. A missing stream is an empty array.
pub fn xrange(arguments: &XrangeArguments, store: &mut Store) -> Result<RespValue, CommandError> {
    let Some(entry) = store.get(&arguments.key) else {
        return Ok(RespValue::Array(vec![]));
    };
    let DataType::Stream(stream) = &entry.data else {
        return Err(CommandError::WrongType);
    };

    let entries: Vec<StreamEntry> = stream.range(arguments.start, arguments.end, false).collect();
    Ok(entries_to_resp(&entries))
}
