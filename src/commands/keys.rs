use bytes::Bytes;
use globset::Glob;

use crate::commands::{CommandError, utf8_argument};
use crate::resp::RespValue;
use crate::store::Store;

#[derive(Debug, Clone, PartialEq)]
pub struct KeysArguments {
    pub pattern: String,
}

impl KeysArguments {
    pub fn parse(arguments: Vec<Bytes>) -> Result<Self, CommandError> {
        if arguments.len() != 1 {
            return Err(CommandError::WrongArity("keys"));
        }

        Ok(KeysArguments {
            pattern: utf8_argument(&arguments[0])?.to_string(),
        })
    }
}

/// KEYS matches the glob pattern against every live key. Expired entries
/// encountered during the scan are dropped like on any other read.
pub fn keys(arguments: &KeysArguments, store: &mut Store) -> Result<RespValue, CommandError> {
    let matcher = Glob::new(&arguments.pattern)
        .map_err(|_| CommandError::InvalidPattern)?
        .compile_matcher();

    let mut matched = Vec::new();
    for key in store.live_keys() {
        if matcher.is_match(String::from_utf8_lossy(&key).as_ref()) {
            matched.push(RespValue::BulkString(key));
        }
    }

    Ok(RespValue::Array(matched))
}
