use std::time::Duration;

use bytes::Bytes;

use crate::commands::{CommandError, utf8_argument};
use crate::resp::RespValue;
use crate::store::{DataType, Store};

#[derive(Debug, Clone, PartialEq)]
pub struct SetArguments {
    pub key: Bytes,
    pub value: Bytes,
    pub expiry: Option<Duration>,
}

impl SetArguments {
    /// Parses `SET key value [PX milliseconds]`. Options are consumed in
    /// pairs starting right after the value; a dangling or unknown token is
    /// a syntax error.
    pub fn parse(arguments: Vec<Bytes>) -> Result<Self, CommandError> {
        if arguments.len() < 2 {
            return Err(CommandError::WrongArity("set"));
        }

        let mut expiry = None;
        let mut options = arguments[2..].iter();

        while let Some(option) = options.next() {
            if !utf8_argument(option)?.eq_ignore_ascii_case("px") {
                return Err(CommandError::Syntax);
            }

            let Some(milliseconds) = options.next() else {
                return Err(CommandError::Syntax);
            };
            let milliseconds = utf8_argument(milliseconds)?
                .parse::<u64>()
                .map_err(|_| CommandError::InvalidExpireTime)?;
            if milliseconds == 0 {
                return Err(CommandError::InvalidExpireTime);
            }

            expiry = Some(Duration::from_millis(milliseconds));
        }

        Ok(SetArguments {
            key: arguments[0].clone(),
            value: arguments[1].clone(),
            expiry,
        })
    }
}

/// SET overwrites unconditionally, whatever kind the key held before.
pub fn set(arguments: &SetArguments, store: &mut Store) -> Result<RespValue, CommandError> {
    store.set(
        arguments.key.clone(),
        DataType::String(arguments.value.clone()),
        arguments.expiry,
    );

    Ok(RespValue::SimpleString("OK".to_string()))
}
