use bytes::Bytes;

use crate::commands::CommandError;
use crate::resp::RespValue;
use crate::store::Store;

#[derive(Debug, Clone, PartialEq)]
pub struct TypeArguments {
    pub key: Bytes,
}

impl TypeArguments {
    pub fn parse(arguments: Vec<Bytes>) -> Result<Self, CommandError> {
        if arguments.len() != 1 {
            return Err(CommandError::WrongArity("type"));
        }

        Ok(TypeArguments {
            key: arguments[0].clone(),
        })
    }
}

pub fn type_command(arguments: &TypeArguments, store: &mut Store) -> RespValue {
    let kind = store
        .get(&arguments.key)
        .map_or("none", |entry| entry.data.kind_name());

    RespValue::SimpleString(kind.to_string())
}
