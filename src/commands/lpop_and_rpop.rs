use bytes::Bytes;

use crate::commands::{CommandError, integer_argument};
use crate::resp::RespValue;
use crate::store::{DataType, Store};

/// Shared arguments for LPOP and RPOP: a key plus an optional element
/// count.
#[derive(Debug, Clone, PartialEq)]
pub struct PopArguments {
    pub key: Bytes,
    pub count: Option<i64>,
}

impl PopArguments {
    pub fn parse(arguments: Vec<Bytes>, command: &'static str) -> Result<Self, CommandError> {
        if arguments.is_empty() || arguments.len() > 2 {
            return Err(CommandError::WrongArity(command));
        }

        let count = match arguments.get(1) {
            None => None,
            Some(argument) => Some(integer_argument(argument)?),
        };

        Ok(PopArguments {
            key: arguments[0].clone(),
            count,
        })
    }
}

/// Handles LPOP (`from_front`) and RPOP.
///
/// Without a count, or with `count == 1`, the reply is the single popped
/// element (null for an empty or absent list). With a larger count the
/// reply is an array; a count that is non-positive or exceeds the list
/// length is a null reply and pops nothing.
pub fn pop(
    arguments: &PopArguments,
    from_front: bool,
    store: &mut Store,
) -> Result<RespValue, CommandError> {
    let Some(entry) = store.get_mut(&arguments.key) else {
        return Ok(RespValue::Null);
    };
    let DataType::List(list) = &mut entry.data else {
        return Err(CommandError::WrongType);
    };

    match arguments.count {
        None => Ok(pop_one(list, from_front).map_or(RespValue::Null, RespValue::BulkString)),
        Some(count) => {
            if count <= 0 || count as usize > list.len() {
                return Ok(RespValue::Null);
            }
            if count == 1 {
                return Ok(pop_one(list, from_front).map_or(RespValue::Null, RespValue::BulkString));
            }

            let mut popped = Vec::with_capacity(count as usize);
            for _ in 0..count {
                let element =
                    pop_one(list, from_front).expect("count was checked against the list length");
                popped.push(RespValue::BulkString(element));
            }
            Ok(RespValue::Array(popped))
        }
    }
}

fn pop_one(list: &mut std::collections::VecDeque<Bytes>, from_front: bool) -> Option<Bytes> {
    if from_front {
        list.pop_front()
    } else {
        list.pop_back()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;

    fn store_with_list(elements: &[&str]) -> Store {
        let mut store = Store::new();
        let list: VecDeque<Bytes> = elements
            .iter()
            .map(|element| Bytes::copy_from_slice(element.as_bytes()))
            .collect();
        store.set(Bytes::from("l"), DataType::List(list), None);
        store
    }

    fn args(count: Option<i64>) -> PopArguments {
        PopArguments {
            key: Bytes::from("l"),
            count,
        }
    }

    #[test]
    fn test_parse() {
        assert_eq!(
            PopArguments::parse(vec![], "lpop"),
            Err(CommandError::WrongArity("lpop"))
        );
        assert_eq!(
            PopArguments::parse(vec![Bytes::from("l"), Bytes::from("x")], "rpop"),
            Err(CommandError::NotAnInteger)
        );
        assert_eq!(
            PopArguments::parse(vec![Bytes::from("l"), Bytes::from("3")], "lpop"),
            Ok(args(Some(3)))
        );
    }

    #[test]
    fn test_single_pop_both_ends() {
        let mut store = store_with_list(&["a", "b", "c"]);

        assert_eq!(
            pop(&args(None), true, &mut store),
            Ok(RespValue::bulk("a"))
        );
        assert_eq!(
            pop(&args(None), false, &mut store),
            Ok(RespValue::bulk("c"))
        );
        assert_eq!(
            pop(&args(None), true, &mut store),
            Ok(RespValue::bulk("b"))
        );
        assert_eq!(pop(&args(None), true, &mut store), Ok(RespValue::Null));
    }

    #[test]
    fn test_pop_with_count() {
        let mut store = store_with_list(&["a", "b", "c", "d"]);

        assert_eq!(
            pop(&args(Some(2)), true, &mut store),
            Ok(RespValue::array_of_bulks(["a", "b"]))
        );
        // count == 1 replies with a bare element, not a one-element array.
        assert_eq!(
            pop(&args(Some(1)), false, &mut store),
            Ok(RespValue::bulk("d"))
        );
    }

    #[test]
    fn test_pop_count_out_of_range_is_null() {
        let mut store = store_with_list(&["a", "b"]);

        assert_eq!(pop(&args(Some(0)), true, &mut store), Ok(RespValue::Null));
        assert_eq!(pop(&args(Some(-3)), true, &mut store), Ok(RespValue::Null));
        assert_eq!(pop(&args(Some(5)), true, &mut store), Ok(RespValue::Null));

        // Nothing was popped along the way.
        assert_eq!(
            pop(&args(Some(2)), true, &mut store),
            Ok(RespValue::array_of_bulks(["a", "b"]))
        );
    }

    #[test]
    fn test_pop_missing_key_and_wrong_type() {
        let mut store = Store::new();
        assert_eq!(pop(&args(None), true, &mut store), Ok(RespValue::Null));

        store.set(Bytes::from("l"), DataType::Integer(1), None);
        assert_eq!(
            pop(&args(None), true, &mut store),
            Err(CommandError::WrongType)
        );
    }
}
