use std::collections::VecDeque;

use bytes::Bytes;

use crate::commands::CommandError;
use crate::executor::ExecutionContext;
use crate::resp::RespValue;
use crate::store::{DataType, Store};

/// Shared arguments for RPUSH and LPUSH: a key plus one or more elements.
#[derive(Debug, Clone, PartialEq)]
pub struct PushArguments {
    pub key: Bytes,
    pub elements: Vec<Bytes>,
}

impl PushArguments {
    pub fn parse(arguments: Vec<Bytes>, command: &'static str) -> Result<Self, CommandError> {
        if arguments.len() < 2 {
            return Err(CommandError::WrongArity(command));
        }

        Ok(PushArguments {
            key: arguments[0].clone(),
            elements: arguments[1..].to_vec(),
        })
    }
}

/// Handles RPUSH and LPUSH (`prepend`).
///
/// Creates the list if the key is absent, appends or prepends the elements
/// in argument order, then hands elements to blocked poppers: while the
/// list is non-empty and a waiter is registered for the key, the head
/// element is popped and delivered as `[key, element]`, waiters in
/// registration order, one element each. The reply is the list length
/// right after the push.
pub fn push(
    arguments: &PushArguments,
    prepend: bool,
    ctx: &mut ExecutionContext,
) -> Result<RespValue, CommandError> {
    let entry = ctx
        .store
        .get_or_insert_with(arguments.key.clone(), || DataType::List(VecDeque::new()));
    let DataType::List(list) = &mut entry.data else {
        return Err(CommandError::WrongType);
    };

    for element in &arguments.elements {
        if prepend {
            list.push_front(element.clone());
        } else {
            list.push_back(element.clone());
        }
    }
    let length = list.len();

    wake_waiters(ctx, &arguments.key);

    Ok(RespValue::Integer(length as i64))
}

fn wake_waiters(ctx: &mut ExecutionContext, key: &Bytes) {
    while list_has_elements(ctx.store, key) {
        let Some((client, _command)) = ctx.blocked.next_client_for_key(key) else {
            break;
        };
        let Some(element) = pop_front(ctx.store, key) else {
            break;
        };

        let reply = RespValue::Array(vec![
            RespValue::BulkString(key.clone()),
            RespValue::BulkString(element),
        ]);
        if let Some(record) = ctx.clients.get(&client) {
            record.send(reply);
        }
    }
}

fn list_has_elements(store: &mut Store, key: &[u8]) -> bool {
    matches!(
        store.get(key),
        Some(entry) if matches!(&entry.data, DataType::List(list) if !list.is_empty())
    )
}

fn pop_front(store: &mut Store, key: &[u8]) -> Option<Bytes> {
    match &mut store.get_mut(key)?.data {
        DataType::List(list) => list.pop_front(),
        _ => None,
    }
}
