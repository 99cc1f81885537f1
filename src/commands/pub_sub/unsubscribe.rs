use bytes::Bytes;

use crate::client::SessionMode;
use crate::commands::CommandError;
use crate::executor::ExecutionContext;
use crate::resp::RespValue;

#[derive(Debug, Clone, PartialEq)]
pub struct UnsubscribeArguments {
    pub channel: Bytes,
}

impl UnsubscribeArguments {
    pub fn parse(arguments: Vec<Bytes>) -> Result<Self, CommandError> {
        if arguments.len() != 1 {
            return Err(CommandError::WrongArity("unsubscribe"));
        }

        Ok(UnsubscribeArguments {
            channel: arguments[0].clone(),
        })
    }
}

/// Handles the UNSUBSCRIBE command.
///
/// Dropping the last subscription returns the connection to standard mode.
/// Unsubscribing from a channel that was never subscribed leaves the count
/// unchanged.
pub fn unsubscribe(arguments: &UnsubscribeArguments, ctx: &mut ExecutionContext) -> RespValue {
    let client = ctx.client_id;
    let record = ctx
        .clients
        .get_mut(&client)
        .expect("executor only dispatches for registered clients");

    if record.subscriptions.remove(&arguments.channel) {
        ctx.pubsub.unsubscribe(&arguments.channel, client);
    }

    let count = record.subscription_count();
    if count == 0 && record.mode == SessionMode::Subscribed {
        record.mode = SessionMode::Standard;
    }

    RespValue::Array(vec![
        RespValue::bulk("unsubscribe"),
        RespValue::BulkString(arguments.channel.clone()),
        RespValue::Integer(count as i64),
    ])
}
