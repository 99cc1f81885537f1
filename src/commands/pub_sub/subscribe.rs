use bytes::Bytes;

use crate::client::SessionMode;
use crate::commands::CommandError;
use crate::executor::ExecutionContext;
use crate::resp::RespValue;

#[derive(Debug, Clone, PartialEq)]
pub struct SubscribeArguments {
    pub channel: Bytes,
}

impl SubscribeArguments {
    pub fn parse(arguments: Vec<Bytes>) -> Result<Self, CommandError> {
        if arguments.len() != 1 {
            return Err(CommandError::WrongArity("subscribe"));
        }

        Ok(SubscribeArguments {
            channel: arguments[0].clone(),
        })
    }
}

/// Handles the SUBSCRIBE command.
///
/// Records the membership, moves the connection into subscribed mode, and
/// replies `["subscribe", channel, <count>]` where the count only grows
/// when the channel is new for this connection.
pub fn subscribe(arguments: &SubscribeArguments, ctx: &mut ExecutionContext) -> RespValue {
    let client = ctx.client_id;
    let record = ctx
        .clients
        .get_mut(&client)
        .expect("executor only dispatches for registered clients");

    if record.subscriptions.insert(arguments.channel.clone()) {
        ctx.pubsub.subscribe(arguments.channel.clone(), client);
    }
    record.mode = SessionMode::Subscribed;

    RespValue::Array(vec![
        RespValue::bulk("subscribe"),
        RespValue::BulkString(arguments.channel.clone()),
        RespValue::Integer(record.subscription_count() as i64),
    ])
}
