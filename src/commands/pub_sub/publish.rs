use bytes::Bytes;

use crate::client::ClientId;
use crate::commands::CommandError;
use crate::executor::ExecutionContext;
use crate::resp::RespValue;

#[derive(Debug, Clone, PartialEq)]
pub struct PublishArguments {
    pub channel: Bytes,
    pub payload: Bytes,
}

impl PublishArguments {
    pub fn parse(arguments: Vec<Bytes>) -> Result<Self, CommandError> {
        if arguments.len() != 2 {
            return Err(CommandError::WrongArity("publish"));
        }

        Ok(PublishArguments {
            channel: arguments[0].clone(),
            payload: arguments[1].clone(),
        })
    }
}

/// Handles the PUBLISH command: pushes `["message", channel, payload]` to
/// every subscriber's outbound queue and replies with the receiver count.
pub fn publish(arguments: &PublishArguments, ctx: &mut ExecutionContext) -> RespValue {
    let subscribers: Vec<ClientId> = ctx.pubsub.subscribers(&arguments.channel).collect();

    let message = RespValue::Array(vec![
        RespValue::bulk("message"),
        RespValue::BulkString(arguments.channel.clone()),
        RespValue::BulkString(arguments.payload.clone()),
    ]);

    for subscriber in &subscribers {
        if let Some(record) = ctx.clients.get(subscriber) {
            record.send(message.clone());
        }
    }

    RespValue::Integer(subscribers.len() as i64)
}
