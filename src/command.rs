//! Typed commands and the RESP-frame → command parser.

use bytes::Bytes;

use crate::commands::{
    BlpopArguments, CommandError, EchoArguments, GetArguments, IncrArguments, KeysArguments,
    LlenArguments, LrangeArguments, PingArguments, PopArguments, PushArguments, SetArguments,
    TypeArguments, XaddArguments, XrangeArguments, XreadArguments,
    pub_sub::{PublishArguments, SubscribeArguments, UnsubscribeArguments},
};
use crate::resp::RespValue;

/// A fully parsed command, one variant per wire command. Variants carry
/// their argument structs so execution never re-parses anything.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Ping(PingArguments),
    Echo(EchoArguments),
    Get(GetArguments),
    Set(SetArguments),
    Incr(IncrArguments),
    Type(TypeArguments),
    Keys(KeysArguments),
    RPush(PushArguments),
    LPush(PushArguments),
    LPop(PopArguments),
    RPop(PopArguments),
    BlPop(BlpopArguments),
    LLen(LlenArguments),
    LRange(LrangeArguments),
    XAdd(XaddArguments),
    XRange(XrangeArguments),
    XRead(XreadArguments),
    Multi,
    Exec,
    Discard,
    Subscribe(SubscribeArguments),
    Unsubscribe(UnsubscribeArguments),
    Publish(PublishArguments),
}

impl Command {
    /// Parses one request frame: an array whose head is the bulk-string
    /// command name (case-insensitive) and whose tail is bulk-string
    /// arguments.
    pub fn parse(frame: &RespValue) -> Result<Self, CommandError> {
        let RespValue::Array(elements) = frame else {
            return Err(CommandError::InvalidFrame);
        };
        let Some(RespValue::BulkString(name)) = elements.first() else {
            return Err(CommandError::InvalidFrame);
        };
        let name = std::str::from_utf8(name)
            .map_err(|_| CommandError::InvalidFrame)?
            .to_ascii_uppercase();

        let mut arguments: Vec<Bytes> = Vec::with_capacity(elements.len().saturating_sub(1));
        for element in &elements[1..] {
            let RespValue::BulkString(argument) = element else {
                return Err(CommandError::InvalidFrame);
            };
            arguments.push(argument.clone());
        }

        match name.as_str() {
            "PING" => Ok(Command::Ping(PingArguments::parse(arguments)?)),
            "ECHO" => Ok(Command::Echo(EchoArguments::parse(arguments)?)),
            "GET" => Ok(Command::Get(GetArguments::parse(arguments)?)),
            "SET" => Ok(Command::Set(SetArguments::parse(arguments)?)),
            "INCR" => Ok(Command::Incr(IncrArguments::parse(arguments)?)),
            "TYPE" => Ok(Command::Type(TypeArguments::parse(arguments)?)),
            "KEYS" => Ok(Command::Keys(KeysArguments::parse(arguments)?)),
            "RPUSH" => Ok(Command::RPush(PushArguments::parse(arguments, "rpush")?)),
            "LPUSH" => Ok(Command::LPush(PushArguments::parse(arguments, "lpush")?)),
            "LPOP" => Ok(Command::LPop(PopArguments::parse(arguments, "lpop")?)),
            "RPOP" => Ok(Command::RPop(PopArguments::parse(arguments, "rpop")?)),
            "BLPOP" => Ok(Command::BlPop(BlpopArguments::parse(arguments)?)),
            "LLEN" => Ok(Command::LLen(LlenArguments::parse(arguments)?)),
            "LRANGE" => Ok(Command::LRange(LrangeArguments::parse(arguments)?)),
            "XADD" => Ok(Command::XAdd(XaddArguments::parse(arguments)?)),
            "XRANGE" => Ok(Command::XRange(XrangeArguments::parse(arguments)?)),
            "XREAD" => Ok(Command::XRead(XreadArguments::parse(arguments)?)),
            "MULTI" => parse_bare(arguments, "multi", Command::Multi),
            "EXEC" => parse_bare(arguments, "exec", Command::Exec),
            "DISCARD" => parse_bare(arguments, "discard", Command::Discard),
            "SUBSCRIBE" => Ok(Command::Subscribe(SubscribeArguments::parse(arguments)?)),
            "UNSUBSCRIBE" => Ok(Command::Unsubscribe(UnsubscribeArguments::parse(
                arguments,
            )?)),
            "PUBLISH" => Ok(Command::Publish(PublishArguments::parse(arguments)?)),
            _ => Err(CommandError::UnknownCommand(name.to_ascii_lowercase())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Ping(_) => "ping",
            Command::Echo(_) => "echo",
            Command::Get(_) => "get",
            Command::Set(_) => "set",
            Command::Incr(_) => "incr",
            Command::Type(_) => "type",
            Command::Keys(_) => "keys",
            Command::RPush(_) => "rpush",
            Command::LPush(_) => "lpush",
            Command::LPop(_) => "lpop",
            Command::RPop(_) => "rpop",
            Command::BlPop(_) => "blpop",
            Command::LLen(_) => "llen",
            Command::LRange(_) => "lrange",
            Command::XAdd(_) => "xadd",
            Command::XRange(_) => "xrange",
            Command::XRead(_) => "xread",
            Command::Multi => "multi",
            Command::Exec => "exec",
            Command::Discard => "discard",
            Command::Subscribe(_) => "subscribe",
            Command::Unsubscribe(_) => "unsubscribe",
            Command::Publish(_) => "publish",
        }
    }

    /// MULTI/EXEC/DISCARD steer the transaction state machine and are never
    /// queued themselves.
    pub fn is_transaction_control(&self) -> bool {
        matches!(self, Command::Multi | Command::Exec | Command::Discard)
    }

    /// The subscribed-mode allow-list.
    pub fn allowed_while_subscribed(&self) -> bool {
        matches!(
            self,
            Command::Ping(_) | Command::Subscribe(_) | Command::Unsubscribe(_)
        )
    }
}

fn parse_bare(
    arguments: Vec<Bytes>,
    name: &'static str,
    command: Command,
) -> Result<Command, CommandError> {
    if !arguments.is_empty() {
        return Err(CommandError::WrongArity(name));
    }
    Ok(command)
}
