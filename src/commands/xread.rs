use std::time::Duration;

use bytes::Bytes;
use tokio::time::Instant;

use crate::blocked::BlockedCommand;
use crate::commands::stream_utils::entries_to_resp;
use crate::commands::{CommandError, utf8_argument};
use crate::executor::{ExecResult, ExecutionContext};
use crate::resp::RespValue;
use crate::store::DataType;
use crate::stream::{StreamEntry, StreamId, StreamIdError};

/// Where a tail read starts for one key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum XreadStart {
    /// `$`: the stream's current maximum ID, so only future entries match.
    Latest,
    From(StreamId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct XreadArguments {
    pub block_ms: Option<u64>,
    pub keys: Vec<Bytes>,
    pub starts: Vec<XreadStart>,
}

impl XreadArguments {
    /// Parses `XREAD [BLOCK ms] STREAMS key… id…`. The keys/IDs tail is
    /// split exactly in half; an odd tail is unbalanced.
    pub fn parse(arguments: Vec<Bytes>) -> Result<Self, CommandError> {
        let mut index = 0;
        let mut block_ms = None;

        if arguments
            .first()
            .is_some_and(|argument| argument.eq_ignore_ascii_case(b"BLOCK"))
        {
            let Some(milliseconds) = arguments.get(1) else {
                return Err(CommandError::InvalidBlockDuration);
            };
            block_ms = Some(
                utf8_argument(milliseconds)?
                    .parse::<u64>()
                    .map_err(|_| CommandError::InvalidBlockDuration)?,
            );
            index = 2;
        }

        if !arguments
            .get(index)
            .is_some_and(|argument| argument.eq_ignore_ascii_case(b"STREAMS"))
        {
            return Err(CommandError::WrongArity("xread"));
        }

        let tail = &arguments[index + 1..];
        if tail.is_empty() || tail.len() % 2 != 0 {
            return Err(CommandError::UnbalancedStreams);
        }

        let half = tail.len() / 2;
        let keys = tail[..half].to_vec();
        let starts = tail[half..]
            .iter()
            .map(|argument| parse_start(utf8_argument(argument)?))
            .collect::<Result<Vec<XreadStart>, CommandError>>()?;

        Ok(XreadArguments {
            block_ms,
            keys,
            starts,
        })
    }
}

fn parse_start(text: &str) -> Result<XreadStart, CommandError> {
    if text == "$" {
        return Ok(XreadStart::Latest);
    }

    if text.contains('-') {
        return Ok(XreadStart::From(StreamId::parse(text)?));
    }

    let ms = text
        .parse::<u64>()
        .map_err(|_| CommandError::StreamId(StreamIdError::Malformed))?;
    Ok(XreadStart::From(StreamId::new(ms, 0)))
}

/// Handles the XREAD command.
///
/// Every key is read exclusive-start: only entries strictly newer than the
/// resolved start match. If anything matched, or no BLOCK was given, the
/// reply is immediate (empty keys omitted, a fully empty result is a null
/// array). Otherwise the client blocks on all requested keys until an XADD
/// wakes it or the timeout delivers a null array.
pub fn xread(
    arguments: &XreadArguments,
    ctx: &mut ExecutionContext,
) -> Result<ExecResult, CommandError> {
    let starts = resolve_starts(arguments, ctx)?;

    let mut per_key: Vec<(Bytes, Vec<StreamEntry>)> = Vec::new();
    for (key, start) in &starts {
        let entries = read_after(ctx, key, *start)?;
        if !entries.is_empty() {
            per_key.push((key.clone(), entries));
        }
    }

    if !per_key.is_empty() {
        let reply = per_key
            .iter()
            .map(|(key, entries)| {
                RespValue::Array(vec![
                    RespValue::BulkString(key.clone()),
                    entries_to_resp(entries),
                ])
            })
            .collect();
        return Ok(ExecResult::Reply(RespValue::Array(reply)));
    }

    let Some(block_ms) = arguments.block_ms else {
        return Ok(ExecResult::Reply(RespValue::NullArray));
    };
    if ctx.in_exec {
        return Ok(ExecResult::Reply(RespValue::NullArray));
    }

    let deadline = (block_ms > 0).then(|| Instant::now() + Duration::from_millis(block_ms));
    ctx.blocked.block(
        ctx.client_id,
        starts.iter().map(|(key, _)| key.clone()),
        BlockedCommand::XRead {
            starts: starts.clone(),
        },
        deadline,
    );

    Ok(ExecResult::NoResponse)
}

/// Resolves `$` to each stream's current maximum (`0-0` for an absent
/// stream) and verifies every present key holds a stream.
fn resolve_starts(
    arguments: &XreadArguments,
    ctx: &mut ExecutionContext,
) -> Result<Vec<(Bytes, StreamId)>, CommandError> {
    let mut starts = Vec::with_capacity(arguments.keys.len());

    for (key, start) in arguments.keys.iter().zip(&arguments.starts) {
        let stream_max = match ctx.store.get(key) {
            None => None,
            Some(entry) => match &entry.data {
                DataType::Stream(stream) => stream.max_id(),
                _ => return Err(CommandError::WrongType),
            },
        };

        let id = match start {
            XreadStart::Latest => stream_max.unwrap_or(StreamId::ZERO),
            XreadStart::From(id) => *id,
        };
        starts.push((key.clone(), id));
    }

    Ok(starts)
}

fn read_after(
    ctx: &mut ExecutionContext,
    key: &Bytes,
    start: StreamId,
) -> Result<Vec<StreamEntry>, CommandError> {
    match ctx.store.get(key) {
        None => Ok(vec![]),
        Some(entry) => match &entry.data {
            DataType::Stream(stream) => Ok(stream.range(start, StreamId::MAX, true).collect()),
            _ => Err(CommandError::WrongType),
        },
    }
}
