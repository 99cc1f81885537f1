use bytes::Bytes;

use crate::blocked::BlockedCommand;
use crate::commands::stream_utils::entries_to_resp;
use crate::commands::{CommandError, utf8_argument};
use crate::executor::ExecutionContext;
use crate::resp::RespValue;
use crate::store::DataType;
use crate::stream::{StreamEntry, StreamId, StreamIdError, StreamIndex};

/// How the caller specified the new entry's ID.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IdSpec {
    /// `*`: wall-clock milliseconds, sequence auto-generated.
    Auto,
    /// `<ms>-*`: fixed milliseconds, sequence auto-generated.
    AutoSequence { ms: u64 },
    /// `<ms>-<seq>`: used verbatim.
    Explicit(StreamId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct XaddArguments {
    pub key: Bytes,
    pub id: IdSpec,
    pub fields: Vec<(Bytes, Bytes)>,
}

impl XaddArguments {
    /// Parses `XADD key id field value [field value …]`: at least one pair,
    /// and pairs must balance.
    pub fn parse(arguments: Vec<Bytes>) -> Result<Self, CommandError> {
        if arguments.len() < 4 || (arguments.len() - 2) % 2 != 0 {
            return Err(CommandError::WrongArity("xadd"));
        }

        let id = parse_id_spec(utf8_argument(&arguments[1])?)?;
        let fields = arguments[2..]
            .chunks(2)
            .map(|pair| (pair[0].clone(), pair[1].clone()))
            .collect();

        Ok(XaddArguments {
            key: arguments[0].clone(),
            id,
            fields,
        })
    }
}

fn parse_id_spec(text: &str) -> Result<IdSpec, CommandError> {
    if text == "*" {
        return Ok(IdSpec::Auto);
    }

    let Some((ms_part, seq_part)) = text.split_once('-') else {
        return Err(CommandError::StreamId(StreamIdError::Malformed));
    };
    let ms = ms_part
        .parse::<u64>()
        .map_err(|_| CommandError::StreamId(StreamIdError::Malformed))?;

    if seq_part == "*" {
        return Ok(IdSpec::AutoSequence { ms });
    }

    let seq = seq_part
        .parse::<u64>()
        .map_err(|_| CommandError::StreamId(StreamIdError::Malformed))?;
    Ok(IdSpec::Explicit(StreamId::new(ms, seq)))
}

/// Handles the XADD command.
///
/// Resolves the entry ID, appends to the stream (creating it on first
/// write), and if the longest-waiting blocked client on this key is a tail
/// reader, wakes it with everything past its start. Replies with the
/// resolved ID as a bulk string.
pub fn xadd(arguments: &XaddArguments, ctx: &mut ExecutionContext) -> Result<RespValue, CommandError> {
    let id = resolve_id(ctx, arguments)?;

    let entry = ctx
        .store
        .get_or_insert_with(arguments.key.clone(), || DataType::Stream(StreamIndex::new()));
    let DataType::Stream(stream) = &mut entry.data else {
        return Err(CommandError::WrongType);
    };
    stream.insert(id, arguments.fields.clone())?;

    notify_tail_reader(ctx, &arguments.key);

    Ok(RespValue::bulk(id.to_string()))
}

/// Resolves the ID spec against the current stream without mutating the
/// store, so a rejected ID cannot leave an empty stream behind.
fn resolve_id(ctx: &mut ExecutionContext, arguments: &XaddArguments) -> Result<StreamId, CommandError> {
    let stream = match ctx.store.get(&arguments.key) {
        None => None,
        Some(entry) => match &entry.data {
            DataType::Stream(stream) => Some(stream),
            _ => return Err(CommandError::WrongType),
        },
    };

    let id = match arguments.id {
        IdSpec::Auto => {
            let ms = wall_clock_ms();
            let seq = match stream {
                Some(stream) => stream.next_sequence_for(ms)?,
                None => fresh_sequence(ms),
            };
            StreamId::new(ms, seq)
        }
        IdSpec::AutoSequence { ms } => {
            let seq = match stream {
                Some(stream) => stream.next_sequence_for(ms)?,
                None => fresh_sequence(ms),
            };
            StreamId::new(ms, seq)
        }
        IdSpec::Explicit(id) => {
            if id == StreamId::ZERO {
                return Err(CommandError::StreamId(StreamIdError::IdIsZero));
            }
            if let Some(stream) = stream {
                if id <= stream.last_id() {
                    return Err(CommandError::StreamId(StreamIdError::NotGreaterThanLast));
                }
            }
            id
        }
    };

    Ok(id)
}

fn fresh_sequence(ms: u64) -> u64 {
    if ms == 0 { 1 } else { 0 }
}

fn wall_clock_ms() -> u64 {
    jiff::Timestamp::now().as_millisecond().max(0) as u64
}

/// If the head waiter on `key` is a blocked XREAD, pop it and deliver the
/// entries past its recorded start for this key.
fn notify_tail_reader(ctx: &mut ExecutionContext, key: &Bytes) {
    let Some(head) = ctx.blocked.head_for_key(key) else {
        return;
    };
    if !matches!(
        ctx.blocked.blocked_command(head),
        Some(BlockedCommand::XRead { .. })
    ) {
        return;
    }

    let Some((client, BlockedCommand::XRead { starts })) = ctx.blocked.next_client_for_key(key)
    else {
        return;
    };

    let start = starts
        .iter()
        .find(|(start_key, _)| start_key == key)
        .map(|(_, start)| *start)
        .unwrap_or(StreamId::ZERO);

    let entries: Vec<StreamEntry> = match ctx.store.get(key) {
        Some(entry) => match &entry.data {
            DataType::Stream(stream) => stream.range(start, StreamId::MAX, true).collect(),
            _ => return,
        },
        None => return,
    };
    if entries.is_empty() {
        return;
    }

    let reply = RespValue::Array(vec![RespValue::Array(vec![
        RespValue::BulkString(key.clone()),
        entries_to_resp(&entries),
    ])]);
    if let Some(record) = ctx.clients.get(&client) {
        record.send(reply);
    }
}
