use crate::commands::CommandError;
use crate::resp::RespValue;
use crate::stream::{StreamEntry, StreamId, StreamIdError};

/// Parses an XRANGE bound.
///
/// `-` and `+` are the smallest and largest IDs. A bare timestamp expands
/// to `(ts, 0)` as a start bound and `(ts, u64::MAX)` as an end bound, so a
/// millisecond names its whole sequence range.
pub(crate) fn parse_range_bound(text: &str, is_end: bool) -> Result<StreamId, CommandError> {
    match text {
        "-" => Ok(StreamId::ZERO),
        "+" => Ok(StreamId::MAX),
        _ => {
            if text.contains('-') {
                return Ok(StreamId::parse(text)?);
            }

            let ms = text
                .parse::<u64>()
                .map_err(|_| CommandError::StreamId(StreamIdError::Malformed))?;
            let seq = if is_end { u64::MAX } else { 0 };
            Ok(StreamId::new(ms, seq))
        }
    }
}

/// Shapes stream entries the way every stream read replies: an array of
/// `[id, [field, value, field, value, …]]` pairs.
pub(crate) fn entries_to_resp(entries: &[StreamEntry]) -> RespValue {
    let shaped = entries
        .iter()
        .map(|entry| {
            let mut flat = Vec::with_capacity(entry.fields.len() * 2);
            for (name, value) in &entry.fields {
                flat.push(RespValue::BulkString(name.clone()));
                flat.push(RespValue::BulkString(value.clone()));
            }

            RespValue::Array(vec![
                RespValue::bulk(entry.id.to_string()),
                RespValue::Array(flat),
            ])
        })
        .collect();

    RespValue::Array(shaped)
}
