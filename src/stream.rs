//! Append-only stream index.
//!
//! A stream is an ordered log of `(StreamId, fields)` entries. IDs are
//! 128-bit `(milliseconds, sequence)` pairs ordered lexicographically; the
//! index keeps a `last_id` high-water mark so inserts are strictly
//! monotonic. Range reads are inclusive on both bounds unless the caller
//! asks for an exclusive start (the XREAD tail-read case).

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Bound;

use bytes::Bytes;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum StreamIdError {
    #[error("The ID specified in XADD must be greater than 0-0")]
    IdIsZero,
    #[error("The ID specified in XADD is equal or smaller than the target stream top item")]
    NotGreaterThanLast,
    #[error("Invalid stream ID specified as stream command argument")]
    Malformed,
}

/// A stream entry ID: millisecond timestamp plus a per-millisecond
/// sequence number. Total order is `(ms, seq)` lexicographic, which matches
/// the order of the 16-byte big-endian encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StreamId {
    pub ms: u64,
    pub seq: u64,
}

impl StreamId {
    /// The reserved smallest ID; XADD rejects it.
    pub const ZERO: StreamId = StreamId { ms: 0, seq: 0 };
    pub const MAX: StreamId = StreamId {
        ms: u64::MAX,
        seq: u64::MAX,
    };

    pub fn new(ms: u64, seq: u64) -> Self {
        StreamId { ms, seq }
    }

    /// The big-endian byte encoding; keys compare identically in either
    /// representation.
    pub fn to_bytes(self) -> [u8; 16] {
        let mut bytes = [0u8; 16];
        bytes[..8].copy_from_slice(&self.ms.to_be_bytes());
        bytes[8..].copy_from_slice(&self.seq.to_be_bytes());
        bytes
    }

    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        let ms = u64::from_be_bytes(bytes[..8].try_into().expect("slice is 8 bytes"));
        let seq = u64::from_be_bytes(bytes[8..].try_into().expect("slice is 8 bytes"));
        StreamId { ms, seq }
    }

    /// Parses the strict `<ms>-<seq>` form.
    pub fn parse(text: &str) -> Result<Self, StreamIdError> {
        let (ms_part, seq_part) = text.split_once('-').ok_or(StreamIdError::Malformed)?;
        let ms = ms_part.parse::<u64>().map_err(|_| StreamIdError::Malformed)?;
        let seq = seq_part
            .parse::<u64>()
            .map_err(|_| StreamIdError::Malformed)?;
        Ok(StreamId { ms, seq })
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.ms, self.seq)
    }
}

/// One stream record: its ID plus field/value pairs in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamEntry {
    pub id: StreamId,
    pub fields: Vec<(Bytes, Bytes)>,
}

/// Ordered index of stream entries with a monotonicity guard.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamIndex {
    entries: BTreeMap<StreamId, Vec<(Bytes, Bytes)>>,
    last_id: StreamId,
}

impl StreamIndex {
    pub fn new() -> Self {
        StreamIndex::default()
    }

    /// Appends an entry. The ID must be strictly greater than every ID ever
    /// inserted (including since-trimmed ones) and must not be `0-0`.
    pub fn insert(
        &mut self,
        id: StreamId,
        fields: Vec<(Bytes, Bytes)>,
    ) -> Result<(), StreamIdError> {
        if id == StreamId::ZERO {
            return Err(StreamIdError::IdIsZero);
        }
        if id <= self.last_id {
            return Err(StreamIdError::NotGreaterThanLast);
        }

        self.entries.insert(id, fields);
        self.last_id = id;
        Ok(())
    }

    pub fn lookup(&self, id: StreamId) -> Option<&Vec<(Bytes, Bytes)>> {
        self.entries.get(&id)
    }

    pub fn remove(&mut self, id: StreamId) -> Option<Vec<(Bytes, Bytes)>> {
        self.entries.remove(&id)
    }

    /// Entries with `start <= id <= end`, ascending. With `start_exclusive`
    /// the walk begins at the smallest ID strictly greater than `start`, so
    /// the boundary entry is never materialized.
    pub fn range(
        &self,
        start: StreamId,
        end: StreamId,
        start_exclusive: bool,
    ) -> impl Iterator<Item = StreamEntry> + '_ {
        let lower = if start_exclusive {
            Bound::Excluded(start)
        } else {
            Bound::Included(start)
        };

        self.entries
            .range((lower, Bound::Included(end)))
            .map(|(id, fields)| StreamEntry {
                id: *id,
                fields: fields.clone(),
            })
    }

    /// Drops every entry with an ID strictly below `id`; returns how many
    /// were removed. `last_id` is untouched, so trimming never re-opens ID
    /// space.
    pub fn trim_before(&mut self, id: StreamId) -> usize {
        let keep = self.entries.split_off(&id);
        let removed = self.entries.len();
        self.entries = keep;
        removed
    }

    /// Drops oldest entries until at most `max_len` remain; returns how
    /// many were removed.
    pub fn trim_to_max_len(&mut self, max_len: usize) -> usize {
        let mut removed = 0;
        while self.entries.len() > max_len {
            self.entries.pop_first();
            removed += 1;
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The largest ID currently stored, if any.
    pub fn max_id(&self) -> Option<StreamId> {
        self.entries.keys().next_back().copied()
    }

    /// The monotonicity high-water mark: the largest ID ever inserted, or
    /// `0-0` for a fresh stream.
    pub fn last_id(&self) -> StreamId {
        self.last_id
    }

    /// The sequence an auto-generated ID gets at timestamp `ms`: one past
    /// the newest sequence at that timestamp, or the timestamp's first
    /// sequence if it is unused (`1` at ms 0, because `0-0` is reserved).
    pub fn next_sequence_for(&self, ms: u64) -> Result<u64, StreamIdError> {
        let first_at = |ms| if ms == 0 { 1 } else { 0 };

        let Some(max) = self.max_id() else {
            return Ok(first_at(ms));
        };

        if ms == max.ms {
            max.seq.checked_add(1).ok_or(StreamIdError::NotGreaterThanLast)
        } else if ms > max.ms {
            Ok(first_at(ms))
        } else {
            Err(StreamIdError::NotGreaterThanLast)
        }
    }
}
