//! RESP/RESP3 value type and streaming codec.
//!
//! The wire format is a length-prefixed, CRLF-delimited protocol where the
//! first byte of every frame identifies its type. [`RespParser`] reads one
//! [`RespValue`] at a time from an async byte stream and enforces hard
//! bounds on nesting depth, aggregate size, and blob length; [`RespWriter`]
//! is its mirror. Both halves treat bulk payloads as raw bytes.

mod parser;
mod writer;

pub use parser::{Limits, RespParser};
pub use writer::RespWriter;

use bytes::Bytes;
use thiserror::Error;

/// Errors produced by the codec. Every variant is fatal to the connection
/// that produced it: the framing is no longer trustworthy once any of these
/// occurs.
#[derive(Error, Debug, PartialEq)]
pub enum RespError {
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("unknown type marker {0:#04x}")]
    UnknownMarker(u8),
    #[error("expected CRLF terminator")]
    MissingCrlf,
    #[error("invalid length prefix")]
    InvalidLength,
    #[error("negative length is only valid for bulk strings and arrays")]
    NegativeLength,
    #[error("nesting depth exceeds maximum of {0}")]
    DepthExceeded(usize),
    #[error("aggregate of {declared} elements exceeds maximum of {max}")]
    CollectionTooLarge { declared: usize, max: usize },
    #[error("blob of {declared} bytes exceeds maximum of {max}")]
    StringTooLarge { declared: usize, max: usize },
    #[error("invalid integer payload")]
    InvalidInteger,
    #[error("invalid double payload")]
    InvalidDouble,
    #[error("double must be finite on the wire")]
    NonFiniteDouble,
    #[error("invalid big number payload")]
    InvalidBigNumber,
    #[error("invalid boolean payload")]
    InvalidBool,
    #[error("verbatim string format must be exactly 3 characters")]
    InvalidVerbatimFormat,
    #[error("invalid UTF-8 in textual frame")]
    InvalidUtf8,
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for RespError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::UnexpectedEof => RespError::UnexpectedEof,
            _ => RespError::Io(err.to_string()),
        }
    }
}

/// A single RESP value, covering both the RESP2 core and the RESP3
/// extensions.
///
/// `Null` and `NullArray` are distinct variants because they are distinct on
/// the wire (`$-1\r\n` vs `*-1\r\n`) and clients rely on the difference:
/// `NullArray` is the timeout reply for the blocking commands.
///
/// Maps and attributes are vectors of pairs rather than hash maps so that
/// insertion order survives a round-trip (and because `Double` makes the
/// type unhashable).
#[derive(Debug, Clone, PartialEq)]
pub enum RespValue {
    SimpleString(String),
    SimpleError(String),
    Integer(i64),
    BulkString(Bytes),
    Array(Vec<RespValue>),
    Bool(bool),
    Double(f64),
    BigNumber(String),
    BulkError(Bytes),
    VerbatimString { format: String, data: Bytes },
    Map(Vec<(RespValue, RespValue)>),
    Attributes(Vec<(RespValue, RespValue)>),
    Set(Vec<RespValue>),
    Push(Vec<RespValue>),
    Null,
    NullArray,
}

impl RespValue {
    /// Builds a bulk string from anything byte-like.
    pub fn bulk(data: impl Into<Bytes>) -> Self {
        RespValue::BulkString(data.into())
    }

    /// Builds an array of bulk strings, the shape of most command replies.
    pub fn array_of_bulks<I, B>(items: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        RespValue::Array(items.into_iter().map(RespValue::bulk).collect())
    }

    /// Returns the bulk payload if this value is a bulk string.
    pub fn as_bulk(&self) -> Option<&Bytes> {
        match self {
            RespValue::BulkString(data) => Some(data),
            _ => None,
        }
    }
}
