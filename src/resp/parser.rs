use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::resp::{RespError, RespValue};

/// Hard bounds enforced while parsing. Exceeding any of them is a protocol
/// error and the connection is torn down; none of them cause allocation
/// proportional to the declared size before the check runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Limits {
    /// Maximum nesting depth of aggregate values.
    pub max_depth: usize,
    /// Maximum number of elements in a single aggregate.
    pub max_collection_size: usize,
    /// Maximum byte length of a single blob (bulk string, bulk error,
    /// verbatim string) or line.
    pub max_string_length: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_depth: 1000,
            max_collection_size: 1_000_000,
            max_string_length: 512 * 1024 * 1024,
        }
    }
}

/// Streaming RESP parser over an async byte source.
///
/// Reads exactly one value per [`read_value`](RespParser::read_value) call
/// and never consumes bytes past the frame it returns. The source should be
/// buffered (the connection layer wraps sockets in a `BufReader`).
pub struct RespParser<R> {
    reader: R,
    limits: Limits,
}

impl<R: AsyncRead + Unpin + Send> RespParser<R> {
    pub fn new(reader: R) -> Self {
        Self::with_limits(reader, Limits::default())
    }

    pub fn with_limits(reader: R, limits: Limits) -> Self {
        RespParser { reader, limits }
    }

    /// Reads the next value from the stream.
    ///
    /// Returns `Ok(None)` on a clean end-of-stream at a frame boundary;
    /// end-of-stream anywhere inside a frame is [`RespError::UnexpectedEof`].
    pub async fn read_value(&mut self) -> Result<Option<RespValue>, RespError> {
        let marker = match self.reader.read_u8().await {
            Ok(byte) => byte,
            Err(err) if err.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        Ok(Some(self.parse_body(marker, 0).await?))
    }

    /// Parses one value given its already-consumed marker byte. Boxing makes
    /// the recursion through aggregate types expressible as an async fn.
    fn parse_value<'a>(
        &'a mut self,
        depth: usize,
    ) -> Pin<Box<dyn Future<Output = Result<RespValue, RespError>> + Send + 'a>> {
        Box::pin(async move {
            let marker = self.reader.read_u8().await?;
            self.parse_body(marker, depth).await
        })
    }

    async fn parse_body(&mut self, marker: u8, depth: usize) -> Result<RespValue, RespError> {
        if depth >= self.limits.max_depth {
            return Err(RespError::DepthExceeded(self.limits.max_depth));
        }

        match marker {
            b'+' => Ok(RespValue::SimpleString(self.read_text_line().await?)),
            b'-' => Ok(RespValue::SimpleError(self.read_text_line().await?)),
            b':' => {
                let line = self.read_line().await?;
                Ok(RespValue::Integer(parse_i64(&line)?))
            }
            b'$' => match self.read_blob_length().await? {
                None => Ok(RespValue::Null),
                Some(length) => Ok(RespValue::BulkString(self.read_blob(length).await?)),
            },
            b'*' => match self.read_aggregate_length().await? {
                None => Ok(RespValue::NullArray),
                Some(count) => Ok(RespValue::Array(self.read_elements(count, depth).await?)),
            },
            b'#' => {
                let line = self.read_line().await?;
                match line.as_slice() {
                    b"t" => Ok(RespValue::Bool(true)),
                    b"f" => Ok(RespValue::Bool(false)),
                    _ => Err(RespError::InvalidBool),
                }
            }
            b',' => {
                let line = self.read_text_line().await?;
                let value = line.parse::<f64>().map_err(|_| RespError::InvalidDouble)?;
                Ok(RespValue::Double(value))
            }
            b'(' => {
                let line = self.read_text_line().await?;
                if !is_big_number(&line) {
                    return Err(RespError::InvalidBigNumber);
                }
                Ok(RespValue::BigNumber(line))
            }
            b'!' => {
                let length = self
                    .read_blob_length()
                    .await?
                    .ok_or(RespError::NegativeLength)?;
                Ok(RespValue::BulkError(self.read_blob(length).await?))
            }
            b'=' => self.read_verbatim().await,
            b'%' => {
                let pairs = self
                    .read_aggregate_length()
                    .await?
                    .ok_or(RespError::NegativeLength)?;
                Ok(RespValue::Map(self.read_pairs(pairs, depth).await?))
            }
            b'|' => {
                let pairs = self
                    .read_aggregate_length()
                    .await?
                    .ok_or(RespError::NegativeLength)?;
                Ok(RespValue::Attributes(self.read_pairs(pairs, depth).await?))
            }
            b'~' => {
                let count = self
                    .read_aggregate_length()
                    .await?
                    .ok_or(RespError::NegativeLength)?;
                Ok(RespValue::Set(self.read_elements(count, depth).await?))
            }
            b'>' => {
                let count = self
                    .read_aggregate_length()
                    .await?
                    .ok_or(RespError::NegativeLength)?;
                Ok(RespValue::Push(self.read_elements(count, depth).await?))
            }
            b'_' => {
                let line = self.read_line().await?;
                if !line.is_empty() {
                    return Err(RespError::MissingCrlf);
                }
                Ok(RespValue::Null)
            }
            other => Err(RespError::UnknownMarker(other)),
        }
    }

    async fn read_elements(
        &mut self,
        count: usize,
        depth: usize,
    ) -> Result<Vec<RespValue>, RespError> {
        let mut elements = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            elements.push(self.parse_value(depth + 1).await?);
        }
        Ok(elements)
    }

    async fn read_pairs(
        &mut self,
        count: usize,
        depth: usize,
    ) -> Result<Vec<(RespValue, RespValue)>, RespError> {
        let mut pairs = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            let key = self.parse_value(depth + 1).await?;
            let value = self.parse_value(depth + 1).await?;
            pairs.push((key, value));
        }
        Ok(pairs)
    }

    /// Verbatim strings carry `<format>:<data>` inside the blob, where the
    /// declared length counts the format, the colon, and the data. The
    /// format must be exactly 3 characters.
    async fn read_verbatim(&mut self) -> Result<RespValue, RespError> {
        let length = self
            .read_blob_length()
            .await?
            .ok_or(RespError::NegativeLength)?;

        if length < 4 {
            return Err(RespError::InvalidVerbatimFormat);
        }

        let blob = self.read_blob(length).await?;

        if blob[3] != b':' {
            return Err(RespError::InvalidVerbatimFormat);
        }

        let format =
            String::from_utf8(blob[..3].to_vec()).map_err(|_| RespError::InvalidVerbatimFormat)?;

        Ok(RespValue::VerbatimString {
            format,
            data: blob.slice(4..),
        })
    }

    /// Reads a `<length>\r\n` prefix for blob types. `-1` maps to `None`;
    /// any other negative value is rejected.
    async fn read_blob_length(&mut self) -> Result<Option<usize>, RespError> {
        let line = self.read_line().await?;
        let length = parse_i64(&line).map_err(|_| RespError::InvalidLength)?;

        match length {
            -1 => Ok(None),
            n if n < 0 => Err(RespError::NegativeLength),
            n if n as usize > self.limits.max_string_length => Err(RespError::StringTooLarge {
                declared: n as usize,
                max: self.limits.max_string_length,
            }),
            n => Ok(Some(n as usize)),
        }
    }

    /// Reads a `<count>\r\n` prefix for aggregate types, same `-1` handling.
    async fn read_aggregate_length(&mut self) -> Result<Option<usize>, RespError> {
        let line = self.read_line().await?;
        let count = parse_i64(&line).map_err(|_| RespError::InvalidLength)?;

        match count {
            -1 => Ok(None),
            n if n < 0 => Err(RespError::NegativeLength),
            n if n as usize > self.limits.max_collection_size => {
                Err(RespError::CollectionTooLarge {
                    declared: n as usize,
                    max: self.limits.max_collection_size,
                })
            }
            n => Ok(Some(n as usize)),
        }
    }

    /// Reads exactly `length` payload bytes followed by CRLF.
    async fn read_blob(&mut self, length: usize) -> Result<Bytes, RespError> {
        let mut data = vec![0u8; length];
        self.reader.read_exact(&mut data).await?;
        self.expect_crlf().await?;
        Ok(Bytes::from(data))
    }

    /// Reads bytes up to (not including) the next CRLF. A CR not followed by
    /// LF, or a bare LF, is a framing error.
    async fn read_line(&mut self) -> Result<Vec<u8>, RespError> {
        let mut line = Vec::new();

        loop {
            match self.reader.read_u8().await? {
                b'\r' => {
                    if self.reader.read_u8().await? != b'\n' {
                        return Err(RespError::MissingCrlf);
                    }
                    return Ok(line);
                }
                b'\n' => return Err(RespError::MissingCrlf),
                byte => {
                    if line.len() >= self.limits.max_string_length {
                        return Err(RespError::StringTooLarge {
                            declared: line.len() + 1,
                            max: self.limits.max_string_length,
                        });
                    }
                    line.push(byte);
                }
            }
        }
    }

    async fn read_text_line(&mut self) -> Result<String, RespError> {
        let line = self.read_line().await?;
        String::from_utf8(line).map_err(|_| RespError::InvalidUtf8)
    }

    async fn expect_crlf(&mut self) -> Result<(), RespError> {
        if self.reader.read_u8().await? != b'\r' || self.reader.read_u8().await? != b'\n' {
            return Err(RespError::MissingCrlf);
        }
        Ok(())
    }
}

fn parse_i64(line: &[u8]) -> Result<i64, RespError> {
    let text = std::str::from_utf8(line).map_err(|_| RespError::InvalidInteger)?;
    text.parse::<i64>().map_err(|_| RespError::InvalidInteger)
}

fn is_big_number(text: &str) -> bool {
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}
