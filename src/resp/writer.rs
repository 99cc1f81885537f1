use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::resp::{RespError, RespValue};

impl RespValue {
    /// Encodes this value to its wire form.
    ///
    /// `Null` is written as the legacy `$-1\r\n` and `NullArray` as
    /// `*-1\r\n` so RESP2 clients keep working. Non-finite doubles are
    /// rejected rather than serialized.
    pub fn encode(&self) -> Result<Vec<u8>, RespError> {
        let mut buf = Vec::new();
        self.encode_into(&mut buf)?;
        Ok(buf)
    }

    fn encode_into(&self, buf: &mut Vec<u8>) -> Result<(), RespError> {
        match self {
            RespValue::SimpleString(text) => {
                write_line(buf, b'+', text.as_bytes());
                Ok(())
            }
            RespValue::SimpleError(text) => {
                write_line(buf, b'-', text.as_bytes());
                Ok(())
            }
            RespValue::Integer(value) => {
                write_line(buf, b':', value.to_string().as_bytes());
                Ok(())
            }
            RespValue::BulkString(data) => {
                write_blob(buf, b'$', data);
                Ok(())
            }
            RespValue::Array(elements) => {
                write_line(buf, b'*', elements.len().to_string().as_bytes());
                for element in elements {
                    element.encode_into(buf)?;
                }
                Ok(())
            }
            RespValue::Bool(value) => {
                write_line(buf, b'#', if *value { b"t" } else { b"f" });
                Ok(())
            }
            RespValue::Double(value) => {
                if !value.is_finite() {
                    return Err(RespError::NonFiniteDouble);
                }
                write_line(buf, b',', value.to_string().as_bytes());
                Ok(())
            }
            RespValue::BigNumber(digits) => {
                write_line(buf, b'(', digits.as_bytes());
                Ok(())
            }
            RespValue::BulkError(data) => {
                write_blob(buf, b'!', data);
                Ok(())
            }
            RespValue::VerbatimString { format, data } => {
                if format.len() != 3 {
                    return Err(RespError::InvalidVerbatimFormat);
                }
                let length = format.len() + 1 + data.len();
                write_line(buf, b'=', length.to_string().as_bytes());
                buf.extend_from_slice(format.as_bytes());
                buf.push(b':');
                buf.extend_from_slice(data);
                buf.extend_from_slice(b"\r\n");
                Ok(())
            }
            RespValue::Map(pairs) => encode_pairs(buf, b'%', pairs),
            RespValue::Attributes(pairs) => encode_pairs(buf, b'|', pairs),
            RespValue::Set(elements) => {
                write_line(buf, b'~', elements.len().to_string().as_bytes());
                for element in elements {
                    element.encode_into(buf)?;
                }
                Ok(())
            }
            RespValue::Push(elements) => {
                write_line(buf, b'>', elements.len().to_string().as_bytes());
                for element in elements {
                    element.encode_into(buf)?;
                }
                Ok(())
            }
            RespValue::Null => {
                buf.extend_from_slice(b"$-1\r\n");
                Ok(())
            }
            RespValue::NullArray => {
                buf.extend_from_slice(b"*-1\r\n");
                Ok(())
            }
        }
    }
}

fn write_line(buf: &mut Vec<u8>, marker: u8, body: &[u8]) {
    buf.push(marker);
    buf.extend_from_slice(body);
    buf.extend_from_slice(b"\r\n");
}

fn write_blob(buf: &mut Vec<u8>, marker: u8, data: &[u8]) {
    write_line(buf, marker, data.len().to_string().as_bytes());
    buf.extend_from_slice(data);
    buf.extend_from_slice(b"\r\n");
}

fn encode_pairs(
    buf: &mut Vec<u8>,
    marker: u8,
    pairs: &[(RespValue, RespValue)],
) -> Result<(), RespError> {
    write_line(buf, marker, pairs.len().to_string().as_bytes());
    for (key, value) in pairs {
        key.encode_into(buf)?;
        value.encode_into(buf)?;
    }
    Ok(())
}

/// Serializing half of the codec: encodes values and flushes them to an
/// async sink, one value per call.
pub struct RespWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> RespWriter<W> {
    pub fn new(writer: W) -> Self {
        RespWriter { writer }
    }

    pub async fn write_value(&mut self, value: &RespValue) -> Result<(), RespError> {
        let encoded = value.encode()?;
        self.writer.write_all(&encoded).await?;
        self.writer.flush().await?;
        Ok(())
    }
}
