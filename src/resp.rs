//! Redis Serialization Protocol (RESP) values.
//!
//! Decoding turns the bytes at the front of a buffer into a [`RespValue`]. It reports
//! [`RespError::Incomplete`] when the buffer simply ends too early, so callers can keep the
//! bytes around and read more, and every other [`RespError`] when the input is malformed.
//!
//! Encoding is done per result shape, see [`RespValue::encode`].

use bytes::{Buf, BytesMut};
use thiserror::Error;

const CRLF: &[u8] = b"\r\n";

/// Largest bulk string payload accepted from a client, 512 MB like Redis.
pub const MAX_BULK_LENGTH: usize = 512 * 1024 * 1024;

/// Largest element count accepted for an aggregate frame.
pub const MAX_ARRAY_LENGTH: usize = i32::MAX as usize;

/// Deepest level of arrays nested inside arrays that a frame may use.
pub const MAX_NESTING_DEPTH: usize = 128;

/// Reply produced when a frame starts with a type tag the decoder does not support.
pub const NOT_IMPLEMENTED: &str = "ERR not implemented";

/// Errors that can occur while decoding RESP frames.
#[derive(Error, Debug, PartialEq, Clone)]
pub enum RespError {
    #[error("incomplete frame")]
    Incomplete,
    #[error("invalid integer '{0}'")]
    InvalidInteger(String),
    #[error("invalid length '{0}'")]
    InvalidLength(String),
    #[error("expected CRLF after bulk string payload")]
    MissingTerminator,
    #[error("invalid UTF-8 sequence")]
    InvalidUtf8,
    #[error("invalid big number '{0}'")]
    InvalidBigNumber(String),
    #[error("arrays nested more than {} levels deep", MAX_NESTING_DEPTH)]
    NestingTooDeep,
}

impl RespError {
    pub fn as_string(&self) -> String {
        RespValue::Error(format!("ERR Protocol error: {}", self)).encode()
    }
}

/// A single RESP frame.
///
/// `Attribute`, `Set` and `Push` only ever serialize their element count, the elements
/// themselves are not written to the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum RespValue {
    SimpleString(String),
    Error(String),
    Integer(i64),
    BulkString(String),
    NullBulkString,
    Array(Vec<RespValue>),
    NullArray,
    Null,
    Boolean(bool),
    Double(f64),
    BigNumber(String),
    BulkErrors(Vec<String>),
    Verbatim { encoding: String, text: String },
    Map(Vec<(RespValue, RespValue)>),
    Attribute(Vec<(RespValue, RespValue)>),
    Set(Vec<RespValue>),
    Push(Vec<RespValue>),
}

impl RespValue {
    /// Builds an arbitrary-precision integer from its decimal representation.
    pub fn big_number(digits: &str) -> Result<Self, RespError> {
        let unsigned = digits
            .strip_prefix('-')
            .or_else(|| digits.strip_prefix('+'))
            .unwrap_or(digits);

        if unsigned.is_empty() || !unsigned.bytes().all(|b| b.is_ascii_digit()) {
            return Err(RespError::InvalidBigNumber(digits.to_string()));
        }

        Ok(RespValue::BigNumber(digits.to_string()))
    }

    /// Builds a verbatim string, defaulting the encoding name to `txt`.
    pub fn verbatim(text: &str, encoding: Option<&str>) -> Self {
        RespValue::Verbatim {
            encoding: encoding.unwrap_or("txt").to_string(),
            text: text.to_string(),
        }
    }

    /// Decodes the next complete frame from the front of `buffer`.
    ///
    /// Returns `Ok(None)` and leaves the buffer untouched when the frame is not complete yet.
    /// On success the consumed bytes are removed from the buffer.
    pub fn parse_next(buffer: &mut BytesMut) -> Result<Option<RespValue>, RespError> {
        if buffer.is_empty() {
            return Ok(None);
        }

        match Self::decode(buffer) {
            Ok((value, consumed)) => {
                buffer.advance(consumed);
                Ok(Some(value))
            }
            Err(RespError::Incomplete) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Decodes one frame from the start of `input`.
    ///
    /// Returns the value together with the number of bytes it occupied.
    ///
    /// # Examples
    ///
    /// ```
    /// use resp_store::resp::RespValue;
    ///
    /// let (value, consumed) = RespValue::decode(b"*1\r\n$4\r\nPING\r\n").unwrap();
    /// assert_eq!(value, RespValue::Array(vec![RespValue::BulkString("PING".to_string())]));
    /// assert_eq!(consumed, 14);
    /// ```
    pub fn decode(input: &[u8]) -> Result<(RespValue, usize), RespError> {
        Self::decode_nested(input, 0)
    }

    fn decode_nested(input: &[u8], depth: usize) -> Result<(RespValue, usize), RespError> {
        if depth > MAX_NESTING_DEPTH {
            return Err(RespError::NestingTooDeep);
        }

        let Some(&tag) = input.first() else {
            return Err(RespError::Incomplete);
        };

        let (line, after_line) = read_line(input, 1)?;

        match tag {
            b'+' => Ok((RespValue::SimpleString(line.to_string()), after_line)),
            b'-' => Ok((RespValue::Error(line.to_string()), after_line)),
            b':' => Ok((RespValue::Integer(parse_integer(line)?), after_line)),
            b'$' => {
                let length = parse_integer(line)?;

                if length == -1 {
                    return Ok((RespValue::NullBulkString, after_line));
                }

                let length = usize::try_from(length)
                    .ok()
                    .filter(|length| *length <= MAX_BULK_LENGTH)
                    .ok_or_else(|| RespError::InvalidLength(line.to_string()))?;
                let payload_end = after_line
                    .checked_add(length)
                    .ok_or_else(|| RespError::InvalidLength(line.to_string()))?;

                if input.len() < payload_end + CRLF.len() {
                    return Err(RespError::Incomplete);
                }

                if &input[payload_end..payload_end + CRLF.len()] != CRLF {
                    return Err(RespError::MissingTerminator);
                }

                let content = std::str::from_utf8(&input[after_line..payload_end])
                    .map_err(|_| RespError::InvalidUtf8)?;

                Ok((
                    RespValue::BulkString(content.to_string()),
                    payload_end + CRLF.len(),
                ))
            }
            b'*' => {
                let count = parse_integer(line)?;

                if count == -1 {
                    return Ok((RespValue::NullArray, after_line));
                }

                let count = usize::try_from(count)
                    .ok()
                    .filter(|count| *count <= MAX_ARRAY_LENGTH)
                    .ok_or_else(|| RespError::InvalidLength(line.to_string()))?;

                // The declared count is untrusted, so the preallocation is capped
                let mut elements = Vec::with_capacity(count.min(1024));
                let mut position = after_line;

                for _ in 0..count {
                    let (element, consumed) = Self::decode_nested(&input[position..], depth + 1)?;
                    elements.push(element);
                    position += consumed;
                }

                Ok((RespValue::Array(elements), position))
            }
            b'_' => Ok((RespValue::Null, after_line)),
            _ => Ok((RespValue::Error(NOT_IMPLEMENTED.to_string()), after_line)),
        }
    }

    /// Serializes the value into its wire representation.
    pub fn encode(&self) -> String {
        match self {
            RespValue::SimpleString(s) => encode_simple_string(s),
            RespValue::Error(s) => encode_error(s),
            RespValue::Integer(n) => encode_integer(*n),
            RespValue::BulkString(s) => encode_bulk_string(s),
            RespValue::NullBulkString => "$-1\r\n".to_string(),
            RespValue::Array(elements) => encode_array(elements),
            RespValue::NullArray => "*-1\r\n".to_string(),
            RespValue::Null => "_\r\n".to_string(),
            RespValue::Boolean(b) => encode_boolean(*b),
            RespValue::Double(d) => encode_double(*d),
            RespValue::BigNumber(digits) => format!("({}\r\n", digits),
            RespValue::BulkErrors(errors) => encode_bulk_errors(errors),
            RespValue::Verbatim { encoding, text } => encode_verbatim(encoding, text),
            RespValue::Map(pairs) => encode_map(pairs),
            RespValue::Attribute(pairs) => format!("|{}\r\n", pairs.len()),
            RespValue::Set(elements) => format!("~{}\r\n", elements.len()),
            RespValue::Push(elements) => format!(">{}\r\n", elements.len()),
        }
    }

    /// Encodes a list of strings as an array of bulk strings.
    pub fn encode_array_from_strings(strings: Vec<String>) -> String {
        RespValue::Array(strings.into_iter().map(RespValue::BulkString).collect()).encode()
    }
}

/// Returns the text between `start` and the next CRLF, plus the index right after the CRLF.
fn read_line(input: &[u8], start: usize) -> Result<(&str, usize), RespError> {
    let Some(offset) = input[start..]
        .windows(CRLF.len())
        .position(|window| window == CRLF)
    else {
        return Err(RespError::Incomplete);
    };

    let line_end = start + offset;
    let line = std::str::from_utf8(&input[start..line_end]).map_err(|_| RespError::InvalidUtf8)?;

    Ok((line, line_end + CRLF.len()))
}

fn parse_integer(line: &str) -> Result<i64, RespError> {
    line.parse::<i64>()
        .map_err(|_| RespError::InvalidInteger(line.to_string()))
}

fn encode_simple_string(s: &str) -> String {
    format!("+{}\r\n", s)
}

fn encode_error(s: &str) -> String {
    format!("-{}\r\n", s)
}

fn encode_integer(n: i64) -> String {
    format!(":{}\r\n", n)
}

// Zero-length payloads go out as the null bulk string
fn encode_bulk_string(s: &str) -> String {
    if s.is_empty() {
        return "$-1\r\n".to_string();
    }

    format!("${}\r\n{}\r\n", s.len(), s)
}

fn encode_array(elements: &[RespValue]) -> String {
    let mut encoded = format!("*{}\r\n", elements.len());

    for element in elements {
        encoded.push_str(&element.encode());
    }

    encoded
}

fn encode_boolean(b: bool) -> String {
    format!("#{}\r\n", if b { 't' } else { 'f' })
}

fn encode_double(d: f64) -> String {
    if d.is_nan() {
        return ",nan\r\n".to_string();
    }

    if d.is_infinite() {
        return if d.is_sign_positive() {
            ",inf\r\n".to_string()
        } else {
            ",-inf\r\n".to_string()
        };
    }

    format!(",{}\r\n", d)
}

fn encode_bulk_errors(errors: &[String]) -> String {
    let mut encoded = format!("!{}\r\n", errors.len());

    for error in errors {
        encoded.push_str(&encode_error(error));
    }

    encoded
}

fn encode_verbatim(encoding: &str, text: &str) -> String {
    format!(
        "={}\r\n{}:{}\r\n",
        encoding.len() + 1 + text.len(),
        encoding,
        text
    )
}

fn encode_map(pairs: &[(RespValue, RespValue)]) -> String {
    let mut encoded = format!("%{}\r\n", pairs.len());

    for (key, value) in pairs {
        encoded.push_str(&key.encode());
        encoded.push_str(&value.encode());
    }

    encoded
}
