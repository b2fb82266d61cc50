use std::{collections::BTreeMap, fmt, str::FromStr};

use crate::key_value_store::StoreError;

/// Field/value pairs of a stream entry, in the order they were given.
pub type StreamFields = Vec<(String, String)>;

/// Entries of a stream, ordered by ID.
pub type Stream = BTreeMap<StreamId, StreamFields>;

/// A `<milliseconds>-<sequence>` stream entry identifier.
///
/// Ordering compares the millisecond part first and the sequence second, both numerically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StreamId {
    pub milliseconds: u64,
    pub sequence: u64,
}

impl StreamId {
    pub const ZERO: StreamId = StreamId::new(0, 0);
    pub const MIN: StreamId = StreamId::new(0, 1);
    pub const MAX: StreamId = StreamId::new(u64::MAX, u64::MAX);

    pub const fn new(milliseconds: u64, sequence: u64) -> Self {
        Self {
            milliseconds,
            sequence,
        }
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.milliseconds, self.sequence)
    }
}

/// Parses `<ms>-<seq>` or a bare `<ms>`, in which case the sequence is 0.
impl FromStr for StreamId {
    type Err = StoreError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let (milliseconds, sequence) = match input.split_once('-') {
            Some((milliseconds, sequence)) => (milliseconds, Some(sequence)),
            None => (input, None),
        };

        let milliseconds = parse_id_part(milliseconds)?;
        let sequence = match sequence {
            Some(sequence) => parse_id_part(sequence)?,
            None => 0,
        };

        Ok(StreamId::new(milliseconds, sequence))
    }
}

/// Resolves the ID requested by `XADD` against the last ID of the target stream.
///
/// `requested` is either `*`, `<ms>-*` or an explicit `<ms>-<seq>`. A wildcard sequence
/// continues after `last` when the milliseconds match and starts over otherwise (at 1 for
/// millisecond 0, since `0-0` is never a valid ID). The resolved ID must be greater than
/// `0-0` and greater than `last`.
pub fn resolve_stream_id(
    requested: &str,
    last: Option<StreamId>,
    now_in_milliseconds: u64,
) -> Result<StreamId, StoreError> {
    let requested = if requested == "*" {
        format!("{}-*", now_in_milliseconds)
    } else {
        requested.to_string()
    };

    let Some((milliseconds, sequence)) = requested.split_once('-') else {
        return Err(StoreError::InvalidStreamId);
    };

    let milliseconds = parse_id_part(milliseconds)?;

    let id = match sequence {
        "*" => {
            let sequence = match last {
                Some(last) if milliseconds < last.milliseconds => {
                    return Err(StoreError::StreamIdNotIncreasing);
                }
                Some(last) if milliseconds == last.milliseconds => last
                    .sequence
                    .checked_add(1)
                    .ok_or(StoreError::StreamIdNotIncreasing)?,
                _ if milliseconds == 0 => 1,
                _ => 0,
            };

            StreamId::new(milliseconds, sequence)
        }
        sequence => StreamId::new(milliseconds, parse_id_part(sequence)?),
    };

    if id == StreamId::ZERO {
        return Err(StoreError::StreamIdZero);
    }

    if let Some(last) = last {
        if id <= last {
            return Err(StoreError::StreamIdNotIncreasing);
        }
    }

    Ok(id)
}

/// Digits only, `u64::from_str` would also take a leading `+`.
fn parse_id_part(part: &str) -> Result<u64, StoreError> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(StoreError::InvalidStreamId);
    }

    part.parse::<u64>().map_err(|_| StoreError::InvalidStreamId)
}
