//! The data engine.
//!
//! A single [`KeyValueStore`] owns every key together with the registry of clients blocked on
//! list keys. It is shared between connections as `Arc<Mutex<KeyValueStore>>`, so each
//! operation below runs while holding the engine-wide lock.

use std::collections::{HashMap, VecDeque};

use thiserror::Error;
use tokio::{sync::oneshot, time::Instant};

use crate::{
    state::WaiterRegistry,
    stream::{resolve_stream_id, Stream, StreamFields, StreamId},
};

#[derive(Error, Debug, PartialEq, Clone)]
pub enum StoreError {
    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,
    #[error("ERR Invalid stream ID specified as stream command argument")]
    InvalidStreamId,
    #[error("ERR The ID specified in XADD must be greater than 0-0")]
    StreamIdZero,
    #[error("ERR The ID specified in XADD is equal or smaller than the target stream top item")]
    StreamIdNotIncreasing,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataType {
    String(String),
    List(VecDeque<String>),
    Stream(Stream),
}

impl DataType {
    /// Name reported by the `TYPE` command.
    pub fn type_name(&self) -> &'static str {
        match self {
            DataType::String(_) => "string",
            DataType::List(_) => "array",
            DataType::Stream(_) => "stream",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    pub data: DataType,
    pub expiration: Option<Instant>,
    /// Identifies the write that created this entry, so expiry timers only remove the entry
    /// they were armed for.
    pub write_id: u64,
}

/// Which end of a list a push or pop works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListEnd {
    Head,
    Tail,
}

/// Outcome of a blocking pop attempt.
#[derive(Debug)]
pub enum BlockingPop {
    Ready(String),
    Waiting {
        waiter_id: u64,
        receiver: oneshot::Receiver<String>,
    },
}

#[derive(Debug, Default)]
pub struct KeyValueStore {
    entries: HashMap<String, Value>,
    waiters: WaiterRegistry,
    next_write_id: u64,
}

impl KeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the live entry stored under `key`, if any.
    pub fn get_value(&mut self, key: &str) -> Option<&Value> {
        self.remove_if_expired(key);
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn waiter_count(&self, key: &str) -> usize {
        self.waiters.waiter_count(key)
    }

    /// Stores a string under `key`, replacing whatever the key held before.
    ///
    /// Returns the write ID to hand to [`KeyValueStore::expire_if_unchanged`].
    pub fn set(&mut self, key: &str, value: String, expiration: Option<Instant>) -> u64 {
        let write_id = self.next_write_id();

        self.entries.insert(
            key.to_string(),
            Value {
                data: DataType::String(value),
                expiration,
                write_id,
            },
        );

        write_id
    }

    pub fn get(&mut self, key: &str) -> Result<Option<String>, StoreError> {
        match self.get_value(key) {
            None => Ok(None),
            Some(Value {
                data: DataType::String(s),
                ..
            }) => Ok(Some(s.clone())),
            Some(_) => Err(StoreError::WrongType),
        }
    }

    /// Removes `key` whatever it holds. Returns whether a live entry was removed.
    pub fn delete(&mut self, key: &str) -> bool {
        self.remove_if_expired(key);
        self.entries.remove(key).is_some()
    }

    /// Removes `key` only if it still holds the entry created by `write_id`.
    pub fn expire_if_unchanged(&mut self, key: &str, write_id: u64) -> bool {
        let is_same_write = self
            .entries
            .get(key)
            .is_some_and(|value| value.write_id == write_id);

        if is_same_write {
            self.entries.remove(key);
        }

        is_same_write
    }

    pub fn type_of(&mut self, key: &str) -> &'static str {
        self.get_value(key)
            .map_or("none", |value| value.data.type_name())
    }

    /// Pushes `values` to one end of the list at `key`, creating the list if needed.
    ///
    /// Values pushed to the head keep their given order, so the first one ends up first.
    /// Returns the list length right after the push; clients blocked on the key are served
    /// afterwards.
    pub fn push(
        &mut self,
        key: &str,
        values: Vec<String>,
        end: ListEnd,
    ) -> Result<usize, StoreError> {
        self.remove_if_expired(key);

        if !self.entries.contains_key(key) {
            let write_id = self.next_write_id();
            self.entries.insert(
                key.to_string(),
                Value {
                    data: DataType::List(VecDeque::new()),
                    expiration: None,
                    write_id,
                },
            );
        }

        let Some(Value {
            data: DataType::List(list),
            ..
        }) = self.entries.get_mut(key)
        else {
            return Err(StoreError::WrongType);
        };

        match end {
            ListEnd::Tail => list.extend(values),
            ListEnd::Head => {
                for value in values.into_iter().rev() {
                    list.push_front(value);
                }
            }
        }

        let length = list.len();
        self.serve_waiters(key);

        Ok(length)
    }

    pub fn list_length(&mut self, key: &str) -> Result<usize, StoreError> {
        match self.get_value(key) {
            None => Ok(0),
            Some(Value {
                data: DataType::List(list),
                ..
            }) => Ok(list.len()),
            Some(_) => Err(StoreError::WrongType),
        }
    }

    /// Returns the elements between `start` and `end`, both inclusive, see
    /// [`validate_range_indexes`] for how the indexes are interpreted.
    pub fn list_range(
        &mut self,
        key: &str,
        start: i64,
        end: i64,
    ) -> Result<Vec<String>, StoreError> {
        let list = match self.get_value(key) {
            None => return Ok(Vec::new()),
            Some(Value {
                data: DataType::List(list),
                ..
            }) => list,
            Some(_) => return Err(StoreError::WrongType),
        };

        let Ok((start, end)) = validate_range_indexes(list.len(), start, end) else {
            return Ok(Vec::new());
        };

        Ok(list.range(start..end).cloned().collect())
    }

    /// Pops up to `count` elements from one end of the list at `key`, in pop order.
    ///
    /// Returns `None` when the key does not exist.
    pub fn pop(
        &mut self,
        key: &str,
        end: ListEnd,
        count: usize,
    ) -> Result<Option<Vec<String>>, StoreError> {
        self.remove_if_expired(key);

        let list = match self.entries.get_mut(key) {
            None => return Ok(None),
            Some(Value {
                data: DataType::List(list),
                ..
            }) => list,
            Some(_) => return Err(StoreError::WrongType),
        };

        let count = count.min(list.len());
        let popped = match end {
            ListEnd::Head => list.drain(..count).collect(),
            ListEnd::Tail => {
                let split_at = list.len() - count;
                list.drain(split_at..).rev().collect()
            }
        };

        Ok(Some(popped))
    }

    /// Pops the head of the list at `key`, or queues the caller as a waiter on that key.
    ///
    /// A waiter receives its element through the returned receiver once a push on the same
    /// key happens. The caller must not hold the store lock while awaiting it.
    pub fn pop_or_wait(
        &mut self,
        key: &str,
        deadline: Option<Instant>,
    ) -> Result<BlockingPop, StoreError> {
        self.remove_if_expired(key);

        match self.entries.get_mut(key) {
            Some(Value {
                data: DataType::List(list),
                ..
            }) => {
                if let Some(value) = list.pop_front() {
                    return Ok(BlockingPop::Ready(value));
                }
            }
            Some(_) => return Err(StoreError::WrongType),
            None => (),
        }

        let (waiter_id, receiver) = self.waiters.add_waiter(key, deadline);

        Ok(BlockingPop::Waiting {
            waiter_id,
            receiver,
        })
    }

    /// Deregisters a waiter that stopped waiting. Returns whether it was still queued.
    pub fn cancel_waiter(&mut self, key: &str, waiter_id: u64) -> bool {
        self.waiters.remove_waiter(key, waiter_id)
    }

    /// Appends an entry to the stream at `key`, creating the stream if needed.
    ///
    /// The stream is left untouched when the requested ID is rejected.
    pub fn add_stream_entry(
        &mut self,
        key: &str,
        requested_id: &str,
        fields: StreamFields,
        now_in_milliseconds: u64,
    ) -> Result<StreamId, StoreError> {
        self.remove_if_expired(key);

        let last_id = match self.entries.get(key) {
            None => None,
            Some(Value {
                data: DataType::Stream(stream),
                ..
            }) => stream.keys().next_back().copied(),
            Some(_) => return Err(StoreError::WrongType),
        };

        let id = resolve_stream_id(requested_id, last_id, now_in_milliseconds)?;

        if !self.entries.contains_key(key) {
            let write_id = self.next_write_id();
            self.entries.insert(
                key.to_string(),
                Value {
                    data: DataType::Stream(Stream::new()),
                    expiration: None,
                    write_id,
                },
            );
        }

        if let Some(Value {
            data: DataType::Stream(stream),
            ..
        }) = self.entries.get_mut(key)
        {
            stream.insert(id, fields);
        }

        Ok(id)
    }

    /// Returns the entries with `start <= id <= end`.
    pub fn stream_range(
        &mut self,
        key: &str,
        start: StreamId,
        end: StreamId,
    ) -> Result<Vec<(StreamId, StreamFields)>, StoreError> {
        if start > end {
            return Ok(Vec::new());
        }

        Ok(self
            .stream(key)?
            .map(|stream| {
                stream
                    .range(start..=end)
                    .map(|(id, fields)| (*id, fields.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Returns the entries with an ID strictly greater than `after`.
    pub fn stream_entries_after(
        &mut self,
        key: &str,
        after: StreamId,
    ) -> Result<Vec<(StreamId, StreamFields)>, StoreError> {
        Ok(self
            .stream(key)?
            .map(|stream| {
                stream
                    .range(after..)
                    .skip_while(|(id, _)| **id == after)
                    .map(|(id, fields)| (*id, fields.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Returns the ID of the last entry of the stream at `key`.
    pub fn last_stream_id(&mut self, key: &str) -> Result<Option<StreamId>, StoreError> {
        Ok(self
            .stream(key)?
            .and_then(|stream| stream.keys().next_back().copied()))
    }

    fn stream(&mut self, key: &str) -> Result<Option<&Stream>, StoreError> {
        match self.get_value(key) {
            None => Ok(None),
            Some(Value {
                data: DataType::Stream(stream),
                ..
            }) => Ok(Some(stream)),
            Some(_) => Err(StoreError::WrongType),
        }
    }

    /// Hands elements of the list at `key` to its waiters, oldest waiter first.
    fn serve_waiters(&mut self, key: &str) {
        let now = Instant::now();

        loop {
            let Some(Value {
                data: DataType::List(list),
                ..
            }) = self.entries.get_mut(key)
            else {
                return;
            };

            if list.is_empty() {
                return;
            }

            let Some(waiter) = self.waiters.pop_waiter(key) else {
                return;
            };

            // Past its deadline the waiter is about to report a timeout
            if waiter.is_expired(now) {
                continue;
            }

            let Some(value) = list.pop_front() else {
                return;
            };

            // The receiver is gone when the blocked client went away, keep the element
            if let Err(value) = waiter.sender.send(value) {
                list.push_front(value);
            }
        }
    }

    fn remove_if_expired(&mut self, key: &str) {
        let now = Instant::now();
        let is_expired = self
            .entries
            .get(key)
            .and_then(|value| value.expiration)
            .is_some_and(|expiration| now >= expiration);

        if is_expired {
            self.entries.remove(key);
        }
    }

    fn next_write_id(&mut self) -> u64 {
        let write_id = self.next_write_id;
        self.next_write_id += 1;
        write_id
    }
}

/// Normalizes `LRANGE` style inclusive indexes into a half-open `[start, end)` range.
///
/// Negative indexes count from the end of the list. A start before the beginning of the list
/// is clamped to 0 while an end before the beginning yields an empty range.
pub fn validate_range_indexes(
    length: usize,
    start_index: i64,
    end_index: i64,
) -> Result<(usize, usize), &'static str> {
    let length = i64::try_from(length).map_err(|_| "List is too long")?;

    if length == 0 {
        return Err("List is empty");
    }

    let start = if start_index < 0 {
        if start_index < -length {
            0
        } else {
            length + start_index
        }
    } else {
        start_index
    };

    let end = if end_index < 0 {
        if end_index < -length {
            return Err("Negative end index is out of bounds");
        }

        length + end_index
    } else {
        end_index
    };

    if start > end {
        return Err("Start index is bigger than end index after processing");
    }

    let end = end.saturating_add(1).min(length);

    if start >= end {
        return Err("Start index is out of bounds");
    }

    Ok((start as usize, end as usize))
}
