use std::collections::{HashMap, VecDeque};

use tokio::{sync::oneshot, time::Instant};

/// A client blocked in `BLPOP`, waiting for an element to be pushed to its key.
#[derive(Debug)]
pub struct Waiter {
    pub id: u64,
    pub sender: oneshot::Sender<String>,
    pub deadline: Option<Instant>,
}

impl Waiter {
    pub fn is_expired(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }
}

/// Per-key FIFO queues of blocked clients.
#[derive(Debug, Default)]
pub struct WaiterRegistry {
    waiters: HashMap<String, VecDeque<Waiter>>,
    next_waiter_id: u64,
}

impl WaiterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a new waiter behind every waiter already blocked on `key`.
    ///
    /// Returns the waiter ID, needed to deregister it, and the receiving side of its reply slot.
    pub fn add_waiter(
        &mut self,
        key: &str,
        deadline: Option<Instant>,
    ) -> (u64, oneshot::Receiver<String>) {
        let (sender, receiver) = oneshot::channel();
        let id = self.next_waiter_id;
        self.next_waiter_id += 1;

        self.waiters.entry(key.to_string()).or_default().push_back(Waiter {
            id,
            sender,
            deadline,
        });

        (id, receiver)
    }

    /// Removes the waiter with the given ID, returning whether it was still queued.
    pub fn remove_waiter(&mut self, key: &str, id: u64) -> bool {
        let Some(queue) = self.waiters.get_mut(key) else {
            return false;
        };

        let length_before = queue.len();
        queue.retain(|waiter| waiter.id != id);
        let removed = queue.len() != length_before;

        if queue.is_empty() {
            self.waiters.remove(key);
        }

        removed
    }

    /// Takes the oldest waiter blocked on `key`.
    pub fn pop_waiter(&mut self, key: &str) -> Option<Waiter> {
        let queue = self.waiters.get_mut(key)?;
        let waiter = queue.pop_front();

        if queue.is_empty() {
            self.waiters.remove(key);
        }

        waiter
    }

    pub fn waiter_count(&self, key: &str) -> usize {
        self.waiters.get(key).map_or(0, VecDeque::len)
    }
}
