// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Bounded, mutex-protected FIFO shared by the scheduler and the worker threads.
//!
//! The queue is the only structure the scheduler thread and the workers
//! mutate concurrently. Producers choose how to behave when the queue is
//! full through [`PushPolicy`]; consumers block in [`TaskQueue::pop`] until
//! an item arrives or the queue is closed and empty.
//!
//! # Examples
//!
//! ```rust
//! use the_sequencer::engine::task_queue::{PushError, PushPolicy, TaskQueue};
//!
//! let queue = TaskQueue::new(2);
//! queue.push("a", PushPolicy::Reject).unwrap();
//! queue.push("b", PushPolicy::Reject).unwrap();
//! assert_eq!(queue.free_slots(), 0);
//!
//! // A rejected item is handed back to the caller
//! match queue.push("c", PushPolicy::Reject) {
//!     Err(PushError::Full(item)) => assert_eq!(item, "c"),
//!     other => panic!("unexpected {:?}", other),
//! }
//!
//! queue.close();
//! assert_eq!(queue.pop(), Some("a"));
//! assert_eq!(queue.pop(), Some("b"));
//! assert_eq!(queue.pop(), None);
//! ```

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard};

/// Behaviour of [`TaskQueue::push`] when the queue is at capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushPolicy {
    /// Wait until a consumer frees a slot
    Blocking,
    /// Hand the item back immediately
    Reject,
}

/// A push that did not enqueue; the item is returned to the caller.
#[derive(Debug, PartialEq, Eq)]
pub enum PushError<T> {
    Full(T),
    Closed(T),
}

impl<T> PushError<T> {
    pub fn into_inner(self) -> T {
        match self {
            PushError::Full(item) | PushError::Closed(item) => item,
        }
    }
}

#[derive(Debug)]
struct State<T> {
    items: VecDeque<T>,
    closed: bool,
}

#[derive(Debug)]
pub struct TaskQueue<T> {
    state: Mutex<State<T>>,
    not_empty: Condvar,
    not_full: Condvar,
    capacity: usize,
}

impl<T> TaskQueue<T> {
    /// Create a queue holding at most `capacity` items (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            state: Mutex::new(State {
                items: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity,
        }
    }

    // Panics in task bodies are caught before they can poison this lock,
    // and the queue state is consistent between every mutation anyway.
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn push(&self, item: T, policy: PushPolicy) -> Result<(), PushError<T>> {
        let mut state = self.lock();
        loop {
            if state.closed {
                return Err(PushError::Closed(item));
            }
            if state.items.len() < self.capacity {
                break;
            }
            match policy {
                PushPolicy::Reject => return Err(PushError::Full(item)),
                PushPolicy::Blocking => {
                    state = self
                        .not_full
                        .wait(state)
                        .unwrap_or_else(|poisoned| poisoned.into_inner());
                }
            }
        }
        state.items.push_back(item);
        drop(state);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Block until an item is available. Returns `None` once the queue is closed and drained.
    pub fn pop(&self) -> Option<T> {
        let mut state = self.lock();
        loop {
            if let Some(item) = state.items.pop_front() {
                drop(state);
                self.not_full.notify_one();
                return Some(item);
            }
            if state.closed {
                return None;
            }
            state = self
                .not_empty
                .wait(state)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }

    pub fn try_pop(&self) -> Option<T> {
        let item = self.lock().items.pop_front();
        if item.is_some() {
            self.not_full.notify_one();
        }
        item
    }

    /// Refuse further pushes and wake every waiter. Queued items stay poppable.
    pub fn close(&self) {
        self.lock().closed = true;
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    /// Remove and return the whole backlog.
    pub fn clear(&self) -> Vec<T> {
        let drained: Vec<T> = self.lock().items.drain(..).collect();
        self.not_full.notify_all();
        drained
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current headroom: how many pushes would succeed without waiting.
    pub fn free_slots(&self) -> usize {
        let state = self.lock();
        if state.closed {
            0
        } else {
            self.capacity - state.items.len()
        }
    }
}
