// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for worker pool lifecycle events.

use crate::engine::worker_pool::DrainMode;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Worker threads spawned and serving the queue.
///
/// # Log Level
/// `debug!` - Lifecycle detail
pub struct PoolStarted<'a> {
    pub pool: &'a str,
    pub workers: usize,
    pub capacity: usize,
}

impl Display for PoolStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Worker pool '{}' started: {} workers, queue capacity {}",
            self.pool, self.workers, self.capacity
        )
    }
}

impl StructuredLog for PoolStarted<'_> {
    fn log(&self) {
        tracing::debug!(
            pool = self.pool,
            workers = self.workers,
            capacity = self.capacity,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "pool_started",
            span_name = name,
            pool = self.pool,
            workers = self.workers,
            capacity = self.capacity,
        )
    }
}

/// Worker threads joined.
///
/// # Log Level
/// `debug!` - Lifecycle detail
pub struct PoolStopped<'a> {
    pub pool: &'a str,
    pub mode: DrainMode,
    pub workers: usize,
    pub discarded: usize,
}

impl Display for PoolStopped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Worker pool '{}' stopped ({} drain): {} workers joined, {} queued tasks discarded",
            self.pool, self.mode, self.workers, self.discarded
        )
    }
}

impl StructuredLog for PoolStopped<'_> {
    fn log(&self) {
        tracing::debug!(
            pool = self.pool,
            mode = %self.mode,
            workers = self.workers,
            discarded = self.discarded,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "pool_stopped",
            span_name = name,
            pool = self.pool,
            mode = %self.mode,
            discarded = self.discarded,
        )
    }
}

/// Worker code panicked; the panic was captured and the thread keeps running.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use the_sequencer::observability::messages::pool::WorkerPanicked;
///
/// let msg = WorkerPanicked {
///     thread: "sequence-worker-3",
///     message: "attempt to divide by zero",
/// };
///
/// assert_eq!(
///     msg.to_string(),
///     "Worker thread 'sequence-worker-3' caught a panic: attempt to divide by zero"
/// );
/// ```
pub struct WorkerPanicked<'a> {
    pub thread: &'a str,
    pub message: &'a str,
}

impl Display for WorkerPanicked<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Worker thread '{}' caught a panic: {}",
            self.thread, self.message
        )
    }
}

impl StructuredLog for WorkerPanicked<'_> {
    fn log(&self) {
        tracing::error!(thread = self.thread, panic = self.message, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "worker_panicked",
            span_name = name,
            thread = self.thread,
            panic = self.message,
        )
    }
}
