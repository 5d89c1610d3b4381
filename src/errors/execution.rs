// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::{ConfigError, ContextError};
use crate::event::{Event, EventId};
use thiserror::Error;

/// Failure raised by processor code.
///
/// Processors return this through the `Err` arm of their per-call result.
/// Expected control flow (skip, stop) travels through [`crate::traits::Outcome`]
/// instead.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ProcessorError {
    pub message: String,
}

impl ProcessorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<ContextError> for ProcessorError {
    fn from(err: ContextError) -> Self {
        Self::new(err.to_string())
    }
}

/// Why a Sequence abandoned an event.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SequenceError {
    #[error("Processor '{processor}' failed: {source}")]
    ProcessorFailed {
        processor: String,
        #[source]
        source: ProcessorError,
    },

    /// A processor asked for the whole run to end gracefully
    #[error("Processor '{processor}' requested to stop processing: {reason}")]
    StopRequested { processor: String, reason: String },

    /// Processor code panicked; the event survives with whatever it held at that point
    #[error("Processor '{processor}' panicked: {message}")]
    Panicked { processor: String, message: String },

    /// The processor's guarding condition could not be evaluated
    #[error("Runtime condition for '{processor}' could not be evaluated: {source}")]
    Condition {
        processor: String,
        #[source]
        source: ContextError,
    },
}

/// Errors from the task queue and worker pool.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PoolError {
    #[error("Task queue is full (capacity {capacity})")]
    QueueFull { capacity: usize },

    #[error("Worker pool is not running")]
    NotRunning,

    #[error("Worker pool is already running")]
    AlreadyRunning,

    #[error("Worker pool has no workers")]
    NoWorkers,

    #[error("Failed to spawn worker thread: {0}")]
    Spawn(String),

    /// The task body panicked; the payload message is preserved
    #[error("Task panicked: {message}")]
    TaskPanicked { message: String },

    /// The task was dropped by an immediate drain before it ran
    #[error("Task was discarded before it ran")]
    TaskDiscarded,
}

/// Errors surfaced by a scheduler to the surrounding application.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error("Scheduler cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },

    /// No slot was free; the event is handed back untouched
    #[error("No free slot for event {}", .event.id())]
    Backpressure { event: Box<Event> },

    /// The worker pool refused the event for a reason other than a full queue
    #[error("Event {} was refused: {source}", .event.id())]
    Rejected {
        event: Box<Event>,
        #[source]
        source: PoolError,
    },

    /// Processing of one event failed; the partially processed event is returned
    #[error("Event {} failed: {source}", .event.id())]
    EventFailed {
        event: Box<Event>,
        #[source]
        source: SequenceError,
    },

    /// A worker panicked outside any processor call, so the event could not be recovered
    #[error("Event {id} was lost: worker panicked: {message}")]
    EventPanicked { id: EventId, message: String },

    /// A processor rejected a run header; the run cannot start
    #[error("Run header {run_number} failed: {source}")]
    RunHeaderFailed {
        run_number: u32,
        #[source]
        source: SequenceError,
    },

    /// A processor requested a graceful end of the whole run
    #[error("Processing stopped by '{processor}' at event {id}: {reason}")]
    StopRequested {
        id: EventId,
        processor: String,
        reason: String,
    },
}

impl SchedulerError {
    /// Recover the event carried by a rejection or an event failure.
    pub fn into_event(self) -> Option<Event> {
        match self {
            SchedulerError::Backpressure { event }
            | SchedulerError::Rejected { event, .. }
            | SchedulerError::EventFailed { event, .. } => Some(*event),
            _ => None,
        }
    }

    /// True when the error is a graceful stop request rather than a fault.
    pub fn is_stop_request(&self) -> bool {
        matches!(self, SchedulerError::StopRequested { .. })
    }
}
