// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Scheduler implementations.
//!
//! * [`SimpleScheduler`] runs one Sequence inline on the caller's thread
//! * [`ParallelScheduler`] runs N Sequences on a fixed worker pool
//!
//! Both implement [`crate::traits::Scheduler`] and share the state machine
//! and result handling below.

mod parallel;
mod report;
mod simple;

pub use parallel::ParallelScheduler;
pub use report::{ProcessorReport, RunReport};
pub use simple::SimpleScheduler;

use crate::engine::sequence::Processed;
use crate::errors::{SchedulerError, SequenceError};
use crate::event::Event;
use crate::observability::messages::scheduler::{EventProcessingFailed, ProcessingStopRequested};
use crate::observability::messages::StructuredLog;
use std::collections::VecDeque;
use std::fmt::{Display, Formatter};

/// Lifecycle of a scheduler.
///
/// `Unconfigured -> Configuring -> Ready -> Draining -> Stopped`; a failed
/// configuration goes straight to `Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Unconfigured,
    Configuring,
    Ready,
    Draining,
    Stopped,
}

impl SchedulerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchedulerState::Unconfigured => "unconfigured",
            SchedulerState::Configuring => "configuring",
            SchedulerState::Ready => "ready",
            SchedulerState::Draining => "draining",
            SchedulerState::Stopped => "stopped",
        }
    }

    /// Fail with [`SchedulerError::InvalidState`] unless in `expected`.
    pub(crate) fn require(
        self,
        expected: SchedulerState,
        operation: &'static str,
    ) -> Result<(), SchedulerError> {
        if self == expected {
            Ok(())
        } else {
            Err(self.reject(operation))
        }
    }

    pub(crate) fn reject(self, operation: &'static str) -> SchedulerError {
        SchedulerError::InvalidState {
            operation,
            state: self.as_str(),
        }
    }

    /// Finished events may be collected once configured, even after `end`.
    pub(crate) fn can_collect(self) -> bool {
        matches!(
            self,
            SchedulerState::Ready | SchedulerState::Draining | SchedulerState::Stopped
        )
    }
}

impl Display for SchedulerState {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Route one processed event to the finished list or the failure queue.
///
/// A stop request still returns its event; a failure hands the partially
/// processed event back inside the error.
pub(crate) fn settle(
    processed: Processed,
    finished: &mut Vec<Event>,
    failures: &mut VecDeque<SchedulerError>,
) {
    let Processed { mut event, result } = processed;
    event.detach_context();
    let id = event.id();

    match result {
        Ok(()) => finished.push(event),
        Err(SequenceError::StopRequested { processor, reason }) => {
            ProcessingStopRequested {
                processor: &processor,
                event: id,
                reason: &reason,
            }
            .log();
            finished.push(event);
            failures.push_back(SchedulerError::StopRequested {
                id,
                processor,
                reason,
            });
        }
        Err(source) => {
            EventProcessingFailed {
                event: id,
                error: &source,
            }
            .log();
            failures.push_back(SchedulerError::EventFailed {
                event: Box::new(event),
                source,
            });
        }
    }
}
