// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::{Config, ProcessorRegistry};
use crate::errors::SchedulerError;
use crate::event::{Event, RunHeader};
use crate::scheduler::RunReport;

/// Interface the application drives, implemented by the sequential and
/// parallel schedulers.
///
/// Call order: `init` once, then any interleaving of `process_run_header`,
/// `push_event` and `pop_finished_events`, then `end` once.
pub trait Scheduler: Send {
    /// Short strategy name for logs and reports.
    fn name(&self) -> &'static str;

    /// Build the processor chain and get ready to accept events.
    fn init(&mut self, config: &Config, registry: &ProcessorRegistry) -> Result<(), SchedulerError>;

    /// Deliver a run header once to every unique processor.
    ///
    /// Returns only after every previously pushed event finished processing.
    fn process_run_header(&mut self, header: &mut RunHeader) -> Result<(), SchedulerError>;

    /// Hand one event to the scheduler.
    ///
    /// When no slot is free the event comes back in
    /// [`SchedulerError::Backpressure`] and the caller should drain finished
    /// events before retrying.
    fn push_event(&mut self, event: Event) -> Result<(), SchedulerError>;

    /// Collect every event that finished since the previous call, in completion order.
    ///
    /// A failed event is reported as an error; events that finished alongside
    /// it are returned by the next call.
    fn pop_finished_events(&mut self) -> Result<Vec<Event>, SchedulerError>;

    /// How many events can be pushed right now without backpressure.
    fn free_slots(&self) -> usize;

    /// Events pushed but not yet returned by `pop_finished_events`.
    fn pending(&self) -> usize;

    /// Finish outstanding work, shut processors down and report statistics.
    fn end(&mut self) -> Result<RunReport, SchedulerError>;
}
