// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for scheduler lifecycle and event processing.
//!
//! This module contains message types for logging events related to:
//! * Scheduler configuration and concurrency sanity checks
//! * Run boundaries
//! * Event failures and stop requests
//! * The end-of-run statistics summary and application termination

use crate::event::EventId;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// Scheduler configured and ready to accept events.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_sequencer::observability::messages::scheduler::SchedulerConfigured;
///
/// let msg = SchedulerConfigured {
///     strategy: "parallel",
///     concurrency: 4,
///     queue_capacity: 8,
///     processors: 3,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct SchedulerConfigured<'a> {
    pub strategy: &'a str,
    pub concurrency: usize,
    pub queue_capacity: usize,
    pub processors: usize,
}

impl Display for SchedulerConfigured<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Scheduler configured with {} strategy: {} processors, concurrency={}, queue_capacity={}",
            self.strategy, self.processors, self.concurrency, self.queue_capacity
        )
    }
}

impl StructuredLog for SchedulerConfigured<'_> {
    fn log(&self) {
        tracing::info!(
            strategy = self.strategy,
            concurrency = self.concurrency,
            queue_capacity = self.queue_capacity,
            processors = self.processors,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "scheduler",
            span_name = name,
            strategy = self.strategy,
            concurrency = self.concurrency,
        )
    }
}

/// Requested concurrency exceeds the hardware thread count.
///
/// # Log Level
/// `warn!` - Potential issue
pub struct ConcurrencyExceedsHardware {
    pub requested: usize,
    pub hardware: usize,
}

impl Display for ConcurrencyExceedsHardware {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Requested concurrency {} exceeds the {} hardware threads available; workers will compete for cores",
            self.requested, self.hardware
        )
    }
}

impl StructuredLog for ConcurrencyExceedsHardware {
    fn log(&self) {
        tracing::warn!(requested = self.requested, hardware = self.hardware, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "concurrency_exceeds_hardware",
            span_name = name,
            requested = self.requested,
            hardware = self.hardware,
        )
    }
}

/// The parallel scheduler was configured with a single worker.
///
/// # Log Level
/// `warn!` - Potential issue
pub struct SingleWorkerParallel;

impl Display for SingleWorkerParallel {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Parallel scheduler running with a single worker thread; the sequential strategy avoids the pool overhead"
        )
    }
}

impl StructuredLog for SingleWorkerParallel {
    fn log(&self) {
        tracing::warn!("{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("single_worker_parallel", span_name = name)
    }
}

/// All in-flight events drained and a run header delivered.
///
/// # Log Level
/// `info!` - Important operational event
pub struct RunBoundaryReached {
    pub run_number: u32,
    pub drain_wait: Duration,
}

impl Display for RunBoundaryReached {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Run {} started after draining in-flight events for {:?}",
            self.run_number, self.drain_wait
        )
    }
}

impl StructuredLog for RunBoundaryReached {
    fn log(&self) {
        tracing::info!(
            run_number = self.run_number,
            drain_wait_us = self.drain_wait.as_micros() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("run", span_name = name, run_number = self.run_number)
    }
}

/// Processing of one event failed.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use the_sequencer::event::EventId;
/// use the_sequencer::observability::messages::scheduler::EventProcessingFailed;
///
/// let error = std::io::Error::new(std::io::ErrorKind::Other, "detector offline");
/// let msg = EventProcessingFailed {
///     event: EventId::new(1, 42),
///     error: &error,
/// };
///
/// assert_eq!(msg.to_string(), "Event 1/42 failed: detector offline");
/// ```
pub struct EventProcessingFailed<'a> {
    pub event: EventId,
    pub error: &'a dyn std::error::Error,
}

impl Display for EventProcessingFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Event {} failed: {}", self.event, self.error)
    }
}

impl StructuredLog for EventProcessingFailed<'_> {
    fn log(&self) {
        tracing::error!(
            run_number = self.event.run_number,
            event_number = self.event.event_number,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "event_failed",
            span_name = name,
            event = %self.event,
            error = %self.error,
        )
    }
}

/// A processor asked for the run to end.
///
/// # Log Level
/// `warn!` - Run ends early, but cleanly
pub struct ProcessingStopRequested<'a> {
    pub processor: &'a str,
    pub event: EventId,
    pub reason: &'a str,
}

impl Display for ProcessingStopRequested<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Processor '{}' requested to stop processing at event {}: {}",
            self.processor, self.event, self.reason
        )
    }
}

impl StructuredLog for ProcessingStopRequested<'_> {
    fn log(&self) {
        tracing::warn!(
            processor = self.processor,
            event = %self.event,
            reason = self.reason,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "stop_requested",
            span_name = name,
            processor = self.processor,
            event = %self.event,
        )
    }
}

/// Scheduler shut down; summary of the run.
///
/// # Log Level
/// `info!` - Important operational event
pub struct SchedulerFinished<'a> {
    pub strategy: &'a str,
    pub events: u64,
    pub concurrency: usize,
    pub wall_time: Duration,
    pub speedup: f64,
}

impl Display for SchedulerFinished<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Scheduler ({}) finished: {} events in {:?}, speed-up {:.2} with concurrency {}",
            self.strategy, self.events, self.wall_time, self.speedup, self.concurrency
        )
    }
}

impl StructuredLog for SchedulerFinished<'_> {
    fn log(&self) {
        tracing::info!(
            strategy = self.strategy,
            events = self.events,
            concurrency = self.concurrency,
            wall_time_ms = self.wall_time.as_millis() as u64,
            speedup = self.speedup,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "scheduler_finished",
            span_name = name,
            strategy = self.strategy,
            events = self.events,
        )
    }
}

/// The application stopped reading events and shut the scheduler down.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ProcessingTerminated<'a> {
    pub termination: &'a str,
    pub events_read: u64,
    pub events_delivered: u64,
    pub events_failed: usize,
}

impl Display for ProcessingTerminated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Processing {}: {} events read, {} delivered, {} failed",
            self.termination, self.events_read, self.events_delivered, self.events_failed
        )
    }
}

impl StructuredLog for ProcessingTerminated<'_> {
    fn log(&self) {
        tracing::info!(
            termination = self.termination,
            events_read = self.events_read,
            events_delivered = self.events_delivered,
            events_failed = self.events_failed,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "processing_terminated",
            span_name = name,
            termination = self.termination,
        )
    }
}
