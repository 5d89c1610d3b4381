// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Application driver.
//!
//! The [`Application`] reads a source, feeds a scheduler and hands finished
//! events to a sink. Backpressure is cooperative: while the scheduler has
//! no free slot the driver collects finished events, sleeps briefly and
//! retries, so no event is ever dropped.
//!
//! A stop request from a processor ends reading gracefully: everything
//! already pushed is drained and the run is reported as a clean
//! termination. Event failures are collected and do not stop the run.
//!
//! # Examples
//!
//! ```
//! use the_sequencer::app::{Application, Termination};
//! use the_sequencer::config::{Config, ProcessorConfig, ProcessorRegistry, Strategy};
//! use the_sequencer::source::SyntheticSource;
//!
//! let mut config = Config::new(vec!["counter".to_string()]);
//! config.strategy = Strategy::Sequential;
//! config
//!     .processors
//!     .insert("counter".to_string(), ProcessorConfig::new("event_counter"));
//!
//! let app = Application::from_config(&config, &ProcessorRegistry::with_builtins()).unwrap();
//! let mut delivered = 0;
//! let summary = app
//!     .run(&mut SyntheticSource::new(2, 5, 1), |_event| delivered += 1)
//!     .unwrap();
//!
//! assert_eq!(summary.termination, Termination::Completed);
//! assert_eq!(delivered, 10);
//! ```

use crate::config::{Config, ProcessorRegistry, RuntimeBuilder};
use crate::errors::SchedulerError;
use crate::event::{Event, EventId};
use crate::observability::messages::scheduler::ProcessingTerminated;
use crate::observability::messages::StructuredLog;
use crate::scheduler::RunReport;
use crate::source::{EventSource, SourceItem};
use crate::traits::Scheduler;
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Pause between retries while the scheduler reports no free slot.
pub const BACKPRESSURE_WAIT: Duration = Duration::from_millis(1);

/// Why the application stopped reading events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Termination {
    /// The source was exhausted
    Completed,
    /// A processor asked for the run to end
    StopRequested {
        processor: String,
        event: EventId,
        reason: String,
    },
    /// The cancellation token fired
    Cancelled,
}

impl Display for Termination {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            Termination::Completed => write!(f, "completed"),
            Termination::StopRequested {
                processor,
                event,
                reason,
            } => write!(f, "stopped by '{}' at event {}: {}", processor, event, reason),
            Termination::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Outcome of one application run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub termination: Termination,
    pub events_read: u64,
    pub events_delivered: u64,
    /// Events whose processing failed, in the order the failures were seen
    pub failed_events: Vec<EventId>,
    pub report: RunReport,
}

#[derive(Default)]
struct Progress {
    stop: Option<Termination>,
    events_read: u64,
    events_delivered: u64,
    failed_events: Vec<EventId>,
}

pub struct Application {
    scheduler: Box<dyn Scheduler>,
    cancel: CancellationToken,
}

impl Application {
    /// Drive an already initialized scheduler.
    pub fn new(scheduler: Box<dyn Scheduler>) -> Self {
        Self {
            scheduler,
            cancel: CancellationToken::new(),
        }
    }

    pub fn from_config(cfg: &Config, registry: &ProcessorRegistry) -> Result<Self, SchedulerError> {
        Ok(Self::new(RuntimeBuilder::from_config(cfg, registry)?))
    }

    /// Replace the cancellation token, e.g. with one wired to Ctrl-C.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Process `source` to the end, a stop request or cancellation.
    ///
    /// Every event the scheduler finishes is passed to `sink` in completion
    /// order. Scheduler faults other than per-event failures abort the run.
    pub fn run<S, F>(mut self, source: &mut S, mut sink: F) -> Result<RunSummary, SchedulerError>
    where
        S: EventSource + ?Sized,
        F: FnMut(Event),
    {
        let mut progress = Progress::default();

        while progress.stop.is_none() {
            if self.cancel.is_cancelled() {
                progress.stop = Some(Termination::Cancelled);
                break;
            }
            let Some(item) = source.next_item() else {
                break;
            };
            match item {
                SourceItem::RunHeader(mut header) => {
                    self.scheduler.process_run_header(&mut header)?;
                }
                SourceItem::Event(event) => {
                    progress.events_read += 1;
                    self.push(event, &mut sink, &mut progress)?;
                }
            }
        }

        while self.scheduler.pending() > 0 {
            self.collect(&mut sink, &mut progress)?;
            if self.scheduler.pending() > 0 {
                std::thread::sleep(BACKPRESSURE_WAIT);
            }
        }
        let report = self.scheduler.end()?;

        let termination = progress.stop.unwrap_or(Termination::Completed);
        ProcessingTerminated {
            termination: &termination.to_string(),
            events_read: progress.events_read,
            events_delivered: progress.events_delivered,
            events_failed: progress.failed_events.len(),
        }
        .log();

        Ok(RunSummary {
            termination,
            events_read: progress.events_read,
            events_delivered: progress.events_delivered,
            failed_events: progress.failed_events,
            report,
        })
    }

    fn push<F: FnMut(Event)>(
        &mut self,
        mut event: Event,
        sink: &mut F,
        progress: &mut Progress,
    ) -> Result<(), SchedulerError> {
        loop {
            match self.scheduler.push_event(event) {
                Ok(()) => return Ok(()),
                Err(SchedulerError::Backpressure { event: rejected }) => {
                    event = *rejected;
                    self.collect(sink, progress)?;
                    std::thread::sleep(BACKPRESSURE_WAIT);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Hand finished events to the sink and record per-event outcomes.
    fn collect<F: FnMut(Event)>(&mut self, sink: &mut F, progress: &mut Progress) -> Result<(), SchedulerError> {
        match self.scheduler.pop_finished_events() {
            Ok(events) => {
                for event in events {
                    progress.events_delivered += 1;
                    sink(event);
                }
                Ok(())
            }
            Err(SchedulerError::StopRequested {
                id,
                processor,
                reason,
            }) => {
                progress.stop.get_or_insert(Termination::StopRequested {
                    processor,
                    event: id,
                    reason,
                });
                Ok(())
            }
            Err(SchedulerError::EventFailed { event, .. }) => {
                progress.failed_events.push(event.id());
                Ok(())
            }
            Err(SchedulerError::EventPanicked { id, .. }) => {
                progress.failed_events.push(id);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
