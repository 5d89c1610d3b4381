// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for processor lifecycle events.
//!
//! This module contains message types for logging events related to:
//! * Processor type registration and instantiation
//! * Per-event skips
//! * Shutdown summaries and failures

use crate::event::EventId;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A constructor was added to a processor registry.
///
/// # Log Level
/// `trace!` - Setup detail
pub struct ProcessorTypeRegistered<'a> {
    pub type_name: &'a str,
}

impl Display for ProcessorTypeRegistered<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Processor type '{}' registered", self.type_name)
    }
}

impl StructuredLog for ProcessorTypeRegistered<'_> {
    fn log(&self) {
        tracing::trace!(type_name = self.type_name, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::trace_span!("processor_type_registered", span_name = name, type_name = self.type_name)
    }
}

/// A declared processor was laid out across the Sequences.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_sequencer::observability::messages::processor::ProcessorInstantiated;
///
/// let msg = ProcessorInstantiated {
///     processor: "counter",
///     instances: 1,
///     cloned: false,
///     critical: true,
/// };
///
/// assert_eq!(
///     msg.to_string(),
///     "Processor 'counter' instantiated: 1 instance(s), clone=false, critical=true"
/// );
/// ```
pub struct ProcessorInstantiated<'a> {
    pub processor: &'a str,
    pub instances: usize,
    pub cloned: bool,
    pub critical: bool,
}

impl Display for ProcessorInstantiated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Processor '{}' instantiated: {} instance(s), clone={}, critical={}",
            self.processor, self.instances, self.cloned, self.critical
        )
    }
}

impl StructuredLog for ProcessorInstantiated<'_> {
    fn log(&self) {
        tracing::info!(
            processor = self.processor,
            instances = self.instances,
            cloned = self.cloned,
            critical = self.critical,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "processor_instantiated",
            span_name = name,
            processor = self.processor,
            instances = self.instances,
        )
    }
}

/// A processor declined to handle one event.
///
/// # Log Level
/// `debug!` - Expected per-event outcome
pub struct ProcessorSkippedEvent<'a> {
    pub processor: &'a str,
    pub event: EventId,
}

impl Display for ProcessorSkippedEvent<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Processor '{}' skipped event {}", self.processor, self.event)
    }
}

impl StructuredLog for ProcessorSkippedEvent<'_> {
    fn log(&self) {
        tracing::debug!(
            processor = self.processor,
            run_number = self.event.run_number,
            event_number = self.event.event_number,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "processor_skipped_event",
            span_name = name,
            processor = self.processor,
            event = %self.event,
        )
    }
}

/// Per-run event count reported at shutdown.
///
/// # Log Level
/// `info!` - Important operational event
pub struct EventsCounted<'a> {
    pub processor: &'a str,
    pub run_number: u32,
    pub events: u64,
}

impl Display for EventsCounted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Processor '{}' counted {} events in run {}",
            self.processor, self.events, self.run_number
        )
    }
}

impl StructuredLog for EventsCounted<'_> {
    fn log(&self) {
        tracing::info!(
            processor = self.processor,
            run_number = self.run_number,
            events = self.events,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "events_counted",
            span_name = name,
            processor = self.processor,
            run_number = self.run_number,
        )
    }
}

/// A processor's `end` call failed.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct ProcessorEndFailed<'a> {
    pub error: &'a dyn std::error::Error,
}

impl Display for ProcessorEndFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Processor shutdown failed: {}", self.error)
    }
}

impl StructuredLog for ProcessorEndFailed<'_> {
    fn log(&self) {
        tracing::error!(error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("processor_end_failed", span_name = name, error = %self.error)
    }
}
