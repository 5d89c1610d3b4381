// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Event sources.
//!
//! A source yields run headers and events in the order the application
//! should deliver them. Reading real data files is outside this crate; the
//! [`SyntheticSource`] produces empty events for benchmarking and tests.

use crate::config::SourceConfig;
use crate::event::{Event, RunHeader};

/// One item read from a source.
#[derive(Debug)]
pub enum SourceItem {
    RunHeader(RunHeader),
    Event(Event),
}

/// Produces the stream of run headers and events for one application run.
pub trait EventSource: Send {
    /// The next item, or `None` once the source is exhausted.
    fn next_item(&mut self) -> Option<SourceItem>;
}

/// `runs x events_per_run` empty events, each run preceded by its header.
///
/// # Examples
///
/// ```
/// use the_sequencer::source::{EventSource, SourceItem, SyntheticSource};
///
/// let mut source = SyntheticSource::new(1, 2, 5);
/// assert!(matches!(source.next_item(), Some(SourceItem::RunHeader(h)) if h.run_number == 5));
/// assert!(matches!(source.next_item(), Some(SourceItem::Event(e)) if e.event_number() == 1));
/// assert!(matches!(source.next_item(), Some(SourceItem::Event(e)) if e.event_number() == 2));
/// assert!(source.next_item().is_none());
/// ```
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    runs: u32,
    events_per_run: u32,
    first_run: u32,
    run_index: u32,
    next_event: u32,
}

impl SyntheticSource {
    pub fn new(runs: u32, events_per_run: u32, first_run: u32) -> Self {
        Self {
            runs,
            events_per_run,
            first_run,
            run_index: 0,
            next_event: 0,
        }
    }

    pub fn from_config(cfg: &SourceConfig) -> Self {
        Self::new(cfg.runs, cfg.events_per_run, cfg.first_run)
    }

    /// Total number of events this source yields.
    pub fn total_events(&self) -> u64 {
        u64::from(self.runs) * u64::from(self.events_per_run)
    }
}

impl EventSource for SyntheticSource {
    fn next_item(&mut self) -> Option<SourceItem> {
        if self.run_index >= self.runs {
            return None;
        }
        let run_number = self.first_run + self.run_index;

        // event number 0 stands for "header not delivered yet"
        if self.next_event == 0 {
            self.next_event = 1;
            let mut header = RunHeader::new(run_number);
            header.description = format!("synthetic run {}", run_number);
            return Some(SourceItem::RunHeader(header));
        }

        if self.next_event > self.events_per_run {
            self.run_index += 1;
            self.next_event = 0;
            return self.next_item();
        }

        let event = Event::new(run_number, self.next_event);
        self.next_event += 1;
        Some(SourceItem::Event(event))
    }
}
