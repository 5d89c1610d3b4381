// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::ProcessorParameters;
use crate::errors::{ConfigError, ProcessorError};
use crate::event::{Event, RunHeader};
use crate::observability::messages::processor::EventsCounted;
use crate::observability::messages::StructuredLog;
use crate::traits::{Outcome, ProcessResult, Processor};
use std::collections::BTreeMap;
use std::sync::Mutex;

pub const TYPE_NAME: &str = "event_counter";

/// Counts events per run across all Sequences.
///
/// One instance serves every Sequence and it must not run concurrently, so
/// it forces `clone = false` and `critical = true`.
///
/// # Parameters
/// * `max_events` - request a graceful stop once this many events were counted
pub struct EventCounter {
    name: String,
    max_events: Option<u64>,
    state: Mutex<CounterState>,
}

#[derive(Debug, Default)]
struct CounterState {
    per_run: BTreeMap<u32, u64>,
    run_headers: u64,
    total: u64,
}

impl EventCounter {
    pub fn new(name: impl Into<String>, max_events: Option<u64>) -> Self {
        Self {
            name: name.into(),
            max_events,
            state: Mutex::new(CounterState::default()),
        }
    }

    pub fn from_parameters(name: &str, params: &ProcessorParameters) -> Result<Self, ConfigError> {
        Ok(Self::new(name, params.get(name, "max_events")?))
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut CounterState) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut state)
    }

    pub fn total(&self) -> u64 {
        self.with_state(|state| state.total)
    }

    pub fn count_for_run(&self, run_number: u32) -> u64 {
        self.with_state(|state| state.per_run.get(&run_number).copied().unwrap_or(0))
    }

    pub fn run_headers(&self) -> u64 {
        self.with_state(|state| state.run_headers)
    }
}

impl Processor for EventCounter {
    fn name(&self) -> &str {
        &self.name
    }

    fn process_run_header(&self, _header: &RunHeader) -> Result<(), ProcessorError> {
        self.with_state(|state| state.run_headers += 1);
        Ok(())
    }

    fn process_event(&self, event: &mut Event) -> ProcessResult {
        let total = self.with_state(|state| {
            *state.per_run.entry(event.run_number()).or_insert(0) += 1;
            state.total += 1;
            state.total
        });

        match self.max_events {
            Some(max) if total >= max => Ok(Outcome::stop(format!(
                "reached the limit of {} events",
                max
            ))),
            _ => Ok(Outcome::Continue),
        }
    }

    fn end(&self) -> Result<(), ProcessorError> {
        self.with_state(|state| {
            for (run_number, events) in &state.per_run {
                EventsCounted {
                    processor: &self.name,
                    run_number: *run_number,
                    events: *events,
                }
                .log();
            }
        });
        Ok(())
    }

    fn forced_clone(&self) -> Option<bool> {
        Some(false)
    }

    fn forced_critical(&self) -> Option<bool> {
        Some(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_per_run_and_stops_at_limit() {
        let counter = EventCounter::new("counter", Some(3));
        let mut outcomes = Vec::new();
        for (run, number) in [(1, 1), (1, 2), (2, 1)] {
            outcomes.push(counter.process_event(&mut Event::new(run, number)).unwrap());
        }

        assert_eq!(outcomes[0], Outcome::Continue);
        assert_eq!(outcomes[1], Outcome::Continue);
        assert_eq!(outcomes[2], Outcome::stop("reached the limit of 3 events"));
        assert_eq!(counter.count_for_run(1), 2);
        assert_eq!(counter.count_for_run(2), 1);
        assert_eq!(counter.total(), 3);
    }

    #[test]
    fn test_forces_shared_critical_layout() {
        let counter = EventCounter::from_parameters("counter", &ProcessorParameters::new()).unwrap();
        assert_eq!(counter.forced_clone(), Some(false));
        assert_eq!(counter.forced_critical(), Some(true));
    }
}
