// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::{Config, ProcessorRegistry, PreparedChain, RuntimeBuilder};
use crate::context::EventContext;
use crate::engine::sequence::Processed;
use crate::errors::{SchedulerError, SequenceError};
use crate::event::{Event, RunHeader};
use crate::observability::messages::processor::ProcessorEndFailed;
use crate::observability::messages::scheduler::{
    RunBoundaryReached, SchedulerConfigured, SchedulerFinished,
};
use crate::observability::messages::StructuredLog;
use crate::scheduler::{settle, RunReport, SchedulerState};
use crate::traits::Scheduler;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

const STRATEGY: &str = "sequential";

/// Sequential scheduler - one Sequence, processed inline.
///
/// `push_event` runs the whole chain before returning. The finished event
/// occupies the single slot until it is collected, so callers see the same
/// push/pop/backpressure protocol as with the parallel scheduler.
///
/// # Examples
///
/// ```
/// use the_sequencer::config::{Config, ProcessorConfig, ProcessorRegistry};
/// use the_sequencer::event::Event;
/// use the_sequencer::scheduler::SimpleScheduler;
/// use the_sequencer::traits::Scheduler;
///
/// let mut config = Config::new(vec!["smear".to_string()]);
/// config
///     .processors
///     .insert("smear".to_string(), ProcessorConfig::new("seeded_smear"));
///
/// let mut scheduler = SimpleScheduler::new();
/// scheduler.init(&config, &ProcessorRegistry::with_builtins()).unwrap();
///
/// scheduler.push_event(Event::new(1, 1)).unwrap();
/// assert_eq!(scheduler.free_slots(), 0);
///
/// let finished = scheduler.pop_finished_events().unwrap();
/// assert!(finished[0].collection("smear").is_some());
///
/// let report = scheduler.end().unwrap();
/// assert_eq!(report.events, 1);
/// ```
pub struct SimpleScheduler {
    state: SchedulerState,
    runtime: Option<PreparedChain>,
    finished: Vec<Event>,
    failures: VecDeque<SchedulerError>,
    first_event: bool,
    events: u64,
    started: Option<Instant>,
}

impl SimpleScheduler {
    pub fn new() -> Self {
        Self {
            state: SchedulerState::Unconfigured,
            runtime: None,
            finished: Vec::new(),
            failures: VecDeque::new(),
            first_event: true,
            events: 0,
            started: None,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }
}

impl Default for SimpleScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for SimpleScheduler {
    fn name(&self) -> &'static str {
        STRATEGY
    }

    fn init(&mut self, config: &Config, registry: &ProcessorRegistry) -> Result<(), SchedulerError> {
        self.state.require(SchedulerState::Unconfigured, "configure")?;
        self.state = SchedulerState::Configuring;

        let runtime = match RuntimeBuilder::prepare(config, registry, 1) {
            Ok(runtime) => runtime,
            Err(e) => {
                self.state = SchedulerState::Stopped;
                return Err(e.into());
            }
        };

        SchedulerConfigured {
            strategy: STRATEGY,
            concurrency: 1,
            queue_capacity: 1,
            processors: runtime.chain.unique_entries().len(),
        }
        .log();

        self.runtime = Some(runtime);
        self.started = Some(Instant::now());
        self.state = SchedulerState::Ready;
        Ok(())
    }

    fn process_run_header(&mut self, header: &mut RunHeader) -> Result<(), SchedulerError> {
        self.state.require(SchedulerState::Ready, "process a run header")?;
        let runtime = self
            .runtime
            .as_ref()
            .ok_or_else(|| self.state.reject("process a run header"))?;

        let run_number = header.run_number;
        let failed = |source: SequenceError| SchedulerError::RunHeaderFailed { run_number, source };
        runtime.chain.modify_run_header(header).map_err(failed)?;
        runtime.chain.process_run_header(header).map_err(failed)?;

        RunBoundaryReached {
            run_number,
            drain_wait: Duration::ZERO,
        }
        .log();
        Ok(())
    }

    fn push_event(&mut self, mut event: Event) -> Result<(), SchedulerError> {
        self.state.require(SchedulerState::Ready, "push events")?;
        if self.free_slots() == 0 {
            return Err(SchedulerError::Backpressure {
                event: Box::new(event),
            });
        }

        let state = self.state;
        let runtime = self.runtime.as_mut().ok_or_else(|| state.reject("push events"))?;
        let id = event.id();
        event.attach_context(EventContext::new(
            id,
            &runtime.seeds,
            Arc::clone(&runtime.conditions),
            self.first_event,
        ));
        self.first_event = false;
        self.events += 1;

        let sequence = runtime
            .chain
            .sequence_mut(0)
            .ok_or_else(|| state.reject("push events"))?;
        // panics in processor code are caught per call, the event stays ours
        let result = sequence.process_event(&mut event);
        settle(
            Processed { event, result },
            &mut self.finished,
            &mut self.failures,
        );
        Ok(())
    }

    fn pop_finished_events(&mut self) -> Result<Vec<Event>, SchedulerError> {
        if !self.state.can_collect() {
            return Err(self.state.reject("collect events"));
        }
        if let Some(err) = self.failures.pop_front() {
            return Err(err);
        }
        Ok(std::mem::take(&mut self.finished))
    }

    fn free_slots(&self) -> usize {
        let idle = self.finished.is_empty() && self.failures.is_empty();
        usize::from(self.state == SchedulerState::Ready && idle)
    }

    fn pending(&self) -> usize {
        self.finished.len() + self.failures.len()
    }

    fn end(&mut self) -> Result<RunReport, SchedulerError> {
        self.state.require(SchedulerState::Ready, "end")?;
        self.state = SchedulerState::Draining;

        let runtime = self.runtime.as_ref().ok_or_else(|| self.state.reject("end"))?;
        for error in runtime.chain.end_all() {
            ProcessorEndFailed { error: &error }.log();
        }

        let wall_time = self.started.map(|t| t.elapsed()).unwrap_or_default();
        let report = RunReport::from_sequences(
            STRATEGY,
            1,
            runtime.chain.sequences(),
            self.events,
            wall_time,
        );

        SchedulerFinished {
            strategy: STRATEGY,
            events: self.events,
            concurrency: 1,
            wall_time,
            speedup: report.speedup,
        }
        .log();

        self.state = SchedulerState::Stopped;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProcessorConfig;
    use crate::config::ProcessorParameters;
    use serde_json::json;

    fn crunch_config() -> Config {
        let mut config = Config::new(vec!["selector".to_string(), "crunch".to_string()]);
        let mut selector = ProcessorConfig::new("event_selector");
        selector.parameters = ProcessorParameters::new().with("events", json!([[1, 2]]));
        config.processors.insert("selector".to_string(), selector);
        let mut crunch = ProcessorConfig::new("cpu_crunch");
        crunch.parameters = ProcessorParameters::new().with("crunch_ms", json!(0));
        config.processors.insert("crunch".to_string(), crunch);
        config
            .conditions
            .insert("crunch".to_string(), "selector".to_string());
        config
    }

    fn ready() -> SimpleScheduler {
        let mut scheduler = SimpleScheduler::new();
        scheduler
            .init(&crunch_config(), &ProcessorRegistry::with_builtins())
            .unwrap();
        scheduler
    }

    #[test]
    fn test_push_before_init_is_rejected() {
        let mut scheduler = SimpleScheduler::new();
        let err = scheduler.push_event(Event::new(1, 1)).unwrap_err();
        assert!(matches!(err, SchedulerError::InvalidState { .. }));
    }

    #[test]
    fn test_second_push_hits_backpressure_until_popped() {
        let mut scheduler = ready();
        scheduler.push_event(Event::new(1, 1)).unwrap();

        let err = scheduler.push_event(Event::new(1, 2)).unwrap_err();
        let event = err.into_event().unwrap();
        assert_eq!(event.event_number(), 2);
        assert!(!event.has_context());

        assert_eq!(scheduler.pending(), 1);
        assert_eq!(scheduler.pop_finished_events().unwrap().len(), 1);
        assert_eq!(scheduler.free_slots(), 1);
        scheduler.push_event(event).unwrap();
        assert_eq!(scheduler.pop_finished_events().unwrap().len(), 1);
    }

    #[test]
    fn test_condition_gates_processor() {
        let mut scheduler = ready();
        let mut finished = Vec::new();
        for n in 1..=3 {
            scheduler.push_event(Event::new(1, n)).unwrap();
            finished.extend(scheduler.pop_finished_events().unwrap());
        }

        let crunched: Vec<u32> = finished
            .iter()
            .filter(|e| e.collection("crunch").is_some())
            .map(|e| e.event_number())
            .collect();
        assert_eq!(crunched, vec![2]);

        let report = scheduler.end().unwrap();
        assert_eq!(report.processor("selector").unwrap().events, 3);
        assert_eq!(report.processor("crunch").unwrap().events, 1);
    }

    #[test]
    fn test_end_twice_is_rejected() {
        let mut scheduler = ready();
        scheduler.end().unwrap();
        assert!(matches!(
            scheduler.end(),
            Err(SchedulerError::InvalidState { state: "stopped", .. })
        ));
        assert_eq!(scheduler.free_slots(), 0);
    }

    #[test]
    fn test_failed_init_stops_scheduler() {
        let mut scheduler = SimpleScheduler::new();
        let config = Config::new(vec!["ghost".to_string()]);
        let err = scheduler
            .init(&config, &ProcessorRegistry::with_builtins())
            .unwrap_err();
        assert!(matches!(err, SchedulerError::Config(_)));
        assert_eq!(scheduler.state(), SchedulerState::Stopped);
    }
}
