// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! One replica of the declared processor chain.
//!
//! A [`Sequence`] is an ordered list of [`SequenceEntry`] handles plus the
//! timing and skip counters accumulated while running events through
//! them. Each Sequence is owned by exactly one worker thread, so its
//! counters need no synchronization. Entries may be shared with other
//! Sequences (singleton processors); a critical entry serializes calls
//! through its own guard.

use crate::engine::worker_pool::{panic_message, Worker};
use crate::errors::{ConfigError, ProcessorError, SequenceError};
use crate::event::{Event, RunHeader};
use crate::observability::messages::processor::ProcessorSkippedEvent;
use crate::observability::messages::StructuredLog;
use crate::traits::{Outcome, ProcessResult, Processor, ProcessorSetup};
use indexmap::IndexMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Wall-clock cost of one processor call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallTiming {
    /// Time spent inside the processor
    pub processor: Duration,
    /// Processor time plus time spent waiting for the critical guard
    pub total: Duration,
}

/// A processor instance as seen by the Sequences that run it.
pub struct SequenceEntry {
    name: String,
    processor: Arc<dyn Processor>,
    guard: Option<Mutex<()>>,
    cloned: bool,
}

impl SequenceEntry {
    pub fn new(name: impl Into<String>, processor: Arc<dyn Processor>, critical: bool, cloned: bool) -> Self {
        Self {
            name: name.into(),
            processor,
            guard: critical.then(|| Mutex::new(())),
            cloned,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn processor(&self) -> &Arc<dyn Processor> {
        &self.processor
    }

    pub fn is_critical(&self) -> bool {
        self.guard.is_some()
    }

    pub fn is_cloned(&self) -> bool {
        self.cloned
    }

    fn lock(&self) -> Option<MutexGuard<'_, ()>> {
        // a poisoned guard only means a lifecycle call panicked; the guard protects no data
        self.guard
            .as_ref()
            .map(|guard| guard.lock().unwrap_or_else(|poisoned| poisoned.into_inner()))
    }

    /// Run one event call under the guard, turning a panic into [`SequenceError::Panicked`].
    ///
    /// The unwind stops here, so the caller still owns the event afterwards.
    fn timed(
        &self,
        call: impl FnOnce(&dyn Processor) -> ProcessResult,
    ) -> (Result<ProcessResult, SequenceError>, CallTiming) {
        let requested = Instant::now();
        let _held = self.lock();
        let started = Instant::now();
        let result = catch_unwind(AssertUnwindSafe(|| call(self.processor.as_ref()))).map_err(|payload| {
            SequenceError::Panicked {
                processor: self.name.clone(),
                message: panic_message(payload.as_ref()),
            }
        });
        let finished = Instant::now();
        let timing = CallTiming {
            processor: finished - started,
            total: finished - requested,
        };
        (result, timing)
    }

    pub fn process_event(&self, event: &mut Event) -> (Result<ProcessResult, SequenceError>, CallTiming) {
        self.timed(|processor| processor.process_event(event))
    }

    pub fn modify_event(&self, event: &mut Event) -> (Result<ProcessResult, SequenceError>, CallTiming) {
        self.timed(|processor| processor.modify_event(event))
    }

    pub fn init(&self, setup: &mut ProcessorSetup<'_>) -> Result<(), ProcessorError> {
        let _held = self.lock();
        self.processor.init(setup)
    }

    pub fn process_run_header(&self, header: &RunHeader) -> Result<(), ProcessorError> {
        let _held = self.lock();
        self.processor.process_run_header(header)
    }

    pub fn modify_run_header(&self, header: &mut RunHeader) -> Result<(), ProcessorError> {
        let _held = self.lock();
        self.processor.modify_run_header(header)
    }

    pub fn end(&self) -> Result<(), ProcessorError> {
        let _held = self.lock();
        self.processor.end()
    }
}

impl std::fmt::Debug for SequenceEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SequenceEntry")
            .field("name", &self.name)
            .field("critical", &self.is_critical())
            .field("cloned", &self.cloned)
            .finish()
    }
}

/// Counters for one processor within one Sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessorStats {
    /// Main-pass calls that completed without a skip
    pub events: u64,
    pub skipped: u64,
    pub processor_time: Duration,
    pub total_time: Duration,
}

impl ProcessorStats {
    fn record(&mut self, timing: CallTiming) {
        self.processor_time += timing.processor;
        self.total_time += timing.total;
    }

    pub fn merge(&mut self, other: &ProcessorStats) {
        self.events += other.events;
        self.skipped += other.skipped;
        self.processor_time += other.processor_time;
        self.total_time += other.total_time;
    }
}

/// Output of running one event through a Sequence.
#[derive(Debug)]
pub struct Processed {
    pub event: Event,
    pub result: Result<(), SequenceError>,
}

#[derive(Debug)]
pub struct Sequence {
    index: usize,
    entries: Vec<Arc<SequenceEntry>>,
    stats: IndexMap<String, ProcessorStats>,
}

impl Sequence {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            entries: Vec::new(),
            stats: IndexMap::new(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Append an entry; names must be unique within the chain.
    pub fn add_entry(&mut self, entry: Arc<SequenceEntry>) -> Result<(), ConfigError> {
        if self.stats.contains_key(entry.name()) {
            return Err(ConfigError::DuplicateActiveProcessor {
                name: entry.name().to_string(),
                count: 2,
            });
        }
        self.stats.insert(entry.name().to_string(), ProcessorStats::default());
        self.entries.push(entry);
        Ok(())
    }

    pub fn entries(&self) -> &[Arc<SequenceEntry>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> &IndexMap<String, ProcessorStats> {
        &self.stats
    }

    /// Run the modify pass, then the main pass, over one event.
    ///
    /// Entries whose guarding condition is false are not called. A skip is
    /// counted and the chain continues; a stop request or failure abandons
    /// the rest of the chain for this event, and so does a panic in
    /// processor code.
    pub fn process_event(&mut self, event: &mut Event) -> Result<(), SequenceError> {
        for entry in &self.entries {
            if !entry.processor().modifies_events() || !condition_holds(entry, event)? {
                continue;
            }
            let (result, timing) = entry.modify_event(event);
            let stats = stat_slot(&mut self.stats, entry.name());
            stats.record(timing);
            handle_outcome(entry, event, stats, result?)?;
        }

        for entry in &self.entries {
            if !condition_holds(entry, event)? {
                continue;
            }
            let (result, timing) = entry.process_event(event);
            let stats = stat_slot(&mut self.stats, entry.name());
            stats.record(timing);
            if matches!(handle_outcome(entry, event, stats, result?)?, Outcome::Continue) {
                stats.events += 1;
            }
        }

        Ok(())
    }
}

impl Worker for Sequence {
    type Input = Event;
    type Output = Processed;

    fn process(&mut self, mut event: Event) -> Processed {
        let result = self.process_event(&mut event);
        Processed { event, result }
    }
}

fn stat_slot<'a>(stats: &'a mut IndexMap<String, ProcessorStats>, name: &str) -> &'a mut ProcessorStats {
    stats.entry(name.to_string()).or_default()
}

fn condition_holds(entry: &SequenceEntry, event: &Event) -> Result<bool, SequenceError> {
    event
        .context()
        .and_then(|ctx| ctx.condition_is_true(entry.name()))
        .map_err(|source| SequenceError::Condition {
            processor: entry.name().to_string(),
            source,
        })
}

/// Count a skip or turn a stop request or failure into the abort reason.
fn handle_outcome(
    entry: &SequenceEntry,
    event: &Event,
    stats: &mut ProcessorStats,
    result: ProcessResult,
) -> Result<Outcome, SequenceError> {
    match result {
        Ok(Outcome::Continue) => Ok(Outcome::Continue),
        Ok(Outcome::Skip) => {
            stats.skipped += 1;
            ProcessorSkippedEvent {
                processor: entry.name(),
                event: event.id(),
            }
            .log();
            Ok(Outcome::Skip)
        }
        Ok(Outcome::Stop { reason }) => Err(SequenceError::StopRequested {
            processor: entry.name().to_string(),
            reason,
        }),
        Err(source) => Err(SequenceError::ProcessorFailed {
            processor: entry.name().to_string(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ConditionTable, EventContext, RandomSeedManager};
    use crate::event::EventId;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Records every call and reacts to configured event numbers.
    struct Scripted {
        name: String,
        calls: AtomicUsize,
        skip_on: Option<u32>,
        fail_on: Option<u32>,
        stop_on: Option<u32>,
        panic_on: Option<u32>,
        modify_skip_on: Option<u32>,
        modifies: bool,
    }

    impl Scripted {
        fn new(name: &str) -> Self {
            Self {
                name: name.to_string(),
                calls: AtomicUsize::new(0),
                skip_on: None,
                fail_on: None,
                stop_on: None,
                panic_on: None,
                modify_skip_on: None,
                modifies: false,
            }
        }
    }

    impl Processor for Scripted {
        fn name(&self) -> &str {
            &self.name
        }

        fn modifies_events(&self) -> bool {
            self.modifies
        }

        fn modify_event(&self, event: &mut Event) -> ProcessResult {
            if self.modify_skip_on == Some(event.event_number()) {
                return Ok(Outcome::Skip);
            }
            event.insert_collection("modified_by", serde_json::json!(self.name));
            event.set_runtime_condition(&self.name, true)?;
            Ok(Outcome::Continue)
        }

        fn process_event(&self, event: &mut Event) -> ProcessResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let number = event.event_number();
            if self.fail_on == Some(number) {
                return Err(ProcessorError::new(format!("bad event {}", number)));
            }
            if self.panic_on == Some(number) {
                panic!("cannot cope with event {}", number);
            }
            if self.stop_on == Some(number) {
                return Ok(Outcome::stop("enough"));
            }
            if self.skip_on == Some(number) {
                return Ok(Outcome::Skip);
            }
            let seen = event
                .collection("seen")
                .and_then(|v| v.as_u64())
                .unwrap_or(0);
            event.insert_collection("seen", serde_json::json!(seen + 1));
            Ok(Outcome::Continue)
        }
    }

    fn sequence_of(processors: Vec<Arc<Scripted>>) -> Sequence {
        let mut sequence = Sequence::new(0);
        for processor in processors {
            let name = processor.name.clone();
            sequence
                .add_entry(Arc::new(SequenceEntry::new(name, processor, false, true)))
                .unwrap();
        }
        sequence
    }

    fn event_with_context(number: u32, table: ConditionTable) -> Event {
        let mut event = Event::new(1, number);
        let context = EventContext::new(event.id(), &RandomSeedManager::new(0), Arc::new(table), false);
        event.attach_context(context);
        event
    }

    #[test]
    fn test_entries_run_in_declared_order() {
        let a = Arc::new(Scripted::new("a"));
        let b = Arc::new(Scripted::new("b"));
        let mut sequence = sequence_of(vec![a.clone(), b.clone()]);
        let mut event = event_with_context(1, ConditionTable::new());

        sequence.process_event(&mut event).unwrap();

        assert_eq!(event.collection("seen"), Some(&serde_json::json!(2)));
        assert_eq!(sequence.stats()["a"].events, 1);
        assert_eq!(sequence.stats()["b"].events, 1);
    }

    #[test]
    fn test_skip_counts_once_and_chain_continues() {
        let mut skipper = Scripted::new("skipper");
        skipper.skip_on = Some(2);
        let skipper = Arc::new(skipper);
        let after = Arc::new(Scripted::new("after"));
        let mut sequence = sequence_of(vec![skipper, after.clone()]);

        for number in 1..=3 {
            let mut event = event_with_context(number, ConditionTable::new());
            sequence.process_event(&mut event).unwrap();
        }

        assert_eq!(sequence.stats()["skipper"].skipped, 1);
        assert_eq!(sequence.stats()["skipper"].events, 2);
        assert_eq!(sequence.stats()["after"].skipped, 0);
        assert_eq!(after.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_failure_aborts_rest_of_chain() {
        let mut failing = Scripted::new("failing");
        failing.fail_on = Some(5);
        let after = Arc::new(Scripted::new("after"));
        let mut sequence = sequence_of(vec![Arc::new(failing), after.clone()]);
        let mut event = event_with_context(5, ConditionTable::new());

        let err = sequence.process_event(&mut event).unwrap_err();

        assert_eq!(
            err,
            SequenceError::ProcessorFailed {
                processor: "failing".to_string(),
                source: ProcessorError::new("bad event 5"),
            }
        );
        assert_eq!(after.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_stop_request_is_reported() {
        let mut stopper = Scripted::new("stopper");
        stopper.stop_on = Some(1);
        let mut sequence = sequence_of(vec![Arc::new(stopper)]);
        let mut event = event_with_context(1, ConditionTable::new());

        assert_eq!(
            sequence.process_event(&mut event),
            Err(SequenceError::StopRequested {
                processor: "stopper".to_string(),
                reason: "enough".to_string(),
            })
        );
    }

    #[test]
    fn test_false_condition_skips_entry_without_counting() {
        let mut selector = Scripted::new("selector");
        selector.modifies = true;
        let guarded = Arc::new(Scripted::new("guarded"));
        let vetoed = Arc::new(Scripted::new("vetoed"));
        let mut sequence = sequence_of(vec![Arc::new(selector), guarded.clone(), vetoed.clone()]);

        let mut table = ConditionTable::new();
        table.add("guarded", "selector").unwrap();
        table.add("vetoed", "!selector").unwrap();
        let mut event = event_with_context(1, table);

        sequence.process_event(&mut event).unwrap();

        assert_eq!(event.collection("modified_by"), Some(&serde_json::json!("selector")));
        assert_eq!(guarded.calls.load(Ordering::SeqCst), 1);
        assert_eq!(vetoed.calls.load(Ordering::SeqCst), 0);
        assert_eq!(sequence.stats()["vetoed"], ProcessorStats::default());
    }

    #[test]
    fn test_unset_condition_is_an_error() {
        let guarded = Arc::new(Scripted::new("guarded"));
        let mut sequence = sequence_of(vec![guarded]);
        let mut table = ConditionTable::new();
        table.add("guarded", "never_set").unwrap();
        let mut event = event_with_context(1, table);

        let err = sequence.process_event(&mut event).unwrap_err();
        assert!(matches!(err, SequenceError::Condition { ref processor, .. } if processor == "guarded"));
    }

    #[test]
    fn test_duplicate_entry_name_is_rejected() {
        let twice = Arc::new(Scripted::new("twice"));
        let mut sequence = sequence_of(vec![twice.clone()]);
        let err = sequence
            .add_entry(Arc::new(SequenceEntry::new("twice", twice, false, true)))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::DuplicateActiveProcessor {
                name: "twice".to_string(),
                count: 2
            }
        );
    }

    #[test]
    fn test_panic_keeps_event_and_names_processor() {
        let before = Arc::new(Scripted::new("before"));
        let mut fragile = Scripted::new("fragile");
        fragile.panic_on = Some(4);
        let after = Arc::new(Scripted::new("after"));
        let mut sequence = sequence_of(vec![before, Arc::new(fragile), after.clone()]);
        let event = event_with_context(4, ConditionTable::new());

        let Processed { event, result } = sequence.process(event);

        assert_eq!(
            result,
            Err(SequenceError::Panicked {
                processor: "fragile".to_string(),
                message: "cannot cope with event 4".to_string(),
            })
        );
        assert_eq!(event.id(), EventId::new(1, 4));
        assert_eq!(event.collection("seen"), Some(&serde_json::json!(1)));
        assert_eq!(after.calls.load(Ordering::SeqCst), 0);

        // the Sequence stays usable for the next event
        let mut next = event_with_context(5, ConditionTable::new());
        sequence.process_event(&mut next).unwrap();
        assert_eq!(next.collection("seen"), Some(&serde_json::json!(3)));
    }

    #[test]
    fn test_skip_in_modify_pass_leaves_main_pass_running() {
        let mut selector = Scripted::new("selector");
        selector.modifies = true;
        selector.modify_skip_on = Some(2);
        let mut sequence = sequence_of(vec![Arc::new(selector)]);

        let mut skipped = event_with_context(2, ConditionTable::new());
        sequence.process_event(&mut skipped).unwrap();
        assert!(skipped.collection("modified_by").is_none());
        assert_eq!(skipped.collection("seen"), Some(&serde_json::json!(1)));

        let mut modified = event_with_context(3, ConditionTable::new());
        sequence.process_event(&mut modified).unwrap();
        assert_eq!(modified.collection("modified_by"), Some(&serde_json::json!("selector")));

        let stats = sequence.stats()["selector"];
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.events, 2);
    }
}
