// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The N replicas of the processor chain plus the set of unique entries.
//!
//! For every declared processor the [`SuperSequence`] decides between two
//! layouts:
//!
//! * **cloned**: each Sequence gets a private instance and its own entry
//! * **singleton**: one instance and one entry, appended to every Sequence
//!
//! A singleton declared `critical` serializes calls through the entry's
//! guard. Chain-wide operations (init, run headers, end) walk the unique
//! entries, so a singleton sees each of them exactly once no matter how
//! many Sequences share it.

use crate::context::RandomSeedManager;
use crate::engine::sequence::{Sequence, SequenceEntry};
use crate::errors::{ConfigError, SequenceError};
use crate::event::RunHeader;
use crate::observability::messages::processor::ProcessorInstantiated;
use crate::observability::messages::StructuredLog;
use crate::traits::{Processor, ProcessorSetup};
use std::sync::Arc;

/// Processors are cloned unless they or their declaration say otherwise.
pub const DEFAULT_CLONE: bool = true;
pub const DEFAULT_CRITICAL: bool = false;

/// Declared clone/critical overrides for one processor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChainOptions {
    pub clone: Option<bool>,
    pub critical: Option<bool>,
}

#[derive(Debug)]
pub struct SuperSequence {
    sequences: Vec<Sequence>,
    unique: Vec<Arc<SequenceEntry>>,
}

impl SuperSequence {
    /// Create `size` empty Sequences (at least one).
    pub fn new(size: usize) -> Self {
        Self {
            sequences: (0..size.max(1)).map(Sequence::new).collect(),
            unique: Vec::new(),
        }
    }

    pub fn size(&self) -> usize {
        self.sequences.len()
    }

    /// Instantiate a declared processor and append it to every Sequence.
    ///
    /// `create` is called once for a singleton and once per Sequence for a
    /// cloned processor. The first instance is asked for forced options
    /// before any further instance is built.
    pub fn add_processor<F>(
        &mut self,
        name: &str,
        declared: ChainOptions,
        mut create: F,
    ) -> Result<(), ConfigError>
    where
        F: FnMut() -> Result<Box<dyn Processor>, ConfigError>,
    {
        if self.unique.iter().any(|entry| entry.name() == name) {
            return Err(ConfigError::DuplicateActiveProcessor {
                name: name.to_string(),
                count: 2,
            });
        }

        let first: Arc<dyn Processor> = Arc::from(create()?);
        let clone = resolve_option(name, "clone", first.forced_clone(), declared.clone, DEFAULT_CLONE)?;
        let critical = resolve_option(
            name,
            "critical",
            first.forced_critical(),
            declared.critical,
            DEFAULT_CRITICAL,
        )?;

        if clone {
            // build every instance first so a failed constructor leaves no Sequence half-extended
            let mut entries = Vec::with_capacity(self.sequences.len());
            entries.push(Arc::new(SequenceEntry::new(name, first, critical, true)));
            while entries.len() < self.sequences.len() {
                let processor: Arc<dyn Processor> = Arc::from(create()?);
                entries.push(Arc::new(SequenceEntry::new(name, processor, critical, true)));
            }
            for (sequence, entry) in self.sequences.iter_mut().zip(&entries) {
                sequence.add_entry(Arc::clone(entry))?;
            }
            self.unique.extend(entries);
        } else {
            let entry = Arc::new(SequenceEntry::new(name, first, critical, false));
            for sequence in &mut self.sequences {
                sequence.add_entry(Arc::clone(&entry))?;
            }
            self.unique.push(entry);
        }

        ProcessorInstantiated {
            processor: name,
            instances: if clone { self.sequences.len() } else { 1 },
            cloned: clone,
            critical,
        }
        .log();
        Ok(())
    }

    /// Every distinct processor instance, in declaration order.
    pub fn unique_entries(&self) -> &[Arc<SequenceEntry>] {
        &self.unique
    }

    pub fn sequences(&self) -> &[Sequence] {
        &self.sequences
    }

    pub fn sequence(&self, index: usize) -> Option<&Sequence> {
        self.sequences.get(index)
    }

    pub fn sequence_mut(&mut self, index: usize) -> Option<&mut Sequence> {
        self.sequences.get_mut(index)
    }

    /// Move the Sequences out, e.g. into worker threads.
    pub fn take_sequences(&mut self) -> Vec<Sequence> {
        std::mem::take(&mut self.sequences)
    }

    /// Put Sequences back after the workers are done with them.
    pub fn restore_sequences(&mut self, mut sequences: Vec<Sequence>) {
        sequences.sort_by_key(Sequence::index);
        self.sequences = sequences;
    }

    /// Initialize each unique instance once.
    pub fn init_all(&self, seeds: &mut RandomSeedManager) -> Result<(), ConfigError> {
        for entry in &self.unique {
            let mut setup = ProcessorSetup::new(entry.name(), seeds);
            entry.init(&mut setup).map_err(|e| ConfigError::ProcessorInit {
                name: entry.name().to_string(),
                reason: e.message,
            })?;
        }
        Ok(())
    }

    pub fn modify_run_header(&self, header: &mut RunHeader) -> Result<(), SequenceError> {
        for entry in &self.unique {
            entry
                .modify_run_header(header)
                .map_err(|source| SequenceError::ProcessorFailed {
                    processor: entry.name().to_string(),
                    source,
                })?;
        }
        Ok(())
    }

    pub fn process_run_header(&self, header: &RunHeader) -> Result<(), SequenceError> {
        for entry in &self.unique {
            entry
                .process_run_header(header)
                .map_err(|source| SequenceError::ProcessorFailed {
                    processor: entry.name().to_string(),
                    source,
                })?;
        }
        Ok(())
    }

    /// Shut down each unique instance once.
    ///
    /// Every instance gets its `end` call even when an earlier one fails;
    /// all failures are returned.
    pub fn end_all(&self) -> Vec<SequenceError> {
        self.unique
            .iter()
            .filter_map(|entry| {
                entry.end().err().map(|source| SequenceError::ProcessorFailed {
                    processor: entry.name().to_string(),
                    source,
                })
            })
            .collect()
    }
}

fn resolve_option(
    name: &str,
    option: &str,
    forced: Option<bool>,
    declared: Option<bool>,
    default: bool,
) -> Result<bool, ConfigError> {
    match (forced, declared) {
        (Some(forced), Some(declared)) if forced != declared => Err(ConfigError::ForcedOptionConflict {
            name: name.to_string(),
            option: option.to_string(),
            forced,
            declared,
        }),
        (Some(forced), _) => Ok(forced),
        (None, Some(declared)) => Ok(declared),
        (None, None) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ProcessorError;
    use crate::event::Event;
    use crate::traits::{Outcome, ProcessResult};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Lifecycle {
        created: AtomicUsize,
        init: AtomicUsize,
        run_headers: AtomicUsize,
        end: AtomicUsize,
    }

    struct Tracked {
        lifecycle: Arc<Lifecycle>,
        forced_clone: Option<bool>,
        forced_critical: Option<bool>,
    }

    impl Processor for Tracked {
        fn name(&self) -> &str {
            "tracked"
        }

        fn init(&self, _setup: &mut ProcessorSetup<'_>) -> Result<(), ProcessorError> {
            self.lifecycle.init.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn process_run_header(&self, _header: &RunHeader) -> Result<(), ProcessorError> {
            self.lifecycle.run_headers.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn process_event(&self, _event: &mut Event) -> ProcessResult {
            Ok(Outcome::Continue)
        }

        fn end(&self) -> Result<(), ProcessorError> {
            self.lifecycle.end.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn forced_clone(&self) -> Option<bool> {
            self.forced_clone
        }

        fn forced_critical(&self) -> Option<bool> {
            self.forced_critical
        }
    }

    fn factory(
        lifecycle: &Arc<Lifecycle>,
        forced_clone: Option<bool>,
        forced_critical: Option<bool>,
    ) -> impl FnMut() -> Result<Box<dyn Processor>, ConfigError> {
        let lifecycle = Arc::clone(lifecycle);
        move || {
            lifecycle.created.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(Tracked {
                lifecycle: Arc::clone(&lifecycle),
                forced_clone,
                forced_critical,
            }) as Box<dyn Processor>)
        }
    }

    #[test]
    fn test_cloned_processor_gets_one_instance_per_sequence() {
        let lifecycle = Arc::new(Lifecycle::default());
        let mut chain = SuperSequence::new(4);
        chain
            .add_processor("tracked", ChainOptions::default(), factory(&lifecycle, None, None))
            .unwrap();

        assert_eq!(lifecycle.created.load(Ordering::SeqCst), 4);
        assert_eq!(chain.unique_entries().len(), 4);
        let first = &chain.sequence(0).unwrap().entries()[0];
        let second = &chain.sequence(1).unwrap().entries()[0];
        assert!(!Arc::ptr_eq(first.processor(), second.processor()));
        assert!(first.is_cloned());
        assert!(!first.is_critical());

        chain.init_all(&mut RandomSeedManager::new(0)).unwrap();
        assert_eq!(lifecycle.init.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_forced_singleton_is_shared_and_guarded() {
        let lifecycle = Arc::new(Lifecycle::default());
        let mut chain = SuperSequence::new(3);
        chain
            .add_processor(
                "tracked",
                ChainOptions::default(),
                factory(&lifecycle, Some(false), Some(true)),
            )
            .unwrap();

        assert_eq!(lifecycle.created.load(Ordering::SeqCst), 1);
        assert_eq!(chain.unique_entries().len(), 1);

        let entries: Vec<_> = chain
            .sequences()
            .iter()
            .map(|sequence| Arc::clone(&sequence.entries()[0]))
            .collect();
        assert_eq!(entries.len(), 3);
        for entry in &entries {
            assert!(Arc::ptr_eq(entry, &entries[0]));
            assert!(entry.is_critical());
        }

        let mut header = RunHeader::new(1);
        chain.init_all(&mut RandomSeedManager::new(0)).unwrap();
        chain.modify_run_header(&mut header).unwrap();
        chain.process_run_header(&header).unwrap();
        assert!(chain.end_all().is_empty());

        assert_eq!(lifecycle.init.load(Ordering::SeqCst), 1);
        assert_eq!(lifecycle.run_headers.load(Ordering::SeqCst), 1);
        assert_eq!(lifecycle.end.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_declaration_contradicting_forced_option_is_rejected() {
        let lifecycle = Arc::new(Lifecycle::default());
        let mut chain = SuperSequence::new(2);
        let declared = ChainOptions {
            clone: Some(true),
            critical: None,
        };

        let err = chain
            .add_processor("tracked", declared, factory(&lifecycle, Some(false), None))
            .unwrap_err();

        assert_eq!(
            err,
            ConfigError::ForcedOptionConflict {
                name: "tracked".to_string(),
                option: "clone".to_string(),
                forced: false,
                declared: true,
            }
        );
        assert!(chain.unique_entries().is_empty());
    }

    #[test]
    fn test_declared_options_apply_when_nothing_is_forced() {
        let lifecycle = Arc::new(Lifecycle::default());
        let mut chain = SuperSequence::new(2);
        let declared = ChainOptions {
            clone: Some(false),
            critical: Some(false),
        };
        chain
            .add_processor("tracked", declared, factory(&lifecycle, None, None))
            .unwrap();

        let entry = &chain.unique_entries()[0];
        assert!(!entry.is_cloned());
        assert!(!entry.is_critical());
        assert_eq!(lifecycle.created.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_same_name_twice_is_rejected() {
        let lifecycle = Arc::new(Lifecycle::default());
        let mut chain = SuperSequence::new(2);
        chain
            .add_processor("tracked", ChainOptions::default(), factory(&lifecycle, None, None))
            .unwrap();
        let err = chain
            .add_processor("tracked", ChainOptions::default(), factory(&lifecycle, None, None))
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateActiveProcessor { .. }));
    }

    #[test]
    fn test_sequences_can_be_taken_and_restored() {
        let lifecycle = Arc::new(Lifecycle::default());
        let mut chain = SuperSequence::new(3);
        chain
            .add_processor("tracked", ChainOptions::default(), factory(&lifecycle, None, None))
            .unwrap();

        let mut taken = chain.take_sequences();
        assert_eq!(chain.size(), 0);
        taken.reverse();
        chain.restore_sequences(taken);

        let indices: Vec<usize> = chain.sequences().iter().map(Sequence::index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_failed_clone_construction_leaves_chain_untouched() {
        let lifecycle = Arc::new(Lifecycle::default());
        let mut chain = SuperSequence::new(3);
        chain
            .add_processor("first", ChainOptions::default(), factory(&lifecycle, None, None))
            .unwrap();

        let mut calls = 0;
        let err = chain
            .add_processor("flaky", ChainOptions::default(), || {
                calls += 1;
                if calls == 2 {
                    return Err(ConfigError::InvalidParameter {
                        processor: "flaky".to_string(),
                        key: "device".to_string(),
                        reason: "busy".to_string(),
                    });
                }
                Ok(Box::new(Tracked {
                    lifecycle: Arc::new(Lifecycle::default()),
                    forced_clone: None,
                    forced_critical: None,
                }) as Box<dyn Processor>)
            })
            .unwrap_err();

        assert!(matches!(err, ConfigError::InvalidParameter { .. }));
        assert_eq!(chain.unique_entries().len(), 3);
        assert!(chain.sequences().iter().all(|sequence| sequence.len() == 1));

        // the name was never taken, so a later attempt succeeds
        chain
            .add_processor("flaky", ChainOptions::default(), factory(&lifecycle, None, None))
            .unwrap();
        assert!(chain.sequences().iter().all(|sequence| sequence.len() == 2));
    }
}
