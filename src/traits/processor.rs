// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::context::RandomSeedManager;
use crate::errors::{ConfigError, ProcessorError};
use crate::event::{Event, RunHeader};

/// Result of one processor call on one event.
///
/// Faults travel through the `Err` arm; expected control flow through
/// [`Outcome`].
pub type ProcessResult = Result<Outcome, ProcessorError>;

/// What the Sequence should do after a processor returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Carry on with the next processor
    Continue,
    /// This processor declines to produce output for this event; the rest of the chain still runs
    Skip,
    /// End the whole run gracefully after draining in-flight events
    Stop { reason: String },
}

impl Outcome {
    pub fn stop(reason: impl Into<String>) -> Self {
        Outcome::Stop {
            reason: reason.into(),
        }
    }
}

/// Services available to a processor during its one-time initialization.
pub struct ProcessorSetup<'a> {
    name: &'a str,
    seeds: &'a mut RandomSeedManager,
}

impl<'a> ProcessorSetup<'a> {
    pub(crate) fn new(name: &'a str, seeds: &'a mut RandomSeedManager) -> Self {
        Self { name, seeds }
    }

    /// Declared name of the processor being initialized.
    pub fn name(&self) -> &str {
        self.name
    }

    /// Reserve a per-event random seed for this processor.
    ///
    /// Fails once event processing has started.
    pub fn register_random_seeds(&mut self) -> Result<(), ConfigError> {
        self.seeds.register(self.name)
    }
}

/// One named stage of the processor chain.
///
/// Implementations are shared across worker threads: a singleton is called
/// from every Sequence (serialized by a guard when declared critical) and a
/// cloned processor is only ever called from its own Sequence. Either way
/// the methods take `&self`, and per-instance state lives behind interior
/// mutability.
pub trait Processor: Send + Sync {
    /// Declared name; also the processor's runtime-condition and seed namespace.
    fn name(&self) -> &str;

    /// Called once per instance before any event.
    fn init(&self, _setup: &mut ProcessorSetup<'_>) -> Result<(), ProcessorError> {
        Ok(())
    }

    /// Called once per instance at each run boundary, with no events in flight.
    fn process_run_header(&self, _header: &RunHeader) -> Result<(), ProcessorError> {
        Ok(())
    }

    /// Mutating counterpart of `process_run_header`, delivered first.
    fn modify_run_header(&self, _header: &mut RunHeader) -> Result<(), ProcessorError> {
        Ok(())
    }

    /// Whether `modify_event` takes part in the modify pass.
    fn modifies_events(&self) -> bool {
        false
    }

    fn modify_event(&self, _event: &mut Event) -> ProcessResult {
        Ok(Outcome::Continue)
    }

    /// Main per-event work.
    fn process_event(&self, event: &mut Event) -> ProcessResult;

    /// Called once per instance at shutdown.
    fn end(&self) -> Result<(), ProcessorError> {
        Ok(())
    }

    /// A fixed `clone` value the declaration may not override.
    fn forced_clone(&self) -> Option<bool> {
        None
    }

    /// A fixed `critical` value the declaration may not override.
    fn forced_critical(&self) -> Option<bool> {
        None
    }
}
