// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Built-in processors.
//!
//! These cover the usual plumbing needs of a processing run and double as
//! reference implementations of the [`crate::traits::Processor`] contract:
//!
//! * `cpu_crunch` - burns a configurable amount of CPU per event
//! * `event_selector` - flags a configured list of events through a runtime condition
//! * `event_counter` - shared, critical event counter that can end the run early
//! * `seeded_smear` - draws a reproducible value from its per-event random seed

pub mod cpu_crunch;
pub mod event_counter;
pub mod event_selector;
pub mod seeded_smear;

pub use cpu_crunch::CpuCrunch;
pub use event_counter::EventCounter;
pub use event_selector::EventSelector;
pub use seeded_smear::SeededSmear;

use crate::config::ProcessorRegistry;
use crate::traits::Processor;

/// Add every built-in type to `registry`.
pub fn register_builtins(registry: &mut ProcessorRegistry) {
    registry.register(cpu_crunch::TYPE_NAME, |name, params| {
        Ok(Box::new(CpuCrunch::from_parameters(name, params)?) as Box<dyn Processor>)
    });
    registry.register(event_selector::TYPE_NAME, |name, params| {
        Ok(Box::new(EventSelector::from_parameters(name, params)?) as Box<dyn Processor>)
    });
    registry.register(event_counter::TYPE_NAME, |name, params| {
        Ok(Box::new(EventCounter::from_parameters(name, params)?) as Box<dyn Processor>)
    });
    registry.register(seeded_smear::TYPE_NAME, |name, params| {
        Ok(Box::new(SeededSmear::from_parameters(name, params)?) as Box<dyn Processor>)
    });
}
