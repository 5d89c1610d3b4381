// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::ProcessorParameters;
use crate::errors::{ConfigError, ProcessorError};
use crate::event::Event;
use crate::traits::{Outcome, ProcessResult, Processor, ProcessorSetup};
use std::hint::black_box;
use std::time::{Duration, Instant};

pub const TYPE_NAME: &str = "cpu_crunch";

/// Burns CPU for a fixed time per event, optionally plus a seeded jitter.
///
/// # Parameters
/// * `crunch_ms` - base crunch time per event (default 10)
/// * `jitter_ms` - upper bound of an extra, per-event reproducible crunch time (default 0)
///
/// The time actually spent is written to the collection named after the processor.
pub struct CpuCrunch {
    name: String,
    crunch: Duration,
    jitter_ms: u64,
}

impl CpuCrunch {
    pub fn new(name: impl Into<String>, crunch: Duration, jitter_ms: u64) -> Self {
        Self {
            name: name.into(),
            crunch,
            jitter_ms,
        }
    }

    pub fn from_parameters(name: &str, params: &ProcessorParameters) -> Result<Self, ConfigError> {
        let crunch_ms: u64 = params.get_or(name, "crunch_ms", 10)?;
        let jitter_ms: u64 = params.get_or(name, "jitter_ms", 0)?;
        Ok(Self::new(name, Duration::from_millis(crunch_ms), jitter_ms))
    }

    fn crunch_time(&self, event: &Event) -> Result<Duration, ProcessorError> {
        if self.jitter_ms == 0 {
            return Ok(self.crunch);
        }
        let seed = event.random_seed(&self.name)?;
        let extra = u64::from(seed) % self.jitter_ms.saturating_add(1);
        Ok(self.crunch.saturating_add(Duration::from_millis(extra)))
    }
}

impl Processor for CpuCrunch {
    fn name(&self) -> &str {
        &self.name
    }

    fn init(&self, setup: &mut ProcessorSetup<'_>) -> Result<(), ProcessorError> {
        if self.jitter_ms > 0 {
            setup
                .register_random_seeds()
                .map_err(|e| ProcessorError::new(e.to_string()))?;
        }
        Ok(())
    }

    fn process_event(&self, event: &mut Event) -> ProcessResult {
        let target = self.crunch_time(event)?;
        let started = Instant::now();
        let mut x = 2.0_f64;
        while started.elapsed() < target {
            x = black_box(x.sqrt() + 1.0);
        }
        event.insert_collection(&self.name, serde_json::json!(target.as_millis() as u64));
        Ok(Outcome::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crunches_at_least_configured_time() {
        let params = ProcessorParameters::new().with("crunch_ms", 5);
        let crunch = CpuCrunch::from_parameters("crunch", &params).unwrap();
        let mut event = Event::new(1, 1);

        let started = Instant::now();
        assert_eq!(crunch.process_event(&mut event), Ok(Outcome::Continue));
        assert!(started.elapsed() >= Duration::from_millis(5));
        assert_eq!(event.collection("crunch"), Some(&serde_json::json!(5)));
    }

    #[test]
    fn test_jitter_requires_a_seed() {
        let crunch = CpuCrunch::new("crunch", Duration::ZERO, 3);
        let mut event = Event::new(1, 1);
        assert!(crunch.process_event(&mut event).is_err());
    }

    #[test]
    fn test_largest_jitter_bound_stays_within_seed_range() {
        use crate::context::{ConditionTable, EventContext, RandomSeedManager};
        use std::sync::Arc;

        let crunch = CpuCrunch::new("crunch", Duration::from_millis(2), u64::MAX);
        let mut seeds = RandomSeedManager::new(7);
        seeds.register("crunch").unwrap();
        let mut event = Event::new(1, 1);
        event.attach_context(EventContext::new(
            event.id(),
            &seeds,
            Arc::new(ConditionTable::new()),
            true,
        ));

        let seed = event.random_seed("crunch").unwrap();
        assert_eq!(
            crunch.crunch_time(&event).unwrap(),
            Duration::from_millis(2) + Duration::from_millis(u64::from(seed))
        );
    }
}
