// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::ProcessorParameters;
use crate::errors::{ConfigError, ProcessorError};
use crate::event::Event;
use crate::traits::{Outcome, ProcessResult, Processor, ProcessorSetup};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub const TYPE_NAME: &str = "seeded_smear";

/// Draws a reproducible pseudo-random value per event from its seed.
///
/// The value lands in the collection named after the processor, together
/// with the seed it came from. Since the seed only depends on the event's
/// identity, the output is identical for any thread count.
///
/// # Parameters
/// * `mean` - centre of the drawn value (default 0.0)
/// * `width` - full width of the uniform smearing window (default 1.0)
pub struct SeededSmear {
    name: String,
    mean: f64,
    width: f64,
}

impl SeededSmear {
    pub fn new(name: impl Into<String>, mean: f64, width: f64) -> Self {
        Self {
            name: name.into(),
            mean,
            width,
        }
    }

    pub fn from_parameters(name: &str, params: &ProcessorParameters) -> Result<Self, ConfigError> {
        let mean = params.get_or(name, "mean", 0.0)?;
        let width: f64 = params.get_or(name, "width", 1.0)?;
        if !width.is_finite() || width < 0.0 {
            return Err(ConfigError::InvalidParameter {
                processor: name.to_string(),
                key: "width".to_string(),
                reason: format!("must be a finite, non-negative number, got {}", width),
            });
        }
        Ok(Self::new(name, mean, width))
    }
}

impl Processor for SeededSmear {
    fn name(&self) -> &str {
        &self.name
    }

    fn init(&self, setup: &mut ProcessorSetup<'_>) -> Result<(), ProcessorError> {
        setup
            .register_random_seeds()
            .map_err(|e| ProcessorError::new(e.to_string()))
    }

    fn process_event(&self, event: &mut Event) -> ProcessResult {
        let seed = event.random_seed(&self.name)?;
        let mut rng = ChaCha8Rng::seed_from_u64(u64::from(seed));
        let offset: f64 = rng.gen_range(-0.5..=0.5);
        let value = self.mean + offset * self.width;
        event.insert_collection(
            &self.name,
            serde_json::json!({ "seed": seed, "value": value }),
        );
        Ok(Outcome::Continue)
    }
}
