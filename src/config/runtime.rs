// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::{validate_config, Config, ProcessorRegistry};
use crate::context::{ConditionTable, RandomSeedManager};
use crate::engine::factory::SchedulerFactory;
use crate::engine::super_sequence::{ChainOptions, SuperSequence};
use crate::errors::{ConfigError, SchedulerError};
use crate::traits::Scheduler;
use std::sync::Arc;

/// A fully built and initialized processor chain, ready for events.
#[derive(Debug)]
pub struct PreparedChain {
    pub chain: SuperSequence,
    pub seeds: RandomSeedManager,
    pub conditions: Arc<ConditionTable>,
}

/// Runtime builder - turns a configuration into a working processing chain.
///
/// The `RuntimeBuilder` is the single place where a validated configuration
/// meets the processor registry. Schedulers call [`RuntimeBuilder::prepare`]
/// while configuring; applications usually go straight to
/// [`RuntimeBuilder::from_config`].
///
/// # Examples
///
/// ```
/// use the_sequencer::config::{Config, ProcessorConfig, ProcessorRegistry, RuntimeBuilder, Strategy};
///
/// let mut config = Config::new(vec!["counter".to_string()]);
/// config.strategy = Strategy::Sequential;
/// config
///     .processors
///     .insert("counter".to_string(), ProcessorConfig::new("event_counter"));
///
/// let registry = ProcessorRegistry::with_builtins();
/// let mut scheduler = RuntimeBuilder::from_config(&config, &registry).unwrap();
///
/// assert_eq!(scheduler.name(), "sequential");
/// assert_eq!(scheduler.free_slots(), 1);
/// scheduler.end().unwrap();
/// ```
pub struct RuntimeBuilder;

impl RuntimeBuilder {
    /// Create and initialize the scheduler selected by `cfg.strategy`.
    pub fn from_config(
        cfg: &Config,
        registry: &ProcessorRegistry,
    ) -> Result<Box<dyn Scheduler>, SchedulerError> {
        let mut scheduler = SchedulerFactory::from_config(cfg);
        scheduler.init(cfg, registry)?;
        Ok(scheduler)
    }

    /// Validate `cfg` and build a chain of `size` Sequences.
    ///
    /// Every unique processor is initialized, which is also where processors
    /// register for random seeds. A single validation problem is returned
    /// as-is; several are wrapped in [`ConfigError::Invalid`].
    pub fn prepare(
        cfg: &Config,
        registry: &ProcessorRegistry,
        size: usize,
    ) -> Result<PreparedChain, ConfigError> {
        validate_config(cfg).map_err(|mut errors| {
            if errors.len() == 1 {
                errors.remove(0)
            } else {
                ConfigError::Invalid(errors)
            }
        })?;

        let conditions = Arc::new(ConditionTable::from_entries(&cfg.conditions)?);

        let mut chain = SuperSequence::new(size);
        for name in &cfg.execute {
            let definition = cfg
                .processors
                .get(name)
                .ok_or_else(|| ConfigError::UndefinedProcessor { name: name.clone() })?;
            let declared = ChainOptions {
                clone: definition.clone,
                critical: definition.critical,
            };
            chain.add_processor(name, declared, || registry.create(name, definition))?;
        }

        let mut seeds = RandomSeedManager::new(cfg.global_seed());
        chain.init_all(&mut seeds)?;

        Ok(PreparedChain {
            chain,
            seeds,
            conditions,
        })
    }
}
