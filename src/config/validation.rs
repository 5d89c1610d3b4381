// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Configuration validation for the processor chain.
//!
//! Validation runs every check and reports all failures together, so a
//! broken configuration can be fixed in one pass:
//!
//! 1. **Chain**: the `execute` list is non-empty and names each processor once
//! 2. **Definitions**: every active processor has an entry in `processors`
//! 3. **Conditions**: every runtime condition expression parses
//! 4. **Resources**: concurrency and queue capacity are at least one
//!
//! Definitions that are never executed and conditions attached to inactive
//! processors are legal but logged as warnings.
//!
//! # Examples
//!
//! ```rust
//! use the_sequencer::config::{validate_config, Config, ProcessorConfig};
//! use the_sequencer::errors::ConfigError;
//!
//! let mut config = Config::new(vec!["counter".to_string(), "counter".to_string()]);
//! config
//!     .processors
//!     .insert("counter".to_string(), ProcessorConfig::new("event_counter"));
//!
//! let errors = validate_config(&config).unwrap_err();
//! assert_eq!(
//!     errors,
//!     vec![ConfigError::DuplicateActiveProcessor {
//!         name: "counter".to_string(),
//!         count: 2,
//!     }]
//! );
//! ```

use crate::config::{Concurrency, Config};
use crate::context::Expression;
use crate::errors::ConfigError;
use crate::observability::messages::validation::{ConditionForInactiveProcessor, UnusedProcessorDefinition};
use crate::observability::messages::StructuredLog;
use indexmap::IndexMap;

/// Validate a configuration, returning every problem found.
pub fn validate_config(cfg: &Config) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    errors.extend(validate_chain(&cfg.execute));
    errors.extend(validate_definitions(cfg));
    errors.extend(validate_conditions(cfg));
    errors.extend(validate_resources(cfg));

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Non-empty and free of duplicate names, reported in order of first appearance.
pub fn validate_chain(execute: &[String]) -> Vec<ConfigError> {
    if execute.is_empty() {
        return vec![ConfigError::EmptyChain];
    }

    let mut counts: IndexMap<&str, usize> = IndexMap::new();
    for name in execute {
        *counts.entry(name.as_str()).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(name, count)| ConfigError::DuplicateActiveProcessor {
            name: name.to_string(),
            count,
        })
        .collect()
}

fn validate_definitions(cfg: &Config) -> Vec<ConfigError> {
    for name in cfg.processors.keys() {
        if !cfg.execute.contains(name) {
            UnusedProcessorDefinition { processor: name }.log();
        }
    }

    let mut seen = Vec::new();
    cfg.execute
        .iter()
        .filter(|name| !cfg.processors.contains_key(name.as_str()))
        .filter(|name| {
            let first = !seen.contains(name);
            seen.push(*name);
            first
        })
        .map(|name| ConfigError::UndefinedProcessor { name: name.clone() })
        .collect()
}

fn validate_conditions(cfg: &Config) -> Vec<ConfigError> {
    let mut errors = Vec::new();
    for (name, expression) in &cfg.conditions {
        if !cfg.execute.contains(name) {
            ConditionForInactiveProcessor {
                processor: name,
                expression,
            }
            .log();
        }
        if let Err(e) = Expression::parse(expression) {
            errors.push(ConfigError::InvalidCondition {
                name: name.clone(),
                reason: e.to_string(),
            });
        }
    }
    errors
}

fn validate_resources(cfg: &Config) -> Vec<ConfigError> {
    let mut errors = Vec::new();
    if cfg.concurrency == Concurrency::Fixed(0) {
        errors.push(ConfigError::InvalidConcurrency {
            value: "0".to_string(),
            reason: "at least one worker thread is required".to_string(),
        });
    }
    if cfg.queue_capacity == Some(0) {
        errors.push(ConfigError::InvalidQueueCapacity(0));
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProcessorConfig;

    fn config(execute: &[&str], defined: &[&str]) -> Config {
        let mut cfg = Config::new(execute.iter().map(|s| s.to_string()).collect());
        for name in defined {
            cfg.processors
                .insert(name.to_string(), ProcessorConfig::new("event_counter"));
        }
        cfg
    }

    #[test]
    fn test_valid_config_passes() {
        let mut cfg = config(&["a", "b"], &["a", "b", "unused"]);
        cfg.conditions.insert("b".to_string(), "a && !false".to_string());
        assert!(validate_config(&cfg).is_ok());
    }

    #[test]
    fn test_empty_chain() {
        let cfg = config(&[], &["a"]);
        assert_eq!(validate_config(&cfg), Err(vec![ConfigError::EmptyChain]));
    }

    #[test]
    fn test_duplicates_reported_with_count() {
        let errors = validate_chain(&["x", "y", "x", "y", "x"].map(String::from));
        assert_eq!(
            errors,
            vec![
                ConfigError::DuplicateActiveProcessor {
                    name: "x".to_string(),
                    count: 3
                },
                ConfigError::DuplicateActiveProcessor {
                    name: "y".to_string(),
                    count: 2
                },
            ]
        );
    }

    #[test]
    fn test_undefined_processor_reported_once() {
        let cfg = config(&["a", "ghost", "ghost"], &["a"]);
        let errors = validate_config(&cfg).unwrap_err();
        let undefined: Vec<_> = errors
            .iter()
            .filter(|e| matches!(e, ConfigError::UndefinedProcessor { .. }))
            .collect();
        assert_eq!(undefined.len(), 1);
    }

    #[test]
    fn test_bad_condition_and_resources() {
        let mut cfg = config(&["a"], &["a"]);
        cfg.conditions.insert("a".to_string(), "(b".to_string());
        cfg.concurrency = Concurrency::Fixed(0);
        cfg.queue_capacity = Some(0);

        let errors = validate_config(&cfg).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(matches!(errors[0], ConfigError::InvalidCondition { .. }));
        assert!(matches!(errors[1], ConfigError::InvalidConcurrency { .. }));
        assert_eq!(errors[2], ConfigError::InvalidQueueCapacity(0));
    }
}
