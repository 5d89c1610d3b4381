// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Errors raised while building or validating the processor chain.
///
/// Every variant is fatal to setup: the scheduler refuses to enter its
/// ready state when any of these is reported.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// The `execute` list contains no processors
    #[error("Processor chain is empty: no active processors declared")]
    EmptyChain,

    /// The same processor name appears more than once in the active chain
    #[error("Processor '{name}' is declared {count} times in the active chain")]
    DuplicateActiveProcessor { name: String, count: usize },

    /// An active processor has no definition in the `processors` table
    #[error("Processor '{name}' is active but has no definition")]
    UndefinedProcessor { name: String },

    /// A processor definition names a type the registry does not know
    #[error("Processor '{name}' has unknown type '{processor_type}'")]
    UnknownProcessorType {
        name: String,
        processor_type: String,
    },

    /// The processor forces a clone/critical value the declaration contradicts
    #[error(
        "Processor '{name}' forces {option}={forced} but the declaration sets {option}={declared}"
    )]
    ForcedOptionConflict {
        name: String,
        option: String,
        forced: bool,
        declared: bool,
    },

    /// Random seed registration attempted after event processing started
    #[error("Random seed registration for '{consumer}' rejected: event processing has already started")]
    SeedRegistrationClosed { consumer: String },

    #[error("Invalid concurrency '{value}': {reason}")]
    InvalidConcurrency { value: String, reason: String },

    #[error("Invalid queue capacity {0}: must be at least 1")]
    InvalidQueueCapacity(usize),

    /// A runtime condition expression failed to parse
    #[error("Invalid runtime condition for '{name}': {reason}")]
    InvalidCondition { name: String, reason: String },

    #[error("Invalid parameter '{key}' for processor '{processor}': {reason}")]
    InvalidParameter {
        processor: String,
        key: String,
        reason: String,
    },

    /// A processor's one-time initialization reported a failure
    #[error("Processor '{name}' failed to initialize: {reason}")]
    ProcessorInit { name: String, reason: String },

    #[error("Failed to load configuration from '{path}': {reason}")]
    Load { path: String, reason: String },

    /// Several problems found by a single validation pass
    #[error("Configuration validation failed:\n{}", join_errors(.0))]
    Invalid(Vec<ConfigError>),
}

fn join_errors(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}
