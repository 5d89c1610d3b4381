// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for configuration validation warnings.
//!
//! Hard validation failures are returned as [`crate::errors::ConfigError`];
//! the messages here cover legal but suspicious configurations.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A processor is defined but not part of the `execute` list.
///
/// # Log Level
/// `warn!` - Potential issue
///
/// # Example
/// ```
/// use the_sequencer::observability::messages::validation::UnusedProcessorDefinition;
///
/// let msg = UnusedProcessorDefinition { processor: "old_crunch" };
/// tracing::warn!("{}", msg);
/// ```
pub struct UnusedProcessorDefinition<'a> {
    pub processor: &'a str,
}

impl Display for UnusedProcessorDefinition<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Processor '{}' is defined but never executed",
            self.processor
        )
    }
}

impl StructuredLog for UnusedProcessorDefinition<'_> {
    fn log(&self) {
        tracing::warn!(processor = self.processor, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::WARN,
            "span_name",
            name = name,
            processor = self.processor,
        )
    }
}

/// A runtime condition guards a processor that is not executed.
///
/// # Log Level
/// `warn!` - Potential issue
pub struct ConditionForInactiveProcessor<'a> {
    pub processor: &'a str,
    pub expression: &'a str,
}

impl Display for ConditionForInactiveProcessor<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Runtime condition '{}' guards processor '{}', which is not executed",
            self.expression, self.processor
        )
    }
}

impl StructuredLog for ConditionForInactiveProcessor<'_> {
    fn log(&self) {
        tracing::warn!(
            processor = self.processor,
            expression = self.expression,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::WARN,
            "span_name",
            name = name,
            processor = self.processor,
            expression = self.expression,
        )
    }
}
