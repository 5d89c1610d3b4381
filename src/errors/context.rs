// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Errors raised while a processor consults its event's context.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContextError {
    /// The consumer never registered for per-event random seeds
    #[error("No random seed registered for '{consumer}'")]
    UnregisteredConsumer { consumer: String },

    /// An expression referenced a fact that is not in the table
    #[error("Runtime condition '{name}' is not set")]
    UnsetFact { name: String },

    #[error("Malformed condition expression '{expression}': {reason}")]
    InvalidExpression { expression: String, reason: String },

    /// The event is not currently owned by a scheduler
    #[error("Event {event} has no context attached")]
    MissingContext { event: String },
}
