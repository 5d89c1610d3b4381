// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` for consistent, human-readable
//! output and [`StructuredLog`] to emit itself at its documented level
//! with structured fields.
//!
//! # Organization
//!
//! * `scheduler` - scheduler configuration, run boundaries and termination
//! * `processor` - processor lifecycle events
//! * `pool` - worker pool lifecycle
//! * `validation` - configuration validation warnings
//!
//! # Usage Pattern
//!
//! ```rust
//! use the_sequencer::observability::messages::scheduler::RunBoundaryReached;
//! use std::time::Duration;
//!
//! let msg = RunBoundaryReached {
//!     run_number: 2,
//!     drain_wait: Duration::from_millis(3),
//! };
//!
//! tracing::info!("{}", msg);
//! ```

use tracing::Span;

pub mod pool;
pub mod processor;
pub mod scheduler;
pub mod validation;

/// A message that knows its own log level and structured fields.
pub trait StructuredLog {
    /// Emit the message as a `tracing` event.
    fn log(&self);

    /// Build a span carrying the message's fields.
    fn span(&self, name: &str) -> Span;
}
