// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod config;
mod context;
mod execution;

pub use config::ConfigError;
pub use context::ContextError;
pub use execution::{PoolError, ProcessorError, SchedulerError, SequenceError};
