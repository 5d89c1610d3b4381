// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod processor;
pub mod scheduler;

pub use processor::{Outcome, ProcessResult, Processor, ProcessorSetup};
pub use scheduler::Scheduler;
