// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod factory;
pub mod sequence;
pub mod super_sequence;
pub mod task_queue;
pub mod worker_pool;

pub use factory::SchedulerFactory;
pub use sequence::{ProcessorStats, Sequence, SequenceEntry};
pub use super_sequence::{ChainOptions, SuperSequence};
pub use task_queue::{PushPolicy, TaskQueue};
pub use worker_pool::{DrainMode, TaskHandle, Worker, WorkerPool};
