// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::{Config, Strategy};
use crate::scheduler::{ParallelScheduler, SimpleScheduler};
use crate::traits::Scheduler;

/// Factory for creating schedulers from configuration
pub struct SchedulerFactory;

impl SchedulerFactory {
    /// Create an unconfigured scheduler based on the configuration strategy
    pub fn from_config(cfg: &Config) -> Box<dyn Scheduler> {
        match cfg.strategy {
            Strategy::Sequential => Box::new(SimpleScheduler::new()),
            Strategy::Parallel => Box::new(ParallelScheduler::new()),
        }
    }
}
