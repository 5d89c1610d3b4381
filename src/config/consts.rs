// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Global random seed used when the configuration does not set one
pub const DEFAULT_GLOBAL_SEED: u32 = 0;
/// Queue capacity per worker when `queue_capacity` is not set
pub const QUEUE_SLOTS_PER_WORKER: usize = 2;
/// Concurrency used when the hardware thread count cannot be detected
pub const FALLBACK_CONCURRENCY: usize = 4;
/// Synthetic source defaults
pub const DEFAULT_RUNS: u32 = 1;
pub const DEFAULT_EVENTS_PER_RUN: u32 = 100;
pub const DEFAULT_FIRST_RUN: u32 = 1;
