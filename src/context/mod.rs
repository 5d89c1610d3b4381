// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Per-event context: deterministic random seeds and runtime conditions.
//!
//! An [`EventContext`] is created by the scheduler before an event is
//! dispatched and detached once the event is reported finished. Everything
//! inside it is derived from the event's identity and configuration-time
//! tables, never from dispatch or completion order.

mod conditions;
mod event_context;
mod random_seeds;

pub use conditions::{ConditionTable, Expression, RuntimeConditions};
pub use event_context::EventContext;
pub use random_seeds::{event_hash, RandomSeedManager, RandomSeeds};
