// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::context::{ConditionTable, RandomSeedManager, RandomSeeds, RuntimeConditions};
use crate::errors::ContextError;
use crate::event::EventId;
use std::sync::Arc;

/// Everything the scheduler attaches to an event while it owns it.
///
/// Built from the event's identity and the configuration-time condition
/// table, so two contexts for the same event are always equal no matter
/// which thread builds them.
#[derive(Debug, Clone)]
pub struct EventContext {
    id: EventId,
    seeds: RandomSeeds,
    conditions: RuntimeConditions,
    first_event: bool,
}

impl EventContext {
    pub fn new(
        id: EventId,
        seeds: &RandomSeedManager,
        conditions: Arc<ConditionTable>,
        first_event: bool,
    ) -> Self {
        Self {
            id,
            seeds: seeds.derive(id),
            conditions: RuntimeConditions::new(conditions),
            first_event,
        }
    }

    pub fn id(&self) -> EventId {
        self.id
    }

    pub fn random_seed(&self, consumer: &str) -> Result<u32, ContextError> {
        self.seeds.get(consumer)
    }

    pub fn random_seeds(&self) -> &RandomSeeds {
        &self.seeds
    }

    pub fn conditions(&self) -> &RuntimeConditions {
        &self.conditions
    }

    pub fn set_fact(&mut self, owner: &str, value: bool) {
        self.conditions.set_fact(owner, value);
    }

    pub fn set_named_fact(&mut self, owner: &str, name: &str, value: bool) {
        self.conditions.set_named_fact(owner, name, value);
    }

    pub fn condition_is_true(&self, processor: &str) -> Result<bool, ContextError> {
        self.conditions.condition_is_true(processor)
    }

    pub fn is_first_event(&self) -> bool {
        self.first_event
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_exposes_seeds_and_conditions() {
        let mut manager = RandomSeedManager::new(7);
        manager.register("smear").unwrap();
        let mut table = ConditionTable::new();
        table.add("smear", "selector").unwrap();

        let id = EventId::new(1, 5);
        let mut ctx = EventContext::new(id, &manager, Arc::new(table), true);

        assert_eq!(ctx.id(), id);
        assert!(ctx.is_first_event());
        assert_eq!(
            ctx.random_seed("smear").unwrap(),
            manager.derive(id).get("smear").unwrap()
        );
        assert!(ctx.condition_is_true("smear").is_err());

        ctx.set_fact("selector", true);
        assert!(ctx.condition_is_true("smear").unwrap());
    }
}
