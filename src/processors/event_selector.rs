// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::ProcessorParameters;
use crate::errors::ConfigError;
use crate::event::{Event, EventId};
use crate::traits::{Outcome, ProcessResult, Processor};
use std::collections::BTreeSet;

pub const TYPE_NAME: &str = "event_selector";

/// Sets its runtime condition to whether the event is in a configured list.
///
/// Runs in the modify pass so that later processors can be guarded by its
/// name. With an empty list every event is selected.
///
/// # Parameters
/// * `events` - list of `[run_number, event_number]` pairs
///
/// # Example
/// ```yaml
/// selector:
///   type: event_selector
///   parameters:
///     events: [[1, 3], [1, 7]]
/// ```
pub struct EventSelector {
    name: String,
    selected: BTreeSet<EventId>,
}

impl EventSelector {
    pub fn new(name: impl Into<String>, selected: impl IntoIterator<Item = EventId>) -> Self {
        Self {
            name: name.into(),
            selected: selected.into_iter().collect(),
        }
    }

    pub fn from_parameters(name: &str, params: &ProcessorParameters) -> Result<Self, ConfigError> {
        let pairs: Vec<(u32, u32)> = params.get_or(name, "events", Vec::new())?;
        Ok(Self::new(
            name,
            pairs
                .into_iter()
                .map(|(run, event)| EventId::new(run, event)),
        ))
    }

    pub fn is_selected(&self, id: EventId) -> bool {
        self.selected.is_empty() || self.selected.contains(&id)
    }
}

impl Processor for EventSelector {
    fn name(&self) -> &str {
        &self.name
    }

    fn modifies_events(&self) -> bool {
        true
    }

    fn modify_event(&self, event: &mut Event) -> ProcessResult {
        let selected = self.is_selected(event.id());
        event.set_runtime_condition(&self.name, selected)?;
        Ok(Outcome::Continue)
    }

    fn process_event(&self, _event: &mut Event) -> ProcessResult {
        Ok(Outcome::Continue)
    }
}
