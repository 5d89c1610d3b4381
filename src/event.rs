// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Event and run header model.
//!
//! The scheduler treats an [`Event`] as opaque payload: it only reads the
//! event's identity (run number and event number) and attaches an
//! [`EventContext`] for the time the event is owned by the scheduler.
//! Processors read and write the event's named collections.

use crate::context::EventContext;
use crate::errors::ContextError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Identity of one event; the only part of an event the scheduler inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EventId {
    pub run_number: u32,
    pub event_number: u32,
}

impl EventId {
    pub fn new(run_number: u32, event_number: u32) -> Self {
        Self {
            run_number,
            event_number,
        }
    }
}

impl Display for EventId {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}/{}", self.run_number, self.event_number)
    }
}

/// Control record marking the start of a run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RunHeader {
    pub run_number: u32,
    pub description: String,
    pub parameters: BTreeMap<String, serde_json::Value>,
}

impl RunHeader {
    pub fn new(run_number: u32) -> Self {
        Self {
            run_number,
            ..Default::default()
        }
    }
}

/// One unit of work flowing through the processor chain.
#[derive(Debug, Clone)]
pub struct Event {
    id: EventId,
    collections: BTreeMap<String, serde_json::Value>,
    context: Option<EventContext>,
}

impl Event {
    pub fn new(run_number: u32, event_number: u32) -> Self {
        Self {
            id: EventId::new(run_number, event_number),
            collections: BTreeMap::new(),
            context: None,
        }
    }

    pub fn id(&self) -> EventId {
        self.id
    }

    pub fn run_number(&self) -> u32 {
        self.id.run_number
    }

    pub fn event_number(&self) -> u32 {
        self.id.event_number
    }

    pub fn collection(&self, name: &str) -> Option<&serde_json::Value> {
        self.collections.get(name)
    }

    pub fn collections(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.collections
    }

    /// Store a named collection, replacing any previous value.
    pub fn insert_collection(&mut self, name: impl Into<String>, value: serde_json::Value) {
        self.collections.insert(name.into(), value);
    }

    /// The context attached while the event is owned by a scheduler.
    pub fn context(&self) -> Result<&EventContext, ContextError> {
        self.context.as_ref().ok_or_else(|| ContextError::MissingContext {
            event: self.id.to_string(),
        })
    }

    pub fn context_mut(&mut self) -> Result<&mut EventContext, ContextError> {
        let id = self.id;
        self.context.as_mut().ok_or(ContextError::MissingContext {
            event: id.to_string(),
        })
    }

    pub fn has_context(&self) -> bool {
        self.context.is_some()
    }

    pub(crate) fn attach_context(&mut self, context: EventContext) {
        self.context = Some(context);
    }

    pub(crate) fn detach_context(&mut self) -> Option<EventContext> {
        self.context.take()
    }

    /// The per-event seed reserved for `consumer`.
    pub fn random_seed(&self, consumer: &str) -> Result<u32, ContextError> {
        self.context()?.random_seed(consumer)
    }

    /// Record a runtime fact under the processor's own name.
    pub fn set_runtime_condition(&mut self, owner: &str, value: bool) -> Result<(), ContextError> {
        self.context_mut()?.set_fact(owner, value);
        Ok(())
    }

    /// Record a runtime fact under `owner.name`.
    pub fn set_named_runtime_condition(
        &mut self,
        owner: &str,
        name: &str,
        value: bool,
    ) -> Result<(), ContextError> {
        self.context_mut()?.set_named_fact(owner, name, value);
        Ok(())
    }

    /// True for the first event a scheduler accepted.
    pub fn is_first_event(&self) -> bool {
        self.context
            .as_ref()
            .map(|ctx| ctx.is_first_event())
            .unwrap_or(false)
    }
}
