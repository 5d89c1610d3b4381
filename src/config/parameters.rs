// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::ConfigError;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Free-form parameter block of one processor definition.
///
/// Values are kept as JSON values so the same block can come from YAML or
/// TOML; processors pull typed values out with [`ProcessorParameters::get`].
///
/// # Example
/// ```
/// use the_sequencer::config::ProcessorParameters;
///
/// let params = ProcessorParameters::new().with("crunch_ms", 5);
/// assert_eq!(params.get_or("crunch", "crunch_ms", 1u64).unwrap(), 5);
/// assert_eq!(params.get_or("crunch", "jitter_ms", 0u64).unwrap(), 0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct ProcessorParameters(BTreeMap<String, serde_json::Value>);

impl ProcessorParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Typed lookup; `processor` only labels the error.
    pub fn get<T: DeserializeOwned>(&self, processor: &str, key: &str) -> Result<Option<T>, ConfigError> {
        match self.0.get(key) {
            None => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| ConfigError::InvalidParameter {
                    processor: processor.to_string(),
                    key: key.to_string(),
                    reason: e.to_string(),
                }),
        }
    }

    pub fn get_or<T: DeserializeOwned>(&self, processor: &str, key: &str, default: T) -> Result<T, ConfigError> {
        Ok(self.get(processor, key)?.unwrap_or(default))
    }
}
