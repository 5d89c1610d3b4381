// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::{ProcessorConfig, ProcessorParameters};
use crate::errors::ConfigError;
use crate::observability::messages::processor::ProcessorTypeRegistered;
use crate::observability::messages::StructuredLog;
use crate::traits::Processor;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Builds one processor instance from its declared name and parameter block.
pub type ProcessorConstructor =
    Arc<dyn Fn(&str, &ProcessorParameters) -> Result<Box<dyn Processor>, ConfigError> + Send + Sync>;

/// Maps a processor type name to its constructor.
///
/// The registry is an ordinary value: the application builds one, adds the
/// types it needs and passes it to the scheduler. Nothing is registered
/// implicitly.
///
/// # Examples
/// ```
/// use the_sequencer::config::{ProcessorConfig, ProcessorRegistry};
///
/// let registry = ProcessorRegistry::with_builtins();
/// assert!(registry.contains("cpu_crunch"));
///
/// let processor = registry
///     .create("counter", &ProcessorConfig::new("event_counter"))
///     .unwrap();
/// assert_eq!(processor.name(), "counter");
/// ```
#[derive(Clone, Default)]
pub struct ProcessorRegistry {
    constructors: BTreeMap<String, ProcessorConstructor>,
}

impl ProcessorRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in processor type.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::processors::register_builtins(&mut registry);
        registry
    }

    /// Register (or replace) the constructor for `type_name`.
    pub fn register<F>(&mut self, type_name: &str, constructor: F)
    where
        F: Fn(&str, &ProcessorParameters) -> Result<Box<dyn Processor>, ConfigError> + Send + Sync + 'static,
    {
        ProcessorTypeRegistered { type_name }.log();
        self.constructors
            .insert(type_name.to_string(), Arc::new(constructor));
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.constructors.contains_key(type_name)
    }

    /// Registered type names, sorted.
    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    /// Build a new instance of the processor declared as `name`.
    pub fn create(&self, name: &str, definition: &ProcessorConfig) -> Result<Box<dyn Processor>, ConfigError> {
        let constructor = self
            .constructors
            .get(&definition.processor_type)
            .ok_or_else(|| ConfigError::UnknownProcessorType {
                name: name.to_string(),
                processor_type: definition.processor_type.clone(),
            })?;
        constructor(name, &definition.parameters)
    }
}

impl std::fmt::Debug for ProcessorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessorRegistry")
            .field("types", &self.constructors.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;
    use crate::traits::{Outcome, ProcessResult};

    struct Named(String);

    impl Processor for Named {
        fn name(&self) -> &str {
            &self.0
        }

        fn process_event(&self, _event: &mut Event) -> ProcessResult {
            Ok(Outcome::Continue)
        }
    }

    #[test]
    fn test_unknown_type_is_reported_with_processor_name() {
        let registry = ProcessorRegistry::new();
        let err = registry
            .create("mystery", &ProcessorConfig::new("does_not_exist"))
            .err()
            .unwrap();
        assert_eq!(
            err,
            ConfigError::UnknownProcessorType {
                name: "mystery".to_string(),
                processor_type: "does_not_exist".to_string(),
            }
        );
    }

    #[test]
    fn test_custom_constructor_receives_name_and_parameters() {
        let mut registry = ProcessorRegistry::new();
        registry.register("named", |name, params| {
            let suffix: String = params.get_or(name, "suffix", String::new())?;
            Ok(Box::new(Named(format!("{}{}", name, suffix))) as Box<dyn Processor>)
        });

        let mut definition = ProcessorConfig::new("named");
        definition.parameters.insert("suffix", "_x");
        let processor = registry.create("first", &definition).unwrap();

        assert_eq!(processor.name(), "first_x");
        assert_eq!(registry.types().collect::<Vec<_>>(), vec!["named"]);
    }

    #[test]
    fn test_builtins_are_registered() {
        let registry = ProcessorRegistry::with_builtins();
        let types: Vec<&str> = registry.types().collect();
        assert_eq!(
            types,
            vec!["cpu_crunch", "event_counter", "event_selector", "seeded_smear"]
        );
    }
}
