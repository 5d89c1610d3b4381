// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

#[cfg(test)]
mod integration_tests {
    use crate::app::{Application, Termination};
    use crate::config::{load_and_validate_config, Concurrency, ProcessorRegistry, RuntimeBuilder, Strategy};
    use crate::event::{Event, EventId};
    use crate::errors::ConfigError;
    use crate::source::SyntheticSource;
    use std::collections::BTreeMap;
    use std::io::Write;

    fn run_to_completion(path: &str) -> BTreeMap<EventId, Event> {
        let config = load_and_validate_config(path).unwrap();
        let app = Application::from_config(&config, &ProcessorRegistry::with_builtins()).unwrap();
        let mut events = BTreeMap::new();
        let summary = app
            .run(&mut SyntheticSource::from_config(&config.source), |event| {
                events.insert(event.id(), event);
            })
            .unwrap();
        assert_eq!(summary.termination, Termination::Completed);
        events
    }

    /// Test that the shipped parallel configuration loads with every field
    #[test]
    fn test_parallel_selection_yaml_loading() {
        let config = load_and_validate_config("configs/parallel-selection.yaml").unwrap();

        assert_eq!(config.strategy, Strategy::Parallel);
        assert_eq!(config.concurrency, Concurrency::Fixed(4));
        assert_eq!(config.global_seed(), 1234567890);
        assert_eq!(config.execute, vec!["selector", "crunch", "smear", "counter"]);
        assert_eq!(config.conditions["smear"], "selector");
        assert_eq!(config.processors["crunch"].clone, Some(true));
        assert_eq!(config.source.runs, 2);
        assert_eq!(config.source.events_per_run, 20);
    }

    /// Test that the TOML reference describes the same chain
    #[test]
    fn test_sequential_reference_toml_loading() {
        let toml = load_and_validate_config("configs/sequential-reference.toml").unwrap();
        let yaml = load_and_validate_config("configs/parallel-selection.yaml").unwrap();

        assert_eq!(toml.strategy, Strategy::Sequential);
        assert_eq!(toml.execute, yaml.execute);
        assert_eq!(toml.conditions, yaml.conditions);
        assert_eq!(toml.global_seed(), yaml.global_seed());
        assert_eq!(
            toml.processors["selector"].parameters,
            yaml.processors["selector"].parameters
        );
    }

    /// The parallel and sequential configurations must agree event by event
    #[test]
    fn test_parallel_matches_sequential_reference() {
        let parallel = run_to_completion("configs/parallel-selection.yaml");
        let sequential = run_to_completion("configs/sequential-reference.toml");

        assert_eq!(parallel.len(), 40);
        assert_eq!(parallel.keys().collect::<Vec<_>>(), sequential.keys().collect::<Vec<_>>());
        for (id, event) in &parallel {
            assert_eq!(
                event.collections(),
                sequential[id].collections(),
                "event {id} differs"
            );
        }
        assert_eq!(
            parallel.values().filter(|e| e.collection("smear").is_some()).count(),
            3
        );
    }

    #[test]
    fn test_stop_after_limit_terminates_cleanly() {
        let config = load_and_validate_config("configs/stop-after-limit.yaml").unwrap();
        let app = Application::from_config(&config, &ProcessorRegistry::with_builtins()).unwrap();

        let summary = app
            .run(&mut SyntheticSource::from_config(&config.source), |_| {})
            .unwrap();

        assert!(matches!(
            summary.termination,
            Termination::StopRequested { ref processor, .. } if processor == "counter"
        ));
        assert!(summary.events_read < 1000);
        assert!(summary.failed_events.is_empty());
    }

    #[test]
    fn test_invalid_file_reports_every_problem() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        write!(
            file,
            "concurrency: 0\nexecute: [a, a, ghost]\nprocessors:\n  a:\n    type: cpu_crunch\n"
        )
        .unwrap();

        match load_and_validate_config(file.path()).unwrap_err() {
            ConfigError::Invalid(errors) => {
                assert!(errors.contains(&ConfigError::DuplicateActiveProcessor {
                    name: "a".to_string(),
                    count: 2
                }));
                assert!(errors.contains(&ConfigError::UndefinedProcessor {
                    name: "ghost".to_string()
                }));
                assert!(errors
                    .iter()
                    .any(|e| matches!(e, ConfigError::InvalidConcurrency { .. })));
            }
            other => panic!("expected aggregated errors, got {other}"),
        }
    }

    #[test]
    fn test_unknown_processor_type_fails_runtime_build() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            "execute = [\"mystery\"]\n[processors.mystery]\ntype = \"quantum_sorter\"\n"
        )
        .unwrap();

        let config = load_and_validate_config(file.path()).unwrap();
        let err = RuntimeBuilder::from_config(&config, &ProcessorRegistry::with_builtins())
            .err()
            .unwrap();
        assert_eq!(
            err.to_string(),
            ConfigError::UnknownProcessorType {
                name: "mystery".to_string(),
                processor_type: "quantum_sorter".to_string(),
            }
            .to_string()
        );
    }
}
