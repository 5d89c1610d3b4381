// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::{
    DEFAULT_EVENTS_PER_RUN, DEFAULT_FIRST_RUN, DEFAULT_GLOBAL_SEED, DEFAULT_RUNS,
    FALLBACK_CONCURRENCY, QUEUE_SLOTS_PER_WORKER,
};
use crate::config::parameters::ProcessorParameters;
use crate::errors::ConfigError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::Path;

/// Main configuration structure for a processing run.
///
/// Describes which scheduler to use, how many worker threads it gets, the
/// ordered chain of active processors and their definitions, and the
/// synthetic event source. Loaded from YAML or TOML.
///
/// # Fields
/// * `strategy` - `parallel` (default) or `sequential`
/// * `concurrency` - worker thread count, an integer or `auto` (default)
/// * `queue_capacity` - pending-event slots; defaults to two per worker
/// * `random_seed` - global seed for per-event random seeds (defaults to 0)
/// * `execute` - ordered list of active processor names
/// * `conditions` - runtime condition guarding each processor, keyed by name
/// * `processors` - processor definitions keyed by name
/// * `source` - synthetic event source settings
///
/// # Example
/// ```yaml
/// strategy: parallel
/// concurrency: auto
/// random_seed: 1234
/// execute: [selector, crunch, counter]
/// conditions:
///   crunch: selector
/// processors:
///   selector:
///     type: event_selector
///     parameters:
///       events: [[1, 3], [1, 7]]
///   crunch:
///     type: cpu_crunch
///     parameters:
///       crunch_ms: 2
///   counter:
///     type: event_counter
/// source:
///   runs: 2
///   events_per_run: 50
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub strategy: Strategy,
    #[serde(default)]
    pub concurrency: Concurrency,
    #[serde(default)]
    pub queue_capacity: Option<usize>,
    #[serde(default)]
    pub random_seed: Option<u32>,
    pub execute: Vec<String>,
    #[serde(default)]
    pub conditions: BTreeMap<String, String>,
    #[serde(default)]
    pub processors: BTreeMap<String, ProcessorConfig>,
    #[serde(default)]
    pub source: SourceConfig,
}

impl Config {
    /// A minimal configuration running `execute` with no definitions yet.
    pub fn new(execute: Vec<String>) -> Self {
        Self {
            strategy: Strategy::default(),
            concurrency: Concurrency::default(),
            queue_capacity: None,
            random_seed: None,
            execute,
            conditions: BTreeMap::new(),
            processors: BTreeMap::new(),
            source: SourceConfig::default(),
        }
    }

    pub fn global_seed(&self) -> u32 {
        self.random_seed.unwrap_or(DEFAULT_GLOBAL_SEED)
    }

    /// Queue capacity for `workers` threads, honoring an explicit setting.
    pub fn queue_capacity_for(&self, workers: usize) -> usize {
        self.queue_capacity
            .unwrap_or(workers * QUEUE_SLOTS_PER_WORKER)
            .max(1)
    }
}

/// Scheduler selection.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// One Sequence processed inline on the caller's thread
    Sequential,
    /// N Sequences on a fixed worker pool
    #[default]
    Parallel,
}

impl Display for Strategy {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            Strategy::Sequential => write!(f, "sequential"),
            Strategy::Parallel => write!(f, "parallel"),
        }
    }
}

/// Worker thread count: explicit, or the hardware thread count.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(try_from = "RawConcurrency")]
pub enum Concurrency {
    #[default]
    Auto,
    Fixed(usize),
}

impl Concurrency {
    /// Hardware thread count, falling back to a fixed guess when it cannot be detected.
    pub fn hardware() -> usize {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(FALLBACK_CONCURRENCY)
    }

    pub fn resolve(&self) -> usize {
        match self {
            Concurrency::Auto => Self::hardware(),
            Concurrency::Fixed(n) => *n,
        }
    }
}

impl Display for Concurrency {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            Concurrency::Auto => write!(f, "auto"),
            Concurrency::Fixed(n) => write!(f, "{}", n),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawConcurrency {
    Count(u64),
    Word(String),
}

impl TryFrom<RawConcurrency> for Concurrency {
    type Error = ConfigError;

    fn try_from(raw: RawConcurrency) -> Result<Self, Self::Error> {
        match raw {
            RawConcurrency::Count(n) => usize::try_from(n).map(Concurrency::Fixed).map_err(|_| {
                ConfigError::InvalidConcurrency {
                    value: n.to_string(),
                    reason: "too many workers for this platform".to_string(),
                }
            }),
            RawConcurrency::Word(word) if word.eq_ignore_ascii_case("auto") => Ok(Concurrency::Auto),
            RawConcurrency::Word(word) => word
                .trim()
                .parse::<usize>()
                .map(Concurrency::Fixed)
                .map_err(|_| ConfigError::InvalidConcurrency {
                    value: word.clone(),
                    reason: "expected a positive integer or 'auto'".to_string(),
                }),
        }
    }
}

/// Definition of one processor.
///
/// # Example
/// ```yaml
/// counter:
///   type: event_counter
///   clone: false
///   critical: true
///   parameters:
///     label: output
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ProcessorConfig {
    #[serde(rename = "type")]
    pub processor_type: String,
    #[serde(default)]
    pub clone: Option<bool>,
    #[serde(default)]
    pub critical: Option<bool>,
    #[serde(default)]
    pub parameters: ProcessorParameters,
}

impl ProcessorConfig {
    pub fn new(processor_type: impl Into<String>) -> Self {
        Self {
            processor_type: processor_type.into(),
            clone: None,
            critical: None,
            parameters: ProcessorParameters::default(),
        }
    }
}

/// Settings of the synthetic event source.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct SourceConfig {
    #[serde(default = "default_runs")]
    pub runs: u32,
    #[serde(default = "default_events_per_run")]
    pub events_per_run: u32,
    #[serde(default = "default_first_run")]
    pub first_run: u32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            runs: DEFAULT_RUNS,
            events_per_run: DEFAULT_EVENTS_PER_RUN,
            first_run: DEFAULT_FIRST_RUN,
        }
    }
}

fn default_runs() -> u32 {
    DEFAULT_RUNS
}

fn default_events_per_run() -> u32 {
    DEFAULT_EVENTS_PER_RUN
}

fn default_first_run() -> u32 {
    DEFAULT_FIRST_RUN
}

/// Load a config from a YAML (`.yaml`, `.yml`) or TOML (`.toml`) file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let load_error = |reason: String| ConfigError::Load {
        path: path.display().to_string(),
        reason,
    };

    let content = fs::read_to_string(path).map_err(|e| load_error(e.to_string()))?;
    let is_toml = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("toml"))
        .unwrap_or(false);

    if is_toml {
        toml::from_str(&content).map_err(|e| load_error(e.to_string()))
    } else {
        serde_yaml::from_str(&content).map_err(|e| load_error(e.to_string()))
    }
}

/// Load a config and run every validation check on it.
///
/// All problems are reported together in [`ConfigError::Invalid`].
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let cfg = load_config(path)?;
    crate::config::validate_config(&cfg).map_err(ConfigError::Invalid)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(suffix: &str, content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn parse_basic_config() {
        let yaml = r#"
execute: [selector, crunch]
processors:
  selector:
    type: event_selector
  crunch:
    type: cpu_crunch
    clone: true
    parameters:
      crunch_ms: 3
"#;

        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.strategy, Strategy::Parallel);
        assert_eq!(cfg.concurrency, Concurrency::Auto);
        assert_eq!(cfg.execute, vec!["selector", "crunch"]);
        assert_eq!(cfg.processors["crunch"].clone, Some(true));
        assert_eq!(cfg.processors["crunch"].critical, None);
        assert_eq!(cfg.source, SourceConfig::default());
        assert_eq!(cfg.global_seed(), 0);
    }

    #[test]
    fn test_concurrency_accepts_integer_and_auto() {
        let fixed: Config = serde_yaml::from_str("concurrency: 3\nexecute: []").unwrap();
        assert_eq!(fixed.concurrency, Concurrency::Fixed(3));
        assert_eq!(fixed.concurrency.resolve(), 3);

        let auto: Config = serde_yaml::from_str("concurrency: AUTO\nexecute: []").unwrap();
        assert_eq!(auto.concurrency, Concurrency::Auto);
        assert!(auto.concurrency.resolve() >= 1);

        let quoted: Config = serde_yaml::from_str("concurrency: \"8\"\nexecute: []").unwrap();
        assert_eq!(quoted.concurrency, Concurrency::Fixed(8));
    }

    #[test]
    fn test_large_worker_count_is_never_truncated() {
        let converted = Concurrency::try_from(RawConcurrency::Count(u64::MAX));
        match usize::try_from(u64::MAX) {
            Ok(n) => assert_eq!(converted, Ok(Concurrency::Fixed(n))),
            Err(_) => assert!(matches!(converted, Err(ConfigError::InvalidConcurrency { .. }))),
        }
    }

    #[test]
    fn test_concurrency_rejects_garbage() {
        let result: Result<Config, _> = serde_yaml::from_str("concurrency: lots\nexecute: []");
        assert!(result.is_err());
    }

    #[test]
    fn test_queue_capacity_defaults_to_two_per_worker() {
        let mut cfg = Config::new(vec![]);
        assert_eq!(cfg.queue_capacity_for(4), 8);
        cfg.queue_capacity = Some(3);
        assert_eq!(cfg.queue_capacity_for(4), 3);
    }

    #[test]
    fn test_load_yaml_file() {
        let file = write_temp(
            ".yaml",
            "strategy: sequential\nrandom_seed: 99\nexecute: [a]\nprocessors:\n  a: { type: event_counter }\n",
        );
        let cfg = load_config(file.path()).unwrap();
        assert_eq!(cfg.strategy, Strategy::Sequential);
        assert_eq!(cfg.global_seed(), 99);
    }

    #[test]
    fn test_load_toml_file() {
        let toml = r#"
strategy = "parallel"
concurrency = 2
execute = ["crunch"]

[conditions]
crunch = "true"

[processors.crunch]
type = "cpu_crunch"
clone = true

[processors.crunch.parameters]
crunch_ms = 1

[source]
runs = 3
events_per_run = 10
"#;
        let file = write_temp(".toml", toml);
        let cfg = load_config(file.path()).unwrap();
        assert_eq!(cfg.concurrency, Concurrency::Fixed(2));
        assert_eq!(cfg.conditions["crunch"], "true");
        assert_eq!(cfg.source.runs, 3);
        assert_eq!(cfg.source.first_run, 1);
        assert_eq!(
            cfg.processors["crunch"]
                .parameters
                .get::<u64>("crunch", "crunch_ms")
                .unwrap(),
            Some(1)
        );
    }

    #[test]
    fn test_missing_file_is_a_load_error() {
        let err = load_config("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Load { .. }));
    }

    #[test]
    fn test_load_and_validate_reports_all_problems() {
        let file = write_temp(
            ".yml",
            "concurrency: 0\nexecute: [a, a, ghost]\nprocessors:\n  a: { type: event_counter }\n",
        );
        let err = load_and_validate_config(file.path()).unwrap_err();
        match err {
            ConfigError::Invalid(problems) => {
                assert!(problems.contains(&ConfigError::DuplicateActiveProcessor {
                    name: "a".to_string(),
                    count: 2
                }));
                assert!(problems.contains(&ConfigError::UndefinedProcessor {
                    name: "ghost".to_string()
                }));
                assert!(problems
                    .iter()
                    .any(|p| matches!(p, ConfigError::InvalidConcurrency { .. })));
            }
            other => panic!("expected Invalid, got {:?}", other),
        }
    }
}
