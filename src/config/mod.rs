// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod loader;
mod parameters;
mod registry;
mod runtime;
mod validation;

#[cfg(test)]
mod integration_tests;
pub mod consts;

pub use loader::{
    load_and_validate_config, load_config, Concurrency, Config, ProcessorConfig, SourceConfig,
    Strategy,
};
pub use parameters::ProcessorParameters;
pub use registry::{ProcessorConstructor, ProcessorRegistry};
pub use runtime::{PreparedChain, RuntimeBuilder};
pub use validation::{validate_chain, validate_config};
