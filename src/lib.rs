// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod app;        // application driver loop
pub mod config;     // config + processor registry
pub mod context;    // per-event seeds and runtime conditions
pub mod engine;     // task queue, worker pool, sequences
pub mod errors;     // error handling
pub mod event;      // event and run header model
pub mod observability;
pub mod processors; // built-in processors
pub mod scheduler;  // sequential and parallel schedulers
pub mod source;     // event sources
pub mod traits;     // unified abstractions
