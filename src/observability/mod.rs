// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! Every diagnostic and operational message of the crate is a small struct
//! in [`messages`] implementing `Display` plus [`messages::StructuredLog`],
//! so log text lives in one place and every event carries structured
//! fields alongside its human-readable form.
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::scheduler` - scheduler lifecycle, run boundaries, failures and the final summary
//! * `messages::processor` - processor instantiation, skips and shutdown
//! * `messages::pool` - worker pool lifecycle and captured panics
//! * `messages::validation` - configuration warnings
//!
//! # Usage
//!
//! ```rust
//! use the_sequencer::observability::messages::pool::WorkerPanicked;
//! use the_sequencer::observability::messages::StructuredLog;
//!
//! let msg = WorkerPanicked {
//!     thread: "sequence-worker-0",
//!     message: "index out of bounds",
//! };
//!
//! msg.log();
//! ```
//!
//! The binary installs a `tracing_subscriber::fmt` subscriber filtered by
//! `RUST_LOG`; the library only emits events.

pub mod messages;
