// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Parallel scheduler - N Sequences on a fixed worker pool.
//!
//! ## Lifecycle
//!
//! ```text
//! Unconfigured --init--> Configuring --> Ready --end--> Draining --> Stopped
//!                             |            ^  |
//!                             |            +--+ process_run_header (barrier)
//!                             +--error--> Stopped
//! ```
//!
//! ## Event flow
//!
//! 1. `push_event` attaches an [`EventContext`] derived from the event's
//!    identity and submits the event without blocking. A full queue hands
//!    the event back as [`SchedulerError::Backpressure`].
//! 2. Whichever worker picks the event up runs it through the Sequence it
//!    owns. Worker `i` always runs Sequence `i`.
//! 3. `pop_finished_events` polls every outstanding handle and returns the
//!    finished events in completion order. Failures are raised here, one per
//!    call, ahead of the events that finished alongside them.
//!
//! ## Run boundaries
//!
//! `process_run_header` takes `&mut self`, so no event can be pushed while it
//! runs. It waits until the pool has nothing in flight, then delivers the
//! header once to every unique processor. Events of two different runs are
//! therefore never processed at the same time.

use crate::config::{Concurrency, Config, PreparedChain, ProcessorRegistry, RuntimeBuilder};
use crate::context::{ConditionTable, EventContext, RandomSeedManager};
use crate::engine::sequence::{Processed, Sequence};
use crate::engine::super_sequence::SuperSequence;
use crate::engine::task_queue::PushPolicy;
use crate::engine::worker_pool::{DrainMode, Rejected, TaskHandle, WorkerPool};
use crate::errors::{PoolError, SchedulerError, SequenceError};
use crate::event::{Event, EventId, RunHeader};
use crate::observability::messages::processor::ProcessorEndFailed;
use crate::observability::messages::scheduler::{
    ConcurrencyExceedsHardware, EventProcessingFailed, RunBoundaryReached, SchedulerConfigured,
    SchedulerFinished, SingleWorkerParallel,
};
use crate::observability::messages::StructuredLog;
use crate::scheduler::{settle, RunReport, SchedulerState};
use crate::traits::Scheduler;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

const STRATEGY: &str = "parallel";
const POOL_NAME: &str = "sequence";
const BARRIER_POLL: Duration = Duration::from_micros(100);

/// An event handed to the pool and not yet collected.
struct Outstanding {
    id: EventId,
    handle: TaskHandle<Processed>,
}

/// Everything that exists only between `init` and `end`.
struct Running {
    chain: SuperSequence,
    seeds: RandomSeedManager,
    conditions: Arc<ConditionTable>,
    pool: WorkerPool<Sequence>,
    started: Instant,
}

pub struct ParallelScheduler {
    state: SchedulerState,
    concurrency: usize,
    running: Option<Running>,
    outstanding: Vec<Outstanding>,
    finished: Vec<Event>,
    failures: VecDeque<SchedulerError>,
    first_event: bool,
    events: u64,
}

impl ParallelScheduler {
    pub fn new() -> Self {
        Self {
            state: SchedulerState::Unconfigured,
            concurrency: 0,
            running: None,
            outstanding: Vec::new(),
            finished: Vec::new(),
            failures: VecDeque::new(),
            first_event: true,
            events: 0,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Worker thread count, known once configured.
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Events currently queued or being processed by a worker.
    pub fn in_flight(&self) -> usize {
        self.running.as_ref().map(|r| r.pool.in_flight()).unwrap_or(0)
    }

    fn configure(&mut self, config: &Config, registry: &ProcessorRegistry) -> Result<(), SchedulerError> {
        let concurrency = config.concurrency.resolve();
        let hardware = Concurrency::hardware();
        if concurrency > hardware {
            ConcurrencyExceedsHardware {
                requested: concurrency,
                hardware,
            }
            .log();
        }
        if concurrency == 1 {
            SingleWorkerParallel.log();
        }

        let PreparedChain {
            mut chain,
            seeds,
            conditions,
        } = RuntimeBuilder::prepare(config, registry, concurrency)?;

        let capacity = config.queue_capacity_for(concurrency);
        let mut pool = WorkerPool::new(POOL_NAME, capacity);
        for sequence in chain.take_sequences() {
            pool.add_worker(sequence)?;
        }
        pool.start()?;

        SchedulerConfigured {
            strategy: STRATEGY,
            concurrency,
            queue_capacity: capacity,
            processors: chain.unique_entries().len(),
        }
        .log();

        self.concurrency = concurrency;
        self.running = Some(Running {
            chain,
            seeds,
            conditions,
            pool,
            started: Instant::now(),
        });
        Ok(())
    }

    /// Move every completed task result into the finished and failure buffers.
    fn collect(&mut self) {
        let mut index = 0;
        while index < self.outstanding.len() {
            match self.outstanding[index].handle.try_take() {
                Some(result) => {
                    let Outstanding { id, .. } = self.outstanding.swap_remove(index);
                    self.settle_result(id, result);
                }
                None => index += 1,
            }
        }
    }

    fn settle_result(&mut self, id: EventId, result: Result<Processed, PoolError>) {
        match result {
            Ok(processed) => settle(processed, &mut self.finished, &mut self.failures),
            Err(PoolError::TaskPanicked { message }) => {
                let err = SchedulerError::EventPanicked { id, message };
                EventProcessingFailed { event: id, error: &err }.log();
                self.failures.push_back(err);
            }
            Err(other) => {
                EventProcessingFailed { event: id, error: &other }.log();
                self.failures.push_back(SchedulerError::Pool(other));
            }
        }
    }

    /// Block until nothing is in flight and every result has been collected.
    fn drain(&mut self) -> Duration {
        let started = Instant::now();
        while self.in_flight() > 0 {
            self.collect();
            std::thread::sleep(BARRIER_POLL);
        }
        self.collect();
        started.elapsed()
    }
}

impl Default for ParallelScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for ParallelScheduler {
    fn name(&self) -> &'static str {
        STRATEGY
    }

    fn init(&mut self, config: &Config, registry: &ProcessorRegistry) -> Result<(), SchedulerError> {
        self.state.require(SchedulerState::Unconfigured, "configure")?;
        self.state = SchedulerState::Configuring;

        match self.configure(config, registry) {
            Ok(()) => {
                self.state = SchedulerState::Ready;
                Ok(())
            }
            Err(e) => {
                self.running = None;
                self.state = SchedulerState::Stopped;
                Err(e)
            }
        }
    }

    fn process_run_header(&mut self, header: &mut RunHeader) -> Result<(), SchedulerError> {
        self.state.require(SchedulerState::Ready, "process a run header")?;

        let drain_wait = self.drain();
        let running = self
            .running
            .as_ref()
            .ok_or_else(|| self.state.reject("process a run header"))?;

        let run_number = header.run_number;
        let failed = |source: SequenceError| SchedulerError::RunHeaderFailed { run_number, source };
        running.chain.modify_run_header(header).map_err(failed)?;
        running.chain.process_run_header(header).map_err(failed)?;

        RunBoundaryReached {
            run_number,
            drain_wait,
        }
        .log();
        Ok(())
    }

    fn push_event(&mut self, mut event: Event) -> Result<(), SchedulerError> {
        self.state.require(SchedulerState::Ready, "push events")?;
        let state = self.state;
        let running = self.running.as_ref().ok_or_else(|| state.reject("push events"))?;

        let id = event.id();
        event.attach_context(EventContext::new(
            id,
            &running.seeds,
            Arc::clone(&running.conditions),
            self.first_event,
        ));

        match running.pool.submit(event, PushPolicy::Reject) {
            Ok(handle) => {
                self.first_event = false;
                self.events += 1;
                self.outstanding.push(Outstanding { id, handle });
                Ok(())
            }
            Err(Rejected {
                mut input,
                error: PoolError::QueueFull { .. },
            }) => {
                input.detach_context();
                Err(SchedulerError::Backpressure {
                    event: Box::new(input),
                })
            }
            Err(Rejected { mut input, error }) => {
                input.detach_context();
                Err(SchedulerError::Rejected {
                    event: Box::new(input),
                    source: error,
                })
            }
        }
    }

    fn pop_finished_events(&mut self) -> Result<Vec<Event>, SchedulerError> {
        if !self.state.can_collect() {
            return Err(self.state.reject("collect events"));
        }
        self.collect();
        if let Some(err) = self.failures.pop_front() {
            return Err(err);
        }
        Ok(std::mem::take(&mut self.finished))
    }

    fn free_slots(&self) -> usize {
        match (&self.running, self.state) {
            (Some(running), SchedulerState::Ready) => running.pool.free_slots(),
            _ => 0,
        }
    }

    fn pending(&self) -> usize {
        self.outstanding.len() + self.finished.len() + self.failures.len()
    }

    fn end(&mut self) -> Result<RunReport, SchedulerError> {
        self.state.require(SchedulerState::Ready, "end")?;
        self.state = SchedulerState::Draining;

        let Some(mut running) = self.running.take() else {
            self.state = SchedulerState::Stopped;
            return Err(SchedulerState::Draining.reject("end"));
        };

        let sequences = running.pool.stop(DrainMode::Graceful);
        let wall_time = running.started.elapsed();
        running.chain.restore_sequences(sequences);
        // the pool is stopped, every outstanding handle now holds its result
        self.collect();

        for error in running.chain.end_all() {
            ProcessorEndFailed { error: &error }.log();
        }

        let report = RunReport::from_sequences(
            STRATEGY,
            self.concurrency,
            running.chain.sequences(),
            self.events,
            wall_time,
        );

        SchedulerFinished {
            strategy: STRATEGY,
            events: self.events,
            concurrency: self.concurrency,
            wall_time,
            speedup: report.speedup,
        }
        .log();

        self.state = SchedulerState::Stopped;
        Ok(report)
    }
}
