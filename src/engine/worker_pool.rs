// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Fixed-size pool of OS threads, each owning one long-lived [`Worker`].
//!
//! Workers are handed to the pool before it starts; worker `i` moves into
//! thread `i` and stays there until [`WorkerPool::stop`] hands it back.
//! Every thread loops on the shared [`TaskQueue`]: pull an input, run it
//! through its own worker, send the output through the task's completion
//! handle. Because a worker is never shared between threads, it can hold
//! mutable state without locking.
//!
//! Panics raised by worker code are caught at the thread boundary and
//! delivered through the completion handle as [`PoolError::TaskPanicked`];
//! the thread keeps serving the queue.
//!
//! # Examples
//!
//! ```rust
//! use the_sequencer::engine::task_queue::PushPolicy;
//! use the_sequencer::engine::worker_pool::{DrainMode, Worker, WorkerPool};
//!
//! struct Doubler;
//!
//! impl Worker for Doubler {
//!     type Input = u64;
//!     type Output = u64;
//!
//!     fn process(&mut self, input: u64) -> u64 {
//!         input * 2
//!     }
//! }
//!
//! let mut pool = WorkerPool::new("doubler", 8);
//! pool.add_worker(Doubler).unwrap();
//! pool.add_worker(Doubler).unwrap();
//! pool.start().unwrap();
//!
//! let handle = pool.submit(21, PushPolicy::Blocking).unwrap();
//! assert_eq!(handle.wait().unwrap(), 42);
//!
//! let workers = pool.stop(DrainMode::Graceful);
//! assert_eq!(workers.len(), 2);
//! ```

use crate::engine::task_queue::{PushError, PushPolicy, TaskQueue};
use crate::errors::PoolError;
use crate::observability::messages::pool::{PoolStarted, PoolStopped, WorkerPanicked};
use crate::observability::messages::StructuredLog;
use std::any::Any;
use std::fmt::{Display, Formatter};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

/// Long-lived per-thread state that turns inputs into outputs.
pub trait Worker: Send + 'static {
    type Input: Send + 'static;
    type Output: Send + 'static;

    fn process(&mut self, input: Self::Input) -> Self::Output;
}

/// How [`WorkerPool::stop`] treats tasks still waiting in the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainMode {
    /// Run every queued task before the threads exit
    Graceful,
    /// Discard the backlog; only tasks already running complete
    Immediate,
}

impl Display for DrainMode {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            DrainMode::Graceful => write!(f, "graceful"),
            DrainMode::Immediate => write!(f, "immediate"),
        }
    }
}

type TaskResult<O> = Result<O, PoolError>;

struct Job<I, O> {
    input: I,
    reply: oneshot::Sender<TaskResult<O>>,
}

/// Completion handle for one submitted task.
#[derive(Debug)]
pub struct TaskHandle<O> {
    receiver: oneshot::Receiver<TaskResult<O>>,
}

impl<O> TaskHandle<O> {
    /// Block the calling thread until the task finished.
    ///
    /// Must not be called from inside an async runtime.
    pub fn wait(self) -> TaskResult<O> {
        self.receiver
            .blocking_recv()
            .unwrap_or(Err(PoolError::TaskDiscarded))
    }

    /// Poll without blocking; `None` while the task is still pending.
    pub fn try_take(&mut self) -> Option<TaskResult<O>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(Err(PoolError::TaskDiscarded)),
        }
    }
}

/// A submission the pool refused; the input is handed back untouched.
#[derive(Debug)]
pub struct Rejected<I> {
    pub input: I,
    pub error: PoolError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PoolState {
    Idle,
    Running,
    Stopped,
}

pub struct WorkerPool<W: Worker> {
    name: String,
    queue: Arc<TaskQueue<Job<W::Input, W::Output>>>,
    in_flight: Arc<AtomicUsize>,
    idle_workers: Vec<W>,
    threads: Vec<JoinHandle<W>>,
    worker_count: usize,
    state: PoolState,
}

impl<W: Worker> WorkerPool<W> {
    /// Create a stopped pool whose queue holds at most `capacity` pending tasks.
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            name: name.into(),
            queue: Arc::new(TaskQueue::new(capacity)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            idle_workers: Vec::new(),
            threads: Vec::new(),
            worker_count: 0,
            state: PoolState::Idle,
        }
    }

    /// Hand one worker to the pool. Only allowed before [`WorkerPool::start`].
    pub fn add_worker(&mut self, worker: W) -> Result<(), PoolError> {
        if self.state != PoolState::Idle {
            return Err(PoolError::AlreadyRunning);
        }
        self.idle_workers.push(worker);
        self.worker_count += 1;
        Ok(())
    }

    /// Spawn one named thread per worker.
    pub fn start(&mut self) -> Result<(), PoolError> {
        match self.state {
            PoolState::Running => return Err(PoolError::AlreadyRunning),
            PoolState::Stopped => return Err(PoolError::NotRunning),
            PoolState::Idle => {}
        }
        if self.idle_workers.is_empty() {
            return Err(PoolError::NoWorkers);
        }

        for (index, worker) in std::mem::take(&mut self.idle_workers).into_iter().enumerate() {
            let queue = Arc::clone(&self.queue);
            let in_flight = Arc::clone(&self.in_flight);
            let thread_name = format!("{}-worker-{}", self.name, index);

            let spawned = thread::Builder::new()
                .name(thread_name.clone())
                .spawn(move || worker_loop(thread_name, worker, queue, in_flight));

            match spawned {
                Ok(handle) => self.threads.push(handle),
                Err(e) => {
                    self.state = PoolState::Running;
                    self.stop(DrainMode::Immediate);
                    return Err(PoolError::Spawn(e.to_string()));
                }
            }
        }

        self.state = PoolState::Running;
        PoolStarted {
            pool: &self.name,
            workers: self.worker_count,
            capacity: self.queue.capacity(),
        }
        .log();
        Ok(())
    }

    /// Enqueue one input and return its completion handle.
    pub fn submit(
        &self,
        input: W::Input,
        policy: PushPolicy,
    ) -> Result<TaskHandle<W::Output>, Rejected<W::Input>> {
        if self.state != PoolState::Running {
            return Err(Rejected {
                input,
                error: PoolError::NotRunning,
            });
        }

        let (reply, receiver) = oneshot::channel();
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        match self.queue.push(Job { input, reply }, policy) {
            Ok(()) => Ok(TaskHandle { receiver }),
            Err(err) => {
                self.in_flight.fetch_sub(1, Ordering::AcqRel);
                let error = match err {
                    PushError::Full(_) => PoolError::QueueFull {
                        capacity: self.queue.capacity(),
                    },
                    PushError::Closed(_) => PoolError::NotRunning,
                };
                Err(Rejected {
                    input: err.into_inner().input,
                    error,
                })
            }
        }
    }

    /// Queue headroom; zero unless the pool is running.
    pub fn free_slots(&self) -> usize {
        if self.state == PoolState::Running {
            self.queue.free_slots()
        } else {
            0
        }
    }

    /// Tasks submitted whose completion has not been delivered yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    pub fn is_running(&self) -> bool {
        self.state == PoolState::Running
    }

    /// Stop the pool and hand the workers back in thread order.
    ///
    /// Calling this on a pool that never started returns the idle workers.
    pub fn stop(&mut self, mode: DrainMode) -> Vec<W> {
        let mut discarded = 0;
        if mode == DrainMode::Immediate {
            // dropping a job drops its reply sender, which resolves the handle as discarded
            discarded = self.queue.clear().len();
            self.in_flight.fetch_sub(discarded, Ordering::AcqRel);
        }
        self.queue.close();

        let mut workers = std::mem::take(&mut self.idle_workers);
        for handle in self.threads.drain(..) {
            let thread_name = handle.thread().name().unwrap_or("worker").to_string();
            match handle.join() {
                Ok(worker) => workers.push(worker),
                Err(payload) => WorkerPanicked {
                    thread: &thread_name,
                    message: &panic_message(payload.as_ref()),
                }
                .log(),
            }
        }

        if self.state == PoolState::Running {
            PoolStopped {
                pool: &self.name,
                mode,
                workers: workers.len(),
                discarded,
            }
            .log();
        }
        self.state = PoolState::Stopped;
        workers
    }
}

impl<W: Worker> Drop for WorkerPool<W> {
    fn drop(&mut self) {
        if !self.threads.is_empty() {
            self.stop(DrainMode::Immediate);
        }
    }
}

fn worker_loop<W: Worker>(
    thread_name: String,
    mut worker: W,
    queue: Arc<TaskQueue<Job<W::Input, W::Output>>>,
    in_flight: Arc<AtomicUsize>,
) -> W {
    while let Some(Job { input, reply }) = queue.pop() {
        let result = catch_unwind(AssertUnwindSafe(|| worker.process(input))).map_err(|payload| {
            let message = panic_message(payload.as_ref());
            WorkerPanicked {
                thread: &thread_name,
                message: &message,
            }
            .log();
            PoolError::TaskPanicked { message }
        });
        // the receiver may already be gone; the result is simply dropped then
        let _ = reply.send(result);
        in_flight.fetch_sub(1, Ordering::AcqRel);
    }
    worker
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
