// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The designated-thread executor used for surface-update marshaling.
//!
//! Surface reconciliation is only legal on one thread in the underlying
//! windowing system. This executor models that thread as the owner of a
//! task queue: construct the dispatcher *on* that thread, then have it
//! call [`MainThreadDispatcher::pump`] or
//! [`MainThreadDispatcher::run_until_stopped`] while other threads submit
//! work.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::ThreadId;

type Task = Box<dyn FnOnce() + Send>;

/// A task queue processed by one designated thread.
#[derive(Debug)]
pub struct MainThreadDispatcher {
    sender: flume::Sender<Task>,
    receiver: flume::Receiver<Task>,
    owner: ThreadId,
    stopped: AtomicBool,
}

impl MainThreadDispatcher {
    /// Creates a dispatcher owned by the calling thread.
    ///
    /// The calling thread becomes the designated dispatch thread; it is
    /// the only thread that may pump the queue.
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = flume::unbounded();
        log::info!("Main-thread dispatcher initialized.");
        Self {
            sender,
            receiver,
            owner: std::thread::current().id(),
            stopped: AtomicBool::new(false),
        }
    }

    /// Returns `true` when called on the designated dispatch thread.
    #[must_use]
    pub fn is_dispatch_thread(&self) -> bool {
        std::thread::current().id() == self.owner
    }

    /// Submits a task without waiting for it to run.
    pub fn submit(&self, task: impl FnOnce() + Send + 'static) {
        if self.sender.send(Box::new(task)).is_err() {
            log::error!("Dispatch queue disconnected; task dropped.");
        }
    }

    /// Submits a task and blocks until the dispatch thread has run it.
    ///
    /// Called on the dispatch thread itself, the task runs inline instead
    /// (waiting on our own queue would deadlock).
    pub fn submit_wait(&self, task: impl FnOnce() + Send + 'static) {
        if self.is_dispatch_thread() {
            task();
            return;
        }
        let (done_tx, done_rx) = flume::bounded::<()>(1);
        self.submit(move || {
            task();
            let _ = done_tx.send(());
        });
        if done_rx.recv().is_err() {
            // The dispatcher stopped before running the task; there is no
            // result to wait for.
            log::error!("Dispatch thread stopped before completing a blocking task.");
        }
    }

    /// Drains and runs every task currently queued, without blocking.
    ///
    /// Must be called on the dispatch thread.
    pub fn pump(&self) {
        debug_assert!(self.is_dispatch_thread(), "pump called off the dispatch thread");
        while let Ok(task) = self.receiver.try_recv() {
            task();
        }
    }

    /// Runs tasks until [`MainThreadDispatcher::stop`] is called.
    ///
    /// Must be called on the dispatch thread.
    pub fn run_until_stopped(&self) {
        debug_assert!(self.is_dispatch_thread(), "run called off the dispatch thread");
        while !self.stopped.load(Ordering::Acquire) {
            match self.receiver.recv() {
                Ok(task) => task(),
                Err(_) => break,
            }
        }
        // Drain whatever raced in while stopping so blocking submitters
        // are released.
        self.pump();
        log::info!("Main-thread dispatcher stopped.");
    }

    /// Signals the run loop to exit after the current task.
    ///
    /// Tasks submitted after the loop exits are only run by a subsequent
    /// [`MainThreadDispatcher::pump`] on the dispatch thread.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
        // Wake the run loop if it is parked in recv().
        self.submit(|| {});
    }
}

impl Default for MainThreadDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
