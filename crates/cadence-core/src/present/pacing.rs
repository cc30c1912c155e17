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

//! Per-context swap pacing state and the scheduling policy.
//!
//! Pacing counts elapsed hardware refreshes instead of sleeping for a
//! computed duration: the refresh source is hardware-driven, so counting
//! keeps pacing correct under variable refresh rates and cannot drift.
//!
//! The counter is mutated by exactly two parties: the refresh tick
//! (increment) and the owning render thread inside swap (read/reset),
//! always under the pacing mutex. The interval setting itself is an
//! atomic so the tick path can skip all locking when pacing is off.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Condvar, Mutex};

/// Swap interval semantics.
///
/// * `0`: unsynced, swaps proceed immediately.
/// * `N > 0`: sync to every Nth refresh, phase-aligned to refresh
///   boundaries rather than wall-clock time.
/// * `< 0`: late swap tearing, swap on the next available tick rather
///   than waiting for phase alignment, trading tearing for reduced
///   latency when behind schedule.
pub type SwapInterval = i32;

/// Shared pacing state for one context.
///
/// The owning context holds one [`std::sync::Arc`] and its refresh
/// notifier subscription holds the other; nothing else may touch it.
#[derive(Debug)]
pub struct PacingState {
    interval: AtomicI32,
    elapsed: Mutex<u32>,
    due: Condvar,
}

impl PacingState {
    /// Creates pacing state with syncing disabled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            interval: AtomicI32::new(0),
            elapsed: Mutex::new(0),
            due: Condvar::new(),
        }
    }

    /// Replaces the interval setting.
    pub fn set_interval(&self, interval: SwapInterval) {
        self.interval.store(interval, Ordering::Release);
    }

    /// Returns the current interval setting.
    #[must_use]
    pub fn interval(&self) -> SwapInterval {
        self.interval.load(Ordering::Acquire)
    }

    /// Records one hardware refresh tick.
    ///
    /// Called from the refresh source's delivery thread. When syncing is
    /// disabled this takes no lock at all; the delivery thread must never
    /// be stalled by an idle context.
    pub fn on_refresh(&self) {
        if self.interval.load(Ordering::Acquire) == 0 {
            return;
        }
        let mut elapsed = self.elapsed.lock().unwrap();
        *elapsed = elapsed.wrapping_add(1);
        self.due.notify_all();
    }

    /// Blocks the calling render thread until the pacing policy allows a
    /// swap, then consumes the elapsed-interval counter.
    ///
    /// * interval `0`: returns immediately, no lock taken.
    /// * interval `< 0`: waits only while no tick has been observed; ticks
    ///   that arrived while the context was idle satisfy the wait
    ///   immediately, with no backlog to drain.
    /// * interval `N > 0`: waits at least one tick, until the counter
    ///   reaches a multiple of N. Back-to-back swaps therefore always see
    ///   at least N refreshes between completions.
    ///
    /// The counter is 0 when this returns.
    pub fn await_due(&self) {
        let setting = self.interval.load(Ordering::Acquire);
        if setting == 0 {
            return;
        }
        let mut elapsed = self.elapsed.lock().unwrap();
        if setting < 0 {
            while *elapsed == 0 {
                elapsed = self.due.wait(elapsed).unwrap();
            }
        } else {
            let nth = setting as u32;
            loop {
                elapsed = self.due.wait(elapsed).unwrap();
                if *elapsed % nth == 0 {
                    break;
                }
            }
        }
        *elapsed = 0;
    }

    #[cfg(test)]
    fn elapsed_for_test(&self) -> u32 {
        *self.elapsed.lock().unwrap()
    }
}

impl Default for PacingState {
    fn default() -> Self {
        Self::new()
    }
}
