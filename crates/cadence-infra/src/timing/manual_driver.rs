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

//! A manually pumped refresh source.
//!
//! Deterministic replacement for the thread driver: the test (or replay
//! harness) decides exactly when a "hardware" refresh happens by calling
//! [`RefreshPump::tick`]. Every driver created from the same pump shares
//! its tick stream, like contexts sharing one physical display.

use cadence_core::platform::window::DisplayId;
use cadence_core::present::error::PresentError;
use cadence_core::present::traits::refresh::{RefreshHandler, RefreshSource};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Fans one manually driven tick stream out to registered drivers.
#[derive(Default)]
pub struct RefreshPump {
    handlers: Mutex<Vec<(u64, RefreshHandler)>>,
    next_slot: AtomicU64,
    ticks: AtomicU64,
}

impl RefreshPump {
    /// Creates an empty pump.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers one refresh tick to every registered handler.
    pub fn tick(&self) {
        self.ticks.fetch_add(1, Ordering::SeqCst);
        for (_, handler) in self.handlers.lock().unwrap().iter() {
            handler();
        }
    }

    /// Returns how many ticks have been delivered so far.
    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    fn register(&self, handler: RefreshHandler) -> u64 {
        let slot = self.next_slot.fetch_add(1, Ordering::Relaxed);
        self.handlers.lock().unwrap().push((slot, handler));
        slot
    }

    fn deregister(&self, slot: u64) {
        self.handlers
            .lock()
            .unwrap()
            .retain(|(registered, _)| *registered != slot);
    }
}

impl fmt::Debug for RefreshPump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshPump")
            .field("handlers", &self.handlers.lock().unwrap().len())
            .field("ticks", &self.tick_count())
            .finish()
    }
}

/// A [`RefreshSource`] driven by a shared [`RefreshPump`].
#[derive(Debug)]
pub struct ManualRefreshDriver {
    pump: Arc<RefreshPump>,
    slot: Option<u64>,
}

impl ManualRefreshDriver {
    /// Creates a driver fed by the given pump.
    #[must_use]
    pub fn new(pump: Arc<RefreshPump>) -> Self {
        Self { pump, slot: None }
    }
}

impl RefreshSource for ManualRefreshDriver {
    fn start(&mut self, display: DisplayId, handler: RefreshHandler) -> Result<(), PresentError> {
        if self.slot.is_some() {
            return Err(PresentError::Backend {
                details: "manual refresh driver already started".to_string(),
            });
        }
        self.slot = Some(self.pump.register(handler));
        log::debug!("Manual refresh driver registered for {display:?}.");
        Ok(())
    }

    fn retarget(&mut self, _display: DisplayId) -> Result<(), PresentError> {
        // One pump stands in for every display; delivery is unchanged.
        if self.slot.is_none() {
            return Err(PresentError::Backend {
                details: "manual refresh driver not started".to_string(),
            });
        }
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(slot) = self.slot.take() {
            self.pump.deregister(slot);
        }
    }
}
