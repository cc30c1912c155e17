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

//! A thread-based stand-in for a hardware display link.
//!
//! Real platforms tie refresh delivery to the display pipeline; this
//! driver approximates it with a background thread ticking at each
//! display's configured period. Good enough for demos and soak tests,
//! not a substitute for true vblank alignment.

use cadence_core::platform::window::DisplayId;
use cadence_core::present::error::PresentError;
use cadence_core::present::traits::refresh::{RefreshHandler, RefreshSource};
use crossbeam_channel::{RecvTimeoutError, Sender};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

enum DriverCommand {
    Retarget(DisplayId),
}

/// Fires a refresh handler once per configured display period from a
/// background thread.
#[derive(Debug)]
pub struct ThreadRefreshDriver {
    default_period: Duration,
    display_periods: HashMap<DisplayId, Duration>,
    running: Arc<AtomicBool>,
    control: Option<Sender<DriverCommand>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ThreadRefreshDriver {
    /// Creates a driver ticking every display at the given period.
    #[must_use]
    pub fn new(default_period: Duration) -> Self {
        Self {
            default_period,
            display_periods: HashMap::new(),
            running: Arc::new(AtomicBool::new(false)),
            control: None,
            handle: None,
        }
    }

    /// Overrides the period for one display.
    #[must_use]
    pub fn with_display_period(mut self, display: DisplayId, period: Duration) -> Self {
        self.display_periods.insert(display, period);
        self
    }

    fn period_for(
        periods: &HashMap<DisplayId, Duration>,
        default: Duration,
        display: DisplayId,
    ) -> Duration {
        periods.get(&display).copied().unwrap_or(default)
    }
}

impl RefreshSource for ThreadRefreshDriver {
    fn start(&mut self, display: DisplayId, handler: RefreshHandler) -> Result<(), PresentError> {
        if self.handle.is_some() {
            return Err(PresentError::Backend {
                details: "refresh driver already started".to_string(),
            });
        }

        let (control_tx, control_rx) = crossbeam_channel::unbounded();
        self.running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.running);
        let periods = self.display_periods.clone();
        let default_period = self.default_period;
        let mut period = Self::period_for(&periods, default_period, display);

        let handle = thread::Builder::new()
            .name("cadence-refresh".to_string())
            .spawn(move || {
                log::debug!("Refresh driver thread started ({period:?} on {display:?}).");
                while running.load(Ordering::Relaxed) {
                    match control_rx.recv_timeout(period) {
                        Ok(DriverCommand::Retarget(new_display)) => {
                            period = Self::period_for(&periods, default_period, new_display);
                            log::debug!(
                                "Refresh driver retargeted to {new_display:?} ({period:?})."
                            );
                        }
                        Err(RecvTimeoutError::Timeout) => handler(),
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                log::debug!("Refresh driver thread exited.");
            })
            .map_err(|e| PresentError::ResourceAllocation {
                what: "refresh driver thread",
                details: e.to_string(),
            })?;

        self.control = Some(control_tx);
        self.handle = Some(handle);
        Ok(())
    }

    fn retarget(&mut self, display: DisplayId) -> Result<(), PresentError> {
        let Some(control) = &self.control else {
            return Err(PresentError::Backend {
                details: "refresh driver not started".to_string(),
            });
        };
        control
            .send(DriverCommand::Retarget(display))
            .map_err(|_| PresentError::Backend {
                details: "refresh driver thread is gone".to_string(),
            })
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        // Dropping the sender wakes a parked recv_timeout immediately.
        self.control = None;
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ThreadRefreshDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    #[test]
    fn test_driver_delivers_ticks() {
        let mut driver = ThreadRefreshDriver::new(Duration::from_millis(2));
        let ticks = Arc::new(AtomicU32::new(0));
        let observed = Arc::clone(&ticks);
        driver
            .start(
                DisplayId(0),
                Arc::new(move || {
                    observed.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .unwrap();

        while ticks.load(Ordering::SeqCst) < 3 {
            thread::yield_now();
        }
        driver.stop();
    }

    #[test]
    fn test_double_start_is_rejected() {
        let mut driver = ThreadRefreshDriver::new(Duration::from_millis(5));
        driver.start(DisplayId(0), Arc::new(|| {})).unwrap();
        assert!(driver.start(DisplayId(0), Arc::new(|| {})).is_err());
        driver.stop();
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut driver = ThreadRefreshDriver::new(Duration::from_millis(5));
        driver.start(DisplayId(0), Arc::new(|| {})).unwrap();
        driver.stop();
        driver.stop();
    }

    #[test]
    fn test_retarget_before_start_fails() {
        let mut driver = ThreadRefreshDriver::new(Duration::from_millis(5));
        assert!(driver.retarget(DisplayId(1)).is_err());
    }
}
