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

//! The per-context refresh subscription.

use crate::platform::window::DisplayId;
use crate::present::error::PresentError;
use crate::present::pacing::PacingState;
use crate::present::traits::refresh::{RefreshHandler, RefreshSource};
use std::sync::{Arc, Mutex};

/// Owns one context's subscription to a hardware refresh source.
///
/// The installed tick handler does nothing but forward to
/// [`PacingState::on_refresh`]: a counter increment and a signal. It has
/// no return channel, so it must not be able to fail; anything fallible
/// happens at start/retarget time on the caller's thread instead.
#[derive(Debug)]
pub struct RefreshNotifier {
    source: Mutex<Box<dyn RefreshSource>>,
}

impl RefreshNotifier {
    /// Starts tick delivery against the given display and returns the
    /// running subscription.
    ///
    /// The source's creation and start are both checked; a failure here
    /// fails context creation rather than leaving a context silently
    /// unpaced.
    pub fn start(
        mut source: Box<dyn RefreshSource>,
        display: DisplayId,
        pacing: Arc<PacingState>,
    ) -> Result<Self, PresentError> {
        let handler: RefreshHandler = Arc::new(move || pacing.on_refresh());
        source.start(display, handler)?;
        log::debug!("Refresh notifier started on display {display:?}.");
        Ok(Self {
            source: Mutex::new(source),
        })
    }

    /// Re-associates tick delivery with a new display.
    pub fn retarget(&self, display: DisplayId) -> Result<(), PresentError> {
        log::debug!("Refresh notifier retargeting to display {display:?}.");
        self.source.lock().unwrap().retarget(display)
    }

    /// Halts tick delivery and releases the underlying timer.
    pub fn stop(&self) {
        self.source.lock().unwrap().stop();
    }
}

impl Drop for RefreshNotifier {
    fn drop(&mut self) {
        // Sources require stop() to be idempotent, so an explicit stop
        // followed by drop is fine.
        self.stop();
    }
}
