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

//! A window stand-in implementing the `PresentWindow` trait.

use cadence_core::platform::window::{DisplayId, PresentWindow, SurfaceHandle, WindowId};
use std::sync::atomic::{AtomicU64, Ordering};

/// A window whose surface and display can be changed from tests to
/// simulate backing-store reallocation and screen moves.
#[derive(Debug)]
pub struct HeadlessWindow {
    id: WindowId,
    surface: AtomicU64,
    display: AtomicU64,
}

impl HeadlessWindow {
    /// Creates a window with the given identity, surface, and display.
    #[must_use]
    pub fn new(id: WindowId, surface: SurfaceHandle, display: DisplayId) -> Self {
        Self {
            id,
            surface: AtomicU64::new(surface.0),
            display: AtomicU64::new(display.0),
        }
    }

    /// Simulates the windowing system replacing the backing surface.
    pub fn set_surface(&self, surface: SurfaceHandle) {
        self.surface.store(surface.0, Ordering::SeqCst);
    }

    /// Simulates the window moving to another display.
    pub fn move_to_display(&self, display: DisplayId) {
        self.display.store(display.0, Ordering::SeqCst);
    }
}

impl PresentWindow for HeadlessWindow {
    fn id(&self) -> WindowId {
        self.id
    }

    fn surface_handle(&self) -> SurfaceHandle {
        SurfaceHandle(self.surface.load(Ordering::SeqCst))
    }

    fn display_id(&self) -> DisplayId {
        DisplayId(self.display.load(Ordering::SeqCst))
    }
}
