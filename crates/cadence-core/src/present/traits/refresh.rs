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

//! The hardware refresh timer seam.

use crate::platform::window::DisplayId;
use crate::present::error::PresentError;
use std::fmt;
use std::sync::Arc;

/// Callback invoked once per physical display refresh.
///
/// The handler runs on the source's delivery thread, which is driven by
/// the host display pipeline. It must return promptly and must never
/// block on application logic; blocking here stalls the display pipeline.
pub type RefreshHandler = Arc<dyn Fn() + Send + Sync>;

/// A hardware-driven timer that fires once per display refresh interval.
///
/// Implementations deliver ticks independently of any render loop. A
/// source starts against one display and can be re-associated when the
/// window it serves moves screens.
pub trait RefreshSource: Send + fmt::Debug {
    /// Begins tick delivery for the given display.
    ///
    /// Starting an already started source is an error.
    fn start(&mut self, display: DisplayId, handler: RefreshHandler) -> Result<(), PresentError>;

    /// Re-associates delivery with a new display.
    fn retarget(&mut self, display: DisplayId) -> Result<(), PresentError>;

    /// Halts delivery and releases underlying timer resources.
    ///
    /// Must be idempotent: the owning notifier calls this both on
    /// explicit teardown and on drop.
    fn stop(&mut self);
}
