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

//! The window contract consumed by the presentation core.
//!
//! Cadence does not create or destroy windows. It only needs three facts
//! about one: a stable identity, the native surface currently backing it,
//! and the display it currently sits on. Any windowing backend (winit,
//! SDL, a test double) can implement this trait to be compatible.

/// Stable identifier of a window for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId(pub u64);

/// Opaque token for the native drawable surface backing a window.
///
/// The token changes whenever the windowing system replaces the surface
/// (screen move, geometry change, backing-store reallocation). Cadence
/// never interprets it; it only compares tokens and passes them through
/// to the native context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceHandle(pub u64);

/// Identifier of a physical display, used to target refresh delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DisplayId(pub u64);

/// A trait that abstracts the behavior of a window.
///
/// Implementations must be callable from any thread: the presentation core
/// reads the surface handle from render threads and from the dispatch
/// thread, and reads the display id from whichever thread reports a window
/// move.
pub trait PresentWindow: Send + Sync {
    /// Returns the unique identifier for the window.
    fn id(&self) -> WindowId;

    /// Returns the token of the surface currently backing the window.
    fn surface_handle(&self) -> SurfaceHandle;

    /// Returns the display the window currently sits on.
    fn display_id(&self) -> DisplayId;
}
