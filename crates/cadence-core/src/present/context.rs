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

//! The per-context record and its lifecycle.

use crate::platform::window::WindowId;
use crate::present::notifier::RefreshNotifier;
use crate::present::pacing::PacingState;
use crate::present::traits::native::{NativeContext, PixelFormatDescriptor};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of a live context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(pub u64);

impl ContextId {
    pub(crate) fn allocate() -> Self {
        Self(NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Lifecycle state of a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Constructed, never bound to a window.
    Created,
    /// Bound to exactly one window.
    Bound,
    /// Previously bound, currently detached.
    Unbound,
    /// Torn down; the record is about to be dropped.
    Destroyed,
}

/// One live rendering context bound to at most one window at a time.
///
/// The record exclusively owns its native handle, its pacing primitives
/// (shared only with the refresh subscription), and the subscription
/// itself. The window back-reference is a plain id resolved through the
/// binding registry, never a counted reference.
#[derive(Debug)]
pub struct PresentContext {
    id: ContextId,
    native: Box<dyn NativeContext>,
    format: PixelFormatDescriptor,
    pacing: Arc<PacingState>,
    notifier: RefreshNotifier,
    pending_update: AtomicU32,
    window: Mutex<Option<WindowId>>,
    state: Mutex<LifecycleState>,
}

impl PresentContext {
    pub(crate) fn new(
        id: ContextId,
        native: Box<dyn NativeContext>,
        format: PixelFormatDescriptor,
        pacing: Arc<PacingState>,
        notifier: RefreshNotifier,
    ) -> Self {
        Self {
            id,
            native,
            format,
            pacing,
            notifier,
            pending_update: AtomicU32::new(0),
            window: Mutex::new(None),
            state: Mutex::new(LifecycleState::Created),
        }
    }

    /// Returns this context's identifier.
    #[must_use]
    pub fn id(&self) -> ContextId {
        self.id
    }

    /// Returns the opaque pixel-format token the context was created with.
    #[must_use]
    pub fn format(&self) -> PixelFormatDescriptor {
        self.format
    }

    pub(crate) fn native(&self) -> &dyn NativeContext {
        self.native.as_ref()
    }

    pub(crate) fn pacing(&self) -> &Arc<PacingState> {
        &self.pacing
    }

    pub(crate) fn notifier(&self) -> &RefreshNotifier {
        &self.notifier
    }

    /// Returns the window this context is currently bound to.
    #[must_use]
    pub fn bound_window(&self) -> Option<WindowId> {
        *self.window.lock().unwrap()
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        *self.state.lock().unwrap()
    }

    /// Marks the context's surface as out of sync with its window.
    ///
    /// Safe to call from any thread; the marker is consumed by the next
    /// apply on the thread that owns the context as current.
    pub fn schedule_update(&self) {
        self.pending_update.fetch_add(1, Ordering::AcqRel);
    }

    /// Atomically reads and clears the dirty marker.
    pub(crate) fn take_pending(&self) -> u32 {
        self.pending_update.swap(0, Ordering::AcqRel)
    }

    pub(crate) fn set_bound(&self, window: WindowId) {
        *self.window.lock().unwrap() = Some(window);
        let mut state = self.state.lock().unwrap();
        log::debug!("Context {:?}: {:?} -> Bound ({window:?}).", self.id, *state);
        *state = LifecycleState::Bound;
    }

    pub(crate) fn set_unbound(&self) {
        *self.window.lock().unwrap() = None;
        *self.state.lock().unwrap() = LifecycleState::Unbound;
    }

    pub(crate) fn mark_destroyed(&self) {
        *self.window.lock().unwrap() = None;
        *self.state.lock().unwrap() = LifecycleState::Destroyed;
    }

    pub(crate) fn is_destroyed(&self) -> bool {
        self.state() == LifecycleState::Destroyed
    }
}
