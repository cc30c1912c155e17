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

//! Per-window attachment tracking.

use crate::platform::window::{PresentWindow, WindowId};
use crate::present::context::ContextId;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// One window plus the set of contexts currently attached to it.
///
/// The `attached` mutex is the per-window lock; insertion and removal are
/// safe under concurrent access from multiple contexts' owning threads.
pub struct WindowBinding {
    window: Arc<dyn PresentWindow>,
    attached: Mutex<HashSet<ContextId>>,
}

impl WindowBinding {
    fn new(window: Arc<dyn PresentWindow>) -> Self {
        Self {
            window,
            attached: Mutex::new(HashSet::new()),
        }
    }

    /// Returns the window this binding tracks.
    #[must_use]
    pub fn window(&self) -> &Arc<dyn PresentWindow> {
        &self.window
    }

    /// Adds a context to the attachment set. Re-attaching is a no-op.
    pub fn attach(&self, context: ContextId) {
        self.attached.lock().unwrap().insert(context);
    }

    /// Removes a context from the attachment set.
    pub fn detach(&self, context: ContextId) -> bool {
        self.attached.lock().unwrap().remove(&context)
    }

    /// Snapshots the attached contexts.
    #[must_use]
    pub fn attached_ids(&self) -> Vec<ContextId> {
        self.attached.lock().unwrap().iter().copied().collect()
    }

    fn is_empty(&self) -> bool {
        self.attached.lock().unwrap().is_empty()
    }
}

impl std::fmt::Debug for WindowBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowBinding")
            .field("window", &self.window.id())
            .field("attached", &self.attached.lock().unwrap())
            .finish()
    }
}

/// Maps each window to its attachment set.
///
/// Used to fan out surface-change notifications to every context bound to
/// a window when its screen or geometry changes.
#[derive(Debug, Default)]
pub struct WindowBindingRegistry {
    bindings: Mutex<HashMap<WindowId, Arc<WindowBinding>>>,
}

impl WindowBindingRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            bindings: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the binding for a window, creating it on first use.
    pub fn binding_for(&self, window: &Arc<dyn PresentWindow>) -> Arc<WindowBinding> {
        let mut bindings = self.bindings.lock().unwrap();
        Arc::clone(
            bindings
                .entry(window.id())
                .or_insert_with(|| Arc::new(WindowBinding::new(Arc::clone(window)))),
        )
    }

    /// Looks up the binding for a window id.
    #[must_use]
    pub fn get(&self, id: WindowId) -> Option<Arc<WindowBinding>> {
        self.bindings.lock().unwrap().get(&id).cloned()
    }

    /// Detaches a context from a window, dropping the binding once its
    /// attachment set empties.
    pub fn detach(&self, id: WindowId, context: ContextId) {
        let mut bindings = self.bindings.lock().unwrap();
        if let Some(binding) = bindings.get(&id) {
            binding.detach(context);
            if binding.is_empty() {
                bindings.remove(&id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::window::{DisplayId, SurfaceHandle};

    #[derive(Debug)]
    struct FakeWindow {
        id: WindowId,
    }

    impl PresentWindow for FakeWindow {
        fn id(&self) -> WindowId {
            self.id
        }

        fn surface_handle(&self) -> SurfaceHandle {
            SurfaceHandle(0)
        }

        fn display_id(&self) -> DisplayId {
            DisplayId(0)
        }
    }

    fn fake_window(id: u64) -> Arc<dyn PresentWindow> {
        Arc::new(FakeWindow { id: WindowId(id) })
    }

    #[test]
    fn test_attach_is_idempotent() {
        let registry = WindowBindingRegistry::new();
        let window = fake_window(1);
        let ctx = ContextId(7);

        let binding = registry.binding_for(&window);
        binding.attach(ctx);
        binding.attach(ctx);

        assert_eq!(binding.attached_ids(), vec![ctx]);
    }

    #[test]
    fn test_detach_drops_empty_binding() {
        let registry = WindowBindingRegistry::new();
        let window = fake_window(2);
        let ctx = ContextId(9);

        registry.binding_for(&window).attach(ctx);
        assert!(registry.get(WindowId(2)).is_some());

        registry.detach(WindowId(2), ctx);
        assert!(registry.get(WindowId(2)).is_none());
    }

    #[test]
    fn test_detach_unknown_window_is_noop() {
        let registry = WindowBindingRegistry::new();
        registry.detach(WindowId(99), ContextId(1));
    }
}
