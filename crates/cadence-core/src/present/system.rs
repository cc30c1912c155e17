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

//! The presentation system: context lifecycle, binding, and paced swaps.
//!
//! One `PresentSystem` fronts one native backend. Render threads own at
//! most one current context each (tracked thread-locally); refresh
//! sources tick on their own delivery threads; surface updates marshal to
//! the designated dispatch thread. The swap path waits out pacing first,
//! then serializes the actual driver flush behind the process-wide flush
//! lock.

use crate::config::marshal::{self, MarshalPolicy, SubscriptionId};
use crate::dispatch::executor::MainThreadDispatcher;
use crate::platform::window::{DisplayId, PresentWindow, WindowId};
use crate::present::context::{ContextId, LifecycleState, PresentContext};
use crate::present::error::PresentError;
use crate::present::flush;
use crate::present::notifier::RefreshNotifier;
use crate::present::pacing::{PacingState, SwapInterval};
use crate::present::registry::{WindowBinding, WindowBindingRegistry};
use crate::present::traits::native::{
    ApiVersion, ContextProfile, NativeBackend, PixelFormatDescriptor,
};
use std::cell::Cell;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

thread_local! {
    static CURRENT_CONTEXT: Cell<Option<ContextId>> = Cell::new(None);
}

/// Parameters for context creation.
#[derive(Debug, Clone)]
pub struct ContextConfig {
    /// Opaque pixel-format token, passed through to the backend.
    pub format: PixelFormatDescriptor,
    /// An existing context to share object namespaces with.
    pub share: Option<ContextId>,
    /// Minimum API version the caller requires, if any.
    pub min_version: Option<ApiVersion>,
    /// The rendering profile to request.
    pub profile: ContextProfile,
    /// The display implied by the target window's pixel format; refresh
    /// delivery starts against it.
    pub initial_display: DisplayId,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            format: PixelFormatDescriptor::default(),
            share: None,
            min_version: None,
            profile: ContextProfile::Core,
            initial_display: DisplayId(0),
        }
    }
}

/// Manages every rendering context created against one native backend.
#[derive(Debug)]
pub struct PresentSystem {
    backend: Arc<dyn NativeBackend>,
    dispatcher: Arc<MainThreadDispatcher>,
    registry: WindowBindingRegistry,
    contexts: Mutex<HashMap<ContextId, Arc<PresentContext>>>,
    policy_subscription: SubscriptionId,
}

impl PresentSystem {
    /// Creates a presentation system over the given backend.
    ///
    /// Registers a marshal-policy subscriber for the system's lifetime;
    /// `Drop` deregisters it.
    pub fn new(backend: Arc<dyn NativeBackend>, dispatcher: Arc<MainThreadDispatcher>) -> Self {
        let policy_subscription = marshal::subscribe(Box::new(|policy| {
            log::debug!("Presentation marshal policy now {policy:?}.");
        }));
        log::info!("Present system initialized.");
        Self {
            backend,
            dispatcher,
            registry: WindowBindingRegistry::new(),
            contexts: Mutex::new(HashMap::new()),
            policy_subscription,
        }
    }

    /// Creates a context and makes it current on the calling thread.
    ///
    /// Validates the negotiated API version and requested profile, and
    /// starts refresh delivery for the context. Every step is checked; on
    /// failure all partial allocations unwind and no context is
    /// registered.
    ///
    /// ## Arguments
    /// * `config` - Creation parameters; see [`ContextConfig`].
    ///
    /// ## Returns
    /// The id of the new context, or the first failure encountered.
    pub fn create_context(&self, config: &ContextConfig) -> Result<ContextId, PresentError> {
        let share = match config.share {
            Some(share_id) => Some(self.context(share_id)?),
            None => None,
        };
        let native = self
            .backend
            .create_context(&config.format, share.as_ref().map(|ctx| ctx.native()))?;

        let negotiated = native.api_version();
        if let Some(requested) = config.min_version {
            if negotiated < requested {
                return Err(PresentError::VersionNegotiation {
                    requested,
                    negotiated,
                });
            }
        }
        if !native.supports_profile(config.profile) {
            return Err(PresentError::UnsupportedProfile {
                profile: config.profile,
            });
        }

        let pacing = Arc::new(PacingState::new());
        let source = self.backend.create_refresh_source()?;
        let notifier = RefreshNotifier::start(source, config.initial_display, Arc::clone(&pacing))?;

        native.make_current()?;

        let id = ContextId::allocate();
        let context = Arc::new(PresentContext::new(
            id,
            native,
            config.format,
            pacing,
            notifier,
        ));
        self.contexts.lock().unwrap().insert(id, context);
        CURRENT_CONTEXT.with(|current| current.set(Some(id)));
        log::info!("Context {id:?} created (API version {negotiated}).");
        Ok(id)
    }

    /// Binds a context to a window, moving it out of any previous window.
    ///
    /// Requires the context to be current on the calling thread. If the
    /// window's surface differs from the one the native context renders
    /// into, the context is marked dirty and the update is applied
    /// immediately (marshaled if this is not the dispatch thread).
    pub fn bind(
        &self,
        id: ContextId,
        window: &Arc<dyn PresentWindow>,
    ) -> Result<(), PresentError> {
        let context = self.context(id)?;
        self.ensure_current(id, "bind")?;

        if let Some(previous) = context.bound_window() {
            if previous != window.id() {
                self.registry.detach(previous, id);
                context.set_unbound();
            }
        }

        let binding = self.registry.binding_for(window);
        binding.attach(id);
        context.set_bound(window.id());

        if context.native().current_surface() != Some(window.surface_handle()) {
            context.schedule_update();
            // Current on this thread, so apply now instead of deferring
            // to the next swap.
            self.apply_if_dirty(&context);
        }
        Ok(())
    }

    /// Makes a context current on the calling thread, or clears the
    /// thread's current context.
    ///
    /// Making a context current applies any pending surface update.
    pub fn make_current(&self, id: Option<ContextId>) -> Result<(), PresentError> {
        match id {
            Some(id) => {
                let context = self.context(id)?;
                context.native().make_current()?;
                CURRENT_CONTEXT.with(|current| current.set(Some(id)));
                self.apply_if_dirty(&context);
            }
            None => {
                CURRENT_CONTEXT.with(|current| current.set(None));
                self.backend.clear_current();
            }
        }
        Ok(())
    }

    /// Replaces a context's swap interval (see [`SwapInterval`]).
    ///
    /// Requires the context to be current on the calling thread.
    pub fn set_swap_interval(
        &self,
        id: ContextId,
        interval: SwapInterval,
    ) -> Result<(), PresentError> {
        let context = self.context(id)?;
        self.ensure_current(id, "set_swap_interval")?;
        context.pacing().set_interval(interval);
        log::debug!("Context {id:?} swap interval set to {interval}.");
        Ok(())
    }

    /// Returns a context's swap interval.
    ///
    /// Requires the context to be current on the calling thread.
    pub fn swap_interval(&self, id: ContextId) -> Result<SwapInterval, PresentError> {
        let context = self.context(id)?;
        self.ensure_current(id, "swap_interval")?;
        Ok(context.pacing().interval())
    }

    /// Presents the context's back buffer.
    ///
    /// Blocks per the pacing policy, then flushes the native context and
    /// applies any pending surface update inside the flush critical
    /// section.
    pub fn swap(&self, id: ContextId) -> Result<(), PresentError> {
        let context = self.context(id)?;
        self.ensure_current(id, "swap")?;

        // Pacing happens outside the flush lock so unrelated contexts
        // never wait on each other's refresh cadence.
        context.pacing().await_due();

        let _flush_guard = flush::lock_native_flush();
        context.native().flush()?;
        self.apply_if_dirty(&context);
        Ok(())
    }

    /// Tears down a context: unbinds it, stops refresh delivery, and
    /// drops the record.
    ///
    /// Returns `false` (and logs a warning) if the id does not refer to a
    /// live context; destroying twice is a documented no-op, not
    /// undefined behavior. Destroying a context that another thread is
    /// currently blocked inside `swap` for is a caller error and must be
    /// avoided.
    pub fn destroy_context(&self, id: ContextId) -> bool {
        let removed = self.contexts.lock().unwrap().remove(&id);
        let Some(context) = removed else {
            log::warn!("destroy_context: {id:?} is unknown or already destroyed.");
            return false;
        };
        if let Some(window) = context.bound_window() {
            self.registry.detach(window, id);
        }
        context.notifier().stop();
        context.mark_destroyed();
        if CURRENT_CONTEXT.with(|current| current.get()) == Some(id) {
            CURRENT_CONTEXT.with(|current| current.set(None));
            self.backend.clear_current();
        }
        log::info!("Context {id:?} destroyed.");
        true
    }

    /// Reports that a window changed screens or geometry.
    ///
    /// Retargets every attached context's refresh source to the window's
    /// current display and marks the contexts dirty; each applies the
    /// update the next time it is current.
    pub fn notify_window_moved(&self, window: WindowId) {
        let Some(binding) = self.registry.get(window) else {
            log::debug!("Window {window:?} moved with no attached contexts.");
            return;
        };
        let display = binding.window().display_id();
        for context_id in binding.attached_ids() {
            let Ok(context) = self.context(context_id) else {
                continue;
            };
            if let Err(e) = context.notifier().retarget(display) {
                log::warn!("Failed to retarget refresh source for {context_id:?}: {e}");
            }
            context.schedule_update();
        }
    }

    /// Marks a context's surface as out of sync. Safe from any thread.
    pub fn schedule_update(&self, id: ContextId) -> Result<(), PresentError> {
        self.context(id)?.schedule_update();
        Ok(())
    }

    /// Returns the context current on the calling thread, if any.
    #[must_use]
    pub fn current_context(&self) -> Option<ContextId> {
        CURRENT_CONTEXT.with(|current| current.get())
    }

    /// Snapshots the contexts attached to a window.
    #[must_use]
    pub fn attached_contexts(&self, window: WindowId) -> Vec<ContextId> {
        self.registry
            .get(window)
            .map(|binding| binding.attached_ids())
            .unwrap_or_default()
    }

    /// Returns a context's lifecycle state.
    pub fn lifecycle_state(&self, id: ContextId) -> Result<LifecycleState, PresentError> {
        Ok(self.context(id)?.state())
    }

    /// Returns the number of live contexts.
    #[must_use]
    pub fn context_count(&self) -> usize {
        self.contexts.lock().unwrap().len()
    }

    fn context(&self, id: ContextId) -> Result<Arc<PresentContext>, PresentError> {
        self.contexts
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(PresentError::UnknownContext { id })
    }

    fn ensure_current(&self, id: ContextId, operation: &str) -> Result<(), PresentError> {
        if CURRENT_CONTEXT.with(|current| current.get()) == Some(id) {
            Ok(())
        } else {
            Err(PresentError::NoCurrentContext {
                details: format!(
                    "{operation} requires the context to be current on the calling thread"
                ),
            })
        }
    }

    /// Reads-and-clears the dirty marker; reconciles at most once no
    /// matter how many updates were scheduled since the last apply.
    fn apply_if_dirty(&self, context: &Arc<PresentContext>) {
        if context.take_pending() == 0 {
            return;
        }
        let Some(window) = context.bound_window() else {
            // Nothing to reconcile against; the marker is consumed.
            return;
        };
        let Some(binding) = self.registry.get(window) else {
            return;
        };
        self.explicit_update(context, &binding);
    }

    fn explicit_update(&self, context: &Arc<PresentContext>, binding: &Arc<WindowBinding>) {
        if self.dispatcher.is_dispatch_thread() {
            reconcile(context, binding);
            return;
        }
        let task_context = Arc::clone(context);
        let task_binding = Arc::clone(binding);
        let task = move || reconcile(&task_context, &task_binding);
        // The policy is read at the moment of each call; it may change at
        // any time through its subscriber mechanism.
        match marshal::policy() {
            MarshalPolicy::Synchronous => self.dispatcher.submit_wait(task),
            MarshalPolicy::Asynchronous => self.dispatcher.submit(task),
        }
    }
}

impl Drop for PresentSystem {
    fn drop(&mut self) {
        marshal::unsubscribe(self.policy_subscription);
        // Contexts the caller leaked stop ticking with the system: each
        // record's notifier stops its source when the record drops.
        log::debug!("Present system dropped.");
    }
}

/// Runs on the dispatch thread (or inline on it): re-reads the window's
/// surface at execution time and attaches it to the native context.
fn reconcile(context: &PresentContext, binding: &WindowBinding) {
    if context.is_destroyed() {
        return;
    }
    let surface = binding.window().surface_handle();
    if let Err(e) = context.native().attach_surface(surface) {
        log::warn!(
            "Surface reconciliation failed for context {:?}: {e}",
            context.id()
        );
    }
}
