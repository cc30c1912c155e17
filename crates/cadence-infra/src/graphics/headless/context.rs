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

//! The headless native-context implementation.

use cadence_core::platform::window::SurfaceHandle;
use cadence_core::present::error::PresentError;
use cadence_core::present::traits::native::{ApiVersion, ContextProfile, NativeContext};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Instrumentation shared between a headless context and its creator.
///
/// Lets tests and demos observe driver interaction without reaching into
/// the core's ownership: how many flushes were issued, how many times the
/// surface was reconciled.
#[derive(Debug, Default)]
pub struct HeadlessProbe {
    flushes: AtomicU64,
    attaches: AtomicU64,
}

impl HeadlessProbe {
    /// Number of native flush calls issued against the context.
    #[must_use]
    pub fn flush_count(&self) -> u64 {
        self.flushes.load(Ordering::SeqCst)
    }

    /// Number of surface reconciliations performed on the context.
    #[must_use]
    pub fn attach_count(&self) -> u64 {
        self.attaches.load(Ordering::SeqCst)
    }
}

/// Tracks how many flushes run concurrently across one backend.
///
/// The core guarantees flushes are serialized process-wide; the gauge
/// makes a violation observable as `peak_concurrency() > 1`.
#[derive(Debug, Default)]
pub struct FlushGauge {
    current: AtomicU32,
    peak: AtomicU32,
}

impl FlushGauge {
    pub(crate) fn enter(&self) {
        let inside = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(inside, Ordering::SeqCst);
    }

    pub(crate) fn exit(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }

    /// The most flushes ever observed inside the critical section at once.
    #[must_use]
    pub fn peak_concurrency(&self) -> u32 {
        self.peak.load(Ordering::SeqCst)
    }
}

/// A native context that records interactions instead of driving a GPU.
#[derive(Debug)]
pub struct HeadlessContext {
    version: ApiVersion,
    profiles: Vec<ContextProfile>,
    surface: Mutex<Option<SurfaceHandle>>,
    probe: Arc<HeadlessProbe>,
    gauge: Arc<FlushGauge>,
}

impl HeadlessContext {
    pub(crate) fn new(
        version: ApiVersion,
        profiles: Vec<ContextProfile>,
        probe: Arc<HeadlessProbe>,
        gauge: Arc<FlushGauge>,
    ) -> Self {
        Self {
            version,
            profiles,
            surface: Mutex::new(None),
            probe,
            gauge,
        }
    }
}

impl NativeContext for HeadlessContext {
    fn make_current(&self) -> Result<(), PresentError> {
        Ok(())
    }

    fn attach_surface(&self, surface: SurfaceHandle) -> Result<(), PresentError> {
        *self.surface.lock().unwrap() = Some(surface);
        self.probe.attaches.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn current_surface(&self) -> Option<SurfaceHandle> {
        *self.surface.lock().unwrap()
    }

    fn flush(&self) -> Result<(), PresentError> {
        self.gauge.enter();
        // Widen the critical section a little so an unserialized caller
        // actually shows up in the gauge.
        std::thread::yield_now();
        self.probe.flushes.fetch_add(1, Ordering::SeqCst);
        self.gauge.exit();
        Ok(())
    }

    fn api_version(&self) -> ApiVersion {
        self.version
    }

    fn supports_profile(&self, profile: ContextProfile) -> bool {
        self.profiles.contains(&profile)
    }
}
