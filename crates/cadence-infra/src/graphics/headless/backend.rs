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

//! The headless native backend.

use crate::graphics::headless::context::{FlushGauge, HeadlessContext, HeadlessProbe};
use crate::timing::{ManualRefreshDriver, RefreshPump, ThreadRefreshDriver};
use cadence_core::present::error::PresentError;
use cadence_core::present::traits::native::{
    ApiVersion, ContextProfile, NativeBackend, NativeContext, PixelFormatDescriptor,
};
use cadence_core::present::traits::refresh::RefreshSource;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A backend that fabricates contexts without touching any GPU.
///
/// Refresh sources come from a background thread driver by default, or
/// from a shared [`RefreshPump`] when deterministic replay is wanted.
/// Follows the builder pattern for configuration.
#[derive(Debug)]
pub struct HeadlessBackend {
    version: ApiVersion,
    profiles: Vec<ContextProfile>,
    refresh_period: Duration,
    pump: Option<Arc<RefreshPump>>,
    gauge: Arc<FlushGauge>,
    probes: Mutex<Vec<Arc<HeadlessProbe>>>,
}

impl HeadlessBackend {
    /// Creates a backend reporting API version 4.1 with desktop profiles
    /// and a 60 Hz refresh stand-in.
    #[must_use]
    pub fn new() -> Self {
        Self {
            version: ApiVersion::new(4, 1),
            profiles: vec![ContextProfile::Core, ContextProfile::Compatibility],
            refresh_period: Duration::from_nanos(16_666_667),
            pump: None,
            gauge: Arc::new(FlushGauge::default()),
            probes: Mutex::new(Vec::new()),
        }
    }

    /// Sets the API version new contexts report.
    #[must_use]
    pub fn with_version(mut self, version: ApiVersion) -> Self {
        self.version = version;
        self
    }

    /// Sets the profiles new contexts support.
    #[must_use]
    pub fn with_profiles(mut self, profiles: Vec<ContextProfile>) -> Self {
        self.profiles = profiles;
        self
    }

    /// Sets the thread-driver refresh period.
    #[must_use]
    pub fn with_refresh_period(mut self, period: Duration) -> Self {
        self.refresh_period = period;
        self
    }

    /// Switches refresh delivery to a manually driven pump.
    #[must_use]
    pub fn with_manual_pump(mut self, pump: Arc<RefreshPump>) -> Self {
        self.pump = Some(pump);
        self
    }

    /// Returns the probe of every context created so far, in creation
    /// order.
    #[must_use]
    pub fn probes(&self) -> Vec<Arc<HeadlessProbe>> {
        self.probes.lock().unwrap().clone()
    }

    /// The most flushes observed running concurrently across this
    /// backend's contexts.
    #[must_use]
    pub fn peak_concurrent_flushes(&self) -> u32 {
        self.gauge.peak_concurrency()
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeBackend for HeadlessBackend {
    fn create_context(
        &self,
        format: &PixelFormatDescriptor,
        _share: Option<&dyn NativeContext>,
    ) -> Result<Box<dyn NativeContext>, PresentError> {
        let probe = Arc::new(HeadlessProbe::default());
        self.probes.lock().unwrap().push(Arc::clone(&probe));
        log::debug!("Headless context created for format {format:?}.");
        Ok(Box::new(HeadlessContext::new(
            self.version,
            self.profiles.clone(),
            probe,
            Arc::clone(&self.gauge),
        )))
    }

    fn create_refresh_source(&self) -> Result<Box<dyn RefreshSource>, PresentError> {
        match &self.pump {
            Some(pump) => Ok(Box::new(ManualRefreshDriver::new(Arc::clone(pump)))),
            None => Ok(Box::new(ThreadRefreshDriver::new(self.refresh_period))),
        }
    }

    fn clear_current(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_reports_configured_version() {
        let backend = HeadlessBackend::new().with_version(ApiVersion::new(3, 3));
        let context = backend
            .create_context(&PixelFormatDescriptor::default(), None)
            .unwrap();
        assert_eq!(context.api_version(), ApiVersion::new(3, 3));
    }

    #[test]
    fn test_probe_tracks_flushes() {
        let backend = HeadlessBackend::new();
        let context = backend
            .create_context(&PixelFormatDescriptor::default(), None)
            .unwrap();
        context.flush().unwrap();
        context.flush().unwrap();
        assert_eq!(backend.probes()[0].flush_count(), 2);
    }
}
