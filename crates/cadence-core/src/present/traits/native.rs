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

//! The seam to the underlying graphics API.
//!
//! Everything the presentation core needs from the native layer is
//! expressed through two trait objects: a [`NativeBackend`] that creates
//! contexts and refresh sources, and a [`NativeContext`] representing one
//! live native context. Function-pointer loading, pixel-format
//! negotiation, and version-string parsing all happen behind this seam;
//! the core only compares the already-parsed results.

use crate::platform::window::SurfaceHandle;
use crate::present::error::PresentError;
use crate::present::traits::refresh::RefreshSource;
use std::fmt;

/// A parsed graphics API version, ordered lexicographically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ApiVersion {
    /// Major version number.
    pub major: u32,
    /// Minor version number.
    pub minor: u32,
}

impl ApiVersion {
    /// Creates a new version.
    #[must_use]
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// The rendering profile requested for a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextProfile {
    /// Desktop core profile.
    Core,
    /// Desktop compatibility profile.
    Compatibility,
    /// Embedded (ES) profile.
    Es,
}

/// Opaque pixel-format descriptor, passed through from configuration.
///
/// The token is produced by the out-of-scope capability negotiation layer
/// and only the backend interprets it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PixelFormatDescriptor(pub u64);

/// One live native rendering context.
///
/// Implementations must be callable from any thread; the core serializes
/// flush calls itself (see the global flush lock) and guarantees that
/// `attach_surface` only runs on the designated dispatch thread.
pub trait NativeContext: Send + Sync + fmt::Debug {
    /// Binds this context to the calling thread.
    fn make_current(&self) -> Result<(), PresentError>;

    /// Reconciles the context's output surface with the given handle.
    ///
    /// Only legal on the designated dispatch thread; the core enforces
    /// this by marshaling (see the dispatch module).
    fn attach_surface(&self, surface: SurfaceHandle) -> Result<(), PresentError>;

    /// Returns the surface the context currently renders into, if any.
    fn current_surface(&self) -> Option<SurfaceHandle>;

    /// Presents the rendered buffer to the attached surface.
    ///
    /// Callers must hold the global flush lock; some drivers are not safe
    /// under concurrent flush from multiple threads.
    fn flush(&self) -> Result<(), PresentError>;

    /// Returns the API version this context negotiated at creation.
    fn api_version(&self) -> ApiVersion;

    /// Indicates whether the given profile is available on this context.
    fn supports_profile(&self, profile: ContextProfile) -> bool;
}

/// Factory for native contexts and refresh sources.
pub trait NativeBackend: Send + Sync + fmt::Debug {
    /// Creates a native context for the given pixel format, optionally
    /// sharing object namespaces with an existing context.
    fn create_context(
        &self,
        format: &PixelFormatDescriptor,
        share: Option<&dyn NativeContext>,
    ) -> Result<Box<dyn NativeContext>, PresentError>;

    /// Creates an unstarted refresh source for this backend.
    fn create_refresh_source(&self) -> Result<Box<dyn RefreshSource>, PresentError>;

    /// Releases whatever context is current on the calling thread.
    fn clear_current(&self);
}
