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

//! Defines the error types for the presentation subsystem.

use crate::present::context::ContextId;
use crate::present::traits::native::{ApiVersion, ContextProfile};
use std::fmt;

/// An error produced by the presentation core or by a native backend.
///
/// All failures are returned as values; nothing in this subsystem raises
/// asynchronous fault signals. Creation failures fully unwind any partial
/// allocation before the error is returned, so a caller never observes a
/// half-constructed context.
#[derive(Debug)]
pub enum PresentError {
    /// A native context, refresh source, or synchronization primitive
    /// could not be created.
    ResourceAllocation {
        /// The kind of resource that failed to allocate.
        what: &'static str,
        /// Detailed error message from the failing layer.
        details: String,
    },
    /// An operation that requires a current context was invoked with none
    /// active on the calling thread, or with a different context active.
    NoCurrentContext {
        /// Description of the operation that was rejected.
        details: String,
    },
    /// The created context does not meet the requested minimum API version.
    VersionNegotiation {
        /// The minimum version the caller asked for.
        requested: ApiVersion,
        /// The version the native context actually negotiated.
        negotiated: ApiVersion,
    },
    /// The requested rendering profile is not available through this
    /// backend; the caller should redirect to an alternate backend.
    UnsupportedProfile {
        /// The profile that was requested.
        profile: ContextProfile,
    },
    /// The given context id does not refer to a live context.
    UnknownContext {
        /// The stale id that was passed in.
        id: ContextId,
    },
    /// A failure surfaced by the native layer.
    Backend {
        /// Detailed error message from the backend.
        details: String,
    },
}

impl fmt::Display for PresentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresentError::ResourceAllocation { what, details } => {
                write!(f, "Failed to allocate {what}: {details}")
            }
            PresentError::NoCurrentContext { details } => {
                write!(f, "No current context: {details}")
            }
            PresentError::VersionNegotiation {
                requested,
                negotiated,
            } => {
                write!(
                    f,
                    "Context version {negotiated} does not satisfy requested minimum {requested}"
                )
            }
            PresentError::UnsupportedProfile { profile } => {
                write!(
                    f,
                    "Rendering profile {profile:?} is not available through this backend"
                )
            }
            PresentError::UnknownContext { id } => {
                write!(f, "Context not found for ID: {id:?}")
            }
            PresentError::Backend { details } => {
                write!(f, "Native backend failure: {details}")
            }
        }
    }
}

impl std::error::Error for PresentError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_negotiation_display() {
        let err = PresentError::VersionNegotiation {
            requested: ApiVersion::new(4, 1),
            negotiated: ApiVersion::new(3, 3),
        };
        let message = err.to_string();
        assert!(message.contains("3.3"));
        assert!(message.contains("4.1"));
    }

    #[test]
    fn test_no_current_context_display() {
        let err = PresentError::NoCurrentContext {
            details: "swap called with none active".to_string(),
        };
        assert!(err.to_string().starts_with("No current context"));
    }
}
