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

//! Context lifecycle, swap pacing, and flush serialization.

pub mod context;
pub mod error;
pub mod flush;
pub mod notifier;
pub mod pacing;
pub mod registry;
pub mod system;
pub mod traits;

pub use context::{ContextId, LifecycleState, PresentContext};
pub use error::PresentError;
pub use pacing::{PacingState, SwapInterval};
pub use registry::{WindowBinding, WindowBindingRegistry};
pub use system::{ContextConfig, PresentSystem};
