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

//! # Cadence Core
//!
//! Foundational crate containing traits, core types, and interface
//! contracts for per-window presentation pacing: context lifecycle, a
//! hardware refresh notifier seam, the swap-pacing policy, and the
//! marshaling discipline for surface updates.

#![warn(missing_docs)]

pub mod config;
pub mod dispatch;
pub mod platform;
pub mod present;

pub use dispatch::MainThreadDispatcher;
pub use present::{ContextConfig, ContextId, PresentError, PresentSystem};
