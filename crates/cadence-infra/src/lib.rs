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

//! # Cadence Infra
//!
//! Concrete implementations of the `cadence-core` seams: a headless
//! graphics backend for demos and tests, a thread-based refresh driver
//! standing in for a hardware display link, and a headless window.

#![warn(missing_docs)]

#[cfg(feature = "graphics")]
pub mod graphics;
#[cfg(feature = "platform")]
pub mod platform;
#[cfg(feature = "timing")]
pub mod timing;
