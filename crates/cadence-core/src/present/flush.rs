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

//! Process-wide serialization of the native buffer flush.
//!
//! Some drivers are not safe under concurrent flush from multiple
//! threads. The critical section is deliberately narrow: pacing waits
//! happen before acquisition, so unrelated contexts only serialize at
//! the moment of actual driver interaction.

use std::sync::{Mutex, MutexGuard};

static NATIVE_FLUSH: Mutex<()> = Mutex::new(());

/// Acquires the process-wide flush lock.
///
/// Hold the guard only around the native flush call and the immediately
/// following surface-update apply.
#[must_use]
pub fn lock_native_flush() -> MutexGuard<'static, ()> {
    NATIVE_FLUSH.lock().unwrap()
}
