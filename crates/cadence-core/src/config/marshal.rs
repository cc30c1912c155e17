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

//! Process-wide marshaling policy with change subscriptions.
//!
//! The policy decides how off-thread surface updates reach the dispatch
//! thread: blocking or fire-and-forget. It is a single enumerated value
//! read without a lock on each use. Consumers must read it at the moment
//! of each call, never cache it, because it may change at any time.
//!
//! Components that care about changes register a callback; registration
//! must be paired with component lifecycle (register on create,
//! deregister on destroy) so no dangling subscriber outlives its owner.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Mutex, OnceLock};

/// How an off-thread surface update is marshaled to the dispatch thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarshalPolicy {
    /// The caller blocks until the dispatch thread completes the update.
    Synchronous,
    /// The caller returns immediately; the update is queued.
    Asynchronous,
}

/// Handle identifying one registered policy subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

type PolicyCallback = Box<dyn Fn(MarshalPolicy) + Send + Sync>;

static POLICY: AtomicU8 = AtomicU8::new(0);
static NEXT_SUBSCRIPTION: AtomicU64 = AtomicU64::new(1);

fn subscribers() -> &'static Mutex<Vec<(u64, PolicyCallback)>> {
    static SUBSCRIBERS: OnceLock<Mutex<Vec<(u64, PolicyCallback)>>> = OnceLock::new();
    SUBSCRIBERS.get_or_init(|| Mutex::new(Vec::new()))
}

fn decode(raw: u8) -> MarshalPolicy {
    if raw == 0 {
        MarshalPolicy::Synchronous
    } else {
        MarshalPolicy::Asynchronous
    }
}

fn encode(policy: MarshalPolicy) -> u8 {
    match policy {
        MarshalPolicy::Synchronous => 0,
        MarshalPolicy::Asynchronous => 1,
    }
}

/// Returns the current process-wide policy.
#[must_use]
pub fn policy() -> MarshalPolicy {
    decode(POLICY.load(Ordering::Acquire))
}

/// Replaces the process-wide policy and notifies every subscriber.
///
/// Callbacks run on the caller's thread while the subscriber list is
/// locked; they must return promptly and must not register or remove
/// subscribers.
pub fn set_policy(policy: MarshalPolicy) {
    POLICY.store(encode(policy), Ordering::Release);
    log::debug!("Marshal policy set to {policy:?}.");
    for (_, callback) in subscribers().lock().unwrap().iter() {
        callback(policy);
    }
}

/// Registers a callback invoked on every policy change.
pub fn subscribe(callback: PolicyCallback) -> SubscriptionId {
    let id = NEXT_SUBSCRIPTION.fetch_add(1, Ordering::Relaxed);
    subscribers().lock().unwrap().push((id, callback));
    SubscriptionId(id)
}

/// Removes a previously registered callback.
pub fn unsubscribe(id: SubscriptionId) -> bool {
    let mut list = subscribers().lock().unwrap();
    let before = list.len();
    list.retain(|(registered, _)| *registered != id.0);
    list.len() != before
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use std::sync::Arc;

    // Policy state is process-wide, so everything lives in one test to
    // keep the harness's parallel execution away from it.
    #[test]
    fn test_policy_roundtrip_and_subscriptions() {
        set_policy(MarshalPolicy::Synchronous);
        assert_eq!(policy(), MarshalPolicy::Synchronous);

        let observed = Arc::new(AtomicU32::new(0));
        let inner = Arc::clone(&observed);
        let subscription = subscribe(Box::new(move |p| {
            if p == MarshalPolicy::Asynchronous {
                inner.fetch_add(1, Ordering::SeqCst);
            }
        }));

        set_policy(MarshalPolicy::Asynchronous);
        assert_eq!(policy(), MarshalPolicy::Asynchronous);
        assert_eq!(observed.load(Ordering::SeqCst), 1);

        assert!(unsubscribe(subscription));
        assert!(!unsubscribe(subscription));

        set_policy(MarshalPolicy::Asynchronous);
        assert_eq!(
            observed.load(Ordering::SeqCst),
            1,
            "removed subscriber must not fire"
        );

        set_policy(MarshalPolicy::Synchronous);
    }
}
