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

//! Cross-thread behavior: flush serialization and live marshal policy.

use cadence_core::config::marshal::{self, MarshalPolicy};
use cadence_core::platform::window::{DisplayId, PresentWindow, SurfaceHandle, WindowId};
use cadence_core::present::system::ContextConfig;
use cadence_core::present::traits::native::NativeBackend;
use cadence_core::{MainThreadDispatcher, PresentSystem};
use cadence_infra::graphics::headless::HeadlessBackend;
use cadence_infra::platform::HeadlessWindow;
use cadence_infra::timing::RefreshPump;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn test_flush_critical_sections_never_overlap() {
    let pump = Arc::new(RefreshPump::new());
    let backend = Arc::new(HeadlessBackend::new().with_manual_pump(pump));
    let native: Arc<dyn NativeBackend> = backend.clone();
    let dispatcher = Arc::new(MainThreadDispatcher::new());
    let system = Arc::new(PresentSystem::new(native, dispatcher));

    let context_a = system.create_context(&ContextConfig::default()).unwrap();
    system.make_current(None).unwrap();
    let context_b = system.create_context(&ContextConfig::default()).unwrap();
    system.make_current(None).unwrap();

    let workers: Vec<_> = [context_a, context_b]
        .into_iter()
        .map(|id| {
            let system = Arc::clone(&system);
            thread::spawn(move || {
                system.make_current(Some(id)).unwrap();
                for _ in 0..200 {
                    system.swap(id).unwrap();
                }
                system.make_current(None).unwrap();
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let probes = backend.probes();
    assert_eq!(probes[0].flush_count(), 200);
    assert_eq!(probes[1].flush_count(), 200);
    assert_eq!(
        backend.peak_concurrent_flushes(),
        1,
        "two threads were inside the native flush at once"
    );
}

#[test]
fn test_marshal_policy_is_read_at_each_call() {
    // The dispatcher must be constructed on the thread that pumps it.
    let (handoff_tx, handoff_rx) = crossbeam_channel::bounded(1);
    let pump_thread = thread::spawn(move || {
        let dispatcher = Arc::new(MainThreadDispatcher::new());
        handoff_tx.send(Arc::clone(&dispatcher)).unwrap();
        dispatcher.run_until_stopped();
    });
    let dispatcher: Arc<MainThreadDispatcher> = handoff_rx.recv().unwrap();

    let refresh = Arc::new(RefreshPump::new());
    let backend = Arc::new(HeadlessBackend::new().with_manual_pump(refresh));
    let native: Arc<dyn NativeBackend> = backend.clone();
    let system = Arc::new(PresentSystem::new(native, Arc::clone(&dispatcher)));

    let window = Arc::new(HeadlessWindow::new(
        WindowId(1),
        SurfaceHandle(0x10),
        DisplayId(0),
    ));
    let dyn_window: Arc<dyn PresentWindow> = window.clone();

    marshal::set_policy(MarshalPolicy::Synchronous);
    let id = system.create_context(&ContextConfig::default()).unwrap();
    system.bind(id, &dyn_window).unwrap();
    // Synchronous marshaling: the reconciliation happened before bind
    // returned, even though it ran on the dispatch thread.
    assert_eq!(backend.probes()[0].attach_count(), 1);

    // Flip the live flag; nothing is recreated.
    marshal::set_policy(MarshalPolicy::Asynchronous);
    window.set_surface(SurfaceHandle(0x20));
    system.schedule_update(id).unwrap();
    system.swap(id).unwrap();

    let deadline = Instant::now() + Duration::from_secs(2);
    while backend.probes()[0].attach_count() < 2 {
        assert!(
            Instant::now() < deadline,
            "asynchronous reconciliation never ran"
        );
        thread::yield_now();
    }

    marshal::set_policy(MarshalPolicy::Synchronous);
    dispatcher.stop();
    pump_thread.join().unwrap();
}
