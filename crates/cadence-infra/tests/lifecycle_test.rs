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

//! Context lifecycle: binding, rebinding, dirty tracking, teardown.

use cadence_core::platform::window::{DisplayId, PresentWindow, SurfaceHandle, WindowId};
use cadence_core::present::context::LifecycleState;
use cadence_core::present::system::ContextConfig;
use cadence_core::present::traits::native::NativeBackend;
use cadence_core::{MainThreadDispatcher, PresentError, PresentSystem};
use cadence_infra::graphics::headless::HeadlessBackend;
use cadence_infra::platform::HeadlessWindow;
use cadence_infra::timing::RefreshPump;
use std::sync::Arc;

// The pump is never ticked here: lifecycle behavior must not depend on
// refresh traffic, and an untouched pump means no background threads.
fn fixture() -> (Arc<HeadlessBackend>, Arc<PresentSystem>) {
    let pump = Arc::new(RefreshPump::new());
    let backend = Arc::new(HeadlessBackend::new().with_manual_pump(pump));
    let native: Arc<dyn NativeBackend> = backend.clone();
    let dispatcher = Arc::new(MainThreadDispatcher::new());
    let system = Arc::new(PresentSystem::new(native, dispatcher));
    (backend, system)
}

fn window(id: u64, surface: u64) -> (Arc<HeadlessWindow>, Arc<dyn PresentWindow>) {
    let window = Arc::new(HeadlessWindow::new(
        WindowId(id),
        SurfaceHandle(surface),
        DisplayId(0),
    ));
    let as_dyn: Arc<dyn PresentWindow> = window.clone();
    (window, as_dyn)
}

#[test]
fn test_rebind_moves_attachment_between_windows() {
    let (backend, system) = fixture();
    let (_window_a, dyn_a) = window(1, 0x10);
    let (_window_b, dyn_b) = window(2, 0x20);

    let id = system.create_context(&ContextConfig::default()).unwrap();
    system.bind(id, &dyn_a).unwrap();
    assert_eq!(system.attached_contexts(WindowId(1)), vec![id]);
    assert_eq!(system.lifecycle_state(id).unwrap(), LifecycleState::Bound);

    system.bind(id, &dyn_b).unwrap();
    assert!(system.attached_contexts(WindowId(1)).is_empty());
    assert_eq!(system.attached_contexts(WindowId(2)), vec![id]);

    // Rebinding to the same window is a set-membership no-op.
    system.bind(id, &dyn_b).unwrap();
    assert_eq!(system.attached_contexts(WindowId(2)), vec![id]);

    // One reconciliation per surface change: None -> 0x10 -> 0x20.
    assert_eq!(backend.probes()[0].attach_count(), 2);
}

#[test]
fn test_dirty_marker_applies_exactly_once() {
    let (backend, system) = fixture();
    let (_window_a, dyn_a) = window(1, 0x10);

    let id = system.create_context(&ContextConfig::default()).unwrap();
    system.bind(id, &dyn_a).unwrap();
    assert_eq!(backend.probes()[0].attach_count(), 1);

    system.schedule_update(id).unwrap();
    system.schedule_update(id).unwrap();
    system.schedule_update(id).unwrap();

    system.swap(id).unwrap();
    assert_eq!(
        backend.probes()[0].attach_count(),
        2,
        "piled-up updates must reconcile once"
    );

    system.swap(id).unwrap();
    system.swap(id).unwrap();
    assert_eq!(
        backend.probes()[0].attach_count(),
        2,
        "cleared marker must not re-trigger"
    );
}

#[test]
fn test_window_move_retargets_and_marks_dirty() {
    let (backend, system) = fixture();
    let (window_a, dyn_a) = window(1, 0x10);

    let id = system.create_context(&ContextConfig::default()).unwrap();
    system.bind(id, &dyn_a).unwrap();
    assert_eq!(backend.probes()[0].attach_count(), 1);

    window_a.move_to_display(DisplayId(7));
    window_a.set_surface(SurfaceHandle(0x99));
    system.notify_window_moved(WindowId(1));

    // The move only marks; the next swap applies.
    system.swap(id).unwrap();
    assert_eq!(backend.probes()[0].attach_count(), 2);
}

#[test]
fn test_destroy_detaches_and_second_destroy_is_noop() {
    let (_backend, system) = fixture();
    let (_window_a, dyn_a) = window(1, 0x10);

    let id = system.create_context(&ContextConfig::default()).unwrap();
    system.bind(id, &dyn_a).unwrap();

    assert!(system.destroy_context(id));
    assert!(system.attached_contexts(WindowId(1)).is_empty());
    assert_eq!(system.context_count(), 0);

    assert!(!system.destroy_context(id));
    assert!(matches!(
        system.swap(id).unwrap_err(),
        PresentError::UnknownContext { .. }
    ));
}

#[test]
fn test_share_context_resolution() {
    let (_backend, system) = fixture();
    let first = system.create_context(&ContextConfig::default()).unwrap();

    let shared = ContextConfig {
        share: Some(first),
        ..Default::default()
    };
    let second = system.create_context(&shared).unwrap();
    assert_ne!(first, second);

    system.destroy_context(second);
    let stale = ContextConfig {
        share: Some(second),
        ..Default::default()
    };
    assert!(matches!(
        system.create_context(&stale).unwrap_err(),
        PresentError::UnknownContext { .. }
    ));
}

#[test]
fn test_make_current_moves_context_across_threads() {
    let (backend, system) = fixture();
    let id = system.create_context(&ContextConfig::default()).unwrap();
    system.make_current(None).unwrap();

    let worker = {
        let system = Arc::clone(&system);
        std::thread::spawn(move || {
            system.make_current(Some(id)).unwrap();
            system.swap(id).unwrap();
            system.make_current(None).unwrap();
        })
    };
    worker.join().unwrap();
    assert_eq!(backend.probes()[0].flush_count(), 1);

    // Back on this thread it is no longer current.
    assert!(matches!(
        system.swap(id).unwrap_err(),
        PresentError::NoCurrentContext { .. }
    ));
}
