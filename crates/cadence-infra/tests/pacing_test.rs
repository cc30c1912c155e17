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

//! End-to-end pacing behavior against a manually pumped refresh stream.

use cadence_core::dispatch::MainThreadDispatcher;
use cadence_core::present::system::ContextConfig;
use cadence_core::present::traits::native::NativeBackend;
use cadence_core::PresentSystem;
use cadence_infra::graphics::headless::HeadlessBackend;
use cadence_infra::timing::RefreshPump;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn paced_fixture() -> (Arc<RefreshPump>, Arc<HeadlessBackend>, Arc<PresentSystem>) {
    let pump = Arc::new(RefreshPump::new());
    let backend = Arc::new(HeadlessBackend::new().with_manual_pump(Arc::clone(&pump)));
    let native: Arc<dyn NativeBackend> = backend.clone();
    let dispatcher = Arc::new(MainThreadDispatcher::new());
    let system = Arc::new(PresentSystem::new(native, dispatcher));
    (pump, backend, system)
}

#[test]
fn test_unsynced_swap_completes_without_ticks() {
    let (pump, backend, system) = paced_fixture();
    let id = system.create_context(&ContextConfig::default()).unwrap();

    // Interval defaults to 0: no tick history is ever required.
    for _ in 0..5 {
        system.swap(id).unwrap();
    }
    pump.tick();
    pump.tick();
    system.swap(id).unwrap();

    assert_eq!(backend.probes()[0].flush_count(), 6);
}

#[test]
fn test_interval_two_paces_swaps_to_refresh_boundaries() {
    let (pump, backend, system) = paced_fixture();
    let id = system.create_context(&ContextConfig::default()).unwrap();
    system.set_swap_interval(id, 2).unwrap();
    system.make_current(None).unwrap();

    let first_done = Arc::new(AtomicBool::new(false));
    let second_done = Arc::new(AtomicBool::new(false));

    let render = {
        let system = Arc::clone(&system);
        let first_done = Arc::clone(&first_done);
        let second_done = Arc::clone(&second_done);
        thread::spawn(move || {
            system.make_current(Some(id)).unwrap();
            system.swap(id).unwrap();
            first_done.store(true, Ordering::SeqCst);
            system.swap(id).unwrap();
            second_done.store(true, Ordering::SeqCst);
            system.make_current(None).unwrap();
        })
    };

    let mut ticks = 0u64;
    while !first_done.load(Ordering::SeqCst) {
        pump.tick();
        ticks += 1;
        thread::sleep(Duration::from_millis(5));
        assert!(ticks < 200, "first swap never completed");
    }
    assert!(
        ticks >= 2,
        "first swap completed after {ticks} tick(s); interval 2 requires two"
    );

    while !second_done.load(Ordering::SeqCst) {
        pump.tick();
        ticks += 1;
        thread::sleep(Duration::from_millis(5));
        assert!(ticks < 400, "second swap never completed");
    }
    assert!(
        ticks >= 4,
        "two paced swaps completed after only {ticks} ticks"
    );

    render.join().unwrap();
    assert_eq!(backend.probes()[0].flush_count(), 2);
}

#[test]
fn test_late_tearing_consumes_backlog_immediately() {
    let (pump, backend, system) = paced_fixture();
    let id = system.create_context(&ContextConfig::default()).unwrap();
    system.set_swap_interval(id, -1).unwrap();

    // Ticks that piled up while idle must satisfy the next swap with no
    // further waiting.
    pump.tick();
    pump.tick();
    pump.tick();
    system.swap(id).unwrap();
    assert_eq!(backend.probes()[0].flush_count(), 1);

    // With the backlog consumed, the next swap waits for exactly one
    // fresh tick.
    let ticker = {
        let pump = Arc::clone(&pump);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            pump.tick();
        })
    };
    let start = Instant::now();
    system.swap(id).unwrap();
    assert!(
        start.elapsed() >= Duration::from_millis(40),
        "swap did not wait for the tick"
    );
    ticker.join().unwrap();
    assert_eq!(backend.probes()[0].flush_count(), 2);
}
