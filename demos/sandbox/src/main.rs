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

// Cadence Sandbox
// Main binary for testing and demos

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use cadence_core::dispatch::MainThreadDispatcher;
use cadence_core::platform::window::{DisplayId, PresentWindow, SurfaceHandle, WindowId};
use cadence_core::present::system::ContextConfig;
use cadence_core::present::traits::native::NativeBackend;
use cadence_core::PresentSystem;
use cadence_infra::graphics::headless::HeadlessBackend;
use cadence_infra::platform::HeadlessWindow;

const FRAMES: u32 = 120;

fn main() -> Result<()> {
    env_logger::init();

    // The main thread doubles as the dispatch thread: it pumps marshaled
    // surface updates while the render thread swaps.
    let dispatcher = Arc::new(MainThreadDispatcher::new());
    let backend = Arc::new(HeadlessBackend::new().with_refresh_period(Duration::from_millis(8)));
    let native: Arc<dyn NativeBackend> = backend.clone();
    let system = Arc::new(PresentSystem::new(native, Arc::clone(&dispatcher)));

    let window = Arc::new(HeadlessWindow::new(
        WindowId(1),
        SurfaceHandle(0x100),
        DisplayId(0),
    ));
    let dyn_window: Arc<dyn PresentWindow> = window.clone();

    let context = system.create_context(&ContextConfig::default())?;
    system.bind(context, &dyn_window)?;
    system.set_swap_interval(context, 1)?;
    system.make_current(None)?;

    let render = {
        let system = Arc::clone(&system);
        thread::spawn(move || -> Result<()> {
            system.make_current(Some(context))?;
            let start = Instant::now();
            for frame in 0..FRAMES {
                system.swap(context)?;
                if frame % 30 == 0 {
                    log::info!("Frame {frame} presented.");
                }
            }
            log::info!("{FRAMES} paced frames in {:?}.", start.elapsed());
            system.make_current(None)?;
            Ok(())
        })
    };

    // Halfway through, pretend the window moved to a different screen.
    let mut moved = false;
    let started = Instant::now();
    while !render.is_finished() {
        dispatcher.pump();
        if !moved && started.elapsed() > Duration::from_millis(400) {
            window.move_to_display(DisplayId(1));
            window.set_surface(SurfaceHandle(0x200));
            system.notify_window_moved(WindowId(1));
            log::info!("Window moved to display 1.");
            moved = true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    render.join().expect("render thread panicked")?;
    dispatcher.pump();

    let probes = backend.probes();
    log::info!(
        "Headless backend observed {} flushes and {} surface updates.",
        probes[0].flush_count(),
        probes[0].attach_count()
    );

    system.destroy_context(context);
    Ok(())
}
