//! In-memory backends for tests
//!
//! `FakeSurface` queues dispatched tasks until `drain` runs them, standing in
//! for the window-owning thread. `FakeWindowApi` records style words and
//! calls. `FakeTray` holds `on_ready` back until `open` is called, so tests
//! decide when the tray becomes ready.

use crate::error::ShellError;
use crate::signal::Signal;
use crate::surface::bindings::{BindingFn, BindingRegistry};
use crate::surface::{
    RunLoop, Surface, SurfaceFactory, SurfaceOptions, SurfaceParts, Task, WindowHandle,
};
use crate::tray::backend::{ItemId, ItemLabel, NativeItem, TrayBackend, TrayHooks};
use crate::window::native::WindowApi;
use crate::window::style::{ShowCommand, StyleIndex, SystemMetric};
use crossbeam::channel::{select, unbounded, Sender};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Poll `condition` until it holds or `timeout` elapses
pub fn wait_until(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    condition()
}

pub struct FakeSurface {
    queue: Mutex<VecDeque<Task>>,
    terminated: Signal,
    terminate_calls: AtomicUsize,
    navigations: Mutex<Vec<String>>,
    pub bindings: BindingRegistry,
    window: Mutex<Option<WindowHandle>>,
}

impl FakeSurface {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            terminated: Signal::new(),
            terminate_calls: AtomicUsize::new(0),
            navigations: Mutex::new(Vec::new()),
            bindings: BindingRegistry::new(),
            window: Mutex::new(None),
        }
    }

    pub fn with_window(window: WindowHandle) -> Self {
        let surface = Self::new();
        *surface.window.lock() = Some(window);
        surface
    }

    /// Run queued tasks in order; returns how many ran
    pub fn drain(&self) -> usize {
        let mut ran = 0;
        loop {
            // Lock released before the task runs; tasks may dispatch more work
            let task = self.queue.lock().pop_front();
            match task {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => return ran,
            }
        }
    }

    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn terminate_calls(&self) -> usize {
        self.terminate_calls.load(Ordering::SeqCst)
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.is_fired()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.navigations.lock().clone()
    }
}

impl Surface for FakeSurface {
    fn dispatch(&self, task: Task) {
        self.queue.lock().push_back(task);
    }

    fn terminate(&self) {
        self.terminate_calls.fetch_add(1, Ordering::SeqCst);
        self.terminated.fire();
    }

    fn navigate(&self, url: &str) {
        self.navigations.lock().push(url.to_string());
    }

    fn bind(&self, name: &str, handler: BindingFn) {
        self.bindings.insert(name, handler);
    }

    fn native_window(&self) -> Option<WindowHandle> {
        *self.window.lock()
    }
}

/// Runs dispatched tasks until the surface is terminated
pub struct FakeRunLoop {
    surface: Arc<FakeSurface>,
}

impl RunLoop for FakeRunLoop {
    fn run(self: Box<Self>) {
        loop {
            self.surface.drain();
            if self.surface.terminated.wait_timeout(Duration::from_millis(5)) {
                self.surface.drain();
                return;
            }
        }
    }
}

pub struct FakeSurfaceFactory {
    pub surface: Arc<FakeSurface>,
    pub fail: bool,
}

impl FakeSurfaceFactory {
    pub fn new(surface: Arc<FakeSurface>) -> Self {
        Self {
            surface,
            fail: false,
        }
    }
}

impl SurfaceFactory for FakeSurfaceFactory {
    fn create(&self, options: &SurfaceOptions) -> Result<SurfaceParts, ShellError> {
        if self.fail {
            return Err(ShellError::SurfaceCreation(format!(
                "no display for '{}'",
                options.title
            )));
        }
        Ok(SurfaceParts {
            run_loop: Box::new(FakeRunLoop {
                surface: Arc::clone(&self.surface),
            }),
            surface: self.surface.clone(),
        })
    }
}

#[derive(Default)]
pub struct FakeWindowApi {
    longs: Mutex<HashMap<(WindowHandle, StyleIndex), isize>>,
    alphas: Mutex<HashMap<WindowHandle, u8>>,
    positions: Mutex<HashMap<WindowHandle, (i32, i32)>>,
    show_commands: Mutex<Vec<(ShowCommand, bool)>>,
    calls: Mutex<Vec<&'static str>>,
}

impl FakeWindowApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().push(call);
    }

    /// Seed a style word without recording a call
    pub fn set_long_value(&self, window: WindowHandle, index: StyleIndex, value: isize) {
        self.longs.lock().insert((window, index), value);
    }

    pub fn long(&self, window: WindowHandle, index: StyleIndex) -> isize {
        self.longs.lock().get(&(window, index)).copied().unwrap_or(0)
    }

    pub fn alpha(&self, window: WindowHandle) -> Option<u8> {
        self.alphas.lock().get(&window).copied()
    }

    pub fn position(&self, window: WindowHandle) -> Option<(i32, i32)> {
        self.positions.lock().get(&window).copied()
    }

    /// `(command, async)` pairs in call order
    pub fn show_commands(&self) -> Vec<(ShowCommand, bool)> {
        self.show_commands.lock().clone()
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().clone()
    }
}

impl WindowApi for FakeWindowApi {
    fn get_long(&self, window: WindowHandle, index: StyleIndex) -> isize {
        self.record("get_long");
        self.long(window, index)
    }

    fn set_long(
        &self,
        window: WindowHandle,
        index: StyleIndex,
        value: isize,
    ) -> Result<isize, ShellError> {
        self.record("set_long");
        Ok(self
            .longs
            .lock()
            .insert((window, index), value)
            .unwrap_or(0))
    }

    fn set_layered_alpha(&self, window: WindowHandle, alpha: u8) -> Result<(), ShellError> {
        self.record("set_layered_alpha");
        self.alphas.lock().insert(window, alpha);
        Ok(())
    }

    fn clear_background_brush(&self, _window: WindowHandle) -> Result<(), ShellError> {
        self.record("clear_background_brush");
        Ok(())
    }

    fn extend_frame_into_client(&self, _window: WindowHandle) -> Result<(), ShellError> {
        self.record("extend_frame_into_client");
        Ok(())
    }

    fn move_to(&self, window: WindowHandle, x: i32, y: i32) -> Result<(), ShellError> {
        self.record("move_to");
        self.positions.lock().insert(window, (x, y));
        Ok(())
    }

    fn refresh_frame(&self, _window: WindowHandle) -> Result<(), ShellError> {
        self.record("refresh_frame");
        Ok(())
    }

    fn show(&self, _window: WindowHandle, command: ShowCommand) -> bool {
        self.record("show");
        self.show_commands.lock().push((command, false));
        true
    }

    fn show_async(&self, _window: WindowHandle, command: ShowCommand) -> bool {
        self.record("show_async");
        self.show_commands.lock().push((command, true));
        true
    }

    fn update(&self, _window: WindowHandle) -> Result<(), ShellError> {
        self.record("update");
        Ok(())
    }

    fn metric(&self, metric: SystemMetric) -> i32 {
        match metric {
            SystemMetric::ScreenWidth => 1920,
            SystemMetric::ScreenHeight => 1080,
            SystemMetric::VirtualX => -1280,
            SystemMetric::VirtualY => 0,
            SystemMetric::VirtualWidth => 3200,
            SystemMetric::VirtualHeight => 1080,
        }
    }
}

/// A menu entry created on the fake tray
#[derive(Debug, Clone)]
pub struct FakeItem {
    pub id: ItemId,
    pub parent: Option<ItemId>,
    pub label: ItemLabel,
    pub enabled: bool,
    pub checked: bool,
}

pub struct FakeTray {
    gate: Signal,
    stop: Signal,
    exit: Signal,
    finished: Signal,
    next_id: AtomicU32,
    items: Mutex<Vec<FakeItem>>,
    clicks: Mutex<HashMap<ItemId, Sender<()>>>,
    title: Mutex<String>,
    tooltip: Mutex<String>,
}

impl FakeTray {
    /// A tray that becomes ready once `open` is called
    pub fn new() -> Self {
        Self {
            gate: Signal::new(),
            stop: Signal::new(),
            exit: Signal::new(),
            finished: Signal::new(),
            next_id: AtomicU32::new(1),
            items: Mutex::new(Vec::new()),
            clicks: Mutex::new(HashMap::new()),
            title: Mutex::new(String::new()),
            tooltip: Mutex::new(String::new()),
        }
    }

    /// A tray that becomes ready as soon as it runs
    pub fn opened() -> Self {
        let tray = Self::new();
        tray.open();
        tray
    }

    pub fn open(&self) {
        self.gate.fire();
    }

    /// End the loop without the exit path
    pub fn stop(&self) {
        self.stop.fire();
    }

    pub fn is_finished(&self) -> bool {
        self.finished.is_fired()
    }

    pub fn items(&self) -> Vec<FakeItem> {
        self.items.lock().clone()
    }

    pub fn title_of(&self, id: ItemId) -> Option<String> {
        self.items
            .lock()
            .iter()
            .find(|item| item.id == id)
            .map(|item| item.label.title.clone())
    }

    pub fn title(&self) -> String {
        self.title.lock().clone()
    }

    pub fn tooltip(&self) -> String {
        self.tooltip.lock().clone()
    }

    /// Deliver one click; `false` if the item is unknown
    pub fn click(&self, id: ItemId) -> bool {
        match self.clicks.lock().get(&id) {
            Some(sender) => {
                // Items without a handler have no listener
                let _ = sender.send(());
                true
            }
            None => false,
        }
    }

    fn update_item(&self, id: ItemId, f: impl FnOnce(&mut FakeItem)) -> Result<(), ShellError> {
        let mut items = self.items.lock();
        match items.iter_mut().find(|item| item.id == id) {
            Some(item) => {
                f(item);
                Ok(())
            }
            None => Err(ShellError::Tray(format!("unknown menu item {}", id))),
        }
    }
}

impl TrayBackend for FakeTray {
    fn run(&self, hooks: TrayHooks) {
        let quit = hooks.quit.receiver();

        select! {
            recv(self.gate.receiver()) -> _ => {}
            recv(quit) -> _ => {
                self.finished.fire();
                return;
            }
        }

        (hooks.on_ready)();

        select! {
            recv(quit) -> _ => {}
            recv(self.stop.receiver()) -> _ => {}
            recv(self.exit.receiver()) -> _ => (hooks.on_exit)(),
        }

        self.finished.fire();
    }

    fn set_title(&self, title: &str) -> Result<(), ShellError> {
        *self.title.lock() = title.to_string();
        Ok(())
    }

    fn set_tooltip(&self, tooltip: &str) -> Result<(), ShellError> {
        *self.tooltip.lock() = tooltip.to_string();
        Ok(())
    }

    fn add_item(
        &self,
        parent: Option<ItemId>,
        label: &ItemLabel,
    ) -> Result<NativeItem, ShellError> {
        let id = ItemId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let (tx, rx) = unbounded();

        self.items.lock().push(FakeItem {
            id,
            parent,
            label: label.clone(),
            enabled: true,
            checked: false,
        });
        self.clicks.lock().insert(id, tx);

        Ok(NativeItem { id, clicks: rx })
    }

    fn set_enabled(&self, id: ItemId, enabled: bool) -> Result<(), ShellError> {
        self.update_item(id, |item| item.enabled = enabled)
    }

    fn set_checked(&self, id: ItemId, checked: bool) -> Result<(), ShellError> {
        self.update_item(id, |item| item.checked = checked)
    }

    fn request_exit(&self) {
        self.exit.fire();
    }
}
