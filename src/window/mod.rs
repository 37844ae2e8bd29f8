//! Window style and placement operations on the native window
//!
//! Each `WindowController` call looks up the current native handle on the
//! surface and does nothing (with a warning) if there is none. The only state
//! kept is which border bits were removed from each window, so that restoring
//! them yields the original style. Style writes are marshaled onto the window-owning thread
//! with `Surface::dispatch`; the border operations read the current style
//! inline first so the dispatched task writes a value computed at call time.

pub mod native;
pub mod style;

#[cfg(windows)]
mod win32;

use crate::error::ShellError;
use crate::surface::{Surface, WindowHandle};
use native::WindowApi;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use style::{ShowCommand, StyleIndex, SystemMetric};
use tracing::{debug, warn};

/// Primary screen size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScreenSize {
    pub width: i32,
    pub height: i32,
}

/// Bounding rectangle of all monitors; `x`/`y` can be negative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VirtualScreenInfo {
    pub width: i32,
    pub height: i32,
    pub x: i32,
    pub y: i32,
}

#[derive(Clone)]
pub struct WindowController {
    api: Arc<dyn WindowApi>,
    surface: Arc<dyn Surface>,
    /// Border bits cleared by `remove_borders`, shared between clones
    removed_borders: Arc<Mutex<HashMap<WindowHandle, isize>>>,
}

/// Native failures are logged and swallowed
fn log_failure(operation: &str, result: Result<impl Sized, ShellError>) {
    if let Err(e) = result {
        warn!("{}: {}", operation, e);
    }
}

impl WindowController {
    pub fn new(api: Arc<dyn WindowApi>, surface: Arc<dyn Surface>) -> Self {
        Self {
            api,
            surface,
            removed_borders: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn window(&self, operation: &str) -> Option<WindowHandle> {
        let window = self.surface.native_window();
        if window.is_none() {
            warn!("{}: no native window, ignoring", operation);
        }
        window
    }

    /// Run `f` on the window thread with the primitive table
    fn dispatch<F>(&self, f: F)
    where
        F: FnOnce(&dyn WindowApi) + Send + 'static,
    {
        let api = Arc::clone(&self.api);
        self.surface.dispatch(Box::new(move || f(api.as_ref())));
    }

    pub fn show_window(&self) {
        if let Some(window) = self.window("show_window") {
            self.api.show(window, ShowCommand::Show);
        }
    }

    pub fn hide_window(&self) {
        if let Some(window) = self.window("hide_window") {
            self.api.show(window, ShowCommand::Hide);
        }
    }

    pub fn maximize(&self) {
        self.show_async("maximize", ShowCommand::Maximize);
    }

    pub fn minimize(&self) {
        self.show_async("minimize", ShowCommand::Minimize);
    }

    pub fn restore(&self) {
        self.show_async("restore", ShowCommand::Restore);
    }

    fn show_async(&self, operation: &str, command: ShowCommand) {
        if let Some(window) = self.window(operation) {
            if !self.api.show_async(window, command) {
                debug!("{}: ShowWindowAsync was not posted", operation);
            }
        }
    }

    /// Move the window's top-left corner to `(x, y)` in screen coordinates
    pub fn set_position(&self, x: i32, y: i32) {
        let Some(window) = self.window("set_position") else {
            return;
        };
        self.dispatch(move |api| log_failure("set_position", api.move_to(window, x, y)));
    }

    /// Remove caption, frame, system menu and min/max boxes
    pub fn remove_borders(&self) {
        self.rewrite_style("remove_borders", |window, current| {
            let mut removed = self.removed_borders.lock();
            *removed.entry(window).or_insert(0) |= current & style::BORDER_BITS;
            style::strip_borders(current)
        });
    }

    /// Put back the border bits `remove_borders` took away. Without a prior
    /// removal every border bit is added.
    pub fn restore_borders(&self) {
        self.rewrite_style("restore_borders", |window, current| {
            let removed = self
                .removed_borders
                .lock()
                .remove(&window)
                .unwrap_or(style::BORDER_BITS);
            style::with_borders(current, removed)
        });
    }

    fn rewrite_style<F>(&self, operation: &'static str, transform: F)
    where
        F: FnOnce(WindowHandle, isize) -> isize,
    {
        let Some(window) = self.window(operation) else {
            return;
        };
        let current = self.api.get_long(window, StyleIndex::Style);
        let updated = transform(window, current);
        debug!("{}: style {:#010x} -> {:#010x}", operation, current, updated);

        self.dispatch(move |api| {
            log_failure(operation, api.set_long(window, StyleIndex::Style, updated));
            log_failure(operation, api.refresh_frame(window));
        });
    }

    /// Make the whole window translucent; 0 is invisible, 255 opaque.
    /// The window stays layered afterwards.
    pub fn set_transparency(&self, alpha: u8) {
        let Some(window) = self.window("set_transparency") else {
            return;
        };
        self.dispatch(move |api| {
            let ex_style = api.get_long(window, StyleIndex::ExStyle);
            log_failure(
                "set_transparency",
                api.set_long(window, StyleIndex::ExStyle, style::with_layered(ex_style)),
            );
            log_failure("set_transparency", api.set_layered_alpha(window, alpha));
        });
    }

    /// Make the window background see-through and click-through while the
    /// web content keeps rendering
    pub fn set_background_transparent(&self) -> Result<(), ShellError> {
        let Some(window) = self.window("set_background_transparent") else {
            return Err(ShellError::NoWindow);
        };
        self.dispatch(move |api| {
            const OP: &str = "set_background_transparent";
            let ex_style = api.get_long(window, StyleIndex::ExStyle);
            log_failure(
                OP,
                api.set_long(
                    window,
                    StyleIndex::ExStyle,
                    style::with_transparent_background(ex_style),
                ),
            );
            log_failure(OP, api.set_layered_alpha(window, 0));
            log_failure(OP, api.clear_background_brush(window));
            log_failure(OP, api.extend_frame_into_client(window));
            api.show(window, ShowCommand::Show);
            log_failure(OP, api.update(window));
        });
        Ok(())
    }

    pub fn screen_size(&self) -> ScreenSize {
        ScreenSize {
            width: self.api.metric(SystemMetric::ScreenWidth),
            height: self.api.metric(SystemMetric::ScreenHeight),
        }
    }

    pub fn virtual_screen_info(&self) -> VirtualScreenInfo {
        VirtualScreenInfo {
            width: self.api.metric(SystemMetric::VirtualWidth),
            height: self.api.metric(SystemMetric::VirtualHeight),
            x: self.api.metric(SystemMetric::VirtualX),
            y: self.api.metric(SystemMetric::VirtualY),
        }
    }
}
