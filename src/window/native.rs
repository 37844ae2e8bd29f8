//! Native window-manager primitives
//!
//! `WindowApi` is the boundary between the style controller and the OS.
//! Every method is a single thin OS call; sequencing and thread affinity are
//! the controller's job. On Windows the process-wide table is created lazily
//! on first use and lives until exit.

use super::style::{ShowCommand, StyleIndex, SystemMetric};
use crate::error::ShellError;
use crate::surface::WindowHandle;

pub trait WindowApi: Send + Sync {
    /// Read a window long (style or extended style)
    fn get_long(&self, window: WindowHandle, index: StyleIndex) -> isize;

    /// Write a window long, returning the previous value
    fn set_long(&self, window: WindowHandle, index: StyleIndex, value: isize)
        -> Result<isize, ShellError>;

    /// `SetLayeredWindowAttributes` with `LWA_ALPHA`
    fn set_layered_alpha(&self, window: WindowHandle, alpha: u8) -> Result<(), ShellError>;

    /// Drop the window class background brush
    fn clear_background_brush(&self, window: WindowHandle) -> Result<(), ShellError>;

    /// Extend the DWM frame over the whole client area
    fn extend_frame_into_client(&self, window: WindowHandle) -> Result<(), ShellError>;

    /// Move without resizing or changing z-order
    fn move_to(&self, window: WindowHandle, x: i32, y: i32) -> Result<(), ShellError>;

    /// Make the window manager re-read the frame after a style change
    fn refresh_frame(&self, window: WindowHandle) -> Result<(), ShellError>;

    /// `ShowWindow`; returns whether the window was previously visible
    fn show(&self, window: WindowHandle, command: ShowCommand) -> bool;

    /// `ShowWindowAsync`; returns whether the request was posted
    fn show_async(&self, window: WindowHandle, command: ShowCommand) -> bool;

    /// `UpdateWindow`
    fn update(&self, window: WindowHandle) -> Result<(), ShellError>;

    fn metric(&self, metric: SystemMetric) -> i32;
}

#[cfg(windows)]
mod table {
    use super::WindowApi;
    use crate::window::win32::Win32Api;
    use once_cell::sync::Lazy;
    use std::sync::Arc;
    use tracing::debug;

    static WIN32: Lazy<Arc<Win32Api>> = Lazy::new(|| {
        debug!(
            "Win32 window primitives initialized ({}-bit accessors)",
            usize::BITS
        );
        Arc::new(Win32Api)
    });

    /// The process-wide Win32 primitive table
    pub fn native_api() -> Arc<dyn WindowApi> {
        WIN32.clone()
    }
}

#[cfg(windows)]
pub use table::native_api;
