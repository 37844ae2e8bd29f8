//! Rendering surface seam
//!
//! The webview host is split in two halves:
//! - `RunLoop`: the thread-bound half that blocks in the native event loop.
//!   It is created on, and must stay on, the window-owning thread.
//! - `Surface`: a `Send + Sync` handle usable from any thread to terminate
//!   the loop, queue work onto the owning thread, navigate and bind functions.
//!
//! A `SurfaceFactory` creates both halves from `SurfaceOptions`.

pub mod bindings;

#[cfg(windows)]
pub mod webview;

use crate::config::ApplicationConfig;
use crate::error::ShellError;
use bindings::BindingFn;
use std::sync::Arc;

/// Work queued onto the window-owning thread
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Opaque native window handle (an HWND on Windows)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub isize);

/// Options the rendering surface is created with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceOptions {
    pub debug: bool,
    pub auto_focus: bool,
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub center: bool,
    pub icon_id: u16,
}

impl From<&ApplicationConfig> for SurfaceOptions {
    fn from(config: &ApplicationConfig) -> Self {
        SurfaceOptions {
            debug: config.debug,
            auto_focus: config.auto_focus,
            title: config.title.clone(),
            width: config.width,
            height: config.height,
            center: config.center,
            icon_id: config.icon_id,
        }
    }
}

/// Cross-thread handle to the rendering surface
pub trait Surface: Send + Sync {
    /// Queue `task` to run on the window-owning thread, in submission order
    fn dispatch(&self, task: Task);

    /// Ask the run loop to stop
    fn terminate(&self);

    fn navigate(&self, url: &str);

    /// Expose `handler` to page scripts as `window[name]`
    fn bind(&self, name: &str, handler: BindingFn);

    /// Native window handle while the window exists
    fn native_window(&self) -> Option<WindowHandle>;
}

/// Thread-bound event loop half of the surface
pub trait RunLoop {
    /// Block the calling thread until the surface is terminated or closed
    fn run(self: Box<Self>);
}

/// Both halves of a freshly created surface
pub struct SurfaceParts {
    pub run_loop: Box<dyn RunLoop>,
    pub surface: Arc<dyn Surface>,
}

pub trait SurfaceFactory {
    fn create(&self, options: &SurfaceOptions) -> Result<SurfaceParts, ShellError>;
}
