//! Seam between the menu manager and the native tray host

use crate::error::ShellError;
use crate::signal::Signal;
use crossbeam::channel::Receiver;
use std::thread::{self, JoinHandle};
use tracing::error;

/// Identifier the backend assigns to a created menu entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub u32);

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the backend needs to create one menu entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemLabel {
    pub title: String,
    pub tooltip: String,
    /// The entry will receive child entries
    pub submenu: bool,
    /// The entry shows a check mark that can be toggled
    pub checkable: bool,
}

/// A created entry and the stream of its clicks, one message per click
pub struct NativeItem {
    pub id: ItemId,
    pub clicks: Receiver<()>,
}

/// Callbacks handed to the tray loop
pub struct TrayHooks {
    /// Called once after the icon exists, possibly off the tray thread
    pub on_ready: Box<dyn FnOnce() + Send>,
    /// Called when an exit is requested through the tray; the loop ends once
    /// it returns
    pub on_exit: Box<dyn FnOnce() + Send>,
    /// Stops the loop without calling `on_exit`
    pub quit: Signal,
}

/// Native tray icon and menu host
///
/// `run` blocks the calling thread for the lifetime of the tray and returns
/// only after both hooks have returned. The other methods may be called from
/// any thread, including from inside the hooks.
pub trait TrayBackend: Send + Sync {
    fn run(&self, hooks: TrayHooks);

    fn set_title(&self, title: &str) -> Result<(), ShellError>;

    fn set_tooltip(&self, tooltip: &str) -> Result<(), ShellError>;

    /// Create an entry at the end of `parent`'s submenu, or of the root menu
    fn add_item(&self, parent: Option<ItemId>, label: &ItemLabel)
        -> Result<NativeItem, ShellError>;

    fn set_enabled(&self, id: ItemId, enabled: bool) -> Result<(), ShellError>;

    fn set_checked(&self, id: ItemId, checked: bool) -> Result<(), ShellError>;

    /// Ask the loop to run `on_exit` and stop
    fn request_exit(&self);
}

/// Hook threads a tray loop has started and must outlive
#[derive(Default)]
#[cfg_attr(not(windows), allow(dead_code))]
pub(crate) struct HookThreads {
    handles: Vec<JoinHandle<()>>,
}

#[cfg_attr(not(windows), allow(dead_code))]
impl HookThreads {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, name: &str, hook: Box<dyn FnOnce() + Send>) {
        match thread::Builder::new().name(name.to_string()).spawn(hook) {
            Ok(handle) => self.handles.push(handle),
            Err(e) => error!("Failed to start {} thread: {}", name, e),
        }
    }

    /// No hook is still running
    pub fn all_finished(&self) -> bool {
        self.handles.iter().all(JoinHandle::is_finished)
    }

    /// Wait for every hook; returns how many panicked
    pub fn join_all(self) -> usize {
        let mut panicked = 0;
        for handle in self.handles {
            let name = handle.thread().name().unwrap_or("hook").to_string();
            if handle.join().is_err() {
                error!("Tray hook thread '{}' panicked", name);
                panicked += 1;
            }
        }
        panicked
    }
}
