//! Tray menu manager
//!
//! Menu items can be added from any thread at any time. Until the tray
//! reports ready they are buffered; at readiness the configured items are
//! created first, then the buffered ones in submission order, and from then
//! on new items are created immediately. All menu state sits behind one lock
//! so concurrent submitters and the readiness transition never interleave.
//!
//! Each created item with a click handler gets its own listener thread that
//! calls the handler once per click, for as long as the backend keeps the
//! item's click channel open.
pub mod backend;

#[cfg(windows)]
pub mod native;

use crate::app::Lifecycle;
use crate::config::{MenuItem, TrayConfig};
use crate::error::ShellError;
use crate::signal::Signal;
use backend::{ItemId, ItemLabel, TrayBackend, TrayHooks};
use crossbeam::channel::{bounded, select};
use parking_lot::Mutex;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// A menu entry as it exists in the native menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveMenuItem {
    pub id: ItemId,
    pub title: String,
    pub children: Vec<LiveMenuItem>,
}

#[derive(Default)]
struct MenuState {
    initialized: bool,
    pending: Vec<MenuItem>,
    live: Vec<LiveMenuItem>,
}

pub struct TrayManager {
    backend: Arc<dyn TrayBackend>,
    config: TrayConfig,
    state: Mutex<MenuState>,
    ready: Signal,
    lifecycle: Arc<Lifecycle>,
}

impl TrayManager {
    pub fn new(
        config: TrayConfig,
        backend: Arc<dyn TrayBackend>,
        lifecycle: Arc<Lifecycle>,
    ) -> Self {
        Self {
            backend,
            config,
            state: Mutex::new(MenuState::default()),
            ready: Signal::new(),
            lifecycle,
        }
    }

    /// Add a top-level item. Buffered until the tray is ready.
    pub fn add_menu_item(&self, item: MenuItem) {
        let mut state = self.state.lock();
        if state.initialized {
            if let Some(live) = self.realize(&item, None) {
                state.live.push(live);
            }
        } else {
            debug!("Tray not ready, queueing menu item '{}'", item.title);
            state.pending.push(item);
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state.lock().initialized
    }

    /// Fires once, when the tray has become ready
    pub fn ready_signal(&self) -> &Signal {
        &self.ready
    }

    /// Wait for readiness. Returns `false` on timeout.
    pub fn wait_ready(&self, timeout: Duration) -> bool {
        self.ready.wait_timeout(timeout)
    }

    /// Snapshot of the created menu, in menu order
    pub fn live_items(&self) -> Vec<LiveMenuItem> {
        self.state.lock().live.clone()
    }

    /// Start the tray loop on its own thread and block until the tray is
    /// ready, the application quits, or the loop ends on its own.
    /// Returns the loop thread for joining.
    pub fn run(self: &Arc<Self>) -> Result<JoinHandle<()>, ShellError> {
        let quit = self.lifecycle.quit.clone();
        let hooks = TrayHooks {
            on_ready: {
                let manager = Arc::clone(self);
                Box::new(move || manager.on_ready())
            },
            on_exit: {
                let manager = Arc::clone(self);
                Box::new(move || manager.on_exit())
            },
            quit: quit.clone(),
        };

        let (done_tx, done_rx) = bounded::<()>(0);
        let backend = Arc::clone(&self.backend);
        let handle = thread::Builder::new()
            .name("tray".to_string())
            .spawn(move || {
                let _done = done_tx;
                backend.run(hooks);
                debug!("Tray loop finished");
            })?;

        select! {
            recv(self.ready.receiver()) -> _ => info!("Tray ready"),
            recv(quit.receiver()) -> _ => debug!("Quit before tray became ready"),
            recv(done_rx) -> _ => warn!("Tray loop ended before becoming ready"),
        }

        Ok(handle)
    }

    /// Ask the tray to exit; this runs the exit path and terminates the application
    pub fn request_exit(&self) {
        self.backend.request_exit();
    }

    fn on_ready(&self) {
        {
            let mut state = self.state.lock();
            if state.initialized {
                return;
            }

            if !self.config.title.is_empty() {
                if let Err(e) = self.backend.set_title(&self.config.title) {
                    warn!("Failed to set tray title: {}", e);
                }
            }
            if !self.config.tooltip.is_empty() {
                if let Err(e) = self.backend.set_tooltip(&self.config.tooltip) {
                    warn!("Failed to set tray tooltip: {}", e);
                }
            }

            for item in &self.config.menu_items {
                if let Some(live) = self.realize(item, None) {
                    state.live.push(live);
                }
            }

            let pending = std::mem::take(&mut state.pending);
            for item in &pending {
                if let Some(live) = self.realize(item, None) {
                    state.live.push(live);
                }
            }

            state.initialized = true;
            self.ready.fire();
            info!(
                "Tray menu built: {} configured, {} queued",
                self.config.menu_items.len(),
                pending.len()
            );
        }

        if let Some(on_ready) = &self.config.on_ready {
            on_ready();
        }
    }

    fn on_exit(&self) {
        info!("Tray exit requested");
        if let Some(on_exit) = &self.config.on_exit {
            on_exit();
        }
        self.lifecycle.terminate();
    }

    /// Create `item` and its children in the native menu
    fn realize(&self, item: &MenuItem, parent: Option<ItemId>) -> Option<LiveMenuItem> {
        let label = ItemLabel {
            title: item.title.clone(),
            tooltip: item.tooltip.clone(),
            submenu: !item.items.is_empty(),
            checkable: item.checked,
        };

        let native = match self.backend.add_item(parent, &label) {
            Ok(native) => native,
            Err(e) => {
                warn!("Failed to add menu item '{}': {}", item.title, e);
                return None;
            }
        };
        let id = native.id;

        if item.disabled {
            if let Err(e) = self.backend.set_enabled(id, false) {
                warn!("Failed to disable menu item '{}': {}", item.title, e);
            }
        }
        if item.checked {
            if let Err(e) = self.backend.set_checked(id, true) {
                warn!("Failed to check menu item '{}': {}", item.title, e);
            }
        }

        if let Some(handler) = item.handler.clone() {
            let clicks = native.clicks;
            let title = item.title.clone();
            let spawned = thread::Builder::new()
                .name(format!("tray-item-{}", id))
                .spawn(move || {
                    for _ in clicks.iter() {
                        // A panicking handler must not stop later clicks
                        if panic::catch_unwind(AssertUnwindSafe(|| handler())).is_err() {
                            error!("Click handler for '{}' panicked", title);
                        }
                    }
                    debug!("Listener for '{}' stopped", title);
                });
            if let Err(e) = spawned {
                error!("Failed to start listener for '{}': {}", item.title, e);
            }
        }

        let children = item
            .items
            .iter()
            .filter_map(|child| self.realize(child, Some(id)))
            .collect();

        Some(LiveMenuItem {
            id,
            title: item.title.clone(),
            children,
        })
    }
}
