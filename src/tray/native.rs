//! System tray backend built on `tray-icon`
//!
//! The icon, its menu and every menu entry live on the thread that calls
//! `run`, which pumps Win32 messages and polls for work every 10ms. Other
//! threads reach the menu by sending closures over a channel and waiting for
//! the reply. The hooks run on their own threads so the loop keeps serving
//! those requests while they execute, and `run` returns only once they are done.

use super::backend::{HookThreads, ItemId, ItemLabel, NativeItem, TrayBackend, TrayHooks};
use crate::error::ShellError;
use crate::signal::Signal;
use crossbeam::channel::{bounded, unbounded, Sender};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::thread::{self, ThreadId};
use tracing::{debug, error, info, warn};
use std::time::Duration;
use tray_icon::menu::{CheckMenuItem, IsMenuItem, Menu, MenuEvent, MenuId, MenuItem, Submenu};
use tray_icon::{Icon, TrayIcon, TrayIconBuilder};
use windows::Win32::UI::WindowsAndMessaging::{
    DispatchMessageW, PeekMessageW, TranslateMessage, MSG, PM_REMOVE, WM_QUIT,
};

type Command = Box<dyn FnOnce(&mut TrayState) + Send>;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Resource icon, or a plain green square when none is available
fn load_icon(icon_id: u16) -> Result<Icon, ShellError> {
    if icon_id != 0 {
        match Icon::from_resource(icon_id, None) {
            Ok(icon) => return Ok(icon),
            Err(e) => warn!("Tray icon resource {} not loaded: {}", icon_id, e),
        }
    }

    let rgba: Vec<u8> = (0..16 * 16)
        .flat_map(|_| [0x00, 0xAA, 0x00, 0xFF])
        .collect();
    Icon::from_rgba(rgba, 16, 16)
        .map_err(|e| ShellError::Tray(format!("Failed to create fallback icon: {}", e)))
}

enum Entry {
    Plain(MenuItem),
    Check(CheckMenuItem),
    Sub(Submenu),
}

impl Entry {
    fn as_menu_item(&self) -> &dyn IsMenuItem {
        match self {
            Entry::Plain(item) => item,
            Entry::Check(item) => item,
            Entry::Sub(item) => item,
        }
    }

    fn menu_id(&self) -> MenuId {
        match self {
            Entry::Plain(item) => item.id().clone(),
            Entry::Check(item) => item.id().clone(),
            Entry::Sub(item) => item.id().clone(),
        }
    }
}

/// Tray-thread state; never leaves the tray thread
struct TrayState {
    icon: TrayIcon,
    menu: Menu,
    entries: HashMap<ItemId, Entry>,
    clicks: HashMap<MenuId, Sender<()>>,
    next_id: u32,
}

impl TrayState {
    fn create(icon_id: u16) -> Result<Self, ShellError> {
        let menu = Menu::new();
        let icon = TrayIconBuilder::new()
            .with_icon(load_icon(icon_id)?)
            .with_menu(Box::new(menu.clone()))
            .build()
            .map_err(|e| ShellError::Tray(format!("Failed to create tray icon: {}", e)))?;

        Ok(Self {
            icon,
            menu,
            entries: HashMap::new(),
            clicks: HashMap::new(),
            next_id: 1,
        })
    }

    fn add_item(
        &mut self,
        parent: Option<ItemId>,
        label: &ItemLabel,
    ) -> Result<NativeItem, ShellError> {
        if !label.tooltip.is_empty() {
            debug!("Menu item tooltips are not shown on this platform");
        }

        let entry = if label.submenu {
            Entry::Sub(Submenu::new(&label.title, true))
        } else if label.checkable {
            Entry::Check(CheckMenuItem::new(&label.title, true, false, None))
        } else {
            Entry::Plain(MenuItem::new(&label.title, true, None))
        };

        let appended = match parent {
            None => self.menu.append(entry.as_menu_item()),
            Some(parent_id) => match self.entries.get(&parent_id) {
                Some(Entry::Sub(submenu)) => submenu.append(entry.as_menu_item()),
                Some(_) => {
                    return Err(ShellError::Tray(format!(
                        "menu item {} has no submenu",
                        parent_id
                    )))
                }
                None => {
                    return Err(ShellError::Tray(format!("unknown menu item {}", parent_id)))
                }
            },
        };
        appended.map_err(|e| ShellError::Tray(format!("Failed to add '{}': {}", label.title, e)))?;

        let id = ItemId(self.next_id);
        self.next_id += 1;

        let (tx, rx) = unbounded();
        self.clicks.insert(entry.menu_id(), tx);
        self.entries.insert(id, entry);

        Ok(NativeItem { id, clicks: rx })
    }

    fn entry(&self, id: ItemId) -> Result<&Entry, ShellError> {
        self.entries
            .get(&id)
            .ok_or_else(|| ShellError::Tray(format!("unknown menu item {}", id)))
    }

    fn set_enabled(&self, id: ItemId, enabled: bool) -> Result<(), ShellError> {
        match self.entry(id)? {
            Entry::Plain(item) => item.set_enabled(enabled),
            Entry::Check(item) => item.set_enabled(enabled),
            Entry::Sub(item) => item.set_enabled(enabled),
        }
        Ok(())
    }

    fn set_checked(&self, id: ItemId, checked: bool) -> Result<(), ShellError> {
        match self.entry(id)? {
            Entry::Check(item) => {
                item.set_checked(checked);
                Ok(())
            }
            _ => Err(ShellError::Tray(format!(
                "menu item {} is not checkable",
                id
            ))),
        }
    }

    fn route_click(&self, menu_id: &MenuId) {
        match self.clicks.get(menu_id) {
            Some(sender) => {
                // No listener when the item has no handler
                let _ = sender.send(());
            }
            None => debug!("Click on unknown menu id {:?}", menu_id),
        }
    }
}

/// `tray-icon` host; one `run` per instance
pub struct NativeTray {
    icon_id: u16,
    commands: Mutex<Option<Sender<Command>>>,
    tray_thread: Mutex<Option<ThreadId>>,
    exit: Signal,
}

impl NativeTray {
    pub fn new(icon_id: u16) -> Self {
        Self {
            icon_id,
            commands: Mutex::new(None),
            tray_thread: Mutex::new(None),
            exit: Signal::new(),
        }
    }

    /// Run `f` against the tray state on the tray thread and wait for its result
    fn call<R, F>(&self, what: &'static str, f: F) -> Result<R, ShellError>
    where
        R: Send + 'static,
        F: FnOnce(&mut TrayState) -> Result<R, ShellError> + Send + 'static,
    {
        if *self.tray_thread.lock() == Some(thread::current().id()) {
            return Err(ShellError::Tray(format!(
                "{} called from the tray thread",
                what
            )));
        }

        let sender = self
            .commands
            .lock()
            .clone()
            .ok_or_else(|| ShellError::Tray("tray is not running".to_string()))?;

        let (reply_tx, reply_rx) = bounded(1);
        sender
            .send(Box::new(move |state: &mut TrayState| {
                let _ = reply_tx.send(f(state));
            }))
            .map_err(|_| ShellError::Tray("tray is not running".to_string()))?;

        reply_rx
            .recv()
            .map_err(|_| ShellError::Tray(format!("tray stopped before {} completed", what)))?
    }
}

impl TrayBackend for NativeTray {
    fn run(&self, hooks: TrayHooks) {
        let TrayHooks {
            on_ready,
            on_exit,
            quit,
        } = hooks;

        let mut state = match TrayState::create(self.icon_id) {
            Ok(state) => state,
            Err(e) => {
                error!("{}", e);
                return;
            }
        };
        info!("Tray icon created");

        let (command_tx, command_rx) = unbounded::<Command>();
        *self.commands.lock() = Some(command_tx);
        *self.tray_thread.lock() = Some(thread::current().id());

        let mut hook_threads = HookThreads::new();
        if quit.is_fired() {
            debug!("Quit before the tray started, skipping ready hook");
        } else {
            hook_threads.spawn("tray-ready", on_ready);
        }

        let mut on_exit = Some(on_exit);
        let mut stopping = false;

        // Once stopping, the loop keeps serving commands until every hook has returned
        unsafe {
            let mut msg = MSG::default();
            loop {
                while PeekMessageW(&mut msg, None, 0, 0, PM_REMOVE).as_bool() {
                    if msg.message == WM_QUIT {
                        info!("WM_QUIT received, leaving tray loop");
                        stopping = true;
                        break;
                    }
                    let _ = TranslateMessage(&msg);
                    DispatchMessageW(&msg);
                }

                while let Ok(command) = command_rx.try_recv() {
                    command(&mut state);
                }

                while let Ok(event) = MenuEvent::receiver().try_recv() {
                    state.route_click(&event.id);
                }

                if !stopping {
                    if quit.is_fired() {
                        debug!("Quit signalled, leaving tray loop");
                        stopping = true;
                    } else if self.exit.is_fired() {
                        if let Some(hook) = on_exit.take() {
                            debug!("Running tray exit hook");
                            hook_threads.spawn("tray-exit", hook);
                        }
                        stopping = true;
                    }
                }

                if stopping && hook_threads.all_finished() {
                    break;
                }

                thread::sleep(POLL_INTERVAL);
            }
        }

        hook_threads.join_all();

        self.commands.lock().take();
        self.tray_thread.lock().take();
        drop(command_rx);

        if let Err(e) = state.icon.set_visible(false) {
            debug!("Failed to hide tray icon: {}", e);
        }
        info!("Tray icon removed");
    }

    fn set_title(&self, title: &str) -> Result<(), ShellError> {
        let title = title.to_string();
        self.call("set_title", move |state| {
            state.icon.set_title(Some(title));
            Ok(())
        })
    }

    fn set_tooltip(&self, tooltip: &str) -> Result<(), ShellError> {
        let tooltip = tooltip.to_string();
        self.call("set_tooltip", move |state| {
            state
                .icon
                .set_tooltip(Some(tooltip))
                .map_err(|e| ShellError::Tray(format!("Failed to set tooltip: {}", e)))
        })
    }

    fn add_item(
        &self,
        parent: Option<ItemId>,
        label: &ItemLabel,
    ) -> Result<NativeItem, ShellError> {
        let label = label.clone();
        self.call("add_item", move |state| state.add_item(parent, &label))
    }

    fn set_enabled(&self, id: ItemId, enabled: bool) -> Result<(), ShellError> {
        self.call("set_enabled", move |state| state.set_enabled(id, enabled))
    }

    fn set_checked(&self, id: ItemId, checked: bool) -> Result<(), ShellError> {
        self.call("set_checked", move |state| state.set_checked(id, checked))
    }

    fn request_exit(&self) {
        self.exit.fire();
    }
}
