//! Application controller
//!
//! `Application` owns the run loop and is pinned to the thread that created
//! it. Everything else goes through `AppHandle`, a cheap clonable handle that
//! can be moved to any thread (tray handlers, binding handlers, workers).
//!
//! Shutdown is signal based: the quit signal fires exactly once, whether the
//! window was closed, `terminate` was called or the tray asked to exit. The
//! first to fire it terminates the surface; everyone else is a no-op.

use crate::config::{ApplicationConfig, MenuItem};
use crate::error::ShellError;
use crate::signal::Signal;
use crate::surface::bindings::Binding;
use crate::surface::{RunLoop, Surface, SurfaceFactory, SurfaceOptions, SurfaceParts};
use crate::tray::backend::TrayBackend;
use crate::tray::{LiveMenuItem, TrayManager};
use crate::window::native::WindowApi;
use crate::window::{ScreenSize, VirtualScreenInfo, WindowController};
use std::ops::Deref;
use std::sync::Arc;
use std::thread;
use tracing::{debug, error, info, warn};

/// Quit signal plus the surface it stops
pub struct Lifecycle {
    pub(crate) quit: Signal,
    surface: Arc<dyn Surface>,
}

impl Lifecycle {
    pub fn new(surface: Arc<dyn Surface>) -> Self {
        Self {
            quit: Signal::new(),
            surface,
        }
    }

    /// Fire the quit signal and stop the surface. Returns `false` if the
    /// application was already terminated.
    pub fn terminate(&self) -> bool {
        if self.quit.fire() {
            info!("Terminating application");
            self.surface.terminate();
            true
        } else {
            debug!("Terminate requested again, ignoring");
            false
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.quit.is_fired()
    }
}

/// Native implementations the application is assembled from
pub struct Backends {
    pub surface: Box<dyn SurfaceFactory>,
    pub tray: Option<Arc<dyn TrayBackend>>,
    pub window_api: Arc<dyn WindowApi>,
}

#[cfg(windows)]
impl Backends {
    /// WebView2 surface, `tray-icon` tray (if configured) and the Win32 table
    pub fn native(config: &ApplicationConfig) -> Self {
        let tray = config.tray.as_ref().map(|tray| {
            Arc::new(crate::tray::native::NativeTray::new(tray.icon_id)) as Arc<dyn TrayBackend>
        });

        Self {
            surface: Box::new(crate::surface::webview::WebViewFactory),
            tray,
            window_api: crate::window::native::native_api(),
        }
    }
}

/// Thread-safe handle to a running application
#[derive(Clone)]
pub struct AppHandle {
    lifecycle: Arc<Lifecycle>,
    tray: Option<Arc<TrayManager>>,
    window: WindowController,
}

impl AppHandle {
    /// Stop the run loop. Safe to call any number of times from any thread.
    pub fn terminate(&self) {
        self.lifecycle.terminate();
    }

    /// Same as `terminate`
    pub fn exit(&self) {
        self.terminate();
    }

    pub fn is_terminated(&self) -> bool {
        self.lifecycle.is_terminated()
    }

    /// Block until the application has been terminated
    pub fn wait_terminated(&self) {
        self.lifecycle.quit.wait();
    }

    pub fn navigate(&self, url: &str) {
        self.lifecycle.surface.navigate(url);
    }

    /// Expose functions to page scripts. A name that is already bound is replaced.
    pub fn invoke_handler(&self, bindings: Vec<Binding>) {
        for binding in bindings {
            debug!("Binding '{}'", binding.name);
            self.lifecycle.surface.bind(&binding.name, binding.handler);
        }
    }

    /// Add a top-level tray menu item; ignored when there is no tray
    pub fn add_menu_item(&self, item: MenuItem) {
        match &self.tray {
            Some(tray) => tray.add_menu_item(item),
            None => debug!("No tray configured, ignoring menu item '{}'", item.title),
        }
    }

    /// Ask the tray to exit, which runs its exit callback and terminates
    pub fn quit_tray(&self) {
        match &self.tray {
            Some(tray) => tray.request_exit(),
            None => debug!("No tray configured, nothing to quit"),
        }
    }

    pub fn tray(&self) -> Option<&Arc<TrayManager>> {
        self.tray.as_ref()
    }

    /// Snapshot of the created tray menu; empty without a tray
    pub fn live_menu_items(&self) -> Vec<LiveMenuItem> {
        self.tray
            .as_ref()
            .map(|tray| tray.live_items())
            .unwrap_or_default()
    }

    pub fn surface(&self) -> &Arc<dyn Surface> {
        &self.lifecycle.surface
    }

    pub fn window(&self) -> &WindowController {
        &self.window
    }

    pub fn show_window(&self) {
        self.window.show_window();
    }

    pub fn hide_window(&self) {
        self.window.hide_window();
    }

    pub fn maximize(&self) {
        self.window.maximize();
    }

    pub fn minimize(&self) {
        self.window.minimize();
    }

    pub fn restore(&self) {
        self.window.restore();
    }

    pub fn set_position(&self, x: i32, y: i32) {
        self.window.set_position(x, y);
    }

    pub fn remove_borders(&self) {
        self.window.remove_borders();
    }

    pub fn restore_borders(&self) {
        self.window.restore_borders();
    }

    pub fn set_transparency(&self, alpha: u8) {
        self.window.set_transparency(alpha);
    }

    pub fn set_background_transparent(&self) -> Result<(), ShellError> {
        self.window.set_background_transparent()
    }

    pub fn screen_size(&self) -> ScreenSize {
        self.window.screen_size()
    }

    pub fn virtual_screen_info(&self) -> VirtualScreenInfo {
        self.window.virtual_screen_info()
    }
}

/// The application; lives on the window-owning thread
pub struct Application {
    handle: AppHandle,
    run_loop: Box<dyn RunLoop>,
}

impl Application {
    /// Create the native window, webview and (if configured) tray
    #[cfg(windows)]
    pub fn new(config: ApplicationConfig) -> Result<Self, ShellError> {
        let backends = Backends::native(&config);
        Self::with_backends(config, backends)
    }

    pub fn with_backends(
        config: ApplicationConfig,
        backends: Backends,
    ) -> Result<Self, ShellError> {
        let options = SurfaceOptions::from(&config);
        let SurfaceParts { run_loop, surface } =
            backends.surface.create(&options).map_err(|e| {
                error!("{}", e);
                e
            })?;

        let lifecycle = Arc::new(Lifecycle::new(Arc::clone(&surface)));

        let tray = match (config.tray, backends.tray) {
            (Some(tray_config), Some(backend)) => Some(Arc::new(TrayManager::new(
                tray_config,
                backend,
                Arc::clone(&lifecycle),
            ))),
            (Some(_), None) => {
                warn!("Tray configured but no tray backend available");
                None
            }
            (None, _) => None,
        };

        let window = WindowController::new(backends.window_api, surface);

        info!("Application '{}' created", config.title);

        Ok(Self {
            handle: AppHandle {
                lifecycle,
                tray,
                window,
            },
            run_loop,
        })
    }

    pub fn handle(&self) -> AppHandle {
        self.handle.clone()
    }

    /// Run until terminated or the window is closed, then wait for the tray
    /// to shut down
    pub fn run(self) {
        let Application { handle, run_loop } = self;

        let supervisor = handle.tray.clone().and_then(|tray| {
            let spawned = thread::Builder::new()
                .name("tray-supervisor".to_string())
                .spawn(move || match tray.run() {
                    Ok(loop_thread) => {
                        if loop_thread.join().is_err() {
                            error!("Tray thread panicked");
                        }
                    }
                    Err(e) => error!("Failed to start tray: {}", e),
                });
            match spawned {
                Ok(supervisor) => Some(supervisor),
                Err(e) => {
                    error!("Failed to start tray supervisor: {}", e);
                    None
                }
            }
        });

        info!("Entering run loop");
        run_loop.run();
        info!("Run loop finished");

        // Window closed or terminated; either way the tray must stop
        handle.lifecycle.quit.fire();

        if let Some(supervisor) = supervisor {
            if supervisor.join().is_err() {
                error!("Tray supervisor panicked");
            }
        }
    }

    pub fn run_with_url(self, url: &str) {
        self.handle.navigate(url);
        self.run();
    }
}

impl Deref for Application {
    type Target = AppHandle;

    fn deref(&self) -> &AppHandle {
        &self.handle
    }
}
