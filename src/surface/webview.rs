//! WebView2 rendering surface
//!
//! A `winit` window hosting a `wry` webview. The event loop is built on the
//! calling thread (`with_any_thread`), which becomes the window-owning thread.
//! Every cross-thread request travels as a `UserEvent` through the loop's
//! proxy and is handled on that thread in the order it was sent.

use super::bindings::{self, BindingFn, BindingRegistry, IpcCall};
use super::{RunLoop, Surface, SurfaceFactory, SurfaceOptions, SurfaceParts, Task, WindowHandle};
use crate::error::ShellError;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use winit::dpi::{LogicalSize, PhysicalPosition};
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop, EventLoopBuilder, EventLoopProxy};
use winit::platform::windows::{EventLoopBuilderExtWindows, IconExtWindows};
use winit::raw_window_handle::{HasWindowHandle, RawWindowHandle};
use winit::window::{Icon, Window, WindowBuilder};
use wry::{PageLoadEvent, WebView, WebViewBuilder};

/// Requests handled on the window-owning thread
pub enum UserEvent {
    Dispatch(Task),
    Navigate(String),
    Eval(String),
    /// A page finished loading; binding stubs need reinstalling
    PageLoaded,
    Terminate,
}

/// Creates the winit window and wry webview
#[derive(Debug, Default, Clone, Copy)]
pub struct WebViewFactory;

impl SurfaceFactory for WebViewFactory {
    fn create(&self, options: &SurfaceOptions) -> Result<SurfaceParts, ShellError> {
        let mut builder = EventLoopBuilder::<UserEvent>::with_user_event();
        builder.with_any_thread(true);
        let event_loop = builder
            .build()
            .map_err(|e| ShellError::SurfaceCreation(format!("event loop: {}", e)))?;

        let window = build_window(&event_loop, options)?;
        let hwnd = match window.window_handle().map(|h| h.as_raw()) {
            Ok(RawWindowHandle::Win32(handle)) => WindowHandle(handle.hwnd.get()),
            _ => {
                return Err(ShellError::SurfaceCreation(
                    "window has no Win32 handle".to_string(),
                ))
            }
        };

        let proxy = event_loop.create_proxy();
        let bindings = Arc::new(BindingRegistry::new());

        let ipc_bindings = Arc::clone(&bindings);
        let ipc_proxy = proxy.clone();
        let load_proxy = proxy.clone();

        let webview = WebViewBuilder::new()
            .with_devtools(options.debug)
            .with_focused(options.auto_focus)
            .with_initialization_script(bindings::BOOTSTRAP_SCRIPT)
            .with_ipc_handler(move |request| {
                handle_ipc(request.body(), &ipc_bindings, &ipc_proxy);
            })
            .with_on_page_load_handler(move |event, _url| {
                if let PageLoadEvent::Finished = event {
                    let _ = load_proxy.send_event(UserEvent::PageLoaded);
                }
            })
            .build(&window)
            .map_err(|e| ShellError::SurfaceCreation(format!("webview: {}", e)))?;

        info!("Created window {:?} ({}x{})", hwnd, options.width, options.height);

        let alive = Arc::new(AtomicBool::new(true));

        let run_loop = WebViewRunLoop {
            event_loop,
            window,
            webview,
            bindings: Arc::clone(&bindings),
            alive: Arc::clone(&alive),
        };
        let surface = WebViewHandle {
            proxy: Mutex::new(proxy),
            hwnd,
            alive,
            bindings,
        };

        Ok(SurfaceParts {
            run_loop: Box::new(run_loop),
            surface: Arc::new(surface),
        })
    }
}

fn build_window(
    event_loop: &EventLoop<UserEvent>,
    options: &SurfaceOptions,
) -> Result<Window, ShellError> {
    let mut builder = WindowBuilder::new()
        .with_title(&options.title)
        .with_inner_size(LogicalSize::new(options.width, options.height));

    if options.icon_id != 0 {
        match Icon::from_resource(options.icon_id, None) {
            Ok(icon) => builder = builder.with_window_icon(Some(icon)),
            Err(e) => warn!("Icon resource {} not loaded: {}", options.icon_id, e),
        }
    }

    let window = builder
        .build(event_loop)
        .map_err(|e| ShellError::SurfaceCreation(format!("window: {}", e)))?;

    if options.center {
        center_window(&window);
    }

    Ok(window)
}

fn center_window(window: &Window) {
    let Some(monitor) = window.current_monitor() else {
        debug!("No monitor reported, window left at default position");
        return;
    };

    let screen = monitor.size();
    let origin = monitor.position();
    let outer = window.outer_size();

    let x = origin.x + (screen.width as i32 - outer.width as i32) / 2;
    let y = origin.y + (screen.height as i32 - outer.height as i32) / 2;
    window.set_outer_position(PhysicalPosition::new(x, y));
}

/// Runs a page-initiated binding call off the UI thread and posts the result back
fn handle_ipc(body: &str, registry: &Arc<BindingRegistry>, proxy: &EventLoopProxy<UserEvent>) {
    let Some(call) = IpcCall::parse(body) else {
        warn!("Ignoring malformed IPC message: {}", body);
        return;
    };

    let registry = Arc::clone(registry);
    let proxy = proxy.clone();

    let spawned = std::thread::Builder::new()
        .name(format!("binding-{}", call.name))
        .spawn(move || {
            let result = registry.call(&call.name, call.params);
            if let Err(message) = &result {
                debug!("Binding '{}' failed: {}", call.name, message);
            }
            let script = bindings::settle_script(call.id, &result);
            let _ = proxy.send_event(UserEvent::Eval(script));
        });

    if let Err(e) = spawned {
        error!("Failed to start binding thread: {}", e);
    }
}

/// Thread-bound half: owns the event loop, window and webview
pub struct WebViewRunLoop {
    event_loop: EventLoop<UserEvent>,
    window: Window,
    webview: WebView,
    bindings: Arc<BindingRegistry>,
    alive: Arc<AtomicBool>,
}

impl RunLoop for WebViewRunLoop {
    fn run(self: Box<Self>) {
        let WebViewRunLoop {
            event_loop,
            window,
            webview,
            bindings,
            alive,
        } = *self;

        let window_id = window.id();

        let result = event_loop.run(move |event, target| {
            target.set_control_flow(ControlFlow::Wait);

            match event {
                Event::UserEvent(UserEvent::Dispatch(task)) => task(),
                Event::UserEvent(UserEvent::Navigate(url)) => {
                    if let Err(e) = webview.load_url(&url) {
                        warn!("Navigation to {} failed: {}", url, e);
                    }
                }
                Event::UserEvent(UserEvent::Eval(script)) => {
                    if let Err(e) = webview.evaluate_script(&script) {
                        debug!("Script evaluation failed: {}", e);
                    }
                }
                Event::UserEvent(UserEvent::PageLoaded) => {
                    for name in bindings.names() {
                        let _ = webview.evaluate_script(&bindings::stub_script(&name));
                    }
                }
                Event::UserEvent(UserEvent::Terminate) => {
                    info!("Terminate requested, leaving event loop");
                    target.exit();
                }
                Event::WindowEvent {
                    window_id: id,
                    event: WindowEvent::CloseRequested,
                } if id == window_id => {
                    info!("Window closed");
                    target.exit();
                }
                _ => {}
            }

            // keep the window alive for as long as the loop runs
            let _ = &window;
        });

        alive.store(false, Ordering::SeqCst);

        if let Err(e) = result {
            warn!("Event loop ended with error: {}", e);
        }
    }
}

/// Cross-thread half: forwards requests through the event loop proxy
pub struct WebViewHandle {
    proxy: Mutex<EventLoopProxy<UserEvent>>,
    hwnd: WindowHandle,
    alive: Arc<AtomicBool>,
    bindings: Arc<BindingRegistry>,
}

impl WebViewHandle {
    fn send(&self, event: UserEvent, what: &str) {
        if self.proxy.lock().send_event(event).is_err() {
            debug!("Event loop closed, dropping {}", what);
        }
    }
}

impl Surface for WebViewHandle {
    fn dispatch(&self, task: Task) {
        self.send(UserEvent::Dispatch(task), "dispatched task");
    }

    fn terminate(&self) {
        self.send(UserEvent::Terminate, "terminate request");
    }

    fn navigate(&self, url: &str) {
        self.send(UserEvent::Navigate(url.to_string()), "navigation");
    }

    fn bind(&self, name: &str, handler: BindingFn) {
        self.bindings.insert(name, handler);
        self.send(UserEvent::Eval(bindings::stub_script(name)), "binding stub");
    }

    fn native_window(&self) -> Option<WindowHandle> {
        self.alive.load(Ordering::SeqCst).then_some(self.hwnd)
    }
}
