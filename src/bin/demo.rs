//! Glide.Demo - sample shell application
//!
//! Opens a small page with a tray menu and a `greet` function bound into the
//! page. An optional first argument names a JSON config file for the window.

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use anyhow::Result;

#[cfg(windows)]
fn main() -> Result<()> {
    use anyhow::Context;
    use glide_shell::{logging, Application, ApplicationConfig, Binding, MenuItem, TrayConfig};
    use serde_json::json;
    use std::path::PathBuf;
    use std::sync::{Arc, OnceLock};

    let mut config = match std::env::args().nth(1) {
        Some(path) => ApplicationConfig::load(&PathBuf::from(path))?,
        None => ApplicationConfig::default(),
    };
    logging::init(config.debug);

    tracing::info!("Glide.Demo starting...");

    // Tray handlers need the app handle, which only exists after construction
    let handle_slot: Arc<OnceLock<glide_shell::AppHandle>> = Arc::new(OnceLock::new());
    let with_handle = |f: fn(&glide_shell::AppHandle)| {
        let slot = Arc::clone(&handle_slot);
        move || {
            if let Some(handle) = slot.get() {
                f(handle);
            }
        }
    };

    config.tray = Some(TrayConfig {
        icon_id: config.icon_id,
        tooltip: config.title.clone(),
        menu_items: vec![
            MenuItem::new("Open").on_click(with_handle(|app| {
                app.show_window();
                app.restore();
            })),
            MenuItem::new("Window")
                .item(MenuItem::new("Hide").on_click(with_handle(|app| app.hide_window())))
                .item(
                    MenuItem::new("Borderless").on_click(with_handle(|app| app.remove_borders())),
                )
                .item(MenuItem::new("Bordered").on_click(with_handle(|app| app.restore_borders())))
                .item(
                    MenuItem::new("Translucent")
                        .on_click(with_handle(|app| app.set_transparency(200))),
                )
                .item(
                    MenuItem::new("Opaque").on_click(with_handle(|app| app.set_transparency(255))),
                ),
            MenuItem::new("Quit").on_click(with_handle(|app| app.quit_tray())),
        ],
        on_ready: Some(Arc::new(|| tracing::info!("Tray ready"))),
        on_exit: Some(Arc::new(|| tracing::info!("Tray exiting"))),
        ..Default::default()
    });

    let app = Application::new(config).context("Failed to create application")?;
    let _ = handle_slot.set(app.handle());

    app.invoke_handler(vec![Binding::new("greet", |params| {
        let name = params
            .first()
            .and_then(|value| value.as_str())
            .unwrap_or("there");
        Ok(json!(format!("Hello, {}!", name)))
    })]);

    let screen = app.screen_size();
    tracing::info!("Primary screen {}x{}", screen.width, screen.height);

    app.run_with_url(PAGE);

    tracing::info!("Glide.Demo exiting");
    Ok(())
}

#[cfg(windows)]
const PAGE: &str = "data:text/html,<!doctype html><html><body style=\"font-family:sans-serif\">\
<h1>Glide</h1><p id=\"out\">...</p>\
<script>(function go(){\
if(!window.greet){setTimeout(go,50);return;}\
window.greet('Glide').then(function(r){document.getElementById('out').textContent=r;});\
})();</script></body></html>";

#[cfg(not(windows))]
fn main() -> Result<()> {
    anyhow::bail!("glide_demo needs Windows (WebView2 and the Win32 tray)")
}
