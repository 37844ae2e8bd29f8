//! Glide desktop shell
//!
//! Hosts web content in a single native window, with an optional system tray
//! menu and Win32 window-style controls (borders, transparency, placement).

pub mod app;
pub mod config;
pub mod error;
pub mod logging;
pub mod signal;
pub mod surface;
pub mod tray;
pub mod window;

#[cfg(test)]
pub(crate) mod fakes;

pub use app::{AppHandle, Application, Backends};
pub use config::{ApplicationConfig, MenuItem, TrayConfig};
pub use error::ShellError;
pub use surface::bindings::Binding;
pub use window::{ScreenSize, VirtualScreenInfo};
