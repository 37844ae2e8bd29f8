/// Configuration types for the shell.
///
/// This module provides:
/// - `ApplicationConfig`: startup parameters for the window and webview
/// - `TrayConfig`: tray icon, tooltip, menu and lifecycle callbacks
/// - `MenuItem`: a (recursive) tray menu entry with an optional click handler
/// - Loading the window part of the config from a JSON file
///
/// The tray section carries callbacks, so it is only ever built in code; a
/// JSON file can describe everything else.
///
/// # Example
///
/// ```rust
/// use glide_shell::config::{ApplicationConfig, MenuItem, TrayConfig};
///
/// let config = ApplicationConfig {
///     title: "Notes".to_string(),
///     tray: Some(TrayConfig {
///         tooltip: "Notes".to_string(),
///         menu_items: vec![MenuItem::new("Open").on_click(|| println!("open"))],
///         ..Default::default()
///     }),
///     ..Default::default()
/// };
/// assert_eq!(config.width, 800);
/// ```
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Zero-argument callback used for click handlers and tray lifecycle hooks
pub type Callback = Arc<dyn Fn() + Send + Sync>;

/// Startup parameters, copied into the application at construction
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Enable webview devtools and debug-level logging
    pub debug: bool,
    /// Give the webview keyboard focus on creation
    pub auto_focus: bool,
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Center the window on its monitor
    pub center: bool,
    /// Resource ordinal of the window icon (0 = none)
    pub icon_id: u16,
    /// Optional system tray
    #[serde(skip)]
    pub tray: Option<TrayConfig>,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        ApplicationConfig {
            debug: false,
            auto_focus: true,
            title: "Glide".to_string(),
            width: 800,
            height: 600,
            center: true,
            icon_id: 0,
            tray: None,
        }
    }
}

impl ApplicationConfig {
    /// Parse the window part of a config from JSON; missing fields take defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse application config")
    }

    /// Load a config file. Returns the default config if the file doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(ApplicationConfig::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        Self::from_json_str(&contents)
    }
}

/// System tray configuration
#[derive(Clone, Default)]
pub struct TrayConfig {
    /// Resource ordinal of the tray icon (0 = generated fallback icon)
    pub icon_id: u16,
    pub title: String,
    pub tooltip: String,
    pub menu_items: Vec<MenuItem>,
    /// Called once the tray and its menu are fully built
    pub on_ready: Option<Callback>,
    /// Called when the tray exits, before the application is terminated
    pub on_exit: Option<Callback>,
}

impl fmt::Debug for TrayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrayConfig")
            .field("icon_id", &self.icon_id)
            .field("title", &self.title)
            .field("tooltip", &self.tooltip)
            .field("menu_items", &self.menu_items)
            .field("on_ready", &self.on_ready.is_some())
            .field("on_exit", &self.on_exit.is_some())
            .finish()
    }
}

/// Tray menu entry. Items with nested `items` become submenus.
#[derive(Clone, Default)]
pub struct MenuItem {
    pub title: String,
    pub tooltip: String,
    pub disabled: bool,
    pub checked: bool,
    pub handler: Option<Callback>,
    pub items: Vec<MenuItem>,
}

impl MenuItem {
    pub fn new(title: impl Into<String>) -> Self {
        MenuItem {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = tooltip.into();
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self
    }

    pub fn on_click<F>(mut self, handler: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Append a nested item
    pub fn item(mut self, item: MenuItem) -> Self {
        self.items.push(item);
        self
    }
}

impl fmt::Debug for MenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MenuItem")
            .field("title", &self.title)
            .field("tooltip", &self.tooltip)
            .field("disabled", &self.disabled)
            .field("checked", &self.checked)
            .field("handler", &self.handler.is_some())
            .field("items", &self.items)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ApplicationConfig::default();
        assert_eq!(config.title, "Glide");
        assert_eq!((config.width, config.height), (800, 600));
        assert!(config.center);
        assert!(config.auto_focus);
        assert!(!config.debug);
        assert!(config.tray.is_none());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config =
            ApplicationConfig::from_json_str(r#"{ "title": "Notes", "width": 1024 }"#).unwrap();
        assert_eq!(config.title, "Notes");
        assert_eq!(config.width, 1024);
        assert_eq!(config.height, 600);
        assert_eq!(config.icon_id, 0);
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(ApplicationConfig::from_json_str("{ width: }").is_err());
    }

    #[test]
    fn test_load_missing_file_returns_default() {
        let path = std::env::temp_dir().join("glide_shell_missing_config_7f3a.json");
        let config = ApplicationConfig::load(&path).unwrap();
        assert_eq!(config.title, "Glide");
    }

    #[test]
    fn test_menu_item_builder() {
        let item = MenuItem::new("Settings")
            .tooltip("Open settings")
            .checked(true)
            .on_click(|| {})
            .item(MenuItem::new("Theme").disabled(true));

        assert_eq!(item.title, "Settings");
        assert!(item.checked);
        assert!(item.handler.is_some());
        assert_eq!(item.items.len(), 1);
        assert!(item.items[0].disabled);
        assert!(item.items[0].handler.is_none());
    }
}
