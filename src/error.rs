//! Error type shared by the shell's components

use thiserror::Error;

/// Errors surfaced by the shell
#[derive(Debug, Error)]
pub enum ShellError {
    /// The rendering surface could not be created; nothing can run without it
    #[error("failed to create rendering surface: {0}")]
    SurfaceCreation(String),

    /// No native window exists (before setup or after teardown)
    #[error("native window not available")]
    NoWindow,

    /// A native window-manager call reported failure
    #[error("{call} failed: {message}")]
    Native { call: &'static str, message: String },

    /// The tray backend rejected a request
    #[error("tray error: {0}")]
    Tray(String),

    /// A worker thread could not be started
    #[error("failed to spawn thread: {0}")]
    Spawn(#[from] std::io::Error),
}

impl ShellError {
    #[cfg_attr(not(windows), allow(dead_code))]
    pub(crate) fn native(call: &'static str, message: impl ToString) -> Self {
        ShellError::Native {
            call,
            message: message.to_string(),
        }
    }
}
