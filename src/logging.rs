//! Logging setup for binaries embedding the shell

use tracing::Level;

/// Install a `tracing_subscriber` fmt subscriber.
///
/// `debug` raises the max level from INFO to DEBUG. Safe to call more than
/// once; later calls are ignored.
pub fn init(debug: bool) {
    let level = if debug { Level::DEBUG } else { Level::INFO };

    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_thread_names(true)
        .try_init();
}
