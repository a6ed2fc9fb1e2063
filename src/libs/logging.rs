//! Diagnostic output through `tracing`.
//!
//! `RUST_LOG` wins when set. Otherwise the filter is `todosync=debug` with
//! `TODOSYNC_DEBUG` set and `todosync=info` without it.

use crate::libs::messages::macros::is_debug_mode;
use tracing_subscriber::{fmt, EnvFilter};

pub fn default_filter() -> &'static str {
    if std::env::var("TODOSYNC_DEBUG").is_ok() {
        "todosync=debug,tower_http=debug"
    } else {
        "todosync=info"
    }
}

/// Installs the global subscriber. Calling it again is harmless.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter()));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(is_debug_mode())
        .with_writer(std::io::stderr)
        .try_init();
}
