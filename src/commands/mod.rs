pub mod fetch;
pub mod show;
pub mod validate;

use std::env;
use std::path::Path;

/// The executable name expected in upgrade artifacts when none is given.
///
/// `DAEMON_NAME` if set, otherwise the file name this program was invoked as.
pub fn default_daemon_name() -> String {
    if let Ok(name) = env::var("DAEMON_NAME") {
        if !name.is_empty() {
            return name;
        }
    }

    env::args_os()
        .next()
        .as_deref()
        .and_then(|arg0| Path::new(arg0).file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub fn resolve_daemon_name(explicit: Option<String>) -> String {
    explicit.unwrap_or_else(default_daemon_name)
}
