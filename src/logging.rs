//! Logging init: structured `tracing` output on stderr.

use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. `RUST_LOG` wins over the `verbose` default.
pub fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "debug"
    } else {
        "info,reqwest=warn"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let installed = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(verbose)
        .try_init();

    if installed.is_ok() {
        tracing::debug!("verbose logging enabled");
    }
}
