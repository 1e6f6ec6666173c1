use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;

/// Install the stderr subscriber. stdout belongs to sudo and never carries logs.
///
/// The debug flag forces this crate's events to `debug`; otherwise `RUST_LOG`
/// applies, falling back to warnings only.
pub fn init(debug: bool) {
    let filter = if debug {
        EnvFilter::new("sudo_askpass=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .without_time()
        .init();
}
