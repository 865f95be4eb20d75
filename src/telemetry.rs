// Logging setup for host applications
// This enables the error!, warn!, info!, debug!, and trace! macros emitted by the crate

use tracing_subscriber::EnvFilter;

/// Install a formatted tracing subscriber
///
/// Honors `RUST_LOG` and falls back to `info`. Safe to call more than once;
/// later calls leave the first subscriber in place.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true)
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!("Tracing subscriber installed");
    }
}
