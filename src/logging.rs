// logging.rs
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Diagnostics go to stderr, quiet unless `RUST_LOG` asks for more, so they
/// stay out of the menus.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let _ = tracing_subscriber::registry().with(filter).with(layer).try_init();
}
