use tracing_subscriber::{filter::LevelFilter, EnvFilter};

/// Installs the fmt subscriber on stderr. `RUST_LOG` wins over `verbose`.
pub fn init(verbose: bool) {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    // A subscriber installed earlier (e.g. by a test harness) stays in charge.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
