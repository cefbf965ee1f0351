use anyhow::Result;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;

/// Installs the fmt subscriber. The server always logs startup and failures,
/// `verbose` adds per-request diagnostics.
pub fn init(verbose: bool) -> Result<()> {
    let _ = fmt()
        .with_max_level(max_level(verbose))
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .try_init();
    Ok(())
}

fn max_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    }
}
