use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "probador=info";

/// Installs the fmt subscriber. `RUST_LOG` overrides the default filter.
///
/// Calling this more than once is harmless; later calls leave the first
/// subscriber in place.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let result = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
    if let Err(err) = result {
        tracing::debug!(%err, "tracing subscriber already installed");
    }
}
