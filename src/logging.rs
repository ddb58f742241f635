//! Logging setup for the hearsay binary.

use tracing_subscriber::EnvFilter;

/// Initialize stderr logging.
///
/// Defaults to `warn` unless overridden by `HEARSAY_LOG` (standard
/// `EnvFilter` directives, e.g. `HEARSAY_LOG=hearsay=debug`). Stdout stays
/// reserved for caption output.
pub fn init() {
    let filter = EnvFilter::builder()
        .with_env_var("HEARSAY_LOG")
        .with_default_directive(tracing::level_filters::LevelFilter::WARN.into())
        .from_env_lossy();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init();
        init();
    }
}
