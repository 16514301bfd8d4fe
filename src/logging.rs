use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Map a level name to an `EnvFilter` directive.
///
/// Accepts the usual names in any case plus `warning`; anything else is passed
/// through so full directives like `inventory_dashboard=debug` work.
pub fn level_directive(log_level: &str) -> String {
    match log_level.to_ascii_lowercase().as_str() {
        "warning" => "warn".to_string(),
        "critical" => "error".to_string(),
        other => other.to_string(),
    }
}

/// Install the global subscriber. Output goes to stderr so report tables on
/// stdout stay clean. Unknown filters fall back to `info`.
pub fn setup_logging(log_level: &str) {
    let filter =
        EnvFilter::try_new(level_directive(log_level)).unwrap_or_else(|_| EnvFilter::new("info"));

    let layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    // A second call (e.g. from tests) must not panic.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init();
}
