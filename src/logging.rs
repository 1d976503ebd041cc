use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. `RUST_LOG` takes precedence over
/// `level`. Records emitted through `log` (actix's access logger) are
/// forwarded as well.
pub fn init_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("classifier_backend={level},actix_web={level}")));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true);

    let _ = if json {
        builder.json().flatten_event(true).try_init()
    } else {
        builder.try_init()
    };
}
