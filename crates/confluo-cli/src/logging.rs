// Logging setup; stdout is reserved for protocol output

use tracing::Level;

/// Parse a log level name, falling back to info
pub fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Install the stderr subscriber
pub fn init_logging(level: &str) {
    let debug = parse_level(level) >= Level::DEBUG;

    tracing_subscriber::fmt()
        .with_max_level(parse_level(level))
        .with_target(debug)
        .with_line_number(debug)
        .with_writer(std::io::stderr)
        .init();
}
