//! Logging integration for the criteria-rs helpers.
//!
//! Provides a helper for configuring [`tracing`]-based logging. The query
//! transformation code emits `debug!`/`trace!` events while walking query
//! graphs; host applications that already install their own subscriber can
//! ignore this module entirely.

/// Sets up a global tracing subscriber with the given filter directive.
///
/// `filter` uses the usual `tracing_subscriber::EnvFilter` syntax (e.g.
/// `"info"`, `"criteria_rs_query=trace"`). With `pretty` set, a
/// human-readable format with file/line information is used; otherwise a
/// structured JSON format suitable for log aggregation.
///
/// Installation is best-effort: if a subscriber is already set, this is a
/// no-op.
pub fn setup_logging(filter: &str, pretty: bool) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));

    if pretty {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .pretty()
            .try_init()
            .ok();
    } else {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .try_init()
            .ok();
    }
}
