//! Logging bootstrap.

/// Initialize env_logger with the server's formatting defaults.
/// Log levels are controlled through `RUST_LOG`.
pub fn init() {
    env_logger::builder().format_target(false).init();
}
