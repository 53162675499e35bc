//! Diagnostic logging setup, kept separate from the audit trail in
//! [`crate::audit`]: this is for developers watching the process, not for
//! the fixed per-request record the interface contract specifies.

use std::io::Write;

use log::LevelFilter;

/// Initializes `env_logger` with a level taken from `RUST_LOG`, defaulting
/// to `info`, and a bracketed format matching the rest of this codebase's
/// terse style.
pub fn init() {
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_env("RUST_LOG")
        .format(|buf, record| {
            writeln!(buf, "[{:>5}] {}: {}", record.level(), record.target(), record.args())
        })
        .init();
}
