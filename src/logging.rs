//! File logging. The terminal belongs to the TUI, so tracing output goes to
//! a log file through a non-blocking appender. `RUST_LOG` overrides the
//! default filter.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const DEFAULT_FILTER: &str = "keyskill=info";

/// Install the global subscriber writing to `path`.
///
/// The returned guard flushes pending lines on drop and must be held for the
/// lifetime of the program. Returns `None` if the log directory cannot be
/// created or a subscriber is already installed.
pub fn init_file_logging(path: &Path) -> Option<WorkerGuard> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let file_name = path.file_name()?;

    std::fs::create_dir_all(dir).ok()?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true),
        )
        .with(filter)
        .try_init()
        .ok()?;

    Some(guard)
}

/// Initialize tracing for tests (only logs warnings and above).
#[cfg(test)]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_parses() {
        init_test_tracing();
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
    }
}
