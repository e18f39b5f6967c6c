// Library surface for the binary and for headless/integration tests.
pub mod app;
pub mod app_dirs;
pub mod celebration;
pub mod config;
pub mod history_chart;
pub mod language;
pub mod logging;
pub mod results;
pub mod runtime;
pub mod session;
pub mod shortcuts;
pub mod stats;
pub mod storage;
pub mod ui;

/// Countdown refresh and animation frame interval
pub const TICK_RATE_MS: u64 = 200;
