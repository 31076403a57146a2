// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod classifier;
pub mod config;
pub mod game;
pub mod letters;
pub mod review;
pub mod runtime;
pub mod session;
pub mod store;

/// Countdown resolution of the event loop, in milliseconds. Remaining time
/// is always recomputed from the round deadline, so a missed tick only
/// delays termination detection, never the score.
pub const TICK_RATE_MS: u64 = 100;
