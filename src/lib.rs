// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod angle;
pub mod app_dirs;
pub mod breathing;
pub mod config;
pub mod fusion;
pub mod hold;
pub mod profile;
pub mod progress;
pub mod scorer;
pub mod session;
pub mod stats;
pub mod util;
