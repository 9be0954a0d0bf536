// Library surface for headless/integration tests and reuse.
// The binary in main.rs only parses flags and owns the real terminal.
pub mod app;
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod controller;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod session;
pub mod ticker;
pub mod ui;

pub use error::{Result, TaprError};
