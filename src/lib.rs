// Library surface for the binary, headless runs and integration tests.
// Terminal rendering stays in the binary.
pub mod animation;
pub mod app_dirs;
pub mod config;
pub mod error;
pub mod logging;
pub mod machine;
pub mod orchestrator;
pub mod pool;
pub mod runtime;
pub mod settings;
pub mod sound;
pub mod theme;

pub use error::{Error, Result};
