//! Configuration loading and types

pub mod loader;
pub mod types;

pub use loader::{load_config, load_config_with_overrides};
pub use types::{AppConfig, AppSettings, ClientConfig};
