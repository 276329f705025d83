//! Application configuration module.
//!
//! Manages the TOML config file holding the service endpoints, dashboard
//! and export settings.

#[allow(clippy::module_inception)]
mod config;
mod paths;

#[allow(clippy::module_name_repetitions)]
pub use config::{AppConfig, ServiceConfig};
pub use paths::{resolve_config_path, resolve_data_dir};
