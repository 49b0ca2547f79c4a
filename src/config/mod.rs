//! YAML configuration with environment overrides.

pub mod schema;

pub use schema::{default_config_path, DatabaseConfig, LoggingConfig, RowGraphConfig};
