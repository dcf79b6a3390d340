//! ipguard domain layer
pub mod config;
pub mod errors;
pub mod mac_addr;

pub use config::{CliOverrides, Config, ConfigError, DetectorConfig, LogFormat, LoggingConfig};
pub use errors::DomainError;
pub use mac_addr::MacAddr;
