pub mod detector;
pub mod errors;
pub mod logging;
pub mod root;

pub use detector::DetectorConfig;
pub use errors::ConfigError;
pub use logging::{LogFormat, LoggingConfig};
pub use root::{CliOverrides, Config};
