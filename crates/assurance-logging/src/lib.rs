pub mod config;
pub mod dump;

pub use config::{init, LogFormat, LoggingConfig, LoggingError};
pub use dump::ApiDump;
