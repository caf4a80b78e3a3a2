//! Logging utilities and structured logging support

use std::fs::OpenOptions;
use std::path::Path;

use crate::config::ConfigError;

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system
pub fn init() {
    env_logger::init();
}

/// Initialize logging with a default level; `RUST_LOG` still overrides it
pub fn init_with_level(level: log::LevelFilter) {
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

/// Initialize logging into a file
///
/// The file is opened before any logger is installed, so an unwritable path
/// is reported without changing the logging state.
pub fn init_to_file<P: AsRef<Path>>(path: P) -> Result<(), ConfigError> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path.as_ref())?;

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()
        .map_err(|e| ConfigError::Logger(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unwritable_log_path_is_rejected() {
        let result = init_to_file("/nonexistent-directory/for/sure/render.log");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
