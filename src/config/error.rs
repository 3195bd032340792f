//! Configuration error types.

use std::{io, path::PathBuf};
use thiserror::Error;

/// Problems with `kiln.toml` or the effective settings
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file `{0}`")]
    Io(PathBuf, #[source] io::Error),

    /// Only raised for a file named explicitly with `--config`
    #[error("config file `{0}` not found")]
    NotFound(PathBuf),

    #[error("invalid config file")]
    Toml(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_file() {
        let err = ConfigError::Io(
            PathBuf::from("kiln.toml"),
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.to_string(), "cannot read config file `kiln.toml`");

        let err = ConfigError::NotFound(PathBuf::from("site.toml"));
        assert_eq!(err.to_string(), "config file `site.toml` not found");
    }

    #[test]
    fn test_io_error_is_source() {
        use std::error::Error as _;

        let err = ConfigError::Io(
            PathBuf::from("kiln.toml"),
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.source().map(ToString::to_string).as_deref(), Some("denied"));
    }

    #[test]
    fn test_toml_error_converts() {
        let toml_err = toml::from_str::<toml::Table>("[build").unwrap_err();
        let err = ConfigError::from(toml_err);

        assert!(matches!(err, ConfigError::Toml(_)));
        assert_eq!(err.to_string(), "invalid config file");
    }
}
