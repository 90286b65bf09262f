//! Configuration errors.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid config format: {0}")]
    InvalidFormat(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Environment variable not set: {0}")]
    EnvVarNotSet(String),

    #[error("Failed to read token file {path}: {reason}")]
    TokenFile { path: PathBuf, reason: String },

    #[error("Configuration is invalid: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error() {
        let err = ConfigError::NotFound(PathBuf::from("/etc/watchkeeper.toml"));
        assert!(err.to_string().contains("watchkeeper.toml"));
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_env_var_not_set_error() {
        let err = ConfigError::EnvVarNotSet("API_TOKEN".to_string());
        assert!(err.to_string().contains("API_TOKEN"));
        assert!(err.to_string().contains("not set"));
    }

    #[test]
    fn test_token_file_error() {
        let err = ConfigError::TokenFile {
            path: PathBuf::from("/etc/watchkeeper/token"),
            reason: "permission denied".to_string(),
        };
        let display = err.to_string();
        assert!(display.contains("/etc/watchkeeper/token"));
        assert!(display.contains("permission denied"));
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = ConfigError::from(io_err);
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_all_error_variants_display() {
        let errors: Vec<ConfigError> = vec![
            ConfigError::NotFound(PathBuf::from("path")),
            ConfigError::InvalidFormat("format".to_string()),
            ConfigError::MissingField("field".to_string()),
            ConfigError::EnvVarNotSet("VAR".to_string()),
            ConfigError::Validation("gateway.url: empty".to_string()),
        ];

        for err in errors {
            let display = err.to_string();
            assert!(!display.is_empty());
        }
    }
}
