//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::ResterConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ResterConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<ResterConfig, ConfigError> {
    let config: ResterConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::Protocol;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.addresses.len(), 1);
        assert_eq!(config.addresses[0].url(), "http://localhost:8080");
        assert_eq!(config.cors.max_age, 86400);
    }

    #[test]
    fn test_full_file() {
        let config = parse_config(
            r#"
            [[addresses]]
            host = "0.0.0.0"
            port = 80

            [[addresses]]
            host = "0.0.0.0"
            port = 443
            protocol = "https"

            [tls]
            cert_path = "cert.pem"
            key_path = "key.pem"

            [cors]
            allow_origin = "https://app.example"
            max_age = 600

            [limits]
            max_body_bytes = 4096
            "#,
        )
        .unwrap();

        assert_eq!(config.addresses.len(), 2);
        assert_eq!(config.addresses[1].protocol, Protocol::Https);
        assert_eq!(config.cors.allow_origin, "https://app.example");
        assert_eq!(config.cors.allow_methods, "*");
        assert_eq!(config.cors.max_age, 600);
        assert_eq!(config.limits.max_body_bytes, 4096);
    }

    #[test]
    fn test_no_addresses_allowed() {
        let config = parse_config("addresses = []").unwrap();
        assert!(config.addresses.is_empty());
    }

    #[test]
    fn test_invalid_rejected() {
        let err = parse_config(
            r#"
            [[addresses]]
            host = "0.0.0.0"
            port = 443
            protocol = "https"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));

        assert!(matches!(parse_config("addresses = 3"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
