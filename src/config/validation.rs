//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (limits > 0, ports valid)
//! - Check that header values and addresses are usable
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ResterConfig → Result<(), Vec<ValidationError>>

use std::collections::HashSet;
use std::net::SocketAddr;

use axum::http::HeaderValue;
use thiserror::Error;

use crate::config::schema::{Protocol, ResterConfig};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("address #{index} has an empty host")]
    EmptyHost { index: usize },

    #[error("address #{index} uses port 0")]
    ZeroPort { index: usize },

    #[error("address {address} is listed twice")]
    DuplicateAddress { address: String },

    #[error("address {address} is https but no [tls] section is configured")]
    MissingTls { address: String },

    #[error("cors.{field} is not a valid header value")]
    InvalidCorsHeader { field: &'static str },

    #[error("limits.max_body_bytes must be greater than 0")]
    ZeroBodyLimit,

    #[error("timeouts.request_secs must be greater than 0")]
    ZeroRequestTimeout,

    #[error("observability.metrics_address `{0}` is not a socket address")]
    InvalidMetricsAddress(String),
}

pub fn validate_config(config: &ResterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for (index, address) in config.addresses.iter().enumerate() {
        if address.host.trim().is_empty() {
            errors.push(ValidationError::EmptyHost { index });
        }
        if address.port == 0 {
            errors.push(ValidationError::ZeroPort { index });
        }
        if !seen.insert(address.bind_address()) {
            errors.push(ValidationError::DuplicateAddress {
                address: address.bind_address(),
            });
        }
        if address.protocol == Protocol::Https && config.tls.is_none() {
            errors.push(ValidationError::MissingTls {
                address: address.url(),
            });
        }
    }

    for (field, value) in [
        ("allow_origin", &config.cors.allow_origin),
        ("allow_methods", &config.cors.allow_methods),
        ("allow_headers", &config.cors.allow_headers),
    ] {
        if HeaderValue::from_str(value).is_err() {
            errors.push(ValidationError::InvalidCorsHeader { field });
        }
    }

    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }
    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::AddressConfig;

    #[test]
    fn test_default_is_valid() {
        assert!(validate_config(&ResterConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = ResterConfig::default();
        config.addresses.push(AddressConfig::default());
        config.addresses.push(AddressConfig {
            host: " ".into(),
            port: 0,
            protocol: Protocol::Http,
        });
        config.cors.allow_origin = "bad\nvalue".into();
        config.limits.max_body_bytes = 0;
        config.observability.metrics_enabled = true;
        config.observability.metrics_address = "nowhere".into();

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::DuplicateAddress {
            address: "localhost:8080".into()
        }));
        assert!(errors.contains(&ValidationError::EmptyHost { index: 2 }));
        assert!(errors.contains(&ValidationError::ZeroPort { index: 2 }));
        assert!(errors.contains(&ValidationError::InvalidCorsHeader {
            field: "allow_origin"
        }));
        assert!(errors.contains(&ValidationError::ZeroBodyLimit));
        assert!(errors.contains(&ValidationError::InvalidMetricsAddress("nowhere".into())));
        assert_eq!(errors.len(), 6);
    }
}
