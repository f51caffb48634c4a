use super::models::Config;
use crate::translate::VhostPattern;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("API endpoint '{0}' must be an http:// or https:// URL")]
    InvalidEndpoint(String),

    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },

    #[error("{field} must be greater than zero")]
    ZeroTimeout { field: &'static str },

    #[error("platform domain '{domain}' does not yield a usable hostname pattern: {reason}")]
    InvalidPlatformDomain { domain: String, reason: String },
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_api(config)?;
    validate_defaults(config)?;
    Ok(())
}

fn validate_api(config: &Config) -> Result<(), ValidationError> {
    let endpoint = &config.api.endpoint;
    if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
        return Err(ValidationError::InvalidEndpoint(endpoint.clone()));
    }

    if config.api.connect_timeout_secs == 0 {
        return Err(ValidationError::ZeroTimeout {
            field: "api.connect_timeout_secs",
        });
    }
    if config.api.request_timeout_secs == 0 {
        return Err(ValidationError::ZeroTimeout {
            field: "api.request_timeout_secs",
        });
    }

    Ok(())
}

fn validate_defaults(config: &Config) -> Result<(), ValidationError> {
    let defaults = &config.defaults;
    for (field, value) in [
        ("defaults.zone", &defaults.zone),
        ("defaults.deploy_type", &defaults.deploy_type),
        ("defaults.platform_domain", &defaults.platform_domain),
    ] {
        if value.trim().is_empty() {
            return Err(ValidationError::EmptyField { field });
        }
    }

    VhostPattern::for_domain(&defaults.platform_domain).map_err(|e| {
        ValidationError::InvalidPlatformDomain {
            domain: defaults.platform_domain.clone(),
            reason: e.to_string(),
        }
    })?;

    Ok(())
}
