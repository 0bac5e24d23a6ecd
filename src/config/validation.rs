//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, the backend URL and header values
//! - Check the timeout tier table and the outer request deadline
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::HeaderValue;
use thiserror::Error;
use url::Url;

use crate::config::schema::ProxyConfig;
use crate::resilience::timeouts::TimeoutTier;
use crate::security::headers::allow_headers_value;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),

    #[error("endpoint.path '{0}' must start with '/' and contain no route parameters")]
    EndpointPath(String),

    #[error("backend.url '{url}' is invalid: {reason}")]
    BackendUrl { url: String, reason: String },

    #[error("backend.connect_timeout_secs must be greater than 0")]
    ConnectTimeout,

    #[error("timeouts.tiers must not be empty")]
    NoTiers,

    #[error("timeouts.tiers[{0}] has a zero timeout")]
    ZeroTierTimeout(usize),

    #[error("timeouts.tiers[{0}] must have a larger max_span_hours than the tier before it")]
    UnorderedTier(usize),

    #[error("timeouts.tiers[{0}] has no max_span_hours; only the last tier may be the catch-all")]
    EarlyCatchAll(usize),

    #[error("the last entry of timeouts.tiers must be a catch-all without max_span_hours")]
    MissingCatchAll,

    #[error("timeouts.request_secs ({request_secs}) must exceed the largest tier timeout ({max_tier_secs})")]
    RequestDeadlineTooShort { request_secs: u64, max_tier_secs: u64 },

    #[error("cors.extra_allow_headers produce an invalid header value")]
    AllowHeaders,

    #[error("observability.metrics_address '{0}' is not a socket address")]
    MetricsAddress(String),

    #[error("security.max_body_size must be greater than 0")]
    MaxBodySize,

    #[error("security.body_read_timeout_secs ({0}) must be greater than 0 and less than timeouts.request_secs")]
    BodyReadTimeout(u64),
}

/// Validate a configuration, collecting every problem.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    let path = &config.endpoint.path;
    if !path.starts_with('/') || path.contains(['{', '}', '*', ':']) {
        errors.push(ValidationError::EndpointPath(config.endpoint.path.clone()));
    }

    if let Err(reason) = check_backend_url(&config.backend.url) {
        errors.push(ValidationError::BackendUrl {
            url: config.backend.url.clone(),
            reason,
        });
    }

    if config.backend.connect_timeout_secs == 0 {
        errors.push(ValidationError::ConnectTimeout);
    }

    check_tiers(&config.timeouts.tiers, &mut errors);

    let max_tier_secs = config
        .timeouts
        .tiers
        .iter()
        .map(|t| t.timeout_secs)
        .max()
        .unwrap_or(0);
    if config.timeouts.request_secs <= max_tier_secs {
        errors.push(ValidationError::RequestDeadlineTooShort {
            request_secs: config.timeouts.request_secs,
            max_tier_secs,
        });
    }

    if HeaderValue::from_str(&allow_headers_value(&config.cors)).is_err() {
        errors.push(ValidationError::AllowHeaders);
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::MaxBodySize);
    }

    let read_secs = config.security.body_read_timeout_secs;
    if read_secs == 0 || read_secs >= config.timeouts.request_secs {
        errors.push(ValidationError::BodyReadTimeout(read_secs));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_backend_url(raw: &str) -> Result<(), String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    if url.scheme() != "http" {
        return Err(format!("unsupported scheme '{}', only http is supported", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    Ok(())
}

fn check_tiers(tiers: &[TimeoutTier], errors: &mut Vec<ValidationError>) {
    let Some(last) = tiers.last() else {
        errors.push(ValidationError::NoTiers);
        return;
    };

    let mut previous: Option<u64> = None;
    for (i, tier) in tiers.iter().enumerate() {
        if tier.timeout_secs == 0 {
            errors.push(ValidationError::ZeroTierTimeout(i));
        }
        let is_last = i == tiers.len() - 1;
        match tier.max_span_hours {
            Some(hours) => {
                if previous.is_some_and(|p| hours <= p) {
                    errors.push(ValidationError::UnorderedTier(i));
                }
                previous = Some(hours);
            }
            None if !is_last => errors.push(ValidationError::EarlyCatchAll(i)),
            None => {}
        }
    }

    if last.max_span_hours.is_some() {
        errors.push(ValidationError::MissingCatchAll);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&ProxyConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = ProxyConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.endpoint.path = "api".into();
        config.backend.url = "https://internal/api".into();
        config.security.max_body_size = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::MaxBodySize));
        assert!(matches!(errors[2], ValidationError::BackendUrl { .. }));
    }

    #[test]
    fn test_tier_table_rules() {
        let mut config = ProxyConfig::default();
        config.timeouts.tiers = vec![
            TimeoutTier::up_to(72, 45),
            TimeoutTier::catch_all(60),
            TimeoutTier::up_to(24, 0),
        ];

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::EarlyCatchAll(1)));
        assert!(errors.contains(&ValidationError::UnorderedTier(2)));
        assert!(errors.contains(&ValidationError::ZeroTierTimeout(2)));
        assert!(errors.contains(&ValidationError::MissingCatchAll));
    }

    #[test]
    fn test_empty_tier_table() {
        let mut config = ProxyConfig::default();
        config.timeouts.tiers.clear();
        assert!(validate_config(&config)
            .unwrap_err()
            .contains(&ValidationError::NoTiers));
    }

    #[test]
    fn test_request_deadline_must_exceed_tiers() {
        let mut config = ProxyConfig::default();
        config.timeouts.request_secs = 180;
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::RequestDeadlineTooShort {
                request_secs: 180,
                max_tier_secs: 180
            }])
        );
    }

    #[test]
    fn test_body_read_timeout_bounds() {
        let mut config = ProxyConfig::default();
        config.security.body_read_timeout_secs = 0;
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::BodyReadTimeout(0)])
        );

        config.security.body_read_timeout_secs = config.timeouts.request_secs;
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::BodyReadTimeout(190)])
        );
    }

    #[test]
    fn test_metrics_address_only_checked_when_enabled() {
        let mut config = ProxyConfig::default();
        config.observability.metrics_address = "nope".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
