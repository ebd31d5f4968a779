//! Rate Limiting Middleware using GCRA Algorithm
//!
//! Per-IP limits on the mutating alert routes, backed by tower_governor.
//! Uses the Generic Cell Rate Algorithm (GCRA) so no background task is
//! needed to replenish quota.

use governor::middleware::StateInformationMiddleware;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::PeerIpKeyExtractor;
use tower_governor::GovernorLayer;

/// Governor config with X-RateLimit-* response headers enabled
pub type DefaultGovernorConfig =
    tower_governor::governor::GovernorConfig<PeerIpKeyExtractor, StateInformationMiddleware>;

/// Layer type applied to mutating routes
pub type MutationGovernor = GovernorLayer<PeerIpKeyExtractor, StateInformationMiddleware>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid rate limit: per_second={per_second}, burst_size={burst_size}")]
pub struct RateLimitError {
    pub per_second: u64,
    pub burst_size: u32,
}

/// Rate limiting configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Apply the limiter at all
    pub enabled: bool,
    /// Seconds between quota replenishments
    pub per_second: u64,
    /// Requests that can be made back to back
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            per_second: 1,
            burst_size: 20,
        }
    }
}

impl RateLimitConfig {
    /// Tight limits for exposed deployments
    pub fn strict() -> Self {
        Self {
            enabled: true,
            per_second: 4,
            burst_size: 2,
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

/// Build the governor config
///
/// Requires the service to be served with
/// `into_make_service_with_connect_info::<SocketAddr>()` for IP extraction.
pub fn create_governor_config(
    config: &RateLimitConfig,
) -> Result<Arc<DefaultGovernorConfig>, RateLimitError> {
    GovernorConfigBuilder::default()
        .per_second(config.per_second)
        .burst_size(config.burst_size)
        .use_headers()
        .finish()
        .map(Arc::new)
        .ok_or(RateLimitError {
            per_second: config.per_second,
            burst_size: config.burst_size,
        })
}

/// Layer for mutating routes, or `None` when limiting is disabled
pub fn mutation_governor(
    config: &RateLimitConfig,
) -> Result<Option<MutationGovernor>, RateLimitError> {
    if !config.enabled {
        return Ok(None);
    }
    let config = create_governor_config(config)?;
    Ok(Some(GovernorLayer { config }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RateLimitConfig::default();
        assert!(config.enabled);
        assert_eq!(config.per_second, 1);
        assert_eq!(config.burst_size, 20);
    }

    #[test]
    fn test_strict_config() {
        let config = RateLimitConfig::strict();
        assert_eq!(config.per_second, 4);
        assert_eq!(config.burst_size, 2);
    }

    #[test]
    fn test_create_governor_config() {
        assert!(create_governor_config(&RateLimitConfig::default()).is_ok());
    }

    #[test]
    fn test_zero_burst_rejected() {
        let config = RateLimitConfig {
            burst_size: 0,
            ..RateLimitConfig::default()
        };
        assert!(create_governor_config(&config).is_err());
    }

    #[test]
    fn test_disabled_has_no_layer() {
        assert!(mutation_governor(&RateLimitConfig::disabled())
            .unwrap()
            .is_none());
    }
}
