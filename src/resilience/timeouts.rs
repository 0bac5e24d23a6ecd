//! Timeout selection for forwarded queries.
//!
//! # Responsibilities
//! - Map the span of a validated query onto a forwarding timeout
//! - Hold the tier table loaded at startup
//!
//! # Design Decisions
//! - Wider ranges take the backend longer, so they get a larger deadline
//! - The table is immutable once the server is built
//! - Spans are compared in seconds so a 24h + 1s span lands in the 72h tier

use std::time::Duration;

use serde::{Deserialize, Serialize};

const SECS_PER_HOUR: u64 = 3600;

/// One entry of the span → timeout table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct TimeoutTier {
    /// Largest span (inclusive) this tier covers. `None` is the catch-all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_span_hours: Option<u64>,

    /// Timeout applied to the backend call, in seconds.
    pub timeout_secs: u64,
}

impl TimeoutTier {
    /// A bounded tier.
    pub const fn up_to(max_span_hours: u64, timeout_secs: u64) -> Self {
        Self {
            max_span_hours: Some(max_span_hours),
            timeout_secs,
        }
    }

    /// The catch-all tier.
    pub const fn catch_all(timeout_secs: u64) -> Self {
        Self {
            max_span_hours: None,
            timeout_secs,
        }
    }

    /// The default table: 1 day, 3 days, 1 week, 2 weeks, anything longer.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::up_to(24, 15),
            Self::up_to(72, 45),
            Self::up_to(168, 90),
            Self::up_to(336, 120),
            Self::catch_all(180),
        ]
    }

    fn covers(&self, span_secs: u64) -> bool {
        match self.max_span_hours {
            Some(hours) => span_secs <= hours.saturating_mul(SECS_PER_HOUR),
            None => true,
        }
    }
}

/// Selects the backend timeout for a query span.
#[derive(Debug, Clone)]
pub struct TimeoutPolicy {
    tiers: Vec<TimeoutTier>,
}

impl TimeoutPolicy {
    /// Build a policy from a validated tier table.
    pub fn new(tiers: Vec<TimeoutTier>) -> Self {
        Self { tiers }
    }

    /// Timeout for a span given in seconds.
    ///
    /// Picks the first tier covering the span. A table without a catch-all
    /// falls back to its last (largest) tier.
    pub fn select(&self, span_secs: u64) -> Duration {
        let tier = self
            .tiers
            .iter()
            .find(|t| t.covers(span_secs))
            .or_else(|| self.tiers.last());

        match tier {
            Some(t) => Duration::from_secs(t.timeout_secs),
            None => Duration::from_secs(TimeoutTier::defaults()[0].timeout_secs),
        }
    }

    /// Largest timeout any query can get.
    pub fn max_timeout(&self) -> Duration {
        let secs = self.tiers.iter().map(|t| t.timeout_secs).max().unwrap_or(0);
        Duration::from_secs(secs)
    }

    pub fn tiers(&self) -> &[TimeoutTier] {
        &self.tiers
    }
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self::new(TimeoutTier::defaults())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: u64 = 3600;

    #[test]
    fn test_default_tier_boundaries() {
        let policy = TimeoutPolicy::default();

        assert_eq!(policy.select(0), Duration::from_secs(15));
        assert_eq!(policy.select(HOUR), Duration::from_secs(15));
        assert_eq!(policy.select(24 * HOUR), Duration::from_secs(15));
        assert_eq!(policy.select(24 * HOUR + 1), Duration::from_secs(45));
        assert_eq!(policy.select(72 * HOUR), Duration::from_secs(45));
        assert_eq!(policy.select(72 * HOUR + 1), Duration::from_secs(90));
        assert_eq!(policy.select(168 * HOUR), Duration::from_secs(90));
        assert_eq!(policy.select(336 * HOUR), Duration::from_secs(120));
        assert_eq!(policy.select(336 * HOUR + 1), Duration::from_secs(180));
    }

    #[test]
    fn test_thirty_hour_span_selects_second_tier() {
        let policy = TimeoutPolicy::default();
        assert_eq!(policy.select(30 * HOUR), Duration::from_secs(45));
    }

    #[test]
    fn test_huge_span_hits_catch_all() {
        let policy = TimeoutPolicy::default();
        assert_eq!(policy.select(10 * 365 * 24 * HOUR), Duration::from_secs(180));
        assert_eq!(policy.select(u64::MAX), Duration::from_secs(180));
    }

    #[test]
    fn test_table_without_catch_all_uses_last_tier() {
        let policy = TimeoutPolicy::new(vec![TimeoutTier::up_to(1, 2), TimeoutTier::up_to(2, 4)]);
        assert_eq!(policy.select(5 * HOUR), Duration::from_secs(4));
    }

    #[test]
    fn test_max_timeout() {
        assert_eq!(TimeoutPolicy::default().max_timeout(), Duration::from_secs(180));
    }

    #[test]
    fn test_tier_deserializes_without_max_span() {
        let tier: TimeoutTier = toml::from_str("timeout_secs = 180").unwrap();
        assert_eq!(tier, TimeoutTier::catch_all(180));
    }
}
