//! Engine configuration.
//!
//! All thresholds, lookback windows and multipliers used by the alert,
//! forecast and waste engines live here so callers can tune them without
//! touching the rules themselves.

use serde::{Deserialize, Serialize};

/// Tunable parameters for the decision engines.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// Raw available stock below this triggers a low-stock alert.
    pub low_stock_threshold: i64,
    /// Low-stock alerts below this level escalate to high severity.
    pub high_severity_threshold: i64,
    /// Lookahead windows (days) evaluated by the expiry-warning rule.
    pub expiry_alert_days: Vec<i64>,
    /// Expiries at most this many days away get high severity.
    pub expiry_high_severity_days: i64,
    /// Trailing window (days) of OUT transactions fed into the forecast.
    pub forecast_lookback_days: i64,
    /// Default forecast horizon (days).
    pub forecast_horizon_days: i64,
    /// Assumed supplier lead time (days) for the reorder point.
    pub lead_time_days: i64,
    /// Safety-stock multiplier applied on top of lead-time demand.
    pub safety_stock_multiplier: f64,
    /// Default trailing window (days) for waste analytics.
    pub waste_window_days: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            low_stock_threshold: 20,
            high_severity_threshold: 10,
            expiry_alert_days: vec![30, 60, 90],
            expiry_high_severity_days: 30,
            forecast_lookback_days: 90,
            forecast_horizon_days: 30,
            lead_time_days: 7,
            safety_stock_multiplier: 1.5,
            waste_window_days: 90,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.low_stock_threshold, 20);
        assert_eq!(config.expiry_alert_days, vec![30, 60, 90]);
        assert_eq!(config.lead_time_days, 7);
    }

    #[test]
    fn test_roundtrip_json() {
        let config = EngineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
