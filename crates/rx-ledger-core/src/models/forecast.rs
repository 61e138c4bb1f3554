//! Forecast snapshot model and derived forecast outputs.

use serde::{Deserialize, Serialize};

use super::now_timestamp;

/// Immutable snapshot of one forecast engine run. Historical runs accumulate;
/// rows are never mutated after insert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Forecast {
    /// Unique identifier
    pub id: String,
    pub medicine_id: String,
    /// When the forecast was computed (RFC 3339)
    pub forecast_date: String,
    pub forecasted_demand: f64,
    pub horizon_days: i64,
    pub confidence_score: f64,
    pub reorder_point: i64,
    pub recommended_quantity: i64,
    pub reasoning: String,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
}

impl Forecast {
    /// Snapshot a computed forecast for persistence.
    pub fn from_demand(medicine_id: &str, demand: &DemandForecast) -> Self {
        let now = now_timestamp();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            medicine_id: medicine_id.to_string(),
            forecast_date: now.clone(),
            forecasted_demand: demand.forecasted_demand,
            horizon_days: demand.horizon_days,
            confidence_score: demand.confidence_score,
            reorder_point: demand.reorder_point,
            recommended_quantity: demand.recommended_quantity,
            reasoning: demand.reasoning.clone(),
            created_at: now,
        }
    }
}

/// Computed output of one forecast run. Pure function of ledger state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DemandForecast {
    pub horizon_days: i64,
    /// Expected units consumed over the horizon, rounded to 2 decimals
    pub forecasted_demand: f64,
    /// 0.0 - 0.95, rounded to 2 decimals
    pub confidence_score: f64,
    /// Stock level below which replenishment should trigger (>= 1, or the
    /// conservative floor when no history exists)
    pub reorder_point: i64,
    /// Suggested order size (>= 0)
    pub recommended_quantity: i64,
    /// Raw available stock at computation time
    pub current_stock: i64,
    pub reasoning: String,
}

/// Urgency bucket for reorder suggestion lists, most urgent first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReorderPriority {
    Critical,
    LowStock,
    AtRisk,
    Healthy,
}

impl ReorderPriority {
    /// Fixed ascending sort rank (critical first).
    pub fn rank(&self) -> u8 {
        match self {
            ReorderPriority::Critical => 0,
            ReorderPriority::LowStock => 1,
            ReorderPriority::AtRisk => 2,
            ReorderPriority::Healthy => 3,
        }
    }

    /// Classify a medicine's stock position against its forecast.
    pub fn classify(stock: i64, forecast: &DemandForecast) -> Self {
        if stock == 0 && forecast.forecasted_demand > 0.0 {
            ReorderPriority::Critical
        } else if stock < forecast.reorder_point {
            ReorderPriority::LowStock
        } else if stock < forecast.recommended_quantity {
            ReorderPriority::AtRisk
        } else {
            ReorderPriority::Healthy
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forecast(demand: f64, reorder: i64, recommended: i64) -> DemandForecast {
        DemandForecast {
            horizon_days: 30,
            forecasted_demand: demand,
            confidence_score: 0.5,
            reorder_point: reorder,
            recommended_quantity: recommended,
            current_stock: 0,
            reasoning: String::new(),
        }
    }

    #[test]
    fn test_priority_classification() {
        let f = forecast(100.0, 20, 50);
        assert_eq!(ReorderPriority::classify(0, &f), ReorderPriority::Critical);
        assert_eq!(ReorderPriority::classify(10, &f), ReorderPriority::LowStock);
        assert_eq!(ReorderPriority::classify(30, &f), ReorderPriority::AtRisk);
        assert_eq!(ReorderPriority::classify(60, &f), ReorderPriority::Healthy);

        // Zero stock with zero demand is not critical
        let idle = forecast(0.0, 10, 20);
        assert_eq!(ReorderPriority::classify(0, &idle), ReorderPriority::LowStock);
    }

    #[test]
    fn test_rank_ascending() {
        assert!(ReorderPriority::Critical.rank() < ReorderPriority::LowStock.rank());
        assert!(ReorderPriority::LowStock.rank() < ReorderPriority::AtRisk.rank());
        assert!(ReorderPriority::AtRisk.rank() < ReorderPriority::Healthy.rank());
    }
}
