//! Forecast engine: deterministic demand heuristic over trailing outflow.
//!
//! A forecast run is a pure read of ledger state plus configuration;
//! `forecast_and_record` additionally persists an immutable snapshot but
//! never mutates inventory.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::db::Store;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{DemandForecast, Forecast, ReorderPriority};

/// One reorder-suggestion row, priority-classified against the forecast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReorderSuggestion {
    pub medicine_id: String,
    pub medicine_name: String,
    pub sku: String,
    pub category: String,
    pub current_stock: i64,
    pub priority: ReorderPriority,
    pub forecast: DemandForecast,
}

pub struct ForecastEngine<'a> {
    store: &'a Store,
    config: &'a EngineConfig,
}

impl<'a> ForecastEngine<'a> {
    pub fn new(store: &'a Store, config: &'a EngineConfig) -> Self {
        Self { store, config }
    }

    /// Forecast demand for one medicine over the configured horizon.
    pub fn forecast(&self, medicine_id: &str) -> LedgerResult<DemandForecast> {
        self.forecast_horizon(medicine_id, self.config.forecast_horizon_days)
    }

    /// Forecast demand over an explicit horizon.
    pub fn forecast_horizon(
        &self,
        medicine_id: &str,
        horizon_days: i64,
    ) -> LedgerResult<DemandForecast> {
        if self.store.get_medicine(medicine_id)?.is_none() {
            return Err(LedgerError::not_found("medicine", medicine_id));
        }

        let lookback = self.config.forecast_lookback_days;
        let cutoff = (Utc::now() - Duration::days(lookback)).to_rfc3339();
        let outflow = self.store.outflow_since(medicine_id, &cutoff)?;
        let current_stock = self.store.available_quantity(medicine_id)?;

        if outflow.transaction_count == 0 {
            // No history: conservative stock-fraction estimates
            let stock = current_stock as f64;
            return Ok(DemandForecast {
                horizon_days,
                forecasted_demand: round2(stock * 0.3),
                confidence_score: 0.3,
                reorder_point: ((stock * 0.2) as i64).max(10),
                recommended_quantity: ((stock * 0.5) as i64).max(20),
                current_stock,
                reasoning: "No historical data available. Using conservative estimates."
                    .to_string(),
            });
        }

        let avg_daily_demand = outflow.total_quantity as f64 / lookback as f64;
        let forecasted_demand = avg_daily_demand * horizon_days as f64;
        let confidence_score =
            (0.5 + outflow.transaction_count as f64 / 100.0).min(0.95);

        let reorder_point = (avg_daily_demand
            * self.config.lead_time_days as f64
            * self.config.safety_stock_multiplier) as i64;
        let shortfall = if current_stock < reorder_point {
            reorder_point - current_stock
        } else {
            0
        };
        let recommended_quantity = ((forecasted_demand * 0.3) as i64).max(shortfall).max(0);

        let reasoning = format!(
            "Based on {} transactions over {} days. Average daily demand: {:.2} units. \
             Forecasted demand for {} days: {:.2} units.",
            outflow.transaction_count, lookback, avg_daily_demand, horizon_days, forecasted_demand
        );
        Ok(DemandForecast {
            horizon_days,
            forecasted_demand: round2(forecasted_demand),
            confidence_score: round2(confidence_score),
            reorder_point: reorder_point.max(1),
            recommended_quantity,
            current_stock,
            reasoning,
        })
    }

    /// Forecast and persist an immutable snapshot row.
    pub fn forecast_and_record(&self, medicine_id: &str) -> LedgerResult<Forecast> {
        let demand = self.forecast(medicine_id)?;
        let snapshot = Forecast::from_demand(medicine_id, &demand);
        self.store.insert_forecast(&snapshot)?;
        tracing::debug!(
            medicine_id,
            demand = demand.forecasted_demand,
            confidence = demand.confidence_score,
            "recorded forecast snapshot"
        );
        Ok(snapshot)
    }

    /// Forecast every active medicine. A failing medicine is skipped, not
    /// fatal to the run.
    pub fn forecast_all(&self) -> LedgerResult<Vec<(String, DemandForecast)>> {
        let mut results = Vec::new();
        for medicine in self.store.list_active_medicines()? {
            match self.forecast(&medicine.id) {
                Ok(demand) => results.push((medicine.id, demand)),
                Err(err) => {
                    tracing::warn!(medicine_id = %medicine.id, error = %err, "forecast failed");
                }
            }
        }
        Ok(results)
    }

    /// Reorder suggestions for active medicines, most urgent first. With
    /// `critical_only`, keeps only critical and low-stock rows.
    pub fn reorder_suggestions(&self, critical_only: bool) -> LedgerResult<Vec<ReorderSuggestion>> {
        let mut suggestions = Vec::new();
        for medicine in self.store.list_active_medicines()? {
            let forecast = match self.forecast(&medicine.id) {
                Ok(f) => f,
                Err(err) => {
                    tracing::warn!(medicine_id = %medicine.id, error = %err, "suggestion skipped");
                    continue;
                }
            };
            let priority = ReorderPriority::classify(forecast.current_stock, &forecast);
            if critical_only
                && !matches!(priority, ReorderPriority::Critical | ReorderPriority::LowStock)
            {
                continue;
            }
            suggestions.push(ReorderSuggestion {
                medicine_id: medicine.id,
                medicine_name: medicine.name,
                sku: medicine.sku,
                category: medicine.category,
                current_stock: forecast.current_stock,
                priority,
                forecast,
            });
        }
        suggestions.sort_by_key(|s| s.priority.rank());
        Ok(suggestions)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
