//! Dashboard summary figures. Pure reads, assembled for display.

use std::collections::HashMap;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::db::Store;
use crate::error::LedgerResult;

const WASTAGE_TRAILING_DAYS: i64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardStats {
    /// Sellable inventory value (quantity x MRP)
    pub total_stock_value: f64,
    /// Active medicine count
    pub total_skus: i64,
    /// Active medicines at or below the low-stock threshold
    pub low_stock_count: i64,
    /// In-stock batches expiring inside the first configured window
    pub expiring_soon_count: i64,
    /// Open (unacknowledged) alerts
    pub open_alert_count: i64,
    /// Trailing 30-day waste value (expired, damaged, recalled)
    pub wastage_value: f64,
}

pub struct Dashboard<'a> {
    store: &'a Store,
    config: &'a EngineConfig,
}

impl<'a> Dashboard<'a> {
    pub fn new(store: &'a Store, config: &'a EngineConfig) -> Self {
        Self { store, config }
    }

    pub fn stats(&self) -> LedgerResult<DashboardStats> {
        let today = Utc::now().date_naive();

        let total_stock_value = self.store.sellable_stock_value()?;
        let total_skus = self.store.count_active_medicines()?;

        let mut low_stock_count = 0;
        for medicine in self.store.list_active_medicines()? {
            if self.store.available_quantity(&medicine.id)? < self.config.low_stock_threshold {
                low_stock_count += 1;
            }
        }

        let expiry_window = self.config.expiry_alert_days.first().copied().unwrap_or(30);
        let expiring_soon_count = self
            .store
            .count_expiring_before(today + Duration::days(expiry_window))?;

        let open_alert_count = self.store.count_open_alerts()?;

        Ok(DashboardStats {
            total_stock_value,
            total_skus,
            low_stock_count,
            expiring_soon_count,
            open_alert_count,
            wastage_value: self.trailing_wastage_value()?,
        })
    }

    fn trailing_wastage_value(&self) -> LedgerResult<f64> {
        let now = Utc::now();
        let start = (now - Duration::days(WASTAGE_TRAILING_DAYS)).to_rfc3339();
        let end = (now + Duration::days(1)).to_rfc3339();
        let wasted = self.store.list_wasted_in_window(&start, &end)?;

        let mut mrp_cache: HashMap<String, f64> = HashMap::new();
        let mut value = 0.0;
        for batch in wasted {
            let mrp = match mrp_cache.get(&batch.medicine_id) {
                Some(v) => *v,
                None => {
                    let v = self
                        .store
                        .get_medicine(&batch.medicine_id)?
                        .and_then(|m| m.mrp)
                        .unwrap_or(0.0);
                    mrp_cache.insert(batch.medicine_id.clone(), v);
                    v
                }
            };
            value += batch.quantity as f64 * mrp;
        }
        Ok(value)
    }
}
