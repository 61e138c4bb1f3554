//! Waste analytics: value and rate metrics over disposed/returned batches.
//!
//! Buckets are independent flag filters. Expired batches are windowed by
//! their expiry date; damaged, recalled and returned batches by when they
//! were last touched. A batch carrying several flags is counted in every
//! matching bucket. Returned value is reported but excluded from the waste
//! total since returns may be credited.

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::db::{DispositionFlag, Store};
use crate::error::LedgerResult;
use crate::models::Batch;

/// Quantity, value and batch count of one disposition bucket.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WasteBucket {
    pub quantity: i64,
    pub value: f64,
    pub count: usize,
}

/// Full waste breakdown over one window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WasteSummary {
    /// Window start date (inclusive, `YYYY-MM-DD`)
    pub start_date: String,
    /// Window end date (inclusive, `YYYY-MM-DD`)
    pub end_date: String,
    pub expired: WasteBucket,
    pub damaged: WasteBucket,
    pub recalled: WasteBucket,
    pub returned: WasteBucket,
    pub total_quantity: i64,
    /// expired + damaged + recalled value; returned excluded
    pub total_value: f64,
    pub wastage_rate_percent: f64,
}

/// Per-medicine waste aggregate for the top-items listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WasteItem {
    pub medicine_id: String,
    pub medicine_name: String,
    pub sku: String,
    pub category: String,
    pub quantity: i64,
    pub value: f64,
}

/// Per-category waste aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryWaste {
    pub category: String,
    pub quantity: i64,
    pub value: f64,
    pub count: usize,
}

pub struct WasteAnalytics<'a> {
    store: &'a Store,
    config: &'a EngineConfig,
}

impl<'a> WasteAnalytics<'a> {
    pub fn new(store: &'a Store, config: &'a EngineConfig) -> Self {
        Self { store, config }
    }

    /// Waste summary over the default trailing window.
    pub fn summary(&self) -> LedgerResult<WasteSummary> {
        let end = Utc::now().date_naive();
        let start = end - Duration::days(self.config.waste_window_days);
        self.summary_window(start, end)
    }

    /// Waste summary over `[start, end]` (dates inclusive).
    pub fn summary_window(&self, start: NaiveDate, end: NaiveDate) -> LedgerResult<WasteSummary> {
        let (start_ts, end_ts) = timestamp_window(start, end);
        let mut values = MedicineValues::new(self.store);

        let expired = values.bucket(&self.store.list_expired_in_window(start, end)?)?;
        let damaged = values.bucket(&self.store.list_flagged_in_window(
            DispositionFlag::Damaged,
            &start_ts,
            &end_ts,
        )?)?;
        let recalled = values.bucket(&self.store.list_flagged_in_window(
            DispositionFlag::Recalled,
            &start_ts,
            &end_ts,
        )?)?;
        let returned = values.bucket(&self.store.list_flagged_in_window(
            DispositionFlag::Returned,
            &start_ts,
            &end_ts,
        )?)?;

        let total_value = expired.value + damaged.value + recalled.value;
        let total_quantity =
            expired.quantity + damaged.quantity + recalled.quantity + returned.quantity;

        let inventory_value = self.store.sellable_stock_value()?;
        let wastage_rate_percent = if inventory_value > 0.0 {
            round2(total_value / inventory_value * 100.0)
        } else {
            0.0
        };

        Ok(WasteSummary {
            start_date: start.to_string(),
            end_date: end.to_string(),
            expired,
            damaged,
            recalled,
            returned,
            total_quantity,
            total_value,
            wastage_rate_percent,
        })
    }

    /// Top medicines by waste value over the default trailing window,
    /// highest first, capped at `limit`.
    pub fn top_waste_items(&self, limit: usize) -> LedgerResult<Vec<WasteItem>> {
        let end = Utc::now().date_naive();
        let start = end - Duration::days(self.config.waste_window_days);
        let (start_ts, end_ts) = timestamp_window(start, end);

        let wasted = self.store.list_wasted_in_window(&start_ts, &end_ts)?;
        let mut values = MedicineValues::new(self.store);
        let mut by_medicine: HashMap<String, WasteItem> = HashMap::new();

        for batch in &wasted {
            let Some(medicine) = values.medicine(&batch.medicine_id)? else {
                continue;
            };
            let item = by_medicine
                .entry(batch.medicine_id.clone())
                .or_insert_with(|| WasteItem {
                    medicine_id: medicine.0.clone(),
                    medicine_name: medicine.1.clone(),
                    sku: medicine.2.clone(),
                    category: medicine.3.clone(),
                    quantity: 0,
                    value: 0.0,
                });
            item.quantity += batch.quantity;
            item.value += batch.quantity as f64 * medicine.4;
        }

        let mut items: Vec<WasteItem> = by_medicine.into_values().collect();
        items.sort_by(|a, b| b.value.total_cmp(&a.value));
        items.truncate(limit);
        Ok(items)
    }

    /// Waste breakdown by medicine category over the default trailing window.
    pub fn waste_by_category(&self) -> LedgerResult<Vec<CategoryWaste>> {
        let end = Utc::now().date_naive();
        let start = end - Duration::days(self.config.waste_window_days);
        let (start_ts, end_ts) = timestamp_window(start, end);

        let wasted = self.store.list_wasted_in_window(&start_ts, &end_ts)?;
        let mut values = MedicineValues::new(self.store);
        let mut by_category: HashMap<String, CategoryWaste> = HashMap::new();

        for batch in &wasted {
            let Some(medicine) = values.medicine(&batch.medicine_id)? else {
                continue;
            };
            let entry = by_category
                .entry(medicine.3.clone())
                .or_insert_with(|| CategoryWaste {
                    category: medicine.3.clone(),
                    quantity: 0,
                    value: 0.0,
                    count: 0,
                });
            entry.quantity += batch.quantity;
            entry.value += batch.quantity as f64 * medicine.4;
            entry.count += 1;
        }

        let mut categories: Vec<CategoryWaste> = by_category.into_values().collect();
        categories.sort_by(|a, b| b.value.total_cmp(&a.value));
        Ok(categories)
    }
}

/// Caches (id, name, sku, category, mrp-or-zero) per medicine across one
/// analytics pass.
struct MedicineValues<'a> {
    store: &'a Store,
    cache: HashMap<String, Option<(String, String, String, String, f64)>>,
}

impl<'a> MedicineValues<'a> {
    fn new(store: &'a Store) -> Self {
        Self {
            store,
            cache: HashMap::new(),
        }
    }

    fn medicine(
        &mut self,
        medicine_id: &str,
    ) -> LedgerResult<&Option<(String, String, String, String, f64)>> {
        if !self.cache.contains_key(medicine_id) {
            let entry = self.store.get_medicine(medicine_id)?.map(|m| {
                (m.id, m.name, m.sku, m.category, m.mrp.unwrap_or(0.0))
            });
            self.cache.insert(medicine_id.to_string(), entry);
        }
        Ok(&self.cache[medicine_id])
    }

    fn bucket(&mut self, batches: &[Batch]) -> LedgerResult<WasteBucket> {
        let mut bucket = WasteBucket::default();
        for batch in batches {
            let mrp = match self.medicine(&batch.medicine_id)? {
                Some(entry) => entry.4,
                None => continue,
            };
            bucket.quantity += batch.quantity;
            bucket.value += batch.quantity as f64 * mrp;
            bucket.count += 1;
        }
        Ok(bucket)
    }
}

/// Inclusive date window to a `[start, end)` RFC 3339 timestamp window.
fn timestamp_window(start: NaiveDate, end: NaiveDate) -> (String, String) {
    let to_ts = |date: NaiveDate| -> String {
        let midnight = date.and_hms_opt(0, 0, 0).unwrap_or_default();
        DateTime::<Utc>::from_naive_utc_and_offset(midnight, Utc).to_rfc3339()
    };
    (to_ts(start), to_ts(end + Duration::days(1)))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
