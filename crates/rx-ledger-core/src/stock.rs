//! Stock accessor: quantity views and FEFO ordering over batches.
//!
//! Two notions of stock are deliberately distinct. *Available* counts every
//! non-expired batch with units left, including damaged/recalled ones still
//! on the shelf. *Sellable* additionally excludes damaged and recalled
//! batches and is what dispensing decisions run on.

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::db::Store;
use crate::error::LedgerResult;
use crate::models::Batch;

/// One medicine's aggregate stock position.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockLevel {
    pub medicine_id: String,
    pub sku: String,
    pub name: String,
    pub category: String,
    /// Sum of quantities across available batches
    pub total_quantity: i64,
    /// Earliest expiry date among available batches (`YYYY-MM-DD`)
    pub nearest_expiry: Option<String>,
}

/// Read-only stock views over the ledger store.
pub struct StockAccessor<'a> {
    store: &'a Store,
    config: &'a EngineConfig,
}

impl<'a> StockAccessor<'a> {
    pub fn new(store: &'a Store, config: &'a EngineConfig) -> Self {
        Self { store, config }
    }

    /// Raw available stock: units in non-expired batches with quantity > 0.
    pub fn available_stock(&self, medicine_id: &str) -> LedgerResult<i64> {
        self.store.available_quantity(medicine_id)
    }

    /// Sellable stock: available minus damaged and recalled batches.
    pub fn sellable_stock(&self, medicine_id: &str) -> LedgerResult<i64> {
        self.store.sellable_quantity(medicine_id)
    }

    /// Available batches in first-expiry-first-out order.
    pub fn fefo_order(&self, medicine_id: &str) -> LedgerResult<Vec<Batch>> {
        self.store.list_available_batches(medicine_id)
    }

    /// Aggregate stock position for every active medicine. With
    /// `low_stock_only`, keeps only medicines below the configured low-stock
    /// threshold, the same cutoff the alert engine fires on.
    pub fn stock_levels(&self, low_stock_only: bool) -> LedgerResult<Vec<StockLevel>> {
        let medicines = self.store.list_active_medicines()?;
        let mut levels = Vec::with_capacity(medicines.len());

        for medicine in medicines {
            let batches = self.store.list_available_batches(&medicine.id)?;
            let total_quantity: i64 = batches.iter().map(|b| b.quantity).sum();
            if low_stock_only && total_quantity >= self.config.low_stock_threshold {
                continue;
            }
            // FEFO order puts the nearest expiry first
            let nearest_expiry = batches
                .first()
                .map(|b| b.expiry_date.format("%Y-%m-%d").to_string());
            levels.push(StockLevel {
                medicine_id: medicine.id,
                sku: medicine.sku,
                name: medicine.name,
                category: medicine.category,
                total_quantity,
                nearest_expiry,
            });
        }
        Ok(levels)
    }
}
