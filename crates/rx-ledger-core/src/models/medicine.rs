//! Medicine (SKU-level) model.

use serde::{Deserialize, Serialize};

use super::now_timestamp;

/// A medicine tracked by the ledger. Owns zero or more batches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Medicine {
    /// Unique identifier
    pub id: String,
    /// Stock Keeping Unit - unique per medicine
    pub sku: String,
    /// Display name
    pub name: String,
    /// Assigned or auto-derived category (see `categorize`)
    pub category: String,
    pub manufacturer: Option<String>,
    pub brand: Option<String>,
    /// Maximum retail price per unit
    pub mrp: Option<f64>,
    /// Acquisition cost per unit
    pub cost: Option<f64>,
    /// Regulatory schedule (e.g. "Schedule H", "OTC")
    pub schedule: Option<String>,
    /// Storage class (e.g. "cold_chain", "room_temp")
    pub storage_requirements: Option<String>,
    pub description: Option<String>,
    pub is_active: bool,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
    /// Last update timestamp (RFC 3339)
    pub updated_at: String,
}

impl Medicine {
    /// Create a new active medicine with required fields.
    pub fn new(sku: String, name: String, category: String) -> Self {
        let now = now_timestamp();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            sku,
            name,
            category,
            manufacturer: None,
            brand: None,
            mrp: None,
            cost: None,
            schedule: None,
            storage_requirements: None,
            description: None,
            is_active: true,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Touch the updated_at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = now_timestamp();
    }
}
