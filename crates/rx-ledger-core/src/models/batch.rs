//! Batch (lot-level) model.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::now_timestamp;

/// A dated lot of a medicine with its own quantity and expiry.
///
/// Quantity only changes through the transaction processor or ingestion;
/// the lifecycle flags are not mutually exclusive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Batch {
    /// Unique identifier
    pub id: String,
    /// Owning medicine
    pub medicine_id: String,
    /// Batch number - unique per medicine, not globally
    pub batch_number: String,
    /// Units on hand (never negative)
    pub quantity: i64,
    pub expiry_date: NaiveDate,
    pub purchase_date: Option<NaiveDate>,
    pub purchase_price: Option<f64>,
    pub is_expired: bool,
    pub is_damaged: bool,
    pub is_recalled: bool,
    pub is_returned: bool,
    /// Return lifecycle: "initiated", "picked", "credited"
    pub return_status: Option<String>,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
    /// Last update timestamp (RFC 3339)
    pub updated_at: String,
}

impl Batch {
    /// Create a new batch for a medicine.
    pub fn new(medicine_id: String, batch_number: String, quantity: i64, expiry_date: NaiveDate) -> Self {
        let now = now_timestamp();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            medicine_id,
            batch_number,
            quantity,
            expiry_date,
            purchase_date: None,
            purchase_price: None,
            is_expired: false,
            is_damaged: false,
            is_recalled: false,
            is_returned: false,
            return_status: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Counts toward raw available stock: nonzero and not expired.
    pub fn is_available(&self) -> bool {
        self.quantity > 0 && !self.is_expired
    }

    /// Counts toward sellable stock: available and neither damaged nor recalled.
    pub fn is_sellable(&self) -> bool {
        self.is_available() && !self.is_damaged && !self.is_recalled
    }

    /// Days from `today` until expiry (negative if already past).
    pub fn days_until_expiry(&self, today: NaiveDate) -> i64 {
        (self.expiry_date - today).num_days()
    }

    /// Recompute `is_expired` from the expiry date. Called at write time;
    /// there is no background sweep, so the stored flag can go stale until
    /// the batch is next touched.
    pub fn refresh_expired(&mut self, today: NaiveDate) {
        self.is_expired = self.expiry_date < today;
    }

    /// Touch the updated_at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = now_timestamp();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_availability() {
        let mut batch = Batch::new("med-1".into(), "B001".into(), 10, date("2027-01-01"));
        assert!(batch.is_available());
        assert!(batch.is_sellable());

        batch.is_damaged = true;
        assert!(batch.is_available());
        assert!(!batch.is_sellable());

        batch.is_expired = true;
        assert!(!batch.is_available());

        batch.is_expired = false;
        batch.quantity = 0;
        assert!(!batch.is_available());
    }

    #[test]
    fn test_refresh_expired() {
        let mut batch = Batch::new("med-1".into(), "B001".into(), 10, date("2026-06-01"));

        batch.refresh_expired(date("2026-05-31"));
        assert!(!batch.is_expired);

        // Expiry day itself is still usable; strictly-before flips the flag
        batch.refresh_expired(date("2026-06-01"));
        assert!(!batch.is_expired);

        batch.refresh_expired(date("2026-06-02"));
        assert!(batch.is_expired);
    }

    #[test]
    fn test_days_until_expiry() {
        let batch = Batch::new("med-1".into(), "B001".into(), 10, date("2026-06-10"));
        assert_eq!(batch.days_until_expiry(date("2026-06-01")), 9);
        assert_eq!(batch.days_until_expiry(date("2026-06-11")), -1);
    }
}
