//! Transaction processor: validates and applies one quantity-changing
//! operation as a single atomic unit.
//!
//! Every successful application mutates at most one batch and appends
//! exactly one immutable ledger row inside the same SQL transaction, so a
//! quantity change can never persist without its audit record or vice versa.

use chrono::Utc;

use crate::db::Store;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{Batch, InventoryTransaction, TransactionType};

/// One requested ledger operation.
///
/// `quantity` is interpreted per type: a positive amount for IN, OUT,
/// DAMAGED and RETURN; a signed delta for ADJUSTMENT; ignored for EXPIRED
/// and RECALLED, which always remove the batch's entire remaining quantity
/// and record the amount actually removed.
#[derive(Debug, Clone)]
pub struct ApplyRequest {
    pub medicine_id: String,
    pub batch_id: Option<String>,
    pub transaction_type: TransactionType,
    pub quantity: i64,
    pub unit_price: Option<f64>,
    pub notes: Option<String>,
    pub created_by: Option<String>,
}

impl ApplyRequest {
    pub fn new(medicine_id: &str, transaction_type: TransactionType, quantity: i64) -> Self {
        Self {
            medicine_id: medicine_id.to_string(),
            batch_id: None,
            transaction_type,
            quantity,
            unit_price: None,
            notes: None,
            created_by: None,
        }
    }

    pub fn on_batch(mut self, batch_id: &str) -> Self {
        self.batch_id = Some(batch_id.to_string());
        self
    }

    pub fn with_notes(mut self, notes: &str) -> Self {
        self.notes = Some(notes.to_string());
        self
    }

    pub fn by(mut self, actor: &str) -> Self {
        self.created_by = Some(actor.to_string());
        self
    }
}

/// Applies validated inventory operations against the store.
pub struct TransactionProcessor<'a> {
    store: &'a Store,
}

impl<'a> TransactionProcessor<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Validate and apply one operation. Returns the appended ledger row.
    pub fn apply(&self, request: ApplyRequest) -> LedgerResult<InventoryTransaction> {
        self.validate_quantity(&request)?;

        if self.store.get_medicine(&request.medicine_id)?.is_none() {
            return Err(LedgerError::not_found("medicine", &request.medicine_id));
        }

        let txn_guard = self.store.begin()?;

        let recorded_quantity = match request.batch_id.as_deref() {
            Some(batch_id) => {
                let batch = self
                    .store
                    .get_batch(batch_id)?
                    .ok_or_else(|| LedgerError::not_found("batch", batch_id))?;
                if batch.medicine_id != request.medicine_id {
                    return Err(LedgerError::Validation(format!(
                        "Batch {} does not belong to medicine {}",
                        batch_id, request.medicine_id
                    )));
                }
                self.mutate_batch(batch, &request)?
            }
            None => self.batchless_quantity(&request)?,
        };

        let ledger_row = InventoryTransaction::new(
            request.medicine_id.clone(),
            request.batch_id.clone(),
            request.transaction_type,
            recorded_quantity,
        )
        .with_unit_price(request.unit_price)
        .with_notes(request.notes.clone())
        .with_created_by(request.created_by.clone());
        self.store.insert_transaction(&ledger_row)?;

        txn_guard.commit()?;

        tracing::info!(
            medicine_id = %request.medicine_id,
            batch_id = ?request.batch_id,
            transaction_type = %request.transaction_type.as_str(),
            quantity = recorded_quantity,
            "applied inventory transaction"
        );
        Ok(ledger_row)
    }

    fn validate_quantity(&self, request: &ApplyRequest) -> LedgerResult<()> {
        match request.transaction_type {
            TransactionType::Adjustment => {
                if request.quantity == 0 {
                    return Err(LedgerError::Validation(
                        "Adjustment quantity must be non-zero".to_string(),
                    ));
                }
            }
            // EXPIRED/RECALLED remove whatever remains; the request quantity
            // is not consulted
            TransactionType::Expired | TransactionType::Recalled => {}
            _ => {
                if request.quantity <= 0 {
                    return Err(LedgerError::Validation(format!(
                        "Quantity must be positive for {} transactions",
                        request.transaction_type.as_str()
                    )));
                }
            }
        }
        Ok(())
    }

    /// Mutate the named batch per the transaction type. Returns the quantity
    /// to record on the ledger row.
    fn mutate_batch(&self, mut batch: Batch, request: &ApplyRequest) -> LedgerResult<i64> {
        let recorded = match request.transaction_type {
            TransactionType::In => {
                batch.quantity += request.quantity;
                request.quantity
            }
            TransactionType::Out => {
                if batch.quantity < request.quantity {
                    return Err(LedgerError::InsufficientStock {
                        requested: request.quantity,
                        available: batch.quantity,
                    });
                }
                batch.quantity -= request.quantity;
                request.quantity
            }
            TransactionType::Adjustment => {
                let new_quantity = batch.quantity + request.quantity;
                if new_quantity < 0 {
                    return Err(LedgerError::InsufficientStock {
                        requested: -request.quantity,
                        available: batch.quantity,
                    });
                }
                batch.quantity = new_quantity;
                request.quantity
            }
            TransactionType::Damaged => {
                if request.quantity > batch.quantity {
                    return Err(LedgerError::ExceedsAvailable {
                        requested: request.quantity,
                        available: batch.quantity,
                    });
                }
                batch.quantity -= request.quantity;
                batch.is_damaged = true;
                request.quantity
            }
            TransactionType::Return => {
                if request.quantity > batch.quantity {
                    return Err(LedgerError::ExceedsAvailable {
                        requested: request.quantity,
                        available: batch.quantity,
                    });
                }
                batch.quantity -= request.quantity;
                batch.is_returned = true;
                batch.return_status = Some("initiated".to_string());
                request.quantity
            }
            TransactionType::Expired => {
                let removed = batch.quantity;
                batch.quantity = 0;
                batch.is_expired = true;
                removed
            }
            TransactionType::Recalled => {
                let removed = batch.quantity;
                batch.quantity = 0;
                batch.is_recalled = true;
                removed
            }
        };

        // An explicit expiry disposal flags the batch regardless of its
        // expiry date; recomputing from the date would un-flag it.
        if request.transaction_type != TransactionType::Expired {
            batch.refresh_expired(Utc::now().date_naive());
        }
        batch.touch();
        self.store.update_batch(&batch)?;
        Ok(recorded)
    }

    /// Batch-less operations only append a ledger row. IN and OUT may omit
    /// the batch when the movement is tracked at medicine level.
    fn batchless_quantity(&self, request: &ApplyRequest) -> LedgerResult<i64> {
        match request.transaction_type {
            TransactionType::In | TransactionType::Out => Ok(request.quantity),
            other => Err(LedgerError::Validation(format!(
                "{} transactions require a batch",
                other.as_str()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Medicine;
    use chrono::NaiveDate;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn seed(store: &Store, qty: i64) -> (Medicine, Batch) {
        let med = Medicine::new("SKU1".into(), "Amoxicillin".into(), "Antibiotics".into());
        store.insert_medicine(&med).unwrap();
        let batch = Batch::new(med.id.clone(), "B001".into(), qty, date("2099-01-01"));
        store.insert_batch(&batch).unwrap();
        (med, batch)
    }

    #[test]
    fn test_out_decrements_and_appends() {
        let store = Store::open_in_memory().unwrap();
        let processor = TransactionProcessor::new(&store);
        let (med, batch) = seed(&store, 100);

        let row = processor
            .apply(ApplyRequest::new(&med.id, TransactionType::Out, 30).on_batch(&batch.id))
            .unwrap();
        assert_eq!(row.quantity, 30);
        assert_eq!(row.transaction_type, TransactionType::Out);

        assert_eq!(store.get_batch(&batch.id).unwrap().unwrap().quantity, 70);
        let history = store.list_transactions_for_batch(&batch.id).unwrap();
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_out_insufficient_leaves_state_untouched() {
        let store = Store::open_in_memory().unwrap();
        let processor = TransactionProcessor::new(&store);
        let (med, batch) = seed(&store, 10);

        let err = processor
            .apply(ApplyRequest::new(&med.id, TransactionType::Out, 25).on_batch(&batch.id))
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientStock { requested: 25, available: 10 }
        ));

        assert_eq!(store.get_batch(&batch.id).unwrap().unwrap().quantity, 10);
        assert!(store.list_transactions_for_batch(&batch.id).unwrap().is_empty());
    }

    #[test]
    fn test_in_increments() {
        let store = Store::open_in_memory().unwrap();
        let processor = TransactionProcessor::new(&store);
        let (med, batch) = seed(&store, 10);

        processor
            .apply(ApplyRequest::new(&med.id, TransactionType::In, 15).on_batch(&batch.id))
            .unwrap();
        assert_eq!(store.get_batch(&batch.id).unwrap().unwrap().quantity, 25);
    }

    #[test]
    fn test_adjustment_signed_delta() {
        let store = Store::open_in_memory().unwrap();
        let processor = TransactionProcessor::new(&store);
        let (med, batch) = seed(&store, 50);

        let row = processor
            .apply(ApplyRequest::new(&med.id, TransactionType::Adjustment, -20).on_batch(&batch.id))
            .unwrap();
        assert_eq!(row.quantity, -20);
        assert_eq!(store.get_batch(&batch.id).unwrap().unwrap().quantity, 30);

        // Cannot adjust below zero
        let err = processor
            .apply(ApplyRequest::new(&med.id, TransactionType::Adjustment, -31).on_batch(&batch.id))
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientStock { .. }));

        // Zero delta is rejected outright
        let err = processor
            .apply(ApplyRequest::new(&med.id, TransactionType::Adjustment, 0).on_batch(&batch.id))
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn test_damaged_bounded_and_flagged() {
        let store = Store::open_in_memory().unwrap();
        let processor = TransactionProcessor::new(&store);
        let (med, batch) = seed(&store, 40);

        let err = processor
            .apply(ApplyRequest::new(&med.id, TransactionType::Damaged, 41).on_batch(&batch.id))
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::ExceedsAvailable { requested: 41, available: 40 }
        ));
        // Failed application changes nothing
        let unchanged = store.get_batch(&batch.id).unwrap().unwrap();
        assert_eq!(unchanged.quantity, 40);
        assert!(!unchanged.is_damaged);

        processor
            .apply(ApplyRequest::new(&med.id, TransactionType::Damaged, 15).on_batch(&batch.id))
            .unwrap();
        let damaged = store.get_batch(&batch.id).unwrap().unwrap();
        assert_eq!(damaged.quantity, 25);
        assert!(damaged.is_damaged);
    }

    #[test]
    fn test_return_sets_status() {
        let store = Store::open_in_memory().unwrap();
        let processor = TransactionProcessor::new(&store);
        let (med, batch) = seed(&store, 40);

        processor
            .apply(ApplyRequest::new(&med.id, TransactionType::Return, 10).on_batch(&batch.id))
            .unwrap();
        let returned = store.get_batch(&batch.id).unwrap().unwrap();
        assert_eq!(returned.quantity, 30);
        assert!(returned.is_returned);
        assert_eq!(returned.return_status.as_deref(), Some("initiated"));
    }

    #[test]
    fn test_expired_zeroes_and_records_removed() {
        let store = Store::open_in_memory().unwrap();
        let processor = TransactionProcessor::new(&store);
        let (med, batch) = seed(&store, 35);

        let row = processor
            .apply(ApplyRequest::new(&med.id, TransactionType::Expired, 0).on_batch(&batch.id))
            .unwrap();
        // Ledger records the amount actually removed, not the post-zero state
        assert_eq!(row.quantity, 35);

        let expired = store.get_batch(&batch.id).unwrap().unwrap();
        assert_eq!(expired.quantity, 0);
        assert!(expired.is_expired);
    }

    #[test]
    fn test_recalled_zeroes_batch() {
        let store = Store::open_in_memory().unwrap();
        let processor = TransactionProcessor::new(&store);
        let (med, batch) = seed(&store, 12);

        let row = processor
            .apply(ApplyRequest::new(&med.id, TransactionType::Recalled, 0).on_batch(&batch.id))
            .unwrap();
        assert_eq!(row.quantity, 12);
        let recalled = store.get_batch(&batch.id).unwrap().unwrap();
        assert_eq!(recalled.quantity, 0);
        assert!(recalled.is_recalled);
    }

    #[test]
    fn test_disposal_requires_batch() {
        let store = Store::open_in_memory().unwrap();
        let processor = TransactionProcessor::new(&store);
        let (med, _) = seed(&store, 10);

        let err = processor
            .apply(ApplyRequest::new(&med.id, TransactionType::Damaged, 5))
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn test_batchless_out_only_appends() {
        let store = Store::open_in_memory().unwrap();
        let processor = TransactionProcessor::new(&store);
        let (med, batch) = seed(&store, 10);

        processor
            .apply(ApplyRequest::new(&med.id, TransactionType::Out, 5).with_notes("counter sale"))
            .unwrap();
        // Named batch untouched; history recorded at medicine level
        assert_eq!(store.get_batch(&batch.id).unwrap().unwrap().quantity, 10);
        assert_eq!(store.list_transactions_for_medicine(&med.id).unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_medicine_and_batch() {
        let store = Store::open_in_memory().unwrap();
        let processor = TransactionProcessor::new(&store);
        let (med, _) = seed(&store, 10);

        let err = processor
            .apply(ApplyRequest::new("missing", TransactionType::In, 5))
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotFound(_)));

        let err = processor
            .apply(ApplyRequest::new(&med.id, TransactionType::In, 5).on_batch("missing"))
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotFound(_)));
    }

    #[test]
    fn test_batch_must_belong_to_medicine() {
        let store = Store::open_in_memory().unwrap();
        let processor = TransactionProcessor::new(&store);
        let (_, batch) = seed(&store, 10);
        let other = Medicine::new("SKU2".into(), "Insulin".into(), "Diabetes".into());
        store.insert_medicine(&other).unwrap();

        let err = processor
            .apply(ApplyRequest::new(&other.id, TransactionType::Out, 1).on_batch(&batch.id))
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }
}
