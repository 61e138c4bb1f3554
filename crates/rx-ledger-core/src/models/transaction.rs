//! Inventory transaction model - the append-only audit trail.

use serde::{Deserialize, Serialize};

use super::now_timestamp;
use crate::error::LedgerError;

/// Kind of a quantity-changing operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    In,
    Out,
    Adjustment,
    Return,
    Expired,
    Damaged,
    Recalled,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::In => "in",
            TransactionType::Out => "out",
            TransactionType::Adjustment => "adjustment",
            TransactionType::Return => "return",
            TransactionType::Expired => "expired",
            TransactionType::Damaged => "damaged",
            TransactionType::Recalled => "recalled",
        }
    }

    pub fn parse(s: &str) -> Result<Self, LedgerError> {
        match s {
            "in" => Ok(TransactionType::In),
            "out" => Ok(TransactionType::Out),
            "adjustment" => Ok(TransactionType::Adjustment),
            "return" => Ok(TransactionType::Return),
            "expired" => Ok(TransactionType::Expired),
            "damaged" => Ok(TransactionType::Damaged),
            "recalled" => Ok(TransactionType::Recalled),
            other => Err(LedgerError::Validation(format!(
                "Unknown transaction type: {}",
                other
            ))),
        }
    }
}

/// One immutable row in the ledger's audit trail. Never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryTransaction {
    /// Unique identifier
    pub id: String,
    pub medicine_id: String,
    /// Batch the operation touched, if any
    pub batch_id: Option<String>,
    pub transaction_type: TransactionType,
    /// Signed effect; negative only for adjustments that decrease stock
    pub quantity: i64,
    pub unit_price: Option<f64>,
    pub notes: Option<String>,
    /// Actor reference (user id or system tag)
    pub created_by: Option<String>,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
}

impl InventoryTransaction {
    /// Create a new transaction record.
    pub fn new(
        medicine_id: String,
        batch_id: Option<String>,
        transaction_type: TransactionType,
        quantity: i64,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            medicine_id,
            batch_id,
            transaction_type,
            quantity,
            unit_price: None,
            notes: None,
            created_by: None,
            created_at: now_timestamp(),
        }
    }

    pub fn with_unit_price(mut self, unit_price: Option<f64>) -> Self {
        self.unit_price = unit_price;
        self
    }

    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes;
        self
    }

    pub fn with_created_by(mut self, actor: Option<String>) -> Self {
        self.created_by = actor;
        self
    }
}
