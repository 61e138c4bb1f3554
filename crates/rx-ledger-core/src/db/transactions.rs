//! Inventory transaction database operations (append-only).

use rusqlite::{params, Row};

use super::Store;
use crate::error::LedgerResult;
use crate::models::{InventoryTransaction, TransactionType};

const TXN_COLUMNS: &str = "id, medicine_id, batch_id, transaction_type, quantity, \
     unit_price, notes, created_by, created_at";

/// Aggregate of OUT-type history used by the forecast engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutflowStats {
    /// Total units moved out
    pub total_quantity: i64,
    /// Number of OUT transactions
    pub transaction_count: i64,
}

impl Store {
    /// Append a transaction row. Rows are immutable once written.
    pub fn insert_transaction(&self, txn: &InventoryTransaction) -> LedgerResult<()> {
        self.conn().execute(
            r#"
            INSERT INTO inventory_transactions (
                id, medicine_id, batch_id, transaction_type, quantity,
                unit_price, notes, created_by, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                txn.id,
                txn.medicine_id,
                txn.batch_id,
                txn.transaction_type.as_str(),
                txn.quantity,
                txn.unit_price,
                txn.notes,
                txn.created_by,
                txn.created_at,
            ],
        )?;
        Ok(())
    }

    /// List all transactions for a medicine, newest first.
    pub fn list_transactions_for_medicine(
        &self,
        medicine_id: &str,
    ) -> LedgerResult<Vec<InventoryTransaction>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {} FROM inventory_transactions
             WHERE medicine_id = ?
             ORDER BY created_at DESC, rowid DESC",
            TXN_COLUMNS
        ))?;
        let rows = stmt.query_map([medicine_id], txn_row)?;

        let mut txns = Vec::new();
        for row in rows {
            txns.push(row?.try_into()?);
        }
        Ok(txns)
    }

    /// List all transactions for a batch, newest first.
    pub fn list_transactions_for_batch(
        &self,
        batch_id: &str,
    ) -> LedgerResult<Vec<InventoryTransaction>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {} FROM inventory_transactions
             WHERE batch_id = ?
             ORDER BY created_at DESC, rowid DESC",
            TXN_COLUMNS
        ))?;
        let rows = stmt.query_map([batch_id], txn_row)?;

        let mut txns = Vec::new();
        for row in rows {
            txns.push(row?.try_into()?);
        }
        Ok(txns)
    }

    /// Sum and count of OUT transactions for a medicine created at or after
    /// the cutoff timestamp.
    pub fn outflow_since(&self, medicine_id: &str, cutoff_ts: &str) -> LedgerResult<OutflowStats> {
        let stats = self.conn().query_row(
            "SELECT COALESCE(SUM(quantity), 0), COUNT(*)
             FROM inventory_transactions
             WHERE medicine_id = ?1 AND transaction_type = 'out' AND created_at >= ?2",
            params![medicine_id, cutoff_ts],
            |row| {
                Ok(OutflowStats {
                    total_quantity: row.get(0)?,
                    transaction_count: row.get(1)?,
                })
            },
        )?;
        Ok(stats)
    }
}

/// Intermediate row struct for database mapping.
struct TxnRow {
    id: String,
    medicine_id: String,
    batch_id: Option<String>,
    transaction_type: String,
    quantity: i64,
    unit_price: Option<f64>,
    notes: Option<String>,
    created_by: Option<String>,
    created_at: String,
}

fn txn_row(row: &Row<'_>) -> rusqlite::Result<TxnRow> {
    Ok(TxnRow {
        id: row.get(0)?,
        medicine_id: row.get(1)?,
        batch_id: row.get(2)?,
        transaction_type: row.get(3)?,
        quantity: row.get(4)?,
        unit_price: row.get(5)?,
        notes: row.get(6)?,
        created_by: row.get(7)?,
        created_at: row.get(8)?,
    })
}

impl TryFrom<TxnRow> for InventoryTransaction {
    type Error = crate::error::LedgerError;

    fn try_from(row: TxnRow) -> Result<Self, Self::Error> {
        Ok(InventoryTransaction {
            id: row.id,
            medicine_id: row.medicine_id,
            batch_id: row.batch_id,
            transaction_type: TransactionType::parse(&row.transaction_type)?,
            quantity: row.quantity,
            unit_price: row.unit_price,
            notes: row.notes,
            created_by: row.created_by,
            created_at: row.created_at,
        })
    }
}
