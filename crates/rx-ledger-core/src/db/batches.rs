//! Batch database operations.

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row};

use super::Store;
use crate::error::{LedgerError, LedgerResult};
use crate::models::Batch;

const BATCH_COLUMNS: &str = "id, medicine_id, batch_number, quantity, expiry_date, \
     purchase_date, purchase_price, is_expired, is_damaged, is_recalled, is_returned, \
     return_status, created_at, updated_at";

/// Lifecycle flag used to filter disposition buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispositionFlag {
    Damaged,
    Recalled,
    Returned,
}

impl DispositionFlag {
    fn column(&self) -> &'static str {
        match self {
            DispositionFlag::Damaged => "is_damaged",
            DispositionFlag::Recalled => "is_recalled",
            DispositionFlag::Returned => "is_returned",
        }
    }
}

impl Store {
    /// Insert a new batch.
    pub fn insert_batch(&self, batch: &Batch) -> LedgerResult<()> {
        self.conn().execute(
            r#"
            INSERT INTO batches (
                id, medicine_id, batch_number, quantity, expiry_date,
                purchase_date, purchase_price, is_expired, is_damaged,
                is_recalled, is_returned, return_status, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
            params![
                batch.id,
                batch.medicine_id,
                batch.batch_number,
                batch.quantity,
                batch.expiry_date.to_string(),
                batch.purchase_date.map(|d| d.to_string()),
                batch.purchase_price,
                batch.is_expired,
                batch.is_damaged,
                batch.is_recalled,
                batch.is_returned,
                batch.return_status,
                batch.created_at,
                batch.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Overwrite a batch's mutable fields.
    pub fn update_batch(&self, batch: &Batch) -> LedgerResult<bool> {
        let rows_affected = self.conn().execute(
            r#"
            UPDATE batches SET
                quantity = ?2, expiry_date = ?3, purchase_date = ?4,
                purchase_price = ?5, is_expired = ?6, is_damaged = ?7,
                is_recalled = ?8, is_returned = ?9, return_status = ?10,
                updated_at = ?11
            WHERE id = ?1
            "#,
            params![
                batch.id,
                batch.quantity,
                batch.expiry_date.to_string(),
                batch.purchase_date.map(|d| d.to_string()),
                batch.purchase_price,
                batch.is_expired,
                batch.is_damaged,
                batch.is_recalled,
                batch.is_returned,
                batch.return_status,
                batch.updated_at,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a batch by ID.
    pub fn get_batch(&self, id: &str) -> LedgerResult<Option<Batch>> {
        self.conn()
            .query_row(
                &format!("SELECT {} FROM batches WHERE id = ?", BATCH_COLUMNS),
                [id],
                batch_row,
            )
            .optional()?
            .map(Batch::try_from)
            .transpose()
    }

    /// Find a batch by its (medicine, batch number) identity.
    pub fn find_batch(&self, medicine_id: &str, batch_number: &str) -> LedgerResult<Option<Batch>> {
        self.conn()
            .query_row(
                &format!(
                    "SELECT {} FROM batches WHERE medicine_id = ?1 AND batch_number = ?2",
                    BATCH_COLUMNS
                ),
                params![medicine_id, batch_number],
                batch_row,
            )
            .optional()?
            .map(Batch::try_from)
            .transpose()
    }

    /// List all batches for a medicine, soonest expiry first.
    pub fn list_batches_for_medicine(&self, medicine_id: &str) -> LedgerResult<Vec<Batch>> {
        self.collect_batches(
            &format!(
                "SELECT {} FROM batches WHERE medicine_id = ? ORDER BY expiry_date",
                BATCH_COLUMNS
            ),
            params![medicine_id],
        )
    }

    /// Batches counting toward raw available stock, in FEFO order: soonest
    /// expiry first, ties broken by batch creation order.
    pub fn list_available_batches(&self, medicine_id: &str) -> LedgerResult<Vec<Batch>> {
        self.collect_batches(
            &format!(
                "SELECT {} FROM batches
                 WHERE medicine_id = ? AND quantity > 0 AND is_expired = 0
                 ORDER BY expiry_date ASC, created_at ASC, rowid ASC",
                BATCH_COLUMNS
            ),
            params![medicine_id],
        )
    }

    /// Non-expired, in-stock batches whose expiry falls on or before `cutoff`.
    pub fn list_expiring_before(&self, cutoff: NaiveDate) -> LedgerResult<Vec<Batch>> {
        self.collect_batches(
            &format!(
                "SELECT {} FROM batches
                 WHERE is_expired = 0 AND quantity > 0 AND expiry_date <= ?
                 ORDER BY expiry_date",
                BATCH_COLUMNS
            ),
            params![cutoff.to_string()],
        )
    }

    /// Count of non-expired, in-stock batches expiring on or before `cutoff`.
    pub fn count_expiring_before(&self, cutoff: NaiveDate) -> LedgerResult<i64> {
        let count = self.conn().query_row(
            "SELECT COUNT(*) FROM batches
             WHERE is_expired = 0 AND quantity > 0 AND expiry_date <= ?",
            params![cutoff.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Expired batches whose expiry date falls inside the window.
    pub fn list_expired_in_window(&self, start: NaiveDate, end: NaiveDate) -> LedgerResult<Vec<Batch>> {
        self.collect_batches(
            &format!(
                "SELECT {} FROM batches
                 WHERE is_expired = 1 AND expiry_date >= ?1 AND expiry_date <= ?2",
                BATCH_COLUMNS
            ),
            params![start.to_string(), end.to_string()],
        )
    }

    /// Batches carrying the given lifecycle flag, last-updated inside the
    /// timestamp window `[start_ts, end_ts)`.
    pub fn list_flagged_in_window(
        &self,
        flag: DispositionFlag,
        start_ts: &str,
        end_ts: &str,
    ) -> LedgerResult<Vec<Batch>> {
        self.collect_batches(
            &format!(
                "SELECT {} FROM batches
                 WHERE {} = 1 AND updated_at >= ?1 AND updated_at < ?2",
                BATCH_COLUMNS,
                flag.column()
            ),
            params![start_ts, end_ts],
        )
    }

    /// Batches flagged expired, damaged or recalled, last-updated inside the
    /// timestamp window `[start_ts, end_ts)`.
    pub fn list_wasted_in_window(&self, start_ts: &str, end_ts: &str) -> LedgerResult<Vec<Batch>> {
        self.collect_batches(
            &format!(
                "SELECT {} FROM batches
                 WHERE (is_expired = 1 OR is_damaged = 1 OR is_recalled = 1)
                   AND updated_at >= ?1 AND updated_at < ?2",
                BATCH_COLUMNS
            ),
            params![start_ts, end_ts],
        )
    }

    /// Total raw available quantity for a medicine (nonzero, non-expired).
    pub fn available_quantity(&self, medicine_id: &str) -> LedgerResult<i64> {
        let total = self.conn().query_row(
            "SELECT COALESCE(SUM(quantity), 0) FROM batches
             WHERE medicine_id = ? AND quantity > 0 AND is_expired = 0",
            [medicine_id],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    /// Sellable quantity for a medicine (also excludes damaged/recalled).
    pub fn sellable_quantity(&self, medicine_id: &str) -> LedgerResult<i64> {
        let total = self.conn().query_row(
            "SELECT COALESCE(SUM(quantity), 0) FROM batches
             WHERE medicine_id = ? AND quantity > 0 AND is_expired = 0
               AND is_damaged = 0 AND is_recalled = 0",
            [medicine_id],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    /// MRP value of all sellable stock across the ledger.
    pub fn sellable_stock_value(&self) -> LedgerResult<f64> {
        let value = self.conn().query_row(
            "SELECT COALESCE(SUM(b.quantity * COALESCE(m.mrp, 0)), 0.0)
             FROM batches b
             JOIN medicines m ON m.id = b.medicine_id
             WHERE b.quantity > 0 AND b.is_expired = 0
               AND b.is_damaged = 0 AND b.is_recalled = 0",
            [],
            |row| row.get(0),
        )?;
        Ok(value)
    }

    fn collect_batches<P: rusqlite::Params>(&self, sql: &str, params: P) -> LedgerResult<Vec<Batch>> {
        let mut stmt = self.conn().prepare(sql)?;
        let rows = stmt.query_map(params, batch_row)?;

        let mut batches = Vec::new();
        for row in rows {
            batches.push(row?.try_into()?);
        }
        Ok(batches)
    }
}

/// Intermediate row struct for database mapping.
struct BatchRow {
    id: String,
    medicine_id: String,
    batch_number: String,
    quantity: i64,
    expiry_date: String,
    purchase_date: Option<String>,
    purchase_price: Option<f64>,
    is_expired: bool,
    is_damaged: bool,
    is_recalled: bool,
    is_returned: bool,
    return_status: Option<String>,
    created_at: String,
    updated_at: String,
}

fn batch_row(row: &Row<'_>) -> rusqlite::Result<BatchRow> {
    Ok(BatchRow {
        id: row.get(0)?,
        medicine_id: row.get(1)?,
        batch_number: row.get(2)?,
        quantity: row.get(3)?,
        expiry_date: row.get(4)?,
        purchase_date: row.get(5)?,
        purchase_price: row.get(6)?,
        is_expired: row.get(7)?,
        is_damaged: row.get(8)?,
        is_recalled: row.get(9)?,
        is_returned: row.get(10)?,
        return_status: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

impl TryFrom<BatchRow> for Batch {
    type Error = LedgerError;

    fn try_from(row: BatchRow) -> Result<Self, Self::Error> {
        Ok(Batch {
            id: row.id,
            medicine_id: row.medicine_id,
            batch_number: row.batch_number,
            quantity: row.quantity,
            expiry_date: parse_date(&row.expiry_date)?,
            purchase_date: row.purchase_date.as_deref().map(parse_date).transpose()?,
            purchase_price: row.purchase_price,
            is_expired: row.is_expired,
            is_damaged: row.is_damaged,
            is_recalled: row.is_recalled,
            is_returned: row.is_returned,
            return_status: row.return_status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, LedgerError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| LedgerError::Validation(format!("Invalid stored date '{}': {}", s, e)))
}
