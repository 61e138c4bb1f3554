//! Bulk-row ingestion: reconciles uploaded inventory rows against the
//! ledger. Best-effort per row, atomic per row, one outer commit.
//!
//! Each row runs inside its own SQL savepoint nested in a single outer
//! transaction: a failing row rolls back to its savepoint and is recorded
//! as an error while the rest proceed. If no row succeeds the outer
//! transaction is dropped and nothing persists.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::categorize::categorize;
use crate::db::Store;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{Batch, InventoryTransaction, Medicine, TransactionType};

const MAX_REPORTED_ERRORS: usize = 50;
const MAX_REPORTED_WARNINGS: usize = 20;

/// One parsed upload row, keyed by (SKU, batch number). File-format
/// parsing happens upstream; this is the post-parse shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestRow {
    pub sku: String,
    pub name: String,
    pub batch_number: String,
    pub quantity: i64,
    /// `YYYY-MM-DD`
    pub expiry_date: String,
    pub manufacturer: Option<String>,
    pub brand: Option<String>,
    pub mrp: Option<f64>,
    pub cost: Option<f64>,
    pub schedule: Option<String>,
    pub storage_requirements: Option<String>,
    /// `YYYY-MM-DD`
    pub purchase_date: Option<String>,
    pub purchase_price: Option<f64>,
}

/// Outcome of one ingestion run. Error and warning lists are truncated;
/// the counts always cover every affected row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    pub total_rows: usize,
    pub success_count: usize,
    pub error_count: usize,
    pub warning_count: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Reconciles upload rows into medicines, batches and ledger rows.
pub struct Ingestor<'a> {
    store: &'a Store,
}

impl<'a> Ingestor<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Ingest a parsed upload. `source` labels the audit-trail notes
    /// (typically the uploaded file name); `actor` is recorded as the
    /// transaction author. Fails without persisting anything when every
    /// row is invalid.
    pub fn ingest(
        &self,
        rows: &[IngestRow],
        source: &str,
        actor: Option<&str>,
    ) -> LedgerResult<IngestReport> {
        let today = Utc::now().date_naive();
        let outer = self.store.begin()?;

        let mut success_count = 0;
        let mut error_count = 0;
        let mut warning_count = 0;
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        for (idx, row) in rows.iter().enumerate() {
            let row_number = idx + 1;
            self.store.conn().execute_batch("SAVEPOINT ingest_row")?;
            match self.ingest_row(row, today, source, actor) {
                Ok(row_warnings) => {
                    self.store.conn().execute_batch("RELEASE ingest_row")?;
                    success_count += 1;
                    for warning in row_warnings {
                        warning_count += 1;
                        if warnings.len() < MAX_REPORTED_WARNINGS {
                            warnings.push(format!("Row {}: {}", row_number, warning));
                        }
                    }
                }
                Err(err) => {
                    self.store
                        .conn()
                        .execute_batch("ROLLBACK TO ingest_row; RELEASE ingest_row")?;
                    tracing::warn!(row = row_number, error = %err, "ingestion row failed");
                    error_count += 1;
                    if errors.len() < MAX_REPORTED_ERRORS {
                        errors.push(format!("Row {}: {}", row_number, err));
                    }
                }
            }
        }

        if success_count == 0 {
            // Outer transaction dropped uncommitted
            return Err(LedgerError::Validation(format!(
                "No valid rows to save; all {} rows had errors",
                rows.len()
            )));
        }
        outer.commit()?;

        tracing::info!(
            source,
            total = rows.len(),
            succeeded = success_count,
            failed = error_count,
            "ingestion committed"
        );
        Ok(IngestReport {
            total_rows: rows.len(),
            success_count,
            error_count,
            warning_count,
            errors,
            warnings,
        })
    }

    /// Process one row. Returns non-fatal warnings on success.
    fn ingest_row(
        &self,
        row: &IngestRow,
        today: NaiveDate,
        source: &str,
        actor: Option<&str>,
    ) -> LedgerResult<Vec<String>> {
        let sku = row.sku.trim();
        let name = row.name.trim();
        let batch_number = row.batch_number.trim();
        if sku.is_empty() {
            return Err(LedgerError::Validation("SKU is required".to_string()));
        }
        if name.is_empty() {
            return Err(LedgerError::Validation("Medicine name is required".to_string()));
        }
        if batch_number.is_empty() {
            return Err(LedgerError::Validation("Batch number is required".to_string()));
        }
        if row.quantity < 0 {
            return Err(LedgerError::Validation(format!(
                "Quantity cannot be negative: {}",
                row.quantity
            )));
        }
        let expiry_date = parse_date(&row.expiry_date, "expiry date")?;
        let purchase_date = row
            .purchase_date
            .as_deref()
            .map(|d| parse_date(d, "purchase date"))
            .transpose()?;

        let medicine = self.upsert_medicine(row, sku, name)?;
        let mut warnings = Vec::new();

        match self.store.find_batch(&medicine.id, batch_number)? {
            Some(mut batch) => {
                let old_quantity = batch.quantity;
                batch.quantity = row.quantity;
                batch.expiry_date = expiry_date;
                if purchase_date.is_some() {
                    batch.purchase_date = purchase_date;
                }
                if row.purchase_price.is_some() {
                    batch.purchase_price = row.purchase_price;
                }
                batch.refresh_expired(today);
                batch.touch();
                self.store.update_batch(&batch)?;

                if batch.is_expired {
                    warnings.push(expired_warning(batch_number, name, expiry_date));
                }
                let delta = row.quantity - old_quantity;
                if delta != 0 {
                    let txn = InventoryTransaction::new(
                        medicine.id.clone(),
                        Some(batch.id.clone()),
                        TransactionType::Adjustment,
                        delta,
                    )
                    .with_notes(Some(format!("Upload adjustment - {}", source)))
                    .with_created_by(actor.map(str::to_string));
                    self.store.insert_transaction(&txn)?;
                }
            }
            None => {
                let mut batch = Batch::new(
                    medicine.id.clone(),
                    batch_number.to_string(),
                    row.quantity,
                    expiry_date,
                );
                batch.purchase_date = purchase_date;
                batch.purchase_price = row.purchase_price;
                batch.refresh_expired(today);
                self.store.insert_batch(&batch)?;

                if batch.is_expired {
                    warnings.push(expired_warning(batch_number, name, expiry_date));
                }
                let txn = InventoryTransaction::new(
                    medicine.id.clone(),
                    Some(batch.id),
                    TransactionType::In,
                    row.quantity,
                )
                .with_notes(Some(format!("Upload - {}", source)))
                .with_created_by(actor.map(str::to_string));
                self.store.insert_transaction(&txn)?;
            }
        }
        Ok(warnings)
    }

    /// Create the medicine if the SKU is new, otherwise refresh the fields
    /// the row supplies (last-write-wins).
    fn upsert_medicine(&self, row: &IngestRow, sku: &str, name: &str) -> LedgerResult<Medicine> {
        match self.store.get_medicine_by_sku(sku)? {
            Some(mut medicine) => {
                let mut changed = false;
                if let Some(manufacturer) = non_empty(&row.manufacturer) {
                    medicine.manufacturer = Some(manufacturer.to_string());
                    changed = true;
                }
                if let Some(brand) = non_empty(&row.brand) {
                    medicine.brand = Some(brand.to_string());
                    changed = true;
                }
                if row.mrp.is_some() {
                    medicine.mrp = row.mrp;
                    changed = true;
                }
                if row.cost.is_some() {
                    medicine.cost = row.cost;
                    changed = true;
                }
                if changed {
                    medicine.touch();
                    self.store.update_medicine(&medicine)?;
                }
                Ok(medicine)
            }
            None => {
                let description = [row.manufacturer.as_deref(), row.brand.as_deref()]
                    .into_iter()
                    .flatten()
                    .collect::<Vec<_>>()
                    .join(" ");
                let category =
                    categorize(name, (!description.is_empty()).then_some(description.as_str()));
                let mut medicine =
                    Medicine::new(sku.to_string(), name.to_string(), category.to_string());
                medicine.manufacturer = non_empty(&row.manufacturer).map(str::to_string);
                medicine.brand = non_empty(&row.brand).map(str::to_string);
                medicine.mrp = row.mrp;
                medicine.cost = row.cost;
                medicine.schedule = non_empty(&row.schedule).map(str::to_string);
                medicine.storage_requirements =
                    non_empty(&row.storage_requirements).map(str::to_string);
                self.store.insert_medicine(&medicine)?;
                Ok(medicine)
            }
        }
    }
}

fn parse_date(value: &str, field: &str) -> LedgerResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| LedgerError::Validation(format!("Invalid {}: {}", field, value)))
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn expired_warning(batch_number: &str, name: &str, expiry: NaiveDate) -> String {
    format!(
        "Batch {} for {} has already expired (expiry: {})",
        batch_number, name, expiry
    )
}
