//! Medicine database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::Store;
use crate::error::LedgerResult;
use crate::models::Medicine;

const MEDICINE_COLUMNS: &str = "id, sku, name, category, manufacturer, brand, mrp, cost, \
     schedule, storage_requirements, description, is_active, created_at, updated_at";

impl Store {
    /// Insert a new medicine.
    pub fn insert_medicine(&self, medicine: &Medicine) -> LedgerResult<()> {
        self.conn().execute(
            r#"
            INSERT INTO medicines (
                id, sku, name, category, manufacturer, brand, mrp, cost,
                schedule, storage_requirements, description, is_active,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
            params![
                medicine.id,
                medicine.sku,
                medicine.name,
                medicine.category,
                medicine.manufacturer,
                medicine.brand,
                medicine.mrp,
                medicine.cost,
                medicine.schedule,
                medicine.storage_requirements,
                medicine.description,
                medicine.is_active,
                medicine.created_at,
                medicine.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Overwrite a medicine's mutable fields.
    pub fn update_medicine(&self, medicine: &Medicine) -> LedgerResult<bool> {
        let rows_affected = self.conn().execute(
            r#"
            UPDATE medicines SET
                name = ?2, category = ?3, manufacturer = ?4, brand = ?5,
                mrp = ?6, cost = ?7, schedule = ?8, storage_requirements = ?9,
                description = ?10, is_active = ?11, updated_at = ?12
            WHERE id = ?1
            "#,
            params![
                medicine.id,
                medicine.name,
                medicine.category,
                medicine.manufacturer,
                medicine.brand,
                medicine.mrp,
                medicine.cost,
                medicine.schedule,
                medicine.storage_requirements,
                medicine.description,
                medicine.is_active,
                medicine.updated_at,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a medicine by ID.
    pub fn get_medicine(&self, id: &str) -> LedgerResult<Option<Medicine>> {
        let result = self
            .conn()
            .query_row(
                &format!("SELECT {} FROM medicines WHERE id = ?", MEDICINE_COLUMNS),
                [id],
                medicine_from_row,
            )
            .optional()?;
        Ok(result)
    }

    /// Get a medicine by SKU.
    pub fn get_medicine_by_sku(&self, sku: &str) -> LedgerResult<Option<Medicine>> {
        let result = self
            .conn()
            .query_row(
                &format!("SELECT {} FROM medicines WHERE sku = ?", MEDICINE_COLUMNS),
                [sku],
                medicine_from_row,
            )
            .optional()?;
        Ok(result)
    }

    /// List all active medicines, newest first.
    pub fn list_active_medicines(&self) -> LedgerResult<Vec<Medicine>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {} FROM medicines WHERE is_active = 1 ORDER BY created_at DESC, rowid DESC",
            MEDICINE_COLUMNS
        ))?;
        let rows = stmt.query_map([], medicine_from_row)?;

        let mut medicines = Vec::new();
        for row in rows {
            medicines.push(row?);
        }
        Ok(medicines)
    }

    /// List active medicines in a category.
    pub fn list_medicines_by_category(&self, category: &str) -> LedgerResult<Vec<Medicine>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {} FROM medicines WHERE is_active = 1 AND category = ? ORDER BY name",
            MEDICINE_COLUMNS
        ))?;
        let rows = stmt.query_map([category], medicine_from_row)?;

        let mut medicines = Vec::new();
        for row in rows {
            medicines.push(row?);
        }
        Ok(medicines)
    }

    /// Count active medicines.
    pub fn count_active_medicines(&self) -> LedgerResult<i64> {
        let count = self.conn().query_row(
            "SELECT COUNT(*) FROM medicines WHERE is_active = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Delete a medicine. Batches cascade; transaction history does not, so
    /// the foreign key rejects deletion while history references it.
    pub fn delete_medicine(&self, id: &str) -> LedgerResult<bool> {
        let rows_affected = self
            .conn()
            .execute("DELETE FROM medicines WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}

fn medicine_from_row(row: &Row<'_>) -> rusqlite::Result<Medicine> {
    Ok(Medicine {
        id: row.get(0)?,
        sku: row.get(1)?,
        name: row.get(2)?,
        category: row.get(3)?,
        manufacturer: row.get(4)?,
        brand: row.get(5)?,
        mrp: row.get(6)?,
        cost: row.get(7)?,
        schedule: row.get(8)?,
        storage_requirements: row.get(9)?,
        description: row.get(10)?,
        is_active: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}
