//! Forecast snapshot persistence.

use rusqlite::{params, Row};

use super::Store;
use crate::error::LedgerResult;
use crate::models::Forecast;

const FORECAST_COLUMNS: &str = "id, medicine_id, forecast_date, forecasted_demand, horizon_days, \
     confidence_score, reorder_point, recommended_quantity, reasoning, created_at";

impl Store {
    /// Record a forecast snapshot. Snapshots are write-once history.
    pub fn insert_forecast(&self, forecast: &Forecast) -> LedgerResult<()> {
        self.conn().execute(
            r#"
            INSERT INTO forecasts (
                id, medicine_id, forecast_date, forecasted_demand, horizon_days,
                confidence_score, reorder_point, recommended_quantity, reasoning, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                forecast.id,
                forecast.medicine_id,
                forecast.forecast_date,
                forecast.forecasted_demand,
                forecast.horizon_days,
                forecast.confidence_score,
                forecast.reorder_point,
                forecast.recommended_quantity,
                forecast.reasoning,
                forecast.created_at,
            ],
        )?;
        Ok(())
    }

    /// Forecast history for one medicine, newest first.
    pub fn list_forecasts_for_medicine(&self, medicine_id: &str) -> LedgerResult<Vec<Forecast>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {} FROM forecasts WHERE medicine_id = ? ORDER BY created_at DESC, rowid DESC",
            FORECAST_COLUMNS
        ))?;
        let rows = stmt.query_map([medicine_id], forecast_from_row)?;

        let mut forecasts = Vec::new();
        for row in rows {
            forecasts.push(row?);
        }
        Ok(forecasts)
    }
}

fn forecast_from_row(row: &Row<'_>) -> rusqlite::Result<Forecast> {
    Ok(Forecast {
        id: row.get(0)?,
        medicine_id: row.get(1)?,
        forecast_date: row.get(2)?,
        forecasted_demand: row.get(3)?,
        horizon_days: row.get(4)?,
        confidence_score: row.get(5)?,
        reorder_point: row.get(6)?,
        recommended_quantity: row.get(7)?,
        reasoning: row.get(8)?,
        created_at: row.get(9)?,
    })
}
