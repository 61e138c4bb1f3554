//! Alert database operations.

use rusqlite::{params, OptionalExtension, Row, ToSql};

use super::Store;
use crate::error::LedgerResult;
use crate::models::{now_timestamp, Alert, AlertType, Severity};

const ALERT_COLUMNS: &str = "id, alert_type, medicine_id, batch_id, message, severity, \
     is_acknowledged, acknowledged_by, acknowledged_at, created_at";

/// Filters for alert listing. All fields optional; unset fields match all.
#[derive(Debug, Clone, Default)]
pub struct AlertFilter {
    pub alert_type: Option<AlertType>,
    pub acknowledged: Option<bool>,
    pub severity: Option<Severity>,
}

/// Alert counts for the stats endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertStats {
    pub total: i64,
    pub unacknowledged: i64,
    pub by_type: Vec<(String, i64)>,
    pub by_severity: Vec<(String, i64)>,
}

impl Store {
    /// Insert a new alert.
    pub fn insert_alert(&self, alert: &Alert) -> LedgerResult<()> {
        self.conn().execute(
            r#"
            INSERT INTO alerts (
                id, alert_type, medicine_id, batch_id, message, severity,
                is_acknowledged, acknowledged_by, acknowledged_at, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                alert.id,
                alert.alert_type.as_str(),
                alert.medicine_id,
                alert.batch_id,
                alert.message,
                alert.severity.as_str(),
                alert.is_acknowledged,
                alert.acknowledged_by,
                alert.acknowledged_at,
                alert.created_at,
            ],
        )?;
        Ok(())
    }

    /// Get an alert by ID.
    pub fn get_alert(&self, id: &str) -> LedgerResult<Option<Alert>> {
        self.conn()
            .query_row(
                &format!("SELECT {} FROM alerts WHERE id = ?", ALERT_COLUMNS),
                [id],
                alert_row,
            )
            .optional()?
            .map(Alert::try_from)
            .transpose()
    }

    /// Is there an open (unacknowledged) alert of this type for a medicine?
    pub fn has_open_medicine_alert(&self, alert_type: AlertType, medicine_id: &str) -> LedgerResult<bool> {
        let exists = self.conn().query_row(
            "SELECT EXISTS(
                SELECT 1 FROM alerts
                WHERE alert_type = ?1 AND medicine_id = ?2 AND is_acknowledged = 0
            )",
            params![alert_type.as_str(), medicine_id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Is there an open (unacknowledged) alert of this type for a batch?
    pub fn has_open_batch_alert(&self, alert_type: AlertType, batch_id: &str) -> LedgerResult<bool> {
        let exists = self.conn().query_row(
            "SELECT EXISTS(
                SELECT 1 FROM alerts
                WHERE alert_type = ?1 AND batch_id = ?2 AND is_acknowledged = 0
            )",
            params![alert_type.as_str(), batch_id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Acknowledge an alert, recording actor and timestamp exactly once.
    /// Returns `false` without writing when the alert is already
    /// acknowledged (re-acknowledgement is a no-op).
    pub fn acknowledge_alert(&self, id: &str, actor: &str) -> LedgerResult<bool> {
        let rows_affected = self.conn().execute(
            "UPDATE alerts
             SET is_acknowledged = 1, acknowledged_by = ?2, acknowledged_at = ?3
             WHERE id = ?1 AND is_acknowledged = 0",
            params![id, actor, now_timestamp()],
        )?;
        Ok(rows_affected > 0)
    }

    /// List alerts matching the filter, newest first, capped at 100 rows.
    pub fn list_alerts(&self, filter: &AlertFilter) -> LedgerResult<Vec<Alert>> {
        let mut sql = format!("SELECT {} FROM alerts WHERE 1=1", ALERT_COLUMNS);
        let mut binds: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(ty) = filter.alert_type {
            sql.push_str(" AND alert_type = ?");
            binds.push(Box::new(ty.as_str()));
        }
        if let Some(ack) = filter.acknowledged {
            sql.push_str(" AND is_acknowledged = ?");
            binds.push(Box::new(ack));
        }
        if let Some(sev) = filter.severity {
            sql.push_str(" AND severity = ?");
            binds.push(Box::new(sev.as_str()));
        }
        sql.push_str(" ORDER BY created_at DESC, rowid DESC LIMIT 100");

        let mut stmt = self.conn().prepare(&sql)?;
        let params: Vec<&dyn ToSql> = binds.iter().map(|b| b.as_ref()).collect();
        let rows = stmt.query_map(params.as_slice(), alert_row)?;

        let mut alerts = Vec::new();
        for row in rows {
            alerts.push(row?.try_into()?);
        }
        Ok(alerts)
    }

    /// List all open alerts, newest first.
    pub fn list_open_alerts(&self) -> LedgerResult<Vec<Alert>> {
        self.list_alerts(&AlertFilter {
            acknowledged: Some(false),
            ..AlertFilter::default()
        })
    }

    /// Count of open alerts.
    pub fn count_open_alerts(&self) -> LedgerResult<i64> {
        let count = self.conn().query_row(
            "SELECT COUNT(*) FROM alerts WHERE is_acknowledged = 0",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Totals plus per-type and per-severity counts.
    pub fn alert_stats(&self) -> LedgerResult<AlertStats> {
        let (total, unacknowledged) = self.conn().query_row(
            "SELECT COUNT(*), COALESCE(SUM(is_acknowledged = 0), 0) FROM alerts",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let by_type = self.count_grouped("alert_type")?;
        let by_severity = self.count_grouped("severity")?;

        Ok(AlertStats {
            total,
            unacknowledged,
            by_type,
            by_severity,
        })
    }

    fn count_grouped(&self, column: &str) -> LedgerResult<Vec<(String, i64)>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {col}, COUNT(*) FROM alerts GROUP BY {col} ORDER BY {col}",
            col = column
        ))?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;

        let mut counts = Vec::new();
        for row in rows {
            counts.push(row?);
        }
        Ok(counts)
    }
}

/// Intermediate row struct for database mapping.
struct AlertRow {
    id: String,
    alert_type: String,
    medicine_id: Option<String>,
    batch_id: Option<String>,
    message: String,
    severity: String,
    is_acknowledged: bool,
    acknowledged_by: Option<String>,
    acknowledged_at: Option<String>,
    created_at: String,
}

fn alert_row(row: &Row<'_>) -> rusqlite::Result<AlertRow> {
    Ok(AlertRow {
        id: row.get(0)?,
        alert_type: row.get(1)?,
        medicine_id: row.get(2)?,
        batch_id: row.get(3)?,
        message: row.get(4)?,
        severity: row.get(5)?,
        is_acknowledged: row.get(6)?,
        acknowledged_by: row.get(7)?,
        acknowledged_at: row.get(8)?,
        created_at: row.get(9)?,
    })
}

impl TryFrom<AlertRow> for Alert {
    type Error = crate::error::LedgerError;

    fn try_from(row: AlertRow) -> Result<Self, Self::Error> {
        Ok(Alert {
            id: row.id,
            alert_type: AlertType::parse(&row.alert_type)?,
            medicine_id: row.medicine_id,
            batch_id: row.batch_id,
            message: row.message,
            severity: Severity::parse(&row.severity)?,
            is_acknowledged: row.is_acknowledged,
            acknowledged_by: row.acknowledged_by,
            acknowledged_at: row.acknowledged_at,
            created_at: row.created_at,
        })
    }
}
