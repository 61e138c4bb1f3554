//! Alert engine: idempotent rule sweeps over ledger state.
//!
//! Every rule is a no-op when an open alert for the same entity and rule
//! already exists; re-running a sweep never duplicates. Alerts are retired
//! only by explicit acknowledgement, never by the engine.

use std::collections::HashSet;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::db::Store;
use crate::error::LedgerResult;
use crate::models::{Alert, AlertType, Severity};

/// Outcome of one sweep run. Per-entity failures are isolated; the sweep
/// continues past them and reports them here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SweepReport {
    pub created: usize,
    pub errors: Vec<String>,
}

pub struct AlertEngine<'a> {
    store: &'a Store,
    config: &'a EngineConfig,
}

impl<'a> AlertEngine<'a> {
    pub fn new(store: &'a Store, config: &'a EngineConfig) -> Self {
        Self { store, config }
    }

    /// Run every alert rule against current ledger state.
    pub fn run(&self, today: NaiveDate) -> LedgerResult<SweepReport> {
        let mut report = SweepReport::default();
        self.check_stock_levels(&mut report)?;
        self.check_expiring_batches(today, &mut report)?;
        tracing::info!(
            created = report.created,
            failed = report.errors.len(),
            "alert sweep finished"
        );
        Ok(report)
    }

    /// Low-stock / stock-out rule: raw available stock below the threshold
    /// raises one alert per medicine. Zero stock escalates the type to
    /// STOCK_OUT with critical severity.
    fn check_stock_levels(&self, report: &mut SweepReport) -> LedgerResult<()> {
        for medicine in self.store.list_active_medicines()? {
            let outcome: LedgerResult<()> = (|| {
                let stock = self.store.available_quantity(&medicine.id)?;
                if stock >= self.config.low_stock_threshold {
                    return Ok(());
                }
                // One open alert covers the whole rule; an open LOW_STOCK
                // also suppresses STOCK_OUT and vice versa
                if self
                    .store
                    .has_open_medicine_alert(AlertType::LowStock, &medicine.id)?
                    || self
                        .store
                        .has_open_medicine_alert(AlertType::StockOut, &medicine.id)?
                {
                    return Ok(());
                }

                let (alert_type, severity) = if stock == 0 {
                    (AlertType::StockOut, Severity::Critical)
                } else if stock < self.config.high_severity_threshold {
                    (AlertType::LowStock, Severity::High)
                } else {
                    (AlertType::LowStock, Severity::Medium)
                };
                let message = format!(
                    "{} ({}) has low stock: {} units remaining",
                    medicine.name, medicine.sku, stock
                );
                self.store.insert_alert(
                    &Alert::new(alert_type, message, severity).for_medicine(&medicine.id),
                )?;
                report.created += 1;
                Ok(())
            })();
            if let Err(err) = outcome {
                tracing::warn!(medicine_id = %medicine.id, error = %err, "stock rule failed");
                report.errors.push(format!("medicine {}: {}", medicine.id, err));
            }
        }
        Ok(())
    }

    /// Expiry-warning rule: one alert per in-stock, non-expired batch whose
    /// expiry falls inside the widest configured lookahead window.
    fn check_expiring_batches(&self, today: NaiveDate, report: &mut SweepReport) -> LedgerResult<()> {
        let Some(max_window) = self.config.expiry_alert_days.iter().max().copied() else {
            return Ok(());
        };
        let cutoff = today + Duration::days(max_window);
        // Overlapping windows must not double-fire within one run
        let mut seen: HashSet<String> = HashSet::new();

        for batch in self.store.list_expiring_before(cutoff)? {
            if !seen.insert(batch.id.clone()) {
                continue;
            }
            let outcome: LedgerResult<()> = (|| {
                let days = batch.days_until_expiry(today);
                if days < 0 {
                    return Ok(());
                }
                if self
                    .store
                    .has_open_batch_alert(AlertType::ExpiryWarning, &batch.id)?
                {
                    return Ok(());
                }

                let medicine = self
                    .store
                    .get_medicine(&batch.medicine_id)?
                    .ok_or_else(|| {
                        crate::error::LedgerError::not_found("medicine", &batch.medicine_id)
                    })?;
                let severity = if days <= self.config.expiry_high_severity_days {
                    Severity::High
                } else {
                    Severity::Medium
                };
                let message = format!(
                    "{} (Batch: {}) expires in {} days",
                    medicine.name, batch.batch_number, days
                );
                self.store.insert_alert(
                    &Alert::new(AlertType::ExpiryWarning, message, severity)
                        .for_batch(&batch.medicine_id, &batch.id),
                )?;
                report.created += 1;
                Ok(())
            })();
            if let Err(err) = outcome {
                tracing::warn!(batch_id = %batch.id, error = %err, "expiry rule failed");
                report.errors.push(format!("batch {}: {}", batch.id, err));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Batch, Medicine};
    use chrono::Utc;

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    fn seed(store: &Store, sku: &str, qty: i64, expiry_in_days: i64) -> (Medicine, Batch) {
        let med = Medicine::new(sku.to_string(), format!("Medicine {}", sku), "General".into());
        store.insert_medicine(&med).unwrap();
        let batch = Batch::new(
            med.id.clone(),
            "B001".into(),
            qty,
            today() + Duration::days(expiry_in_days),
        );
        store.insert_batch(&batch).unwrap();
        (med, batch)
    }

    #[test]
    fn test_low_stock_severity_ladder() {
        let store = Store::open_in_memory().unwrap();
        let config = EngineConfig::default();
        let engine = AlertEngine::new(&store, &config);

        seed(&store, "PLENTY", 100, 365);
        let (medium, _) = seed(&store, "MEDIUM", 15, 365);
        let (high, _) = seed(&store, "HIGH", 5, 365);
        let (out, mut out_batch) = seed(&store, "OUT", 1, 365);
        out_batch.quantity = 0;
        store.update_batch(&out_batch).unwrap();

        let report = engine.run(today()).unwrap();
        assert_eq!(report.created, 3);
        assert!(report.errors.is_empty());

        let alerts = store.list_open_alerts().unwrap();
        let find = |id: &str| alerts.iter().find(|a| a.medicine_id.as_deref() == Some(id)).unwrap();
        assert_eq!(find(&medium.id).severity, Severity::Medium);
        assert_eq!(find(&medium.id).alert_type, AlertType::LowStock);
        assert_eq!(find(&high.id).severity, Severity::High);
        assert_eq!(find(&out.id).severity, Severity::Critical);
        assert_eq!(find(&out.id).alert_type, AlertType::StockOut);
    }

    #[test]
    fn test_sweep_is_idempotent() {
        let store = Store::open_in_memory().unwrap();
        let config = EngineConfig::default();
        let engine = AlertEngine::new(&store, &config);
        seed(&store, "LOW", 5, 20);

        let first = engine.run(today()).unwrap();
        // Low stock plus expiry warning
        assert_eq!(first.created, 2);

        let second = engine.run(today()).unwrap();
        assert_eq!(second.created, 0);
        assert_eq!(store.list_open_alerts().unwrap().len(), 2);
    }

    #[test]
    fn test_acknowledged_alert_allows_refire() {
        let store = Store::open_in_memory().unwrap();
        let config = EngineConfig::default();
        let engine = AlertEngine::new(&store, &config);
        seed(&store, "LOW", 5, 365);

        engine.run(today()).unwrap();
        let alert = store.list_open_alerts().unwrap().remove(0);
        store.acknowledge_alert(&alert.id, "user-1").unwrap();

        // Condition still holds, so the next sweep fires again
        let report = engine.run(today()).unwrap();
        assert_eq!(report.created, 1);
    }

    #[test]
    fn test_expiry_one_alert_per_batch() {
        let store = Store::open_in_memory().unwrap();
        let config = EngineConfig::default();
        let engine = AlertEngine::new(&store, &config);

        // 25 days out: inside both the 30 and 60/90 day windows
        let (_, batch) = seed(&store, "EXP", 50, 25);

        let report = engine.run(today()).unwrap();
        assert_eq!(report.created, 1);
        let alerts = store.list_open_alerts().unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, AlertType::ExpiryWarning);
        assert_eq!(alerts[0].batch_id.as_deref(), Some(batch.id.as_str()));
        assert_eq!(alerts[0].severity, Severity::High);
    }

    #[test]
    fn test_expiry_severity_by_distance() {
        let store = Store::open_in_memory().unwrap();
        let config = EngineConfig::default();
        let engine = AlertEngine::new(&store, &config);
        let (_, far) = seed(&store, "FAR", 50, 75);

        engine.run(today()).unwrap();
        let alerts = store.list_open_alerts().unwrap();
        let alert = alerts
            .iter()
            .find(|a| a.batch_id.as_deref() == Some(far.id.as_str()))
            .unwrap();
        assert_eq!(alert.severity, Severity::Medium);
    }

    #[test]
    fn test_far_future_expiry_not_alerted() {
        let store = Store::open_in_memory().unwrap();
        let config = EngineConfig::default();
        let engine = AlertEngine::new(&store, &config);
        seed(&store, "SAFE", 100, 365);

        let report = engine.run(today()).unwrap();
        assert_eq!(report.created, 0);
    }
}
