//! Operational alert model.

use serde::{Deserialize, Serialize};

use super::now_timestamp;
use crate::error::LedgerError;

/// Category of condition an alert reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    LowStock,
    StockOut,
    ExpiryWarning,
    DelayedDelivery,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::LowStock => "low_stock",
            AlertType::StockOut => "stock_out",
            AlertType::ExpiryWarning => "expiry_warning",
            AlertType::DelayedDelivery => "delayed_delivery",
        }
    }

    pub fn parse(s: &str) -> Result<Self, LedgerError> {
        match s {
            "low_stock" => Ok(AlertType::LowStock),
            "stock_out" => Ok(AlertType::StockOut),
            "expiry_warning" => Ok(AlertType::ExpiryWarning),
            "delayed_delivery" => Ok(AlertType::DelayedDelivery),
            other => Err(LedgerError::Validation(format!("Unknown alert type: {}", other))),
        }
    }
}

/// Alert severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    pub fn parse(s: &str) -> Result<Self, LedgerError> {
        match s {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            other => Err(LedgerError::Validation(format!("Unknown severity: {}", other))),
        }
    }
}

/// A derived alert record. Created by the alert engine, retired only by an
/// explicit human acknowledgement - never auto-closed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Alert {
    /// Unique identifier
    pub id: String,
    pub alert_type: AlertType,
    pub medicine_id: Option<String>,
    pub batch_id: Option<String>,
    pub message: String,
    pub severity: Severity,
    pub is_acknowledged: bool,
    pub acknowledged_by: Option<String>,
    pub acknowledged_at: Option<String>,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
}

impl Alert {
    /// Create a new unacknowledged alert.
    pub fn new(alert_type: AlertType, message: String, severity: Severity) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            alert_type,
            medicine_id: None,
            batch_id: None,
            message,
            severity,
            is_acknowledged: false,
            acknowledged_by: None,
            acknowledged_at: None,
            created_at: now_timestamp(),
        }
    }

    pub fn for_medicine(mut self, medicine_id: &str) -> Self {
        self.medicine_id = Some(medicine_id.to_string());
        self
    }

    pub fn for_batch(mut self, medicine_id: &str, batch_id: &str) -> Self {
        self.medicine_id = Some(medicine_id.to_string());
        self.batch_id = Some(batch_id.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
    }

    #[test]
    fn test_new_alert_is_open() {
        let alert = Alert::new(AlertType::LowStock, "low".into(), Severity::Medium)
            .for_medicine("med-1");
        assert!(!alert.is_acknowledged);
        assert_eq!(alert.medicine_id.as_deref(), Some("med-1"));
        assert!(alert.batch_id.is_none());
    }
}
