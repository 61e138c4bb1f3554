//! Rx-Ledger Core Library
//!
//! Batch-level pharmacy inventory ledger with an append-only audit trail
//! and deterministic decision engines (alerts, forecasting, waste).
//!
//! # Architecture
//!
//! ```text
//! Upload rows ──► Ingestor ───────────┐
//!                                     │
//! Manual ops ──► Transaction Processor│
//!                                     │
//!                       ┌─────────────▼─────────────┐
//!                       │       Ledger Store        │
//!                       │  medicines / batches /    │
//!                       │  append-only transactions │
//!                       └─────────────┬─────────────┘
//!                                     │ reads only
//!                   ┌─────────────────┼──────────────────┐
//!                   ▼                 ▼                  ▼
//!              Alert Engine     Forecast Engine    Waste Analytics
//!            (idempotent rule   (demand heuristic  (disposition value
//!                sweeps)         + reorder lists)    and rate metrics)
//! ```
//!
//! # Core Principle
//!
//! **The transaction log is the audit trail.** Every quantity change commits
//! atomically with exactly one immutable ledger row; derived records (alerts,
//! forecasts) never feed back into inventory state.
//!
//! # Modules
//!
//! - [`db`]: SQLite ledger store
//! - [`models`]: Domain types (Medicine, Batch, InventoryTransaction, Alert, Forecast)
//! - [`stock`]: Raw/sellable stock views and FEFO ordering
//! - [`processor`]: Atomic single-operation apply
//! - [`ingest`]: Bulk-row upload reconciliation
//! - [`alerts`]: Idempotent alert sweeps
//! - [`forecast`]: Demand forecasting and reorder suggestions
//! - [`waste`]: Waste analytics
//! - [`categorize`]: Keyword-based medicine categorization
//! - [`dashboard`]: Display-only summary figures

pub mod alerts;
pub mod categorize;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod forecast;
pub mod ingest;
pub mod models;
pub mod processor;
pub mod stock;
pub mod waste;

// Re-export commonly used types
pub use alerts::{AlertEngine, SweepReport};
pub use config::EngineConfig;
pub use dashboard::{Dashboard, DashboardStats};
pub use db::{AlertFilter, AlertStats, DispositionFlag, OutflowStats, Store};
pub use error::{LedgerError, LedgerResult};
pub use forecast::{ForecastEngine, ReorderSuggestion};
pub use ingest::{IngestReport, IngestRow, Ingestor};
pub use models::{
    Alert, AlertType, Batch, DemandForecast, Forecast, InventoryTransaction, Medicine,
    ReorderPriority, Severity, TransactionType,
};
pub use processor::{ApplyRequest, TransactionProcessor};
pub use stock::{StockAccessor, StockLevel};
pub use waste::{WasteAnalytics, WasteSummary};
