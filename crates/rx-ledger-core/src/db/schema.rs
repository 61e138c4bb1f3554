//! SQLite schema definition.

/// Complete database schema for the inventory ledger.
///
/// Dates (`expiry_date`, `purchase_date`) are ISO `YYYY-MM-DD` text;
/// timestamps are RFC 3339 UTC text written by the library, so both compare
/// correctly as strings.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Medicines
-- ============================================================================

CREATE TABLE IF NOT EXISTS medicines (
    id TEXT PRIMARY KEY,
    sku TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    category TEXT NOT NULL DEFAULT 'General',
    manufacturer TEXT,
    brand TEXT,
    mrp REAL,
    cost REAL,
    schedule TEXT,
    storage_requirements TEXT,
    description TEXT,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_medicines_sku ON medicines(sku);
CREATE INDEX IF NOT EXISTS idx_medicines_category ON medicines(category);
CREATE INDEX IF NOT EXISTS idx_medicines_active ON medicines(is_active);

-- ============================================================================
-- Batches (owned by medicines - cascade on delete)
-- ============================================================================

CREATE TABLE IF NOT EXISTS batches (
    id TEXT PRIMARY KEY,
    medicine_id TEXT NOT NULL REFERENCES medicines(id) ON DELETE CASCADE,
    batch_number TEXT NOT NULL,
    quantity INTEGER NOT NULL DEFAULT 0 CHECK (quantity >= 0),
    expiry_date TEXT NOT NULL,
    purchase_date TEXT,
    purchase_price REAL,
    is_expired INTEGER NOT NULL DEFAULT 0,
    is_damaged INTEGER NOT NULL DEFAULT 0,
    is_recalled INTEGER NOT NULL DEFAULT 0,
    is_returned INTEGER NOT NULL DEFAULT 0,
    return_status TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE (medicine_id, batch_number)
);

CREATE INDEX IF NOT EXISTS idx_batches_medicine ON batches(medicine_id);
CREATE INDEX IF NOT EXISTS idx_batches_expiry ON batches(expiry_date);

-- ============================================================================
-- Inventory Transactions (append-only audit trail)
--
-- medicine_id is a plain foreign key: deleting a medicine with history is
-- rejected rather than silently erasing the trail.
-- ============================================================================

CREATE TABLE IF NOT EXISTS inventory_transactions (
    id TEXT PRIMARY KEY,
    medicine_id TEXT NOT NULL REFERENCES medicines(id),
    batch_id TEXT,
    transaction_type TEXT NOT NULL CHECK (transaction_type IN
        ('in', 'out', 'adjustment', 'return', 'expired', 'damaged', 'recalled')),
    quantity INTEGER NOT NULL,
    unit_price REAL,
    notes TEXT,
    created_by TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_txns_medicine ON inventory_transactions(medicine_id);
CREATE INDEX IF NOT EXISTS idx_txns_type ON inventory_transactions(transaction_type);
CREATE INDEX IF NOT EXISTS idx_txns_created ON inventory_transactions(created_at);

-- Ledger rows are immutable once written
CREATE TRIGGER IF NOT EXISTS txns_no_update BEFORE UPDATE ON inventory_transactions
BEGIN
    SELECT RAISE(ABORT, 'Inventory transactions are append-only');
END;

CREATE TRIGGER IF NOT EXISTS txns_no_delete BEFORE DELETE ON inventory_transactions
BEGIN
    SELECT RAISE(ABORT, 'Inventory transactions are append-only');
END;

-- ============================================================================
-- Alerts (derived; weakly reference medicines/batches)
-- ============================================================================

CREATE TABLE IF NOT EXISTS alerts (
    id TEXT PRIMARY KEY,
    alert_type TEXT NOT NULL CHECK (alert_type IN
        ('low_stock', 'stock_out', 'expiry_warning', 'delayed_delivery')),
    medicine_id TEXT,
    batch_id TEXT,
    message TEXT NOT NULL,
    severity TEXT NOT NULL DEFAULT 'medium' CHECK (severity IN
        ('low', 'medium', 'high', 'critical')),
    is_acknowledged INTEGER NOT NULL DEFAULT 0,
    acknowledged_by TEXT,
    acknowledged_at TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_alerts_open ON alerts(is_acknowledged, alert_type);
CREATE INDEX IF NOT EXISTS idx_alerts_medicine ON alerts(medicine_id);
CREATE INDEX IF NOT EXISTS idx_alerts_batch ON alerts(batch_id);

-- ============================================================================
-- Forecast snapshots (derived; written once per run)
-- ============================================================================

CREATE TABLE IF NOT EXISTS forecasts (
    id TEXT PRIMARY KEY,
    medicine_id TEXT NOT NULL,
    forecast_date TEXT NOT NULL,
    forecasted_demand REAL NOT NULL,
    horizon_days INTEGER NOT NULL DEFAULT 30,
    confidence_score REAL NOT NULL,
    reorder_point INTEGER NOT NULL,
    recommended_quantity INTEGER NOT NULL,
    reasoning TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_forecasts_medicine ON forecasts(medicine_id);
"#;
