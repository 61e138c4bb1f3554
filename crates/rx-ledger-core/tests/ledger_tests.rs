//! End-to-end ledger scenarios: apply, ingestion and alert interplay.

use chrono::{Duration, Utc};
use proptest::prelude::*;
use rx_ledger_core::{
    AlertEngine, AlertType, ApplyRequest, Batch, EngineConfig, IngestRow, Ingestor, LedgerError,
    Medicine, Severity, StockAccessor, Store, TransactionProcessor, TransactionType,
};

fn seed_medicine(store: &Store, sku: &str, name: &str) -> Medicine {
    let med = Medicine::new(sku.to_string(), name.to_string(), "General".to_string());
    store.insert_medicine(&med).unwrap();
    med
}

fn seed_batch(store: &Store, medicine_id: &str, number: &str, qty: i64, days_out: i64) -> Batch {
    let batch = Batch::new(
        medicine_id.to_string(),
        number.to_string(),
        qty,
        Utc::now().date_naive() + Duration::days(days_out),
    );
    store.insert_batch(&batch).unwrap();
    batch
}

#[test]
fn test_out_then_expiry_sweep_scenario() {
    let store = Store::open_in_memory().unwrap();
    let config = EngineConfig::default();
    let today = Utc::now().date_naive();

    // AMX500: one batch of 100, expiring in 45 days
    let med = seed_medicine(&store, "AMX500", "Amoxicillin 500mg");
    let batch = seed_batch(&store, &med.id, "B001", 100, 45);

    let processor = TransactionProcessor::new(&store);
    let row = processor
        .apply(ApplyRequest::new(&med.id, TransactionType::Out, 30).on_batch(&batch.id))
        .unwrap();
    assert_eq!(row.transaction_type, TransactionType::Out);
    assert_eq!(row.quantity, 30);
    assert_eq!(store.get_batch(&batch.id).unwrap().unwrap().quantity, 70);
    assert_eq!(store.list_transactions_for_batch(&batch.id).unwrap().len(), 1);

    // Expiry sweep: 45 days falls inside the 60/90 windows, above the
    // 30-day high-severity line
    let engine = AlertEngine::new(&store, &config);
    let report = engine.run(today).unwrap();
    assert_eq!(report.created, 1);
    let alerts = store.list_open_alerts().unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].alert_type, AlertType::ExpiryWarning);
    assert_eq!(alerts[0].severity, Severity::Medium);

    // Second sweep with no ledger change creates nothing
    let rerun = engine.run(today).unwrap();
    assert_eq!(rerun.created, 0);
    assert_eq!(store.list_open_alerts().unwrap().len(), 1);
}

#[test]
fn test_damaged_exceeding_is_rejected_cleanly() {
    let store = Store::open_in_memory().unwrap();
    let med = seed_medicine(&store, "IBU400", "Ibuprofen 400mg");
    let batch = seed_batch(&store, &med.id, "B001", 12, 365);

    let processor = TransactionProcessor::new(&store);
    let err = processor
        .apply(ApplyRequest::new(&med.id, TransactionType::Damaged, 20).on_batch(&batch.id))
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::ExceedsAvailable { requested: 20, available: 12 }
    ));

    let unchanged = store.get_batch(&batch.id).unwrap().unwrap();
    assert_eq!(unchanged.quantity, 12);
    assert!(!unchanged.is_damaged);
    assert!(store.list_transactions_for_batch(&batch.id).unwrap().is_empty());
}

#[test]
fn test_early_disposal_keeps_expired_flag() {
    let store = Store::open_in_memory().unwrap();
    let med = seed_medicine(&store, "AMX500", "Amoxicillin 500mg");
    // Disposed a full year before its printed expiry date
    let batch = seed_batch(&store, &med.id, "B001", 50, 365);

    let processor = TransactionProcessor::new(&store);
    let row = processor
        .apply(ApplyRequest::new(&med.id, TransactionType::Expired, 0).on_batch(&batch.id))
        .unwrap();
    assert_eq!(row.quantity, 50);

    let disposed = store.get_batch(&batch.id).unwrap().unwrap();
    assert_eq!(disposed.quantity, 0);
    assert!(disposed.is_expired);
}

#[test]
fn test_ingestion_determinism() {
    let store = Store::open_in_memory().unwrap();
    let ingestor = Ingestor::new(&store);
    let expiry = (Utc::now().date_naive() + Duration::days(180)).to_string();
    let rows = [IngestRow {
        sku: "PCM500".to_string(),
        name: "Paracetamol 500mg".to_string(),
        batch_number: "B42".to_string(),
        quantity: 200,
        expiry_date: expiry,
        ..IngestRow::default()
    }];

    ingestor.ingest(&rows, "upload.csv", Some("u1")).unwrap();
    ingestor.ingest(&rows, "upload.csv", Some("u1")).unwrap();

    let med = store.get_medicine_by_sku("PCM500").unwrap().unwrap();
    // Pain Relief via keyword categorization
    assert_eq!(med.category, "Pain Relief");

    // Identical re-upload: delta 0, so only the initial IN row exists
    let history = store.list_transactions_for_medicine(&med.id).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].transaction_type, TransactionType::In);
    assert_eq!(store.find_batch(&med.id, "B42").unwrap().unwrap().quantity, 200);
}

#[test]
fn test_ingestion_then_stock_out_alert() {
    let store = Store::open_in_memory().unwrap();
    let config = EngineConfig::default();
    let ingestor = Ingestor::new(&store);
    let expiry = (Utc::now().date_naive() + Duration::days(365)).to_string();

    ingestor
        .ingest(
            &[IngestRow {
                sku: "INS100".to_string(),
                name: "Insulin Glargine".to_string(),
                batch_number: "B1".to_string(),
                quantity: 10,
                expiry_date: expiry,
                ..IngestRow::default()
            }],
            "upload.csv",
            None,
        )
        .unwrap();

    let med = store.get_medicine_by_sku("INS100").unwrap().unwrap();
    let batch = store.find_batch(&med.id, "B1").unwrap().unwrap();
    let processor = TransactionProcessor::new(&store);
    processor
        .apply(ApplyRequest::new(&med.id, TransactionType::Out, 10).on_batch(&batch.id))
        .unwrap();

    let engine = AlertEngine::new(&store, &config);
    engine.run(Utc::now().date_naive()).unwrap();

    let alerts = store.list_open_alerts().unwrap();
    let stock_out = alerts
        .iter()
        .find(|a| a.alert_type == AlertType::StockOut)
        .expect("stock-out alert");
    assert_eq!(stock_out.severity, Severity::Critical);
    assert_eq!(stock_out.medicine_id.as_deref(), Some(med.id.as_str()));
}

#[test]
fn test_fefo_first_pick_never_underflows() {
    let store = Store::open_in_memory().unwrap();
    let config = EngineConfig::default();
    let stock = StockAccessor::new(&store, &config);
    let med = seed_medicine(&store, "AMX250", "Amoxicillin 250mg");
    seed_batch(&store, &med.id, "B1", 30, 20);
    seed_batch(&store, &med.id, "B2", 80, 60);

    let fefo = stock.fefo_order(&med.id).unwrap();
    assert_eq!(fefo[0].batch_number, "B1");
    assert!(fefo.windows(2).all(|w| w[0].expiry_date <= w[1].expiry_date));

    // Drawing within the first batch's quantity always succeeds
    let processor = TransactionProcessor::new(&store);
    processor
        .apply(
            ApplyRequest::new(&med.id, TransactionType::Out, fefo[0].quantity)
                .on_batch(&fefo[0].id),
        )
        .unwrap();
}

#[test]
fn test_medicine_delete_blocked_by_history() {
    let store = Store::open_in_memory().unwrap();
    let med = seed_medicine(&store, "AMX500", "Amoxicillin 500mg");
    let batch = seed_batch(&store, &med.id, "B001", 50, 365);

    let processor = TransactionProcessor::new(&store);
    processor
        .apply(ApplyRequest::new(&med.id, TransactionType::Out, 5).on_batch(&batch.id))
        .unwrap();

    // Transaction history holds a plain foreign key: the delete is rejected
    assert!(store.delete_medicine(&med.id).is_err());
    assert!(store.get_medicine(&med.id).unwrap().is_some());
}

proptest! {
    #[test]
    fn prop_available_stock_ignores_empty_and_expired(
        quantities in prop::collection::vec(0i64..500, 1..8),
        expired_mask in prop::collection::vec(any::<bool>(), 8),
    ) {
        let store = Store::open_in_memory().unwrap();
        let med = seed_medicine(&store, "PROP", "Prop Medicine");
        let today = Utc::now().date_naive();

        let mut expected = 0i64;
        for (i, &qty) in quantities.iter().enumerate() {
            let expired = expired_mask[i % expired_mask.len()];
            let days_out = if expired { -30 } else { 30 };
            let mut batch = Batch::new(
                med.id.clone(),
                format!("B{:03}", i),
                qty,
                today + Duration::days(days_out),
            );
            batch.refresh_expired(today);
            store.insert_batch(&batch).unwrap();
            if qty > 0 && !expired {
                expected += qty;
            }
        }
        prop_assert_eq!(store.available_quantity(&med.id).unwrap(), expected);
    }
}
