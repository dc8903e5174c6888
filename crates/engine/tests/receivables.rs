mod common;

use engine::{
    AllocateInvoiceCmd, EngineError, InvoiceStatus, PendingBillEdit, PendingBillRow,
    SettlementOutcome, UpsertPendingBillCmd,
};

use common::{admin, book, clerk, client, dispatch, engine_with_db, material};

fn row(code: &str, name: &str, bill_no: &str, amount: &str) -> PendingBillRow {
    PendingBillRow {
        client_code: Some(code.to_string()),
        client_name: Some(name.to_string()),
        bill_no: Some(bill_no.to_string()),
        amount: Some(amount.to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn upsert_keeps_one_bill_per_number_and_client() {
    let (engine, _db) = engine_with_db().await;
    client(&engine, "Acme", "C-1").await;

    engine
        .upsert_pending_bill(UpsertPendingBillCmd::new("C-1", "B-1", 100, admin()).reason("Opening"))
        .await
        .unwrap();
    let bill = engine
        .upsert_pending_bill(UpsertPendingBillCmd::new("C-1", "B-1", 250, admin()))
        .await
        .unwrap();
    assert_eq!(bill.amount_minor, 250);
    assert_eq!(bill.reason, "Opening");
    assert!(!bill.is_paid);
    assert_eq!(engine.pending_bills(Some("C-1"), true).await.unwrap().len(), 1);

    let bill = engine
        .upsert_pending_bill(UpsertPendingBillCmd::new("Acme", "B-1", 0, admin()))
        .await
        .unwrap();
    assert!(bill.is_paid);
    assert!(engine.pending_bills(Some("C-1"), false).await.unwrap().is_empty());

    // Bills without a number never merge.
    engine
        .upsert_pending_bill(UpsertPendingBillCmd::new("C-1", "", 10, admin()))
        .await
        .unwrap();
    engine
        .upsert_pending_bill(UpsertPendingBillCmd::new("C-1", "", 20, admin()))
        .await
        .unwrap();
    assert_eq!(engine.pending_bills(Some("C-1"), true).await.unwrap().len(), 3);
}

#[tokio::test]
async fn cash_receivables_use_the_cash_code() {
    let (engine, _db) = engine_with_db().await;

    let bill = engine
        .upsert_pending_bill(UpsertPendingBillCmd::cash("Walk-in Joe", "B-9", 300, admin()))
        .await
        .unwrap();
    assert_eq!(bill.client_code, "CASH");
    assert_eq!(bill.client_name, "Walk-in Joe");
    assert!(bill.is_cash);
}

#[tokio::test]
async fn payments_settle_oldest_bills_first() {
    let (engine, _db) = engine_with_db().await;
    client(&engine, "Acme", "C-1").await;
    let first = engine
        .upsert_pending_bill(UpsertPendingBillCmd::new("C-1", "B-1", 300, admin()))
        .await
        .unwrap();
    let second = engine
        .upsert_pending_bill(UpsertPendingBillCmd::new("C-1", "B-2", 500, admin()))
        .await
        .unwrap();

    let applications = engine.apply_payment("C-1", 400, None).await.unwrap();
    assert_eq!(applications.len(), 2);
    assert_eq!(applications[0].bill_id, first.id);
    assert_eq!(applications[0].outcome, SettlementOutcome::Paid);
    assert_eq!(applications[1].bill_id, second.id);
    assert_eq!(applications[1].applied_minor, 100);
    assert_eq!(
        applications[1].outcome,
        SettlementOutcome::Partial { remaining_minor: 400 }
    );

    let open = engine.pending_bills(Some("C-1"), false).await.unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].amount_minor, 400);

    let targeted = engine.apply_payment("C-1", 1_000, Some("B-1")).await.unwrap();
    assert!(targeted.is_empty());

    let err = engine.apply_payment("C-1", 0, None).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));
}

#[tokio::test]
async fn editing_a_bill_carries_its_dispatches_along() {
    let (engine, _db) = engine_with_db().await;
    material(&engine, "Cement").await;
    client(&engine, "Acme", "C-1").await;
    client(&engine, "Bolt", "C-2").await;
    book(&engine, "C-1", "Cement", 10.0).await;
    let entry = engine
        .record_movement(dispatch("C-1", "Cement", 2.0).bill_no("B-1").pending_amount(500))
        .await
        .unwrap();
    let bill = engine.pending_bills(Some("C-1"), false).await.unwrap().remove(0);

    let (edited, entries) = engine
        .edit_pending_bill(bill.id, PendingBillEdit::new("C-2", "B-5", 450).reason("moved"))
        .await
        .unwrap();
    assert_eq!(entries, 1);
    assert_eq!(edited.client_name, "Bolt");
    assert_eq!(edited.amount_minor, 450);
    let entry = engine.entry(entry.id).await.unwrap();
    assert_eq!(entry.bill_no.as_deref(), Some("B-5"));
    assert_eq!(entry.client_code.as_deref(), Some("C-2"));

    let err = engine
        .edit_pending_bill(bill.id, PendingBillEdit::new("NOPE", "B-5", 450))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidReference(_)));
}

#[tokio::test]
async fn an_open_bill_cannot_take_the_number_of_another_open_bill() {
    let (engine, _db) = engine_with_db().await;
    client(&engine, "Acme", "C-1").await;
    let first = engine
        .upsert_pending_bill(UpsertPendingBillCmd::new("C-1", "B-1", 100, clerk()))
        .await
        .unwrap();
    let second = engine
        .upsert_pending_bill(UpsertPendingBillCmd::new("C-1", "B-2", 200, clerk()))
        .await
        .unwrap();

    let err = engine
        .edit_pending_bill(first.id, PendingBillEdit::new("C-1", "B-2", 100))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::PolicyViolation(_)));
    let open = engine.pending_bills(Some("C-1"), false).await.unwrap();
    assert_eq!(open.len(), 2);
    assert_eq!(open[0].bill_no, "B-1");

    // Once the other bill is settled the number is free again.
    engine.toggle_paid(second.id).await.unwrap();
    let (moved, _) = engine
        .edit_pending_bill(first.id, PendingBillEdit::new("C-1", "B-2", 100))
        .await
        .unwrap();
    assert_eq!(moved.bill_no, "B-2");
    assert_eq!(engine.pending_bills(Some("C-1"), false).await.unwrap().len(), 1);
}

#[tokio::test]
async fn toggling_and_deleting_bills() {
    let (engine, _db) = engine_with_db().await;
    client(&engine, "Acme", "C-1").await;
    let bill = engine
        .upsert_pending_bill(UpsertPendingBillCmd::new("C-1", "B-1", 100, clerk()))
        .await
        .unwrap();

    assert!(engine.toggle_paid(bill.id).await.unwrap().is_paid);
    assert!(!engine.toggle_paid(bill.id).await.unwrap().is_paid);

    // Created on the business day, so a clerk may delete it.
    engine.delete_pending_bill(bill.id, &clerk()).await.unwrap();
    let err = engine.pending_bill(bill.id).await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}

#[tokio::test]
async fn manual_invoice_numbers_are_owned_by_one_client() {
    let (engine, _db) = engine_with_db().await;
    client(&engine, "Acme", "C-1").await;
    client(&engine, "Bolt", "C-2").await;

    let first = engine
        .allocate_invoice(AllocateInvoiceCmd::new("C-1", 1_000, admin()).manual("INV-1"))
        .await
        .unwrap();
    assert_eq!(first.status, InvoiceStatus::Open);

    let again = engine
        .allocate_invoice(
            AllocateInvoiceCmd::new("C-1", 1_000, admin())
                .manual("INV-1")
                .balance(0),
        )
        .await
        .unwrap();
    assert_eq!(again.id, first.id);
    assert_eq!(again.status, InvoiceStatus::Paid);

    let err = engine
        .allocate_invoice(AllocateInvoiceCmd::new("C-2", 500, admin()).manual("INV-1"))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::InvoiceNumberConflict("INV-1".to_string()));
}

#[tokio::test]
async fn taken_auto_numbers_are_skipped() {
    let (engine, _db) = engine_with_db().await;
    client(&engine, "Acme", "C-1").await;
    client(&engine, "Bolt", "C-2").await;

    engine
        .allocate_invoice(AllocateInvoiceCmd::new("C-1", 100, admin()).manual("#1000"))
        .await
        .unwrap();
    let auto = engine
        .allocate_invoice(AllocateInvoiceCmd::new("C-2", 100, admin()).balance(40))
        .await
        .unwrap();
    assert_eq!(auto.invoice_no, "#1001");
    assert!(!auto.is_manual);
    assert_eq!(auto.status, InvoiceStatus::Partial);

    let cancelled = engine.cancel_invoice(auto.id).await.unwrap();
    assert_eq!(cancelled.status, InvoiceStatus::Cancelled);
    assert_eq!(engine.client_invoices("C-2").await.unwrap().len(), 1);
}

#[tokio::test]
async fn import_cleans_rows_and_matches_clients() {
    let (engine, _db) = engine_with_db().await;
    client(&engine, "Acme", "C-1").await;

    let rows = vec![
        row("C-1", "Acme", "B-1", "1,250.50"),
        row("", "Acme", "B-2", "100"),
        row("NA", "", "B-3", "nan"),
        row("C-1", "Acme", "NO BILL", "10"),
        row("C-1", "Acme", " ", "10"),
        row("C-7", "Newco", "B-4", "75"),
    ];
    let summary = engine.import_pending_bills(rows, &admin()).await.unwrap();
    assert_eq!(summary.imported, 4);
    assert_eq!(summary.skipped, 2);
    assert_eq!(summary.clients_created, 2);

    let acme = engine.pending_bills(Some("C-1"), true).await.unwrap();
    assert_eq!(acme.len(), 2);
    assert_eq!(acme[0].amount_minor, 125_050);

    let unknown = engine.resolve_client("Unknown").await.unwrap().unwrap();
    assert!(unknown.code.starts_with("tmpc-"));
    let unknown_bills = engine.pending_bills(Some(&unknown.code), true).await.unwrap();
    assert_eq!(unknown_bills[0].amount_minor, 0);
    assert!(engine.client_by_code("C-7").await.unwrap().is_some());

    // Importing again updates in place.
    let summary = engine
        .import_pending_bills(vec![row("C-1", "Acme", "B-1", "900")], &admin())
        .await
        .unwrap();
    assert_eq!(summary.imported, 1);
    let acme = engine.pending_bills(Some("C-1"), true).await.unwrap();
    assert_eq!(acme.len(), 2);
    assert_eq!(acme[0].amount_minor, 90_000);

    let exported = engine.export_pending_bills().await.unwrap();
    assert_eq!(exported.len(), 4);
    let b1 = exported
        .iter()
        .find(|r| r.bill_no.as_deref() == Some("B-1"))
        .unwrap();
    assert_eq!(b1.amount.as_deref(), Some("900.00"));
    assert_eq!(b1.client_code.as_deref(), Some("C-1"));
}
