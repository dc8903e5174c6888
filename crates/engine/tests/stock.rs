mod common;

use engine::{
    ClientProfile, EditMovementCmd, EngineError, MaterialUpdate, MovementKind, RecordMovementCmd,
    UpsertPendingBillCmd,
};

use common::{
    admin, book, clerk, client, dispatch, engine_with_db, material, receive, today, yesterday,
};

#[tokio::test]
async fn dispatch_needs_a_booking_for_the_material() {
    let (engine, _db) = engine_with_db().await;
    material(&engine, "Cement").await;
    material(&engine, "Sand").await;
    client(&engine, "Acme", "C-1").await;
    book(&engine, "C-1", "Sand", 3.0).await;

    let err = engine
        .record_movement(dispatch("C-1", "Cement", 1.0))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::PolicyViolation("no booking found for this client and material".to_string())
    );

    let entry = engine
        .record_movement(dispatch("Acme", "Sand", 1.0))
        .await
        .unwrap();
    assert_eq!(entry.kind, MovementKind::Out);
    assert_eq!(entry.client_code.as_deref(), Some("C-1"));
    assert_eq!(entry.client_category.as_deref(), Some("General"));
}

#[tokio::test]
async fn dispatch_to_an_unregistered_client_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    material(&engine, "Cement").await;

    let err = engine
        .record_movement(dispatch("Walk-in", "Cement", 1.0))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::PolicyViolation(_)));

    let err = engine
        .record_movement(dispatch("Walk-in", "Gravel", 1.0))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidReference(_)));

    assert!(engine.entries_on(today()).await.unwrap().is_empty());
}

#[tokio::test]
async fn quantities_must_be_positive() {
    let (engine, _db) = engine_with_db().await;
    material(&engine, "Cement").await;

    for qty in [0.0, -1.0, f64::NAN] {
        let err = engine
            .record_movement(RecordMovementCmd::new(
                MovementKind::In,
                "Cement",
                qty,
                today(),
                admin(),
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }
}

#[tokio::test]
async fn manual_invoice_clients_need_a_bill_number() {
    let (engine, _db) = engine_with_db().await;
    material(&engine, "Cement").await;
    let acme = client(&engine, "Acme", "C-1").await;
    engine
        .update_client_profile(
            acme.id,
            ClientProfile {
                require_manual_invoice: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    book(&engine, "C-1", "Cement", 10.0).await;

    let err = engine
        .record_movement(dispatch("C-1", "Cement", 1.0))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::PolicyViolation(_)));

    let entry = engine
        .record_movement(dispatch("C-1", "Cement", 1.0).bill_no("M-7"))
        .await
        .unwrap();
    assert_eq!(entry.bill_no.as_deref(), Some("M-7"));
    let invoice = engine.invoice(entry.invoice_id.unwrap()).await.unwrap();
    assert_eq!(invoice.invoice_no, "M-7");
    assert!(invoice.is_manual);
    assert_eq!(invoice.client_code, "C-1");

    // Without a number the dispatch may still go out with an issued invoice.
    let entry = engine
        .record_movement(dispatch("C-1", "Cement", 1.0).create_invoice(true))
        .await
        .unwrap();
    let invoice = engine.invoice(entry.invoice_id.unwrap()).await.unwrap();
    assert!(!invoice.is_manual);
    assert_eq!(entry.bill_no, Some(invoice.invoice_no));
}

#[tokio::test]
async fn manual_invoice_number_of_another_client_conflicts() {
    let (engine, _db) = engine_with_db().await;
    material(&engine, "Cement").await;
    client(&engine, "Acme", "C-1").await;
    client(&engine, "Bolt", "C-2").await;
    book(&engine, "C-1", "Cement", 10.0).await;
    book(&engine, "C-2", "Cement", 10.0).await;

    engine
        .record_movement(dispatch("C-1", "Cement", 1.0).bill_no("INV-1").create_invoice(true))
        .await
        .unwrap();
    let err = engine
        .record_movement(dispatch("C-2", "Cement", 1.0).bill_no("INV-1").create_invoice(true))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::InvoiceNumberConflict("INV-1".to_string()));
    assert_eq!(engine.entries_on(today()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn dispatch_with_pending_amount_opens_one_receivable() {
    let (engine, _db) = engine_with_db().await;
    material(&engine, "Cement").await;
    client(&engine, "Acme", "C-1").await;
    book(&engine, "C-1", "Cement", 10.0).await;

    engine
        .record_movement(dispatch("C-1", "Cement", 2.0).bill_no("B-1").pending_amount(500))
        .await
        .unwrap();
    engine
        .record_movement(dispatch("C-1", "Cement", 3.0).bill_no("B-1").pending_amount(800))
        .await
        .unwrap();

    let bills = engine.pending_bills(Some("C-1"), false).await.unwrap();
    assert_eq!(bills.len(), 1);
    assert_eq!(bills[0].bill_no, "B-1");
    assert_eq!(bills[0].amount_minor, 800);
    assert_eq!(bills[0].reason, "Dispatch: Cement");

    let err = engine
        .record_movement(dispatch("C-1", "Cement", 1.0).pending_amount(100))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));
}

#[tokio::test]
async fn editing_a_dispatch_moves_or_drops_its_receivable() {
    let (engine, _db) = engine_with_db().await;
    material(&engine, "Cement").await;
    client(&engine, "Acme", "C-1").await;
    book(&engine, "C-1", "Cement", 10.0).await;
    let entry = engine
        .record_movement(dispatch("C-1", "Cement", 2.0).bill_no("B-1").pending_amount(500))
        .await
        .unwrap();

    let edit = engine
        .edit_movement(EditMovementCmd::new(entry.id, clerk()).bill_no("B-2").qty(4.0))
        .await
        .unwrap();
    assert_eq!(edit.pending_bills_repointed, 1);
    assert_eq!(edit.entry.qty, 4.0);
    let bills = engine.pending_bills(Some("C-1"), false).await.unwrap();
    assert_eq!(bills.len(), 1);
    assert_eq!(bills[0].bill_no, "B-2");

    let edit = engine
        .edit_movement(EditMovementCmd::new(entry.id, clerk()).clear_bill_no())
        .await
        .unwrap();
    assert_eq!(edit.pending_bills_deleted, 1);
    assert_eq!(edit.entry.bill_no, None);
    assert!(engine.pending_bills(None, true).await.unwrap().is_empty());
}

#[tokio::test]
async fn moving_a_dispatch_onto_an_open_bill_merges_the_receivables() {
    let (engine, _db) = engine_with_db().await;
    material(&engine, "Cement").await;
    client(&engine, "Acme", "C-1").await;
    book(&engine, "C-1", "Cement", 10.0).await;
    let entry = engine
        .record_movement(dispatch("C-1", "Cement", 2.0).bill_no("B-1").pending_amount(100))
        .await
        .unwrap();
    engine
        .upsert_pending_bill(UpsertPendingBillCmd::new("C-1", "B-2", 200, clerk()))
        .await
        .unwrap();

    let edit = engine
        .edit_movement(EditMovementCmd::new(entry.id, clerk()).bill_no("B-2"))
        .await
        .unwrap();
    assert_eq!(edit.pending_bills_repointed, 1);

    let bills = engine.pending_bills(Some("C-1"), true).await.unwrap();
    assert_eq!(bills.len(), 1);
    assert_eq!(bills[0].bill_no, "B-2");
    assert_eq!(bills[0].amount_minor, 300);
    assert!(!bills[0].is_paid);
}

#[tokio::test]
async fn deleting_a_dispatch_deletes_its_receivable() {
    let (engine, _db) = engine_with_db().await;
    material(&engine, "Cement").await;
    client(&engine, "Acme", "C-1").await;
    book(&engine, "C-1", "Cement", 10.0).await;
    let entry = engine
        .record_movement(dispatch("C-1", "Cement", 2.0).bill_no("B-1").pending_amount(500))
        .await
        .unwrap();

    assert_eq!(engine.delete_movement(entry.id, &clerk()).await.unwrap(), 1);
    assert!(engine.pending_bills(None, true).await.unwrap().is_empty());
    let err = engine.entry(entry.id).await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}

#[tokio::test]
async fn only_admins_touch_other_days() {
    let (engine, _db) = engine_with_db().await;
    material(&engine, "Cement").await;

    let err = engine
        .record_movement(RecordMovementCmd::new(
            MovementKind::In,
            "Cement",
            1.0,
            yesterday(),
            clerk(),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::PolicyViolation(_)));

    let old = receive(&engine, "Cement", 1.0, yesterday()).await;
    let err = engine
        .edit_movement(EditMovementCmd::new(old.id, clerk()).qty(2.0))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::PolicyViolation(_)));
    let err = engine.delete_movement(old.id, &clerk()).await.unwrap_err();
    assert!(matches!(err, EngineError::PolicyViolation(_)));

    let fresh = receive(&engine, "Cement", 1.0, today()).await;
    let err = engine
        .edit_movement(EditMovementCmd::new(fresh.id, clerk()).date(yesterday()))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::PolicyViolation(_)));

    engine
        .edit_movement(EditMovementCmd::new(old.id, admin()).qty(2.0))
        .await
        .unwrap();
    engine.delete_movement(old.id, &admin()).await.unwrap();
}

#[tokio::test]
async fn daily_summary_counts_receipts_into_opening() {
    let (engine, _db) = engine_with_db().await;
    material(&engine, "Cement").await;
    material(&engine, "Sand").await;
    client(&engine, "Acme", "C-1").await;
    book(&engine, "C-1", "Cement", 50.0).await;

    receive(&engine, "Cement", 10.0, yesterday()).await;
    receive(&engine, "Cement", 5.0, today()).await;
    engine
        .record_movement(dispatch("C-1", "Cement", 4.0))
        .await
        .unwrap();

    let summary = engine.daily_summary(today()).await.unwrap();
    assert_eq!(summary.len(), 2);
    let cement = &summary[0];
    assert_eq!(cement.material, "Cement");
    assert_eq!(cement.opening, 15.0);
    assert_eq!(cement.qty_in, 5.0);
    assert_eq!(cement.qty_out, 4.0);
    assert_eq!(cement.closing, 11.0);
    assert_eq!(summary[1].material, "Sand");
    assert_eq!(summary[1].closing, 0.0);

    let overview = engine.stock_overview().await.unwrap();
    assert_eq!(overview[0].stock, 11.0);
}

#[tokio::test]
async fn renaming_a_material_rewrites_movements() {
    let (engine, _db) = engine_with_db().await;
    let cement = material(&engine, "Cement").await;
    receive(&engine, "Cement", 3.0, today()).await;

    let (updated, renamed) = engine
        .update_material(
            cement.id,
            MaterialUpdate {
                name: "Portland Cement".to_string(),
                code: cement.code.clone(),
                unit_price_minor: 250,
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Portland Cement");
    assert_eq!(renamed, 1);
    let entries = engine.entries_on(today()).await.unwrap();
    assert_eq!(entries[0].material, "Portland Cement");
}
