mod common;

use engine::{
    AllocateInvoiceCmd, ClientProfile, DirectSaleCmd, EngineError, LineItem, MovementKind,
    NewClientCmd, PaymentCmd, RecordMovementCmd, SaleCustomer, UpsertPendingBillCmd,
};

use common::{admin, book, client, dispatch, engine_with_db, material, today};

#[tokio::test]
async fn bill_numbers_start_at_the_seed_and_never_repeat() {
    let (engine, _db) = engine_with_db().await;

    assert_eq!(engine.peek_bill_number().await.unwrap(), "#1000");
    assert_eq!(engine.next_bill_number().await.unwrap(), "#1000");
    assert_eq!(engine.next_bill_number().await.unwrap(), "#1001");
    assert_eq!(engine.peek_bill_number().await.unwrap(), "#1002");
}

#[tokio::test]
async fn blank_codes_are_generated_and_duplicates_rejected() {
    let (engine, _db) = engine_with_db().await;

    let first = client(&engine, "Acme", "").await;
    let second = client(&engine, "Bolt", " ").await;
    assert_eq!(first.code, "tmpc-000001");
    assert_eq!(second.code, "tmpc-000002");
    assert_eq!(first.category, "General");
    assert_eq!(engine.next_client_code().await.unwrap(), "tmpc-000003");

    let err = engine
        .new_client(NewClientCmd::new("Other", "tmpc-000001"))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::DuplicateCode("tmpc-000001".to_string()));
}

#[tokio::test]
async fn clients_resolve_by_code_then_by_name() {
    let (engine, _db) = engine_with_db().await;
    let acme = client(&engine, "Acme", "C-1").await;

    let by_code = engine.resolve_client("C-1").await.unwrap().unwrap();
    let by_name = engine.resolve_client("Acme").await.unwrap().unwrap();
    assert_eq!(by_code.id, acme.id);
    assert_eq!(by_name.id, acme.id);
    assert!(engine.resolve_client("acme").await.unwrap().is_none());
}

#[tokio::test]
async fn profile_update_keeps_identity() {
    let (engine, _db) = engine_with_db().await;
    let acme = client(&engine, "Acme", "C-1").await;

    let updated = engine
        .update_client_profile(
            acme.id,
            ClientProfile {
                phone: Some("555-0100".to_string()),
                category: Some("Contractor".to_string()),
                require_manual_invoice: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.code, "C-1");
    assert_eq!(updated.name, "Acme");
    assert_eq!(updated.phone.as_deref(), Some("555-0100"));
    assert_eq!(updated.category, "Contractor");
    assert!(updated.require_manual_invoice);
}

#[tokio::test]
async fn rename_carries_code_and_name_to_every_record() {
    let (engine, _db) = engine_with_db().await;
    material(&engine, "Cement").await;

    // A movement recorded before the client had an account.
    engine
        .record_movement(
            RecordMovementCmd::new(MovementKind::In, "Cement", 5.0, today(), admin())
                .client("Acme"),
        )
        .await
        .unwrap();
    let acme = client(&engine, "Acme", "C-1").await;
    book(&engine, "C-1", "Cement", 10.0).await;
    engine
        .record_movement(dispatch("C-1", "Cement", 4.0).bill_no("B-1").pending_amount(400))
        .await
        .unwrap();

    let propagation = engine
        .rename_or_recode(acme.id, "Acme Ltd", "C-9")
        .await
        .unwrap();
    assert_eq!(propagation.pending_bills, 1);
    assert_eq!(propagation.entries_by_code, 1);
    assert_eq!(propagation.entries_by_name, 1);
    assert_eq!(propagation.bookings, 1);
    assert_eq!(propagation.invoices, 0);

    let entries = engine.entries_on(today()).await.unwrap();
    assert!(entries.iter().all(|e| e.client_code.as_deref() == Some("C-9")));
    assert!(entries.iter().all(|e| e.client.as_deref() == Some("Acme Ltd")));
    let bills = engine.pending_bills(Some("C-9"), true).await.unwrap();
    assert_eq!(bills.len(), 1);
    assert_eq!(bills[0].client_name, "Acme Ltd");
    assert!(engine.pending_bills(Some("C-1"), true).await.unwrap().is_empty());
}

#[tokio::test]
async fn recode_keeps_bookings_invoices_sales_and_payments_with_the_client() {
    let (engine, _db) = engine_with_db().await;
    material(&engine, "Cement").await;
    let acme = client(&engine, "Acme", "C-1").await;
    book(&engine, "C-1", "Cement", 10.0).await;
    engine
        .allocate_invoice(AllocateInvoiceCmd::new("C-1", 1_000, admin()).manual("#1050"))
        .await
        .unwrap();
    engine
        .add_direct_sale(
            DirectSaleCmd::new(SaleCustomer::Registered("C-1".to_string()), 500, admin())
                .item(LineItem::new("Cement", 1.0, 500))
                .paid(500),
        )
        .await
        .unwrap();
    engine
        .add_payment(PaymentCmd::new("C-1", 300, admin()))
        .await
        .unwrap();

    let propagation = engine
        .rename_or_recode(acme.id, "Acme Ltd", "C-2")
        .await
        .unwrap();
    assert_eq!(propagation.bookings, 1);
    assert_eq!(propagation.invoices, 1);
    assert_eq!(propagation.direct_sales, 1);
    assert_eq!(propagation.payments, 1);

    // The booking made under the old code still covers dispatches.
    engine
        .record_movement(dispatch("C-2", "Cement", 1.0))
        .await
        .unwrap();

    // The manual invoice still belongs to the client.
    let invoice = engine
        .allocate_invoice(AllocateInvoiceCmd::new("C-2", 1_000, admin()).manual("#1050"))
        .await
        .unwrap();
    assert_eq!(invoice.client_code, "C-2");
    assert_eq!(invoice.client_name, "Acme Ltd");
    assert_eq!(engine.client_invoices("C-2").await.unwrap().len(), 1);
    assert!(engine.client_invoices("C-1").await.unwrap().is_empty());

    let ledger = engine.client_ledger(acme.id).await.unwrap();
    assert_eq!(ledger.financial.len(), 3);
}

#[tokio::test]
async fn rename_to_a_taken_code_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    let acme = client(&engine, "Acme", "C-1").await;
    client(&engine, "Bolt", "C-2").await;

    let err = engine
        .rename_or_recode(acme.id, "Acme", "C-2")
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::DuplicateCode("C-2".to_string()));
}

#[tokio::test]
async fn transfer_moves_records_and_reclaim_takes_them_back() {
    let (engine, _db) = engine_with_db().await;
    material(&engine, "Cement").await;
    let acme = client(&engine, "Acme", "C-1").await;
    let bolt = client(&engine, "Bolt", "C-2").await;
    book(&engine, "C-1", "Cement", 10.0).await;
    engine
        .record_movement(dispatch("C-1", "Cement", 2.0).bill_no("B-1").pending_amount(200))
        .await
        .unwrap();

    let outcome = engine.transfer_client(acme.id, bolt.id).await.unwrap();
    assert_eq!(outcome.entries, 1);
    assert_eq!(outcome.pending_bills, 1);

    let acme_now = engine.client(acme.id).await.unwrap();
    assert!(!acme_now.is_active);
    assert_eq!(acme_now.transferred_to_id, Some(bolt.id));
    assert_eq!(engine.pending_bills(Some("C-2"), false).await.unwrap().len(), 1);
    assert_eq!(engine.clients(false).await.unwrap().len(), 1);
    assert_eq!(engine.clients(true).await.unwrap().len(), 2);

    let err = engine
        .record_movement(dispatch("C-1", "Cement", 1.0))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::PolicyViolation(_)));

    let err = engine.delete_client(bolt.id).await.unwrap_err();
    assert!(matches!(err, EngineError::PolicyViolation(_)));

    let back = engine.reclaim_client(acme.id).await.unwrap();
    assert_eq!(back.entries, 1);
    assert_eq!(back.pending_bills, 1);
    let acme_now = engine.client(acme.id).await.unwrap();
    assert!(acme_now.is_active);
    assert_eq!(acme_now.transferred_to_id, None);
    assert_eq!(engine.pending_bills(Some("C-1"), false).await.unwrap().len(), 1);

    engine.delete_client(bolt.id).await.unwrap();
}

#[tokio::test]
async fn transfer_to_a_missing_client_changes_nothing() {
    let (engine, _db) = engine_with_db().await;
    let acme = client(&engine, "Acme", "C-1").await;
    let missing = acme.id + 100;

    let err = engine.transfer_client(acme.id, missing).await.unwrap_err();
    assert_eq!(err, EngineError::NotFound(format!("client {missing}")));

    let acme_now = engine.client(acme.id).await.unwrap();
    assert!(acme_now.is_active);
    assert_eq!(acme_now.transferred_to_id, None);
}

#[tokio::test]
async fn transfer_redirects_earlier_merges() {
    let (engine, _db) = engine_with_db().await;
    let a = client(&engine, "A", "C-A").await;
    let b = client(&engine, "B", "C-B").await;
    let c = client(&engine, "C", "C-C").await;

    engine.transfer_client(a.id, b.id).await.unwrap();
    let outcome = engine.transfer_client(b.id, c.id).await.unwrap();
    assert_eq!(outcome.redirected_clients, 1);
    assert_eq!(engine.client(a.id).await.unwrap().transferred_to_id, Some(c.id));

    let err = engine.transfer_client(c.id, b.id).await.unwrap_err();
    assert!(matches!(err, EngineError::PolicyViolation(_)));
    let err = engine.transfer_client(c.id, c.id).await.unwrap_err();
    assert!(matches!(err, EngineError::PolicyViolation(_)));
}

#[tokio::test]
async fn receivables_need_a_known_client() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .upsert_pending_bill(UpsertPendingBillCmd::new("NOPE", "B-1", 100, admin()))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidReference(_)));
}
