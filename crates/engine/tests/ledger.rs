use std::{collections::HashSet, sync::Arc};

use chrono::NaiveDate;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use tokio::task::JoinSet;
use uuid::Uuid;

use engine::{
    AccountKind, AdvanceReturnCmd, AllocationLine, ChargeBearer, CreateInvoiceCmd,
    CreateReceiptCmd, CreateVendorPaymentCmd, Engine, EngineError, InvoicePatch, InvoiceStatus,
    MoneyCents, NewAccountCmd, NewClientCmd, NewVendorCmd, Party, PaymentTo, ProjectionKind,
    ReceiptPatch, Series, TransferCmd, TransferPatch, VendorBalance, VendorPaymentPatch,
    VendorPaymentTo,
};
use migration::MigratorTrait;

const COMPANY: &str = "acme";

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

async fn engine_with_file_db() -> (Engine, DatabaseConnection, std::path::PathBuf) {
    let root = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../target/test_dbs");
    std::fs::create_dir_all(&root).unwrap();

    let path = root.join(format!("ledger_{}.db", Uuid::new_v4()));
    let url = format!("sqlite:{}?mode=rwc", path.display());

    let db = Database::connect(&url).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();

    (engine, db, path)
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn cents(amount: i64) -> MoneyCents {
    MoneyCents::new(amount)
}

async fn cash_account(engine: &Engine, opening: i64) -> Uuid {
    engine
        .new_account(NewAccountCmd::new(COMPANY, "Cash", AccountKind::Cash).opening_balance(opening))
        .await
        .unwrap()
        .id
}

async fn client(engine: &Engine) -> Uuid {
    engine
        .new_client(NewClientCmd::new(COMPANY, "Rahim Travels"))
        .await
        .unwrap()
        .id
}

async fn vendor(engine: &Engine) -> Uuid {
    engine
        .new_vendor(NewVendorCmd::new(COMPANY, "Sky Airlines"))
        .await
        .unwrap()
        .id
}

async fn invoice(engine: &Engine, client_id: Uuid, total: i64, on: NaiveDate) -> Uuid {
    engine
        .create_invoice(CreateInvoiceCmd::new(COMPANY, client_id, total, on))
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn pay_then_delete_receipt_restores_every_balance() {
    let (engine, _db) = engine_with_db().await;
    let cash = cash_account(&engine, 0).await;
    let client_id = client(&engine).await;
    let invoice_id = invoice(&engine, client_id, 1_000, date(2026, 3, 1)).await;

    let receipt = engine
        .create_receipt(
            CreateReceiptCmd::new(
                COMPANY,
                client_id,
                cash,
                1_000,
                PaymentTo::Invoice,
                date(2026, 3, 2),
            )
            .allocate(invoice_id, 1_000),
        )
        .await
        .unwrap();
    assert_eq!(receipt.voucher_no, "MR-000001");
    assert_eq!(receipt.allocations.len(), 1);

    let paid = engine.invoice(COMPANY, invoice_id).await.unwrap();
    assert_eq!(paid.received_amount, cents(1_000));
    assert_eq!(paid.status, InvoiceStatus::Paid);
    assert_eq!(
        engine.client(COMPANY, client_id).await.unwrap().present_balance,
        MoneyCents::ZERO
    );
    assert_eq!(
        engine.account(COMPANY, cash).await.unwrap().balance,
        cents(1_000)
    );

    engine.delete_receipt(COMPANY, receipt.id).await.unwrap();

    let reopened = engine.invoice(COMPANY, invoice_id).await.unwrap();
    assert_eq!(reopened.received_amount, MoneyCents::ZERO);
    assert_eq!(reopened.status, InvoiceStatus::Due);
    let client = engine.client(COMPANY, client_id).await.unwrap();
    assert_eq!(client.present_balance, cents(-1_000));
    assert_eq!(client.due(), cents(1_000));
    assert_eq!(
        engine.account(COMPANY, cash).await.unwrap().balance,
        MoneyCents::ZERO
    );
    assert!(matches!(
        engine.money_receipt(COMPANY, receipt.id).await,
        Err(EngineError::NotFound(_))
    ));
    assert!(engine.reconcile(COMPANY).await.unwrap().is_empty());
}

#[tokio::test]
async fn exact_allocation_above_due_is_rejected_without_side_effects() {
    let (engine, _db) = engine_with_db().await;
    let cash = cash_account(&engine, 0).await;
    let client_id = client(&engine).await;
    let invoice_id = invoice(&engine, client_id, 500, date(2026, 3, 1)).await;

    let err = engine
        .create_receipt(
            CreateReceiptCmd::new(
                COMPANY,
                client_id,
                cash,
                800,
                PaymentTo::Invoice,
                date(2026, 3, 2),
            )
            .allocate(invoice_id, 600),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::AllocationExceedsDue(_)));

    let untouched = engine.invoice(COMPANY, invoice_id).await.unwrap();
    assert_eq!(untouched.received_amount, MoneyCents::ZERO);
    assert_eq!(
        engine.account(COMPANY, cash).await.unwrap().balance,
        MoneyCents::ZERO
    );
    assert_eq!(
        engine.client(COMPANY, client_id).await.unwrap().present_balance,
        cents(-500)
    );
}

#[tokio::test]
async fn allocations_above_the_receipt_pool_are_a_validation_error() {
    let (engine, _db) = engine_with_db().await;
    let cash = cash_account(&engine, 0).await;
    let client_id = client(&engine).await;
    let invoice_id = invoice(&engine, client_id, 5_000, date(2026, 3, 1)).await;

    let err = engine
        .create_receipt(
            CreateReceiptCmd::new(
                COMPANY,
                client_id,
                cash,
                1_000,
                PaymentTo::Invoice,
                date(2026, 3, 2),
            )
            .discount(100)
            .allocate(invoice_id, 950),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn overall_receipt_settles_oldest_invoice_first() {
    let (engine, _db) = engine_with_db().await;
    let cash = cash_account(&engine, 0).await;
    let client_id = client(&engine).await;
    let newer = invoice(&engine, client_id, 500, date(2026, 2, 10)).await;
    let older = invoice(&engine, client_id, 300, date(2026, 1, 5)).await;

    let receipt = engine
        .create_receipt(CreateReceiptCmd::new(
            COMPANY,
            client_id,
            cash,
            600,
            PaymentTo::Overall,
            date(2026, 2, 20),
        ))
        .await
        .unwrap();
    assert_eq!(receipt.unallocated(), MoneyCents::ZERO);

    let older = engine.invoice(COMPANY, older).await.unwrap();
    let newer = engine.invoice(COMPANY, newer).await.unwrap();
    assert_eq!(older.status, InvoiceStatus::Paid);
    assert_eq!(newer.received_amount, cents(300));
    assert_eq!(newer.status, InvoiceStatus::Partial);
    assert_eq!(
        engine.client(COMPANY, client_id).await.unwrap().present_balance,
        cents(-200)
    );

    // Overpaying leaves the remainder as client advance.
    let extra = engine
        .create_receipt(CreateReceiptCmd::new(
            COMPANY,
            client_id,
            cash,
            450,
            PaymentTo::Overall,
            date(2026, 2, 21),
        ))
        .await
        .unwrap();
    assert_eq!(extra.unallocated(), cents(250));
    let client = engine.client(COMPANY, client_id).await.unwrap();
    assert_eq!(client.advance(), cents(250));
    assert!(engine.reconcile(COMPANY).await.unwrap().is_empty());
}

#[tokio::test]
async fn adjust_receipt_clamps_each_line_to_the_remaining_due() {
    let (engine, _db) = engine_with_db().await;
    let cash = cash_account(&engine, 0).await;
    let client_id = client(&engine).await;
    let invoice_id = invoice(&engine, client_id, 400, date(2026, 3, 1)).await;

    let receipt = engine
        .create_receipt(
            CreateReceiptCmd::new(
                COMPANY,
                client_id,
                cash,
                500,
                PaymentTo::Adjust,
                date(2026, 3, 3),
            )
            .allocate(invoice_id, 450),
        )
        .await
        .unwrap();

    assert_eq!(receipt.allocations.len(), 1);
    assert_eq!(receipt.allocations[0].applied_amount, cents(400));
    assert_eq!(receipt.unallocated(), cents(100));
    assert_eq!(
        engine.invoice(COMPANY, invoice_id).await.unwrap().status,
        InvoiceStatus::Paid
    );
}

#[tokio::test]
async fn receipt_for_another_clients_invoice_is_not_found() {
    let (engine, _db) = engine_with_db().await;
    let cash = cash_account(&engine, 0).await;
    let owner = client(&engine).await;
    let other = engine
        .new_client(NewClientCmd::new(COMPANY, "Karim Tours"))
        .await
        .unwrap()
        .id;
    let invoice_id = invoice(&engine, owner, 400, date(2026, 3, 1)).await;

    let err = engine
        .create_receipt(
            CreateReceiptCmd::new(
                COMPANY,
                other,
                cash,
                400,
                PaymentTo::Invoice,
                date(2026, 3, 3),
            )
            .allocate(invoice_id, 400),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}

#[tokio::test]
async fn editing_a_receipt_reverses_then_reapplies() {
    let (engine, _db) = engine_with_db().await;
    let cash = cash_account(&engine, 0).await;
    let bank = engine
        .new_account(NewAccountCmd::new(COMPANY, "City Bank", AccountKind::Bank))
        .await
        .unwrap()
        .id;
    let client_id = client(&engine).await;
    let invoice_id = invoice(&engine, client_id, 1_000, date(2026, 3, 1)).await;

    let receipt = engine
        .create_receipt(
            CreateReceiptCmd::new(
                COMPANY,
                client_id,
                cash,
                1_000,
                PaymentTo::Invoice,
                date(2026, 3, 2),
            )
            .allocate(invoice_id, 1_000),
        )
        .await
        .unwrap();

    // The full due is freed by the reversal before the new lines are planned.
    let edited = engine
        .update_receipt(
            COMPANY,
            receipt.id,
            ReceiptPatch::new()
                .amount(600)
                .account_id(bank)
                .allocations(vec![AllocationLine {
                    invoice_id,
                    amount_minor: 600,
                }]),
        )
        .await
        .unwrap();
    assert_eq!(edited.id, receipt.id);
    assert_eq!(edited.voucher_no, receipt.voucher_no);
    assert_eq!(edited.amount, cents(600));

    let invoice = engine.invoice(COMPANY, invoice_id).await.unwrap();
    assert_eq!(invoice.received_amount, cents(600));
    assert_eq!(invoice.status, InvoiceStatus::Partial);
    assert_eq!(
        engine.account(COMPANY, cash).await.unwrap().balance,
        MoneyCents::ZERO
    );
    assert_eq!(
        engine.account(COMPANY, bank).await.unwrap().balance,
        cents(600)
    );
    assert_eq!(
        engine.client(COMPANY, client_id).await.unwrap().present_balance,
        cents(-400)
    );
    assert!(engine.reconcile(COMPANY).await.unwrap().is_empty());
}

#[tokio::test]
async fn invoice_total_cannot_drop_below_received_and_paid_invoice_cannot_be_deleted() {
    let (engine, _db) = engine_with_db().await;
    let cash = cash_account(&engine, 0).await;
    let client_id = client(&engine).await;
    let invoice_id = invoice(&engine, client_id, 1_000, date(2026, 3, 1)).await;
    engine
        .create_receipt(
            CreateReceiptCmd::new(
                COMPANY,
                client_id,
                cash,
                700,
                PaymentTo::Invoice,
                date(2026, 3, 2),
            )
            .allocate(invoice_id, 700),
        )
        .await
        .unwrap();

    let err = engine
        .update_invoice(COMPANY, invoice_id, InvoicePatch::new().net_total(500))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let raised = engine
        .update_invoice(COMPANY, invoice_id, InvoicePatch::new().net_total(1_200))
        .await
        .unwrap();
    assert_eq!(raised.status, InvoiceStatus::Partial);
    assert_eq!(
        engine.client(COMPANY, client_id).await.unwrap().present_balance,
        cents(-500)
    );

    let err = engine.delete_invoice(COMPANY, invoice_id).await.unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
    assert!(engine.reconcile(COMPANY).await.unwrap().is_empty());
}

#[tokio::test]
async fn vendor_balance_flips_between_due_and_advance() {
    let (engine, _db) = engine_with_db().await;
    let cash = cash_account(&engine, 5_000).await;
    let client_id = client(&engine).await;
    let vendor_id = vendor(&engine).await;

    let invoice = engine
        .create_invoice(
            CreateInvoiceCmd::new(COMPANY, client_id, 1_200, date(2026, 4, 1))
                .vendor_cost(vendor_id, 1_000),
        )
        .await
        .unwrap();
    let owed = engine.vendor(COMPANY, vendor_id).await.unwrap();
    assert_eq!(owed.present_balance, VendorBalance::due(cents(1_000)));

    let payment = engine
        .create_vendor_payment(CreateVendorPaymentCmd::new(
            COMPANY,
            vendor_id,
            cash,
            1_500,
            VendorPaymentTo::Overall,
            date(2026, 4, 2),
        ))
        .await
        .unwrap();
    assert_eq!(payment.voucher_no, "VP-000001");
    assert_eq!(payment.allocations.len(), 1);
    assert_eq!(payment.allocations[0].invoice_id, invoice.id);
    assert_eq!(payment.allocations[0].applied_amount, cents(1_000));

    let prepaid = engine.vendor(COMPANY, vendor_id).await.unwrap();
    assert_eq!(prepaid.present_balance, VendorBalance::advance(cents(500)));
    assert_eq!(
        engine.account(COMPANY, cash).await.unwrap().balance,
        cents(3_500)
    );

    let refund = engine
        .create_advance_return(AdvanceReturnCmd::new(
            COMPANY,
            Party::Vendor(vendor_id),
            cash,
            500,
            date(2026, 4, 3),
        ))
        .await
        .unwrap();
    assert_eq!(refund.voucher_no, "ADR-000001");

    let settled = engine.vendor(COMPANY, vendor_id).await.unwrap();
    assert_eq!(settled.present_balance.signed(), MoneyCents::ZERO);
    assert_eq!(
        engine.account(COMPANY, cash).await.unwrap().balance,
        cents(4_000)
    );
    assert!(engine.reconcile(COMPANY).await.unwrap().is_empty());
}

#[tokio::test]
async fn vendor_ait_counts_toward_the_vendor_but_not_the_account() {
    let (engine, _db) = engine_with_db().await;
    let cash = cash_account(&engine, 5_000).await;
    let client_id = client(&engine).await;
    let vendor_id = vendor(&engine).await;
    let invoice = engine
        .create_invoice(
            CreateInvoiceCmd::new(COMPANY, client_id, 1_200, date(2026, 4, 1))
                .vendor_cost(vendor_id, 1_000),
        )
        .await
        .unwrap();

    engine
        .create_vendor_payment(
            CreateVendorPaymentCmd::new(
                COMPANY,
                vendor_id,
                cash,
                980,
                VendorPaymentTo::Invoice,
                date(2026, 4, 2),
            )
            .vendor_ait(20)
            .allocate(invoice.id, 1_000),
        )
        .await
        .unwrap();

    assert_eq!(
        engine.vendor(COMPANY, vendor_id).await.unwrap().present_balance,
        VendorBalance::SETTLED
    );
    assert_eq!(
        engine.account(COMPANY, cash).await.unwrap().balance,
        cents(4_020)
    );
    let costs = engine.invoice(COMPANY, invoice.id).await.unwrap().vendor_costs;
    assert_eq!(costs[0].paid_amount, cents(1_000));

    let err = engine
        .create_vendor_payment(
            CreateVendorPaymentCmd::new(
                COMPANY,
                vendor_id,
                cash,
                10,
                VendorPaymentTo::Invoice,
                date(2026, 4, 3),
            )
            .allocate(invoice.id, 10),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::AllocationExceedsDue(_)));
}

#[tokio::test]
async fn editing_then_deleting_a_vendor_payment_restores_every_balance() {
    let (engine, _db) = engine_with_db().await;
    let cash = cash_account(&engine, 10_000).await;
    let client_id = client(&engine).await;
    let vendor_id = vendor(&engine).await;
    let invoice = engine
        .create_invoice(
            CreateInvoiceCmd::new(COMPANY, client_id, 1_000, date(2026, 4, 1))
                .vendor_cost(vendor_id, 700),
        )
        .await
        .unwrap();
    assert_eq!(
        engine.vendor(COMPANY, vendor_id).await.unwrap().present_balance,
        VendorBalance::due(cents(700))
    );

    let payment = engine
        .create_vendor_payment(
            CreateVendorPaymentCmd::new(
                COMPANY,
                vendor_id,
                cash,
                900,
                VendorPaymentTo::Invoice,
                date(2026, 4, 2),
            )
            .vendor_ait(100)
            .allocate(invoice.id, 700),
        )
        .await
        .unwrap();
    assert_eq!(payment.total_amount, cents(1_000));
    assert_eq!(
        engine.vendor(COMPANY, vendor_id).await.unwrap().present_balance,
        VendorBalance::advance(cents(300))
    );
    assert_eq!(
        engine.account(COMPANY, cash).await.unwrap().balance,
        cents(9_100)
    );

    let edited = engine
        .update_vendor_payment(COMPANY, payment.id, VendorPaymentPatch::new().amount(650))
        .await
        .unwrap();
    assert_eq!(edited.voucher_no, payment.voucher_no);
    assert_eq!(edited.total_amount, cents(750));
    assert_eq!(edited.allocations.len(), 1);
    assert_eq!(edited.allocations[0].applied_amount, cents(700));
    assert_eq!(
        engine.vendor(COMPANY, vendor_id).await.unwrap().present_balance,
        VendorBalance::advance(cents(50))
    );
    assert_eq!(
        engine.account(COMPANY, cash).await.unwrap().balance,
        cents(9_350)
    );
    assert!(engine.reconcile(COMPANY).await.unwrap().is_empty());

    engine
        .delete_vendor_payment(COMPANY, payment.id)
        .await
        .unwrap();

    assert_eq!(
        engine.vendor(COMPANY, vendor_id).await.unwrap().present_balance,
        VendorBalance::due(cents(700))
    );
    assert_eq!(
        engine.account(COMPANY, cash).await.unwrap().balance,
        cents(10_000)
    );
    let costs = engine.invoice(COMPANY, invoice.id).await.unwrap().vendor_costs;
    assert_eq!(costs[0].paid_amount, MoneyCents::ZERO);
    assert!(matches!(
        engine.vendor_payment(COMPANY, payment.id).await,
        Err(EngineError::NotFound(_))
    ));
    assert!(engine.reconcile(COMPANY).await.unwrap().is_empty());
}

#[tokio::test]
async fn client_balance_overflow_is_refused_without_side_effects() {
    let (engine, _db) = engine_with_db().await;
    let first = cash_account(&engine, 0).await;
    let second = cash_account(&engine, 0).await;
    let client_id = client(&engine).await;

    engine
        .create_receipt(CreateReceiptCmd::new(
            COMPANY,
            client_id,
            first,
            i64::MAX,
            PaymentTo::Advance,
            date(2026, 3, 1),
        ))
        .await
        .unwrap();

    let err = engine
        .create_receipt(CreateReceiptCmd::new(
            COMPANY,
            client_id,
            second,
            1,
            PaymentTo::Advance,
            date(2026, 3, 2),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    assert_eq!(
        engine.client(COMPANY, client_id).await.unwrap().present_balance,
        cents(i64::MAX)
    );
    assert_eq!(
        engine.account(COMPANY, second).await.unwrap().balance,
        MoneyCents::ZERO
    );
}

#[tokio::test]
async fn vendor_payment_cannot_overdraw_a_cash_account() {
    let (engine, _db) = engine_with_db().await;
    let cash = cash_account(&engine, 100).await;
    let vendor_id = vendor(&engine).await;

    let err = engine
        .create_vendor_payment(CreateVendorPaymentCmd::new(
            COMPANY,
            vendor_id,
            cash,
            500,
            VendorPaymentTo::Advance,
            date(2026, 4, 2),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientBalance(_)));
    assert_eq!(
        engine.account(COMPANY, cash).await.unwrap().balance,
        cents(100)
    );
    assert_eq!(
        engine.vendor(COMPANY, vendor_id).await.unwrap().present_balance,
        VendorBalance::SETTLED
    );
}

#[tokio::test]
async fn transfer_charge_lands_on_the_bearer() {
    let (engine, _db) = engine_with_db().await;
    let cash = cash_account(&engine, 10_000).await;
    let bank = engine
        .new_account(NewAccountCmd::new(COMPANY, "City Bank", AccountKind::Bank))
        .await
        .unwrap()
        .id;

    let by_receiver = engine
        .transfer_balance(
            TransferCmd::new(COMPANY, cash, bank, 1_000, date(2026, 5, 1))
                .charge(50, ChargeBearer::Receiver),
        )
        .await
        .unwrap();
    assert_eq!(by_receiver.voucher_no, "BT-000001");
    assert_eq!(engine.account(COMPANY, cash).await.unwrap().balance, cents(9_000));
    assert_eq!(engine.account(COMPANY, bank).await.unwrap().balance, cents(950));

    engine
        .transfer_balance(
            TransferCmd::new(COMPANY, cash, bank, 1_000, date(2026, 5, 2))
                .charge(50, ChargeBearer::Sender),
        )
        .await
        .unwrap();
    assert_eq!(engine.account(COMPANY, cash).await.unwrap().balance, cents(7_950));
    assert_eq!(engine.account(COMPANY, bank).await.unwrap().balance, cents(1_950));

    let err = engine
        .transfer_balance(TransferCmd::new(COMPANY, bank, cash, 5_000, date(2026, 5, 3)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientBalance(_)));

    let err = engine
        .transfer_balance(TransferCmd::new(COMPANY, cash, cash, 10, date(2026, 5, 3)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    // Dropping the charge on edit refunds it to the receiver.
    engine
        .update_transfer(
            COMPANY,
            by_receiver.id,
            TransferPatch::new().charge(0, ChargeBearer::Receiver),
        )
        .await
        .unwrap();
    assert_eq!(engine.account(COMPANY, bank).await.unwrap().balance, cents(2_000));

    engine.delete_transfer(COMPANY, by_receiver.id).await.unwrap();
    assert_eq!(engine.account(COMPANY, cash).await.unwrap().balance, cents(8_950));
    assert_eq!(engine.account(COMPANY, bank).await.unwrap().balance, cents(1_000));
    assert!(engine.reconcile(COMPANY).await.unwrap().is_empty());
}

#[tokio::test]
async fn credit_card_accounts_may_go_negative() {
    let (engine, _db) = engine_with_db().await;
    let cash = cash_account(&engine, 0).await;
    let card = engine
        .new_account(NewAccountCmd::new(COMPANY, "Visa", AccountKind::CreditCard))
        .await
        .unwrap()
        .id;

    engine
        .transfer_balance(TransferCmd::new(COMPANY, card, cash, 300, date(2026, 5, 1)))
        .await
        .unwrap();
    assert_eq!(engine.account(COMPANY, card).await.unwrap().balance, cents(-300));
    assert_eq!(engine.account(COMPANY, cash).await.unwrap().balance, cents(300));
}

#[tokio::test]
async fn client_advance_return_pays_out_of_the_account() {
    let (engine, _db) = engine_with_db().await;
    let cash = cash_account(&engine, 0).await;
    let client_id = client(&engine).await;
    engine
        .create_receipt(CreateReceiptCmd::new(
            COMPANY,
            client_id,
            cash,
            800,
            PaymentTo::Advance,
            date(2026, 6, 1),
        ))
        .await
        .unwrap();

    let refund = engine
        .create_advance_return(AdvanceReturnCmd::new(
            COMPANY,
            Party::Client(client_id),
            cash,
            300,
            date(2026, 6, 2),
        ))
        .await
        .unwrap();

    assert_eq!(
        engine.client(COMPANY, client_id).await.unwrap().advance(),
        cents(500)
    );
    assert_eq!(engine.account(COMPANY, cash).await.unwrap().balance, cents(500));

    engine
        .delete_advance_return(COMPANY, refund.id)
        .await
        .unwrap();
    assert_eq!(engine.account(COMPANY, cash).await.unwrap().balance, cents(800));
    assert!(engine.reconcile(COMPANY).await.unwrap().is_empty());
}

#[tokio::test]
async fn client_ledger_honours_the_date_range() {
    let (engine, _db) = engine_with_db().await;
    let cash = cash_account(&engine, 0).await;
    let client_id = client(&engine).await;
    invoice(&engine, client_id, 1_000, date(2026, 1, 10)).await;
    let receipt = engine
        .create_receipt(CreateReceiptCmd::new(
            COMPANY,
            client_id,
            cash,
            400,
            PaymentTo::Overall,
            date(2026, 1, 20),
        ))
        .await
        .unwrap();
    invoice(&engine, client_id, 500, date(2026, 2, 5)).await;

    let january = engine
        .client_ledger(
            COMPANY,
            client_id,
            Some(date(2026, 1, 15)),
            Some(date(2026, 1, 31)),
        )
        .await
        .unwrap();
    assert_eq!(january.opening_balance, cents(-1_000));
    assert_eq!(january.rows.len(), 1);
    assert_eq!(january.rows[0].voucher_no, receipt.voucher_no);
    assert_eq!(january.rows[0].credit, cents(400));
    assert_eq!(january.rows[0].running_balance, cents(-600));
    assert_eq!(january.closing_balance, cents(-600));

    let full = engine
        .client_ledger(COMPANY, client_id, None, None)
        .await
        .unwrap();
    assert_eq!(full.rows.len(), 3);
    assert_eq!(
        full.closing_balance,
        engine.client(COMPANY, client_id).await.unwrap().present_balance
    );

    let err = engine
        .client_ledger(
            COMPANY,
            client_id,
            Some(date(2026, 2, 1)),
            Some(date(2026, 1, 1)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn vendor_and_account_ledgers_match_their_projections() {
    let (engine, _db) = engine_with_db().await;
    let cash = cash_account(&engine, 2_000).await;
    let client_id = client(&engine).await;
    let vendor_id = engine
        .new_vendor(
            NewVendorCmd::new(COMPANY, "Sky Airlines")
                .opening_balance(VendorBalance::due(cents(300))),
        )
        .await
        .unwrap()
        .id;
    engine
        .create_invoice(
            CreateInvoiceCmd::new(COMPANY, client_id, 900, date(2026, 7, 1))
                .vendor_cost(vendor_id, 700),
        )
        .await
        .unwrap();
    engine
        .create_vendor_payment(CreateVendorPaymentCmd::new(
            COMPANY,
            vendor_id,
            cash,
            1_200,
            VendorPaymentTo::Overall,
            date(2026, 7, 2),
        ))
        .await
        .unwrap();

    let vendor_ledger = engine
        .vendor_ledger(COMPANY, vendor_id, None, None)
        .await
        .unwrap();
    assert_eq!(vendor_ledger.opening_balance, cents(-300));
    assert_eq!(vendor_ledger.rows.len(), 2);
    assert_eq!(vendor_ledger.closing_balance, cents(200));
    assert_eq!(
        engine.vendor(COMPANY, vendor_id).await.unwrap().present_balance,
        VendorBalance::advance(cents(200))
    );

    let account_ledger = engine
        .account_ledger(COMPANY, cash, None, None)
        .await
        .unwrap();
    assert_eq!(account_ledger.opening_balance, cents(2_000));
    assert_eq!(account_ledger.rows.len(), 1);
    assert_eq!(account_ledger.rows[0].credit, cents(1_200));
    assert_eq!(account_ledger.closing_balance, cents(800));
}

#[tokio::test]
async fn reconcile_detects_injected_drift_and_recompute_repairs_it() {
    let (engine, db) = engine_with_db().await;
    let cash = cash_account(&engine, 0).await;
    let client_id = client(&engine).await;
    let invoice_id = invoice(&engine, client_id, 1_000, date(2026, 3, 1)).await;
    engine
        .create_receipt(CreateReceiptCmd::new(
            COMPANY,
            client_id,
            cash,
            400,
            PaymentTo::Overall,
            date(2026, 3, 2),
        ))
        .await
        .unwrap();
    assert!(engine.reconcile(COMPANY).await.unwrap().is_empty());

    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "UPDATE clients SET present_balance = present_balance - 250 WHERE id = ?",
        vec![client_id.to_string().into()],
    ))
    .await
    .unwrap();
    db.execute(Statement::from_sql_and_values(
        backend,
        "UPDATE invoices SET received_amount = 0 WHERE id = ?",
        vec![invoice_id.to_string().into()],
    ))
    .await
    .unwrap();

    let drifts = engine.reconcile(COMPANY).await.unwrap();
    assert_eq!(drifts.len(), 2);
    let client_drift = drifts
        .iter()
        .find(|d| d.kind == ProjectionKind::ClientBalance)
        .unwrap();
    assert_eq!(client_drift.id, client_id.to_string());
    assert_eq!(client_drift.stored, cents(-850));
    assert_eq!(client_drift.expected, cents(-600));

    let repaired = engine.recompute_balances(COMPANY).await.unwrap();
    assert_eq!(repaired, drifts);
    assert!(engine.reconcile(COMPANY).await.unwrap().is_empty());

    let invoice = engine.invoice(COMPANY, invoice_id).await.unwrap();
    assert_eq!(invoice.received_amount, cents(400));
    assert_eq!(invoice.status, InvoiceStatus::Partial);
    assert_eq!(
        engine.client(COMPANY, client_id).await.unwrap().present_balance,
        cents(-600)
    );
}

#[tokio::test]
async fn records_are_scoped_to_their_company() {
    let (engine, _db) = engine_with_db().await;
    let cash = cash_account(&engine, 0).await;
    let client_id = client(&engine).await;

    assert!(matches!(
        engine.account("globex", cash).await,
        Err(EngineError::NotFound(_))
    ));
    let err = engine
        .create_receipt(CreateReceiptCmd::new(
            "globex",
            client_id,
            cash,
            100,
            PaymentTo::Advance,
            date(2026, 3, 2),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
    assert!(engine.clients("globex").await.unwrap().is_empty());
}

#[tokio::test]
async fn voucher_series_count_per_company() {
    let (engine, _db) = engine_with_db().await;
    assert_eq!(
        engine.next_voucher(Series::Invoice, COMPANY).await.unwrap(),
        "INV-000001"
    );
    assert_eq!(
        engine.next_voucher(Series::Invoice, COMPANY).await.unwrap(),
        "INV-000002"
    );
    assert_eq!(
        engine.next_voucher(Series::Invoice, "globex").await.unwrap(),
        "INV-000001"
    );
    assert_eq!(
        engine.next_voucher(Series::MoneyReceipt, COMPANY).await.unwrap(),
        "MR-000001"
    );
}

#[tokio::test]
async fn concurrent_voucher_issue_never_repeats() {
    let (engine, db, path) = engine_with_file_db().await;
    let engine = Arc::new(engine);

    let mut tasks = JoinSet::new();
    for _ in 0..20 {
        let engine = Arc::clone(&engine);
        tasks.spawn(async move { engine.next_voucher(Series::MoneyReceipt, COMPANY).await });
    }

    let mut issued = HashSet::new();
    while let Some(joined) = tasks.join_next().await {
        let voucher = joined.unwrap().unwrap();
        assert!(issued.insert(voucher), "voucher issued twice");
    }
    let expected: HashSet<String> = (1..=20).map(|n| Series::MoneyReceipt.format(n)).collect();
    assert_eq!(issued, expected);

    drop(engine);
    drop(db);
    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn concurrent_receipts_on_one_invoice_never_lose_an_update() {
    let (engine, db, path) = engine_with_file_db().await;
    let cash = cash_account(&engine, 0).await;
    let client_id = client(&engine).await;
    let invoice_id = invoice(&engine, client_id, 10_000, date(2026, 5, 1)).await;
    let engine = Arc::new(engine);

    let mut tasks = JoinSet::new();
    for _ in 0..20 {
        let engine = Arc::clone(&engine);
        tasks.spawn(async move {
            engine
                .create_receipt(
                    CreateReceiptCmd::new(
                        COMPANY,
                        client_id,
                        cash,
                        100,
                        PaymentTo::Invoice,
                        date(2026, 5, 2),
                    )
                    .allocate(invoice_id, 100),
                )
                .await
        });
    }

    let mut succeeded = 0_i64;
    while let Some(joined) = tasks.join_next().await {
        match joined.unwrap() {
            Ok(_) => succeeded += 1,
            Err(err) => assert!(
                matches!(err, EngineError::ConcurrentModification(_)),
                "unexpected failure: {err}"
            ),
        }
    }
    assert!(succeeded > 0);

    let invoice = engine.invoice(COMPANY, invoice_id).await.unwrap();
    assert_eq!(invoice.received_amount, cents(100 * succeeded));
    assert_eq!(
        engine.account(COMPANY, cash).await.unwrap().balance,
        cents(100 * succeeded)
    );
    assert_eq!(
        engine.client(COMPANY, client_id).await.unwrap().present_balance,
        cents(100 * succeeded - 10_000)
    );
    assert!(engine.reconcile(COMPANY).await.unwrap().is_empty());

    drop(engine);
    drop(db);
    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn profit_loss_and_collections_cover_the_range() {
    let (engine, _db) = engine_with_db().await;
    let cash = cash_account(&engine, 10_000).await;
    let bank = engine
        .new_account(NewAccountCmd::new(COMPANY, "Bank", AccountKind::Bank).opening_balance(1_000))
        .await
        .unwrap()
        .id;
    let client_id = client(&engine).await;
    let vendor_id = vendor(&engine).await;

    engine
        .create_invoice(
            CreateInvoiceCmd::new(COMPANY, client_id, 1_000, date(2026, 8, 1))
                .vendor_cost(vendor_id, 700),
        )
        .await
        .unwrap();
    // Outside the range.
    invoice(&engine, client_id, 5_000, date(2026, 9, 15)).await;

    engine
        .create_receipt(
            CreateReceiptCmd::new(
                COMPANY,
                client_id,
                cash,
                900,
                PaymentTo::Overall,
                date(2026, 8, 2),
            )
            .discount(100),
        )
        .await
        .unwrap();
    engine
        .create_receipt(CreateReceiptCmd::new(
            COMPANY,
            client_id,
            cash,
            200,
            PaymentTo::Advance,
            date(2026, 8, 3),
        ))
        .await
        .unwrap();
    engine
        .create_receipt(CreateReceiptCmd::new(
            COMPANY,
            client_id,
            bank,
            300,
            PaymentTo::Advance,
            date(2026, 8, 4),
        ))
        .await
        .unwrap();
    engine
        .create_vendor_payment(
            CreateVendorPaymentCmd::new(
                COMPANY,
                vendor_id,
                cash,
                600,
                VendorPaymentTo::Overall,
                date(2026, 8, 5),
            )
            .vendor_ait(20),
        )
        .await
        .unwrap();
    engine
        .transfer_balance(
            TransferCmd::new(COMPANY, cash, bank, 500, date(2026, 8, 6))
                .charge(10, ChargeBearer::Sender),
        )
        .await
        .unwrap();

    let from = Some(date(2026, 8, 1));
    let to = Some(date(2026, 8, 31));
    let pl = engine.profit_loss(COMPANY, from, to).await.unwrap();
    assert_eq!(pl.sales, cents(1_000));
    assert_eq!(pl.purchases, cents(700));
    assert_eq!(pl.discounts, cents(100));
    assert_eq!(pl.vendor_ait, cents(20));
    assert_eq!(pl.transfer_charges, cents(10));
    assert_eq!(pl.gross_profit, cents(300));
    assert_eq!(pl.net_profit, cents(190));

    let collections = engine.collections(COMPANY, from, to).await.unwrap();
    assert_eq!(collections.lines.len(), 2);
    assert_eq!(collections.lines[0].account_name, "Bank");
    assert_eq!(collections.lines[0].receipts, 1);
    assert_eq!(collections.lines[0].total, cents(300));
    assert_eq!(collections.lines[1].account_name, "Cash");
    assert_eq!(collections.lines[1].receipts, 2);
    assert_eq!(collections.lines[1].total, cents(1_100));
    assert_eq!(collections.total, cents(1_400));

    assert!(engine.reconcile(COMPANY).await.unwrap().is_empty());
}

mod allocation_properties {
    use proptest::prelude::*;

    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(12))]

        #[test]
        fn overall_receipts_never_overpay_an_invoice(
            totals in prop::collection::vec(1i64..2_000, 1..4),
            payments in prop::collection::vec(1i64..3_000, 1..5),
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            rt.block_on(async {
                let (engine, _db) = engine_with_db().await;
                let cash = cash_account(&engine, 0).await;
                let client_id = client(&engine).await;
                let mut invoice_ids = Vec::new();
                for (day, total) in totals.iter().enumerate() {
                    invoice_ids.push(
                        invoice(&engine, client_id, *total, date(2026, 1, day as u32 + 1)).await,
                    );
                }

                for (day, amount) in payments.iter().enumerate() {
                    let receipt = engine
                        .create_receipt(CreateReceiptCmd::new(
                            COMPANY,
                            client_id,
                            cash,
                            *amount,
                            PaymentTo::Overall,
                            date(2026, 2, day as u32 + 1),
                        ))
                        .await
                        .unwrap();
                    let applied: MoneyCents =
                        receipt.allocations.iter().map(|a| a.applied_amount).sum();
                    assert!(applied <= receipt.amount);
                    assert!(receipt.unallocated() >= MoneyCents::ZERO);
                }

                let mut received = MoneyCents::ZERO;
                for id in &invoice_ids {
                    let invoice = engine.invoice(COMPANY, *id).await.unwrap();
                    assert!(invoice.received_amount <= invoice.net_total);
                    received = received + invoice.received_amount;
                }
                let billed: i64 = totals.iter().sum();
                let paid: i64 = payments.iter().sum();
                assert_eq!(received, MoneyCents::new(billed.min(paid)));
                assert!(engine.reconcile(COMPANY).await.unwrap().is_empty());
            });
        }
    }
}
