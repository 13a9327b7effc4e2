//! Initial schema for the agency ledger.
//!
//! - `accounts`: cash, bank, mobile banking and credit card accounts
//! - `clients` / `vendors`: parties with a present balance projection
//! - `invoices` and `invoice_vendor_costs`: sales and the costs owed per vendor
//! - `money_receipts` and `receipt_allocations`: client payments
//! - `vendor_payments` and `vendor_allocations`: payments to vendors
//! - `advance_returns`, `balance_transfers`: the remaining money events
//! - `counters`: per company voucher sequences
//!
//! Every money column is an integer amount of minor units.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Accounts {
    Table,
    Id,
    CompanyId,
    Name,
    Kind,
    OpeningBalance,
    Balance,
    HasActivity,
    Version,
    CreatedAt,
}

#[derive(Iden)]
enum Clients {
    Table,
    Id,
    CompanyId,
    Name,
    Category,
    CreditLimit,
    OpeningBalance,
    PresentBalance,
    Version,
    CreatedAt,
}

#[derive(Iden)]
enum Vendors {
    Table,
    Id,
    CompanyId,
    Name,
    OpeningBalance,
    BalanceKind,
    BalanceAmount,
    Version,
    CreatedAt,
}

#[derive(Iden)]
enum Invoices {
    Table,
    Id,
    CompanyId,
    InvoiceNo,
    ClientId,
    InvoiceDate,
    NetTotal,
    ReceivedAmount,
    Status,
    Note,
    Version,
    CreatedAt,
}

#[derive(Iden)]
enum InvoiceVendorCosts {
    Table,
    Id,
    CompanyId,
    InvoiceId,
    VendorId,
    Cost,
    PaidAmount,
    Version,
    CreatedAt,
}

#[derive(Iden)]
enum MoneyReceipts {
    Table,
    Id,
    CompanyId,
    VoucherNo,
    ClientId,
    Amount,
    Discount,
    PaymentTo,
    AccountId,
    PaymentDate,
    Note,
    CreatedAt,
}

#[derive(Iden)]
enum ReceiptAllocations {
    Table,
    Id,
    CompanyId,
    MoneyReceiptId,
    InvoiceId,
    ClientId,
    AppliedAmount,
}

#[derive(Iden)]
enum VendorPayments {
    Table,
    Id,
    CompanyId,
    VoucherNo,
    VendorId,
    Amount,
    VendorAit,
    TotalAmount,
    PaymentTo,
    AccountId,
    PaymentDate,
    Note,
    CreatedAt,
}

#[derive(Iden)]
enum VendorAllocations {
    Table,
    Id,
    CompanyId,
    VendorPaymentId,
    CostId,
    InvoiceId,
    VendorId,
    AppliedAmount,
}

#[derive(Iden)]
enum AdvanceReturns {
    Table,
    Id,
    CompanyId,
    VoucherNo,
    PartyKind,
    PartyId,
    Amount,
    AccountId,
    ReturnDate,
    Note,
    CreatedAt,
}

#[derive(Iden)]
enum BalanceTransfers {
    Table,
    Id,
    CompanyId,
    VoucherNo,
    FromAccountId,
    ToAccountId,
    Amount,
    TransferCharge,
    ChargeBearer,
    TransferDate,
    Note,
    CreatedAt,
}

#[derive(Iden)]
enum Counters {
    Table,
    CounterKey,
    Seq,
}

fn index(
    name: &str,
    table: impl IntoIden + 'static,
    cols: &[DynIden],
    unique: bool,
) -> IndexCreateStatement {
    let mut index = Index::create();
    index.name(name).table(table);
    for col in cols {
        index.col(col.clone());
    }
    if unique {
        index.unique();
    }
    index.to_owned()
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Accounts
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Accounts::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Accounts::CompanyId).string().not_null())
                    .col(ColumnDef::new(Accounts::Name).string().not_null())
                    .col(ColumnDef::new(Accounts::Kind).string().not_null())
                    .col(
                        ColumnDef::new(Accounts::OpeningBalance)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Accounts::Balance).big_integer().not_null())
                    .col(
                        ColumnDef::new(Accounts::HasActivity)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Accounts::Version)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Accounts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(index(
                "idx-accounts-company_id",
                Accounts::Table,
                &[Accounts::CompanyId.into_iden()],
                false,
            ))
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Clients
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Clients::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Clients::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Clients::CompanyId).string().not_null())
                    .col(ColumnDef::new(Clients::Name).string().not_null())
                    .col(ColumnDef::new(Clients::Category).string())
                    .col(
                        ColumnDef::new(Clients::CreditLimit)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Clients::OpeningBalance)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Clients::PresentBalance)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Clients::Version)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Clients::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(index(
                "idx-clients-company_id",
                Clients::Table,
                &[Clients::CompanyId.into_iden()],
                false,
            ))
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Vendors
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Vendors::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Vendors::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Vendors::CompanyId).string().not_null())
                    .col(ColumnDef::new(Vendors::Name).string().not_null())
                    .col(
                        ColumnDef::new(Vendors::OpeningBalance)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Vendors::BalanceKind)
                            .string()
                            .not_null()
                            .default("due"),
                    )
                    .col(
                        ColumnDef::new(Vendors::BalanceAmount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Vendors::Version)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Vendors::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(index(
                "idx-vendors-company_id",
                Vendors::Table,
                &[Vendors::CompanyId.into_iden()],
                false,
            ))
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Invoices and vendor costs
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Invoices::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Invoices::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Invoices::CompanyId).string().not_null())
                    .col(ColumnDef::new(Invoices::InvoiceNo).string().not_null())
                    .col(ColumnDef::new(Invoices::ClientId).string().not_null())
                    .col(ColumnDef::new(Invoices::InvoiceDate).date().not_null())
                    .col(ColumnDef::new(Invoices::NetTotal).big_integer().not_null())
                    .col(
                        ColumnDef::new(Invoices::ReceivedAmount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Invoices::Status).string().not_null())
                    .col(ColumnDef::new(Invoices::Note).string())
                    .col(
                        ColumnDef::new(Invoices::Version)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Invoices::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-invoices-client_id")
                            .from(Invoices::Table, Invoices::ClientId)
                            .to(Clients::Table, Clients::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(index(
                "idx-invoices-company_id-invoice_no-unique",
                Invoices::Table,
                &[Invoices::CompanyId.into_iden(), Invoices::InvoiceNo.into_iden()],
                true,
            ))
            .await?;

        manager
            .create_index(index(
                "idx-invoices-client_id-invoice_date",
                Invoices::Table,
                &[Invoices::ClientId.into_iden(), Invoices::InvoiceDate.into_iden()],
                false,
            ))
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(InvoiceVendorCosts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InvoiceVendorCosts::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(InvoiceVendorCosts::CompanyId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InvoiceVendorCosts::InvoiceId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InvoiceVendorCosts::VendorId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InvoiceVendorCosts::Cost)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InvoiceVendorCosts::PaidAmount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(InvoiceVendorCosts::Version)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(InvoiceVendorCosts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-invoice_vendor_costs-invoice_id")
                            .from(InvoiceVendorCosts::Table, InvoiceVendorCosts::InvoiceId)
                            .to(Invoices::Table, Invoices::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-invoice_vendor_costs-vendor_id")
                            .from(InvoiceVendorCosts::Table, InvoiceVendorCosts::VendorId)
                            .to(Vendors::Table, Vendors::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(index(
                "idx-invoice_vendor_costs-invoice_id-vendor_id-unique",
                InvoiceVendorCosts::Table,
                &[
                    InvoiceVendorCosts::InvoiceId.into_iden(),
                    InvoiceVendorCosts::VendorId.into_iden(),
                ],
                true,
            ))
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Money receipts
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(MoneyReceipts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MoneyReceipts::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MoneyReceipts::CompanyId).string().not_null())
                    .col(ColumnDef::new(MoneyReceipts::VoucherNo).string().not_null())
                    .col(ColumnDef::new(MoneyReceipts::ClientId).string().not_null())
                    .col(
                        ColumnDef::new(MoneyReceipts::Amount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MoneyReceipts::Discount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(MoneyReceipts::PaymentTo).string().not_null())
                    .col(ColumnDef::new(MoneyReceipts::AccountId).string().not_null())
                    .col(ColumnDef::new(MoneyReceipts::PaymentDate).date().not_null())
                    .col(ColumnDef::new(MoneyReceipts::Note).string())
                    .col(
                        ColumnDef::new(MoneyReceipts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-money_receipts-client_id")
                            .from(MoneyReceipts::Table, MoneyReceipts::ClientId)
                            .to(Clients::Table, Clients::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-money_receipts-account_id")
                            .from(MoneyReceipts::Table, MoneyReceipts::AccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(index(
                "idx-money_receipts-company_id-voucher_no-unique",
                MoneyReceipts::Table,
                &[
                    MoneyReceipts::CompanyId.into_iden(),
                    MoneyReceipts::VoucherNo.into_iden(),
                ],
                true,
            ))
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ReceiptAllocations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReceiptAllocations::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ReceiptAllocations::CompanyId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReceiptAllocations::MoneyReceiptId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReceiptAllocations::InvoiceId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReceiptAllocations::ClientId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReceiptAllocations::AppliedAmount)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-receipt_allocations-money_receipt_id")
                            .from(ReceiptAllocations::Table, ReceiptAllocations::MoneyReceiptId)
                            .to(MoneyReceipts::Table, MoneyReceipts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-receipt_allocations-invoice_id")
                            .from(ReceiptAllocations::Table, ReceiptAllocations::InvoiceId)
                            .to(Invoices::Table, Invoices::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(index(
                "idx-receipt_allocations-money_receipt_id",
                ReceiptAllocations::Table,
                &[ReceiptAllocations::MoneyReceiptId.into_iden()],
                false,
            ))
            .await?;

        manager
            .create_index(index(
                "idx-receipt_allocations-invoice_id",
                ReceiptAllocations::Table,
                &[ReceiptAllocations::InvoiceId.into_iden()],
                false,
            ))
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Vendor payments
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(VendorPayments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VendorPayments::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(VendorPayments::CompanyId).string().not_null())
                    .col(ColumnDef::new(VendorPayments::VoucherNo).string().not_null())
                    .col(ColumnDef::new(VendorPayments::VendorId).string().not_null())
                    .col(
                        ColumnDef::new(VendorPayments::Amount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VendorPayments::VendorAit)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(VendorPayments::TotalAmount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(VendorPayments::PaymentTo).string().not_null())
                    .col(ColumnDef::new(VendorPayments::AccountId).string().not_null())
                    .col(ColumnDef::new(VendorPayments::PaymentDate).date().not_null())
                    .col(ColumnDef::new(VendorPayments::Note).string())
                    .col(
                        ColumnDef::new(VendorPayments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-vendor_payments-vendor_id")
                            .from(VendorPayments::Table, VendorPayments::VendorId)
                            .to(Vendors::Table, Vendors::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-vendor_payments-account_id")
                            .from(VendorPayments::Table, VendorPayments::AccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(index(
                "idx-vendor_payments-company_id-voucher_no-unique",
                VendorPayments::Table,
                &[
                    VendorPayments::CompanyId.into_iden(),
                    VendorPayments::VoucherNo.into_iden(),
                ],
                true,
            ))
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(VendorAllocations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VendorAllocations::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(VendorAllocations::CompanyId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VendorAllocations::VendorPaymentId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(VendorAllocations::CostId).string().not_null())
                    .col(
                        ColumnDef::new(VendorAllocations::InvoiceId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VendorAllocations::VendorId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VendorAllocations::AppliedAmount)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-vendor_allocations-vendor_payment_id")
                            .from(VendorAllocations::Table, VendorAllocations::VendorPaymentId)
                            .to(VendorPayments::Table, VendorPayments::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-vendor_allocations-cost_id")
                            .from(VendorAllocations::Table, VendorAllocations::CostId)
                            .to(InvoiceVendorCosts::Table, InvoiceVendorCosts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(index(
                "idx-vendor_allocations-vendor_payment_id",
                VendorAllocations::Table,
                &[VendorAllocations::VendorPaymentId.into_iden()],
                false,
            ))
            .await?;

        manager
            .create_index(index(
                "idx-vendor_allocations-cost_id",
                VendorAllocations::Table,
                &[VendorAllocations::CostId.into_iden()],
                false,
            ))
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 7. Advance returns
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(AdvanceReturns::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AdvanceReturns::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AdvanceReturns::CompanyId).string().not_null())
                    .col(ColumnDef::new(AdvanceReturns::VoucherNo).string().not_null())
                    .col(ColumnDef::new(AdvanceReturns::PartyKind).string().not_null())
                    .col(ColumnDef::new(AdvanceReturns::PartyId).string().not_null())
                    .col(
                        ColumnDef::new(AdvanceReturns::Amount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AdvanceReturns::AccountId).string().not_null())
                    .col(ColumnDef::new(AdvanceReturns::ReturnDate).date().not_null())
                    .col(ColumnDef::new(AdvanceReturns::Note).string())
                    .col(
                        ColumnDef::new(AdvanceReturns::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-advance_returns-account_id")
                            .from(AdvanceReturns::Table, AdvanceReturns::AccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(index(
                "idx-advance_returns-company_id-voucher_no-unique",
                AdvanceReturns::Table,
                &[
                    AdvanceReturns::CompanyId.into_iden(),
                    AdvanceReturns::VoucherNo.into_iden(),
                ],
                true,
            ))
            .await?;

        manager
            .create_index(index(
                "idx-advance_returns-party",
                AdvanceReturns::Table,
                &[
                    AdvanceReturns::PartyKind.into_iden(),
                    AdvanceReturns::PartyId.into_iden(),
                ],
                false,
            ))
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 8. Balance transfers
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(BalanceTransfers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BalanceTransfers::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(BalanceTransfers::CompanyId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BalanceTransfers::VoucherNo)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BalanceTransfers::FromAccountId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BalanceTransfers::ToAccountId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BalanceTransfers::Amount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BalanceTransfers::TransferCharge)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(BalanceTransfers::ChargeBearer)
                            .string()
                            .not_null()
                            .default("receiver"),
                    )
                    .col(
                        ColumnDef::new(BalanceTransfers::TransferDate)
                            .date()
                            .not_null(),
                    )
                    .col(ColumnDef::new(BalanceTransfers::Note).string())
                    .col(
                        ColumnDef::new(BalanceTransfers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-balance_transfers-from_account_id")
                            .from(BalanceTransfers::Table, BalanceTransfers::FromAccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-balance_transfers-to_account_id")
                            .from(BalanceTransfers::Table, BalanceTransfers::ToAccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(index(
                "idx-balance_transfers-company_id-voucher_no-unique",
                BalanceTransfers::Table,
                &[
                    BalanceTransfers::CompanyId.into_iden(),
                    BalanceTransfers::VoucherNo.into_iden(),
                ],
                true,
            ))
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 9. Voucher counters
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Counters::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Counters::CounterKey)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Counters::Seq).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Counters::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BalanceTransfers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AdvanceReturns::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(VendorAllocations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(VendorPayments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ReceiptAllocations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(MoneyReceipts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(InvoiceVendorCosts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Invoices::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Vendors::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Clients::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await?;
        Ok(())
    }
}
