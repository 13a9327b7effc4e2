//! Allocation-consistent ledger engine for a travel agency back office.
//!
//! Every financial event (invoice, money receipt, vendor payment, transfer,
//! advance return) is applied inside one database transaction that updates
//! all the balances it touches. Ledgers and reports are rebuilt from the raw
//! events, never from the stored projections.

pub use accounts::{Account, AccountKind};
pub use advance_returns::{AdvanceReturn, Party};
pub use balance_transfers::{BalanceTransfer, ChargeBearer};
pub use clients::Client;
pub use commands::{
    AdvanceReturnCmd, AdvanceReturnPatch, AllocationLine, CostLine, CreateInvoiceCmd,
    CreateReceiptCmd, CreateVendorPaymentCmd, InvoicePatch, NewAccountCmd, NewClientCmd,
    NewVendorCmd, ReceiptPatch, TransferCmd, TransferPatch, VendorPaymentPatch,
};
pub use counters::Series;
pub use error::EngineError;
pub use invoice_vendor_costs::VendorCost;
pub use invoices::{Invoice, InvoiceStatus};
pub use money::MoneyCents;
pub use money_receipts::{MoneyReceipt, PaymentTo};
pub use ops::{Engine, EngineBuilder, RetryPolicy};
pub use receipt_allocations::ReceiptAllocation;
pub use reports::{
    CollectionLine, Collections, Drift, Ledger, LedgerRow, ProfitLoss, ProjectionKind,
};
pub use vendor_allocations::VendorAllocation;
pub use vendor_payments::{VendorPayment, VendorPaymentTo};
pub use vendors::{BalanceKind, Vendor, VendorBalance};

mod accounts;
mod advance_returns;
mod allocation;
mod balance_transfers;
mod clients;
mod commands;
mod counters;
mod error;
mod invoice_vendor_costs;
mod invoices;
mod money;
mod money_receipts;
mod ops;
mod receipt_allocations;
mod reports;
mod util;
mod vendor_allocations;
mod vendor_payments;
mod vendors;

type ResultEngine<T> = Result<T, EngineError>;
