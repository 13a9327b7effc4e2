//! Read-side output types: ledgers, profit/loss, collections and drift.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::MoneyCents;

/// One line of a reconstructed ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRow {
    pub date: NaiveDate,
    pub voucher_no: String,
    pub description: String,
    pub debit: MoneyCents,
    pub credit: MoneyCents,
    pub running_balance: MoneyCents,
}

/// A running-balance statement for one client, vendor or account.
///
/// Balances use the projection's sign: positive is Advance for clients and
/// vendors, money held for accounts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    pub subject_id: Uuid,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub opening_balance: MoneyCents,
    pub rows: Vec<LedgerRow>,
    pub closing_balance: MoneyCents,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfitLoss {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub sales: MoneyCents,
    pub purchases: MoneyCents,
    pub discounts: MoneyCents,
    pub vendor_ait: MoneyCents,
    pub transfer_charges: MoneyCents,
    pub gross_profit: MoneyCents,
    pub net_profit: MoneyCents,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionLine {
    pub account_id: Uuid,
    pub account_name: String,
    pub receipts: u64,
    pub total: MoneyCents,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collections {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub lines: Vec<CollectionLine>,
    pub total: MoneyCents,
}

/// Which stored projection a [`Drift`] refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionKind {
    AccountBalance,
    ClientBalance,
    VendorBalance,
    InvoiceReceived,
    VendorCostPaid,
}

/// A projection whose stored value disagrees with its event history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drift {
    pub kind: ProjectionKind,
    pub id: String,
    pub stored: MoneyCents,
    pub expected: MoneyCents,
}
