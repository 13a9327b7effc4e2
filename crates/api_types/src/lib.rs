//! JSON payloads of the ledger HTTP API.
//!
//! Every amount is an integer count of minor units and carries a `_minor`
//! suffix. Dates are ISO `YYYY-MM-DD`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body of every successful delete.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deleted {
    pub ok: bool,
}

pub mod account {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum AccountKind {
        Cash,
        Bank,
        MobileBanking,
        CreditCard,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountNew {
        pub name: String,
        pub kind: AccountKind,
        #[serde(default)]
        pub opening_balance_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountView {
        pub id: Uuid,
        pub name: String,
        pub kind: AccountKind,
        pub opening_balance_minor: i64,
        pub balance_minor: i64,
        pub has_activity: bool,
    }
}

pub mod client {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ClientNew {
        pub name: String,
        pub category: Option<String>,
        /// `0` means no limit.
        #[serde(default)]
        pub credit_limit_minor: i64,
        /// Signed: negative when the client already owes money.
        #[serde(default)]
        pub opening_balance_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ClientView {
        pub id: Uuid,
        pub name: String,
        pub category: Option<String>,
        pub credit_limit_minor: i64,
        pub opening_balance_minor: i64,
        /// Signed: positive is Advance, negative is Due.
        pub present_balance_minor: i64,
        pub due_minor: i64,
        pub advance_minor: i64,
        pub over_credit_limit: bool,
    }
}

pub mod vendor {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum BalanceKind {
        Due,
        Advance,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct VendorBalanceView {
        pub kind: BalanceKind,
        pub amount_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct VendorNew {
        pub name: String,
        pub opening_balance: Option<VendorBalanceView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct VendorView {
        pub id: Uuid,
        pub name: String,
        pub opening_balance: VendorBalanceView,
        pub present_balance: VendorBalanceView,
    }
}

pub mod invoice {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum InvoiceStatus {
        Due,
        Partial,
        Paid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CostLineNew {
        pub vendor_id: Uuid,
        pub cost_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct InvoiceNew {
        pub client_id: Uuid,
        pub invoice_date: NaiveDate,
        pub net_total_minor: i64,
        pub note: Option<String>,
        #[serde(default)]
        pub vendor_costs: Vec<CostLineNew>,
    }

    /// Missing fields keep their stored value; an empty note clears it.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct InvoiceUpdate {
        pub net_total_minor: Option<i64>,
        pub invoice_date: Option<NaiveDate>,
        pub note: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct VendorCostView {
        pub id: Uuid,
        pub vendor_id: Uuid,
        pub cost_minor: i64,
        pub paid_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct InvoiceView {
        pub id: Uuid,
        pub invoice_no: String,
        pub client_id: Uuid,
        pub invoice_date: NaiveDate,
        pub net_total_minor: i64,
        pub received_minor: i64,
        pub remaining_minor: i64,
        pub status: InvoiceStatus,
        pub note: Option<String>,
        pub vendor_costs: Vec<VendorCostView>,
    }
}

/// One `(invoice, amount)` line of a receipt or vendor payment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationLine {
    pub invoice_id: Uuid,
    pub amount_minor: i64,
}

pub mod receipt {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum PaymentTo {
        Overall,
        Advance,
        Invoice,
        Tickets,
        Adjust,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReceiptNew {
        pub client_id: Uuid,
        pub account_id: Uuid,
        pub amount_minor: i64,
        #[serde(default)]
        pub discount_minor: i64,
        pub payment_to: PaymentTo,
        pub payment_date: NaiveDate,
        pub note: Option<String>,
        #[serde(default)]
        pub allocations: Vec<AllocationLine>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ReceiptUpdate {
        pub amount_minor: Option<i64>,
        pub discount_minor: Option<i64>,
        pub payment_to: Option<PaymentTo>,
        pub account_id: Option<Uuid>,
        pub payment_date: Option<NaiveDate>,
        pub note: Option<String>,
        /// `None` keeps the stored lines when the target still takes them.
        pub allocations: Option<Vec<AllocationLine>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReceiptAllocationView {
        pub invoice_id: Uuid,
        pub applied_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReceiptView {
        pub id: Uuid,
        pub voucher_no: String,
        pub client_id: Uuid,
        pub account_id: Uuid,
        pub amount_minor: i64,
        pub discount_minor: i64,
        pub payment_to: PaymentTo,
        pub payment_date: NaiveDate,
        pub note: Option<String>,
        pub allocations: Vec<ReceiptAllocationView>,
        pub unallocated_minor: i64,
    }
}

pub mod vendor_payment {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum VendorPaymentTo {
        Overall,
        Advance,
        Invoice,
        Adjust,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct VendorPaymentNew {
        pub vendor_id: Uuid,
        pub account_id: Uuid,
        pub amount_minor: i64,
        #[serde(default)]
        pub vendor_ait_minor: i64,
        pub payment_to: VendorPaymentTo,
        pub payment_date: NaiveDate,
        pub note: Option<String>,
        #[serde(default)]
        pub allocations: Vec<AllocationLine>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct VendorPaymentUpdate {
        pub amount_minor: Option<i64>,
        pub vendor_ait_minor: Option<i64>,
        pub payment_to: Option<VendorPaymentTo>,
        pub account_id: Option<Uuid>,
        pub payment_date: Option<NaiveDate>,
        pub note: Option<String>,
        pub allocations: Option<Vec<AllocationLine>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct VendorAllocationView {
        pub invoice_id: Uuid,
        pub cost_id: Uuid,
        pub applied_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct VendorPaymentView {
        pub id: Uuid,
        pub voucher_no: String,
        pub vendor_id: Uuid,
        pub account_id: Uuid,
        pub amount_minor: i64,
        pub vendor_ait_minor: i64,
        pub total_minor: i64,
        pub payment_to: VendorPaymentTo,
        pub payment_date: NaiveDate,
        pub note: Option<String>,
        pub allocations: Vec<VendorAllocationView>,
    }
}

pub mod transfer {
    use super::*;

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum ChargeBearer {
        #[default]
        Receiver,
        Sender,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferNew {
        pub from_account_id: Uuid,
        pub to_account_id: Uuid,
        pub amount_minor: i64,
        #[serde(default)]
        pub transfer_charge_minor: i64,
        #[serde(default)]
        pub charge_bearer: ChargeBearer,
        pub transfer_date: NaiveDate,
        pub note: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransferUpdate {
        pub from_account_id: Option<Uuid>,
        pub to_account_id: Option<Uuid>,
        pub amount_minor: Option<i64>,
        pub transfer_charge_minor: Option<i64>,
        pub charge_bearer: Option<ChargeBearer>,
        pub transfer_date: Option<NaiveDate>,
        pub note: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferView {
        pub id: Uuid,
        pub voucher_no: String,
        pub from_account_id: Uuid,
        pub to_account_id: Uuid,
        pub amount_minor: i64,
        pub transfer_charge_minor: i64,
        pub charge_bearer: ChargeBearer,
        pub transfer_date: NaiveDate,
        pub note: Option<String>,
    }
}

pub mod advance_return {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum PartyKind {
        Client,
        Vendor,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AdvanceReturnNew {
        pub party_kind: PartyKind,
        pub party_id: Uuid,
        pub account_id: Uuid,
        pub amount_minor: i64,
        pub return_date: NaiveDate,
        pub note: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct AdvanceReturnUpdate {
        pub account_id: Option<Uuid>,
        pub amount_minor: Option<i64>,
        pub return_date: Option<NaiveDate>,
        pub note: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AdvanceReturnView {
        pub id: Uuid,
        pub voucher_no: String,
        pub party_kind: PartyKind,
        pub party_id: Uuid,
        pub account_id: Uuid,
        pub amount_minor: i64,
        pub return_date: NaiveDate,
        pub note: Option<String>,
    }
}

pub mod report {
    use super::*;

    /// Inclusive date range; either end may be open.
    #[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
    pub struct DateRange {
        pub from: Option<NaiveDate>,
        pub to: Option<NaiveDate>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LedgerRowView {
        pub date: NaiveDate,
        pub voucher_no: String,
        pub description: String,
        pub debit_minor: i64,
        pub credit_minor: i64,
        pub running_balance_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LedgerView {
        pub subject_id: Uuid,
        pub from: Option<NaiveDate>,
        pub to: Option<NaiveDate>,
        pub opening_balance_minor: i64,
        pub rows: Vec<LedgerRowView>,
        pub closing_balance_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProfitLossView {
        pub from: Option<NaiveDate>,
        pub to: Option<NaiveDate>,
        pub sales_minor: i64,
        pub purchases_minor: i64,
        pub discounts_minor: i64,
        pub vendor_ait_minor: i64,
        pub transfer_charges_minor: i64,
        pub gross_profit_minor: i64,
        pub net_profit_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CollectionLineView {
        pub account_id: Uuid,
        pub account_name: String,
        pub receipts: u64,
        pub total_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CollectionsView {
        pub from: Option<NaiveDate>,
        pub to: Option<NaiveDate>,
        pub lines: Vec<CollectionLineView>,
        pub total_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DriftView {
        pub kind: String,
        pub id: String,
        pub stored_minor: i64,
        pub expected_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DriftReport {
        pub consistent: bool,
        pub drifts: Vec<DriftView>,
    }
}

pub mod voucher {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Series {
        Invoice,
        MoneyReceipt,
        VendorPayment,
        AdvanceReturn,
        BalanceTransfer,
        Expense,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct VoucherNew {
        pub series: Series,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct VoucherIssued {
        pub voucher_no: String,
    }
}
