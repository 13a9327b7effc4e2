//! Command structs for engine operations.
//!
//! These types group parameters for write operations (receipts, vendor
//! payments, transfers, advance returns, invoices), keeping call sites
//! readable and avoiding long argument lists. Amounts are minor units.
//!
//! Patch structs use `None` for "keep the stored value". For notes,
//! `Some("")` clears the stored note.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{AccountKind, ChargeBearer, Party, PaymentTo, VendorBalance, VendorPaymentTo};

/// Register a new account.
#[derive(Clone, Debug)]
pub struct NewAccountCmd {
    pub company_id: String,
    pub name: String,
    pub kind: AccountKind,
    pub opening_balance_minor: i64,
}

impl NewAccountCmd {
    #[must_use]
    pub fn new(company_id: impl Into<String>, name: impl Into<String>, kind: AccountKind) -> Self {
        Self {
            company_id: company_id.into(),
            name: name.into(),
            kind,
            opening_balance_minor: 0,
        }
    }

    #[must_use]
    pub fn opening_balance(mut self, amount_minor: i64) -> Self {
        self.opening_balance_minor = amount_minor;
        self
    }
}

/// Register a new client.
#[derive(Clone, Debug)]
pub struct NewClientCmd {
    pub company_id: String,
    pub name: String,
    pub category: Option<String>,
    pub credit_limit_minor: i64,
    /// Signed: negative = the client already owes us.
    pub opening_balance_minor: i64,
}

impl NewClientCmd {
    #[must_use]
    pub fn new(company_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            company_id: company_id.into(),
            name: name.into(),
            category: None,
            credit_limit_minor: 0,
            opening_balance_minor: 0,
        }
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn credit_limit(mut self, amount_minor: i64) -> Self {
        self.credit_limit_minor = amount_minor;
        self
    }

    #[must_use]
    pub fn opening_balance(mut self, amount_minor: i64) -> Self {
        self.opening_balance_minor = amount_minor;
        self
    }
}

/// Register a new vendor.
#[derive(Clone, Debug)]
pub struct NewVendorCmd {
    pub company_id: String,
    pub name: String,
    pub opening_balance: VendorBalance,
}

impl NewVendorCmd {
    #[must_use]
    pub fn new(company_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            company_id: company_id.into(),
            name: name.into(),
            opening_balance: VendorBalance::SETTLED,
        }
    }

    #[must_use]
    pub fn opening_balance(mut self, balance: VendorBalance) -> Self {
        self.opening_balance = balance;
        self
    }
}

/// One vendor cost line on a new invoice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CostLine {
    pub vendor_id: Uuid,
    pub cost_minor: i64,
}

/// Create an invoice for a client.
#[derive(Clone, Debug)]
pub struct CreateInvoiceCmd {
    pub company_id: String,
    pub client_id: Uuid,
    pub invoice_date: NaiveDate,
    pub net_total_minor: i64,
    pub note: Option<String>,
    pub vendor_costs: Vec<CostLine>,
}

impl CreateInvoiceCmd {
    #[must_use]
    pub fn new(
        company_id: impl Into<String>,
        client_id: Uuid,
        net_total_minor: i64,
        invoice_date: NaiveDate,
    ) -> Self {
        Self {
            company_id: company_id.into(),
            client_id,
            invoice_date,
            net_total_minor,
            note: None,
            vendor_costs: Vec::new(),
        }
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    #[must_use]
    pub fn vendor_cost(mut self, vendor_id: Uuid, cost_minor: i64) -> Self {
        self.vendor_costs.push(CostLine {
            vendor_id,
            cost_minor,
        });
        self
    }
}

/// Edit an invoice. Vendor cost lines are fixed once created.
#[derive(Clone, Debug, Default)]
pub struct InvoicePatch {
    pub net_total_minor: Option<i64>,
    pub invoice_date: Option<NaiveDate>,
    pub note: Option<String>,
}

impl InvoicePatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn net_total(mut self, amount_minor: i64) -> Self {
        self.net_total_minor = Some(amount_minor);
        self
    }

    #[must_use]
    pub fn invoice_date(mut self, date: NaiveDate) -> Self {
        self.invoice_date = Some(date);
        self
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// An explicit `(invoice, amount)` allocation line.
///
/// For vendor payments the line targets the vendor's cost line on that
/// invoice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AllocationLine {
    pub invoice_id: Uuid,
    pub amount_minor: i64,
}

/// Record money received from a client.
#[derive(Clone, Debug)]
pub struct CreateReceiptCmd {
    pub company_id: String,
    pub client_id: Uuid,
    pub account_id: Uuid,
    pub amount_minor: i64,
    pub discount_minor: i64,
    pub payment_to: PaymentTo,
    pub payment_date: NaiveDate,
    pub note: Option<String>,
    pub allocations: Vec<AllocationLine>,
}

impl CreateReceiptCmd {
    #[must_use]
    pub fn new(
        company_id: impl Into<String>,
        client_id: Uuid,
        account_id: Uuid,
        amount_minor: i64,
        payment_to: PaymentTo,
        payment_date: NaiveDate,
    ) -> Self {
        Self {
            company_id: company_id.into(),
            client_id,
            account_id,
            amount_minor,
            discount_minor: 0,
            payment_to,
            payment_date,
            note: None,
            allocations: Vec::new(),
        }
    }

    #[must_use]
    pub fn discount(mut self, amount_minor: i64) -> Self {
        self.discount_minor = amount_minor;
        self
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    #[must_use]
    pub fn allocate(mut self, invoice_id: Uuid, amount_minor: i64) -> Self {
        self.allocations.push(AllocationLine {
            invoice_id,
            amount_minor,
        });
        self
    }
}

/// Edit a receipt. The client, id and voucher number are kept.
///
/// With `allocations: None` the stored lines are reused when the resulting
/// target takes explicit lines; `Overall` always re-plans.
#[derive(Clone, Debug, Default)]
pub struct ReceiptPatch {
    pub amount_minor: Option<i64>,
    pub discount_minor: Option<i64>,
    pub payment_to: Option<PaymentTo>,
    pub account_id: Option<Uuid>,
    pub payment_date: Option<NaiveDate>,
    pub note: Option<String>,
    pub allocations: Option<Vec<AllocationLine>>,
}

impl ReceiptPatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn amount(mut self, amount_minor: i64) -> Self {
        self.amount_minor = Some(amount_minor);
        self
    }

    #[must_use]
    pub fn discount(mut self, amount_minor: i64) -> Self {
        self.discount_minor = Some(amount_minor);
        self
    }

    #[must_use]
    pub fn payment_to(mut self, payment_to: PaymentTo) -> Self {
        self.payment_to = Some(payment_to);
        self
    }

    #[must_use]
    pub fn account_id(mut self, account_id: Uuid) -> Self {
        self.account_id = Some(account_id);
        self
    }

    #[must_use]
    pub fn payment_date(mut self, date: NaiveDate) -> Self {
        self.payment_date = Some(date);
        self
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    #[must_use]
    pub fn allocations(mut self, lines: Vec<AllocationLine>) -> Self {
        self.allocations = Some(lines);
        self
    }
}

/// Record a payment to a vendor.
#[derive(Clone, Debug)]
pub struct CreateVendorPaymentCmd {
    pub company_id: String,
    pub vendor_id: Uuid,
    pub account_id: Uuid,
    pub amount_minor: i64,
    pub vendor_ait_minor: i64,
    pub payment_to: VendorPaymentTo,
    pub payment_date: NaiveDate,
    pub note: Option<String>,
    pub allocations: Vec<AllocationLine>,
}

impl CreateVendorPaymentCmd {
    #[must_use]
    pub fn new(
        company_id: impl Into<String>,
        vendor_id: Uuid,
        account_id: Uuid,
        amount_minor: i64,
        payment_to: VendorPaymentTo,
        payment_date: NaiveDate,
    ) -> Self {
        Self {
            company_id: company_id.into(),
            vendor_id,
            account_id,
            amount_minor,
            vendor_ait_minor: 0,
            payment_to,
            payment_date,
            note: None,
            allocations: Vec::new(),
        }
    }

    #[must_use]
    pub fn vendor_ait(mut self, amount_minor: i64) -> Self {
        self.vendor_ait_minor = amount_minor;
        self
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    #[must_use]
    pub fn allocate(mut self, invoice_id: Uuid, amount_minor: i64) -> Self {
        self.allocations.push(AllocationLine {
            invoice_id,
            amount_minor,
        });
        self
    }
}

/// Edit a vendor payment. The vendor, id and voucher number are kept.
#[derive(Clone, Debug, Default)]
pub struct VendorPaymentPatch {
    pub amount_minor: Option<i64>,
    pub vendor_ait_minor: Option<i64>,
    pub payment_to: Option<VendorPaymentTo>,
    pub account_id: Option<Uuid>,
    pub payment_date: Option<NaiveDate>,
    pub note: Option<String>,
    pub allocations: Option<Vec<AllocationLine>>,
}

impl VendorPaymentPatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn amount(mut self, amount_minor: i64) -> Self {
        self.amount_minor = Some(amount_minor);
        self
    }

    #[must_use]
    pub fn vendor_ait(mut self, amount_minor: i64) -> Self {
        self.vendor_ait_minor = Some(amount_minor);
        self
    }

    #[must_use]
    pub fn payment_to(mut self, payment_to: VendorPaymentTo) -> Self {
        self.payment_to = Some(payment_to);
        self
    }

    #[must_use]
    pub fn account_id(mut self, account_id: Uuid) -> Self {
        self.account_id = Some(account_id);
        self
    }

    #[must_use]
    pub fn payment_date(mut self, date: NaiveDate) -> Self {
        self.payment_date = Some(date);
        self
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    #[must_use]
    pub fn allocations(mut self, lines: Vec<AllocationLine>) -> Self {
        self.allocations = Some(lines);
        self
    }
}

/// Move money between two accounts.
#[derive(Clone, Debug)]
pub struct TransferCmd {
    pub company_id: String,
    pub from_account_id: Uuid,
    pub to_account_id: Uuid,
    pub amount_minor: i64,
    pub transfer_charge_minor: i64,
    pub charge_bearer: ChargeBearer,
    pub transfer_date: NaiveDate,
    pub note: Option<String>,
}

impl TransferCmd {
    #[must_use]
    pub fn new(
        company_id: impl Into<String>,
        from_account_id: Uuid,
        to_account_id: Uuid,
        amount_minor: i64,
        transfer_date: NaiveDate,
    ) -> Self {
        Self {
            company_id: company_id.into(),
            from_account_id,
            to_account_id,
            amount_minor,
            transfer_charge_minor: 0,
            charge_bearer: ChargeBearer::default(),
            transfer_date,
            note: None,
        }
    }

    #[must_use]
    pub fn charge(mut self, amount_minor: i64, bearer: ChargeBearer) -> Self {
        self.transfer_charge_minor = amount_minor;
        self.charge_bearer = bearer;
        self
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Edit a transfer.
#[derive(Clone, Debug, Default)]
pub struct TransferPatch {
    pub from_account_id: Option<Uuid>,
    pub to_account_id: Option<Uuid>,
    pub amount_minor: Option<i64>,
    pub transfer_charge_minor: Option<i64>,
    pub charge_bearer: Option<ChargeBearer>,
    pub transfer_date: Option<NaiveDate>,
    pub note: Option<String>,
}

impl TransferPatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn accounts(mut self, from_account_id: Uuid, to_account_id: Uuid) -> Self {
        self.from_account_id = Some(from_account_id);
        self.to_account_id = Some(to_account_id);
        self
    }

    #[must_use]
    pub fn amount(mut self, amount_minor: i64) -> Self {
        self.amount_minor = Some(amount_minor);
        self
    }

    #[must_use]
    pub fn charge(mut self, amount_minor: i64, bearer: ChargeBearer) -> Self {
        self.transfer_charge_minor = Some(amount_minor);
        self.charge_bearer = Some(bearer);
        self
    }

    #[must_use]
    pub fn transfer_date(mut self, date: NaiveDate) -> Self {
        self.transfer_date = Some(date);
        self
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Return advance credit to a client, or receive a refund from a vendor.
#[derive(Clone, Debug)]
pub struct AdvanceReturnCmd {
    pub company_id: String,
    pub party: Party,
    pub account_id: Uuid,
    pub amount_minor: i64,
    pub return_date: NaiveDate,
    pub note: Option<String>,
}

impl AdvanceReturnCmd {
    #[must_use]
    pub fn new(
        company_id: impl Into<String>,
        party: Party,
        account_id: Uuid,
        amount_minor: i64,
        return_date: NaiveDate,
    ) -> Self {
        Self {
            company_id: company_id.into(),
            party,
            account_id,
            amount_minor,
            return_date,
            note: None,
        }
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Edit an advance return. The party is kept.
#[derive(Clone, Debug, Default)]
pub struct AdvanceReturnPatch {
    pub account_id: Option<Uuid>,
    pub amount_minor: Option<i64>,
    pub return_date: Option<NaiveDate>,
    pub note: Option<String>,
}

impl AdvanceReturnPatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn account_id(mut self, account_id: Uuid) -> Self {
        self.account_id = Some(account_id);
        self
    }

    #[must_use]
    pub fn amount(mut self, amount_minor: i64) -> Self {
        self.amount_minor = Some(amount_minor);
        self
    }

    #[must_use]
    pub fn return_date(mut self, date: NaiveDate) -> Self {
        self.return_date = Some(date);
        self
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}
