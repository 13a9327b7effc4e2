//! Money receipts: cash received from a client.
//!
//! A receipt always credits the client and the receiving account by its full
//! `amount`. How much of it is applied to invoices depends on [`PaymentTo`].

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, MoneyCents, ReceiptAllocation, allocation::AllocationMode, util::parse_uuid,
};

/// Where a receipt is routed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentTo {
    /// Settle the client's open invoices, oldest first.
    Overall,
    /// Keep everything as client credit.
    Advance,
    /// Settle the listed invoices; overpaying one is an error.
    Invoice,
    /// Settle the listed ticket invoices; same rules as `Invoice`.
    Tickets,
    /// Settle the listed invoices up to their due; the excess stays credit.
    Adjust,
}

impl PaymentTo {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Overall => "overall",
            Self::Advance => "advance",
            Self::Invoice => "invoice",
            Self::Tickets => "tickets",
            Self::Adjust => "adjust",
        }
    }

    pub(crate) fn allocation_mode(self) -> AllocationMode {
        match self {
            Self::Overall => AllocationMode::Fifo,
            Self::Advance => AllocationMode::Unallocated,
            Self::Invoice | Self::Tickets => AllocationMode::Exact,
            Self::Adjust => AllocationMode::Clamped,
        }
    }
}

impl TryFrom<&str> for PaymentTo {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "overall" => Ok(Self::Overall),
            "advance" => Ok(Self::Advance),
            "invoice" => Ok(Self::Invoice),
            "tickets" => Ok(Self::Tickets),
            "adjust" => Ok(Self::Adjust),
            other => Err(EngineError::Validation(format!(
                "invalid payment target: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoneyReceipt {
    pub id: Uuid,
    pub company_id: String,
    pub voucher_no: String,
    pub client_id: Uuid,
    pub amount: MoneyCents,
    pub discount: MoneyCents,
    pub payment_to: PaymentTo,
    pub account_id: Uuid,
    pub payment_date: NaiveDate,
    pub note: Option<String>,
    pub allocations: Vec<ReceiptAllocation>,
}

impl MoneyReceipt {
    /// Part of the receipt not applied to any invoice.
    #[must_use]
    pub fn unallocated(&self) -> MoneyCents {
        let applied: MoneyCents = self.allocations.iter().map(|a| a.applied_amount).sum();
        self.amount - self.discount - applied
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "money_receipts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub company_id: String,
    pub voucher_no: String,
    pub client_id: String,
    pub amount: i64,
    pub discount: i64,
    pub payment_to: String,
    pub account_id: String,
    pub payment_date: Date,
    pub note: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::receipt_allocations::Entity")]
    Allocations,
}

impl Related<super::receipt_allocations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Allocations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// The mutable part of a receipt: everything an edit may change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ReceiptTerms {
    pub amount: i64,
    pub discount: i64,
    pub payment_to: PaymentTo,
    pub account_id: Uuid,
    pub payment_date: NaiveDate,
    pub note: Option<String>,
}

impl Model {
    pub(crate) fn terms(&self) -> Result<ReceiptTerms, EngineError> {
        Ok(ReceiptTerms {
            amount: self.amount,
            discount: self.discount,
            payment_to: PaymentTo::try_from(self.payment_to.as_str())?,
            account_id: parse_uuid(&self.account_id, "account")?,
            payment_date: self.payment_date,
            note: self.note.clone(),
        })
    }
}

pub(crate) fn active_model(
    id: Uuid,
    company_id: &str,
    voucher_no: &str,
    client_id: Uuid,
    terms: &ReceiptTerms,
    created_at: DateTime<Utc>,
) -> ActiveModel {
    ActiveModel {
        id: ActiveValue::Set(id.to_string()),
        company_id: ActiveValue::Set(company_id.to_string()),
        voucher_no: ActiveValue::Set(voucher_no.to_string()),
        client_id: ActiveValue::Set(client_id.to_string()),
        amount: ActiveValue::Set(terms.amount),
        discount: ActiveValue::Set(terms.discount),
        payment_to: ActiveValue::Set(terms.payment_to.as_str().to_string()),
        account_id: ActiveValue::Set(terms.account_id.to_string()),
        payment_date: ActiveValue::Set(terms.payment_date),
        note: ActiveValue::Set(terms.note.clone()),
        created_at: ActiveValue::Set(created_at),
    }
}

impl TryFrom<Model> for MoneyReceipt {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "money receipt")?,
            company_id: model.company_id,
            voucher_no: model.voucher_no,
            client_id: parse_uuid(&model.client_id, "client")?,
            amount: MoneyCents::new(model.amount),
            discount: MoneyCents::new(model.discount),
            payment_to: PaymentTo::try_from(model.payment_to.as_str())?,
            account_id: parse_uuid(&model.account_id, "account")?,
            payment_date: model.payment_date,
            note: model.note,
            allocations: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_target_has_a_handler() {
        assert_eq!(PaymentTo::Overall.allocation_mode(), AllocationMode::Fifo);
        assert_eq!(
            PaymentTo::Advance.allocation_mode(),
            AllocationMode::Unallocated
        );
        assert_eq!(PaymentTo::Invoice.allocation_mode(), AllocationMode::Exact);
        assert_eq!(PaymentTo::Tickets.allocation_mode(), AllocationMode::Exact);
        assert_eq!(PaymentTo::Adjust.allocation_mode(), AllocationMode::Clamped);
    }

    #[test]
    fn unknown_target_is_rejected() {
        assert!(PaymentTo::try_from("refund").is_err());
        assert_eq!(PaymentTo::try_from("tickets").unwrap(), PaymentTo::Tickets);
    }
}
