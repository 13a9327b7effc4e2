//! Vendor payments: money the agency pays out to a vendor.
//!
//! `total_amount = amount + vendor_ait` moves the vendor balance toward
//! Advance; only `amount` leaves the paying account.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, MoneyCents, VendorAllocation, allocation::AllocationMode, util::parse_uuid,
};

/// Where a vendor payment is routed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VendorPaymentTo {
    /// Settle the vendor's open cost lines, oldest invoice first.
    Overall,
    /// Prepay the vendor.
    Advance,
    /// Settle the cost lines of the listed invoices exactly.
    Invoice,
    /// Settle the listed invoices up to their open cost; the rest is prepaid.
    Adjust,
}

impl VendorPaymentTo {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Overall => "overall",
            Self::Advance => "advance",
            Self::Invoice => "invoice",
            Self::Adjust => "adjust",
        }
    }

    pub(crate) fn allocation_mode(self) -> AllocationMode {
        match self {
            Self::Overall => AllocationMode::Fifo,
            Self::Advance => AllocationMode::Unallocated,
            Self::Invoice => AllocationMode::Exact,
            Self::Adjust => AllocationMode::Clamped,
        }
    }
}

impl TryFrom<&str> for VendorPaymentTo {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "overall" => Ok(Self::Overall),
            "advance" => Ok(Self::Advance),
            "invoice" => Ok(Self::Invoice),
            "adjust" => Ok(Self::Adjust),
            other => Err(EngineError::Validation(format!(
                "invalid vendor payment target: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorPayment {
    pub id: Uuid,
    pub company_id: String,
    pub voucher_no: String,
    pub vendor_id: Uuid,
    pub amount: MoneyCents,
    pub vendor_ait: MoneyCents,
    pub total_amount: MoneyCents,
    pub payment_to: VendorPaymentTo,
    pub account_id: Uuid,
    pub payment_date: NaiveDate,
    pub note: Option<String>,
    pub allocations: Vec<VendorAllocation>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "vendor_payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub company_id: String,
    pub voucher_no: String,
    pub vendor_id: String,
    pub amount: i64,
    pub vendor_ait: i64,
    pub total_amount: i64,
    pub payment_to: String,
    pub account_id: String,
    pub payment_date: Date,
    pub note: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::vendor_allocations::Entity")]
    Allocations,
}

impl Related<super::vendor_allocations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Allocations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct VendorPaymentTerms {
    pub amount: i64,
    pub vendor_ait: i64,
    pub payment_to: VendorPaymentTo,
    pub account_id: Uuid,
    pub payment_date: NaiveDate,
    pub note: Option<String>,
}

impl VendorPaymentTerms {
    pub(crate) fn total(&self) -> i64 {
        self.amount + self.vendor_ait
    }
}

impl Model {
    pub(crate) fn terms(&self) -> Result<VendorPaymentTerms, EngineError> {
        Ok(VendorPaymentTerms {
            amount: self.amount,
            vendor_ait: self.vendor_ait,
            payment_to: VendorPaymentTo::try_from(self.payment_to.as_str())?,
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
    vendor_id: Uuid,
    terms: &VendorPaymentTerms,
    created_at: DateTime<Utc>,
) -> ActiveModel {
    ActiveModel {
        id: ActiveValue::Set(id.to_string()),
        company_id: ActiveValue::Set(company_id.to_string()),
        voucher_no: ActiveValue::Set(voucher_no.to_string()),
        vendor_id: ActiveValue::Set(vendor_id.to_string()),
        amount: ActiveValue::Set(terms.amount),
        vendor_ait: ActiveValue::Set(terms.vendor_ait),
        total_amount: ActiveValue::Set(terms.total()),
        payment_to: ActiveValue::Set(terms.payment_to.as_str().to_string()),
        account_id: ActiveValue::Set(terms.account_id.to_string()),
        payment_date: ActiveValue::Set(terms.payment_date),
        note: ActiveValue::Set(terms.note.clone()),
        created_at: ActiveValue::Set(created_at),
    }
}

impl TryFrom<Model> for VendorPayment {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "vendor payment")?,
            company_id: model.company_id,
            voucher_no: model.voucher_no,
            vendor_id: parse_uuid(&model.vendor_id, "vendor")?,
            amount: MoneyCents::new(model.amount),
            vendor_ait: MoneyCents::new(model.vendor_ait),
            total_amount: MoneyCents::new(model.total_amount),
            payment_to: VendorPaymentTo::try_from(model.payment_to.as_str())?,
            account_id: parse_uuid(&model.account_id, "account")?,
            payment_date: model.payment_date,
            note: model.note,
            allocations: Vec::new(),
        })
    }
}
