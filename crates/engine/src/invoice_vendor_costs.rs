//! Vendor cost lines attached to an invoice.
//!
//! Each line says "this invoice cost us `cost` at `vendor`". Creating the
//! line raises the vendor's Due; vendor payment allocations settle it and
//! `paid_amount` mirrors their sum.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorCost {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub vendor_id: Uuid,
    pub cost: MoneyCents,
    pub paid_amount: MoneyCents,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "invoice_vendor_costs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub company_id: String,
    pub invoice_id: String,
    pub vendor_id: String,
    pub cost: i64,
    pub paid_amount: i64,
    pub version: i64,
    pub created_at: DateTimeUtc,
}

impl Model {
    pub(crate) fn remaining(&self) -> i64 {
        self.cost - self.paid_amount
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::invoices::Entity",
        from = "Column::InvoiceId",
        to = "super::invoices::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Invoices,
}

impl Related<super::invoices::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invoices.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub(crate) fn new_active_model(
    company_id: &str,
    invoice_id: Uuid,
    vendor_id: Uuid,
    cost: i64,
    created_at: DateTime<Utc>,
) -> ActiveModel {
    ActiveModel {
        id: ActiveValue::Set(Uuid::new_v4().to_string()),
        company_id: ActiveValue::Set(company_id.to_string()),
        invoice_id: ActiveValue::Set(invoice_id.to_string()),
        vendor_id: ActiveValue::Set(vendor_id.to_string()),
        cost: ActiveValue::Set(cost),
        paid_amount: ActiveValue::Set(0),
        version: ActiveValue::Set(0),
        created_at: ActiveValue::Set(created_at),
    }
}

impl TryFrom<Model> for VendorCost {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "vendor cost")?,
            invoice_id: parse_uuid(&model.invoice_id, "invoice")?,
            vendor_id: parse_uuid(&model.vendor_id, "vendor")?,
            cost: MoneyCents::new(model.cost),
            paid_amount: MoneyCents::new(model.paid_amount),
        })
    }
}
