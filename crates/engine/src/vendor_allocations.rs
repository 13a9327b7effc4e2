//! Vendor payment allocations against invoice vendor cost lines.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorAllocation {
    pub id: Uuid,
    pub vendor_payment_id: Uuid,
    pub cost_id: Uuid,
    pub invoice_id: Uuid,
    pub vendor_id: Uuid,
    pub applied_amount: MoneyCents,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "vendor_allocations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub company_id: String,
    pub vendor_payment_id: String,
    pub cost_id: String,
    pub invoice_id: String,
    pub vendor_id: String,
    pub applied_amount: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::vendor_payments::Entity",
        from = "Column::VendorPaymentId",
        to = "super::vendor_payments::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    VendorPayments,
}

impl Related<super::vendor_payments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VendorPayments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub(crate) struct NewVendorAllocation<'a> {
    pub company_id: &'a str,
    pub vendor_payment_id: Uuid,
    pub cost: &'a super::invoice_vendor_costs::Model,
    pub applied_amount: i64,
}

impl From<NewVendorAllocation<'_>> for ActiveModel {
    fn from(new: NewVendorAllocation<'_>) -> Self {
        Self {
            id: ActiveValue::Set(Uuid::new_v4().to_string()),
            company_id: ActiveValue::Set(new.company_id.to_string()),
            vendor_payment_id: ActiveValue::Set(new.vendor_payment_id.to_string()),
            cost_id: ActiveValue::Set(new.cost.id.clone()),
            invoice_id: ActiveValue::Set(new.cost.invoice_id.clone()),
            vendor_id: ActiveValue::Set(new.cost.vendor_id.clone()),
            applied_amount: ActiveValue::Set(new.applied_amount),
        }
    }
}

impl TryFrom<Model> for VendorAllocation {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "allocation")?,
            vendor_payment_id: parse_uuid(&model.vendor_payment_id, "vendor payment")?,
            cost_id: parse_uuid(&model.cost_id, "vendor cost")?,
            invoice_id: parse_uuid(&model.invoice_id, "invoice")?,
            vendor_id: parse_uuid(&model.vendor_id, "vendor")?,
            applied_amount: MoneyCents::new(model.applied_amount),
        })
    }
}
