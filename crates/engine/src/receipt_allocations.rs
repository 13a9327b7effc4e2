//! Receipt allocations.
//!
//! The only link between a money receipt and the invoices it settles. Rows
//! are created and destroyed together with their receipt.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptAllocation {
    pub id: Uuid,
    pub money_receipt_id: Uuid,
    pub invoice_id: Uuid,
    pub client_id: Uuid,
    pub applied_amount: MoneyCents,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "receipt_allocations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub company_id: String,
    pub money_receipt_id: String,
    pub invoice_id: String,
    pub client_id: String,
    pub applied_amount: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::money_receipts::Entity",
        from = "Column::MoneyReceiptId",
        to = "super::money_receipts::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    MoneyReceipts,
}

impl Related<super::money_receipts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MoneyReceipts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub(crate) fn active_model(
    company_id: &str,
    money_receipt_id: Uuid,
    invoice_id: &str,
    client_id: Uuid,
    applied_amount: i64,
) -> ActiveModel {
    ActiveModel {
        id: ActiveValue::Set(Uuid::new_v4().to_string()),
        company_id: ActiveValue::Set(company_id.to_string()),
        money_receipt_id: ActiveValue::Set(money_receipt_id.to_string()),
        invoice_id: ActiveValue::Set(invoice_id.to_string()),
        client_id: ActiveValue::Set(client_id.to_string()),
        applied_amount: ActiveValue::Set(applied_amount),
    }
}

impl TryFrom<Model> for ReceiptAllocation {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "allocation")?,
            money_receipt_id: parse_uuid(&model.money_receipt_id, "money receipt")?,
            invoice_id: parse_uuid(&model.invoice_id, "invoice")?,
            client_id: parse_uuid(&model.client_id, "client")?,
            applied_amount: MoneyCents::new(model.applied_amount),
        })
    }
}
