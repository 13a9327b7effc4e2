//! Client invoices.
//!
//! `received_amount` is a projection: it always equals the sum of the
//! invoice's receipt allocations. `status` is never stored independently of
//! it; every write goes through [`InvoiceStatus::derive`].

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Due,
    Partial,
    Paid,
}

impl InvoiceStatus {
    /// `paid` iff received >= net total, `partial` iff 0 < received < net
    /// total, `due` otherwise.
    #[must_use]
    pub fn derive(received: MoneyCents, net_total: MoneyCents) -> Self {
        if received >= net_total {
            Self::Paid
        } else if received.is_positive() {
            Self::Partial
        } else {
            Self::Due
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Due => "due",
            Self::Partial => "partial",
            Self::Paid => "paid",
        }
    }
}

impl TryFrom<&str> for InvoiceStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "due" => Ok(Self::Due),
            "partial" => Ok(Self::Partial),
            "paid" => Ok(Self::Paid),
            other => Err(EngineError::Validation(format!(
                "invalid invoice status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: Uuid,
    pub company_id: String,
    pub invoice_no: String,
    pub client_id: Uuid,
    pub invoice_date: NaiveDate,
    pub net_total: MoneyCents,
    pub received_amount: MoneyCents,
    pub status: InvoiceStatus,
    pub note: Option<String>,
    pub vendor_costs: Vec<crate::VendorCost>,
}

impl Invoice {
    #[must_use]
    pub fn remaining_due(&self) -> MoneyCents {
        self.net_total - self.received_amount
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "invoices")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub company_id: String,
    pub invoice_no: String,
    pub client_id: String,
    pub invoice_date: Date,
    pub net_total: i64,
    pub received_amount: i64,
    pub status: String,
    pub note: Option<String>,
    pub version: i64,
    pub created_at: DateTimeUtc,
}

impl Model {
    pub(crate) fn remaining_due(&self) -> i64 {
        self.net_total - self.received_amount
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::clients::Entity",
        from = "Column::ClientId",
        to = "super::clients::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Clients,
    #[sea_orm(has_many = "super::invoice_vendor_costs::Entity")]
    VendorCosts,
}

impl Related<super::clients::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Clients.def()
    }
}

impl Related<super::invoice_vendor_costs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VendorCosts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub(crate) struct NewInvoice<'a> {
    pub id: Uuid,
    pub company_id: &'a str,
    pub invoice_no: &'a str,
    pub client_id: Uuid,
    pub invoice_date: NaiveDate,
    pub net_total: i64,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<NewInvoice<'_>> for ActiveModel {
    fn from(new: NewInvoice<'_>) -> Self {
        let status = InvoiceStatus::derive(MoneyCents::ZERO, MoneyCents::new(new.net_total));
        Self {
            id: ActiveValue::Set(new.id.to_string()),
            company_id: ActiveValue::Set(new.company_id.to_string()),
            invoice_no: ActiveValue::Set(new.invoice_no.to_string()),
            client_id: ActiveValue::Set(new.client_id.to_string()),
            invoice_date: ActiveValue::Set(new.invoice_date),
            net_total: ActiveValue::Set(new.net_total),
            received_amount: ActiveValue::Set(0),
            status: ActiveValue::Set(status.as_str().to_string()),
            note: ActiveValue::Set(new.note),
            version: ActiveValue::Set(0),
            created_at: ActiveValue::Set(new.created_at),
        }
    }
}

impl TryFrom<Model> for Invoice {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "invoice")?,
            company_id: model.company_id,
            invoice_no: model.invoice_no,
            client_id: parse_uuid(&model.client_id, "client")?,
            invoice_date: model.invoice_date,
            net_total: MoneyCents::new(model.net_total),
            received_amount: MoneyCents::new(model.received_amount),
            status: InvoiceStatus::try_from(model.status.as_str())?,
            note: model.note,
            vendor_costs: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_derivation() {
        let net = MoneyCents::new(1000);
        assert_eq!(InvoiceStatus::derive(MoneyCents::new(0), net), InvoiceStatus::Due);
        assert_eq!(
            InvoiceStatus::derive(MoneyCents::new(500), net),
            InvoiceStatus::Partial
        );
        assert_eq!(
            InvoiceStatus::derive(MoneyCents::new(1000), net),
            InvoiceStatus::Paid
        );
    }

    #[test]
    fn zero_total_invoice_is_paid() {
        assert_eq!(
            InvoiceStatus::derive(MoneyCents::ZERO, MoneyCents::ZERO),
            InvoiceStatus::Paid
        );
    }

    #[test]
    fn status_round_trips_through_storage_strings() {
        for status in [InvoiceStatus::Due, InvoiceStatus::Partial, InvoiceStatus::Paid] {
            assert_eq!(InvoiceStatus::try_from(status.as_str()).unwrap(), status);
        }
    }
}
