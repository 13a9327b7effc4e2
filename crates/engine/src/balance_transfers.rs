//! Balance transfers between two accounts of the same company.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, util::parse_uuid};

/// Who pays the transfer charge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargeBearer {
    /// The destination receives `amount - charge`.
    #[default]
    Receiver,
    /// The source pays `amount + charge`.
    Sender,
}

impl ChargeBearer {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Receiver => "receiver",
            Self::Sender => "sender",
        }
    }
}

impl TryFrom<&str> for ChargeBearer {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "receiver" => Ok(Self::Receiver),
            "sender" => Ok(Self::Sender),
            other => Err(EngineError::Validation(format!(
                "invalid charge bearer: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceTransfer {
    pub id: Uuid,
    pub company_id: String,
    pub voucher_no: String,
    pub from_account_id: Uuid,
    pub to_account_id: Uuid,
    pub amount: MoneyCents,
    pub transfer_charge: MoneyCents,
    pub charge_bearer: ChargeBearer,
    pub transfer_date: NaiveDate,
    pub note: Option<String>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "balance_transfers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub company_id: String,
    pub voucher_no: String,
    pub from_account_id: String,
    pub to_account_id: String,
    pub amount: i64,
    pub transfer_charge: i64,
    pub charge_bearer: String,
    pub transfer_date: Date,
    pub note: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// The two account movements a transfer produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct TransferLegs {
    pub debit_from: i64,
    pub credit_to: i64,
}

/// Source outflow and destination inflow for the given charge bearer.
pub(crate) fn transfer_legs(amount: i64, charge: i64, bearer: ChargeBearer) -> TransferLegs {
    match bearer {
        ChargeBearer::Receiver => TransferLegs {
            debit_from: amount,
            credit_to: amount - charge,
        },
        ChargeBearer::Sender => TransferLegs {
            debit_from: amount + charge,
            credit_to: amount,
        },
    }
}

impl Model {
    pub(crate) fn legs(&self) -> Result<TransferLegs, EngineError> {
        let bearer = ChargeBearer::try_from(self.charge_bearer.as_str())?;
        Ok(transfer_legs(self.amount, self.transfer_charge, bearer))
    }
}

impl BalanceTransfer {
    pub(crate) fn to_active_model(&self, created_at: DateTime<Utc>) -> ActiveModel {
        ActiveModel {
            id: ActiveValue::Set(self.id.to_string()),
            company_id: ActiveValue::Set(self.company_id.clone()),
            voucher_no: ActiveValue::Set(self.voucher_no.clone()),
            from_account_id: ActiveValue::Set(self.from_account_id.to_string()),
            to_account_id: ActiveValue::Set(self.to_account_id.to_string()),
            amount: ActiveValue::Set(self.amount.cents()),
            transfer_charge: ActiveValue::Set(self.transfer_charge.cents()),
            charge_bearer: ActiveValue::Set(self.charge_bearer.as_str().to_string()),
            transfer_date: ActiveValue::Set(self.transfer_date),
            note: ActiveValue::Set(self.note.clone()),
            created_at: ActiveValue::Set(created_at),
        }
    }
}

impl TryFrom<Model> for BalanceTransfer {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "balance transfer")?,
            company_id: model.company_id,
            voucher_no: model.voucher_no,
            from_account_id: parse_uuid(&model.from_account_id, "account")?,
            to_account_id: parse_uuid(&model.to_account_id, "account")?,
            amount: MoneyCents::new(model.amount),
            transfer_charge: MoneyCents::new(model.transfer_charge),
            charge_bearer: ChargeBearer::try_from(model.charge_bearer.as_str())?,
            transfer_date: model.transfer_date,
            note: model.note,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receiver_bears_the_charge_by_default() {
        assert_eq!(ChargeBearer::default(), ChargeBearer::Receiver);
        let legs = transfer_legs(10_000, 250, ChargeBearer::Receiver);
        assert_eq!(legs.debit_from, 10_000);
        assert_eq!(legs.credit_to, 9_750);
    }

    #[test]
    fn sender_pays_amount_plus_charge() {
        let legs = transfer_legs(10_000, 250, ChargeBearer::Sender);
        assert_eq!(legs.debit_from, 10_250);
        assert_eq!(legs.credit_to, 10_000);
    }
}
