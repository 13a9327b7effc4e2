//! Accounts: the places where the agency's money physically sits.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    Cash,
    Bank,
    MobileBanking,
    CreditCard,
}

impl AccountKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Bank => "bank",
            Self::MobileBanking => "mobile_banking",
            Self::CreditCard => "credit_card",
        }
    }

    /// Only credit lines may be drawn below zero.
    pub fn allows_overdraft(self) -> bool {
        matches!(self, Self::CreditCard)
    }
}

impl TryFrom<&str> for AccountKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "cash" => Ok(Self::Cash),
            "bank" => Ok(Self::Bank),
            "mobile_banking" => Ok(Self::MobileBanking),
            "credit_card" => Ok(Self::CreditCard),
            other => Err(EngineError::Validation(format!(
                "invalid account kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub company_id: String,
    pub name: String,
    pub kind: AccountKind,
    pub opening_balance: MoneyCents,
    /// Running balance; positive means money held.
    pub balance: MoneyCents,
    /// Set the first time an event moves the balance. Never cleared.
    pub has_activity: bool,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub company_id: String,
    pub name: String,
    pub kind: String,
    pub opening_balance: i64,
    pub balance: i64,
    pub has_activity: bool,
    pub version: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Account {
    pub(crate) fn new(
        company_id: String,
        name: String,
        kind: AccountKind,
        opening_balance: MoneyCents,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            company_id,
            name,
            kind,
            opening_balance,
            balance: opening_balance,
            has_activity: false,
        }
    }

    pub(crate) fn to_active_model(&self, created_at: DateTime<Utc>) -> ActiveModel {
        ActiveModel {
            id: ActiveValue::Set(self.id.to_string()),
            company_id: ActiveValue::Set(self.company_id.clone()),
            name: ActiveValue::Set(self.name.clone()),
            kind: ActiveValue::Set(self.kind.as_str().to_string()),
            opening_balance: ActiveValue::Set(self.opening_balance.cents()),
            balance: ActiveValue::Set(self.balance.cents()),
            has_activity: ActiveValue::Set(self.has_activity),
            version: ActiveValue::Set(0),
            created_at: ActiveValue::Set(created_at),
        }
    }
}

impl TryFrom<Model> for Account {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "account")?,
            company_id: model.company_id,
            name: model.name,
            kind: AccountKind::try_from(model.kind.as_str())?,
            opening_balance: MoneyCents::new(model.opening_balance),
            balance: MoneyCents::new(model.balance),
            has_activity: model.has_activity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_storage_strings() {
        for kind in [
            AccountKind::Cash,
            AccountKind::Bank,
            AccountKind::MobileBanking,
            AccountKind::CreditCard,
        ] {
            assert_eq!(AccountKind::try_from(kind.as_str()).unwrap(), kind);
        }
        assert!(AccountKind::try_from("wallet").is_err());
    }

    #[test]
    fn new_account_starts_without_activity() {
        let account = Account::new(
            "acme".to_string(),
            "Petty cash".to_string(),
            AccountKind::Cash,
            MoneyCents::new(10_000),
        );
        assert_eq!(account.balance, MoneyCents::new(10_000));
        assert!(!account.has_activity);
    }
}
