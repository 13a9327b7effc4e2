//! Clients and their present balance projection.
//!
//! The present balance is signed: negative means the client owes the agency
//! (Due), positive means the agency holds client credit (Advance).

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: Uuid,
    pub company_id: String,
    pub name: String,
    pub category: Option<String>,
    pub credit_limit: MoneyCents,
    pub opening_balance: MoneyCents,
    pub present_balance: MoneyCents,
}

impl Client {
    /// Outstanding amount owed by the client (zero when in advance).
    #[must_use]
    pub fn due(&self) -> MoneyCents {
        if self.present_balance.is_negative() {
            -self.present_balance
        } else {
            MoneyCents::ZERO
        }
    }

    /// Credit held for the client (zero when in due).
    #[must_use]
    pub fn advance(&self) -> MoneyCents {
        if self.present_balance.is_positive() {
            self.present_balance
        } else {
            MoneyCents::ZERO
        }
    }

    /// `true` when the due exceeds a non-zero credit limit.
    #[must_use]
    pub fn is_over_credit_limit(&self) -> bool {
        self.credit_limit.is_positive() && self.due() > self.credit_limit
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "clients")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub company_id: String,
    pub name: String,
    pub category: Option<String>,
    pub credit_limit: i64,
    pub opening_balance: i64,
    pub present_balance: i64,
    pub version: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::invoices::Entity")]
    Invoices,
}

impl Related<super::invoices::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invoices.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Client {
    pub(crate) fn new(
        company_id: String,
        name: String,
        category: Option<String>,
        credit_limit: MoneyCents,
        opening_balance: MoneyCents,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            company_id,
            name,
            category,
            credit_limit,
            opening_balance,
            present_balance: opening_balance,
        }
    }

    pub(crate) fn to_active_model(&self, created_at: DateTime<Utc>) -> ActiveModel {
        ActiveModel {
            id: ActiveValue::Set(self.id.to_string()),
            company_id: ActiveValue::Set(self.company_id.clone()),
            name: ActiveValue::Set(self.name.clone()),
            category: ActiveValue::Set(self.category.clone()),
            credit_limit: ActiveValue::Set(self.credit_limit.cents()),
            opening_balance: ActiveValue::Set(self.opening_balance.cents()),
            present_balance: ActiveValue::Set(self.present_balance.cents()),
            version: ActiveValue::Set(0),
            created_at: ActiveValue::Set(created_at),
        }
    }
}

impl TryFrom<Model> for Client {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "client")?,
            company_id: model.company_id,
            name: model.name,
            category: model.category,
            credit_limit: MoneyCents::new(model.credit_limit),
            opening_balance: MoneyCents::new(model.opening_balance),
            present_balance: MoneyCents::new(model.present_balance),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(balance: i64, limit: i64) -> Client {
        let mut client = Client::new(
            "acme".to_string(),
            "Rahim Travels".to_string(),
            None,
            MoneyCents::new(limit),
            MoneyCents::ZERO,
        );
        client.present_balance = MoneyCents::new(balance);
        client
    }

    #[test]
    fn due_and_advance_split_the_sign() {
        let owing = client(-500, 0);
        assert_eq!(owing.due(), MoneyCents::new(500));
        assert_eq!(owing.advance(), MoneyCents::ZERO);

        let ahead = client(300, 0);
        assert_eq!(ahead.due(), MoneyCents::ZERO);
        assert_eq!(ahead.advance(), MoneyCents::new(300));
    }

    #[test]
    fn credit_limit_zero_means_unlimited() {
        assert!(!client(-1_000_000, 0).is_over_credit_limit());
        assert!(client(-1_001, 1_000).is_over_credit_limit());
        assert!(!client(-1_000, 1_000).is_over_credit_limit());
    }
}
