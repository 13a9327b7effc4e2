//! Advance returns: credit handed back across the counter.
//!
//! For a client, the agency refunds client credit (money leaves the
//! account). For a vendor, the vendor refunds what the agency prepaid (money
//! enters the account).

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Party {
    Client(Uuid),
    Vendor(Uuid),
}

impl Party {
    pub(crate) fn kind_str(self) -> &'static str {
        match self {
            Self::Client(_) => "client",
            Self::Vendor(_) => "vendor",
        }
    }

    pub(crate) fn id(self) -> Uuid {
        match self {
            Self::Client(id) | Self::Vendor(id) => id,
        }
    }

    fn from_parts(kind: &str, id: &str) -> Result<Self, EngineError> {
        match kind {
            "client" => Ok(Self::Client(parse_uuid(id, "client")?)),
            "vendor" => Ok(Self::Vendor(parse_uuid(id, "vendor")?)),
            other => Err(EngineError::Validation(format!(
                "invalid advance return party: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvanceReturn {
    pub id: Uuid,
    pub company_id: String,
    pub voucher_no: String,
    pub party: Party,
    pub amount: MoneyCents,
    pub account_id: Uuid,
    pub return_date: NaiveDate,
    pub note: Option<String>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "advance_returns")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub company_id: String,
    pub voucher_no: String,
    pub party_kind: String,
    pub party_id: String,
    pub amount: i64,
    pub account_id: String,
    pub return_date: Date,
    pub note: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub(crate) fn party(&self) -> Result<Party, EngineError> {
        Party::from_parts(&self.party_kind, &self.party_id)
    }
}

impl AdvanceReturn {
    pub(crate) fn to_active_model(&self, created_at: DateTime<Utc>) -> ActiveModel {
        ActiveModel {
            id: ActiveValue::Set(self.id.to_string()),
            company_id: ActiveValue::Set(self.company_id.clone()),
            voucher_no: ActiveValue::Set(self.voucher_no.clone()),
            party_kind: ActiveValue::Set(self.party.kind_str().to_string()),
            party_id: ActiveValue::Set(self.party.id().to_string()),
            amount: ActiveValue::Set(self.amount.cents()),
            account_id: ActiveValue::Set(self.account_id.to_string()),
            return_date: ActiveValue::Set(self.return_date),
            note: ActiveValue::Set(self.note.clone()),
            created_at: ActiveValue::Set(created_at),
        }
    }
}

impl TryFrom<Model> for AdvanceReturn {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let party = model.party()?;
        Ok(Self {
            id: parse_uuid(&model.id, "advance return")?,
            company_id: model.company_id,
            voucher_no: model.voucher_no,
            party,
            amount: MoneyCents::new(model.amount),
            account_id: parse_uuid(&model.account_id, "account")?,
            return_date: model.return_date,
            note: model.note,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn party_round_trips_through_storage_columns() {
        let id = Uuid::new_v4();
        for party in [Party::Client(id), Party::Vendor(id)] {
            let parsed = Party::from_parts(party.kind_str(), &party.id().to_string()).unwrap();
            assert_eq!(parsed, party);
        }
        assert!(Party::from_parts("agent", &id.to_string()).is_err());
    }
}
