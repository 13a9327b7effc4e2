//! Vendors and their signed-magnitude balance.
//!
//! A vendor balance is never stored as a negative number. It is a pair
//! `{kind, amount}` where `Due` means the agency owes the vendor and
//! `Advance` means the agency has prepaid the vendor. Every change goes
//! through [`VendorBalance::apply`], which reclassifies the kind when a
//! delta crosses zero.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceKind {
    Due,
    Advance,
}

impl BalanceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Due => "due",
            Self::Advance => "advance",
        }
    }
}

impl TryFrom<&str> for BalanceKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "due" => Ok(Self::Due),
            "advance" => Ok(Self::Advance),
            other => Err(EngineError::Validation(format!(
                "invalid balance kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorBalance {
    pub kind: BalanceKind,
    /// Always `>= 0`.
    pub amount: MoneyCents,
}

impl VendorBalance {
    pub const SETTLED: VendorBalance = VendorBalance {
        kind: BalanceKind::Due,
        amount: MoneyCents::ZERO,
    };

    #[must_use]
    pub fn due(amount: MoneyCents) -> Self {
        Self::from_signed(-amount.abs())
    }

    #[must_use]
    pub fn advance(amount: MoneyCents) -> Self {
        Self::from_signed(amount.abs())
    }

    /// Builds a balance from its signed form (positive = Advance).
    #[must_use]
    pub fn from_signed(signed: MoneyCents) -> Self {
        if signed.is_positive() {
            Self {
                kind: BalanceKind::Advance,
                amount: signed,
            }
        } else {
            Self {
                kind: BalanceKind::Due,
                amount: -signed,
            }
        }
    }

    /// Signed form: Advance positive, Due negative.
    #[must_use]
    pub fn signed(self) -> MoneyCents {
        match self.kind {
            BalanceKind::Due => -self.amount,
            BalanceKind::Advance => self.amount,
        }
    }

    /// Applies a signed delta. Paying the vendor is a positive delta (reduces
    /// Due, then builds Advance); a new vendor cost is a negative delta.
    ///
    /// `None` when the result does not fit the balance amount.
    #[must_use]
    pub fn apply(self, delta: MoneyCents) -> Option<Self> {
        self.signed()
            .checked_add(delta)
            .filter(|signed| signed.cents() != i64::MIN)
            .map(Self::from_signed)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vendor {
    pub id: Uuid,
    pub company_id: String,
    pub name: String,
    pub opening_balance: VendorBalance,
    pub present_balance: VendorBalance,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "vendors")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub company_id: String,
    pub name: String,
    /// Signed (positive = Advance).
    pub opening_balance: i64,
    pub balance_kind: String,
    pub balance_amount: i64,
    pub version: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub(crate) fn balance(&self) -> Result<VendorBalance, EngineError> {
        Ok(VendorBalance {
            kind: BalanceKind::try_from(self.balance_kind.as_str())?,
            amount: MoneyCents::new(self.balance_amount),
        })
    }
}

impl Vendor {
    pub(crate) fn new(company_id: String, name: String, opening_balance: VendorBalance) -> Self {
        Self {
            id: Uuid::new_v4(),
            company_id,
            name,
            opening_balance,
            present_balance: opening_balance,
        }
    }

    pub(crate) fn to_active_model(&self, created_at: DateTime<Utc>) -> ActiveModel {
        ActiveModel {
            id: ActiveValue::Set(self.id.to_string()),
            company_id: ActiveValue::Set(self.company_id.clone()),
            name: ActiveValue::Set(self.name.clone()),
            opening_balance: ActiveValue::Set(self.opening_balance.signed().cents()),
            balance_kind: ActiveValue::Set(self.present_balance.kind.as_str().to_string()),
            balance_amount: ActiveValue::Set(self.present_balance.amount.cents()),
            version: ActiveValue::Set(0),
            created_at: ActiveValue::Set(created_at),
        }
    }
}

impl TryFrom<Model> for Vendor {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let present_balance = model.balance()?;
        Ok(Self {
            id: parse_uuid(&model.id, "vendor")?,
            company_id: model.company_id,
            name: model.name,
            opening_balance: VendorBalance::from_signed(MoneyCents::new(model.opening_balance)),
            present_balance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn payment_larger_than_due_flips_to_advance() {
        let owed = VendorBalance::due(MoneyCents::new(1_000));
        let after = owed.apply(MoneyCents::new(1_500)).unwrap();
        assert_eq!(after.kind, BalanceKind::Advance);
        assert_eq!(after.amount, MoneyCents::new(500));
    }

    #[test]
    fn cost_larger_than_advance_flips_to_due() {
        let prepaid = VendorBalance::advance(MoneyCents::new(200));
        let after = prepaid.apply(MoneyCents::new(-700)).unwrap();
        assert_eq!(after, VendorBalance::due(MoneyCents::new(500)));
    }

    #[test]
    fn exact_settlement_is_zero_due() {
        let owed = VendorBalance::due(MoneyCents::new(300));
        assert_eq!(owed.apply(MoneyCents::new(300)), Some(VendorBalance::SETTLED));
    }

    #[test]
    fn overflowing_delta_is_refused() {
        let prepaid = VendorBalance::advance(MoneyCents::new(i64::MAX));
        assert_eq!(prepaid.apply(MoneyCents::new(1)), None);
        let owed = VendorBalance::due(MoneyCents::new(i64::MAX));
        assert_eq!(owed.apply(MoneyCents::new(-1)), None);
    }

    proptest! {
        #[test]
        fn amount_is_never_negative(start in -1_000_000i64..1_000_000, delta in -1_000_000i64..1_000_000) {
            let balance = VendorBalance::from_signed(MoneyCents::new(start))
                .apply(MoneyCents::new(delta))
                .unwrap();
            prop_assert!(balance.amount.cents() >= 0);
            prop_assert_eq!(balance.signed().cents(), start + delta);
        }

        #[test]
        fn apply_then_reverse_restores(start in -1_000_000i64..1_000_000, delta in -1_000_000i64..1_000_000) {
            let before = VendorBalance::from_signed(MoneyCents::new(start));
            let after = before
                .apply(MoneyCents::new(delta))
                .and_then(|balance| balance.apply(MoneyCents::new(-delta)));
            prop_assert_eq!(after, Some(before));
        }
    }
}
