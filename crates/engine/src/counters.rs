//! Voucher counters, one row per `(series, company)`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Voucher number series. Each series numbers independently per company.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Series {
    Invoice,
    MoneyReceipt,
    VendorPayment,
    AdvanceReturn,
    BalanceTransfer,
    /// Reserved for expense vouchers; no engine operation issues it yet.
    Expense,
}

impl Series {
    pub fn code(self) -> &'static str {
        match self {
            Self::Invoice => "INV",
            Self::MoneyReceipt => "MR",
            Self::VendorPayment => "VP",
            Self::AdvanceReturn => "ADR",
            Self::BalanceTransfer => "BT",
            Self::Expense => "EXP",
        }
    }

    pub(crate) fn counter_key(self, company_id: &str) -> String {
        format!("{}:{company_id}", self.code())
    }

    /// `"<CODE>-<seq padded to 6 digits>"`, e.g. `MR-000042`.
    #[must_use]
    pub fn format(self, seq: i64) -> String {
        format!("{}-{seq:06}", self.code())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "counters")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub counter_key: String,
    pub seq: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voucher_format_is_code_and_padded_seq() {
        assert_eq!(Series::MoneyReceipt.format(42), "MR-000042");
        assert_eq!(Series::Invoice.format(1), "INV-000001");
        assert_eq!(Series::BalanceTransfer.format(1_234_567), "BT-1234567");
    }

    #[test]
    fn counter_key_scopes_by_company() {
        assert_eq!(Series::AdvanceReturn.counter_key("acme"), "ADR:acme");
        assert_ne!(
            Series::Expense.counter_key("acme"),
            Series::Expense.counter_key("globex")
        );
    }
}
