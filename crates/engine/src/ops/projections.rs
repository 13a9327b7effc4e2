//! Projection deltas collected while planning an event, persisted in one go.
//!
//! Operations never write balances directly. They push signed deltas into a
//! [`ProjectionChanges`] (reversal first, then the new effect for edits) and
//! hand it to [`Engine::persist_changes`], which loads each row once, checks
//! the invariants on the final value and writes it with an optimistic
//! `version` check.

use std::collections::BTreeMap;

use sea_orm::{DatabaseTransaction, QueryFilter, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{
    AccountKind, EngineError, InvoiceStatus, MoneyCents, ResultEngine, accounts, clients,
    invoice_vendor_costs, invoices, util::checked_apply, vendors,
};

use super::Engine;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct AccountDelta {
    delta: i64,
    /// The event draws money out of the account; subject to the overdraft
    /// rule.
    guarded: bool,
}

#[derive(Debug, Default)]
pub(crate) struct ProjectionChanges {
    accounts: BTreeMap<String, AccountDelta>,
    clients: BTreeMap<String, i64>,
    vendors: BTreeMap<String, i64>,
    invoices: BTreeMap<String, i64>,
    vendor_costs: BTreeMap<String, i64>,
}

impl ProjectionChanges {
    pub(crate) fn account_inflow(&mut self, account_id: Uuid, amount: i64) {
        self.accounts
            .entry(account_id.to_string())
            .or_default()
            .delta += amount;
    }

    pub(crate) fn account_outflow(&mut self, account_id: Uuid, amount: i64) {
        let entry = self.accounts.entry(account_id.to_string()).or_default();
        entry.delta -= amount;
        entry.guarded = true;
    }

    /// Undo of an earlier movement; never blocked by the overdraft rule.
    pub(crate) fn account_reversal(&mut self, account_id: Uuid, delta: i64) {
        self.accounts
            .entry(account_id.to_string())
            .or_default()
            .delta += delta;
    }

    pub(crate) fn client(&mut self, client_id: Uuid, delta: i64) {
        *self.clients.entry(client_id.to_string()).or_default() += delta;
    }

    pub(crate) fn vendor(&mut self, vendor_id: Uuid, delta: i64) {
        *self.vendors.entry(vendor_id.to_string()).or_default() += delta;
    }

    pub(crate) fn invoice_received(&mut self, invoice_id: &str, delta: i64) {
        *self.invoices.entry(invoice_id.to_string()).or_default() += delta;
    }

    pub(crate) fn cost_paid(&mut self, cost_id: &str, delta: i64) {
        *self.vendor_costs.entry(cost_id.to_string()).or_default() += delta;
    }

    /// Received-amount change already planned for `invoice_id`.
    pub(crate) fn pending_invoice(&self, invoice_id: &str) -> i64 {
        self.invoices.get(invoice_id).copied().unwrap_or(0)
    }

    /// Paid-amount change already planned for `cost_id`.
    pub(crate) fn pending_cost(&self, cost_id: &str) -> i64 {
        self.vendor_costs.get(cost_id).copied().unwrap_or(0)
    }
}

impl Engine {
    pub(crate) async fn persist_changes(
        &self,
        db_tx: &DatabaseTransaction,
        company_id: &str,
        changes: &ProjectionChanges,
    ) -> ResultEngine<()> {
        for (id, change) in &changes.accounts {
            let model = self.require_account_str(db_tx, company_id, id).await?;
            if change.delta == 0 && model.has_activity {
                continue;
            }
            let balance = checked_apply(model.balance, change.delta, "account balance")?;
            let kind = AccountKind::try_from(model.kind.as_str())?;
            if change.guarded && change.delta < 0 && balance < 0 && !kind.allows_overdraft() {
                return Err(EngineError::InsufficientBalance(format!(
                    "account {} has {}, needs {}",
                    model.name,
                    MoneyCents::new(model.balance),
                    MoneyCents::new(-change.delta)
                )));
            }
            let result = accounts::Entity::update_many()
                .col_expr(accounts::Column::Balance, Expr::value(balance))
                .col_expr(accounts::Column::HasActivity, Expr::value(true))
                .col_expr(accounts::Column::Version, Expr::value(model.version + 1))
                .filter(accounts::Column::Id.eq(id.as_str()))
                .filter(accounts::Column::Version.eq(model.version))
                .exec(db_tx)
                .await?;
            ensure_updated(result.rows_affected, "account", id)?;
        }

        for (id, delta) in changes.clients.iter().filter(|(_, d)| **d != 0) {
            let model = self.require_client_str(db_tx, company_id, id).await?;
            let balance = checked_apply(model.present_balance, *delta, "client balance")?;
            let result = clients::Entity::update_many()
                .col_expr(clients::Column::PresentBalance, Expr::value(balance))
                .col_expr(clients::Column::Version, Expr::value(model.version + 1))
                .filter(clients::Column::Id.eq(id.as_str()))
                .filter(clients::Column::Version.eq(model.version))
                .exec(db_tx)
                .await?;
            ensure_updated(result.rows_affected, "client", id)?;
        }

        for (id, delta) in changes.vendors.iter().filter(|(_, d)| **d != 0) {
            let model = self.require_vendor_str(db_tx, company_id, id).await?;
            let balance = model
                .balance()?
                .apply(MoneyCents::new(*delta))
                .ok_or_else(|| EngineError::Validation("vendor balance overflows".to_string()))?;
            let result = vendors::Entity::update_many()
                .col_expr(
                    vendors::Column::BalanceKind,
                    Expr::value(balance.kind.as_str()),
                )
                .col_expr(
                    vendors::Column::BalanceAmount,
                    Expr::value(balance.amount.cents()),
                )
                .col_expr(vendors::Column::Version, Expr::value(model.version + 1))
                .filter(vendors::Column::Id.eq(id.as_str()))
                .filter(vendors::Column::Version.eq(model.version))
                .exec(db_tx)
                .await?;
            ensure_updated(result.rows_affected, "vendor", id)?;
        }

        for (id, delta) in changes.invoices.iter().filter(|(_, d)| **d != 0) {
            let model = self.require_invoice_str(db_tx, company_id, id).await?;
            let received = checked_apply(model.received_amount, *delta, "invoice received amount")?;
            if received > model.net_total {
                return Err(EngineError::AllocationExceedsDue(format!(
                    "invoice {} has {} remaining",
                    model.invoice_no,
                    MoneyCents::new(model.remaining_due().max(0))
                )));
            }
            if received < 0 {
                return Err(EngineError::Validation(format!(
                    "invoice {} received amount would become negative",
                    model.invoice_no
                )));
            }
            let status =
                InvoiceStatus::derive(MoneyCents::new(received), MoneyCents::new(model.net_total));
            let result = invoices::Entity::update_many()
                .col_expr(invoices::Column::ReceivedAmount, Expr::value(received))
                .col_expr(invoices::Column::Status, Expr::value(status.as_str()))
                .col_expr(invoices::Column::Version, Expr::value(model.version + 1))
                .filter(invoices::Column::Id.eq(id.as_str()))
                .filter(invoices::Column::Version.eq(model.version))
                .exec(db_tx)
                .await?;
            ensure_updated(result.rows_affected, "invoice", id)?;
        }

        for (id, delta) in changes.vendor_costs.iter().filter(|(_, d)| **d != 0) {
            let model = invoice_vendor_costs::Entity::find_by_id(id.clone())
                .filter(invoice_vendor_costs::Column::CompanyId.eq(company_id))
                .one(db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound(format!("vendor cost {id}")))?;
            let paid = checked_apply(model.paid_amount, *delta, "vendor cost paid amount")?;
            if paid > model.cost {
                return Err(EngineError::AllocationExceedsDue(format!(
                    "vendor cost {id} has {} remaining",
                    MoneyCents::new(model.remaining().max(0))
                )));
            }
            if paid < 0 {
                return Err(EngineError::Validation(format!(
                    "vendor cost {id} paid amount would become negative"
                )));
            }
            let result = invoice_vendor_costs::Entity::update_many()
                .col_expr(invoice_vendor_costs::Column::PaidAmount, Expr::value(paid))
                .col_expr(
                    invoice_vendor_costs::Column::Version,
                    Expr::value(model.version + 1),
                )
                .filter(invoice_vendor_costs::Column::Id.eq(id.as_str()))
                .filter(invoice_vendor_costs::Column::Version.eq(model.version))
                .exec(db_tx)
                .await?;
            ensure_updated(result.rows_affected, "vendor cost", id)?;
        }

        Ok(())
    }
}

pub(crate) fn ensure_updated(rows_affected: u64, label: &str, id: &str) -> ResultEngine<()> {
    if rows_affected == 0 {
        return Err(EngineError::ConcurrentModification(format!(
            "{label} {id} was modified concurrently"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deltas_accumulate_per_row() {
        let account = Uuid::new_v4();
        let mut changes = ProjectionChanges::default();
        changes.account_reversal(account, -500);
        changes.account_inflow(account, 300);
        changes.invoice_received("inv", -200);
        changes.invoice_received("inv", 150);

        let entry = changes.accounts[&account.to_string()];
        assert_eq!(entry.delta, -200);
        assert!(!entry.guarded);
        assert_eq!(changes.pending_invoice("inv"), -50);
        assert_eq!(changes.pending_invoice("other"), 0);
    }

    #[test]
    fn outflow_marks_the_account_guarded() {
        let account = Uuid::new_v4();
        let mut changes = ProjectionChanges::default();
        changes.account_reversal(account, 1_000);
        changes.account_outflow(account, 400);

        let entry = changes.accounts[&account.to_string()];
        assert_eq!(entry.delta, 600);
        assert!(entry.guarded);
    }
}
