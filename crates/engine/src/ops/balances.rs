use std::collections::HashMap;

use sea_orm::{DatabaseTransaction, QueryFilter, QueryOrder, prelude::*, sea_query::Expr};

use crate::{
    Drift, EngineError, InvoiceStatus, MoneyCents, ProjectionKind, ResultEngine, VendorBalance,
    accounts, clients, invoice_vendor_costs, invoices, receipt_allocations,
    util::{checked_apply, parse_uuid},
    vendor_allocations, vendors,
};

use super::{
    Engine,
    ledger::{Orientation, closing_balance},
    parties::require_company,
};

/// A projection value as stored and as implied by the event history.
struct Expected {
    kind: ProjectionKind,
    id: String,
    stored: i64,
    expected: i64,
}

impl Engine {
    /// Compares every stored projection of a company with the value its
    /// event history implies. An empty result means the books are consistent.
    pub async fn reconcile(&self, company_id: &str) -> ResultEngine<Vec<Drift>> {
        let company_id = require_company(company_id)?;
        self.with_tx(|engine, db_tx| {
            let company_id = company_id.clone();
            Box::pin(async move {
                let drifts: Vec<Drift> = engine
                    .expected_projections(db_tx, &company_id)
                    .await?
                    .into_iter()
                    .filter(|row| row.stored != row.expected)
                    .map(|row| Drift {
                        kind: row.kind,
                        id: row.id,
                        stored: MoneyCents::new(row.stored),
                        expected: MoneyCents::new(row.expected),
                    })
                    .collect();
                for drift in &drifts {
                    tracing::warn!(
                        kind = ?drift.kind,
                        "projection {} drifted: stored {}, expected {}",
                        drift.id,
                        drift.stored,
                        drift.expected
                    );
                }
                Ok(drifts)
            })
        })
        .await
    }

    /// Rewrites every projection of a company from its event history.
    ///
    /// Returns the drifts that were repaired. Invoice statuses are
    /// re-derived and versions bumped so in-flight writers retry.
    pub async fn recompute_balances(&self, company_id: &str) -> ResultEngine<Vec<Drift>> {
        let company_id = require_company(company_id)?;
        let repaired = self
            .with_tx(|engine, db_tx| {
                let company_id = company_id.clone();
                Box::pin(async move {
                    let rows = engine.expected_projections(db_tx, &company_id).await?;
                    let mut repaired = Vec::new();
                    for row in rows {
                        engine.write_projection(db_tx, &row).await?;
                        if row.stored != row.expected {
                            repaired.push(Drift {
                                kind: row.kind,
                                id: row.id,
                                stored: MoneyCents::new(row.stored),
                                expected: MoneyCents::new(row.expected),
                            });
                        }
                    }
                    Ok(repaired)
                })
            })
            .await?;

        tracing::info!(
            "recomputed projections for company {company_id}, {} repaired",
            repaired.len()
        );
        Ok(repaired)
    }

    async fn expected_projections(
        &self,
        db_tx: &DatabaseTransaction,
        company_id: &str,
    ) -> ResultEngine<Vec<Expected>> {
        let mut out = Vec::new();

        for account in accounts::Entity::find()
            .filter(accounts::Column::CompanyId.eq(company_id))
            .order_by_asc(accounts::Column::Id)
            .all(db_tx)
            .await?
        {
            let account_id = parse_uuid(&account.id, "account")?;
            let events = self.account_events(db_tx, company_id, account_id).await?;
            out.push(Expected {
                kind: ProjectionKind::AccountBalance,
                expected: closing_balance(
                    account.opening_balance,
                    Orientation::DebitIncreases,
                    &events,
                )?,
                stored: account.balance,
                id: account.id,
            });
        }

        for client in clients::Entity::find()
            .filter(clients::Column::CompanyId.eq(company_id))
            .order_by_asc(clients::Column::Id)
            .all(db_tx)
            .await?
        {
            let client_id = parse_uuid(&client.id, "client")?;
            let events = self.client_events(db_tx, company_id, client_id).await?;
            out.push(Expected {
                kind: ProjectionKind::ClientBalance,
                expected: closing_balance(
                    client.opening_balance,
                    Orientation::CreditIncreases,
                    &events,
                )?,
                stored: client.present_balance,
                id: client.id,
            });
        }

        for vendor in vendors::Entity::find()
            .filter(vendors::Column::CompanyId.eq(company_id))
            .order_by_asc(vendors::Column::Id)
            .all(db_tx)
            .await?
        {
            let vendor_id = parse_uuid(&vendor.id, "vendor")?;
            let events = self.vendor_events(db_tx, company_id, vendor_id).await?;
            out.push(Expected {
                kind: ProjectionKind::VendorBalance,
                expected: closing_balance(
                    vendor.opening_balance,
                    Orientation::DebitIncreases,
                    &events,
                )?,
                stored: vendor.balance()?.signed().cents(),
                id: vendor.id,
            });
        }

        let mut received: HashMap<String, i64> = HashMap::new();
        for allocation in receipt_allocations::Entity::find()
            .filter(receipt_allocations::Column::CompanyId.eq(company_id))
            .all(db_tx)
            .await?
        {
            let total = received.entry(allocation.invoice_id).or_default();
            *total = checked_apply(*total, allocation.applied_amount, "invoice received amount")?;
        }
        for invoice in invoices::Entity::find()
            .filter(invoices::Column::CompanyId.eq(company_id))
            .order_by_asc(invoices::Column::Id)
            .all(db_tx)
            .await?
        {
            out.push(Expected {
                kind: ProjectionKind::InvoiceReceived,
                expected: received.get(&invoice.id).copied().unwrap_or(0),
                stored: invoice.received_amount,
                id: invoice.id,
            });
        }

        let mut paid: HashMap<String, i64> = HashMap::new();
        for allocation in vendor_allocations::Entity::find()
            .filter(vendor_allocations::Column::CompanyId.eq(company_id))
            .all(db_tx)
            .await?
        {
            let total = paid.entry(allocation.cost_id).or_default();
            *total = checked_apply(*total, allocation.applied_amount, "vendor cost paid amount")?;
        }
        for cost in invoice_vendor_costs::Entity::find()
            .filter(invoice_vendor_costs::Column::CompanyId.eq(company_id))
            .order_by_asc(invoice_vendor_costs::Column::Id)
            .all(db_tx)
            .await?
        {
            out.push(Expected {
                kind: ProjectionKind::VendorCostPaid,
                expected: paid.get(&cost.id).copied().unwrap_or(0),
                stored: cost.paid_amount,
                id: cost.id,
            });
        }

        Ok(out)
    }

    async fn write_projection(
        &self,
        db_tx: &DatabaseTransaction,
        row: &Expected,
    ) -> ResultEngine<()> {
        let id = row.id.as_str();
        match row.kind {
            ProjectionKind::AccountBalance => {
                accounts::Entity::update_many()
                    .col_expr(accounts::Column::Balance, Expr::value(row.expected))
                    .col_expr(
                        accounts::Column::Version,
                        Expr::col(accounts::Column::Version).add(1),
                    )
                    .filter(accounts::Column::Id.eq(id))
                    .exec(db_tx)
                    .await?;
            }
            ProjectionKind::ClientBalance => {
                clients::Entity::update_many()
                    .col_expr(clients::Column::PresentBalance, Expr::value(row.expected))
                    .col_expr(
                        clients::Column::Version,
                        Expr::col(clients::Column::Version).add(1),
                    )
                    .filter(clients::Column::Id.eq(id))
                    .exec(db_tx)
                    .await?;
            }
            ProjectionKind::VendorBalance => {
                let balance = VendorBalance::from_signed(MoneyCents::new(row.expected));
                vendors::Entity::update_many()
                    .col_expr(
                        vendors::Column::BalanceKind,
                        Expr::value(balance.kind.as_str()),
                    )
                    .col_expr(
                        vendors::Column::BalanceAmount,
                        Expr::value(balance.amount.cents()),
                    )
                    .col_expr(
                        vendors::Column::Version,
                        Expr::col(vendors::Column::Version).add(1),
                    )
                    .filter(vendors::Column::Id.eq(id))
                    .exec(db_tx)
                    .await?;
            }
            ProjectionKind::InvoiceReceived => {
                let invoice = invoices::Entity::find_by_id(row.id.clone())
                    .one(db_tx)
                    .await?
                    .ok_or_else(|| EngineError::NotFound(format!("invoice {id}")))?;
                let status = InvoiceStatus::derive(
                    MoneyCents::new(row.expected),
                    MoneyCents::new(invoice.net_total),
                );
                invoices::Entity::update_many()
                    .col_expr(invoices::Column::ReceivedAmount, Expr::value(row.expected))
                    .col_expr(invoices::Column::Status, Expr::value(status.as_str()))
                    .col_expr(
                        invoices::Column::Version,
                        Expr::col(invoices::Column::Version).add(1),
                    )
                    .filter(invoices::Column::Id.eq(id))
                    .exec(db_tx)
                    .await?;
            }
            ProjectionKind::VendorCostPaid => {
                invoice_vendor_costs::Entity::update_many()
                    .col_expr(
                        invoice_vendor_costs::Column::PaidAmount,
                        Expr::value(row.expected),
                    )
                    .col_expr(
                        invoice_vendor_costs::Column::Version,
                        Expr::col(invoice_vendor_costs::Column::Version).add(1),
                    )
                    .filter(invoice_vendor_costs::Column::Id.eq(id))
                    .exec(db_tx)
                    .await?;
            }
        }
        Ok(())
    }
}
