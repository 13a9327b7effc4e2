//! Ledgers, reports, reconciliation and voucher issue.

use api_types::{
    report::{
        CollectionLineView, CollectionsView, DateRange, DriftReport, DriftView, LedgerRowView,
        LedgerView, ProfitLossView,
    },
    voucher::{Series as ApiSeries, VoucherIssued, VoucherNew},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{Drift, Ledger, ProjectionKind, Series};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

fn ledger_view(ledger: Ledger) -> LedgerView {
    LedgerView {
        subject_id: ledger.subject_id,
        from: ledger.from,
        to: ledger.to,
        opening_balance_minor: ledger.opening_balance.cents(),
        rows: ledger
            .rows
            .into_iter()
            .map(|row| LedgerRowView {
                date: row.date,
                voucher_no: row.voucher_no,
                description: row.description,
                debit_minor: row.debit.cents(),
                credit_minor: row.credit.cents(),
                running_balance_minor: row.running_balance.cents(),
            })
            .collect(),
        closing_balance_minor: ledger.closing_balance.cents(),
    }
}

fn drift_report(drifts: Vec<Drift>) -> DriftReport {
    DriftReport {
        consistent: drifts.is_empty(),
        drifts: drifts
            .into_iter()
            .map(|drift| DriftView {
                kind: match drift.kind {
                    ProjectionKind::AccountBalance => "account_balance",
                    ProjectionKind::ClientBalance => "client_balance",
                    ProjectionKind::VendorBalance => "vendor_balance",
                    ProjectionKind::InvoiceReceived => "invoice_received",
                    ProjectionKind::VendorCostPaid => "vendor_cost_paid",
                }
                .to_string(),
                id: drift.id,
                stored_minor: drift.stored.cents(),
                expected_minor: drift.expected.cents(),
            })
            .collect(),
    }
}

pub async fn account_ledger(
    State(state): State<ServerState>,
    Path((company_id, account_id)): Path<(String, Uuid)>,
    Query(range): Query<DateRange>,
) -> Result<Json<LedgerView>, ServerError> {
    let ledger = state
        .engine
        .account_ledger(&company_id, account_id, range.from, range.to)
        .await?;
    Ok(Json(ledger_view(ledger)))
}

pub async fn client_ledger(
    State(state): State<ServerState>,
    Path((company_id, client_id)): Path<(String, Uuid)>,
    Query(range): Query<DateRange>,
) -> Result<Json<LedgerView>, ServerError> {
    let ledger = state
        .engine
        .client_ledger(&company_id, client_id, range.from, range.to)
        .await?;
    Ok(Json(ledger_view(ledger)))
}

pub async fn vendor_ledger(
    State(state): State<ServerState>,
    Path((company_id, vendor_id)): Path<(String, Uuid)>,
    Query(range): Query<DateRange>,
) -> Result<Json<LedgerView>, ServerError> {
    let ledger = state
        .engine
        .vendor_ledger(&company_id, vendor_id, range.from, range.to)
        .await?;
    Ok(Json(ledger_view(ledger)))
}

pub async fn profit_loss(
    State(state): State<ServerState>,
    Path(company_id): Path<String>,
    Query(range): Query<DateRange>,
) -> Result<Json<ProfitLossView>, ServerError> {
    let report = state
        .engine
        .profit_loss(&company_id, range.from, range.to)
        .await?;
    Ok(Json(ProfitLossView {
        from: report.from,
        to: report.to,
        sales_minor: report.sales.cents(),
        purchases_minor: report.purchases.cents(),
        discounts_minor: report.discounts.cents(),
        vendor_ait_minor: report.vendor_ait.cents(),
        transfer_charges_minor: report.transfer_charges.cents(),
        gross_profit_minor: report.gross_profit.cents(),
        net_profit_minor: report.net_profit.cents(),
    }))
}

pub async fn collections(
    State(state): State<ServerState>,
    Path(company_id): Path<String>,
    Query(range): Query<DateRange>,
) -> Result<Json<CollectionsView>, ServerError> {
    let report = state
        .engine
        .collections(&company_id, range.from, range.to)
        .await?;
    Ok(Json(CollectionsView {
        from: report.from,
        to: report.to,
        lines: report
            .lines
            .into_iter()
            .map(|line| CollectionLineView {
                account_id: line.account_id,
                account_name: line.account_name,
                receipts: line.receipts,
                total_minor: line.total.cents(),
            })
            .collect(),
        total_minor: report.total.cents(),
    }))
}

/// Compare stored projections with their event history without changing anything.
pub async fn reconcile(
    State(state): State<ServerState>,
    Path(company_id): Path<String>,
) -> Result<Json<DriftReport>, ServerError> {
    let drifts = state.engine.reconcile(&company_id).await?;
    Ok(Json(drift_report(drifts)))
}

/// Rewrite drifted projections; the response lists what was repaired.
pub async fn recompute(
    State(state): State<ServerState>,
    Path(company_id): Path<String>,
) -> Result<Json<DriftReport>, ServerError> {
    let drifts = state.engine.recompute_balances(&company_id).await?;
    Ok(Json(drift_report(drifts)))
}

pub async fn voucher_new(
    State(state): State<ServerState>,
    Path(company_id): Path<String>,
    Json(payload): Json<VoucherNew>,
) -> Result<(StatusCode, Json<VoucherIssued>), ServerError> {
    let series = match payload.series {
        ApiSeries::Invoice => Series::Invoice,
        ApiSeries::MoneyReceipt => Series::MoneyReceipt,
        ApiSeries::VendorPayment => Series::VendorPayment,
        ApiSeries::AdvanceReturn => Series::AdvanceReturn,
        ApiSeries::BalanceTransfer => Series::BalanceTransfer,
        ApiSeries::Expense => Series::Expense,
    };
    let voucher_no = state.engine.next_voucher(series, &company_id).await?;
    Ok((StatusCode::CREATED, Json(VoucherIssued { voucher_no })))
}
