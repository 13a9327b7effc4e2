//! Money receipts API endpoints.

use api_types::{
    AllocationLine, Deleted,
    receipt::{PaymentTo as ApiPaymentTo, ReceiptAllocationView, ReceiptNew, ReceiptUpdate, ReceiptView},
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::PaymentTo;
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

pub(crate) fn allocation_lines(lines: Vec<AllocationLine>) -> Vec<engine::AllocationLine> {
    lines
        .into_iter()
        .map(|line| engine::AllocationLine {
            invoice_id: line.invoice_id,
            amount_minor: line.amount_minor,
        })
        .collect()
}

fn payment_to(target: ApiPaymentTo) -> PaymentTo {
    match target {
        ApiPaymentTo::Overall => PaymentTo::Overall,
        ApiPaymentTo::Advance => PaymentTo::Advance,
        ApiPaymentTo::Invoice => PaymentTo::Invoice,
        ApiPaymentTo::Tickets => PaymentTo::Tickets,
        ApiPaymentTo::Adjust => PaymentTo::Adjust,
    }
}

fn map_payment_to(target: PaymentTo) -> ApiPaymentTo {
    match target {
        PaymentTo::Overall => ApiPaymentTo::Overall,
        PaymentTo::Advance => ApiPaymentTo::Advance,
        PaymentTo::Invoice => ApiPaymentTo::Invoice,
        PaymentTo::Tickets => ApiPaymentTo::Tickets,
        PaymentTo::Adjust => ApiPaymentTo::Adjust,
    }
}

fn receipt_view(receipt: engine::MoneyReceipt) -> ReceiptView {
    ReceiptView {
        unallocated_minor: receipt.unallocated().cents(),
        id: receipt.id,
        voucher_no: receipt.voucher_no,
        client_id: receipt.client_id,
        account_id: receipt.account_id,
        amount_minor: receipt.amount.cents(),
        discount_minor: receipt.discount.cents(),
        payment_to: map_payment_to(receipt.payment_to),
        payment_date: receipt.payment_date,
        note: receipt.note,
        allocations: receipt
            .allocations
            .into_iter()
            .map(|allocation| ReceiptAllocationView {
                invoice_id: allocation.invoice_id,
                applied_minor: allocation.applied_amount.cents(),
            })
            .collect(),
    }
}

pub async fn receipt_new(
    State(state): State<ServerState>,
    Path(company_id): Path<String>,
    Json(payload): Json<ReceiptNew>,
) -> Result<(StatusCode, Json<ReceiptView>), ServerError> {
    let cmd = engine::CreateReceiptCmd {
        discount_minor: payload.discount_minor,
        note: payload.note,
        allocations: allocation_lines(payload.allocations),
        ..engine::CreateReceiptCmd::new(
            company_id,
            payload.client_id,
            payload.account_id,
            payload.amount_minor,
            payment_to(payload.payment_to),
            payload.payment_date,
        )
    };

    let receipt = state.engine.create_receipt(cmd).await?;
    Ok((StatusCode::CREATED, Json(receipt_view(receipt))))
}

pub async fn get(
    State(state): State<ServerState>,
    Path((company_id, receipt_id)): Path<(String, Uuid)>,
) -> Result<Json<ReceiptView>, ServerError> {
    let receipt = state.engine.money_receipt(&company_id, receipt_id).await?;
    Ok(Json(receipt_view(receipt)))
}

pub async fn update(
    State(state): State<ServerState>,
    Path((company_id, receipt_id)): Path<(String, Uuid)>,
    Json(payload): Json<ReceiptUpdate>,
) -> Result<Json<ReceiptView>, ServerError> {
    let patch = engine::ReceiptPatch {
        amount_minor: payload.amount_minor,
        discount_minor: payload.discount_minor,
        payment_to: payload.payment_to.map(payment_to),
        account_id: payload.account_id,
        payment_date: payload.payment_date,
        note: payload.note,
        allocations: payload.allocations.map(allocation_lines),
    };
    let receipt = state
        .engine
        .update_receipt(&company_id, receipt_id, patch)
        .await?;
    Ok(Json(receipt_view(receipt)))
}

pub async fn delete(
    State(state): State<ServerState>,
    Path((company_id, receipt_id)): Path<(String, Uuid)>,
) -> Result<Json<Deleted>, ServerError> {
    state.engine.delete_receipt(&company_id, receipt_id).await?;
    Ok(Json(Deleted { ok: true }))
}
