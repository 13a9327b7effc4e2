//! Vendor payments API endpoints.

use api_types::{
    Deleted,
    vendor_payment::{
        VendorAllocationView, VendorPaymentNew, VendorPaymentTo as ApiPaymentTo,
        VendorPaymentUpdate, VendorPaymentView,
    },
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::VendorPaymentTo;
use uuid::Uuid;

use crate::{ServerError, receipts::allocation_lines, server::ServerState};

fn payment_to(target: ApiPaymentTo) -> VendorPaymentTo {
    match target {
        ApiPaymentTo::Overall => VendorPaymentTo::Overall,
        ApiPaymentTo::Advance => VendorPaymentTo::Advance,
        ApiPaymentTo::Invoice => VendorPaymentTo::Invoice,
        ApiPaymentTo::Adjust => VendorPaymentTo::Adjust,
    }
}

fn map_payment_to(target: VendorPaymentTo) -> ApiPaymentTo {
    match target {
        VendorPaymentTo::Overall => ApiPaymentTo::Overall,
        VendorPaymentTo::Advance => ApiPaymentTo::Advance,
        VendorPaymentTo::Invoice => ApiPaymentTo::Invoice,
        VendorPaymentTo::Adjust => ApiPaymentTo::Adjust,
    }
}

fn payment_view(payment: engine::VendorPayment) -> VendorPaymentView {
    VendorPaymentView {
        id: payment.id,
        voucher_no: payment.voucher_no,
        vendor_id: payment.vendor_id,
        account_id: payment.account_id,
        amount_minor: payment.amount.cents(),
        vendor_ait_minor: payment.vendor_ait.cents(),
        total_minor: payment.total_amount.cents(),
        payment_to: map_payment_to(payment.payment_to),
        payment_date: payment.payment_date,
        note: payment.note,
        allocations: payment
            .allocations
            .into_iter()
            .map(|allocation| VendorAllocationView {
                invoice_id: allocation.invoice_id,
                cost_id: allocation.cost_id,
                applied_minor: allocation.applied_amount.cents(),
            })
            .collect(),
    }
}

pub async fn vendor_payment_new(
    State(state): State<ServerState>,
    Path(company_id): Path<String>,
    Json(payload): Json<VendorPaymentNew>,
) -> Result<(StatusCode, Json<VendorPaymentView>), ServerError> {
    let cmd = engine::CreateVendorPaymentCmd {
        vendor_ait_minor: payload.vendor_ait_minor,
        note: payload.note,
        allocations: allocation_lines(payload.allocations),
        ..engine::CreateVendorPaymentCmd::new(
            company_id,
            payload.vendor_id,
            payload.account_id,
            payload.amount_minor,
            payment_to(payload.payment_to),
            payload.payment_date,
        )
    };

    let payment = state.engine.create_vendor_payment(cmd).await?;
    Ok((StatusCode::CREATED, Json(payment_view(payment))))
}

pub async fn get(
    State(state): State<ServerState>,
    Path((company_id, payment_id)): Path<(String, Uuid)>,
) -> Result<Json<VendorPaymentView>, ServerError> {
    let payment = state.engine.vendor_payment(&company_id, payment_id).await?;
    Ok(Json(payment_view(payment)))
}

pub async fn update(
    State(state): State<ServerState>,
    Path((company_id, payment_id)): Path<(String, Uuid)>,
    Json(payload): Json<VendorPaymentUpdate>,
) -> Result<Json<VendorPaymentView>, ServerError> {
    let patch = engine::VendorPaymentPatch {
        amount_minor: payload.amount_minor,
        vendor_ait_minor: payload.vendor_ait_minor,
        payment_to: payload.payment_to.map(payment_to),
        account_id: payload.account_id,
        payment_date: payload.payment_date,
        note: payload.note,
        allocations: payload.allocations.map(allocation_lines),
    };
    let payment = state
        .engine
        .update_vendor_payment(&company_id, payment_id, patch)
        .await?;
    Ok(Json(payment_view(payment)))
}

pub async fn delete(
    State(state): State<ServerState>,
    Path((company_id, payment_id)): Path<(String, Uuid)>,
) -> Result<Json<Deleted>, ServerError> {
    state
        .engine
        .delete_vendor_payment(&company_id, payment_id)
        .await?;
    Ok(Json(Deleted { ok: true }))
}
