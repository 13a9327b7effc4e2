//! Invoices API endpoints.

use api_types::{
    Deleted,
    invoice::{InvoiceNew, InvoiceStatus as ApiStatus, InvoiceUpdate, InvoiceView, VendorCostView},
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::InvoiceStatus;
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

fn map_status(status: InvoiceStatus) -> ApiStatus {
    match status {
        InvoiceStatus::Due => ApiStatus::Due,
        InvoiceStatus::Partial => ApiStatus::Partial,
        InvoiceStatus::Paid => ApiStatus::Paid,
    }
}

fn invoice_view(invoice: engine::Invoice) -> InvoiceView {
    InvoiceView {
        remaining_minor: invoice.remaining_due().cents(),
        id: invoice.id,
        invoice_no: invoice.invoice_no,
        client_id: invoice.client_id,
        invoice_date: invoice.invoice_date,
        net_total_minor: invoice.net_total.cents(),
        received_minor: invoice.received_amount.cents(),
        status: map_status(invoice.status),
        note: invoice.note,
        vendor_costs: invoice
            .vendor_costs
            .into_iter()
            .map(|cost| VendorCostView {
                id: cost.id,
                vendor_id: cost.vendor_id,
                cost_minor: cost.cost.cents(),
                paid_minor: cost.paid_amount.cents(),
            })
            .collect(),
    }
}

pub async fn invoice_new(
    State(state): State<ServerState>,
    Path(company_id): Path<String>,
    Json(payload): Json<InvoiceNew>,
) -> Result<(StatusCode, Json<InvoiceView>), ServerError> {
    let mut cmd = engine::CreateInvoiceCmd::new(
        company_id,
        payload.client_id,
        payload.net_total_minor,
        payload.invoice_date,
    );
    if let Some(note) = payload.note {
        cmd = cmd.note(note);
    }
    for line in payload.vendor_costs {
        cmd = cmd.vendor_cost(line.vendor_id, line.cost_minor);
    }

    let invoice = state.engine.create_invoice(cmd).await?;
    Ok((StatusCode::CREATED, Json(invoice_view(invoice))))
}

pub async fn get(
    State(state): State<ServerState>,
    Path((company_id, invoice_id)): Path<(String, Uuid)>,
) -> Result<Json<InvoiceView>, ServerError> {
    let invoice = state.engine.invoice(&company_id, invoice_id).await?;
    Ok(Json(invoice_view(invoice)))
}

pub async fn update(
    State(state): State<ServerState>,
    Path((company_id, invoice_id)): Path<(String, Uuid)>,
    Json(payload): Json<InvoiceUpdate>,
) -> Result<Json<InvoiceView>, ServerError> {
    let patch = engine::InvoicePatch {
        net_total_minor: payload.net_total_minor,
        invoice_date: payload.invoice_date,
        note: payload.note,
    };
    let invoice = state
        .engine
        .update_invoice(&company_id, invoice_id, patch)
        .await?;
    Ok(Json(invoice_view(invoice)))
}

pub async fn delete(
    State(state): State<ServerState>,
    Path((company_id, invoice_id)): Path<(String, Uuid)>,
) -> Result<Json<Deleted>, ServerError> {
    state.engine.delete_invoice(&company_id, invoice_id).await?;
    Ok(Json(Deleted { ok: true }))
}
