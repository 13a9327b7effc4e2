//! Balance transfer endpoints.

use api_types::{
    Deleted,
    transfer::{ChargeBearer as ApiBearer, TransferNew, TransferUpdate, TransferView},
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::ChargeBearer;
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

fn bearer(bearer: ApiBearer) -> ChargeBearer {
    match bearer {
        ApiBearer::Receiver => ChargeBearer::Receiver,
        ApiBearer::Sender => ChargeBearer::Sender,
    }
}

fn transfer_view(transfer: engine::BalanceTransfer) -> TransferView {
    TransferView {
        id: transfer.id,
        voucher_no: transfer.voucher_no,
        from_account_id: transfer.from_account_id,
        to_account_id: transfer.to_account_id,
        amount_minor: transfer.amount.cents(),
        transfer_charge_minor: transfer.transfer_charge.cents(),
        charge_bearer: match transfer.charge_bearer {
            ChargeBearer::Receiver => ApiBearer::Receiver,
            ChargeBearer::Sender => ApiBearer::Sender,
        },
        transfer_date: transfer.transfer_date,
        note: transfer.note,
    }
}

pub async fn transfer_new(
    State(state): State<ServerState>,
    Path(company_id): Path<String>,
    Json(payload): Json<TransferNew>,
) -> Result<(StatusCode, Json<TransferView>), ServerError> {
    let mut cmd = engine::TransferCmd::new(
        company_id,
        payload.from_account_id,
        payload.to_account_id,
        payload.amount_minor,
        payload.transfer_date,
    )
    .charge(payload.transfer_charge_minor, bearer(payload.charge_bearer));
    if let Some(note) = payload.note {
        cmd = cmd.note(note);
    }

    let transfer = state.engine.transfer_balance(cmd).await?;
    Ok((StatusCode::CREATED, Json(transfer_view(transfer))))
}

pub async fn get(
    State(state): State<ServerState>,
    Path((company_id, transfer_id)): Path<(String, Uuid)>,
) -> Result<Json<TransferView>, ServerError> {
    let transfer = state
        .engine
        .balance_transfer(&company_id, transfer_id)
        .await?;
    Ok(Json(transfer_view(transfer)))
}

pub async fn update(
    State(state): State<ServerState>,
    Path((company_id, transfer_id)): Path<(String, Uuid)>,
    Json(payload): Json<TransferUpdate>,
) -> Result<Json<TransferView>, ServerError> {
    let patch = engine::TransferPatch {
        from_account_id: payload.from_account_id,
        to_account_id: payload.to_account_id,
        amount_minor: payload.amount_minor,
        transfer_charge_minor: payload.transfer_charge_minor,
        charge_bearer: payload.charge_bearer.map(bearer),
        transfer_date: payload.transfer_date,
        note: payload.note,
    };
    let transfer = state
        .engine
        .update_transfer(&company_id, transfer_id, patch)
        .await?;
    Ok(Json(transfer_view(transfer)))
}

pub async fn delete(
    State(state): State<ServerState>,
    Path((company_id, transfer_id)): Path<(String, Uuid)>,
) -> Result<Json<Deleted>, ServerError> {
    state.engine.delete_transfer(&company_id, transfer_id).await?;
    Ok(Json(Deleted { ok: true }))
}
