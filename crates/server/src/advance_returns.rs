use api_types::{
    Deleted,
    advance_return::{AdvanceReturnNew, AdvanceReturnUpdate, AdvanceReturnView, PartyKind},
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::Party;
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

fn return_view(advance_return: engine::AdvanceReturn) -> AdvanceReturnView {
    let (party_kind, party_id) = match advance_return.party {
        Party::Client(id) => (PartyKind::Client, id),
        Party::Vendor(id) => (PartyKind::Vendor, id),
    };
    AdvanceReturnView {
        id: advance_return.id,
        voucher_no: advance_return.voucher_no,
        party_kind,
        party_id,
        account_id: advance_return.account_id,
        amount_minor: advance_return.amount.cents(),
        return_date: advance_return.return_date,
        note: advance_return.note,
    }
}

pub async fn advance_return_new(
    State(state): State<ServerState>,
    Path(company_id): Path<String>,
    Json(payload): Json<AdvanceReturnNew>,
) -> Result<(StatusCode, Json<AdvanceReturnView>), ServerError> {
    let party = match payload.party_kind {
        PartyKind::Client => Party::Client(payload.party_id),
        PartyKind::Vendor => Party::Vendor(payload.party_id),
    };
    let mut cmd = engine::AdvanceReturnCmd::new(
        company_id,
        party,
        payload.account_id,
        payload.amount_minor,
        payload.return_date,
    );
    if let Some(note) = payload.note {
        cmd = cmd.note(note);
    }

    let advance_return = state.engine.create_advance_return(cmd).await?;
    Ok((StatusCode::CREATED, Json(return_view(advance_return))))
}

pub async fn get(
    State(state): State<ServerState>,
    Path((company_id, return_id)): Path<(String, Uuid)>,
) -> Result<Json<AdvanceReturnView>, ServerError> {
    let advance_return = state.engine.advance_return(&company_id, return_id).await?;
    Ok(Json(return_view(advance_return)))
}

pub async fn update(
    State(state): State<ServerState>,
    Path((company_id, return_id)): Path<(String, Uuid)>,
    Json(payload): Json<AdvanceReturnUpdate>,
) -> Result<Json<AdvanceReturnView>, ServerError> {
    let patch = engine::AdvanceReturnPatch {
        account_id: payload.account_id,
        amount_minor: payload.amount_minor,
        return_date: payload.return_date,
        note: payload.note,
    };
    let advance_return = state
        .engine
        .update_advance_return(&company_id, return_id, patch)
        .await?;
    Ok(Json(return_view(advance_return)))
}

pub async fn delete(
    State(state): State<ServerState>,
    Path((company_id, return_id)): Path<(String, Uuid)>,
) -> Result<Json<Deleted>, ServerError> {
    state
        .engine
        .delete_advance_return(&company_id, return_id)
        .await?;
    Ok(Json(Deleted { ok: true }))
}
