//! Accounts, clients and vendors.

use api_types::{
    account::{AccountKind as ApiAccountKind, AccountNew, AccountView},
    client::{ClientNew, ClientView},
    vendor::{BalanceKind as ApiBalanceKind, VendorBalanceView, VendorNew, VendorView},
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{AccountKind, BalanceKind, MoneyCents, VendorBalance};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

fn map_account_kind(kind: AccountKind) -> ApiAccountKind {
    match kind {
        AccountKind::Cash => ApiAccountKind::Cash,
        AccountKind::Bank => ApiAccountKind::Bank,
        AccountKind::MobileBanking => ApiAccountKind::MobileBanking,
        AccountKind::CreditCard => ApiAccountKind::CreditCard,
    }
}

fn account_kind(kind: ApiAccountKind) -> AccountKind {
    match kind {
        ApiAccountKind::Cash => AccountKind::Cash,
        ApiAccountKind::Bank => AccountKind::Bank,
        ApiAccountKind::MobileBanking => AccountKind::MobileBanking,
        ApiAccountKind::CreditCard => AccountKind::CreditCard,
    }
}

fn account_view(account: engine::Account) -> AccountView {
    AccountView {
        id: account.id,
        name: account.name,
        kind: map_account_kind(account.kind),
        opening_balance_minor: account.opening_balance.cents(),
        balance_minor: account.balance.cents(),
        has_activity: account.has_activity,
    }
}

fn client_view(client: engine::Client) -> ClientView {
    ClientView {
        due_minor: client.due().cents(),
        advance_minor: client.advance().cents(),
        over_credit_limit: client.is_over_credit_limit(),
        id: client.id,
        name: client.name,
        category: client.category,
        credit_limit_minor: client.credit_limit.cents(),
        opening_balance_minor: client.opening_balance.cents(),
        present_balance_minor: client.present_balance.cents(),
    }
}

fn balance_view(balance: VendorBalance) -> VendorBalanceView {
    VendorBalanceView {
        kind: match balance.kind {
            BalanceKind::Due => ApiBalanceKind::Due,
            BalanceKind::Advance => ApiBalanceKind::Advance,
        },
        amount_minor: balance.amount.cents(),
    }
}

fn vendor_balance(view: VendorBalanceView) -> VendorBalance {
    let amount = MoneyCents::new(view.amount_minor);
    match view.kind {
        ApiBalanceKind::Due => VendorBalance::due(amount),
        ApiBalanceKind::Advance => VendorBalance::advance(amount),
    }
}

fn vendor_view(vendor: engine::Vendor) -> VendorView {
    VendorView {
        id: vendor.id,
        name: vendor.name,
        opening_balance: balance_view(vendor.opening_balance),
        present_balance: balance_view(vendor.present_balance),
    }
}

pub async fn account_new(
    State(state): State<ServerState>,
    Path(company_id): Path<String>,
    Json(payload): Json<AccountNew>,
) -> Result<(StatusCode, Json<AccountView>), ServerError> {
    let account = state
        .engine
        .new_account(
            engine::NewAccountCmd::new(company_id, payload.name, account_kind(payload.kind))
                .opening_balance(payload.opening_balance_minor),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(account_view(account))))
}

pub async fn account_get(
    State(state): State<ServerState>,
    Path((company_id, account_id)): Path<(String, Uuid)>,
) -> Result<Json<AccountView>, ServerError> {
    let account = state.engine.account(&company_id, account_id).await?;
    Ok(Json(account_view(account)))
}

pub async fn account_list(
    State(state): State<ServerState>,
    Path(company_id): Path<String>,
) -> Result<Json<Vec<AccountView>>, ServerError> {
    let accounts = state.engine.accounts(&company_id).await?;
    Ok(Json(accounts.into_iter().map(account_view).collect()))
}

pub async fn client_new(
    State(state): State<ServerState>,
    Path(company_id): Path<String>,
    Json(payload): Json<ClientNew>,
) -> Result<(StatusCode, Json<ClientView>), ServerError> {
    let mut cmd = engine::NewClientCmd::new(company_id, payload.name)
        .credit_limit(payload.credit_limit_minor)
        .opening_balance(payload.opening_balance_minor);
    if let Some(category) = payload.category {
        cmd = cmd.category(category);
    }
    let client = state.engine.new_client(cmd).await?;
    Ok((StatusCode::CREATED, Json(client_view(client))))
}

pub async fn client_get(
    State(state): State<ServerState>,
    Path((company_id, client_id)): Path<(String, Uuid)>,
) -> Result<Json<ClientView>, ServerError> {
    let client = state.engine.client(&company_id, client_id).await?;
    Ok(Json(client_view(client)))
}

pub async fn client_list(
    State(state): State<ServerState>,
    Path(company_id): Path<String>,
) -> Result<Json<Vec<ClientView>>, ServerError> {
    let clients = state.engine.clients(&company_id).await?;
    Ok(Json(clients.into_iter().map(client_view).collect()))
}

pub async fn vendor_new(
    State(state): State<ServerState>,
    Path(company_id): Path<String>,
    Json(payload): Json<VendorNew>,
) -> Result<(StatusCode, Json<VendorView>), ServerError> {
    let mut cmd = engine::NewVendorCmd::new(company_id, payload.name);
    if let Some(opening) = payload.opening_balance {
        if opening.amount_minor < 0 {
            return Err(ServerError::Generic(
                "opening balance amount must be >= 0; use kind to pick due or advance"
                    .to_string(),
            ));
        }
        cmd = cmd.opening_balance(vendor_balance(opening));
    }
    let vendor = state.engine.new_vendor(cmd).await?;
    Ok((StatusCode::CREATED, Json(vendor_view(vendor))))
}

pub async fn vendor_get(
    State(state): State<ServerState>,
    Path((company_id, vendor_id)): Path<(String, Uuid)>,
) -> Result<Json<VendorView>, ServerError> {
    let vendor = state.engine.vendor(&company_id, vendor_id).await?;
    Ok(Json(vendor_view(vendor)))
}

pub async fn vendor_list(
    State(state): State<ServerState>,
    Path(company_id): Path<String>,
) -> Result<Json<Vec<VendorView>>, ServerError> {
    let vendors = state.engine.vendors(&company_id).await?;
    Ok(Json(vendors.into_iter().map(vendor_view).collect()))
}
