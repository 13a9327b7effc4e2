use axum::{
    Router,
    routing::{get, post},
};

use std::sync::Arc;

use crate::{
    advance_returns, invoices, parties, receipts, reports, transfers, vendor_payments,
};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

/// Every route is scoped by the `company_id` path segment.
pub fn router(engine: Arc<Engine>) -> Router {
    let state = ServerState { engine };

    Router::new()
        .route(
            "/companies/{company_id}/accounts",
            get(parties::account_list).post(parties::account_new),
        )
        .route(
            "/companies/{company_id}/accounts/{account_id}",
            get(parties::account_get),
        )
        .route(
            "/companies/{company_id}/accounts/{account_id}/ledger",
            get(reports::account_ledger),
        )
        .route(
            "/companies/{company_id}/clients",
            get(parties::client_list).post(parties::client_new),
        )
        .route(
            "/companies/{company_id}/clients/{client_id}",
            get(parties::client_get),
        )
        .route(
            "/companies/{company_id}/clients/{client_id}/ledger",
            get(reports::client_ledger),
        )
        .route(
            "/companies/{company_id}/vendors",
            get(parties::vendor_list).post(parties::vendor_new),
        )
        .route(
            "/companies/{company_id}/vendors/{vendor_id}",
            get(parties::vendor_get),
        )
        .route(
            "/companies/{company_id}/vendors/{vendor_id}/ledger",
            get(reports::vendor_ledger),
        )
        .route(
            "/companies/{company_id}/invoices",
            post(invoices::invoice_new),
        )
        .route(
            "/companies/{company_id}/invoices/{invoice_id}",
            get(invoices::get)
                .patch(invoices::update)
                .delete(invoices::delete),
        )
        .route(
            "/companies/{company_id}/receipts",
            post(receipts::receipt_new),
        )
        .route(
            "/companies/{company_id}/receipts/{receipt_id}",
            get(receipts::get)
                .patch(receipts::update)
                .delete(receipts::delete),
        )
        .route(
            "/companies/{company_id}/vendor-payments",
            post(vendor_payments::vendor_payment_new),
        )
        .route(
            "/companies/{company_id}/vendor-payments/{payment_id}",
            get(vendor_payments::get)
                .patch(vendor_payments::update)
                .delete(vendor_payments::delete),
        )
        .route(
            "/companies/{company_id}/transfers",
            post(transfers::transfer_new),
        )
        .route(
            "/companies/{company_id}/transfers/{transfer_id}",
            get(transfers::get)
                .patch(transfers::update)
                .delete(transfers::delete),
        )
        .route(
            "/companies/{company_id}/advance-returns",
            post(advance_returns::advance_return_new),
        )
        .route(
            "/companies/{company_id}/advance-returns/{return_id}",
            get(advance_returns::get)
                .patch(advance_returns::update)
                .delete(advance_returns::delete),
        )
        .route(
            "/companies/{company_id}/reports/profit-loss",
            get(reports::profit_loss),
        )
        .route(
            "/companies/{company_id}/reports/collections",
            get(reports::collections),
        )
        .route("/companies/{company_id}/reconcile", get(reports::reconcile))
        .route("/companies/{company_id}/recompute", post(reports::recompute))
        .route("/companies/{company_id}/vouchers", post(reports::voucher_new))
        .with_state(state)
}

pub async fn run(engine: Engine, addr: &str) {
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener on {addr}: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(Arc::new(engine))).await
}

pub fn spawn_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
