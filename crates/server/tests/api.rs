use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use migration::MigratorTrait;
use sea_orm::Database;
use serde_json::{Value, json};
use tower::ServiceExt;

use engine::Engine;

async fn app() -> Router {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db).build().await.unwrap();
    server::router(Arc::new(engine))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn seed(app: &Router) -> (String, String, String) {
    let (status, account) = send(
        app,
        "POST",
        "/companies/acme/accounts",
        Some(json!({ "name": "Cash", "kind": "cash", "opening_balance_minor": 10_000 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, client) = send(
        app,
        "POST",
        "/companies/acme/clients",
        Some(json!({ "name": "Rahim Travels" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let client_id = client["id"].as_str().unwrap().to_string();
    let (status, invoice) = send(
        app,
        "POST",
        "/companies/acme/invoices",
        Some(json!({
            "client_id": client_id,
            "invoice_date": "2026-03-01",
            "net_total_minor": 30_000,
            "note": null,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(invoice["status"], "due");

    (
        account["id"].as_str().unwrap().to_string(),
        client_id,
        invoice["id"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn receipt_flow_updates_invoice_client_and_account() {
    let app = app().await;
    let (account_id, client_id, invoice_id) = seed(&app).await;

    let (status, receipt) = send(
        &app,
        "POST",
        "/companies/acme/receipts",
        Some(json!({
            "client_id": client_id,
            "account_id": account_id,
            "amount_minor": 20_000,
            "payment_to": "invoice",
            "payment_date": "2026-03-05",
            "note": null,
            "allocations": [{ "invoice_id": invoice_id, "amount_minor": 20_000 }],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(receipt["voucher_no"], "MR-000001");
    assert_eq!(receipt["unallocated_minor"], 0);

    let (_, invoice) = send(&app, "GET", &format!("/companies/acme/invoices/{invoice_id}"), None).await;
    assert_eq!(invoice["status"], "partial");
    assert_eq!(invoice["remaining_minor"], 10_000);

    let (_, client) = send(&app, "GET", &format!("/companies/acme/clients/{client_id}"), None).await;
    assert_eq!(client["due_minor"], 10_000);

    let (_, account) = send(&app, "GET", &format!("/companies/acme/accounts/{account_id}"), None).await;
    assert_eq!(account["balance_minor"], 30_000);

    let receipt_id = receipt["id"].as_str().unwrap();
    let (status, body) = send(&app, "DELETE", &format!("/companies/acme/receipts/{receipt_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));

    let (_, invoice) = send(&app, "GET", &format!("/companies/acme/invoices/{invoice_id}"), None).await;
    assert_eq!(invoice["status"], "due");

    let (status, body) = send(&app, "DELETE", &format!("/companies/acme/invoices/{invoice_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    let (status, _) = send(&app, "GET", &format!("/companies/acme/invoices/{invoice_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, report) = send(&app, "GET", "/companies/acme/reconcile", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["consistent"], true);
}

#[tokio::test]
async fn overpaying_an_invoice_is_unprocessable() {
    let app = app().await;
    let (account_id, client_id, invoice_id) = seed(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        "/companies/acme/receipts",
        Some(json!({
            "client_id": client_id,
            "account_id": account_id,
            "amount_minor": 50_000,
            "payment_to": "invoice",
            "payment_date": "2026-03-05",
            "note": null,
            "allocations": [{ "invoice_id": invoice_id, "amount_minor": 40_000 }],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].is_string());

    let (_, account) = send(&app, "GET", &format!("/companies/acme/accounts/{account_id}"), None).await;
    assert_eq!(account["balance_minor"], 10_000);
}

#[tokio::test]
async fn other_companies_cannot_see_records() {
    let app = app().await;
    let (account_id, _, invoice_id) = seed(&app).await;

    let (status, _) = send(&app, "GET", &format!("/companies/globex/invoices/{invoice_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "GET", &format!("/companies/globex/accounts/{account_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, accounts) = send(&app, "GET", "/companies/globex/accounts", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(accounts.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn ledger_and_reports_are_served() {
    let app = app().await;
    let (account_id, client_id, _) = seed(&app).await;

    let (status, ledger) = send(
        &app,
        "GET",
        &format!("/companies/acme/clients/{client_id}/ledger?from=2026-01-01&to=2026-12-31"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ledger["rows"].as_array().unwrap().len(), 1);
    assert_eq!(ledger["closing_balance_minor"], -30_000);

    let (status, pl) = send(&app, "GET", "/companies/acme/reports/profit-loss", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pl["sales_minor"], 30_000);

    let (status, collections) = send(&app, "GET", "/companies/acme/reports/collections", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(collections["total_minor"], 0);

    let (status, _) = send(
        &app,
        "GET",
        &format!("/companies/acme/accounts/{account_id}/ledger?from=2026-12-31&to=2026-01-01"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn vouchers_are_issued_in_sequence() {
    let app = app().await;

    let (status, first) = send(
        &app,
        "POST",
        "/companies/acme/vouchers",
        Some(json!({ "series": "expense" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["voucher_no"], "EXP-000001");

    let (_, second) = send(
        &app,
        "POST",
        "/companies/acme/vouchers",
        Some(json!({ "series": "expense" })),
    )
    .await;
    assert_eq!(second["voucher_no"], "EXP-000002");
}
