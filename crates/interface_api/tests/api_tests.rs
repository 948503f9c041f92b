//! End-to-end API tests over the in-memory store

use std::str::FromStr;
use std::sync::Arc;

use axum_test::TestServer;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

use domain_ledger::LedgerStore;
use domain_occupancy::OccupancyStore;
use infra_store::InMemoryStore;
use interface_api::{config::ApiConfig, create_router, AppState};

fn test_server() -> TestServer {
    let store = InMemoryStore::shared();
    let ledger: Arc<dyn LedgerStore> = store.clone();
    let occupancy: Arc<dyn OccupancyStore> = store;
    let state = AppState::new(ledger, occupancy, ApiConfig::default());
    TestServer::new(create_router(state)).expect("failed to start test server")
}

fn amount(value: &Value, key: &str) -> Decimal {
    Decimal::from_str(value[key].as_str().expect("missing decimal field"))
        .expect("invalid decimal field")
}

async fn create_room(server: &TestServer, room_number: &str, room_type: &str) -> Value {
    let response = server
        .post("/api/v1/rooms")
        .json(&json!({
            "room_number": room_number,
            "room_type": room_type,
            "price_per_month": "5000",
        }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<Value>()
}

async fn create_resident(server: &TestServer, full_name: &str) -> Value {
    let response = server
        .post("/api/v1/residents")
        .json(&json!({ "full_name": full_name }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<Value>()
}

async fn allocate(server: &TestServer, room_id: &str, resident_id: &str) -> Value {
    let response = server
        .post(&format!("/api/v1/rooms/{room_id}/allocate"))
        .json(&json!({ "resident_id": resident_id }))
        .await;
    response.assert_status_ok();
    response.json::<Value>()
}

/// Creates a housed resident and generates their billing for the month,
/// returning the billing JSON
async fn generate_billing(server: &TestServer, period: &str) -> Value {
    let room = create_room(server, "101", "single").await;
    let resident = create_resident(server, "Asha Verma").await;
    allocate(
        server,
        room["id"].as_str().unwrap(),
        resident["id"].as_str().unwrap(),
    )
    .await;

    let response = server
        .post("/api/v1/billings/generate")
        .json(&json!({ "period": period }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    let report = response.json::<Value>();
    let billing_id = report["generated"][0].as_str().expect("no billing generated");

    let response = server.get(&format!("/api/v1/billings/{billing_id}")).await;
    response.assert_status_ok();
    response.json::<Value>()
}

#[tokio::test]
async fn health_endpoints_respond() {
    let server = test_server();

    let response = server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "ok");

    let response = server.get("/health/ready").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn create_room_applies_type_default_capacity() {
    let server = test_server();
    let room = create_room(&server, "204", "double").await;

    assert_eq!(room["capacity"], 2);
    assert_eq!(room["status"], "available");
    assert_eq!(amount(&room, "price_per_month"), dec!(5000));
    assert_eq!(room["currency"], "INR");
}

#[tokio::test]
async fn create_room_rejects_blank_number() {
    let server = test_server();
    let response = server
        .post("/api/v1/rooms")
        .json(&json!({
            "room_number": "",
            "room_type": "single",
            "price_per_month": "5000",
        }))
        .await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_room_number_conflicts() {
    let server = test_server();
    create_room(&server, "301", "single").await;

    let response = server
        .post("/api/v1/rooms")
        .json(&json!({
            "room_number": "301",
            "room_type": "double",
            "price_per_month": "6000",
        }))
        .await;
    response.assert_status(axum::http::StatusCode::CONFLICT);
}

#[tokio::test]
async fn create_resident_rejects_bad_email() {
    let server = test_server();
    let response = server
        .post("/api/v1/residents")
        .json(&json!({
            "full_name": "Ravi Kumar",
            "email": "not-an-email",
        }))
        .await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn allocation_links_resident_and_room() {
    let server = test_server();
    let room = create_room(&server, "102", "single").await;
    let resident = create_resident(&server, "Priya Nair").await;

    let outcome = allocate(
        &server,
        room["id"].as_str().unwrap(),
        resident["id"].as_str().unwrap(),
    )
    .await;

    assert_eq!(outcome["room"]["status"], "occupied");
    assert_eq!(outcome["resident"]["status"], "checked-in");
    assert_eq!(outcome["resident"]["room_id"], room["id"]);
}

#[tokio::test]
async fn allocation_into_full_room_conflicts() {
    let server = test_server();
    let room = create_room(&server, "103", "single").await;
    let first = create_resident(&server, "Meera Joshi").await;
    let second = create_resident(&server, "Arjun Das").await;
    let room_id = room["id"].as_str().unwrap();

    allocate(&server, room_id, first["id"].as_str().unwrap()).await;

    let response = server
        .post(&format!("/api/v1/rooms/{room_id}/allocate"))
        .json(&json!({ "resident_id": second["id"] }))
        .await;
    response.assert_status(axum::http::StatusCode::CONFLICT);
}

#[tokio::test]
async fn generation_is_idempotent_per_month() {
    let server = test_server();
    let billing = generate_billing(&server, "2026-08").await;

    assert_eq!(billing["status"], "pending");
    assert_eq!(amount(&billing, "room_fee"), dec!(5000));
    assert_eq!(amount(&billing, "total_amount"), dec!(5000));

    let response = server
        .post("/api/v1/billings/generate")
        .json(&json!({ "period": "2026-08" }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    let report = response.json::<Value>();
    assert_eq!(report["generated"].as_array().unwrap().len(), 0);
    assert_eq!(report["skipped"], 1);
}

#[tokio::test]
async fn invoice_issued_once_per_billing() {
    let server = test_server();
    let billing = generate_billing(&server, "2026-08").await;
    let billing_id = billing["id"].as_str().unwrap();

    let response = server
        .post(&format!("/api/v1/billings/{billing_id}/invoice"))
        .json(&json!({}))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    let invoice = response.json::<Value>();
    assert!(invoice["invoice_number"].as_str().unwrap().starts_with("INV-"));
    assert_eq!(amount(&invoice, "total_amount"), dec!(5000));

    let response = server
        .post(&format!("/api/v1/billings/{billing_id}/invoice"))
        .json(&json!({}))
        .await;
    response.assert_status(axum::http::StatusCode::CONFLICT);

    let response = server
        .get(&format!("/api/v1/billings/{billing_id}/invoice"))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["id"], invoice["id"]);
}

#[tokio::test]
async fn full_payment_settles_billing_and_invoice() {
    let server = test_server();
    let billing = generate_billing(&server, "2026-08").await;
    let billing_id = billing["id"].as_str().unwrap();

    server
        .post(&format!("/api/v1/billings/{billing_id}/invoice"))
        .json(&json!({}))
        .await
        .assert_status(axum::http::StatusCode::CREATED);

    let response = server
        .post("/api/v1/payments")
        .json(&json!({
            "billing_id": billing_id,
            "amount": "5000",
            "method": "upi",
        }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    let outcome = response.json::<Value>();

    assert_eq!(outcome["payment"]["status"], "completed");
    assert_eq!(outcome["billing"]["status"], "paid");
    assert!(outcome["billing"]["paid_at"].is_string());
    assert_eq!(outcome["invoice"]["status"], "paid");
}

#[tokio::test]
async fn partial_payment_leaves_billing_pending() {
    let server = test_server();
    let billing = generate_billing(&server, "2026-08").await;
    let billing_id = billing["id"].as_str().unwrap();

    let response = server
        .post("/api/v1/payments")
        .json(&json!({
            "billing_id": billing_id,
            "amount": "2000",
            "method": "cash",
        }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    assert_eq!(response.json::<Value>()["billing"]["status"], "pending");

    let response = server
        .get(&format!("/api/v1/billings/{billing_id}/payments"))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>().as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn overpayment_is_rejected() {
    let server = test_server();
    let billing = generate_billing(&server, "2026-08").await;
    let billing_id = billing["id"].as_str().unwrap();

    let response = server
        .post("/api/v1/payments")
        .json(&json!({
            "billing_id": billing_id,
            "amount": "5000.01",
            "method": "card",
        }))
        .await;
    response.assert_status(axum::http::StatusCode::CONFLICT);

    let response = server
        .get(&format!("/api/v1/billings/{billing_id}/payments"))
        .await;
    assert_eq!(response.json::<Value>().as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn payment_quoting_wrong_invoice_is_rejected() {
    let server = test_server();
    let july = generate_billing(&server, "2026-07").await;
    let july_id = july["id"].as_str().unwrap();

    let response = server
        .post(&format!("/api/v1/billings/{july_id}/invoice"))
        .json(&json!({}))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    let july_invoice = response.json::<Value>();

    let response = server
        .post("/api/v1/billings/generate")
        .json(&json!({ "period": "2026-08" }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    let august_id = response.json::<Value>()["generated"][0]
        .as_str()
        .unwrap()
        .to_string();

    // August's payment cannot ride on July's invoice
    let response = server
        .post("/api/v1/payments")
        .json(&json!({
            "billing_id": august_id,
            "invoice_id": july_invoice["id"],
            "amount": "5000",
            "method": "cash",
        }))
        .await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);

    let response = server
        .get(&format!("/api/v1/billings/{august_id}/payments"))
        .await;
    assert_eq!(response.json::<Value>().as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn refund_demotes_settled_billing() {
    let server = test_server();
    let billing = generate_billing(&server, "2026-08").await;
    let billing_id = billing["id"].as_str().unwrap();

    let response = server
        .post("/api/v1/payments")
        .json(&json!({
            "billing_id": billing_id,
            "amount": "5000",
            "method": "online",
        }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    let payment_id = response.json::<Value>()["payment"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = server
        .post(&format!("/api/v1/payments/{payment_id}/refund"))
        .await;
    response.assert_status_ok();
    let outcome = response.json::<Value>();
    assert_eq!(outcome["payment"]["status"], "refunded");
    assert_eq!(outcome["billing"]["status"], "pending");
    assert!(outcome["billing"]["paid_at"].is_null());

    // A refunded payment cannot be refunded again
    let response = server
        .post(&format!("/api/v1/payments/{payment_id}/refund"))
        .await;
    response.assert_status(axum::http::StatusCode::CONFLICT);
}

#[tokio::test]
async fn cancelled_billing_refuses_payments() {
    let server = test_server();
    let billing = generate_billing(&server, "2026-08").await;
    let billing_id = billing["id"].as_str().unwrap();

    let response = server
        .post(&format!("/api/v1/billings/{billing_id}/cancel"))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "cancelled");

    let response = server
        .post("/api/v1/payments")
        .json(&json!({
            "billing_id": billing_id,
            "amount": "5000",
            "method": "cash",
        }))
        .await;
    response.assert_status(axum::http::StatusCode::CONFLICT);
}

#[tokio::test]
async fn sweep_marks_elapsed_unpaid_billings() {
    let server = test_server();
    let billing = generate_billing(&server, "2026-07").await;
    let billing_id = billing["id"].as_str().unwrap();

    let response = server
        .post("/api/v1/billings/sweep-overdue")
        .json(&json!({ "as_of": "2026-08-20" }))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["billings_marked"], 1);

    let response = server.get(&format!("/api/v1/billings/{billing_id}")).await;
    assert_eq!(response.json::<Value>()["status"], "overdue");
}

#[tokio::test]
async fn unknown_billing_returns_not_found() {
    let server = test_server();
    let response = server
        .get("/api/v1/billings/00000000-0000-0000-0000-000000000000")
        .await;
    response.assert_status(axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn resident_billing_history_totals() {
    let server = test_server();
    let billing = generate_billing(&server, "2026-07").await;
    let resident_id = billing["resident_id"].as_str().unwrap();

    server
        .post("/api/v1/billings/generate")
        .json(&json!({ "period": "2026-08" }))
        .await
        .assert_status(axum::http::StatusCode::CREATED);

    let response = server
        .get(&format!("/api/v1/residents/{resident_id}/billings"))
        .await;
    response.assert_status_ok();
    let summary = response.json::<Value>();
    assert_eq!(summary["count"], 2);
    assert_eq!(amount(&summary, "total"), dec!(10000));
}

#[tokio::test]
async fn vacate_frees_room_without_checkout() {
    let server = test_server();
    let room = create_room(&server, "105", "single").await;
    let resident = create_resident(&server, "Kiran Shah").await;
    let resident_id = resident["id"].as_str().unwrap();

    allocate(&server, room["id"].as_str().unwrap(), resident_id).await;

    let response = server
        .post(&format!("/api/v1/residents/{resident_id}/vacate"))
        .await;
    response.assert_status_ok();
    let outcome = response.json::<Value>();
    assert_eq!(outcome["room"]["status"], "available");
    assert_eq!(outcome["resident"]["status"], "checked-in");
    assert!(outcome["resident"]["room_id"].is_null());

    let response = server
        .post(&format!("/api/v1/residents/{resident_id}/check-out"))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "checked-out");
}
