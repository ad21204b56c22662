//! API integration tests against a running server.
//!
//! Run with: cargo test --test api_tests -- --ignored
//! The server must share `JWT_SECRET` with the test process. Lending flows
//! need `LENDING_TEST_BOOK_ID` naming a book whose stock record has at
//! least one copy available.

use chrono::Duration;
use lending_server::models::{Role, UserClaims};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

const BASE_URL: &str = "http://localhost:8080/api/v1";

fn jwt_secret() -> String {
    std::env::var("JWT_SECRET").unwrap_or_else(|_| "change-this-secret-in-production".to_string())
}

fn token_for(user_id: Uuid, role: Role) -> String {
    UserClaims::new(user_id, role, Duration::minutes(10))
        .create_token(&jwt_secret())
        .expect("Failed to sign token")
}

fn seeded_book() -> Option<Uuid> {
    std::env::var("LENDING_TEST_BOOK_ID")
        .ok()
        .and_then(|id| id.parse().ok())
}

async fn borrow(client: &Client, token: &str, book_id: Uuid, due_date: &str) -> reqwest::Response {
    client
        .post(format!("{}/loans/borrow", BASE_URL))
        .bearer_auth(token)
        .json(&json!({ "book_id": book_id, "due_date": due_date }))
        .send()
        .await
        .expect("Failed to send borrow request")
}

async fn give_back(client: &Client, token: &str, book_id: Uuid) -> reqwest::Response {
    client
        .post(format!("{}/loans/return", BASE_URL))
        .bearer_auth(token)
        .json(&json!({ "book_id": book_id, "returned_date": "2024-06-20" }))
        .send()
        .await
        .expect("Failed to send return request")
}

async fn available_stock(client: &Client, book_id: Uuid) -> i64 {
    let token = token_for(Uuid::new_v4(), Role::User);
    let body: Value = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse book");
    body["available_stock"].as_i64().expect("book has no stock record")
}

#[tokio::test]
#[ignore]
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_readiness_check() {
    let response = Client::new()
        .get(format!("{}/ready", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore]
async fn test_borrow_requires_token() {
    let response = Client::new()
        .post(format!("{}/loans/borrow", BASE_URL))
        .json(&json!({ "book_id": Uuid::new_v4(), "due_date": "2024-07-01" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_borrow_rejects_admin_role() {
    let client = Client::new();
    let token = token_for(Uuid::new_v4(), Role::Admin);

    let response = borrow(&client, &token, Uuid::new_v4(), "2024-07-01").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore]
async fn test_borrow_malformed_date() {
    let client = Client::new();
    let token = token_for(Uuid::new_v4(), Role::User);

    let response = borrow(&client, &token, Uuid::new_v4(), "07/01/2024").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "InvalidDate");
}

#[tokio::test]
#[ignore]
async fn test_borrow_unknown_stock() {
    let client = Client::new();
    let token = token_for(Uuid::new_v4(), Role::User);

    let response = borrow(&client, &token, Uuid::new_v4(), "2024-07-01").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "StockNotFound");
}

#[tokio::test]
#[ignore]
async fn test_borrow_and_return_round_trip() {
    let Some(book_id) = seeded_book() else {
        eprintln!("LENDING_TEST_BOOK_ID not set, skipping");
        return;
    };
    let client = Client::new();
    let token = token_for(Uuid::new_v4(), Role::User);
    let before = available_stock(&client, book_id).await;

    let response = borrow(&client, &token, book_id, "2024-07-01").await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(available_stock(&client, book_id).await, before - 1);

    let response = borrow(&client, &token, book_id, "2024-07-01").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "AlreadyBorrowed");

    let response = give_back(&client, &token, book_id).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(available_stock(&client, book_id).await, before);

    let response = give_back(&client, &token, book_id).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "AlreadyReturned");
}

#[tokio::test]
#[ignore]
async fn test_return_without_loan() {
    let Some(book_id) = seeded_book() else {
        eprintln!("LENDING_TEST_BOOK_ID not set, skipping");
        return;
    };
    let client = Client::new();
    let token = token_for(Uuid::new_v4(), Role::User);

    let response = give_back(&client, &token, book_id).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "NoOpenLoan");
}

#[tokio::test]
#[ignore]
async fn test_concurrent_borrowers_never_oversell() {
    let Some(book_id) = seeded_book() else {
        eprintln!("LENDING_TEST_BOOK_ID not set, skipping");
        return;
    };
    let client = Client::new();
    let before = available_stock(&client, book_id).await;

    let users: Vec<(Uuid, String)> = (0..before + 3)
        .map(|_| {
            let user = Uuid::new_v4();
            (user, token_for(user, Role::User))
        })
        .collect();

    let attempts = users.iter().map(|(_, token)| {
        let client = client.clone();
        let token = token.clone();
        tokio::spawn(async move { borrow(&client, &token, book_id, "2024-07-01").await.status() })
    });
    let mut statuses = Vec::new();
    for attempt in attempts.collect::<Vec<_>>() {
        statuses.push(attempt.await.expect("borrow task panicked"));
    }

    let created = statuses.iter().filter(|s| **s == StatusCode::CREATED).count();
    assert_eq!(created as i64, before);
    assert_eq!(available_stock(&client, book_id).await, 0);

    // Hand every copy back so the fixture can be reused
    for (user, token) in &users {
        let response = give_back(&client, token, book_id).await;
        assert!(
            response.status() == StatusCode::OK
                || response.status() == StatusCode::UNPROCESSABLE_ENTITY,
            "unexpected return status for {user}"
        );
    }
    assert_eq!(available_stock(&client, book_id).await, before);
}
