//! API integration tests
//!
//! These run against a live server with a fresh database:
//! `cargo test --test api_tests -- --ignored`

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Helper to get an admin token (bootstrap superuser credentials)
async fn get_admin_token(client: &Client) -> String {
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "email": "admin@carrel.local",
            "password": "admin"
        }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

/// Register a student and return the profile id
async fn register_student(client: &Client, email: &str, id_number: &str) -> i64 {
    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({
            "role": "student",
            "name": "Test Student",
            "email": email,
            "phone_number": "01700000000",
            "password": "passw0rd!",
            "password_confirm": "passw0rd!",
            "id_number": id_number,
            "department": "CSE"
        }))
        .send()
        .await
        .expect("Failed to send register request");

    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse response");
    body["profile"]["id"].as_i64().expect("No profile id")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
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
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "email": "admin@carrel.local",
            "password": "wrong"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_admin_login_bypasses_approval() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "email": "admin@carrel.local",
            "password": "admin"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["token"].is_string());
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["account"]["is_superuser"], true);
}

#[tokio::test]
#[ignore]
async fn test_registration_approval_flow() {
    let client = Client::new();
    let token = get_admin_token(&client).await;

    let profile_id = register_student(&client, "flow.student@example.edu", "FLOW-001").await;

    // Pending accounts cannot log in
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "email": "flow.student@example.edu",
            "password": "passw0rd!"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 401);

    // Approve the profile
    let response = client
        .post(format!("{}/profiles/{}/approve", BASE_URL, profile_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "approved");

    // Approval reactivates the login
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "email": "flow.student@example.edu",
            "password": "passw0rd!"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    // Approving twice is a conflict
    let response = client
        .post(format!("{}/profiles/{}/approve", BASE_URL, profile_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);
}

#[tokio::test]
#[ignore]
async fn test_rejected_login_carries_reason() {
    let client = Client::new();
    let token = get_admin_token(&client).await;

    let profile_id = register_student(&client, "reject.student@example.edu", "REJ-001").await;

    let response = client
        .post(format!("{}/profiles/{}/reject", BASE_URL, profile_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "reason": "Invalid student ID" }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "email": "reject.student@example.edu",
            "password": "passw0rd!"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 401);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["message"]
        .as_str()
        .unwrap_or_default()
        .contains("Invalid student ID"));
}

#[tokio::test]
#[ignore]
async fn test_duplicate_email_rejected() {
    let client = Client::new();

    register_student(&client, "dup.student@example.edu", "DUP-001").await;

    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({
            "role": "student",
            "name": "Second Student",
            "email": "dup.student@example.edu",
            "phone_number": "01700000001",
            "password": "passw0rd!",
            "password_confirm": "passw0rd!",
            "id_number": "DUP-002",
            "department": "EEE"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 409);
}

#[tokio::test]
#[ignore]
async fn test_weak_passwords_rejected() {
    let client = Client::new();

    for password in ["short1", "12345678", "abcdefgh"] {
        let response = client
            .post(format!("{}/auth/register", BASE_URL))
            .json(&json!({
                "role": "librarian",
                "name": "Weak Password",
                "email": format!("weak.{}@example.edu", password),
                "phone_number": "01700000002",
                "password": password,
                "password_confirm": password
            }))
            .send()
            .await
            .expect("Failed to send request");

        assert_eq!(response.status(), 400, "password {:?} should be rejected", password);
    }
}

#[tokio::test]
#[ignore]
async fn test_book_crud_and_isbn_uniqueness() {
    let client = Client::new();
    let token = get_admin_token(&client).await;

    // Create
    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "title": "The Da Vinci Code",
            "author": "Dan Brown",
            "isbn": "9780307474278",
            "quantity": 3
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse response");
    let book_id = body["id"].as_i64().expect("No book id");

    // Duplicate ISBN
    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "title": "Another Copy",
            "author": "Dan Brown",
            "isbn": "978-0-307-47427-8",
            "quantity": 1
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    // Update
    let response = client
        .put(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "quantity": 5 }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["quantity"], 5);

    // Delete
    let response = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 204);
}

#[tokio::test]
#[ignore]
async fn test_issue_and_partial_return() {
    let client = Client::new();
    let token = get_admin_token(&client).await;

    let profile_id = register_student(&client, "loan.student@example.edu", "LOAN-001").await;
    client
        .post(format!("{}/profiles/{}/approve", BASE_URL, profile_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to approve");

    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "title": "Clean Code",
            "author": "Robert C. Martin",
            "isbn": "9780132350884",
            "quantity": 4
        }))
        .send()
        .await
        .expect("Failed to create book");
    let body: Value = response.json().await.expect("Failed to parse response");
    let book_id = body["id"].as_i64().expect("No book id");

    // Issuing more copies than available is rejected
    let response = client
        .post(format!("{}/issues", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "profile_id": profile_id,
            "book_id": book_id,
            "quantity": 10
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 422);

    // Issue two copies
    let response = client
        .post(format!("{}/issues", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "profile_id": profile_id,
            "book_id": book_id,
            "quantity": 2
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse response");
    let issue_id = body["id"].as_i64().expect("No issue id");

    // Stock went down
    let response = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to get book");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["quantity"], 2);

    // Partial return keeps the record open
    let response = client
        .post(format!("{}/issues/{}/return", BASE_URL, issue_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "quantity": 1 }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "partially_returned");
    assert_eq!(body["issue"]["is_returned"], false);

    // Returning the rest completes the loan
    let response = client
        .post(format!("{}/issues/{}/return", BASE_URL, issue_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({}))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "returned");
    assert_eq!(body["issue"]["is_returned"], true);

    // Stock restored
    let response = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to get book");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["quantity"], 4);

    // A completed loan cannot be returned again
    let response = client
        .post(format!("{}/issues/{}/return", BASE_URL, issue_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({}))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 422);
}

#[tokio::test]
#[ignore]
async fn test_stats_require_staff() {
    let client = Client::new();

    let response = client
        .get(format!("{}/stats", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 401);

    let token = get_admin_token(&client).await;
    let response = client
        .get(format!("{}/stats", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["total_books"].is_number());
    assert!(body["pending_approvals"].is_number());
}
