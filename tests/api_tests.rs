//! API integration tests
//!
//! These run against a live server with a migrated database.
//! Run with: cargo test -- --ignored

use reqwest::Client;
use serde_json::{json, Value};
use std::time::{SystemTime, UNIX_EPOCH};

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Unique suffix so tests can be re-run against the same database
fn unique() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .as_nanos()
}

async fn create_book(client: &Client, title: &str) -> i64 {
    let response = client
        .post(format!("{}/books", BASE_URL))
        .json(&json!({
            "title": title,
            "author": "Test Author",
            "publication_year": 1999
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse response");
    body["id"].as_i64().expect("No book ID")
}

async fn create_member(client: &Client, name: &str) -> i64 {
    let response = client
        .post(format!("{}/members", BASE_URL))
        .json(&json!({
            "name": name,
            "email": format!("{}-{}@example.org", name, unique()),
            "phone": "555-0100"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse response");
    body["id"].as_i64().expect("No member ID")
}

async fn book_available(client: &Client, book_id: i64) -> bool {
    let response = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    body["available"].as_bool().expect("No available flag")
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
async fn test_book_crud() {
    let client = Client::new();
    let book_id = create_book(&client, &format!("CRUD Book {}", unique())).await;

    // Book starts out available
    assert!(book_available(&client, book_id).await);

    // Partial update, including the availability flag
    let response = client
        .put(format!("{}/books/{}", BASE_URL, book_id))
        .json(&json!({ "author": "Updated Author", "available": false }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["author"], "Updated Author");
    assert_eq!(body["available"], false);

    // Delete (no loans ever touched this book)
    let response = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 204);

    // Gone now
    let response = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_create_book_missing_fields() {
    let client = Client::new();

    let response = client
        .post(format!("{}/books", BASE_URL))
        .json(&json!({ "title": "", "author": "" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_member_email_conflict() {
    let client = Client::new();
    let email = format!("duplicate-{}@example.org", unique());

    let response = client
        .post(format!("{}/members", BASE_URL))
        .json(&json!({ "name": "First", "email": email }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);

    // Same email again, case changed
    let response = client
        .post(format!("{}/members", BASE_URL))
        .json(&json!({ "name": "Second", "email": email.to_uppercase() }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["error"].as_str().unwrap().contains("Email"));
}

#[tokio::test]
#[ignore]
async fn test_loan_lifecycle() {
    let client = Client::new();
    let book_id = create_book(&client, &format!("Lifecycle Book {}", unique())).await;
    let member_id = create_member(&client, "lifecycle-member").await;
    let other_member_id = create_member(&client, "other-member").await;

    // Checkout
    let response = client
        .post(format!("{}/loans", BASE_URL))
        .json(&json!({ "member_id": member_id, "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse response");
    let loan_id = body["id"].as_i64().expect("No loan ID");
    assert_eq!(body["book_id"].as_i64(), Some(book_id));
    assert_eq!(body["available"], false);
    assert!(body["book_title"].is_string());
    assert!(body["member_name"].is_string());

    assert!(!book_available(&client, book_id).await);

    // Same member tries again
    let response = client
        .post(format!("{}/loans", BASE_URL))
        .json(&json!({ "member_id": member_id, "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["error"].as_str().unwrap().contains("already has this book"));

    // Another member tries while the book is out
    let response = client
        .post(format!("{}/loans", BASE_URL))
        .json(&json!({ "member_id": other_member_id, "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["error"].as_str().unwrap().contains("not available"));

    assert!(!book_available(&client, book_id).await);

    // Return
    let response = client
        .put(format!("{}/loans/{}/return", BASE_URL, loan_id))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["available"], true);

    assert!(book_available(&client, book_id).await);

    // Second return fails
    let response = client
        .put(format!("{}/loans/{}/return", BASE_URL, loan_id))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);

    // The loan record carries the return date
    let response = client
        .get(format!("{}/loans/{}", BASE_URL, loan_id))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["returned_date"].is_string());
    assert_eq!(body["is_overdue"], false);
}

#[tokio::test]
#[ignore]
async fn test_loan_unknown_book_and_member() {
    let client = Client::new();
    let member_id = create_member(&client, "unknown-refs").await;

    let response = client
        .post(format!("{}/loans", BASE_URL))
        .json(&json!({ "member_id": member_id, "book_id": 999_999_999 }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 404);

    let book_id = create_book(&client, &format!("Orphan Book {}", unique())).await;

    let response = client
        .post(format!("{}/loans", BASE_URL))
        .json(&json!({ "member_id": 999_999_999, "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 404);

    // Failed attempts never flipped the flag
    assert!(book_available(&client, book_id).await);
}

#[tokio::test]
#[ignore]
async fn test_concurrent_checkout_single_winner() {
    let client = Client::new();
    let book_id = create_book(&client, &format!("Contended Book {}", unique())).await;
    let m1 = create_member(&client, "racer-one").await;
    let m2 = create_member(&client, "racer-two").await;

    let first = client
        .post(format!("{}/loans", BASE_URL))
        .json(&json!({ "member_id": m1, "book_id": book_id }))
        .send();
    let second = client
        .post(format!("{}/loans", BASE_URL))
        .json(&json!({ "member_id": m2, "book_id": book_id }))
        .send();

    let (first, second) = tokio::join!(first, second);
    let statuses = [
        first.expect("Failed to send request").status().as_u16(),
        second.expect("Failed to send request").status().as_u16(),
    ];

    let created = statuses.iter().filter(|&&s| s == 201).count();
    let rejected = statuses.iter().filter(|&&s| s == 400).count();
    assert_eq!(created, 1, "exactly one checkout must win: {:?}", statuses);
    assert_eq!(rejected, 1, "the loser must get a conflict: {:?}", statuses);

    assert!(!book_available(&client, book_id).await);
}

#[tokio::test]
#[ignore]
async fn test_delete_book_with_loan_history() {
    let client = Client::new();
    let book_id = create_book(&client, &format!("History Book {}", unique())).await;
    let member_id = create_member(&client, "historian").await;

    let response = client
        .post(format!("{}/loans", BASE_URL))
        .json(&json!({ "member_id": member_id, "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse response");
    let loan_id = body["id"].as_i64().expect("No loan ID");

    // Open loan blocks deletion, force or not
    let response = client
        .delete(format!("{}/books/{}?force=true", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);

    let response = client
        .put(format!("{}/loans/{}/return", BASE_URL, loan_id))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 200);

    // Returned-loan history still blocks a plain delete
    let response = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);

    // force removes book and history together
    let response = client
        .delete(format!("{}/books/{}?force=true", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 204);

    let response = client
        .get(format!("{}/loans/{}", BASE_URL, loan_id))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_member_loans_listing() {
    let client = Client::new();
    let book_id = create_book(&client, &format!("Listed Book {}", unique())).await;
    let member_id = create_member(&client, "list-member").await;

    let response = client
        .post(format!("{}/loans", BASE_URL))
        .json(&json!({ "member_id": member_id, "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);

    let response = client
        .get(format!("{}/loans/member/{}", BASE_URL, member_id))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["member"]["id"].as_i64(), Some(member_id));
    let loans = body["loans"].as_array().expect("loans not an array");
    assert_eq!(loans.len(), 1);
    assert_eq!(loans[0]["book_id"].as_i64(), Some(book_id));

    // Active listing contains it too
    let response = client
        .get(format!("{}/loans/active", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body
        .as_array()
        .expect("not an array")
        .iter()
        .any(|l| l["book_id"].as_i64() == Some(book_id)));

    let response = client
        .get(format!("{}/loans/member/999999999", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 404);
}
