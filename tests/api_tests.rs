//! Integration tests for the Bookshelf Server API

use std::sync::Arc;

use axum::http::{header::AUTHORIZATION, HeaderValue, StatusCode};
use axum_test::{TestRequest, TestServer};
use chrono::NaiveDate;
use serde_json::{json, Value};

use bookshelf_server::{
    api,
    clock::{Clock, FixedClock},
    config::AppConfig,
    repository::Repository,
    services::Services,
    AppState,
};

const ADMIN_EMAIL: &str = "admin@bookshelf.test";
const ADMIN_PASSWORD: &str = "admin-secret";

fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

struct TestApp {
    server: TestServer,
    clock: Arc<FixedClock>,
}

/// Create a test server backed by in-memory storage and a fixed clock
async fn create_test_app() -> TestApp {
    create_test_app_with(Repository::in_memory()).await
}

async fn create_test_app_with(repository: Repository) -> TestApp {
    let mut config = AppConfig::default();
    config.auth.jwt_secret = "test-secret".to_string();
    config.auth.admin_email = Some(ADMIN_EMAIL.to_string());
    config.auth.admin_password = Some(ADMIN_PASSWORD.to_string());

    let clock = Arc::new(FixedClock::new(start_date()));
    let shared_clock: Arc<dyn Clock> = clock.clone();
    let services = Services::new(repository, config.auth.clone(), shared_clock);
    services
        .auth
        .ensure_admin()
        .await
        .expect("Failed to create admin");

    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    let server = TestServer::new(api::router(state)).expect("Failed to create test server");
    TestApp { server, clock }
}

fn bearer(request: TestRequest, token: &str) -> TestRequest {
    request.add_header(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    )
}

async fn login(server: &TestServer, email: &str, password: &str) -> String {
    let response = server
        .post("/api/v1/auth/login")
        .json(&json!({ "email": email, "password": password }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    body["token"].as_str().expect("No token in response").to_string()
}

async fn admin_token(server: &TestServer) -> String {
    login(server, ADMIN_EMAIL, ADMIN_PASSWORD).await
}

async fn reader_token(server: &TestServer) -> String {
    let response = server
        .post("/api/v1/auth/register")
        .json(&json!({
            "name": "Reader",
            "email": "reader@bookshelf.test",
            "password": "reader-secret"
        }))
        .await;
    response.assert_status(StatusCode::CREATED);

    let body: Value = response.json();
    body["token"].as_str().unwrap().to_string()
}

async fn create_book(server: &TestServer, token: &str, book: Value) -> Value {
    let response = bearer(server.post("/api/v1/books"), token).json(&book).await;
    response.assert_status(StatusCode::CREATED);
    response.json()
}

async fn gatsby(server: &TestServer, token: &str) -> i64 {
    let book = create_book(
        server,
        token,
        json!({
            "title": "The Great Gatsby",
            "author": "F. Scott Fitzgerald",
            "isbn": "9780743273565",
            "publishedYear": "1925",
            "pages": 180
        }),
    )
    .await;
    book["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_health_and_readiness() {
    let app = create_test_app().await;

    let response = app.server.get("/api/v1/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].is_string());

    let response = app.server.get("/api/v1/ready").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "ready");
}

#[tokio::test]
async fn test_list_books_empty() {
    let app = create_test_app().await;

    let response = app.server.get("/api/v1/books").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_catalog_writes_require_admin() {
    let app = create_test_app().await;
    let book = json!({ "title": "Dune", "author": "Frank Herbert" });

    let response = app.server.post("/api/v1/books").json(&book).await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["error"], "NotAuthorized");

    let reader = reader_token(&app.server).await;
    let response = bearer(app.server.post("/api/v1/books"), &reader)
        .json(&book)
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    let response = bearer(app.server.post("/api/v1/books"), "not-a-token")
        .json(&book)
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_and_get_book() {
    let app = create_test_app().await;
    let admin = admin_token(&app.server).await;

    let id = gatsby(&app.server, &admin).await;

    let response = app.server.get(&format!("/api/v1/books/{}", id)).await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["title"], "The Great Gatsby");
    assert_eq!(body["status"], "available");
    assert_eq!(body["publishedYear"], "1925");
    assert!(body.get("borrowedDate").is_none());
    assert!(body.get("dueDate").is_none());
    assert!(body.get("isOverdue").is_none());
}

#[tokio::test]
async fn test_create_book_rejects_invalid_input() {
    let app = create_test_app().await;
    let admin = admin_token(&app.server).await;

    let response = bearer(app.server.post("/api/v1/books"), &admin)
        .json(&json!({ "title": "", "author": "Nobody" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = bearer(app.server.post("/api/v1/books"), &admin)
        .json(&json!({ "title": "Dune", "author": "Frank Herbert", "status": "borrowed" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = bearer(app.server.post("/api/v1/books"), &admin)
        .json(&json!({
            "title": "Dune",
            "author": "Frank Herbert",
            "status": "reading",
            "progress": 101
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_requests_are_bad_values() {
    let app = create_test_app().await;
    let admin = admin_token(&app.server).await;

    // Missing required field
    let response = bearer(app.server.post("/api/v1/books"), &admin)
        .json(&json!({ "author": "Nobody" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "BadValue");
    assert_eq!(body["retryable"], false);

    // Not JSON at all
    let response = bearer(app.server.post("/api/v1/books"), &admin)
        .text("{ not json")
        .content_type("application/json")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], "BadValue");

    // Non-numeric id
    let response = app.server.get("/api/v1/books/abc").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], "BadValue");

    // Unknown status filter
    let response = app.server.get("/api/v1/books").add_query_param("status", "lost").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], "BadValue");
}

#[tokio::test]
async fn test_duplicate_isbn_conflicts() {
    let app = create_test_app().await;
    let admin = admin_token(&app.server).await;
    gatsby(&app.server, &admin).await;

    let response = bearer(app.server.post("/api/v1/books"), &admin)
        .json(&json!({
            "title": "Gatsby (reprint)",
            "author": "F. Scott Fitzgerald",
            "isbn": "9780743273565"
        }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_borrow_and_return_cycle() {
    let app = create_test_app().await;
    let admin = admin_token(&app.server).await;
    let reader = reader_token(&app.server).await;
    let id = gatsby(&app.server, &admin).await;

    let response = bearer(app.server.post(&format!("/api/v1/books/{}/borrow", id)), &reader).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "borrowed");
    assert_eq!(body["borrowedDate"], "2024-06-01");
    assert_eq!(body["dueDate"], "2024-06-15");
    assert_eq!(body["isOverdue"], false);

    // A borrowed book cannot be borrowed again
    let response = bearer(app.server.post(&format!("/api/v1/books/{}/borrow", id)), &reader).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "InvalidState");
    assert_eq!(body["retryable"], false);

    let response = bearer(app.server.post(&format!("/api/v1/books/{}/return", id)), &reader).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "available");
    assert!(body.get("borrowedDate").is_none());
    assert!(body.get("dueDate").is_none());

    let response = bearer(app.server.post(&format!("/api/v1/books/{}/return", id)), &reader).await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_borrow_requires_authentication() {
    let app = create_test_app().await;
    let admin = admin_token(&app.server).await;
    let id = gatsby(&app.server, &admin).await;

    let response = app.server.post(&format!("/api/v1/books/{}/borrow", id)).await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_borrow_unknown_book_is_not_found() {
    let app = create_test_app().await;
    let reader = reader_token(&app.server).await;

    let response = bearer(app.server.post("/api/v1/books/999/borrow"), &reader).await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["error"], "NoSuchRecord");
}

#[tokio::test]
async fn test_overdue_after_due_date() {
    let app = create_test_app().await;
    let admin = admin_token(&app.server).await;
    let id = gatsby(&app.server, &admin).await;

    bearer(app.server.post(&format!("/api/v1/books/{}/borrow", id)), &admin)
        .await
        .assert_status_ok();

    // Due date itself is not overdue
    app.clock.advance(14);
    let body: Value = app.server.get(&format!("/api/v1/books/{}", id)).await.json();
    assert_eq!(body["isOverdue"], false);

    app.clock.advance(1);
    let body: Value = app.server.get(&format!("/api/v1/books/{}", id)).await.json();
    assert_eq!(body["isOverdue"], true);

    let response = bearer(app.server.get("/api/v1/books/borrowed"), &admin).await;
    response.assert_status_ok();
    let borrowed: Value = response.json();
    assert_eq!(borrowed.as_array().unwrap().len(), 1);
    assert_eq!(borrowed[0]["id"], id);
    assert_eq!(borrowed[0]["isOverdue"], true);

    // Returning clears the overdue state
    bearer(app.server.post(&format!("/api/v1/books/{}/return", id)), &admin)
        .await
        .assert_status_ok();
    let body: Value = app.server.get(&format!("/api/v1/books/{}", id)).await.json();
    assert!(body.get("isOverdue").is_none());
}

#[tokio::test]
async fn test_stats_partition_catalog() {
    let app = create_test_app().await;
    let admin = admin_token(&app.server).await;

    let borrowed = gatsby(&app.server, &admin).await;
    create_book(
        &app.server,
        &admin,
        json!({ "title": "Dune", "author": "Frank Herbert", "status": "reading", "progress": 40 }),
    )
    .await;
    create_book(
        &app.server,
        &admin,
        json!({ "title": "Emma", "author": "Jane Austen", "status": "completed" }),
    )
    .await;
    create_book(
        &app.server,
        &admin,
        json!({ "title": "Ulysses", "author": "James Joyce", "status": "wishlist" }),
    )
    .await;
    create_book(
        &app.server,
        &admin,
        json!({ "title": "Beloved", "author": "Toni Morrison" }),
    )
    .await;

    bearer(app.server.post(&format!("/api/v1/books/{}/borrow", borrowed)), &admin)
        .await
        .assert_status_ok();
    app.clock.advance(20);

    let response = bearer(app.server.get("/api/v1/books/stats"), &admin).await;
    response.assert_status_ok();

    let stats: Value = response.json();
    assert_eq!(stats["totalBooks"], 5);
    assert_eq!(stats["available"], 1);
    assert_eq!(stats["borrowed"], 1);
    assert_eq!(stats["overdue"], 1);
    assert_eq!(stats["reading"], 1);
    assert_eq!(stats["completed"], 1);
    assert_eq!(stats["wishlist"], 1);

    let response = app.server.get("/api/v1/books/stats").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_update_reading_progress() {
    let app = create_test_app().await;
    let admin = admin_token(&app.server).await;
    let id = gatsby(&app.server, &admin).await;

    let response = bearer(app.server.put(&format!("/api/v1/books/{}", id)), &admin)
        .json(&json!({ "status": "reading", "progress": 25 }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "reading");
    assert_eq!(body["progress"], 25);

    let response = bearer(app.server.put(&format!("/api/v1/books/{}", id)), &admin)
        .json(&json!({ "progress": 80, "genre": "Classic" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["progress"], 80);
    assert_eq!(body["genre"], "Classic");
    assert_eq!(body["title"], "The Great Gatsby");

    let response = bearer(app.server.put(&format!("/api/v1/books/{}", id)), &admin)
        .json(&json!({ "status": "completed" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "completed");
    assert!(body.get("progress").is_none());
}

#[tokio::test]
async fn test_update_cannot_bypass_circulation() {
    let app = create_test_app().await;
    let admin = admin_token(&app.server).await;
    let id = gatsby(&app.server, &admin).await;

    let response = bearer(app.server.put(&format!("/api/v1/books/{}", id)), &admin)
        .json(&json!({ "status": "borrowed" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    bearer(app.server.post(&format!("/api/v1/books/{}/borrow", id)), &admin)
        .await
        .assert_status_ok();

    let response = bearer(app.server.put(&format!("/api/v1/books/{}", id)), &admin)
        .json(&json!({ "status": "available" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    // Metadata edits leave the loan untouched
    let response = bearer(app.server.put(&format!("/api/v1/books/{}", id)), &admin)
        .json(&json!({ "description": "Jazz age novel" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "borrowed");
    assert_eq!(body["dueDate"], "2024-06-15");
}

#[tokio::test]
async fn test_filter_books() {
    let app = create_test_app().await;
    let admin = admin_token(&app.server).await;
    gatsby(&app.server, &admin).await;
    create_book(
        &app.server,
        &admin,
        json!({ "title": "Dune", "author": "Frank Herbert", "status": "wishlist" }),
    )
    .await;

    let response = app
        .server
        .get("/api/v1/books")
        .add_query_param("status", "wishlist")
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["title"], "Dune");

    let response = app
        .server
        .get("/api/v1/books")
        .add_query_param("q", "fitzGERALD")
        .await;
    let body: Value = response.json();
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["title"], "The Great Gatsby");

    let response = app
        .server
        .get("/api/v1/books")
        .add_query_param("status", "lost")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_book() {
    let app = create_test_app().await;
    let admin = admin_token(&app.server).await;
    let id = gatsby(&app.server, &admin).await;

    let response = bearer(app.server.delete(&format!("/api/v1/books/{}", id)), &admin).await;
    response.assert_status(StatusCode::NO_CONTENT);

    let response = app.server.get(&format!("/api/v1/books/{}", id)).await;
    response.assert_status(StatusCode::NOT_FOUND);

    let response = bearer(app.server.delete(&format!("/api/v1/books/{}", id)), &admin).await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_register_login_and_me() {
    let app = create_test_app().await;
    let token = reader_token(&app.server).await;

    let response = bearer(app.server.get("/api/v1/auth/me"), &token).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["email"], "reader@bookshelf.test");
    assert_eq!(body["role"], "user");

    let response = app
        .server
        .post("/api/v1/auth/register")
        .json(&json!({
            "name": "Impostor",
            "email": "READER@bookshelf.test",
            "password": "whatever123"
        }))
        .await;
    response.assert_status(StatusCode::CONFLICT);

    let response = app
        .server
        .post("/api/v1/auth/login")
        .json(&json!({ "email": "reader@bookshelf.test", "password": "wrong-password" }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    login(&app.server, "reader@bookshelf.test", "reader-secret").await;
}

#[tokio::test]
async fn test_blank_isbn_clears_on_update() {
    let app = create_test_app().await;
    let admin = admin_token(&app.server).await;
    let id = gatsby(&app.server, &admin).await;

    let response = bearer(app.server.put(&format!("/api/v1/books/{}", id)), &admin)
        .json(&json!({ "isbn": "  " }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert!(body.get("isbn").map_or(true, Value::is_null));
    assert_eq!(body["title"], "The Great Gatsby");
}

#[tokio::test]
async fn test_update_and_delete_own_account() {
    let app = create_test_app().await;
    let token = reader_token(&app.server).await;

    let response = bearer(app.server.patch("/api/v1/auth/me"), &token)
        .json(&json!({ "name": "Avid Reader", "password": "better-secret" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["name"], "Avid Reader");
    assert_eq!(body["email"], "reader@bookshelf.test");

    let token = login(&app.server, "reader@bookshelf.test", "better-secret").await;

    let response = bearer(app.server.patch("/api/v1/auth/me"), &token)
        .json(&json!({ "email": ADMIN_EMAIL }))
        .await;
    response.assert_status(StatusCode::CONFLICT);

    let response = bearer(app.server.patch("/api/v1/auth/me"), &token)
        .json(&json!({ "role": "admin" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = bearer(app.server.delete("/api/v1/auth/me"), &token).await;
    response.assert_status(StatusCode::NO_CONTENT);

    let response = bearer(app.server.get("/api/v1/auth/me"), &token).await;
    response.assert_status(StatusCode::NOT_FOUND);

    let response = app
        .server
        .post("/api/v1/auth/login")
        .json(&json!({ "email": "reader@bookshelf.test", "password": "better-secret" }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_manages_roles() {
    let app = create_test_app().await;
    let admin = admin_token(&app.server).await;
    let reader = reader_token(&app.server).await;

    let response = bearer(app.server.get("/api/v1/auth/users"), &reader).await;
    response.assert_status(StatusCode::FORBIDDEN);

    let response = bearer(app.server.get("/api/v1/auth/users"), &admin).await;
    response.assert_status_ok();
    let users: Value = response.json();
    let users = users.as_array().unwrap();
    assert_eq!(users.len(), 2);
    let reader_id = users
        .iter()
        .find(|u| u["email"] == "reader@bookshelf.test")
        .and_then(|u| u["id"].as_i64())
        .unwrap();

    let response = bearer(
        app.server.put(&format!("/api/v1/auth/users/{}/role", reader_id)),
        &reader,
    )
    .json(&json!({ "role": "admin" }))
    .await;
    response.assert_status(StatusCode::FORBIDDEN);

    let response = bearer(
        app.server.put(&format!("/api/v1/auth/users/{}/role", reader_id)),
        &admin,
    )
    .json(&json!({ "role": "admin" }))
    .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["role"], "admin");

    // The new role is carried by the next token
    let promoted = login(&app.server, "reader@bookshelf.test", "reader-secret").await;
    let response = bearer(app.server.get("/api/v1/auth/users"), &promoted).await;
    response.assert_status_ok();

    let response = bearer(app.server.put("/api/v1/auth/users/999/role"), &admin)
        .json(&json!({ "role": "user" }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);

    let response = bearer(
        app.server.put(&format!("/api/v1/auth/users/{}/role", reader_id)),
        &admin,
    )
    .json(&json!({ "role": "owner" }))
    .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_openapi_document_served() {
    let app = create_test_app().await;

    let response = app.server.get("/api-docs/openapi.json").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["info"]["title"], "Bookshelf API");
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL pointing at an empty PostgreSQL database
async fn test_postgres_borrow_cycle() {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("Failed to connect to database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    sqlx::query("TRUNCATE books, users RESTART IDENTITY")
        .execute(&pool)
        .await
        .expect("Failed to reset tables");

    let app = create_test_app_with(Repository::postgres(pool)).await;
    let admin = admin_token(&app.server).await;
    let id = gatsby(&app.server, &admin).await;

    let response = bearer(app.server.post(&format!("/api/v1/books/{}/borrow", id)), &admin).await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["dueDate"], "2024-06-15");

    let response = bearer(app.server.post(&format!("/api/v1/books/{}/borrow", id)), &admin).await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = bearer(app.server.post(&format!("/api/v1/books/{}/return", id)), &admin).await;
    response.assert_status_ok();

    let response = app.server.get("/api/v1/ready").await;
    response.assert_status_ok();
}
