mod common;

use actix_web::{http::StatusCode, test, App};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use common::{test_state, MemoryStore, PASSWORD};

#[test_log::test(actix_rt::test)]
async fn test_register_and_login_flow() {
    let store = MemoryStore::new();
    let state = test_state(&store);
    let app = test::init_service(App::new().configure(|cfg| state.configure(cfg))).await;

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "username": "ana",
            "email": "Ana@Example.com",
            "password": PASSWORD
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["user"]["username"], "ana");
    assert_eq!(body["user"]["email"], "ana@example.com");
    assert!(body["user"]["id"].is_string());
    assert!(body["user"]["created_at"].is_string());
    assert!(body.get("token").is_none());
    assert!(body["user"].get("password_hash").is_none());

    let stored = store.stored_user("ana@example.com").expect("stored user");
    assert!(stored.password_hash.starts_with("$2b$04$"));
    assert_ne!(stored.password_hash, PASSWORD);

    // Same address, different case.
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "username": "ana2",
            "email": "ANA@EXAMPLE.COM",
            "password": PASSWORD
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["kind"], "conflict");
    assert_eq!(body["message"], "This email is already registered.");
    assert_eq!(store.user_count(), 1);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "  ANA@example.com ", "password": PASSWORD }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    let token = body["token"].as_str().expect("token");
    assert_eq!(token.split('.').count(), 3);
    assert_eq!(body["user"]["email"], "ana@example.com");
    assert_eq!(body["user"]["id"], json!(stored.id));
    assert!(body["user"].get("password_hash").is_none());
}

#[actix_rt::test]
async fn test_wrong_password_and_unknown_email_are_indistinguishable() {
    let store = MemoryStore::new();
    let state = test_state(&store);
    let app = test::init_service(App::new().configure(|cfg| state.configure(cfg))).await;
    common::register(&app, "ana", "ana@example.com").await;

    let mut bodies = Vec::new();
    for (email, password) in [
        ("ana@example.com", "WrongPassword1"),
        ("nobody@example.com", PASSWORD),
    ] {
        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "email": email, "password": password }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(resp).await;
        bodies.push(body);
    }

    assert_eq!(bodies[0], bodies[1]);
    assert_eq!(bodies[0]["kind"], "unauthorized");
    assert_eq!(bodies[0]["message"], "Invalid email or password.");
}

#[actix_rt::test]
async fn test_register_validation_lists_every_field() {
    let store = MemoryStore::new();
    let state = test_state(&store);
    let app = test::init_service(App::new().configure(|cfg| state.configure(cfg))).await;

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "username": "ab",
            "email": "not-an-email",
            "password": "short"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["kind"], "validation_error");
    assert_eq!(body["message"], "Validation failed.");

    let paths: Vec<&str> = body["issues"]
        .as_array()
        .expect("issues")
        .iter()
        .filter_map(|issue| issue["path"].as_str())
        .collect();
    assert_eq!(paths, vec!["email", "password", "username"]);
    assert_eq!(store.user_count(), 0);
}

#[actix_rt::test]
async fn test_register_missing_field_is_named() {
    let store = MemoryStore::new();
    let state = test_state(&store);
    let app = test::init_service(App::new().configure(|cfg| state.configure(cfg))).await;

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({ "email": " Bea@Example.com", "password": PASSWORD }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["issues"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["issues"][0]["path"], "username");

    // Surrounding whitespace in the email is not a validation failure.
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({ "username": "bea", "email": " Bea@Example.com", "password": PASSWORD }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["user"]["email"], "bea@example.com");
}

#[actix_rt::test]
async fn test_register_rejects_password_over_72_bytes() {
    let store = MemoryStore::new();
    let state = test_state(&store);
    let app = test::init_service(App::new().configure(|cfg| state.configure(cfg))).await;

    // 40 two-byte characters: within the character limit, over the byte limit.
    let password = "é".repeat(40);
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "username": "ana",
            "email": "ana@example.com",
            "password": password
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["issues"][0]["path"], "password");
    assert_eq!(store.user_count(), 0);
}

#[actix_rt::test]
async fn test_malformed_body_is_a_validation_error() {
    let store = MemoryStore::new();
    let state = test_state(&store);
    let app = test::init_service(App::new().configure(|cfg| state.configure(cfg))).await;

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .insert_header(("content-type", "application/json"))
        .set_payload("{\"email\": ")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["kind"], "validation_error");
    assert_eq!(body["issues"][0]["path"], "body");
    assert_eq!(body["issues"][0]["message"], "Request body is not valid JSON.");

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "ana@example.com", "password": "" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["issues"][0]["path"], "password");
}

#[actix_rt::test]
async fn test_concurrent_duplicate_registration_admits_one() {
    let store = MemoryStore::new();
    let state = test_state(&store);
    let app = test::init_service(App::new().configure(|cfg| state.configure(cfg))).await;

    let request = |username: &str| {
        test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({
                "username": username,
                "email": "race@example.com",
                "password": PASSWORD
            }))
            .to_request()
    };

    let (first, second) = futures::join!(
        test::call_service(&app, request("first")),
        test::call_service(&app, request("second")),
    );

    let mut statuses = vec![first.status(), second.status()];
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::CREATED, StatusCode::CONFLICT]);
    assert_eq!(store.user_count(), 1);
}

#[actix_rt::test]
async fn test_store_outage_is_reported_without_detail() {
    let store = MemoryStore::new();
    let state = test_state(&store);
    let app = test::init_service(App::new().configure(|cfg| state.configure(cfg))).await;
    store.set_unavailable(true);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "ana@example.com", "password": PASSWORD }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["kind"], "unavailable");
    assert_eq!(body["message"], "Service temporarily unavailable.");
}

#[actix_rt::test]
async fn test_health_reports_store_state() {
    let store = MemoryStore::new();
    let state = test_state(&store);
    let app = test::init_service(App::new().configure(|cfg| state.configure(cfg))).await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "ok");

    store.set_unavailable(true);
    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["database"], "unreachable");
}
