use super::*;
use crate::auth::TokenIssuer;
use crate::config::{ColumnKind, EntityDef, ENTITIES, PRODUCT_INSPECTIONS, PRODUCT_INSPECTION_PLANS};
use crate::store::memory::MemoryStore;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use serde_json::{json, Value};
use tower::ServiceExt;

fn router_with(store: Arc<MemoryStore>) -> Router {
    let state = AppState::new(store, TokenIssuer::new("test-secret", 60), 8);
    app(state, CorsPolicy::new(vec!["http://localhost:4200".into()]))
}

fn router() -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    (router_with(store.clone()), store)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method(Method::GET)
        .body(Body::empty())
        .unwrap_or_else(|err| panic!("failed to build request: {err}"))
}

fn post(uri: &str, body: Value) -> Request<Body> {
    post_raw(uri, body.to_string())
}

fn post_raw(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method(Method::POST)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap_or_else(|err| panic!("failed to build request: {err}"))
}

async fn send(router: &Router, req: Request<Body>) -> Response {
    match router.clone().oneshot(req).await {
        Ok(response) => response,
        Err(err) => panic!("router request failed: {err}"),
    }
}

async fn response_json(response: Response) -> Value {
    let bytes = match to_bytes(response.into_body(), 1024 * 1024).await {
        Ok(bytes) => bytes,
        Err(err) => panic!("failed to read response body: {err}"),
    };
    match serde_json::from_slice(&bytes) {
        Ok(value) => value,
        Err(err) => panic!("response body is not JSON: {err}"),
    }
}

async fn call(router: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = send(router, req).await;
    let status = response.status();
    (status, response_json(response).await)
}

fn inspection(item_id: &str) -> Value {
    json!({
        "itemId": item_id,
        "itemDescription": "Bottle cap 28mm",
        "inspectionDate": "2024-05-01",
        "sampleQty": "12.5",
        "preProduction": "true",
        "details": [{"parameterName": "Weight", "result": "OK"}]
    })
}

/// Smallest body a kind accepts: its required text fields and one detail line.
fn minimal_body(entity: &EntityDef) -> Value {
    let mut body = serde_json::Map::new();
    for column in entity.columns.iter().filter(|c| c.required) {
        let value = match column.kind {
            ColumnKind::Details => json!([{"parameterName": "Weight", "result": "OK"}]),
            _ => json!(format!("{}-1", column.name)),
        };
        body.insert(column.api_name(), value);
    }
    Value::Object(body)
}

#[tokio::test]
async fn every_kind_lists_its_newest_record_first() {
    let (router, store) = router();
    for entity in ENTITIES {
        let uri = format!("/api/{}", entity.path_segment);
        let body = minimal_body(entity);
        let (status, first) = call(&router, post(&uri, body.clone())).await;
        assert_eq!(status, StatusCode::CREATED, "{}", entity.name);
        let (status, created) = call(&router, post(&uri, body.clone())).await;
        assert_eq!(status, StatusCode::CREATED, "{}", entity.name);
        assert_ne!(first["id"], created["id"], "{}", entity.name);
        for (key, value) in body.as_object().into_iter().flatten() {
            assert_eq!(&created[key.as_str()], value, "{}.{}", entity.name, key);
        }

        let (status, listed) = call(&router, get(&uri)).await;
        assert_eq!(status, StatusCode::OK, "{}", entity.name);
        assert_eq!(listed, json!([created, first]), "{}", entity.name);
        assert_eq!(store.row_count(entity), 2);
    }
}

#[tokio::test]
async fn created_inspection_comes_back_first_in_list() {
    let (router, _) = router();
    let (status, _) = call(&router, post("/api/product-inspections", inspection("I-1"))).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, created) = call(&router, post("/api/product-inspections", inspection("I-2"))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["itemId"], json!("I-2"));
    assert_eq!(created["sampleQty"], json!(12.5));
    assert_eq!(created["preProduction"], json!(true));
    assert_eq!(created["producedQty"], json!(0));
    assert_eq!(created["inspectionDate"], json!("2024-05-01T00:00:00.000Z"));
    assert_eq!(created["details"], json!([{"parameterName": "Weight", "result": "OK"}]));
    assert_eq!(created["remarks"], Value::Null);
    assert!(created["id"].is_i64());

    let (status, listed) = call(&router, get("/api/product-inspections")).await;
    assert_eq!(status, StatusCode::OK);
    let listed = listed.as_array().cloned().unwrap_or_default();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0], created);
}

#[tokio::test]
async fn empty_table_lists_as_empty_array() {
    let (router, _) = router();
    let (status, body) = call(&router, get("/api/incoming-material-inspection-plans")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn missing_required_field_is_rejected_without_writing() {
    let (router, store) = router();
    let mut body = inspection("I-1");
    body["itemDescription"] = json!("  ");
    let (status, resp) = call(&router, post("/api/product-inspections", body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp, json!({"message": PRODUCT_INSPECTIONS.required_message}));
    assert_eq!(store.row_count(&PRODUCT_INSPECTIONS), 0);
}

#[tokio::test]
async fn empty_details_are_rejected() {
    let (router, store) = router();
    let body = json!({"itemId": "I-1", "itemDescription": "Cap", "details": []});
    let (status, resp) = call(&router, post("/api/product-inspection-plans", body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["message"], json!("Item information and at least one plan row are required."));
    assert_eq!(store.row_count(&PRODUCT_INSPECTION_PLANS), 0);
}

#[tokio::test]
async fn incoming_inspection_flags_use_the_allow_list() {
    let (router, _) = router();
    let body = json!({
        "supplierVendor": "Acme Resins",
        "reworkLocation": "1",
        "inspectionRequired": "yes",
        "testCertificate": 1,
        "corrActionRequired": "false",
        "details": [{"itemId": "R-1", "inspectionQty": 10}]
    });
    let (status, created) = call(&router, post("/api/incoming-material-inspections", body)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["reworkLocation"], json!(true));
    assert_eq!(created["inspectionRequired"], json!(false));
    assert_eq!(created["testCertificate"], json!(true));
    assert_eq!(created["corrActionRequired"], json!(false));
    assert_eq!(created["grnType"], Value::Null);
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let (router, _) = router();
    let (status, body) = call(&router, post_raw("/api/parameters", "{\"parameterType\":".into())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"message": "Request body must be valid JSON."}));
}

#[tokio::test]
async fn unknown_paths_and_methods_are_not_found() {
    let (router, _) = router();
    for req in [
        get("/api/users"),
        get("/api"),
        get("/nothing/here"),
        get("/api/auth/login"),
        post("/api/health", json!({})),
    ] {
        let (status, body) = call(&router, req).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"message": "Endpoint not found."}));
    }
}

#[tokio::test]
async fn concurrent_creates_each_get_their_own_row() {
    let (router, store) = router();
    let mut tasks = Vec::new();
    for i in 0..16 {
        let router = router.clone();
        tasks.push(tokio::spawn(async move {
            let code = format!("P-{i:02}");
            let body = json!({
                "parameterType": "Dimensional",
                "parameterName": "Neck height",
                "processProduct": "Preform",
                "specCharacteristic": "21.5 +/- 0.1",
                "parameterCode": code
            });
            let (status, created) = call(&router, post("/api/parameters", body)).await;
            (code, status, created)
        }));
    }
    for task in tasks {
        let (code, status, created) = task.await.unwrap_or_else(|err| panic!("task failed: {err}"));
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["parameterCode"], json!(code));
    }
    assert_eq!(store.row_count(&crate::config::PARAMETER_MASTER), 16);
}

#[tokio::test]
async fn register_login_and_duplicate_flow() {
    let (router, store) = router();
    let body = json!({"name": "Grace", "email": "Grace@Example.com", "password": "hopper123"});
    let (status, resp) = call(&router, post("/api/auth/register", body)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(resp, json!({"message": "Account created successfully."}));

    let dup = json!({"name": "G", "email": "grace@example.COM", "password": "different1"});
    let (status, resp) = call(&router, post("/api/auth/register", dup)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(resp["message"], json!("An account with this email already exists."));
    assert_eq!(store.user_count(), 1);

    let (status, resp) = call(
        &router,
        post("/api/auth/login", json!({"email": "GRACE@example.com", "password": "hopper123"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["message"], json!("Login successful."));
    assert_eq!(resp["profile"], json!({"name": "Grace", "email": "grace@example.com"}));
    let token = resp["token"].as_str().unwrap_or_default();
    let claims = TokenIssuer::new("test-secret", 60).verify(token);
    assert!(claims.is_ok());
}

#[tokio::test]
async fn login_failures_look_the_same() {
    let (router, _) = router();
    let body = json!({"name": "Grace", "email": "grace@example.com", "password": "hopper123"});
    call(&router, post("/api/auth/register", body)).await;

    let wrong = call(&router, post("/api/auth/login", json!({"email": "grace@example.com", "password": "nope12345"}))).await;
    let unknown = call(&router, post("/api/auth/login", json!({"email": "ghost@example.com", "password": "hopper123"}))).await;
    assert_eq!(wrong.0, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong, unknown);
    assert_eq!(wrong.1, json!({"message": "Invalid credentials. Please try again."}));

    let (status, body) = call(&router, post("/api/auth/login", json!({"email": "grace@example.com"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], json!("Email and password are required."));
}

#[tokio::test]
async fn forgot_password_does_not_reveal_accounts() {
    let (router, _) = router();
    call(
        &router,
        post("/api/auth/register", json!({"name": "Grace", "email": "grace@example.com", "password": "hopper123"})),
    )
    .await;
    let known = call(&router, post("/api/auth/forgot-password", json!({"email": "grace@example.com"}))).await;
    let unknown = call(&router, post("/api/auth/forgot-password", json!({"email": "ghost@example.com"}))).await;
    assert_eq!(known.0, StatusCode::OK);
    assert_eq!(known, unknown);
    assert_eq!(
        known.1["message"],
        json!("If an account exists, password reset instructions were sent.")
    );
}

#[tokio::test]
async fn health_reports_database_state() {
    let (router, _) = router();
    let (status, body) = call(&router, get("/api/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok", "message": "Database connection successful."}));

    let down = router_with(Arc::new(MemoryStore::failing()));
    let (status, body) = call(&down, get("/api/health")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"status": "error", "message": "Database connection failed."}));
}

#[tokio::test]
async fn storage_failure_is_a_generic_500() {
    let down = router_with(Arc::new(MemoryStore::failing()));
    let (status, body) = call(&down, get("/api/parameters")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"message": "Internal server error."}));
}

#[tokio::test]
async fn foreign_origin_is_forbidden() {
    let (router, store) = router();
    let req = Request::builder()
        .uri("/api/parameters")
        .method(Method::GET)
        .header(header::ORIGIN, "https://evil.example.com")
        .body(Body::empty())
        .unwrap_or_else(|err| panic!("failed to build request: {err}"));
    let (status, body) = call(&router, req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({"message": "Not allowed by CORS"}));
    assert_eq!(store.row_count(&crate::config::PARAMETER_MASTER), 0);
}

#[tokio::test]
async fn allowed_origin_gets_cors_headers() {
    let (router, _) = router();
    let req = Request::builder()
        .uri("/api/parameters")
        .method(Method::GET)
        .header(header::ORIGIN, "http://localhost:4200")
        .body(Body::empty())
        .unwrap_or_else(|err| panic!("failed to build request: {err}"));
    let response = send(&router, req).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).and_then(|v| v.to_str().ok()),
        Some("http://localhost:4200")
    );
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).and_then(|v| v.to_str().ok()),
        Some("true")
    );

    let preflight = Request::builder()
        .uri("/api/product-inspections")
        .method(Method::OPTIONS)
        .header(header::ORIGIN, "https://port4200-workspaces-ws-1.eu10.applicationstudio.cloud.sap")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap_or_else(|err| panic!("failed to build request: {err}"));
    let response = send(&router, preflight).await;
    assert!(response.status().is_success());
    assert!(response.headers().contains_key(header::ACCESS_CONTROL_ALLOW_METHODS));
}

#[tokio::test]
async fn oversized_body_gets_a_json_413() {
    let (router, store) = router();
    let mut body = inspection("I-1");
    body["remarks"] = json!("x".repeat(MAX_BODY_BYTES));
    let (status, body) = call(&router, post("/api/product-inspections", body)).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body, json!({"message": "Request body is too large."}));
    assert_eq!(store.row_count(&PRODUCT_INSPECTIONS), 0);
}

#[tokio::test]
async fn trailing_slash_serves_the_same_routes() {
    let (router, _) = router();
    let (status, created) = call(&router, post("/api/product-inspections/", inspection("I-1"))).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, listed) = call(&router, get("/api/product-inspections/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed, json!([created]));

    let (status, _) = call(&router, get("/api/health/")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(&router, post("/api/auth/forgot-password/", json!({"email": "a@b.io"}))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(&router, get("/api/unknown-kind/")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn values_beyond_column_limits_are_client_errors() {
    let (router, store) = router();
    let mut body = inspection("I-1");
    body["sampleQty"] = json!(1e15);
    let (status, reply) = call(&router, post("/api/product-inspections", body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(reply, json!({"message": "sampleQty is out of range."}));

    let (status, reply) = call(&router, post("/api/product-inspections", inspection("I\u{0}3"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(reply, json!({"message": "itemId must not contain NUL characters."}));
    assert_eq!(store.row_count(&PRODUCT_INSPECTIONS), 0);

    let name = "n".repeat(200);
    let (status, reply) = call(
        &router,
        post("/api/auth/register", json!({"name": name, "email": "a@b.io", "password": "secret123"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(reply, json!({"message": "name must be at most 150 characters."}));
    assert_eq!(store.user_count(), 0);
}
