use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use http_body_util::BodyExt;
use sea_orm::Database;
use serde_json::{Value, json};
use tower::ServiceExt;

use engine::{AccountRole, Engine, EngineConfig};
use migration::MigratorTrait;
use server::{ServerState, router};

const EMAIL: &str = "alice@example.com";
const PASSWORD: &str = "password";

async fn app() -> Router {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db)
        .config(EngineConfig {
            bcrypt_cost: 4,
            ..Default::default()
        })
        .build()
        .await
        .unwrap();
    engine
        .insert_account(EMAIL, PASSWORD, AccountRole::User)
        .await
        .unwrap();

    router(
        ServerState {
            engine: Arc::new(engine),
        },
        "/api",
    )
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    token: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Basic {}", STANDARD.encode(token)));
    }
    let body = match body {
        Some(v) => {
            builder = builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&v).unwrap())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

async fn login(app: &Router) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/login",
        Some(json!({ "email": EMAIL, "password": PASSWORD })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn login_rejects_bad_credentials() {
    let app = app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/login",
        Some(json!({ "email": EMAIL, "password": "wrong" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid email or password");
}

#[tokio::test]
async fn protected_routes_need_a_valid_token() {
    let app = app().await;

    let (status, _) = send(&app, "GET", "/api/purchases", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", "/api/purchases", None, Some("not-a-session")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = login(&app).await;
    let (status, body) = send(&app, "GET", "/api/purchases", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "purchases": [] }));
}

#[tokio::test]
async fn purchase_delete_and_restore_round_trip() {
    let app = app().await;
    let token = login(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/tags",
        Some(json!({ "names": ["Groceries", "Rent"] })),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let groceries = body["ids"][0].as_i64().unwrap();

    let (status, body) = send(
        &app,
        "POST",
        "/api/products",
        Some(json!({ "name": "Milk" })),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let milk = body["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        "POST",
        "/api/purchases",
        Some(json!({
            "product_id": milk,
            "date": "2021-01-03",
            "quantity": "2",
            "price": "3",
            "tag_ids": [groceries],
        })),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let purchase_id = body["id"].as_i64().unwrap();

    let (status, body) = send(&app, "GET", "/api/purchases", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["purchases"][0]["total_price"], "6");
    assert_eq!(body["purchases"][0]["tags"][0]["name"], "Groceries");

    let uri = format!("/api/purchases/{purchase_id}");
    let (status, _) = send(&app, "DELETE", &uri, None, Some(&token)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(&app, "GET", "/api/products", None, Some(&token)).await;
    assert_eq!(body, json!({ "products": [] }));
    let (_, body) = send(&app, "GET", "/api/tags", None, Some(&token)).await;
    assert_eq!(body["tags"].as_array().unwrap().len(), 1);
    assert_eq!(body["tags"][0]["name"], "Rent");

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/purchases/{purchase_id}/restore"),
        None,
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["product"]["name"], "Milk");
    assert_eq!(body["date"], "2021-01-03");
    assert_eq!(body["tags"], json!([{ "id": groceries, "name": "Groceries" }]));
}

#[tokio::test]
async fn invalid_input_maps_to_client_errors() {
    let app = app().await;
    let token = login(&app).await;

    let (_, body) = send(
        &app,
        "POST",
        "/api/products",
        Some(json!({ "name": "Milk" })),
        Some(&token),
    )
    .await;
    let milk = body["id"].as_i64().unwrap();

    let purchase = |quantity: &str| {
        json!({
            "product_id": milk,
            "date": "2021-01-03",
            "quantity": quantity,
            "price": "1.5",
        })
    };

    let (status, _) = send(&app, "POST", "/api/purchases", Some(purchase("two")), Some(&token)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(&app, "POST", "/api/purchases", Some(purchase("0")), Some(&token)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        "PATCH",
        "/api/purchases/4242",
        Some(json!({ "price": "2" })),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "POST",
        "/api/products",
        Some(json!({ "name": "   " })),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn logout_invalidates_the_token() {
    let app = app().await;
    let token = login(&app).await;

    let (status, _) = send(&app, "POST", "/api/logout", None, Some(&token)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", "/api/purchases", None, Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn password_change_keeps_the_session() {
    let app = app().await;
    let token = login(&app).await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/account/password",
        Some(json!({ "old_password": "wrong", "new_password": "next" })),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        "POST",
        "/api/account/password",
        Some(json!({ "old_password": PASSWORD, "new_password": "next" })),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", "/api/tags", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
}
