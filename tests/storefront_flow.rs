use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use axum_storefront::{
    config::AuthSettings,
    repository::MemoryStore,
    routes::create_router,
    seed::seed_catalog,
    state::AppState,
};
use serde_json::{Value, json};
use tower::ServiceExt;

async fn app() -> Router {
    let store = Arc::new(MemoryStore::new());
    seed_catalog(store.as_ref()).await.expect("seed");
    create_router().with_state(AppState::new(store, AuthSettings::new("flow-secret", 1)))
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, token);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request");

    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn login(app: &Router, username: &str) -> String {
    let email = format!("{username}@example.com");
    let (status, _) = call(
        app,
        Method::POST,
        "/register",
        None,
        Some(json!({
            "username": username,
            "email": email,
            "password": "secret1",
            "confirm_password": "secret1",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = call(
        app,
        Method::POST,
        "/login",
        None,
        Some(json!({ "email": email, "password": "secret1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["data"]["token"].as_str().expect("token").to_string()
}

async fn product_id(app: &Router, name: &str) -> String {
    let (_, body) = call(app, Method::GET, &format!("/search?q={name}"), None, None).await;
    body["data"]["items"][0]["id"]
        .as_str()
        .expect("product id")
        .to_string()
}

fn checkout_form() -> Value {
    json!({
        "first_name": "Ada",
        "last_name": "Lovelace",
        "email": "ada@example.com",
        "phone": "5551234567",
        "address": "12 Analytical Way",
        "city": "Springfield",
        "state": "IL",
        "zip_code": "62701",
        "country": "US",
        "card_number": "4111111111111111",
        "expiry_month": "05",
        "expiry_year": 2030,
        "cvv": "123"
    })
}

#[tokio::test]
async fn catalog_is_public() {
    let app = app().await;

    let (status, body) = call(&app, Method::GET, "/products?category=Accessories", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["meta"]["per_page"], 12);
    assert_eq!(body["data"]["categories"].as_array().map(Vec::len), Some(7));

    let id = product_id(&app, "Keyboard").await;
    let (status, body) = call(&app, Method::GET, &format!("/product/{id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["product"]["price"], "149.99");
    assert_eq!(body["data"]["related"][0]["name"], "AirPods Pro 2");

    let (_, body) = call(&app, Method::GET, "/search?q=", None, None).await;
    assert_eq!(body["data"]["items"], json!([]));
}

#[tokio::test]
async fn protected_pages_require_a_token() {
    let app = app().await;
    let (status, body) = call(&app, Method::GET, "/cart", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Please log in to access this page.");

    let (status, _) = call(&app, Method::GET, "/dashboard", Some("Bearer nonsense"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn invalid_registration_lists_field_errors() {
    let app = app().await;
    let (status, body) = call(
        &app,
        Method::POST,
        "/register",
        None,
        Some(json!({
            "username": "ab",
            "email": "nope",
            "password": "123",
            "confirm_password": "456",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["data"]["fields"]["confirm_password"].is_array());
}

#[tokio::test]
async fn cart_actions_report_success_flags() {
    let app = app().await;
    let token = login(&app, "shopper").await;
    let token = Some(token.as_str());
    let id = product_id(&app, "Studio").await;

    let (status, body) = call(&app, Method::GET, &format!("/add_to_cart/{id}"), token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Studio Display has been added to your cart!");

    let (status, body) = call(
        &app,
        Method::POST,
        "/cart/update",
        token,
        Some(json!({ "item_id": id, "action": "sideways" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": false, "message": "Invalid action" }));

    let (_, body) = call(
        &app,
        Method::POST,
        "/cart/promo",
        token,
        Some(json!({ "promo_code": "nope" })),
    )
    .await;
    assert_eq!(body, json!({ "success": false, "message": "Invalid promo code" }));

    let (_, body) = call(
        &app,
        Method::POST,
        "/cart/promo",
        token,
        Some(json!({ "promo_code": "welcome20" })),
    )
    .await;
    assert_eq!(
        body,
        json!({ "success": true, "message": "Promo code applied! 20% discount" })
    );

    let (_, body) = call(
        &app,
        Method::POST,
        "/cart/update",
        token,
        Some(json!({ "item_id": id, "action": "decrease" })),
    )
    .await;
    assert_eq!(body["success"], true);

    let (_, body) = call(
        &app,
        Method::POST,
        "/cart/remove",
        token,
        Some(json!({ "item_id": id })),
    )
    .await;
    assert_eq!(body, json!({ "success": false, "message": "Item not found" }));

    let (status, body) = call(&app, Method::GET, "/checkout", token, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Your cart is empty!");
}

#[tokio::test]
async fn checkout_places_an_order() {
    let app = app().await;
    let token = login(&app, "buyer").await;
    let token = Some(token.as_str());
    let id = product_id(&app, "AirPods").await;

    call(&app, Method::GET, &format!("/add_to_cart/{id}"), token, None).await;
    call(
        &app,
        Method::POST,
        "/cart/update",
        token,
        Some(json!({ "item_id": id, "action": "increase" })),
    )
    .await;
    call(
        &app,
        Method::POST,
        "/cart/promo",
        token,
        Some(json!({ "promo_code": "SAVE10" })),
    )
    .await;

    let (status, body) = call(&app, Method::GET, "/checkout", token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["subtotal"], "499.98");
    assert_eq!(body["data"]["shipping"], "0.00");
    assert_eq!(body["data"]["tax"], "40.00");
    assert_eq!(body["data"]["discount"], "50.00");
    assert_eq!(body["data"]["total"], "489.98");
    assert_eq!(body["data"]["promo_code"], "SAVE10");

    let mut bad_form = checkout_form();
    bad_form["country"] = json!("FR");
    let (status, _) = call(&app, Method::POST, "/checkout", token, Some(bad_form)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = call(&app, Method::POST, "/checkout", token, Some(checkout_form())).await;
    assert_eq!(status, StatusCode::CREATED);
    let order_id = body["data"]["order"]["id"].as_str().expect("order id").to_string();
    assert_eq!(body["data"]["order"]["total"], "489.98");
    assert_eq!(body["data"]["order"]["status"], "pending");

    let (_, body) = call(&app, Method::GET, "/cart", token, None).await;
    assert_eq!(body["data"]["item_count"], 0);
    assert_eq!(body["data"]["promo"], Value::Null);

    let (_, body) = call(&app, Method::GET, &format!("/product/{id}"), None, None).await;
    assert_eq!(body["data"]["product"]["stock"], 48);

    let (_, body) = call(&app, Method::GET, "/orders", token, None).await;
    assert_eq!(body["data"][0]["id"], order_id.as_str());
    assert_eq!(body["meta"]["total"], 1);

    let (_, body) = call(&app, Method::GET, "/dashboard", token, None).await;
    assert_eq!(body["data"]["total_spent"], "489.98");

    let other = login(&app, "stranger").await;
    let (status, _) = call(
        &app,
        Method::GET,
        &format!("/orders/{order_id}"),
        Some(other.as_str()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn wishlist_round_trip() {
    let app = app().await;
    let token = login(&app, "dreamer").await;
    let token = Some(token.as_str());
    let id = product_id(&app, "Watch").await;

    let (_, body) = call(&app, Method::POST, "/wishlist/add", token, Some(json!({ "item_id": id }))).await;
    assert_eq!(body, json!({ "success": true, "message": "Added to wishlist!" }));
    let (_, body) = call(&app, Method::POST, "/wishlist/add", token, Some(json!({ "item_id": id }))).await;
    assert_eq!(body["success"], false);

    let (_, body) = call(&app, Method::GET, "/wishlist", token, None).await;
    assert_eq!(body["data"][0]["name"], "Apple Watch Series 9");

    let (_, body) = call(&app, Method::POST, "/wishlist/remove", token, Some(json!({ "item_id": id }))).await;
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let app = app().await;
    let (status, body) = call(&app, Method::GET, "/nowhere", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["data"]["path"], "/nowhere");
}

#[tokio::test]
async fn huge_page_numbers_return_empty_pages() {
    let app = app().await;
    let token = login(&app, "pager").await;

    let (status, body) = call(&app, Method::GET, "/products?page=9223372036854775807", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"], json!([]));

    let (status, body) = call(
        &app,
        Method::GET,
        "/orders?page=9223372036854775807",
        Some(token.as_str()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn malformed_action_bodies_answer_with_success_flags() {
    let app = app().await;
    let token = login(&app, "sloppy").await;
    let token = Some(token.as_str());

    let cases = [
        ("/cart/update", json!({ "item_id": 5, "action": "increase" })),
        ("/cart/remove", json!({})),
        ("/wishlist/add", json!({ "item_id": "not-a-uuid" })),
        ("/wishlist/remove", json!({})),
    ];
    for (uri, body) in cases {
        let (status, reply) = call(&app, Method::POST, uri, token, Some(body)).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(reply, json!({ "success": false, "message": "Item not found" }), "{uri}");
    }

    let (status, reply) = call(
        &app,
        Method::POST,
        "/cart/promo",
        token,
        Some(json!({ "promo_code": 10 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply, json!({ "success": false, "message": "Invalid promo code" }));
}
