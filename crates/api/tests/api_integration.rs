//! Integration tests for the API server.

use std::sync::OnceLock;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use store::InMemoryStore;
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup() -> axum::Router {
    let state = api::create_state(InMemoryStore::new());
    api::create_app(state, get_metrics_handle())
}

async fn send(app: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> Response {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn book_json(title: &str, isbn: &str, price: f64, stock: i32) -> Value {
    json!({
        "title": title,
        "author": "Octavia E. Butler",
        "isbn": isbn,
        "category": "Science Fiction",
        "price": price,
        "stockQuantity": stock,
        "description": "A novel"
    })
}

fn customer_json(email: &str) -> Value {
    json!({
        "firstName": "Lauren",
        "lastName": "Olamina",
        "email": email,
        "phoneNumber": "(555) 123-4567",
        "address": "Robledo, CA"
    })
}

async fn create(app: &axum::Router, uri: &str, body: Value) -> Value {
    let response = send(app, "POST", uri, Some(body)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    json_body(response).await
}

#[tokio::test]
async fn test_health_check() {
    let app = setup();

    let response = send(&app, "GET", "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "ok");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup();
    create(
        &app,
        "/api/books",
        book_json("Kindred", "978-0807083697", 15.0, 3),
    )
    .await;

    let response = send(&app, "GET", "/metrics", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("books_created_total"));
}

#[tokio::test]
async fn test_book_crud() {
    let app = setup();

    let created = create(
        &app,
        "/api/books",
        book_json("Parable of the Sower", "978-1538732182", 17.99, 8),
    )
    .await;
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["price"], 17.99);
    assert_eq!(created["stockQuantity"], 8);

    let response = send(&app, "GET", &format!("/api/books/{id}"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, created);

    let response = send(&app, "GET", "/api/books/isbn/978-1538732182", None).await;
    assert_eq!(json_body(response).await["id"], id.as_str());

    let mut changes = book_json("Parable of the Talents", "978-1538732182", 18.5, 4);
    changes["category"] = json!("Dystopia");
    let response = send(&app, "PUT", &format!("/api/books/{id}"), Some(changes)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = json_body(response).await;
    assert_eq!(updated["title"], "Parable of the Talents");
    assert_eq!(updated["category"], "Dystopia");
    assert_eq!(updated["price"], 18.5);

    let response = send(&app, "DELETE", &format!("/api/books/{id}"), None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(&app, "GET", &format!("/api/books/{id}"), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_not_found_error_body() {
    let app = setup();
    let id = "7b0e5b63-3f4c-4c4e-9a53-0d6f2b7f8c11";

    let response = send(&app, "GET", &format!("/api/books/{id}"), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = json_body(response).await;
    assert_eq!(body["status"], 404);
    assert_eq!(body["error"], "Not Found");
    assert_eq!(body["message"], format!("Book not found with id: {id}"));
    assert_eq!(body["path"], format!("/api/books/{id}"));
    assert!(body["timestamp"].as_str().is_some());
    assert!(body.get("details").is_none());
}

#[tokio::test]
async fn test_validation_error_lists_fields() {
    let app = setup();

    let response = send(
        &app,
        "POST",
        "/api/books",
        Some(json!({"title": "", "isbn": "x", "price": -1})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert_eq!(body["message"], "Validation failed");
    assert_eq!(body["path"], "/api/books");
    let details: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d.as_str().unwrap())
        .collect();
    assert!(details.contains(&"title: Title is required"));
    assert!(details.contains(&"isbn: Invalid ISBN format"));
    assert!(details.contains(&"price: Price must be greater than 0"));
}

#[tokio::test]
async fn test_malformed_input_is_bad_request() {
    let app = setup();

    let request = Request::builder()
        .method("POST")
        .uri("/api/books")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["path"], "/api/books");

    let response = send(&app, "GET", "/api/books/not-a-uuid", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(&app, "GET", "/api/books/price-range?minPrice=abc&maxPrice=1", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_book_searches() {
    let app = setup();
    create(&app, "/api/books", book_json("Kindred", "978-0807083697", 15.0, 3)).await;
    create(&app, "/api/books", book_json("Dawn", "978-0446603775", 9.5, 0)).await;
    create(&app, "/api/books", book_json("Fledgling", "978-0446696166", 22.0, 40)).await;

    let response = send(&app, "GET", "/api/books/search/title/KIND", None).await;
    assert_eq!(json_body(response).await.as_array().unwrap().len(), 1);

    let response = send(&app, "GET", "/api/books/search/author/butler", None).await;
    assert_eq!(json_body(response).await.as_array().unwrap().len(), 3);

    let response = send(
        &app,
        "GET",
        "/api/books/price-range?minPrice=9.50&maxPrice=15",
        None,
    )
    .await;
    let titles: Vec<String> = json_body(response)
        .await
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, ["Dawn", "Kindred"]);

    let response = send(&app, "GET", "/api/books/low-stock", None).await;
    assert_eq!(json_body(response).await.as_array().unwrap().len(), 2);

    let response = send(&app, "GET", "/api/books/low-stock?threshold=1", None).await;
    assert_eq!(json_body(response).await.as_array().unwrap().len(), 1);

    let response = send(
        &app,
        "GET",
        "/api/books/category/Science%20Fiction/available",
        None,
    )
    .await;
    assert_eq!(json_body(response).await.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_invalid_search_arguments() {
    let app = setup();

    let response = send(
        &app,
        "GET",
        "/api/books/price-range?minPrice=20&maxPrice=10",
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await["message"],
        "Minimum price cannot be greater than maximum price"
    );

    let response = send(&app, "GET", "/api/books/low-stock?threshold=-1", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await["message"],
        "Stock threshold cannot be negative"
    );
}

#[tokio::test]
async fn test_customer_crud_and_duplicate_email() {
    let app = setup();

    let created = create(&app, "/api/customers", customer_json("lauren@example.com")).await;
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["phoneNumber"], "(555) 123-4567");

    let response = send(
        &app,
        "POST",
        "/api/customers",
        Some(customer_json("lauren@example.com")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await["message"],
        "Email already exists: lauren@example.com"
    );

    let response = send(&app, "GET", "/api/customers/email/lauren@example.com", None).await;
    assert_eq!(json_body(response).await["id"], id.as_str());

    let mut changes = customer_json("lauren@example.com");
    changes["address"] = json!("Acorn");
    let response = send(&app, "PUT", &format!("/api/customers/{id}"), Some(changes)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["address"], "Acorn");

    let response = send(&app, "DELETE", &format!("/api/customers/{id}"), None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(&app, "GET", "/api/customers", None).await;
    assert!(json_body(response).await.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_phone_alias() {
    let app = setup();

    let created = create(
        &app,
        "/api/customers",
        json!({
            "firstName": "Lauren",
            "lastName": "Olamina",
            "email": "alias@example.com",
            "phone": "555-0000"
        }),
    )
    .await;
    assert_eq!(created["phoneNumber"], "555-0000");
}

#[tokio::test]
async fn test_place_order_and_lifecycle() {
    let app = setup();
    let customer = create(&app, "/api/customers", customer_json("lauren@example.com")).await;
    let book = create(&app, "/api/books", book_json("Kindred", "978-0807083697", 15.0, 3)).await;

    let order = create(
        &app,
        "/api/orders",
        json!({
            "customerId": customer["id"],
            "items": [{"bookId": book["id"], "quantity": 2}]
        }),
    )
    .await;
    assert_eq!(order["status"], "PENDING");
    assert_eq!(order["totalAmount"], 30.0);
    assert_eq!(order["customerName"], "Lauren Olamina");
    assert_eq!(order["shippingAddress"], "Robledo, CA");
    assert_eq!(order["items"][0]["bookTitle"], "Kindred");
    assert_eq!(order["items"][0]["subtotal"], 30.0);

    let book_uri = format!("/api/books/{}", book["id"].as_str().unwrap());
    let response = send(&app, "GET", &book_uri, None).await;
    assert_eq!(json_body(response).await["stockQuantity"], 1);

    let order_id = order["id"].as_str().unwrap();
    let status_uri = format!("/api/orders/{order_id}/status");

    let response = send(&app, "PATCH", &status_uri, Some(json!({"status": "shipped"}))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(&app, "PATCH", &status_uri, Some(json!({"status": "CONFIRMED"}))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "CONFIRMED");

    let response = send(&app, "GET", "/api/orders/status/confirmed", None).await;
    assert_eq!(json_body(response).await.as_array().unwrap().len(), 1);

    let response = send(&app, "PATCH", &status_uri, Some(json!({"status": "CANCELLED"}))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, "GET", &book_uri, None).await;
    assert_eq!(json_body(response).await["stockQuantity"], 3);

    let customer_uri = format!(
        "/api/orders/customer/{}",
        customer["id"].as_str().unwrap()
    );
    let response = send(&app, "GET", &customer_uri, None).await;
    assert_eq!(json_body(response).await.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_parallel_array_order() {
    let app = setup();
    let customer = create(&app, "/api/customers", customer_json("lauren@example.com")).await;
    let book = create(&app, "/api/books", book_json("Kindred", "978-0807083697", 15.0, 3)).await;

    let order = create(
        &app,
        "/api/orders",
        json!({
            "customerId": customer["id"],
            "bookIds": [book["id"]],
            "quantities": [1],
            "shippingAddress": "Earthseed"
        }),
    )
    .await;
    assert_eq!(order["shippingAddress"], "Earthseed");

    let response = send(
        &app,
        "POST",
        "/api/orders",
        Some(json!({
            "customerId": customer["id"],
            "bookIds": [book["id"]],
            "quantities": [1, 1]
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_insufficient_stock_is_rejected() {
    let app = setup();
    let customer = create(&app, "/api/customers", customer_json("lauren@example.com")).await;
    let book = create(&app, "/api/books", book_json("Kindred", "978-0807083697", 15.0, 3)).await;

    let response = send(
        &app,
        "POST",
        "/api/orders",
        Some(json!({
            "customerId": customer["id"],
            "items": [{"bookId": book["id"], "quantity": 4}]
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await["message"],
        "Insufficient stock for book: Kindred. Available: 3, Requested: 4"
    );

    let response = send(&app, "GET", "/api/orders", None).await;
    assert!(json_body(response).await.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_route_uses_error_body() {
    let app = setup();

    let response = send(&app, "GET", "/api/nothing-here", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["path"], "/api/nothing-here");
}
