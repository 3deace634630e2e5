//! HTTP API server with observability for the bookstore backend.
//!
//! Provides REST endpoints for books, customers and orders, with structured
//! logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::{get, patch, post};
use metrics_exporter_prometheus::PrometheusHandle;
use store::BookstoreStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::{AppState, books, customers, orders};

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: BookstoreStore + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        // Books
        .route("/api/books", post(books::create::<S>).get(books::list::<S>))
        .route(
            "/api/books/{id}",
            get(books::get::<S>)
                .put(books::update::<S>)
                .delete(books::delete::<S>),
        )
        .route("/api/books/isbn/{isbn}", get(books::get_by_isbn::<S>))
        .route(
            "/api/books/search/author/{author}",
            get(books::search_by_author::<S>),
        )
        .route(
            "/api/books/search/title/{title}",
            get(books::search_by_title::<S>),
        )
        .route("/api/books/category/{category}", get(books::by_category::<S>))
        .route(
            "/api/books/category/{category}/available",
            get(books::available_in_category::<S>),
        )
        .route("/api/books/price-range", get(books::by_price_range::<S>))
        .route("/api/books/low-stock", get(books::low_stock::<S>))
        // Customers
        .route(
            "/api/customers",
            post(customers::create::<S>).get(customers::list::<S>),
        )
        .route(
            "/api/customers/{id}",
            get(customers::get::<S>)
                .put(customers::update::<S>)
                .delete(customers::delete::<S>),
        )
        .route(
            "/api/customers/email/{email}",
            get(customers::get_by_email::<S>),
        )
        // Orders
        .route("/api/orders", post(orders::create::<S>).get(orders::list::<S>))
        .route("/api/orders/{id}", get(orders::get::<S>))
        .route("/api/orders/{id}/status", patch(orders::update_status::<S>))
        .route(
            "/api/orders/customer/{customer_id}",
            get(orders::by_customer::<S>),
        )
        .route("/api/orders/status/{status}", get(orders::by_status::<S>))
        .fallback(routes::not_found)
        .with_state(state)
        .merge(metrics_router)
        .layer(middleware::from_fn(error::stamp_error_path))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state over the given store.
pub fn create_state<S: BookstoreStore + Clone + 'static>(store: S) -> Arc<AppState<S>> {
    Arc::new(AppState::new(store))
}
