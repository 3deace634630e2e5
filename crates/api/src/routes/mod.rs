//! HTTP route handlers.

pub mod books;
pub mod customers;
pub mod health;
pub mod metrics;
pub mod orders;

use std::fmt::Display;
use std::str::FromStr;

use common::OrderStatus;
use domain::{BookService, CustomerService, OrderService};
use store::BookstoreStore;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: BookstoreStore> {
    pub books: BookService<S>,
    pub customers: CustomerService<S>,
    pub orders: OrderService<S>,
}

impl<S: BookstoreStore + Clone> AppState<S> {
    /// Builds every service over clones of one store.
    pub fn new(store: S) -> Self {
        Self {
            books: BookService::new(store.clone()),
            customers: CustomerService::new(store.clone()),
            orders: OrderService::new(store),
        }
    }
}

fn parse_id<T>(raw: &str) -> Result<T, ApiError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))
}

fn parse_status(raw: &str) -> Result<OrderStatus, ApiError> {
    raw.parse().map_err(|e| {
        ApiError::BadRequest(format!(
            "{e}; expected one of PENDING, CONFIRMED, SHIPPED, DELIVERED, CANCELLED"
        ))
    })
}

/// Fallback for unmatched routes.
pub async fn not_found(uri: axum::http::Uri) -> ApiError {
    ApiError::NotFound(format!("No route for {}", uri.path()))
}
