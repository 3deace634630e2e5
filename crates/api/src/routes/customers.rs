//! Customer endpoints.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use common::CustomerId;
use domain::{CustomerDto, CustomerRequest};
use store::BookstoreStore;

use super::{AppState, parse_id};
use crate::error::ApiError;
use crate::extract::{Json, Path};

/// POST /api/customers
#[tracing::instrument(skip(state, req))]
pub async fn create<S: BookstoreStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CustomerRequest>,
) -> Result<(StatusCode, Json<CustomerDto>), ApiError> {
    let customer = state.customers.create_customer(req).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

/// GET /api/customers
#[tracing::instrument(skip(state))]
pub async fn list<S: BookstoreStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<CustomerDto>>, ApiError> {
    Ok(Json(state.customers.list_customers().await?))
}

/// GET /api/customers/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: BookstoreStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<CustomerDto>, ApiError> {
    let id: CustomerId = parse_id(&id)?;
    Ok(Json(state.customers.get_customer(id).await?))
}

/// GET /api/customers/email/{email}
#[tracing::instrument(skip(state))]
pub async fn get_by_email<S: BookstoreStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(email): Path<String>,
) -> Result<Json<CustomerDto>, ApiError> {
    Ok(Json(state.customers.get_customer_by_email(&email).await?))
}

/// PUT /api/customers/{id}
#[tracing::instrument(skip(state, req))]
pub async fn update<S: BookstoreStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<CustomerRequest>,
) -> Result<Json<CustomerDto>, ApiError> {
    let id: CustomerId = parse_id(&id)?;
    Ok(Json(state.customers.update_customer(id, req).await?))
}

/// DELETE /api/customers/{id}
#[tracing::instrument(skip(state))]
pub async fn delete<S: BookstoreStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id: CustomerId = parse_id(&id)?;
    state.customers.delete_customer(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
