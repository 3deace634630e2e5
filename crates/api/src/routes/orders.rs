//! Order placement and status endpoints.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use common::{CustomerId, OrderId};
use domain::{OrderDto, OrderRequest};
use serde::Deserialize;
use store::BookstoreStore;

use super::{AppState, parse_id, parse_status};
use crate::error::ApiError;
use crate::extract::{Json, Path};

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}

/// POST /api/orders: place an order from either request shape.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: BookstoreStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<OrderRequest>,
) -> Result<(StatusCode, Json<OrderDto>), ApiError> {
    let order = state.orders.place_order(req.into_command()?).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /api/orders
#[tracing::instrument(skip(state))]
pub async fn list<S: BookstoreStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<OrderDto>>, ApiError> {
    Ok(Json(state.orders.list_orders().await?))
}

/// GET /api/orders/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: BookstoreStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderDto>, ApiError> {
    let id: OrderId = parse_id(&id)?;
    Ok(Json(state.orders.get_order(id).await?))
}

/// GET /api/orders/customer/{customer_id}
#[tracing::instrument(skip(state))]
pub async fn by_customer<S: BookstoreStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(customer_id): Path<String>,
) -> Result<Json<Vec<OrderDto>>, ApiError> {
    let customer_id: CustomerId = parse_id(&customer_id)?;
    Ok(Json(state.orders.get_customer_orders(customer_id).await?))
}

/// GET /api/orders/status/{status}
#[tracing::instrument(skip(state))]
pub async fn by_status<S: BookstoreStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(status): Path<String>,
) -> Result<Json<Vec<OrderDto>>, ApiError> {
    let status = parse_status(&status)?;
    Ok(Json(state.orders.get_orders_by_status(status).await?))
}

/// PATCH /api/orders/{id}/status
#[tracing::instrument(skip(state, req))]
pub async fn update_status<S: BookstoreStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<StatusUpdateRequest>,
) -> Result<Json<OrderDto>, ApiError> {
    let id: OrderId = parse_id(&id)?;
    let status = parse_status(&req.status)?;
    Ok(Json(state.orders.update_status(id, status).await?))
}
