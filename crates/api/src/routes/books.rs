//! Book catalogue endpoints.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use common::{BookId, Money};
use domain::{BookDto, BookRequest, DEFAULT_LOW_STOCK_THRESHOLD};
use serde::Deserialize;
use store::BookstoreStore;

use super::{AppState, parse_id};
use crate::error::ApiError;
use crate::extract::{Json, Path, Query};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRangeParams {
    pub min_price: Money,
    pub max_price: Money,
}

#[derive(Debug, Deserialize)]
pub struct LowStockParams {
    pub threshold: Option<i32>,
}

/// POST /api/books
#[tracing::instrument(skip(state, req))]
pub async fn create<S: BookstoreStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<BookRequest>,
) -> Result<(StatusCode, Json<BookDto>), ApiError> {
    let book = state.books.create_book(req).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// GET /api/books
#[tracing::instrument(skip(state))]
pub async fn list<S: BookstoreStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<BookDto>>, ApiError> {
    Ok(Json(state.books.list_books().await?))
}

/// GET /api/books/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: BookstoreStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<BookDto>, ApiError> {
    let id: BookId = parse_id(&id)?;
    Ok(Json(state.books.get_book(id).await?))
}

/// GET /api/books/isbn/{isbn}
#[tracing::instrument(skip(state))]
pub async fn get_by_isbn<S: BookstoreStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(isbn): Path<String>,
) -> Result<Json<BookDto>, ApiError> {
    Ok(Json(state.books.get_book_by_isbn(&isbn).await?))
}

/// PUT /api/books/{id}
#[tracing::instrument(skip(state, req))]
pub async fn update<S: BookstoreStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<BookRequest>,
) -> Result<Json<BookDto>, ApiError> {
    let id: BookId = parse_id(&id)?;
    Ok(Json(state.books.update_book(id, req).await?))
}

/// DELETE /api/books/{id}
#[tracing::instrument(skip(state))]
pub async fn delete<S: BookstoreStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id: BookId = parse_id(&id)?;
    state.books.delete_book(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/books/search/author/{author}
#[tracing::instrument(skip(state))]
pub async fn search_by_author<S: BookstoreStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(author): Path<String>,
) -> Result<Json<Vec<BookDto>>, ApiError> {
    Ok(Json(state.books.search_by_author(&author).await?))
}

/// GET /api/books/search/title/{title}
#[tracing::instrument(skip(state))]
pub async fn search_by_title<S: BookstoreStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(title): Path<String>,
) -> Result<Json<Vec<BookDto>>, ApiError> {
    Ok(Json(state.books.search_by_title(&title).await?))
}

/// GET /api/books/category/{category}
#[tracing::instrument(skip(state))]
pub async fn by_category<S: BookstoreStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(category): Path<String>,
) -> Result<Json<Vec<BookDto>>, ApiError> {
    Ok(Json(state.books.search_by_category(&category).await?))
}

/// GET /api/books/category/{category}/available
#[tracing::instrument(skip(state))]
pub async fn available_in_category<S: BookstoreStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(category): Path<String>,
) -> Result<Json<Vec<BookDto>>, ApiError> {
    Ok(Json(
        state.books.search_available_in_category(&category).await?,
    ))
}

/// GET /api/books/price-range?minPrice=&maxPrice=
#[tracing::instrument(skip(state))]
pub async fn by_price_range<S: BookstoreStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<PriceRangeParams>,
) -> Result<Json<Vec<BookDto>>, ApiError> {
    Ok(Json(
        state
            .books
            .search_by_price_range(params.min_price, params.max_price)
            .await?,
    ))
}

/// GET /api/books/low-stock?threshold=
#[tracing::instrument(skip(state))]
pub async fn low_stock<S: BookstoreStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<LowStockParams>,
) -> Result<Json<Vec<BookDto>>, ApiError> {
    let threshold = params.threshold.unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD);
    Ok(Json(state.books.search_low_stock(threshold).await?))
}
