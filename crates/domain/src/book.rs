//! Book catalogue operations.

use common::{BookId, Money};
use serde::{Deserialize, Serialize};
use store::{
    Book, BookQuery, BookstoreStore, BookstoreStoreExt, FK_ORDER_ITEMS_BOOK, NewBook,
    UNIQUE_BOOK_ISBN,
};

use crate::error::{DomainError, FieldError};
use crate::validation::{ISBN_PATTERN, Validator};

/// Stock level below which a book counts as low on stock, unless the caller
/// supplies a threshold.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i32 = 10;

/// Incoming book fields for create and update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub isbn: String,
    #[serde(default)]
    pub category: String,
    pub price: Option<Money>,
    pub stock_quantity: Option<i32>,
    pub description: Option<String>,
}

impl BookRequest {
    /// Checks every field constraint and returns the column values.
    pub fn validate(self) -> Result<NewBook, DomainError> {
        let mut v = Validator::new();
        v.not_blank("title", &self.title, "Title is required")
            .max_len("title", &self.title, 200, "Title cannot exceed 200 characters")
            .not_blank("author", &self.author, "Author is required")
            .max_len(
                "author",
                &self.author,
                100,
                "Author name cannot exceed 100 characters",
            )
            .not_blank("isbn", &self.isbn, "ISBN is required")
            .pattern("isbn", &self.isbn, &ISBN_PATTERN, "Invalid ISBN format")
            .not_blank("category", &self.category, "Category is required")
            .max_len(
                "category",
                &self.category,
                50,
                "Category cannot exceed 50 characters",
            )
            .price("price", self.price)
            .check(
                "stockQuantity",
                self.stock_quantity.unwrap_or(0) >= 0,
                "Stock quantity cannot be negative",
            )
            .max_len_opt(
                "description",
                self.description.as_deref(),
                1000,
                "Description cannot exceed 1000 characters",
            );
        v.finish()?;

        let price = self.price.ok_or_else(|| {
            DomainError::Validation(vec![FieldError::new("price", "Price is required")])
        })?;

        Ok(NewBook {
            title: self.title,
            author: self.author,
            isbn: self.isbn,
            category: self.category,
            price,
            stock_quantity: self.stock_quantity.unwrap_or(0),
            description: self.description,
        })
    }
}

/// A book as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookDto {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub category: String,
    pub price: Money,
    pub stock_quantity: i32,
    pub description: Option<String>,
}

impl From<Book> for BookDto {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            title: book.title,
            author: book.author,
            isbn: book.isbn,
            category: book.category,
            price: book.price,
            stock_quantity: book.stock_quantity,
            description: book.description,
        }
    }
}

fn duplicate_isbn(isbn: &str) -> DomainError {
    DomainError::invalid(format!("ISBN already exists: {isbn}"))
}

/// Service for managing the book catalogue.
pub struct BookService<S: BookstoreStore> {
    store: S,
}

impl<S: BookstoreStore> BookService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    #[tracing::instrument(skip(self, request), fields(isbn = %request.isbn))]
    pub async fn create_book(&self, request: BookRequest) -> Result<BookDto, DomainError> {
        let new_book = request.validate()?;

        if self.store.get_book_by_isbn(&new_book.isbn).await?.is_some() {
            return Err(duplicate_isbn(&new_book.isbn));
        }

        let isbn = new_book.isbn.clone();
        let book = self.store.insert_book(new_book).await.map_err(|e| match e {
            e if e.is_unique_violation(UNIQUE_BOOK_ISBN) => duplicate_isbn(&isbn),
            e => e.into(),
        })?;

        metrics::counter!("books_created_total").increment(1);
        tracing::info!(book_id = %book.id, "book created");
        Ok(book.into())
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_book(&self, id: BookId) -> Result<BookDto, DomainError> {
        self.store
            .get_book(id)
            .await?
            .map(BookDto::from)
            .ok_or_else(|| DomainError::not_found("Book", "id", id))
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_book_by_isbn(&self, isbn: &str) -> Result<BookDto, DomainError> {
        self.store
            .get_book_by_isbn(isbn)
            .await?
            .map(BookDto::from)
            .ok_or_else(|| DomainError::not_found("Book", "isbn", isbn))
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_books(&self) -> Result<Vec<BookDto>, DomainError> {
        Ok(into_dtos(self.store.list_books().await?))
    }

    /// Replaces every field of an existing book.
    #[tracing::instrument(skip(self, request))]
    pub async fn update_book(
        &self,
        id: BookId,
        request: BookRequest,
    ) -> Result<BookDto, DomainError> {
        if self.store.get_book(id).await?.is_none() {
            return Err(DomainError::not_found("Book", "id", id));
        }

        let new_book = request.validate()?;
        if let Some(other) = self.store.get_book_by_isbn(&new_book.isbn).await?
            && other.id != id
        {
            return Err(duplicate_isbn(&new_book.isbn));
        }

        let isbn = new_book.isbn.clone();
        let updated = self
            .store
            .update_book(id, new_book)
            .await
            .map_err(|e| match e {
                e if e.is_unique_violation(UNIQUE_BOOK_ISBN) => duplicate_isbn(&isbn),
                e => e.into(),
            })?;

        let book = updated.ok_or_else(|| DomainError::not_found("Book", "id", id))?;
        tracing::info!(book_id = %book.id, "book updated");
        Ok(book.into())
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_book(&self, id: BookId) -> Result<(), DomainError> {
        match self.store.delete_book(id).await {
            Ok(true) => {
                tracing::info!(book_id = %id, "book deleted");
                Ok(())
            }
            Ok(false) => Err(DomainError::not_found("Book", "id", id)),
            Err(e) if e.is_foreign_key_violation(FK_ORDER_ITEMS_BOOK) => Err(
                DomainError::invalid(format!("Book is referenced by existing orders: {id}")),
            ),
            Err(e) => Err(e.into()),
        }
    }

    /// Case-insensitive substring match on the author.
    #[tracing::instrument(skip(self))]
    pub async fn search_by_author(&self, author: &str) -> Result<Vec<BookDto>, DomainError> {
        self.query(BookQuery::new().author_contains(author)).await
    }

    /// Case-insensitive substring match on the title.
    #[tracing::instrument(skip(self))]
    pub async fn search_by_title(&self, title: &str) -> Result<Vec<BookDto>, DomainError> {
        self.query(BookQuery::new().title_contains(title)).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn search_by_category(&self, category: &str) -> Result<Vec<BookDto>, DomainError> {
        self.query(BookQuery::new().category(category)).await
    }

    /// Books in the category with at least one copy in stock.
    #[tracing::instrument(skip(self))]
    pub async fn search_available_in_category(
        &self,
        category: &str,
    ) -> Result<Vec<BookDto>, DomainError> {
        self.query(BookQuery::new().category(category).stock_above(0))
            .await
    }

    /// Books priced within `[min, max]`.
    #[tracing::instrument(skip(self))]
    pub async fn search_by_price_range(
        &self,
        min: Money,
        max: Money,
    ) -> Result<Vec<BookDto>, DomainError> {
        if min > max {
            return Err(DomainError::invalid(
                "Minimum price cannot be greater than maximum price",
            ));
        }
        self.query(BookQuery::new().price_between(min, max)).await
    }

    /// Books whose stock is strictly below `threshold`.
    #[tracing::instrument(skip(self))]
    pub async fn search_low_stock(&self, threshold: i32) -> Result<Vec<BookDto>, DomainError> {
        if threshold < 0 {
            return Err(DomainError::invalid("Stock threshold cannot be negative"));
        }
        self.query(BookQuery::new().stock_below(threshold)).await
    }

    async fn query(&self, query: BookQuery) -> Result<Vec<BookDto>, DomainError> {
        Ok(into_dtos(self.store.query_books(query).await?))
    }
}

fn into_dtos(books: Vec<Book>) -> Vec<BookDto> {
    books.into_iter().map(BookDto::from).collect()
}
