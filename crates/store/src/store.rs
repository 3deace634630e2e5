use async_trait::async_trait;
use common::{BookId, CustomerId, OrderId, OrderStatus};

use crate::{
    Book, BookQuery, Customer, NewBook, NewCustomer, NewOrder, Order, OrderQuery, Result,
};

/// Core trait for bookstore persistence.
///
/// Single-statement operations live here. Multi-step writes go through
/// [`BookstoreStore::begin`], which hands out a [`StoreTransaction`].
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait BookstoreStore: Send + Sync {
    /// Inserts a book and returns it with its assigned id.
    ///
    /// Fails with `UniqueViolation` if the ISBN is already taken.
    async fn insert_book(&self, book: NewBook) -> Result<Book>;

    /// Retrieves a book by id.
    async fn get_book(&self, id: BookId) -> Result<Option<Book>>;

    /// Retrieves a book by ISBN.
    async fn get_book_by_isbn(&self, isbn: &str) -> Result<Option<Book>>;

    /// Replaces every column of a book.
    ///
    /// Returns None if the book doesn't exist.
    async fn update_book(&self, id: BookId, book: NewBook) -> Result<Option<Book>>;

    /// Deletes a book. Returns false if it didn't exist.
    ///
    /// Fails with `ForeignKeyViolation` while an order item references it.
    async fn delete_book(&self, id: BookId) -> Result<bool>;

    /// Retrieves books matching a query, ordered by title then id.
    async fn query_books(&self, query: BookQuery) -> Result<Vec<Book>>;

    /// Inserts a customer and returns it with its assigned id and timestamps.
    ///
    /// Fails with `UniqueViolation` if the email is already taken.
    async fn insert_customer(&self, customer: NewCustomer) -> Result<Customer>;

    /// Retrieves a customer by id.
    async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>>;

    /// Retrieves a customer by email.
    async fn get_customer_by_email(&self, email: &str) -> Result<Option<Customer>>;

    /// Retrieves every customer, ordered by last name, first name, id.
    async fn list_customers(&self) -> Result<Vec<Customer>>;

    /// Replaces every column of a customer and refreshes `updated_at`.
    ///
    /// Returns None if the customer doesn't exist.
    async fn update_customer(
        &self,
        id: CustomerId,
        customer: NewCustomer,
    ) -> Result<Option<Customer>>;

    /// Deletes a customer together with their orders and order items.
    ///
    /// Returns false if the customer didn't exist.
    async fn delete_customer(&self, id: CustomerId) -> Result<bool>;

    /// Retrieves orders matching a query, newest first.
    async fn query_orders(&self, query: OrderQuery) -> Result<Vec<Order>>;

    /// Starts a unit of work.
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>>;
}

/// An open unit of work.
///
/// Reads through a transaction see its own uncommitted writes. Dropping the
/// transaction without calling [`StoreTransaction::commit`] discards every
/// write made through it.
#[async_trait]
pub trait StoreTransaction: Send {
    /// Retrieves a customer by id.
    async fn get_customer(&mut self, id: CustomerId) -> Result<Option<Customer>>;

    /// Retrieves a book and holds it against concurrent writers until the
    /// transaction ends.
    async fn lock_book(&mut self, id: BookId) -> Result<Option<Book>>;

    /// Sets a book's stock quantity.
    async fn set_book_stock(&mut self, id: BookId, stock_quantity: i32) -> Result<()>;

    /// Inserts an order with its items and returns the stored order.
    async fn insert_order(&mut self, order: NewOrder) -> Result<Order>;

    /// Retrieves an order and holds it against concurrent writers until the
    /// transaction ends.
    async fn lock_order(&mut self, id: OrderId) -> Result<Option<Order>>;

    /// Sets an order's status.
    async fn set_order_status(&mut self, id: OrderId, status: OrderStatus) -> Result<()>;

    /// Makes every write in this transaction durable.
    async fn commit(self: Box<Self>) -> Result<()>;
}

/// Extension trait providing convenience methods for stores.
#[async_trait]
pub trait BookstoreStoreExt: BookstoreStore {
    /// Retrieves every book.
    async fn list_books(&self) -> Result<Vec<Book>> {
        self.query_books(BookQuery::new()).await
    }

    /// Retrieves a single order by id.
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self
            .query_orders(OrderQuery::for_order(id))
            .await?
            .into_iter()
            .next())
    }

    /// Retrieves every order.
    async fn list_orders(&self) -> Result<Vec<Order>> {
        self.query_orders(OrderQuery::new()).await
    }
}

// Blanket implementation for all BookstoreStore implementations
impl<T: BookstoreStore + ?Sized> BookstoreStoreExt for T {}
