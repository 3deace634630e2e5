//! Persistence layer for the bookstore backend.
//!
//! [`BookstoreStore`] is implemented by [`InMemoryStore`] and
//! [`PostgresStore`]. Multi-step writes run inside a [`StoreTransaction`]
//! obtained from [`BookstoreStore::begin`].

pub mod error;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod query;
pub mod store;

pub use common::{BookId, CustomerId, Money, OrderId, OrderItemId, OrderStatus};
pub use error::{
    FK_ORDER_ITEMS_BOOK, FK_ORDERS_CUSTOMER, Result, StoreError, UNIQUE_BOOK_ISBN,
    UNIQUE_CUSTOMER_EMAIL,
};
pub use memory::InMemoryStore;
pub use model::{Book, Customer, NewBook, NewCustomer, NewOrder, NewOrderItem, Order, OrderItem};
pub use postgres::PostgresStore;
pub use query::{BookQuery, OrderQuery};
pub use store::{BookstoreStore, BookstoreStoreExt, StoreTransaction};
