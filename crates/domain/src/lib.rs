//! Domain layer for the bookstore backend.
//!
//! This crate provides the services that sit between the HTTP layer and the
//! store:
//! - [`BookService`] for the catalogue and its searches
//! - [`CustomerService`] for customer records
//! - [`OrderService`] for transactional order placement and status changes
//!
//! Request types validate their own fields and convert to store records;
//! DTOs are what the services hand back.

pub mod book;
pub mod customer;
pub mod error;
pub mod order;
pub mod validation;

pub use book::{BookDto, BookRequest, BookService, DEFAULT_LOW_STOCK_THRESHOLD};
pub use common::{BookId, CustomerId, Money, OrderId, OrderItemId, OrderStatus};
pub use customer::{CustomerDto, CustomerRequest, CustomerService};
pub use error::{DomainError, FieldError};
pub use order::{OrderDto, OrderItemDto, OrderLine, OrderRequest, OrderService, PlaceOrder};
