//! Shared types for the bookstore backend.
//!
//! Identifiers are UUID newtypes so a book id can never be passed where a
//! customer id is expected. Monetary amounts are whole cents.

pub mod money;
pub mod status;
pub mod types;

pub use money::{Money, MoneyError};
pub use status::{OrderStatus, UnknownStatus};
pub use types::{BookId, CustomerId, OrderId, OrderItemId};
