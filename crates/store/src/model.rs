//! Records persisted by the store.
//!
//! `New*` types carry the caller-supplied columns; the store assigns ids and
//! timestamps. Read-side records carry a few joined display columns
//! (customer name, book title) so callers do not need extra lookups.

use chrono::{DateTime, SubsecRound, Utc};
use common::{BookId, CustomerId, Money, OrderId, OrderItemId, OrderStatus};
use serde::{Deserialize, Serialize};

/// Current time truncated to the microsecond precision PostgreSQL keeps.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// A book in the catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub category: String,
    pub price: Money,
    pub stock_quantity: i32,
    pub description: Option<String>,
}

/// Column values for inserting or replacing a book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub category: String,
    pub price: Money,
    pub stock_quantity: i32,
    pub description: Option<String>,
}

impl NewBook {
    pub(crate) fn into_book(self, id: BookId) -> Book {
        Book {
            id,
            title: self.title,
            author: self.author,
            isbn: self.isbn,
            category: self.category,
            price: self.price,
            stock_quantity: self.stock_quantity,
            description: self.description,
        }
    }
}

/// A registered customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// Returns `"First Last"`.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Column values for inserting or replacing a customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCustomer {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub address: Option<String>,
}

/// An order together with its line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: CustomerId,
    /// Joined from the owning customer.
    pub customer_name: String,
    pub total_amount: Money,
    pub status: OrderStatus,
    pub shipping_address: Option<String>,
    pub order_date: DateTime<Utc>,
    /// Line items in the order they were placed.
    pub items: Vec<OrderItem>,
}

/// A single line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub book_id: BookId,
    /// Joined from the referenced book.
    pub book_title: String,
    pub quantity: u32,
    /// Unit price captured when the order was placed.
    pub price: Money,
}

impl OrderItem {
    /// Returns `price * quantity`.
    pub fn subtotal(&self) -> Money {
        self.price.multiply(self.quantity)
    }
}

/// Column values for inserting an order and its items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub customer_id: CustomerId,
    pub total_amount: Money,
    pub status: OrderStatus,
    pub shipping_address: Option<String>,
    pub items: Vec<NewOrderItem>,
}

/// Column values for one order line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    pub book_id: BookId,
    pub quantity: u32,
    pub price: Money,
}
