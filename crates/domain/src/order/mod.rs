//! Order placement and order lifecycle.

mod service;

use chrono::{DateTime, Utc};
use common::{BookId, CustomerId, Money, OrderId, OrderItemId, OrderStatus};
use serde::{Deserialize, Serialize};
use store::{Order, OrderItem};

use crate::error::{DomainError, FieldError};
use crate::validation::Validator;

pub use service::OrderService;

/// One requested line: a book and how many copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub book_id: BookId,
    pub quantity: i32,
}

impl OrderLine {
    pub fn new(book_id: BookId, quantity: i32) -> Self {
        Self { book_id, quantity }
    }
}

/// Command to place an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceOrder {
    pub customer_id: CustomerId,
    /// Lines in the order they should be processed.
    pub items: Vec<OrderLine>,
    /// Falls back to the customer's address when absent.
    pub shipping_address: Option<String>,
}

impl PlaceOrder {
    pub fn new(customer_id: CustomerId, items: Vec<OrderLine>) -> Self {
        Self {
            customer_id,
            items,
            shipping_address: None,
        }
    }

    pub fn with_shipping_address(mut self, address: impl Into<String>) -> Self {
        self.shipping_address = Some(address.into());
        self
    }

    /// Builds a command from parallel book id and quantity lists.
    pub fn from_parallel(
        customer_id: CustomerId,
        book_ids: Vec<BookId>,
        quantities: Vec<i32>,
    ) -> Result<Self, DomainError> {
        if book_ids.len() != quantities.len() {
            return Err(DomainError::invalid(format!(
                "Book IDs and quantities must have the same length: {} book IDs, {} quantities",
                book_ids.len(),
                quantities.len()
            )));
        }
        let items = book_ids
            .into_iter()
            .zip(quantities)
            .map(|(book_id, quantity)| OrderLine::new(book_id, quantity))
            .collect();
        Ok(Self::new(customer_id, items))
    }
}

/// Order placement body as clients send it.
///
/// Accepts either `items` or the parallel `bookIds`/`quantities` lists.
/// When both are present `items` is used.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub customer_id: Option<CustomerId>,
    pub items: Option<Vec<OrderLine>>,
    pub book_ids: Option<Vec<BookId>>,
    pub quantities: Option<Vec<i32>>,
    pub shipping_address: Option<String>,
}

impl OrderRequest {
    /// Normalises either request shape into a [`PlaceOrder`].
    pub fn into_command(self) -> Result<PlaceOrder, DomainError> {
        Validator::new()
            .check(
                "customerId",
                self.customer_id.is_some(),
                "Customer ID is required",
            )
            .max_len_opt(
                "shippingAddress",
                self.shipping_address.as_deref(),
                200,
                "Shipping address cannot exceed 200 characters",
            )
            .finish()?;
        let customer_id = self.customer_id.ok_or_else(|| {
            DomainError::Validation(vec![FieldError::new(
                "customerId",
                "Customer ID is required",
            )])
        })?;

        let command = match (self.items, self.book_ids, self.quantities) {
            (Some(items), _, _) => PlaceOrder::new(customer_id, items),
            (None, book_ids, quantities) => PlaceOrder::from_parallel(
                customer_id,
                book_ids.unwrap_or_default(),
                quantities.unwrap_or_default(),
            )?,
        };

        Ok(PlaceOrder {
            shipping_address: self.shipping_address,
            ..command
        })
    }
}

/// An order line as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemDto {
    pub id: OrderItemId,
    pub book_id: BookId,
    pub book_title: String,
    pub quantity: u32,
    pub price: Money,
    pub subtotal: Money,
}

impl From<OrderItem> for OrderItemDto {
    fn from(item: OrderItem) -> Self {
        Self {
            subtotal: item.subtotal(),
            id: item.id,
            book_id: item.book_id,
            book_title: item.book_title,
            quantity: item.quantity,
            price: item.price,
        }
    }
}

/// An order as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDto {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub items: Vec<OrderItemDto>,
    pub total_amount: Money,
    pub status: OrderStatus,
    pub shipping_address: Option<String>,
    pub order_date: DateTime<Utc>,
}

impl From<Order> for OrderDto {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            customer_id: order.customer_id,
            customer_name: order.customer_name,
            items: order.items.into_iter().map(OrderItemDto::from).collect(),
            total_amount: order.total_amount,
            status: order.status,
            shipping_address: order.shipping_address,
            order_date: order.order_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn items_shape_is_parsed() {
        let book_id = BookId::new();
        let customer_id = CustomerId::new();
        let body = serde_json::json!({
            "customerId": customer_id,
            "items": [{"bookId": book_id, "quantity": 2}],
            "shippingAddress": "221B Baker Street"
        });

        let request: OrderRequest = serde_json::from_value(body).unwrap();
        let command = request.into_command().unwrap();

        assert_eq!(command.customer_id, customer_id);
        assert_eq!(command.items, vec![OrderLine::new(book_id, 2)]);
        assert_eq!(command.shipping_address.as_deref(), Some("221B Baker Street"));
    }

    #[test]
    fn parallel_shape_is_zipped_in_order() {
        let first = BookId::new();
        let second = BookId::new();
        let request = OrderRequest {
            customer_id: Some(CustomerId::new()),
            book_ids: Some(vec![first, second]),
            quantities: Some(vec![1, 3]),
            ..Default::default()
        };

        let command = request.into_command().unwrap();
        assert_eq!(
            command.items,
            vec![OrderLine::new(first, 1), OrderLine::new(second, 3)]
        );
    }

    #[test]
    fn items_win_over_parallel_lists() {
        let book_id = BookId::new();
        let request = OrderRequest {
            customer_id: Some(CustomerId::new()),
            items: Some(vec![OrderLine::new(book_id, 1)]),
            book_ids: Some(vec![BookId::new(), BookId::new()]),
            quantities: Some(vec![5]),
            ..Default::default()
        };

        let command = request.into_command().unwrap();
        assert_eq!(command.items, vec![OrderLine::new(book_id, 1)]);
    }

    #[test]
    fn mismatched_parallel_lists_are_rejected() {
        let request = OrderRequest {
            customer_id: Some(CustomerId::new()),
            book_ids: Some(vec![BookId::new(), BookId::new()]),
            quantities: Some(vec![1]),
            ..Default::default()
        };

        assert!(matches!(
            request.into_command(),
            Err(DomainError::InvalidArgument(_))
        ));
    }

    #[test]
    fn missing_customer_is_a_validation_error() {
        let request = OrderRequest {
            items: Some(vec![OrderLine::new(BookId::new(), 1)]),
            ..Default::default()
        };

        let Err(DomainError::Validation(errors)) = request.into_command() else {
            panic!("expected validation error");
        };
        assert_eq!(errors[0].field, "customerId");
    }

    #[test]
    fn dto_carries_subtotals() {
        let order_id = OrderId::new();
        let item = OrderItem {
            id: OrderItemId::new(),
            order_id,
            book_id: BookId::new(),
            book_title: "Dune".to_string(),
            quantity: 3,
            price: Money::from_cents(999),
        };

        let dto = OrderItemDto::from(item);
        assert_eq!(dto.subtotal, Money::from_cents(2997));
    }
}
