use common::{CustomerId, Money, OrderId, OrderStatus};

use crate::model::{Book, Order};

/// Builder for constructing book searches.
///
/// All set filters must match. Text filters on author and title are
/// case-insensitive substring matches; category is an exact match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookQuery {
    /// Author contains this text (case-insensitive).
    pub author_contains: Option<String>,

    /// Title contains this text (case-insensitive).
    pub title_contains: Option<String>,

    /// Category equals this value.
    pub category: Option<String>,

    /// Price at least this amount (inclusive).
    pub min_price: Option<Money>,

    /// Price at most this amount (inclusive).
    pub max_price: Option<Money>,

    /// Stock strictly below this quantity.
    pub stock_below: Option<i32>,

    /// Stock strictly above this quantity.
    pub stock_above: Option<i32>,
}

impl BookQuery {
    /// Creates a new empty query that matches every book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filters by author substring.
    pub fn author_contains(mut self, author: impl Into<String>) -> Self {
        self.author_contains = Some(author.into());
        self
    }

    /// Filters by title substring.
    pub fn title_contains(mut self, title: impl Into<String>) -> Self {
        self.title_contains = Some(title.into());
        self
    }

    /// Filters by exact category.
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Filters to the inclusive price range `[min, max]`.
    pub fn price_between(mut self, min: Money, max: Money) -> Self {
        self.min_price = Some(min);
        self.max_price = Some(max);
        self
    }

    /// Filters to books whose stock is below `threshold`.
    pub fn stock_below(mut self, threshold: i32) -> Self {
        self.stock_below = Some(threshold);
        self
    }

    /// Filters to books whose stock is above `quantity`.
    pub fn stock_above(mut self, quantity: i32) -> Self {
        self.stock_above = Some(quantity);
        self
    }

    /// Evaluates the query against a single book.
    pub fn matches(&self, book: &Book) -> bool {
        let contains = |haystack: &str, needle: &str| {
            haystack.to_lowercase().contains(&needle.to_lowercase())
        };

        self.author_contains
            .as_deref()
            .is_none_or(|a| contains(&book.author, a))
            && self
                .title_contains
                .as_deref()
                .is_none_or(|t| contains(&book.title, t))
            && self.category.as_deref().is_none_or(|c| book.category == c)
            && self.min_price.is_none_or(|min| book.price >= min)
            && self.max_price.is_none_or(|max| book.price <= max)
            && self.stock_below.is_none_or(|t| book.stock_quantity < t)
            && self.stock_above.is_none_or(|q| book.stock_quantity > q)
    }
}

/// Builder for constructing order lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderQuery {
    /// Filter by order id.
    pub order_id: Option<OrderId>,

    /// Filter by owning customer.
    pub customer_id: Option<CustomerId>,

    /// Filter by status.
    pub status: Option<OrderStatus>,
}

impl OrderQuery {
    /// Creates a new empty query that matches every order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query for a single order.
    pub fn for_order(order_id: OrderId) -> Self {
        Self {
            order_id: Some(order_id),
            ..Default::default()
        }
    }

    /// Creates a query for one customer's orders.
    pub fn for_customer(customer_id: CustomerId) -> Self {
        Self {
            customer_id: Some(customer_id),
            ..Default::default()
        }
    }

    /// Filters by status.
    pub fn status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Evaluates the query against a single order.
    pub fn matches(&self, order: &Order) -> bool {
        self.order_id.is_none_or(|id| order.id == id)
            && self.customer_id.is_none_or(|id| order.customer_id == id)
            && self.status.is_none_or(|s| order.status == s)
    }
}
