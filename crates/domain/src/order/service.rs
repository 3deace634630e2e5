//! Order service: placement workflow and status changes.

use std::time::Instant;

use common::{BookId, CustomerId, Money, OrderId, OrderStatus};
use store::{
    BookstoreStore, BookstoreStoreExt, NewOrder, NewOrderItem, OrderQuery, StoreTransaction,
};

use crate::error::DomainError;

use super::{OrderDto, PlaceOrder};

/// Service for placing and managing orders.
///
/// Every multi-step change runs inside one store transaction. Returning early
/// with an error drops the transaction, which discards the partial work.
pub struct OrderService<S: BookstoreStore> {
    store: S,
}

impl<S: BookstoreStore> OrderService<S> {
    /// Creates a new order service with the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Places an order.
    ///
    /// Lines are processed in the given order. The first failing line aborts
    /// the whole placement and no stock change survives.
    #[tracing::instrument(
        skip(self, cmd),
        fields(customer_id = %cmd.customer_id, lines = cmd.items.len())
    )]
    pub async fn place_order(&self, cmd: PlaceOrder) -> Result<OrderDto, DomainError> {
        let started = Instant::now();
        let result = self.place_in_transaction(cmd).await;
        metrics::histogram!("order_placement_duration_seconds")
            .record(started.elapsed().as_secs_f64());

        match &result {
            Ok(order) => {
                metrics::counter!("orders_placed_total").increment(1);
                tracing::info!(
                    order_id = %order.id,
                    total = %order.total_amount,
                    "order placed"
                );
            }
            Err(e) => {
                metrics::counter!("orders_rejected_total").increment(1);
                tracing::warn!(error = %e, "order rejected");
            }
        }
        result
    }

    async fn place_in_transaction(&self, cmd: PlaceOrder) -> Result<OrderDto, DomainError> {
        let mut tx = self.store.begin().await?;

        let customer = tx
            .get_customer(cmd.customer_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Customer", "id", cmd.customer_id))?;

        if cmd.items.is_empty() {
            return Err(DomainError::invalid("Cannot create order with empty cart"));
        }

        lock_in_id_order(tx.as_mut(), cmd.items.iter().map(|line| line.book_id)).await?;

        let mut items = Vec::with_capacity(cmd.items.len());
        let mut total = Money::zero();

        for line in &cmd.items {
            if line.quantity <= 0 {
                return Err(DomainError::invalid(format!(
                    "Quantity must be greater than 0 for book ID: {}",
                    line.book_id
                )));
            }

            let book = tx
                .lock_book(line.book_id)
                .await?
                .ok_or_else(|| DomainError::not_found("Book", "id", line.book_id))?;

            if line.quantity > book.stock_quantity {
                return Err(DomainError::invalid(format!(
                    "Insufficient stock for book: {}. Available: {}, Requested: {}",
                    book.title, book.stock_quantity, line.quantity
                )));
            }

            tx.set_book_stock(book.id, book.stock_quantity - line.quantity)
                .await?;

            let quantity = line.quantity.unsigned_abs();
            total = book
                .price
                .checked_mul(quantity)
                .and_then(|subtotal| total.checked_add(subtotal))
                .ok_or_else(|| DomainError::invalid("Order total is out of range"))?;
            items.push(NewOrderItem {
                book_id: book.id,
                quantity,
                price: book.price,
            });
        }

        let order = tx
            .insert_order(NewOrder {
                customer_id: customer.id,
                total_amount: total,
                status: OrderStatus::Pending,
                shipping_address: cmd.shipping_address.or(customer.address),
                items,
            })
            .await?;

        tx.commit().await?;
        Ok(order.into())
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, id: OrderId) -> Result<OrderDto, DomainError> {
        self.store
            .get_order(id)
            .await?
            .map(OrderDto::from)
            .ok_or_else(|| DomainError::not_found("Order", "id", id))
    }

    /// Every order, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<OrderDto>, DomainError> {
        self.query(OrderQuery::new()).await
    }

    /// A customer's orders, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn get_customer_orders(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<OrderDto>, DomainError> {
        if self.store.get_customer(customer_id).await?.is_none() {
            return Err(DomainError::not_found("Customer", "id", customer_id));
        }
        self.query(OrderQuery::for_customer(customer_id)).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_orders_by_status(
        &self,
        status: OrderStatus,
    ) -> Result<Vec<OrderDto>, DomainError> {
        self.query(OrderQuery::new().status(status)).await
    }

    /// Moves an order to `status`.
    ///
    /// Cancelling returns every line's quantity to its book's stock.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<OrderDto, DomainError> {
        let mut tx = self.store.begin().await?;

        let mut order = tx
            .lock_order(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Order", "id", id))?;

        if !order.status.can_transition_to(status) {
            return Err(DomainError::invalid(format!(
                "Cannot change order status from {} to {}",
                order.status, status
            )));
        }

        if status == OrderStatus::Cancelled {
            lock_in_id_order(tx.as_mut(), order.items.iter().map(|item| item.book_id)).await?;
            for item in &order.items {
                let book = tx
                    .lock_book(item.book_id)
                    .await?
                    .ok_or_else(|| DomainError::not_found("Book", "id", item.book_id))?;
                tx.set_book_stock(
                    book.id,
                    book.stock_quantity.saturating_add_unsigned(item.quantity),
                )
                .await?;
            }
        }

        tx.set_order_status(id, status).await?;
        tx.commit().await?;

        metrics::counter!("order_status_changes_total", "status" => status.as_str()).increment(1);
        tracing::info!(order_id = %id, from = %order.status, to = %status, "order status changed");

        order.status = status;
        Ok(order.into())
    }

    async fn query(&self, query: OrderQuery) -> Result<Vec<OrderDto>, DomainError> {
        Ok(self
            .store
            .query_orders(query)
            .await?
            .into_iter()
            .map(OrderDto::from)
            .collect())
    }
}

/// Takes the row lock on every distinct book, lowest id first.
///
/// Concurrent transactions touching the same books then acquire their locks
/// in the same sequence and cannot deadlock. Missing books are skipped here
/// and reported by the caller in line order.
async fn lock_in_id_order(
    tx: &mut dyn StoreTransaction,
    book_ids: impl Iterator<Item = BookId>,
) -> Result<(), DomainError> {
    for book_id in lock_sequence(book_ids) {
        tx.lock_book(book_id).await?;
    }
    Ok(())
}

fn lock_sequence(book_ids: impl Iterator<Item = BookId>) -> Vec<BookId> {
    let mut ids: Vec<BookId> = book_ids.collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}
