use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use common::{BookId, CustomerId, Money, OrderId, OrderItemId, OrderStatus};
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};

use crate::{
    Book, BookQuery, Customer, NewBook, NewCustomer, NewOrder, Order, OrderItem, OrderQuery,
    Result, StoreError,
    error::{FK_ORDER_ITEMS_BOOK, FK_ORDERS_CUSTOMER, UNIQUE_BOOK_ISBN, UNIQUE_CUSTOMER_EMAIL},
    model::now,
    store::{BookstoreStore, StoreTransaction},
};

/// In-memory store implementation for tests and database-less runs.
///
/// Enforces the same unique and foreign key rules as the PostgreSQL schema,
/// including cascading customer deletes. A transaction takes the write lock
/// for its whole lifetime and works on a private copy of the tables, which
/// replaces the shared tables on commit.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.tables.read().await.orders.len()
    }

    /// Returns the number of stored order items.
    pub async fn order_item_count(&self) -> usize {
        self.tables.read().await.order_items.len()
    }
}

#[derive(Debug, Clone)]
struct OrderRow {
    id: OrderId,
    customer_id: CustomerId,
    total_amount: Money,
    status: OrderStatus,
    shipping_address: Option<String>,
    order_date: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone)]
struct OrderItemRow {
    id: OrderItemId,
    order_id: OrderId,
    book_id: BookId,
    quantity: u32,
    price: Money,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    books: HashMap<BookId, Book>,
    customers: HashMap<CustomerId, Customer>,
    orders: HashMap<OrderId, OrderRow>,
    // Insertion order doubles as line order.
    order_items: Vec<OrderItemRow>,
}

fn unique_violation(constraint: &str) -> StoreError {
    StoreError::UniqueViolation {
        constraint: constraint.to_string(),
    }
}

fn foreign_key_violation(constraint: &str) -> StoreError {
    StoreError::ForeignKeyViolation {
        constraint: constraint.to_string(),
    }
}

impl Tables {
    fn insert_book(&mut self, book: NewBook) -> Result<Book> {
        if self.books.values().any(|b| b.isbn == book.isbn) {
            return Err(unique_violation(UNIQUE_BOOK_ISBN));
        }
        let book = book.into_book(BookId::new());
        self.books.insert(book.id, book.clone());
        Ok(book)
    }

    fn update_book(&mut self, id: BookId, book: NewBook) -> Result<Option<Book>> {
        if !self.books.contains_key(&id) {
            return Ok(None);
        }
        if self
            .books
            .values()
            .any(|b| b.id != id && b.isbn == book.isbn)
        {
            return Err(unique_violation(UNIQUE_BOOK_ISBN));
        }
        let book = book.into_book(id);
        self.books.insert(id, book.clone());
        Ok(Some(book))
    }

    fn delete_book(&mut self, id: BookId) -> Result<bool> {
        if !self.books.contains_key(&id) {
            return Ok(false);
        }
        if self.order_items.iter().any(|item| item.book_id == id) {
            return Err(foreign_key_violation(FK_ORDER_ITEMS_BOOK));
        }
        self.books.remove(&id);
        Ok(true)
    }

    fn query_books(&self, query: &BookQuery) -> Vec<Book> {
        let mut books: Vec<_> = self
            .books
            .values()
            .filter(|b| query.matches(b))
            .cloned()
            .collect();
        books.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        books
    }

    fn insert_customer(&mut self, customer: NewCustomer) -> Result<Customer> {
        if self.customers.values().any(|c| c.email == customer.email) {
            return Err(unique_violation(UNIQUE_CUSTOMER_EMAIL));
        }
        let timestamp = now();
        let customer = Customer {
            id: CustomerId::new(),
            first_name: customer.first_name,
            last_name: customer.last_name,
            email: customer.email,
            phone_number: customer.phone_number,
            address: customer.address,
            created_at: timestamp,
            updated_at: timestamp,
        };
        self.customers.insert(customer.id, customer.clone());
        Ok(customer)
    }

    fn update_customer(&mut self, id: CustomerId, update: NewCustomer) -> Result<Option<Customer>> {
        if !self.customers.contains_key(&id) {
            return Ok(None);
        }
        if self
            .customers
            .values()
            .any(|c| c.id != id && c.email == update.email)
        {
            return Err(unique_violation(UNIQUE_CUSTOMER_EMAIL));
        }
        let Some(customer) = self.customers.get_mut(&id) else {
            return Ok(None);
        };
        customer.first_name = update.first_name;
        customer.last_name = update.last_name;
        customer.email = update.email;
        customer.phone_number = update.phone_number;
        customer.address = update.address;
        customer.updated_at = now();
        Ok(Some(customer.clone()))
    }

    fn delete_customer(&mut self, id: CustomerId) -> bool {
        if self.customers.remove(&id).is_none() {
            return false;
        }
        let removed: HashSet<OrderId> = self
            .orders
            .values()
            .filter(|o| o.customer_id == id)
            .map(|o| o.id)
            .collect();
        self.orders.retain(|order_id, _| !removed.contains(order_id));
        self.order_items
            .retain(|item| !removed.contains(&item.order_id));
        true
    }

    fn materialize(&self, row: &OrderRow) -> Result<Order> {
        let customer = self.customers.get(&row.customer_id).ok_or_else(|| {
            StoreError::CorruptRow(format!("order {} has no customer", row.id))
        })?;

        let items = self
            .order_items
            .iter()
            .filter(|item| item.order_id == row.id)
            .map(|item| {
                let book = self.books.get(&item.book_id).ok_or_else(|| {
                    StoreError::CorruptRow(format!("order item {} has no book", item.id))
                })?;
                Ok(OrderItem {
                    id: item.id,
                    order_id: item.order_id,
                    book_id: item.book_id,
                    book_title: book.title.clone(),
                    quantity: item.quantity,
                    price: item.price,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Order {
            id: row.id,
            customer_id: row.customer_id,
            customer_name: customer.full_name(),
            total_amount: row.total_amount,
            status: row.status,
            shipping_address: row.shipping_address.clone(),
            order_date: row.order_date,
            items,
        })
    }

    fn query_orders(&self, query: &OrderQuery) -> Result<Vec<Order>> {
        let mut orders = self
            .orders
            .values()
            .map(|row| self.materialize(row))
            .filter(|order| order.as_ref().map_or(true, |o| query.matches(o)))
            .collect::<Result<Vec<_>>>()?;
        orders.sort_by(|a, b| b.order_date.cmp(&a.order_date).then(b.id.cmp(&a.id)));
        Ok(orders)
    }

    fn insert_order(&mut self, order: NewOrder) -> Result<Order> {
        if !self.customers.contains_key(&order.customer_id) {
            return Err(foreign_key_violation(FK_ORDERS_CUSTOMER));
        }
        if order
            .items
            .iter()
            .any(|item| !self.books.contains_key(&item.book_id))
        {
            return Err(foreign_key_violation(FK_ORDER_ITEMS_BOOK));
        }

        let row = OrderRow {
            id: OrderId::new(),
            customer_id: order.customer_id,
            total_amount: order.total_amount,
            status: order.status,
            shipping_address: order.shipping_address,
            order_date: now(),
        };
        self.order_items
            .extend(order.items.into_iter().map(|item| OrderItemRow {
                id: OrderItemId::new(),
                order_id: row.id,
                book_id: item.book_id,
                quantity: item.quantity,
                price: item.price,
            }));
        let stored = self.materialize(&row)?;
        self.orders.insert(row.id, row);
        Ok(stored)
    }
}

#[async_trait]
impl BookstoreStore for InMemoryStore {
    async fn insert_book(&self, book: NewBook) -> Result<Book> {
        self.tables.write().await.insert_book(book)
    }

    async fn get_book(&self, id: BookId) -> Result<Option<Book>> {
        Ok(self.tables.read().await.books.get(&id).cloned())
    }

    async fn get_book_by_isbn(&self, isbn: &str) -> Result<Option<Book>> {
        let tables = self.tables.read().await;
        Ok(tables.books.values().find(|b| b.isbn == isbn).cloned())
    }

    async fn update_book(&self, id: BookId, book: NewBook) -> Result<Option<Book>> {
        self.tables.write().await.update_book(id, book)
    }

    async fn delete_book(&self, id: BookId) -> Result<bool> {
        self.tables.write().await.delete_book(id)
    }

    async fn query_books(&self, query: BookQuery) -> Result<Vec<Book>> {
        Ok(self.tables.read().await.query_books(&query))
    }

    async fn insert_customer(&self, customer: NewCustomer) -> Result<Customer> {
        self.tables.write().await.insert_customer(customer)
    }

    async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>> {
        Ok(self.tables.read().await.customers.get(&id).cloned())
    }

    async fn get_customer_by_email(&self, email: &str) -> Result<Option<Customer>> {
        let tables = self.tables.read().await;
        Ok(tables.customers.values().find(|c| c.email == email).cloned())
    }

    async fn list_customers(&self) -> Result<Vec<Customer>> {
        let tables = self.tables.read().await;
        let mut customers: Vec<_> = tables.customers.values().cloned().collect();
        customers.sort_by(|a, b| {
            a.last_name
                .cmp(&b.last_name)
                .then_with(|| a.first_name.cmp(&b.first_name))
                .then(a.id.cmp(&b.id))
        });
        Ok(customers)
    }

    async fn update_customer(
        &self,
        id: CustomerId,
        customer: NewCustomer,
    ) -> Result<Option<Customer>> {
        self.tables.write().await.update_customer(id, customer)
    }

    async fn delete_customer(&self, id: CustomerId) -> Result<bool> {
        Ok(self.tables.write().await.delete_customer(id))
    }

    async fn query_orders(&self, query: OrderQuery) -> Result<Vec<Order>> {
        self.tables.read().await.query_orders(&query)
    }

    async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
        let guard = self.tables.clone().write_owned().await;
        let staged = guard.clone();
        Ok(Box::new(InMemoryTransaction { guard, staged }))
    }
}

/// Transaction over an [`InMemoryStore`].
pub struct InMemoryTransaction {
    guard: OwnedRwLockWriteGuard<Tables>,
    staged: Tables,
}

#[async_trait]
impl StoreTransaction for InMemoryTransaction {
    async fn get_customer(&mut self, id: CustomerId) -> Result<Option<Customer>> {
        Ok(self.staged.customers.get(&id).cloned())
    }

    async fn lock_book(&mut self, id: BookId) -> Result<Option<Book>> {
        Ok(self.staged.books.get(&id).cloned())
    }

    async fn set_book_stock(&mut self, id: BookId, stock_quantity: i32) -> Result<()> {
        if let Some(book) = self.staged.books.get_mut(&id) {
            book.stock_quantity = stock_quantity;
        }
        Ok(())
    }

    async fn insert_order(&mut self, order: NewOrder) -> Result<Order> {
        self.staged.insert_order(order)
    }

    async fn lock_order(&mut self, id: OrderId) -> Result<Option<Order>> {
        self.staged
            .orders
            .get(&id)
            .map(|row| self.staged.materialize(row))
            .transpose()
    }

    async fn set_order_status(&mut self, id: OrderId, status: OrderStatus) -> Result<()> {
        if let Some(row) = self.staged.orders.get_mut(&id) {
            row.status = status;
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let InMemoryTransaction { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }
}
