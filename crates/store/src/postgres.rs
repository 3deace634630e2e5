use std::collections::HashMap;

use async_trait::async_trait;
use common::{BookId, CustomerId, Money, OrderId, OrderItemId, OrderStatus};
use sqlx::{PgConnection, PgPool, Postgres, Row, Transaction, postgres::PgRow};
use uuid::Uuid;

use crate::{
    Book, BookQuery, Customer, NewBook, NewCustomer, NewOrder, Order, OrderItem, OrderQuery,
    Result, StoreError,
    model::now,
    store::{BookstoreStore, StoreTransaction},
};

const BOOK_COLUMNS: &str =
    "id, title, author, isbn, category, price_cents, stock_quantity, description";

const CUSTOMER_COLUMNS: &str =
    "id, first_name, last_name, email, phone_number, address, created_at, updated_at";

/// PostgreSQL-backed store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }
}

/// Turns constraint violations into their dedicated variants.
fn map_db_error(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = e
        && let Some(constraint) = db_err.constraint()
    {
        if db_err.is_unique_violation() {
            return StoreError::UniqueViolation {
                constraint: constraint.to_string(),
            };
        }
        if db_err.is_foreign_key_violation() {
            return StoreError::ForeignKeyViolation {
                constraint: constraint.to_string(),
            };
        }
    }
    StoreError::Database(e)
}

/// Escapes LIKE wildcards so user input only ever matches literally.
fn like_pattern(text: &str) -> String {
    let escaped = text
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn row_to_book(row: &PgRow) -> Result<Book> {
    Ok(Book {
        id: BookId::from_uuid(row.try_get::<Uuid, _>("id")?),
        title: row.try_get("title")?,
        author: row.try_get("author")?,
        isbn: row.try_get("isbn")?,
        category: row.try_get("category")?,
        price: Money::from_cents(row.try_get("price_cents")?),
        stock_quantity: row.try_get("stock_quantity")?,
        description: row.try_get("description")?,
    })
}

fn row_to_customer(row: &PgRow) -> Result<Customer> {
    Ok(Customer {
        id: CustomerId::from_uuid(row.try_get::<Uuid, _>("id")?),
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        email: row.try_get("email")?,
        phone_number: row.try_get("phone_number")?,
        address: row.try_get("address")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_order_item(row: &PgRow) -> Result<OrderItem> {
    let quantity: i32 = row.try_get("quantity")?;
    Ok(OrderItem {
        id: OrderItemId::from_uuid(row.try_get::<Uuid, _>("id")?),
        order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
        book_id: BookId::from_uuid(row.try_get::<Uuid, _>("book_id")?),
        book_title: row.try_get("title")?,
        quantity: u32::try_from(quantity)
            .map_err(|_| StoreError::CorruptRow(format!("negative quantity {quantity}")))?,
        price: Money::from_cents(row.try_get("price_cents")?),
    })
}

fn row_to_order(row: &PgRow, items: &mut HashMap<Uuid, Vec<OrderItem>>) -> Result<Order> {
    let id: Uuid = row.try_get("id")?;
    let first_name: String = row.try_get("first_name")?;
    let last_name: String = row.try_get("last_name")?;
    let status: String = row.try_get("status")?;

    Ok(Order {
        id: OrderId::from_uuid(id),
        customer_id: CustomerId::from_uuid(row.try_get::<Uuid, _>("customer_id")?),
        customer_name: format!("{first_name} {last_name}"),
        total_amount: Money::from_cents(row.try_get("total_amount_cents")?),
        status: status
            .parse::<OrderStatus>()
            .map_err(|e| StoreError::CorruptRow(e.to_string()))?,
        shipping_address: row.try_get("shipping_address")?,
        order_date: row.try_get("order_date")?,
        items: items.remove(&id).unwrap_or_default(),
    })
}

async fn fetch_book(conn: &mut PgConnection, id: BookId, for_update: bool) -> Result<Option<Book>> {
    let lock = if for_update { " FOR UPDATE" } else { "" };
    let sql = format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = $1{lock}");

    let row = sqlx::query(&sql)
        .bind(id.as_uuid())
        .fetch_optional(&mut *conn)
        .await?;

    row.as_ref().map(row_to_book).transpose()
}

async fn fetch_customer(conn: &mut PgConnection, id: CustomerId) -> Result<Option<Customer>> {
    let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1");

    let row = sqlx::query(&sql)
        .bind(id.as_uuid())
        .fetch_optional(&mut *conn)
        .await?;

    row.as_ref().map(row_to_customer).transpose()
}

async fn fetch_orders(conn: &mut PgConnection, query: &OrderQuery) -> Result<Vec<Order>> {
    let mut sql = String::from(
        r#"
        SELECT o.id, o.customer_id, c.first_name, c.last_name, o.total_amount_cents,
               o.status, o.shipping_address, o.order_date
        FROM orders o
        JOIN customers c ON c.id = o.customer_id
        WHERE 1=1"#,
    );
    let mut param_count = 0;

    // Build dynamic query
    if query.order_id.is_some() {
        param_count += 1;
        sql.push_str(&format!(" AND o.id = ${param_count}"));
    }
    if query.customer_id.is_some() {
        param_count += 1;
        sql.push_str(&format!(" AND o.customer_id = ${param_count}"));
    }
    if query.status.is_some() {
        param_count += 1;
        sql.push_str(&format!(" AND o.status = ${param_count}"));
    }
    sql.push_str(" ORDER BY o.order_date DESC, o.id DESC");

    let mut sqlx_query = sqlx::query(&sql);
    if let Some(id) = query.order_id {
        sqlx_query = sqlx_query.bind(id.as_uuid());
    }
    if let Some(id) = query.customer_id {
        sqlx_query = sqlx_query.bind(id.as_uuid());
    }
    if let Some(status) = query.status {
        sqlx_query = sqlx_query.bind(status.as_str());
    }

    let rows = sqlx_query.fetch_all(&mut *conn).await?;
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let order_ids = rows
        .iter()
        .map(|row| row.try_get::<Uuid, _>("id"))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let item_rows = sqlx::query(
        r#"
        SELECT oi.id, oi.order_id, oi.book_id, b.title, oi.quantity, oi.price_cents
        FROM order_items oi
        JOIN books b ON b.id = oi.book_id
        WHERE oi.order_id = ANY($1)
        ORDER BY oi.order_id, oi.line_number
        "#,
    )
    .bind(order_ids)
    .fetch_all(&mut *conn)
    .await?;

    let mut items: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
    for row in &item_rows {
        let item = row_to_order_item(row)?;
        items.entry(item.order_id.as_uuid()).or_default().push(item);
    }

    rows.iter().map(|row| row_to_order(row, &mut items)).collect()
}

#[async_trait]
impl BookstoreStore for PostgresStore {
    async fn insert_book(&self, book: NewBook) -> Result<Book> {
        let book = book.into_book(BookId::new());

        sqlx::query(
            r#"
            INSERT INTO books (id, title, author, isbn, category, price_cents, stock_quantity, description)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(book.id.as_uuid())
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.isbn)
        .bind(&book.category)
        .bind(book.price.cents())
        .bind(book.stock_quantity)
        .bind(&book.description)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(book)
    }

    async fn get_book(&self, id: BookId) -> Result<Option<Book>> {
        let mut conn = self.pool.acquire().await?;
        fetch_book(&mut conn, id, false).await
    }

    async fn get_book_by_isbn(&self, isbn: &str) -> Result<Option<Book>> {
        let sql = format!("SELECT {BOOK_COLUMNS} FROM books WHERE isbn = $1");
        let row = sqlx::query(&sql)
            .bind(isbn)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_book).transpose()
    }

    async fn update_book(&self, id: BookId, book: NewBook) -> Result<Option<Book>> {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET title = $2, author = $3, isbn = $4, category = $5,
                price_cents = $6, stock_quantity = $7, description = $8
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.isbn)
        .bind(&book.category)
        .bind(book.price.cents())
        .bind(book.stock_quantity)
        .bind(&book.description)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(Some(book.into_book(id)))
    }

    async fn delete_book(&self, id: BookId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn query_books(&self, query: BookQuery) -> Result<Vec<Book>> {
        let mut sql = format!("SELECT {BOOK_COLUMNS} FROM books WHERE 1=1");
        let mut param_count = 0;

        // Build dynamic query
        if query.author_contains.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND author ILIKE ${param_count}"));
        }
        if query.title_contains.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND title ILIKE ${param_count}"));
        }
        if query.category.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND category = ${param_count}"));
        }
        if query.min_price.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND price_cents >= ${param_count}"));
        }
        if query.max_price.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND price_cents <= ${param_count}"));
        }
        if query.stock_below.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND stock_quantity < ${param_count}"));
        }
        if query.stock_above.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND stock_quantity > ${param_count}"));
        }

        sql.push_str(r#" ORDER BY title COLLATE "C" ASC, id ASC"#);

        // Build and execute query with parameters
        let mut sqlx_query = sqlx::query(&sql);

        if let Some(author) = &query.author_contains {
            sqlx_query = sqlx_query.bind(like_pattern(author));
        }
        if let Some(title) = &query.title_contains {
            sqlx_query = sqlx_query.bind(like_pattern(title));
        }
        if let Some(category) = query.category {
            sqlx_query = sqlx_query.bind(category);
        }
        if let Some(min) = query.min_price {
            sqlx_query = sqlx_query.bind(min.cents());
        }
        if let Some(max) = query.max_price {
            sqlx_query = sqlx_query.bind(max.cents());
        }
        if let Some(threshold) = query.stock_below {
            sqlx_query = sqlx_query.bind(threshold);
        }
        if let Some(quantity) = query.stock_above {
            sqlx_query = sqlx_query.bind(quantity);
        }

        let rows = sqlx_query.fetch_all(&self.pool).await?;
        rows.iter().map(row_to_book).collect()
    }

    async fn insert_customer(&self, customer: NewCustomer) -> Result<Customer> {
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

        sqlx::query(
            r#"
            INSERT INTO customers (id, first_name, last_name, email, phone_number, address, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(customer.id.as_uuid())
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .bind(&customer.email)
        .bind(&customer.phone_number)
        .bind(&customer.address)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(customer)
    }

    async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>> {
        let mut conn = self.pool.acquire().await?;
        fetch_customer(&mut conn, id).await
    }

    async fn get_customer_by_email(&self, email: &str) -> Result<Option<Customer>> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE email = $1");
        let row = sqlx::query(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_customer).transpose()
    }

    async fn list_customers(&self) -> Result<Vec<Customer>> {
        let sql = format!(
            r#"SELECT {CUSTOMER_COLUMNS} FROM customers
               ORDER BY last_name COLLATE "C", first_name COLLATE "C", id"#
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(row_to_customer).collect()
    }

    async fn update_customer(
        &self,
        id: CustomerId,
        customer: NewCustomer,
    ) -> Result<Option<Customer>> {
        let sql = format!(
            r#"
            UPDATE customers
            SET first_name = $2, last_name = $3, email = $4, phone_number = $5,
                address = $6, updated_at = $7
            WHERE id = $1
            RETURNING {CUSTOMER_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .bind(&customer.first_name)
            .bind(&customer.last_name)
            .bind(&customer.email)
            .bind(&customer.phone_number)
            .bind(&customer.address)
            .bind(now())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?;

        row.as_ref().map(row_to_customer).transpose()
    }

    async fn delete_customer(&self, id: CustomerId) -> Result<bool> {
        // orders and order_items go with it via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn query_orders(&self, query: OrderQuery) -> Result<Vec<Order>> {
        let mut conn = self.pool.acquire().await?;
        fetch_orders(&mut conn, &query).await
    }

    async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PostgresTransaction { tx }))
    }
}

/// Transaction over a [`PostgresStore`]; rolls back when dropped uncommitted.
pub struct PostgresTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTransaction for PostgresTransaction {
    async fn get_customer(&mut self, id: CustomerId) -> Result<Option<Customer>> {
        fetch_customer(&mut self.tx, id).await
    }

    async fn lock_book(&mut self, id: BookId) -> Result<Option<Book>> {
        fetch_book(&mut self.tx, id, true).await
    }

    async fn set_book_stock(&mut self, id: BookId, stock_quantity: i32) -> Result<()> {
        sqlx::query("UPDATE books SET stock_quantity = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(stock_quantity)
            .execute(&mut *self.tx)
            .await
            .map_err(map_db_error)?;

        Ok(())
    }

    async fn insert_order(&mut self, order: NewOrder) -> Result<Order> {
        let order_id = OrderId::new();

        sqlx::query(
            r#"
            INSERT INTO orders (id, customer_id, total_amount_cents, status, shipping_address, order_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(order_id.as_uuid())
        .bind(order.customer_id.as_uuid())
        .bind(order.total_amount.cents())
        .bind(order.status.as_str())
        .bind(&order.shipping_address)
        .bind(now())
        .execute(&mut *self.tx)
        .await
        .map_err(map_db_error)?;

        for (line_number, item) in order.items.iter().enumerate() {
            let line_number = i32::try_from(line_number)
                .map_err(|_| StoreError::CorruptRow("too many order lines".to_string()))?;
            let quantity = i32::try_from(item.quantity)
                .map_err(|_| StoreError::CorruptRow(format!("quantity {}", item.quantity)))?;

            sqlx::query(
                r#"
                INSERT INTO order_items (id, order_id, book_id, line_number, quantity, price_cents)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(OrderItemId::new().as_uuid())
            .bind(order_id.as_uuid())
            .bind(item.book_id.as_uuid())
            .bind(line_number)
            .bind(quantity)
            .bind(item.price.cents())
            .execute(&mut *self.tx)
            .await
            .map_err(map_db_error)?;
        }

        fetch_orders(&mut self.tx, &OrderQuery::for_order(order_id))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::CorruptRow(format!("order {order_id} vanished")))
    }

    async fn lock_order(&mut self, id: OrderId) -> Result<Option<Order>> {
        let locked = sqlx::query("SELECT id FROM orders WHERE id = $1 FOR UPDATE")
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await?;
        if locked.is_none() {
            return Ok(None);
        }

        Ok(fetch_orders(&mut self.tx, &OrderQuery::for_order(id))
            .await?
            .into_iter()
            .next())
    }

    async fn set_order_status(&mut self, id: OrderId, status: OrderStatus) -> Result<()> {
        sqlx::query("UPDATE orders SET status = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(status.as_str())
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
