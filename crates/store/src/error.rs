use thiserror::Error;

/// Constraint name: books.isbn is unique.
pub const UNIQUE_BOOK_ISBN: &str = "unique_book_isbn";
/// Constraint name: customers.email is unique.
pub const UNIQUE_CUSTOMER_EMAIL: &str = "unique_customer_email";
/// Constraint name: orders.customer_id references customers.
pub const FK_ORDERS_CUSTOMER: &str = "fk_orders_customer";
/// Constraint name: order_items.book_id references books.
pub const FK_ORDER_ITEMS_BOOK: &str = "fk_order_items_book";

/// Errors that can occur when interacting with the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write.
    #[error("Unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    /// A foreign key constraint rejected the write or delete.
    #[error("Foreign key constraint violated: {constraint}")]
    ForeignKeyViolation { constraint: String },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored value could not be mapped back into a record.
    #[error("Corrupt row: {0}")]
    CorruptRow(String),
}

impl StoreError {
    /// Returns true if this is a unique violation of the named constraint.
    pub fn is_unique_violation(&self, name: &str) -> bool {
        matches!(self, StoreError::UniqueViolation { constraint } if constraint == name)
    }

    /// Returns true if this is a foreign key violation of the named constraint.
    pub fn is_foreign_key_violation(&self, name: &str) -> bool {
        matches!(self, StoreError::ForeignKeyViolation { constraint } if constraint == name)
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_predicates_match_by_name() {
        let err = StoreError::UniqueViolation {
            constraint: UNIQUE_CUSTOMER_EMAIL.to_string(),
        };
        assert!(err.is_unique_violation(UNIQUE_CUSTOMER_EMAIL));
        assert!(!err.is_unique_violation(UNIQUE_BOOK_ISBN));
        assert!(!err.is_foreign_key_violation(UNIQUE_CUSTOMER_EMAIL));
    }
}
