//! Customer registration and maintenance.

use chrono::{DateTime, Utc};
use common::CustomerId;
use serde::{Deserialize, Serialize};
use store::{BookstoreStore, Customer, NewCustomer, UNIQUE_CUSTOMER_EMAIL};

use crate::error::DomainError;
use crate::validation::{EMAIL_PATTERN, PHONE_PATTERN, Validator};

/// Incoming customer fields for create and update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRequest {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, alias = "phone")]
    pub phone_number: String,
    pub address: Option<String>,
}

impl CustomerRequest {
    /// Checks every field constraint and returns the column values.
    pub fn validate(self) -> Result<NewCustomer, DomainError> {
        Validator::new()
            .not_blank("firstName", &self.first_name, "First name is required")
            .max_len(
                "firstName",
                &self.first_name,
                50,
                "First name cannot exceed 50 characters",
            )
            .not_blank("lastName", &self.last_name, "Last name is required")
            .max_len(
                "lastName",
                &self.last_name,
                50,
                "Last name cannot exceed 50 characters",
            )
            .not_blank("email", &self.email, "Email is required")
            .pattern("email", &self.email, &EMAIL_PATTERN, "Invalid email format")
            .max_len("email", &self.email, 100, "Email cannot exceed 100 characters")
            .not_blank("phoneNumber", &self.phone_number, "Phone number is required")
            .pattern(
                "phoneNumber",
                &self.phone_number,
                &PHONE_PATTERN,
                "Invalid phone number format",
            )
            .max_len(
                "phoneNumber",
                &self.phone_number,
                20,
                "Phone number cannot exceed 20 characters",
            )
            .max_len_opt(
                "address",
                self.address.as_deref(),
                200,
                "Address cannot exceed 200 characters",
            )
            .finish()?;

        Ok(NewCustomer {
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone_number: self.phone_number,
            address: self.address,
        })
    }
}

/// A customer as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDto {
    pub id: CustomerId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Customer> for CustomerDto {
    fn from(customer: Customer) -> Self {
        Self {
            id: customer.id,
            first_name: customer.first_name,
            last_name: customer.last_name,
            email: customer.email,
            phone_number: customer.phone_number,
            address: customer.address,
            created_at: customer.created_at,
            updated_at: customer.updated_at,
        }
    }
}

fn email_taken(email: &str) -> DomainError {
    DomainError::invalid(format!("Email already exists: {email}"))
}

/// Service for managing customers.
pub struct CustomerService<S: BookstoreStore> {
    store: S,
}

impl<S: BookstoreStore> CustomerService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn create_customer(
        &self,
        request: CustomerRequest,
    ) -> Result<CustomerDto, DomainError> {
        let new_customer = request.validate()?;

        if self
            .store
            .get_customer_by_email(&new_customer.email)
            .await?
            .is_some()
        {
            return Err(email_taken(&new_customer.email));
        }

        let email = new_customer.email.clone();
        let customer = self
            .store
            .insert_customer(new_customer)
            .await
            .map_err(|e| match e {
                e if e.is_unique_violation(UNIQUE_CUSTOMER_EMAIL) => email_taken(&email),
                e => e.into(),
            })?;

        metrics::counter!("customers_created_total").increment(1);
        tracing::info!(customer_id = %customer.id, "customer created");
        Ok(customer.into())
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_customer(&self, id: CustomerId) -> Result<CustomerDto, DomainError> {
        self.store
            .get_customer(id)
            .await?
            .map(CustomerDto::from)
            .ok_or_else(|| DomainError::not_found("Customer", "id", id))
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_customer_by_email(&self, email: &str) -> Result<CustomerDto, DomainError> {
        self.store
            .get_customer_by_email(email)
            .await?
            .map(CustomerDto::from)
            .ok_or_else(|| DomainError::not_found("Customer", "email", email))
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_customers(&self) -> Result<Vec<CustomerDto>, DomainError> {
        Ok(self
            .store
            .list_customers()
            .await?
            .into_iter()
            .map(CustomerDto::from)
            .collect())
    }

    /// Replaces every field of an existing customer.
    ///
    /// Keeping the current email is allowed; taking another customer's is not.
    #[tracing::instrument(skip(self, request))]
    pub async fn update_customer(
        &self,
        id: CustomerId,
        request: CustomerRequest,
    ) -> Result<CustomerDto, DomainError> {
        let existing = self
            .store
            .get_customer(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Customer", "id", id))?;

        let new_customer = request.validate()?;
        if existing.email != new_customer.email
            && self
                .store
                .get_customer_by_email(&new_customer.email)
                .await?
                .is_some()
        {
            return Err(email_taken(&new_customer.email));
        }

        let email = new_customer.email.clone();
        let updated = self
            .store
            .update_customer(id, new_customer)
            .await
            .map_err(|e| match e {
                e if e.is_unique_violation(UNIQUE_CUSTOMER_EMAIL) => email_taken(&email),
                e => e.into(),
            })?
            .ok_or_else(|| DomainError::not_found("Customer", "id", id))?;

        tracing::info!(customer_id = %updated.id, "customer updated");
        Ok(updated.into())
    }

    /// Deletes a customer together with their orders.
    #[tracing::instrument(skip(self))]
    pub async fn delete_customer(&self, id: CustomerId) -> Result<(), DomainError> {
        if !self.store.delete_customer(id).await? {
            return Err(DomainError::not_found("Customer", "id", id));
        }
        tracing::info!(customer_id = %id, "customer deleted");
        Ok(())
    }
}
