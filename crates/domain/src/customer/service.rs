//! Customer service.

use std::sync::Arc;

use common::CustomerId;
use metrics::counter;
use record_store::{CustomerRecord, Filter, Paged, RecordStore};

use crate::error::{DomainError, Result, write_error};
use crate::listing::{Page, page_request};

use super::{CreateCustomer, CustomerDetails, CustomerQuery, CustomerSummary, UpdateCustomer};

/// Number of recent orders attached to a single-customer view.
const RECENT_ORDER_LIMIT: u64 = 5;

/// Fields the customer search term matches against.
const SEARCH_FIELDS: &[&str] = &["name", "email", "phone"];

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(DomainError::invalid_input("name must not be empty"));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<()> {
    let ok = email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty()
            && domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.')
    });
    if !ok {
        return Err(DomainError::invalid_input(format!(
            "'{email}' is not a valid email address"
        )));
    }
    Ok(())
}

/// Service for managing customers.
pub struct CustomerService<S: RecordStore> {
    store: Arc<S>,
}

impl<S: RecordStore> CustomerService<S> {
    /// Creates a new customer service over the given store.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Creates a customer. Email uniqueness is enforced by the store.
    #[tracing::instrument(skip(self, cmd), fields(email = %cmd.email))]
    pub async fn create(&self, cmd: CreateCustomer) -> Result<CustomerRecord> {
        validate_name(&cmd.name)?;
        validate_email(&cmd.email)?;

        let record = CustomerRecord::new(cmd.name, cmd.email, cmd.phone, cmd.address);

        let mut tx = self.store.begin().await?;
        if let Err(err) = tx.insert_customer(&record).await.map_err(write_error) {
            let _ = tx.rollback().await;
            return Err(err);
        }
        tx.commit().await.map_err(write_error)?;

        counter!("customers_created_total").increment(1);
        tracing::info!(customer_id = %record.id, "customer created");
        Ok(record)
    }

    /// Lists customers newest first, each row augmented with its order
    /// count and lifetime spend.
    #[tracing::instrument(skip(self))]
    pub async fn find_all(&self, query: CustomerQuery) -> Result<Page<CustomerSummary>> {
        let request = page_request(query.page, query.limit)?;
        let mut filter = Filter::new();
        if let Some(term) = &query.search {
            filter = filter.search(SEARCH_FIELDS, term);
        }

        let paged = self.store.list_customers(&filter, request).await?;
        let total = paged.total;

        let mut rows = Vec::with_capacity(paged.rows.len());
        for customer in paged.rows {
            let stats = self.store.customer_order_stats(customer.id).await?;
            rows.push(CustomerSummary {
                customer,
                orders_count: stats.order_count,
                total_spent: stats.total_spent,
            });
        }
        Ok(Page::new(Paged { rows, total }, request))
    }

    /// Fetches one customer with order figures and their recent orders.
    #[tracing::instrument(skip(self))]
    pub async fn find_one(&self, id: CustomerId) -> Result<CustomerDetails> {
        let customer = self
            .store
            .get_customer(id)
            .await?
            .ok_or_else(|| DomainError::not_found("customer", id))?;

        let stats = self.store.customer_order_stats(id).await?;
        let recent_orders = self
            .store
            .recent_orders_for_customer(id, RECENT_ORDER_LIMIT)
            .await?;

        Ok(CustomerDetails {
            customer,
            orders_count: stats.order_count,
            total_spent: stats.total_spent,
            recent_orders,
        })
    }

    /// Patches a customer's fields.
    #[tracing::instrument(skip(self, cmd))]
    pub async fn update(&self, id: CustomerId, cmd: UpdateCustomer) -> Result<CustomerRecord> {
        let mut customer = self
            .store
            .get_customer(id)
            .await?
            .ok_or_else(|| DomainError::not_found("customer", id))?;

        if let Some(name) = cmd.name {
            validate_name(&name)?;
            customer.name = name;
        }
        if let Some(email) = cmd.email {
            validate_email(&email)?;
            customer.email = email;
        }
        if let Some(phone) = cmd.phone {
            customer.phone = Some(phone);
        }
        if let Some(address) = cmd.address {
            customer.address = Some(address);
        }
        customer.touch();

        let mut tx = self.store.begin().await?;
        if let Err(err) = tx.update_customer(&customer).await.map_err(write_error) {
            let _ = tx.rollback().await;
            return Err(err);
        }
        tx.commit().await.map_err(write_error)?;

        tracing::info!(customer_id = %customer.id, "customer updated");
        Ok(customer)
    }

    /// Deletes a customer, refusing while any order still references them.
    #[tracing::instrument(skip(self))]
    pub async fn remove(&self, id: CustomerId) -> Result<()> {
        let customer = self
            .store
            .get_customer(id)
            .await?
            .ok_or_else(|| DomainError::not_found("customer", id))?;

        let dependents = self.store.count_orders_for_customer(id).await?;
        if dependents > 0 {
            return Err(DomainError::Conflict {
                entity: "customer",
                id: id.to_string(),
                dependents,
                dependent_noun: "orders",
            });
        }

        let mut tx = self.store.begin().await?;
        if let Err(err) = tx.delete_customer(id).await.map_err(write_error) {
            let _ = tx.rollback().await;
            return Err(err);
        }
        tx.commit().await.map_err(write_error)?;

        counter!("customers_deleted_total").increment(1);
        tracing::info!(customer_id = %id, email = %customer.email, "customer deleted");
        Ok(())
    }
}
