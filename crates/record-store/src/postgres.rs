//! PostgreSQL backend.
//!
//! Queries are built at runtime: a [`Filter`] compiles to an `ILIKE`
//! OR-group plus AND-ed equality clauses, and listings run the count and
//! the page select inside one transaction so both see the same snapshot.

use async_trait::async_trait;
use common::{CustomerId, Money, OrderId, OrderItemId, ProductId};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::filter::{Filter, PageRequest, Paged, TextMatch};
use crate::record::{CustomerRecord, OrderItemRecord, OrderRecord, OrderStatus, ProductRecord};
use crate::store::{CustomerOrderStats, RecordStore, StoreTransaction};

const CUSTOMER_COLUMNS: &str = "id, name, email, phone, address, created_at, updated_at";
const PRODUCT_COLUMNS: &str =
    "id, name, sku, description, price, stock, category, image_url, created_at, updated_at";
const ORDER_COLUMNS: &str =
    "id, order_number, customer_id, status, total, tax, shipping, notes, created_at, updated_at";

/// PostgreSQL-backed record store.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL record store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        tracing::info!("running database migrations");
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_customer(row: PgRow) -> Result<CustomerRecord> {
        Ok(CustomerRecord {
            id: CustomerId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            address: row.try_get("address")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_product(row: PgRow) -> Result<ProductRecord> {
        let stock: i64 = row.try_get("stock")?;
        let stock = u32::try_from(stock).map_err(|_| StoreError::Decode {
            entity: "product",
            message: format!("stock {stock} out of range"),
        })?;

        Ok(ProductRecord {
            id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            sku: row.try_get("sku")?,
            description: row.try_get("description")?,
            price: Money::from_cents(row.try_get("price")?),
            stock,
            category: row.try_get("category")?,
            image_url: row.try_get("image_url")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_order(row: PgRow) -> Result<OrderRecord> {
        let status: String = row.try_get("status")?;
        let status = OrderStatus::parse(&status).ok_or_else(|| StoreError::Decode {
            entity: "order",
            message: format!("unknown status '{status}'"),
        })?;

        Ok(OrderRecord {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            order_number: row.try_get("order_number")?,
            customer_id: CustomerId::from_uuid(row.try_get::<Uuid, _>("customer_id")?),
            status,
            total: Money::from_cents(row.try_get("total")?),
            tax: row.try_get::<Option<i64>, _>("tax")?.map(Money::from_cents),
            shipping: row
                .try_get::<Option<i64>, _>("shipping")?
                .map(Money::from_cents),
            notes: row.try_get("notes")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_order_item(row: PgRow) -> Result<OrderItemRecord> {
        let quantity: i64 = row.try_get("quantity")?;
        let quantity = u32::try_from(quantity).map_err(|_| StoreError::Decode {
            entity: "order_item",
            message: format!("quantity {quantity} out of range"),
        })?;

        Ok(OrderItemRecord {
            id: OrderItemId::from_uuid(row.try_get::<Uuid, _>("id")?),
            order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
            product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
            quantity,
            price: Money::from_cents(row.try_get("price")?),
        })
    }
}

/// Appends the filter's clauses to a WHERE fragment, numbering parameters
/// after `param_count` and collecting their text values in order.
fn append_filter(
    sql: &mut String,
    filter: &Filter,
    param_count: &mut usize,
    binds: &mut Vec<String>,
) {
    let mut push_connective = |sql: &mut String| {
        if sql.is_empty() {
            sql.push_str(" WHERE ");
        } else {
            sql.push_str(" AND ");
        }
    };

    let any_of = filter.any_of();
    if !any_of.is_empty() {
        push_connective(sql);
        sql.push('(');
        for (i, clause) in any_of.iter().enumerate() {
            if i > 0 {
                sql.push_str(" OR ");
            }
            *param_count += 1;
            match &clause.matcher {
                TextMatch::Contains(needle) => {
                    binds.push(format!("%{needle}%"));
                    sql.push_str(&format!("{} ILIKE ${param_count}", clause.field));
                }
                TextMatch::Equals(value) => {
                    binds.push(value.clone());
                    sql.push_str(&format!("{} = ${param_count}", clause.field));
                }
            }
        }
        sql.push(')');
    }

    for clause in filter.all_of() {
        push_connective(sql);
        *param_count += 1;
        match &clause.matcher {
            TextMatch::Contains(needle) => {
                binds.push(format!("%{needle}%"));
                sql.push_str(&format!("{} ILIKE ${param_count}", clause.field));
            }
            TextMatch::Equals(value) => {
                binds.push(value.clone());
                sql.push_str(&format!("{} = ${param_count}", clause.field));
            }
        }
    }
}

/// Maps a unique-constraint database error to a typed violation.
fn unique_violation(
    err: sqlx::Error,
    constraint: &'static str,
    entity: &'static str,
    field: &'static str,
    value: &str,
) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.constraint() == Some(constraint)
    {
        return StoreError::UniqueViolation {
            entity,
            field,
            value: value.to_string(),
        };
    }
    StoreError::Database(err)
}

#[async_trait]
impl RecordStore for PostgresStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgStoreTransaction { tx }))
    }

    async fn get_customer(&self, id: CustomerId) -> Result<Option<CustomerRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_customer).transpose()
    }

    async fn list_customers(
        &self,
        filter: &Filter,
        page: PageRequest,
    ) -> Result<Paged<CustomerRecord>> {
        let mut where_sql = String::new();
        let mut param_count = 0;
        let mut binds = Vec::new();
        append_filter(&mut where_sql, filter, &mut param_count, &mut binds);

        let count_sql = format!("SELECT COUNT(*) FROM customers{where_sql}");
        let select_sql = format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers{where_sql} ORDER BY created_at DESC, id DESC LIMIT ${} OFFSET ${}",
            param_count + 1,
            param_count + 2,
        );

        let mut tx = self.pool.begin().await?;

        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        for value in &binds {
            count_query = count_query.bind(value);
        }
        let total = count_query.fetch_one(&mut *tx).await?;

        let mut select_query = sqlx::query(&select_sql);
        for value in &binds {
            select_query = select_query.bind(value);
        }
        let rows = select_query
            .bind(page.limit() as i64)
            .bind(page.offset() as i64)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Paged {
            rows: rows
                .into_iter()
                .map(Self::row_to_customer)
                .collect::<Result<Vec<_>>>()?,
            total: total as u64,
        })
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<ProductRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn list_products(
        &self,
        filter: &Filter,
        page: PageRequest,
    ) -> Result<Paged<ProductRecord>> {
        let mut where_sql = String::new();
        let mut param_count = 0;
        let mut binds = Vec::new();
        append_filter(&mut where_sql, filter, &mut param_count, &mut binds);

        let count_sql = format!("SELECT COUNT(*) FROM products{where_sql}");
        let select_sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products{where_sql} ORDER BY created_at DESC, id DESC LIMIT ${} OFFSET ${}",
            param_count + 1,
            param_count + 2,
        );

        let mut tx = self.pool.begin().await?;

        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        for value in &binds {
            count_query = count_query.bind(value);
        }
        let total = count_query.fetch_one(&mut *tx).await?;

        let mut select_query = sqlx::query(&select_sql);
        for value in &binds {
            select_query = select_query.bind(value);
        }
        let rows = select_query
            .bind(page.limit() as i64)
            .bind(page.offset() as i64)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Paged {
            rows: rows
                .into_iter()
                .map(Self::row_to_product)
                .collect::<Result<Vec<_>>>()?,
            total: total as u64,
        })
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<OrderRecord>> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn list_orders(
        &self,
        customer: Option<CustomerId>,
        filter: &Filter,
        page: PageRequest,
    ) -> Result<Paged<OrderRecord>> {
        let (mut where_sql, prefix_binds) = match customer {
            Some(id) => (" WHERE customer_id = $1".to_string(), vec![id.as_uuid()]),
            None => (String::new(), Vec::new()),
        };
        let mut param_count = prefix_binds.len();
        let mut binds = Vec::new();
        append_filter(&mut where_sql, filter, &mut param_count, &mut binds);

        let count_sql = format!("SELECT COUNT(*) FROM orders{where_sql}");
        let select_sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders{where_sql} ORDER BY created_at DESC, id DESC LIMIT ${} OFFSET ${}",
            param_count + 1,
            param_count + 2,
        );

        let mut tx = self.pool.begin().await?;

        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        for uuid in &prefix_binds {
            count_query = count_query.bind(*uuid);
        }
        for value in &binds {
            count_query = count_query.bind(value);
        }
        let total = count_query.fetch_one(&mut *tx).await?;

        let mut select_query = sqlx::query(&select_sql);
        for uuid in &prefix_binds {
            select_query = select_query.bind(*uuid);
        }
        for value in &binds {
            select_query = select_query.bind(value);
        }
        let rows = select_query
            .bind(page.limit() as i64)
            .bind(page.offset() as i64)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Paged {
            rows: rows
                .into_iter()
                .map(Self::row_to_order)
                .collect::<Result<Vec<_>>>()?,
            total: total as u64,
        })
    }

    async fn list_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItemRecord>> {
        let rows = sqlx::query(
            "SELECT id, order_id, product_id, quantity, price FROM order_items WHERE order_id = $1 ORDER BY id",
        )
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order_item).collect()
    }

    async fn recent_orders_for_customer(
        &self,
        customer_id: CustomerId,
        limit: u64,
    ) -> Result<Vec<OrderRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE customer_id = $1 ORDER BY created_at DESC, id DESC LIMIT $2"
        ))
        .bind(customer_id.as_uuid())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn count_orders_for_customer(&self, customer_id: CustomerId) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE customer_id = $1")
            .bind(customer_id.as_uuid())
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    async fn count_order_items_for_product(&self, product_id: ProductId) -> Result<u64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM order_items WHERE product_id = $1")
                .bind(product_id.as_uuid())
                .fetch_one(&self.pool)
                .await?;
        Ok(count as u64)
    }

    async fn customer_order_stats(&self, customer_id: CustomerId) -> Result<CustomerOrderStats> {
        let row = sqlx::query(
            // SUM(bigint) is NUMERIC in Postgres, hence the cast
            "SELECT COUNT(*) AS order_count, COALESCE(SUM(total), 0)::BIGINT AS total_spent FROM orders WHERE customer_id = $1",
        )
        .bind(customer_id.as_uuid())
        .fetch_one(&self.pool)
        .await?;

        Ok(CustomerOrderStats {
            order_count: row.try_get::<i64, _>("order_count")? as u64,
            total_spent: Money::from_cents(row.try_get("total_spent")?),
        })
    }
}

/// A `BEGIN`-ed database transaction. Dropping it without committing lets
/// sqlx issue the `ROLLBACK`.
struct PgStoreTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTransaction for PgStoreTransaction {
    async fn insert_customer(&mut self, record: &CustomerRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO customers (id, name, email, phone, address, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(&record.name)
        .bind(&record.email)
        .bind(&record.phone)
        .bind(&record.address)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| {
            unique_violation(e, "customers_email_key", "customer", "email", &record.email)
        })?;

        Ok(())
    }

    async fn update_customer(&mut self, record: &CustomerRecord) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE customers
            SET name = $2, email = $3, phone = $4, address = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(&record.name)
        .bind(&record.email)
        .bind(&record.phone)
        .bind(&record.address)
        .bind(record.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| {
            unique_violation(e, "customers_email_key", "customer", "email", &record.email)
        })?;

        if result.rows_affected() == 0 {
            return Err(StoreError::RowNotFound {
                entity: "customer",
                id: record.id.to_string(),
            });
        }
        Ok(())
    }

    async fn delete_customer(&mut self, id: CustomerId) -> Result<()> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::RowNotFound {
                entity: "customer",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn insert_product(&mut self, record: &ProductRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, sku, description, price, stock, category, image_url, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(&record.name)
        .bind(&record.sku)
        .bind(&record.description)
        .bind(record.price.cents())
        .bind(i64::from(record.stock))
        .bind(&record.category)
        .bind(&record.image_url)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| unique_violation(e, "products_sku_key", "product", "sku", &record.sku))?;

        Ok(())
    }

    async fn update_product(&mut self, record: &ProductRecord) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = $2, sku = $3, description = $4, price = $5, stock = $6,
                category = $7, image_url = $8, updated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(&record.name)
        .bind(&record.sku)
        .bind(&record.description)
        .bind(record.price.cents())
        .bind(i64::from(record.stock))
        .bind(&record.category)
        .bind(&record.image_url)
        .bind(record.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| unique_violation(e, "products_sku_key", "product", "sku", &record.sku))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::RowNotFound {
                entity: "product",
                id: record.id.to_string(),
            });
        }
        Ok(())
    }

    async fn delete_product(&mut self, id: ProductId) -> Result<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::RowNotFound {
                entity: "product",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn insert_order(&mut self, record: &OrderRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, order_number, customer_id, status, total, tax, shipping, notes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(&record.order_number)
        .bind(record.customer_id.as_uuid())
        .bind(record.status.as_str())
        .bind(record.total.cents())
        .bind(record.tax.map(|m| m.cents()))
        .bind(record.shipping.map(|m| m.cents()))
        .bind(&record.notes)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| {
            unique_violation(
                e,
                "orders_order_number_key",
                "order",
                "order_number",
                &record.order_number,
            )
        })?;

        Ok(())
    }

    async fn update_order(&mut self, record: &OrderRecord) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET customer_id = $2, status = $3, total = $4, tax = $5, shipping = $6,
                notes = $7, updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(record.customer_id.as_uuid())
        .bind(record.status.as_str())
        .bind(record.total.cents())
        .bind(record.tax.map(|m| m.cents()))
        .bind(record.shipping.map(|m| m.cents()))
        .bind(&record.notes)
        .bind(record.updated_at)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::RowNotFound {
                entity: "order",
                id: record.id.to_string(),
            });
        }
        Ok(())
    }

    async fn delete_order(&mut self, id: OrderId) -> Result<()> {
        // order_items cascades on the foreign key
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::RowNotFound {
                entity: "order",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn insert_order_item(&mut self, record: &OrderItemRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO order_items (id, order_id, product_id, quantity, price)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(record.order_id.as_uuid())
        .bind(record.product_id.as_uuid())
        .bind(i64::from(record.quantity))
        .bind(record.price.cents())
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn delete_order_items(&mut self, order_id: OrderId) -> Result<()> {
        sqlx::query("DELETE FROM order_items WHERE order_id = $1")
            .bind(order_id.as_uuid())
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
