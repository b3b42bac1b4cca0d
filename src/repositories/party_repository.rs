use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};

use super::{postgres::PgUnitOfWork, PartyStore};
use crate::dto::Page;
use crate::models::{
    party::{Customer, NewCustomer, NewSupplier, PartyFilter, Supplier},
    vehicle::SourceType,
};
use crate::utils::errors::{not_found_error, AppResult};

fn push_party_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &PartyFilter) {
    if let Some(search) = &filter.search {
        qb.push(" WHERE (name ILIKE ")
            .push_bind(format!("%{}%", search))
            .push(" OR phone LIKE ")
            .push_bind(format!("%{}%", search))
            .push(")");
    }
}

async fn count_parties(
    uow: &mut PgUnitOfWork,
    table: &str,
    filter: &PartyFilter,
) -> AppResult<i64> {
    let mut count = QueryBuilder::<Postgres>::new(format!("SELECT COUNT(*) FROM {}", table));
    push_party_filters(&mut count, filter);
    let total: i64 = count.build_query_scalar().fetch_one(uow.conn()?).await?;
    Ok(total)
}

/// Vehículos o compras con este origen
async fn is_source(uow: &mut PgUnitOfWork, source_type: SourceType, id: i32) -> AppResult<bool> {
    let exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(SELECT 1 FROM vehicles WHERE source_type = $1 AND source_id = $2)
            OR EXISTS(SELECT 1 FROM purchase_transactions WHERE source_type = $1 AND source_id = $2)
        "#,
    )
    .bind(source_type)
    .bind(id)
    .fetch_one(uow.conn()?)
    .await?;
    Ok(exists)
}

async fn delete_party(
    uow: &mut PgUnitOfWork,
    table: &str,
    resource: &str,
    id: i32,
) -> AppResult<()> {
    let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", table))
        .bind(id)
        .execute(uow.conn()?)
        .await?;
    if result.rows_affected() == 0 {
        return Err(not_found_error(resource, id));
    }
    Ok(())
}

#[async_trait]
impl PartyStore for PgUnitOfWork {
    async fn find_customer(&mut self, id: i32) -> AppResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1")
            .bind(id)
            .fetch_optional(self.conn()?)
            .await?;
        Ok(customer)
    }

    async fn find_customer_by_phone(&mut self, phone: &str) -> AppResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE phone = $1 ORDER BY id LIMIT 1",
        )
        .bind(phone)
        .fetch_optional(self.conn()?)
        .await?;
        Ok(customer)
    }

    async fn find_customer_by_email(&mut self, email: &str) -> AppResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE LOWER(email) = LOWER($1) ORDER BY id LIMIT 1",
        )
        .bind(email)
        .fetch_optional(self.conn()?)
        .await?;
        Ok(customer)
    }

    async fn insert_customer(&mut self, customer: NewCustomer) -> AppResult<Customer> {
        let created = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (name, phone, email, address, id_card_number)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(customer.name)
        .bind(customer.phone)
        .bind(customer.email)
        .bind(customer.address)
        .bind(customer.id_card_number)
        .fetch_one(self.conn()?)
        .await?;
        Ok(created)
    }

    async fn update_customer(&mut self, customer: &Customer) -> AppResult<Customer> {
        sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers SET
                name = $2, phone = $3, email = $4, address = $5, id_card_number = $6,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(customer.id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.email)
        .bind(&customer.address)
        .bind(&customer.id_card_number)
        .fetch_optional(self.conn()?)
        .await?
        .ok_or_else(|| not_found_error("Customer", customer.id))
    }

    async fn list_customers(
        &mut self,
        filter: &PartyFilter,
        page: Page,
    ) -> AppResult<(Vec<Customer>, i64)> {
        let total = count_parties(self, "customers", filter).await?;

        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM customers");
        push_party_filters(&mut query, filter);
        query
            .push(" ORDER BY name ASC, id ASC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let customers = query
            .build_query_as::<Customer>()
            .fetch_all(self.conn()?)
            .await?;

        Ok((customers, total))
    }

    async fn customer_has_history(&mut self, id: i32) -> AppResult<bool> {
        let has_sales: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM sales_transactions WHERE customer_id = $1)",
        )
        .bind(id)
        .fetch_one(self.conn()?)
        .await?;
        Ok(has_sales || is_source(self, SourceType::Customer, id).await?)
    }

    async fn delete_customer(&mut self, id: i32) -> AppResult<()> {
        delete_party(self, "customers", "Customer", id).await
    }

    async fn find_supplier(&mut self, id: i32) -> AppResult<Option<Supplier>> {
        let supplier = sqlx::query_as::<_, Supplier>("SELECT * FROM suppliers WHERE id = $1")
            .bind(id)
            .fetch_optional(self.conn()?)
            .await?;
        Ok(supplier)
    }

    async fn insert_supplier(&mut self, supplier: NewSupplier) -> AppResult<Supplier> {
        let created = sqlx::query_as::<_, Supplier>(
            r#"
            INSERT INTO suppliers (name, contact_person, phone, email, address)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(supplier.name)
        .bind(supplier.contact_person)
        .bind(supplier.phone)
        .bind(supplier.email)
        .bind(supplier.address)
        .fetch_one(self.conn()?)
        .await?;
        Ok(created)
    }

    async fn update_supplier(&mut self, supplier: &Supplier) -> AppResult<Supplier> {
        sqlx::query_as::<_, Supplier>(
            r#"
            UPDATE suppliers SET
                name = $2, contact_person = $3, phone = $4, email = $5, address = $6,
                is_active = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(supplier.id)
        .bind(&supplier.name)
        .bind(&supplier.contact_person)
        .bind(&supplier.phone)
        .bind(&supplier.email)
        .bind(&supplier.address)
        .bind(supplier.is_active)
        .fetch_optional(self.conn()?)
        .await?
        .ok_or_else(|| not_found_error("Supplier", supplier.id))
    }

    async fn list_suppliers(
        &mut self,
        filter: &PartyFilter,
        page: Page,
    ) -> AppResult<(Vec<Supplier>, i64)> {
        let total = count_parties(self, "suppliers", filter).await?;

        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM suppliers");
        push_party_filters(&mut query, filter);
        query
            .push(" ORDER BY name ASC, id ASC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let suppliers = query
            .build_query_as::<Supplier>()
            .fetch_all(self.conn()?)
            .await?;

        Ok((suppliers, total))
    }

    async fn supplier_has_history(&mut self, id: i32) -> AppResult<bool> {
        is_source(self, SourceType::Supplier, id).await
    }

    async fn delete_supplier(&mut self, id: i32) -> AppResult<()> {
        delete_party(self, "suppliers", "Supplier", id).await
    }
}
