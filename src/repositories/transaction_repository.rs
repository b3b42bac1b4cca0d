use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};

use super::{postgres::PgUnitOfWork, TransactionStore};
use crate::dto::Page;
use crate::models::{
    transaction::{
        NewPurchaseTransaction, NewSalesTransaction, PurchaseTransaction, SalesTransaction,
        TransactionFilter,
    },
    DateRange,
};
use crate::utils::errors::{not_found_error, AppResult};

pub(crate) fn push_date_range(qb: &mut QueryBuilder<'_, Postgres>, column: &str, range: DateRange) {
    qb.push(" WHERE 1 = 1");
    if let Some(from) = range.from {
        qb.push(format!(" AND {} >= ", column)).push_bind(from);
    }
    if let Some(to) = range.to {
        qb.push(format!(" AND {} < ", column)).push_bind(to);
    }
}

#[async_trait]
impl TransactionStore for PgUnitOfWork {
    async fn invoice_number_exists(&mut self, invoice_number: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(SELECT 1 FROM sales_transactions WHERE invoice_number = $1)
                OR EXISTS(SELECT 1 FROM purchase_transactions WHERE invoice_number = $1)
            "#,
        )
        .bind(invoice_number)
        .fetch_one(self.conn()?)
        .await?;
        Ok(exists)
    }

    async fn insert_purchase(
        &mut self,
        purchase: NewPurchaseTransaction,
    ) -> AppResult<PurchaseTransaction> {
        let created = sqlx::query_as::<_, PurchaseTransaction>(
            r#"
            INSERT INTO purchase_transactions (
                invoice_number, source_type, source_id, vehicle_id, purchase_price,
                payment_method, payment_status, notes, processed_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(purchase.invoice_number)
        .bind(purchase.source_type)
        .bind(purchase.source_id)
        .bind(purchase.vehicle_id)
        .bind(purchase.purchase_price)
        .bind(purchase.payment_method)
        .bind(purchase.payment_status)
        .bind(purchase.notes)
        .bind(purchase.processed_by)
        .fetch_one(self.conn()?)
        .await?;
        Ok(created)
    }

    async fn find_purchase(&mut self, id: i32) -> AppResult<Option<PurchaseTransaction>> {
        let purchase = sqlx::query_as::<_, PurchaseTransaction>(
            "SELECT * FROM purchase_transactions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.conn()?)
        .await?;
        Ok(purchase)
    }

    async fn update_purchase(
        &mut self,
        purchase: &PurchaseTransaction,
    ) -> AppResult<PurchaseTransaction> {
        sqlx::query_as::<_, PurchaseTransaction>(
            r#"
            UPDATE purchase_transactions
            SET payment_status = $2, notes = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(purchase.id)
        .bind(purchase.payment_status)
        .bind(&purchase.notes)
        .fetch_optional(self.conn()?)
        .await?
        .ok_or_else(|| not_found_error("Purchase transaction", purchase.id))
    }

    async fn list_purchases(
        &mut self,
        filter: &TransactionFilter,
        page: Page,
    ) -> AppResult<(Vec<PurchaseTransaction>, i64)> {
        let mut count =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM purchase_transactions");
        push_date_range(&mut count, "transaction_date", filter.range());
        let total: i64 = count.build_query_scalar().fetch_one(self.conn()?).await?;

        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM purchase_transactions");
        push_date_range(&mut query, "transaction_date", filter.range());
        query
            .push(" ORDER BY transaction_date DESC, id DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let purchases = query
            .build_query_as::<PurchaseTransaction>()
            .fetch_all(self.conn()?)
            .await?;

        Ok((purchases, total))
    }

    async fn insert_sales(&mut self, sales: NewSalesTransaction) -> AppResult<SalesTransaction> {
        let created = sqlx::query_as::<_, SalesTransaction>(
            r#"
            INSERT INTO sales_transactions (
                invoice_number, customer_id, vehicle_id, hpp_price, selling_price, profit,
                payment_method, payment_status, down_payment, remaining_payment, notes,
                processed_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(sales.invoice_number)
        .bind(sales.customer_id)
        .bind(sales.vehicle_id)
        .bind(sales.hpp_price)
        .bind(sales.selling_price)
        .bind(sales.profit)
        .bind(sales.payment_method)
        .bind(sales.payment_status)
        .bind(sales.down_payment)
        .bind(sales.remaining_payment)
        .bind(sales.notes)
        .bind(sales.processed_by)
        .fetch_one(self.conn()?)
        .await?;
        Ok(created)
    }

    async fn find_sales(&mut self, id: i32) -> AppResult<Option<SalesTransaction>> {
        let sales =
            sqlx::query_as::<_, SalesTransaction>("SELECT * FROM sales_transactions WHERE id = $1")
                .bind(id)
                .fetch_optional(self.conn()?)
                .await?;
        Ok(sales)
    }

    async fn lock_sales(&mut self, id: i32) -> AppResult<Option<SalesTransaction>> {
        let sales = sqlx::query_as::<_, SalesTransaction>(
            "SELECT * FROM sales_transactions WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(self.conn()?)
        .await?;
        Ok(sales)
    }

    async fn update_sales(&mut self, sales: &SalesTransaction) -> AppResult<SalesTransaction> {
        sqlx::query_as::<_, SalesTransaction>(
            r#"
            UPDATE sales_transactions SET
                payment_status = $2, down_payment = $3, remaining_payment = $4, notes = $5,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(sales.id)
        .bind(sales.payment_status)
        .bind(sales.down_payment)
        .bind(sales.remaining_payment)
        .bind(&sales.notes)
        .fetch_optional(self.conn()?)
        .await?
        .ok_or_else(|| not_found_error("Sales transaction", sales.id))
    }

    async fn list_sales(
        &mut self,
        filter: &TransactionFilter,
        page: Page,
    ) -> AppResult<(Vec<SalesTransaction>, i64)> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM sales_transactions");
        push_date_range(&mut count, "transaction_date", filter.range());
        let total: i64 = count.build_query_scalar().fetch_one(self.conn()?).await?;

        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM sales_transactions");
        push_date_range(&mut query, "transaction_date", filter.range());
        query
            .push(" ORDER BY transaction_date DESC, id DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let sales = query
            .build_query_as::<SalesTransaction>()
            .fetch_all(self.conn()?)
            .await?;

        Ok((sales, total))
    }
}
