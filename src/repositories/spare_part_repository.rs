use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};

use super::{postgres::PgUnitOfWork, SparePartStore};
use crate::dto::Page;
use crate::models::spare_part::{NewSparePart, SparePart, SparePartFilter};
use crate::utils::errors::{not_found_error, AppResult};

fn push_spare_part_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &SparePartFilter) {
    qb.push(" WHERE 1 = 1");
    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", search);
        qb.push(" AND (code ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR name ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(category) = &filter.category {
        qb.push(" AND LOWER(category) = LOWER(")
            .push_bind(category.clone())
            .push(")");
    }
    if let Some(active) = filter.is_active {
        qb.push(" AND is_active = ").push_bind(active);
    }
}

#[async_trait]
impl SparePartStore for PgUnitOfWork {
    async fn find_spare_part(&mut self, id: i32) -> AppResult<Option<SparePart>> {
        let part = sqlx::query_as::<_, SparePart>("SELECT * FROM spare_parts WHERE id = $1")
            .bind(id)
            .fetch_optional(self.conn()?)
            .await?;
        Ok(part)
    }

    async fn lock_spare_part(&mut self, id: i32) -> AppResult<Option<SparePart>> {
        let part =
            sqlx::query_as::<_, SparePart>("SELECT * FROM spare_parts WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(self.conn()?)
                .await?;
        Ok(part)
    }

    async fn spare_part_code_exists(&mut self, code: &str) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM spare_parts WHERE code = $1)")
                .bind(code)
                .fetch_one(self.conn()?)
                .await?;
        Ok(exists)
    }

    async fn insert_spare_part(&mut self, part: NewSparePart) -> AppResult<SparePart> {
        let created = sqlx::query_as::<_, SparePart>(
            r#"
            INSERT INTO spare_parts (
                code, name, description, category, unit, purchase_price, selling_price,
                stock_quantity, minimum_stock
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(part.code)
        .bind(part.name)
        .bind(part.description)
        .bind(part.category)
        .bind(part.unit)
        .bind(part.purchase_price)
        .bind(part.selling_price)
        .bind(part.stock_quantity)
        .bind(part.minimum_stock)
        .fetch_one(self.conn()?)
        .await?;
        Ok(created)
    }

    async fn update_spare_part(&mut self, part: &SparePart) -> AppResult<SparePart> {
        sqlx::query_as::<_, SparePart>(
            r#"
            UPDATE spare_parts SET
                name = $2, description = $3, category = $4, unit = $5,
                purchase_price = $6, selling_price = $7, minimum_stock = $8,
                is_active = $9, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(part.id)
        .bind(&part.name)
        .bind(&part.description)
        .bind(&part.category)
        .bind(&part.unit)
        .bind(part.purchase_price)
        .bind(part.selling_price)
        .bind(part.minimum_stock)
        .bind(part.is_active)
        .fetch_optional(self.conn()?)
        .await?
        .ok_or_else(|| not_found_error("Spare part", part.id))
    }

    async fn adjust_spare_part_stock(&mut self, id: i32, delta: i32) -> AppResult<SparePart> {
        sqlx::query_as::<_, SparePart>(
            r#"
            UPDATE spare_parts
            SET stock_quantity = stock_quantity + $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(delta)
        .fetch_optional(self.conn()?)
        .await?
        .ok_or_else(|| not_found_error("Spare part", id))
    }

    async fn list_spare_parts(
        &mut self,
        filter: &SparePartFilter,
        page: Page,
    ) -> AppResult<(Vec<SparePart>, i64)> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM spare_parts");
        push_spare_part_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(self.conn()?).await?;

        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM spare_parts");
        push_spare_part_filters(&mut query, filter);
        query
            .push(" ORDER BY name ASC, id ASC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let parts = query
            .build_query_as::<SparePart>()
            .fetch_all(self.conn()?)
            .await?;

        Ok((parts, total))
    }

    async fn list_low_stock_parts(&mut self) -> AppResult<Vec<SparePart>> {
        let parts = sqlx::query_as::<_, SparePart>(
            r#"
            SELECT * FROM spare_parts
            WHERE is_active AND stock_quantity <= minimum_stock
            ORDER BY stock_quantity ASC, id ASC
            "#,
        )
        .fetch_all(self.conn()?)
        .await?;
        Ok(parts)
    }

    async fn spare_part_in_use(&mut self, id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM repair_spare_parts WHERE spare_part_id = $1)",
        )
        .bind(id)
        .fetch_one(self.conn()?)
        .await?;
        Ok(exists)
    }

    async fn delete_spare_part(&mut self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM spare_parts WHERE id = $1")
            .bind(id)
            .execute(self.conn()?)
            .await?;
        if result.rows_affected() == 0 {
            return Err(not_found_error("Spare part", id));
        }
        Ok(())
    }
}
