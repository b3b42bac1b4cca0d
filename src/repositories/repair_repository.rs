use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{FromRow, Postgres, QueryBuilder};

use super::{postgres::PgUnitOfWork, RepairStore};
use crate::dto::Page;
use crate::models::repair::{
    MechanicWorkload, NewRepairOrder, NewRepairSparePart, RepairOrder, RepairOrderFilter,
    RepairSparePart, RepairStats, RepairStatsFilter,
};
use crate::utils::errors::{not_found_error, AppResult};

fn push_repair_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &RepairOrderFilter) {
    qb.push(" WHERE 1 = 1");
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(mechanic_id) = filter.mechanic_id {
        qb.push(" AND mechanic_id = ").push_bind(mechanic_id);
    }
    if let Some(vehicle_id) = filter.vehicle_id {
        qb.push(" AND vehicle_id = ").push_bind(vehicle_id);
    }
    let range = filter.range();
    if let Some(from) = range.from {
        qb.push(" AND created_at >= ").push_bind(from);
    }
    if let Some(to) = range.to {
        qb.push(" AND created_at < ").push_bind(to);
    }
}

#[derive(FromRow)]
struct StatsRow {
    total_orders: i64,
    pending: i64,
    in_progress: i64,
    completed: i64,
    cancelled: i64,
    total_estimated_cost: Decimal,
    total_actual_cost: Decimal,
    avg_completion_hours: Option<f64>,
}

#[async_trait]
impl RepairStore for PgUnitOfWork {
    async fn repair_code_exists(&mut self, code: &str) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM repair_orders WHERE code = $1)")
                .bind(code)
                .fetch_one(self.conn()?)
                .await?;
        Ok(exists)
    }

    async fn insert_repair_order(&mut self, order: NewRepairOrder) -> AppResult<RepairOrder> {
        let created = sqlx::query_as::<_, RepairOrder>(
            r#"
            INSERT INTO repair_orders (
                code, vehicle_id, mechanic_id, assigned_by, description, estimated_cost,
                actual_cost, status, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, 0, 'pending', $7)
            RETURNING *
            "#,
        )
        .bind(order.code)
        .bind(order.vehicle_id)
        .bind(order.mechanic_id)
        .bind(order.assigned_by)
        .bind(order.description)
        .bind(order.estimated_cost)
        .bind(order.notes)
        .fetch_one(self.conn()?)
        .await?;
        Ok(created)
    }

    async fn find_repair_order(&mut self, id: i32) -> AppResult<Option<RepairOrder>> {
        let order = sqlx::query_as::<_, RepairOrder>("SELECT * FROM repair_orders WHERE id = $1")
            .bind(id)
            .fetch_optional(self.conn()?)
            .await?;
        Ok(order)
    }

    async fn find_repair_order_by_code(&mut self, code: &str) -> AppResult<Option<RepairOrder>> {
        let order =
            sqlx::query_as::<_, RepairOrder>("SELECT * FROM repair_orders WHERE code = $1")
                .bind(code)
                .fetch_optional(self.conn()?)
                .await?;
        Ok(order)
    }

    async fn lock_repair_order(&mut self, id: i32) -> AppResult<Option<RepairOrder>> {
        let order = sqlx::query_as::<_, RepairOrder>(
            "SELECT * FROM repair_orders WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(self.conn()?)
        .await?;
        Ok(order)
    }

    async fn update_repair_order(&mut self, order: &RepairOrder) -> AppResult<RepairOrder> {
        sqlx::query_as::<_, RepairOrder>(
            r#"
            UPDATE repair_orders SET
                status = $2, actual_cost = $3, notes = $4,
                started_at = $5, completed_at = $6, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(order.id)
        .bind(order.status)
        .bind(order.actual_cost)
        .bind(&order.notes)
        .bind(order.started_at)
        .bind(order.completed_at)
        .fetch_optional(self.conn()?)
        .await?
        .ok_or_else(|| not_found_error("Repair order", order.id))
    }

    async fn delete_repair_order(&mut self, id: i32) -> AppResult<()> {
        // repair_spare_parts se borra en cascada
        let result = sqlx::query("DELETE FROM repair_orders WHERE id = $1")
            .bind(id)
            .execute(self.conn()?)
            .await?;
        if result.rows_affected() == 0 {
            return Err(not_found_error("Repair order", id));
        }
        Ok(())
    }

    async fn list_repair_orders(
        &mut self,
        filter: &RepairOrderFilter,
        page: Page,
    ) -> AppResult<(Vec<RepairOrder>, i64)> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM repair_orders");
        push_repair_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(self.conn()?).await?;

        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM repair_orders");
        push_repair_filters(&mut query, filter);
        query
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let orders = query
            .build_query_as::<RepairOrder>()
            .fetch_all(self.conn()?)
            .await?;

        Ok((orders, total))
    }

    async fn repair_stats(&mut self, filter: &RepairStatsFilter) -> AppResult<RepairStats> {
        let mut query = QueryBuilder::<Postgres>::new(
            r#"
            SELECT
                COUNT(*) AS total_orders,
                COUNT(*) FILTER (WHERE status = 'pending') AS pending,
                COUNT(*) FILTER (WHERE status = 'in_progress') AS in_progress,
                COUNT(*) FILTER (WHERE status = 'completed') AS completed,
                COUNT(*) FILTER (WHERE status = 'cancelled') AS cancelled,
                COALESCE(SUM(estimated_cost), 0) AS total_estimated_cost,
                COALESCE(SUM(actual_cost), 0) AS total_actual_cost,
                (AVG(EXTRACT(EPOCH FROM (completed_at - started_at)) / 3600.0)
                    FILTER (WHERE started_at IS NOT NULL AND completed_at IS NOT NULL))::FLOAT8
                    AS avg_completion_hours
            FROM repair_orders
            "#,
        );
        push_repair_filters(&mut query, &filter.as_order_filter());
        let row = query
            .build_query_as::<StatsRow>()
            .fetch_one(self.conn()?)
            .await?;

        Ok(RepairStats {
            total_orders: row.total_orders,
            pending: row.pending,
            in_progress: row.in_progress,
            completed: row.completed,
            cancelled: row.cancelled,
            total_estimated_cost: row.total_estimated_cost,
            total_actual_cost: row.total_actual_cost,
            avg_completion_hours: row.avg_completion_hours,
        })
    }

    async fn mechanic_workload(&mut self) -> AppResult<Vec<MechanicWorkload>> {
        let workload = sqlx::query_as::<_, MechanicWorkload>(
            r#"
            SELECT
                u.id AS mechanic_id,
                u.full_name,
                COUNT(r.id) FILTER (WHERE r.status = 'pending') AS pending,
                COUNT(r.id) FILTER (WHERE r.status = 'in_progress') AS in_progress
            FROM users u
            LEFT JOIN repair_orders r ON r.mechanic_id = u.id
            WHERE u.role = 'mechanic' AND u.is_active
            GROUP BY u.id, u.full_name
            ORDER BY u.id
            "#,
        )
        .fetch_all(self.conn()?)
        .await?;
        Ok(workload)
    }

    async fn list_repair_parts(
        &mut self,
        repair_order_id: i32,
    ) -> AppResult<Vec<RepairSparePart>> {
        let lines = sqlx::query_as::<_, RepairSparePart>(
            "SELECT * FROM repair_spare_parts WHERE repair_order_id = $1 ORDER BY id",
        )
        .bind(repair_order_id)
        .fetch_all(self.conn()?)
        .await?;
        Ok(lines)
    }

    async fn find_repair_part(
        &mut self,
        repair_order_id: i32,
        spare_part_id: i32,
    ) -> AppResult<Option<RepairSparePart>> {
        let line = sqlx::query_as::<_, RepairSparePart>(
            "SELECT * FROM repair_spare_parts WHERE repair_order_id = $1 AND spare_part_id = $2",
        )
        .bind(repair_order_id)
        .bind(spare_part_id)
        .fetch_optional(self.conn()?)
        .await?;
        Ok(line)
    }

    async fn insert_repair_part(
        &mut self,
        line: NewRepairSparePart,
    ) -> AppResult<RepairSparePart> {
        let total_price = line.total_price();
        let created = sqlx::query_as::<_, RepairSparePart>(
            r#"
            INSERT INTO repair_spare_parts (
                repair_order_id, spare_part_id, quantity_used, unit_price, total_price
            )
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(line.repair_order_id)
        .bind(line.spare_part_id)
        .bind(line.quantity_used)
        .bind(line.unit_price)
        .bind(total_price)
        .fetch_one(self.conn()?)
        .await?;
        Ok(created)
    }

    async fn update_repair_part_quantity(
        &mut self,
        line_id: i32,
        quantity_used: i32,
        total_price: Decimal,
    ) -> AppResult<RepairSparePart> {
        sqlx::query_as::<_, RepairSparePart>(
            r#"
            UPDATE repair_spare_parts SET quantity_used = $2, total_price = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(line_id)
        .bind(quantity_used)
        .bind(total_price)
        .fetch_optional(self.conn()?)
        .await?
        .ok_or_else(|| not_found_error("Repair spare part", line_id))
    }

    async fn delete_repair_part(&mut self, line_id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM repair_spare_parts WHERE id = $1")
            .bind(line_id)
            .execute(self.conn()?)
            .await?;
        if result.rows_affected() == 0 {
            return Err(not_found_error("Repair spare part", line_id));
        }
        Ok(())
    }
}
