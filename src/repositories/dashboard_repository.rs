use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};

use super::{postgres::PgUnitOfWork, transaction_repository::push_date_range, DashboardStore};
use crate::models::{
    dashboard::{
        BrandPerformance, DashboardMetrics, MechanicPerformance, PurchaseSummary, SalesSummary,
    },
    repair::{RepairOrder, RepairStatus},
    spare_part::SparePart,
    transaction::{PurchaseTransaction, SalesTransaction},
    vehicle::{Vehicle, VehicleStatus},
    DateRange,
};
use crate::utils::errors::AppResult;

#[async_trait]
impl DashboardStore for PgUnitOfWork {
    async fn count_vehicles_by_status(&mut self, status: VehicleStatus) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM vehicles WHERE status = $1")
            .bind(status)
            .fetch_one(self.conn()?)
            .await?;
        Ok(count)
    }

    async fn count_repairs_by_status(&mut self, status: RepairStatus) -> AppResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM repair_orders WHERE status = $1")
                .bind(status)
                .fetch_one(self.conn()?)
                .await?;
        Ok(count)
    }

    async fn count_low_stock_parts(&mut self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM spare_parts WHERE is_active AND stock_quantity <= minimum_stock",
        )
        .fetch_one(self.conn()?)
        .await?;
        Ok(count)
    }

    async fn count_repairs_completed(&mut self, range: DateRange) -> AppResult<i64> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM repair_orders");
        push_date_range(&mut query, "completed_at", range);
        query.push(" AND status = 'completed'");
        let count: i64 = query.build_query_scalar().fetch_one(self.conn()?).await?;
        Ok(count)
    }

    async fn sales_summary(&mut self, range: DateRange) -> AppResult<SalesSummary> {
        let mut query = QueryBuilder::<Postgres>::new(
            r#"
            SELECT
                COUNT(*) AS count,
                COALESCE(SUM(selling_price), 0) AS revenue,
                COALESCE(SUM(profit), 0) AS profit
            FROM sales_transactions
            "#,
        );
        push_date_range(&mut query, "transaction_date", range);
        let summary = query
            .build_query_as::<SalesSummary>()
            .fetch_one(self.conn()?)
            .await?;
        Ok(summary)
    }

    async fn purchase_summary(&mut self, range: DateRange) -> AppResult<PurchaseSummary> {
        let mut query = QueryBuilder::<Postgres>::new(
            r#"
            SELECT COUNT(*) AS count, COALESCE(SUM(purchase_price), 0) AS total
            FROM purchase_transactions
            "#,
        );
        push_date_range(&mut query, "transaction_date", range);
        let summary = query
            .build_query_as::<PurchaseSummary>()
            .fetch_one(self.conn()?)
            .await?;
        Ok(summary)
    }

    async fn recent_sales(
        &mut self,
        range: DateRange,
        limit: i64,
    ) -> AppResult<Vec<SalesTransaction>> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM sales_transactions");
        push_date_range(&mut query, "transaction_date", range);
        query
            .push(" ORDER BY transaction_date DESC, id DESC LIMIT ")
            .push_bind(limit);
        let sales = query
            .build_query_as::<SalesTransaction>()
            .fetch_all(self.conn()?)
            .await?;
        Ok(sales)
    }

    async fn recent_purchases(
        &mut self,
        range: DateRange,
        limit: i64,
    ) -> AppResult<Vec<PurchaseTransaction>> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM purchase_transactions");
        push_date_range(&mut query, "transaction_date", range);
        query
            .push(" ORDER BY transaction_date DESC, id DESC LIMIT ")
            .push_bind(limit);
        let purchases = query
            .build_query_as::<PurchaseTransaction>()
            .fetch_all(self.conn()?)
            .await?;
        Ok(purchases)
    }

    async fn sales_with_pending_payment(
        &mut self,
        limit: i64,
    ) -> AppResult<Vec<SalesTransaction>> {
        let sales = sqlx::query_as::<_, SalesTransaction>(
            r#"
            SELECT * FROM sales_transactions
            WHERE payment_status <> 'paid'
            ORDER BY transaction_date DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(self.conn()?)
        .await?;
        Ok(sales)
    }

    async fn list_vehicles_by_status(
        &mut self,
        status: VehicleStatus,
        limit: i64,
    ) -> AppResult<Vec<Vehicle>> {
        let vehicles = sqlx::query_as::<_, Vehicle>(
            "SELECT * FROM vehicles WHERE status = $1 ORDER BY created_at DESC, id DESC LIMIT $2",
        )
        .bind(status)
        .bind(limit)
        .fetch_all(self.conn()?)
        .await?;
        Ok(vehicles)
    }

    async fn top_brand(&mut self, range: DateRange) -> AppResult<Option<BrandPerformance>> {
        let mut query = QueryBuilder::<Postgres>::new(
            r#"
            SELECT v.brand, COUNT(*) AS units_sold, COALESCE(SUM(s.selling_price), 0) AS revenue
            FROM sales_transactions s
            JOIN vehicles v ON v.id = s.vehicle_id
            "#,
        );
        push_date_range(&mut query, "s.transaction_date", range);
        query.push(" GROUP BY v.brand ORDER BY units_sold DESC, revenue DESC, v.brand ASC LIMIT 1");
        let brand = query
            .build_query_as::<BrandPerformance>()
            .fetch_optional(self.conn()?)
            .await?;
        Ok(brand)
    }

    async fn top_mechanic(&mut self, range: DateRange) -> AppResult<Option<MechanicPerformance>> {
        let mut query = QueryBuilder::<Postgres>::new(
            r#"
            SELECT u.id AS mechanic_id, u.full_name, COUNT(*) AS completed_repairs
            FROM repair_orders r
            JOIN users u ON u.id = r.mechanic_id
            "#,
        );
        push_date_range(&mut query, "r.completed_at", range);
        query.push(
            " AND r.status = 'completed' GROUP BY u.id, u.full_name \
             ORDER BY completed_repairs DESC, u.id ASC LIMIT 1",
        );
        let mechanic = query
            .build_query_as::<MechanicPerformance>()
            .fetch_optional(self.conn()?)
            .await?;
        Ok(mechanic)
    }

    async fn top_sale(&mut self, range: DateRange) -> AppResult<Option<SalesTransaction>> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM sales_transactions");
        push_date_range(&mut query, "transaction_date", range);
        query.push(" ORDER BY profit DESC, id ASC LIMIT 1");
        let sale = query
            .build_query_as::<SalesTransaction>()
            .fetch_optional(self.conn()?)
            .await?;
        Ok(sale)
    }

    async fn open_repairs(
        &mut self,
        mechanic_id: Option<i32>,
        limit: i64,
    ) -> AppResult<Vec<RepairOrder>> {
        let orders = sqlx::query_as::<_, RepairOrder>(
            r#"
            SELECT * FROM repair_orders
            WHERE status IN ('pending', 'in_progress')
              AND ($1::INT IS NULL OR mechanic_id = $1)
            ORDER BY created_at ASC, id ASC
            LIMIT $2
            "#,
        )
        .bind(mechanic_id)
        .bind(limit)
        .fetch_all(self.conn()?)
        .await?;
        Ok(orders)
    }

    async fn repairs_completed_by(
        &mut self,
        mechanic_id: i32,
        range: DateRange,
    ) -> AppResult<Vec<RepairOrder>> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM repair_orders");
        push_date_range(&mut query, "completed_at", range);
        query
            .push(" AND status = 'completed' AND mechanic_id = ")
            .push_bind(mechanic_id)
            .push(" ORDER BY completed_at DESC, id DESC");
        let orders = query
            .build_query_as::<RepairOrder>()
            .fetch_all(self.conn()?)
            .await?;
        Ok(orders)
    }

    async fn low_stock_parts_for_mechanic(
        &mut self,
        mechanic_id: i32,
    ) -> AppResult<Vec<SparePart>> {
        let parts = sqlx::query_as::<_, SparePart>(
            r#"
            SELECT DISTINCT sp.* FROM spare_parts sp
            JOIN repair_spare_parts rsp ON rsp.spare_part_id = sp.id
            JOIN repair_orders r ON r.id = rsp.repair_order_id
            WHERE r.mechanic_id = $1
              AND r.status IN ('pending', 'in_progress')
              AND sp.is_active
              AND sp.stock_quantity <= sp.minimum_stock
            ORDER BY sp.stock_quantity ASC, sp.id ASC
            "#,
        )
        .bind(mechanic_id)
        .fetch_all(self.conn()?)
        .await?;
        Ok(parts)
    }

    async fn upsert_metrics(&mut self, metrics: &DashboardMetrics) -> AppResult<DashboardMetrics> {
        let saved = sqlx::query_as::<_, DashboardMetrics>(
            r#"
            INSERT INTO dashboard_metrics (
                metric_date, vehicles_available, vehicles_in_repair, vehicles_sold_today,
                revenue_today, profit_today, pending_repairs, low_stock_items, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW())
            ON CONFLICT (metric_date) DO UPDATE SET
                vehicles_available = EXCLUDED.vehicles_available,
                vehicles_in_repair = EXCLUDED.vehicles_in_repair,
                vehicles_sold_today = EXCLUDED.vehicles_sold_today,
                revenue_today = EXCLUDED.revenue_today,
                profit_today = EXCLUDED.profit_today,
                pending_repairs = EXCLUDED.pending_repairs,
                low_stock_items = EXCLUDED.low_stock_items,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(metrics.metric_date)
        .bind(metrics.vehicles_available)
        .bind(metrics.vehicles_in_repair)
        .bind(metrics.vehicles_sold_today)
        .bind(metrics.revenue_today)
        .bind(metrics.profit_today)
        .bind(metrics.pending_repairs)
        .bind(metrics.low_stock_items)
        .fetch_one(self.conn()?)
        .await?;
        Ok(saved)
    }
}
