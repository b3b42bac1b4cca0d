use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Postgres, QueryBuilder};

use super::{postgres::PgUnitOfWork, VehicleStore};
use crate::dto::Page;
use crate::models::vehicle::{NewVehicle, Vehicle, VehicleDetailsUpdate, VehicleFilter, VehicleStatus};
use crate::utils::errors::{not_found_error, AppResult};

fn push_vehicle_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &VehicleFilter) {
    qb.push(" WHERE 1 = 1");
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(brand) = &filter.brand {
        qb.push(" AND LOWER(brand) = LOWER(").push_bind(brand.clone()).push(")");
    }
    if let Some(model) = &filter.model {
        qb.push(" AND model ILIKE ").push_bind(format!("%{}%", model));
    }
    if let Some(year_min) = filter.year_min {
        qb.push(" AND year >= ").push_bind(year_min);
    }
    if let Some(year_max) = filter.year_max {
        qb.push(" AND year <= ").push_bind(year_max);
    }
    if let Some(price_min) = filter.price_min {
        qb.push(" AND hpp_price >= ").push_bind(price_min);
    }
    if let Some(price_max) = filter.price_max {
        qb.push(" AND hpp_price <= ").push_bind(price_max);
    }
}

#[async_trait]
impl VehicleStore for PgUnitOfWork {
    async fn find_vehicle(&mut self, id: i32) -> AppResult<Option<Vehicle>> {
        let vehicle = sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = $1")
            .bind(id)
            .fetch_optional(self.conn()?)
            .await?;
        Ok(vehicle)
    }

    async fn lock_vehicle(&mut self, id: i32) -> AppResult<Option<Vehicle>> {
        let vehicle =
            sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(self.conn()?)
                .await?;
        Ok(vehicle)
    }

    async fn vehicle_code_exists(&mut self, code: &str) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM vehicles WHERE code = $1)")
                .bind(code)
                .fetch_one(self.conn()?)
                .await?;
        Ok(exists)
    }

    async fn insert_vehicle(&mut self, vehicle: NewVehicle) -> AppResult<Vehicle> {
        let created = sqlx::query_as::<_, Vehicle>(
            r#"
            INSERT INTO vehicles (
                code, brand, model, year, color, license_plate, chassis_number, odometer,
                source_type, source_id, purchase_price, condition_status, status,
                repair_cost, hpp_price, notes, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, 'available', 0, $11, $13, $14)
            RETURNING *
            "#,
        )
        .bind(vehicle.code)
        .bind(vehicle.brand)
        .bind(vehicle.model)
        .bind(vehicle.year)
        .bind(vehicle.color)
        .bind(vehicle.license_plate)
        .bind(vehicle.chassis_number)
        .bind(vehicle.odometer)
        .bind(vehicle.source_type)
        .bind(vehicle.source_id)
        .bind(vehicle.purchase_price)
        .bind(vehicle.condition_status)
        .bind(vehicle.notes)
        .bind(vehicle.created_by)
        .fetch_one(self.conn()?)
        .await?;
        Ok(created)
    }

    async fn list_vehicles(
        &mut self,
        filter: &VehicleFilter,
        page: Page,
    ) -> AppResult<(Vec<Vehicle>, i64)> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM vehicles");
        push_vehicle_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(self.conn()?).await?;

        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM vehicles");
        push_vehicle_filters(&mut query, filter);
        query
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let vehicles = query
            .build_query_as::<Vehicle>()
            .fetch_all(self.conn()?)
            .await?;

        Ok((vehicles, total))
    }

    async fn update_vehicle_details(
        &mut self,
        id: i32,
        changes: &VehicleDetailsUpdate,
    ) -> AppResult<Vehicle> {
        sqlx::query_as::<_, Vehicle>(
            r#"
            UPDATE vehicles SET
                model = COALESCE($2, model),
                year = COALESCE($3, year),
                color = COALESCE($4, color),
                license_plate = COALESCE($5, license_plate),
                chassis_number = COALESCE($6, chassis_number),
                odometer = COALESCE($7, odometer),
                condition_status = COALESCE($8, condition_status),
                notes = COALESCE($9, notes),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.model.clone())
        .bind(changes.year)
        .bind(changes.color.clone())
        .bind(changes.license_plate.clone())
        .bind(changes.chassis_number.clone())
        .bind(changes.odometer)
        .bind(changes.condition_status)
        .bind(changes.notes.clone())
        .fetch_optional(self.conn()?)
        .await?
        .ok_or_else(|| not_found_error("Vehicle", id))
    }

    async fn update_vehicle_status(&mut self, id: i32, status: VehicleStatus) -> AppResult<()> {
        let result =
            sqlx::query("UPDATE vehicles SET status = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(status)
                .execute(self.conn()?)
                .await?;
        if result.rows_affected() == 0 {
            return Err(not_found_error("Vehicle", id));
        }
        Ok(())
    }

    async fn update_vehicle_repair_cost(
        &mut self,
        id: i32,
        repair_cost: Decimal,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE vehicles
            SET repair_cost = $2, hpp_price = purchase_price + $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(repair_cost)
        .execute(self.conn()?)
        .await?;
        if result.rows_affected() == 0 {
            return Err(not_found_error("Vehicle", id));
        }
        Ok(())
    }

    async fn set_vehicle_selling_price(&mut self, id: i32, price: Decimal) -> AppResult<Vehicle> {
        sqlx::query_as::<_, Vehicle>(
            "UPDATE vehicles SET selling_price = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(price)
        .fetch_optional(self.conn()?)
        .await?
        .ok_or_else(|| not_found_error("Vehicle", id))
    }

    async fn mark_vehicle_sold(
        &mut self,
        id: i32,
        sold_price: Decimal,
        sold_date: DateTime<Utc>,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE vehicles
            SET status = 'sold', sold_price = $2, sold_date = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(sold_price)
        .bind(sold_date)
        .execute(self.conn()?)
        .await?;
        if result.rows_affected() == 0 {
            return Err(not_found_error("Vehicle", id));
        }
        Ok(())
    }

    async fn vehicle_has_history(&mut self, id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(SELECT 1 FROM repair_orders WHERE vehicle_id = $1)
                OR EXISTS(SELECT 1 FROM sales_transactions WHERE vehicle_id = $1)
                OR EXISTS(SELECT 1 FROM purchase_transactions WHERE vehicle_id = $1)
            "#,
        )
        .bind(id)
        .fetch_one(self.conn()?)
        .await?;
        Ok(exists)
    }

    async fn delete_vehicle(&mut self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM vehicles WHERE id = $1")
            .bind(id)
            .execute(self.conn()?)
            .await?;
        if result.rows_affected() == 0 {
            return Err(not_found_error("Vehicle", id));
        }
        Ok(())
    }
}
