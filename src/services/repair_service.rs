//! Servicio de reparaciones
//!
//! Dueño de la máquina de estados de `RepairOrder`. Cada operación corre en
//! una sola unidad de trabajo: la orden, el vehículo y el stock de repuestos
//! cambian juntos o no cambian.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::dto::{
    repair_dto::{CreateRepairOrderRequest, SparePartUsage, UpdateRepairProgressRequest},
    Page, Paginated,
};
use crate::models::{
    repair::{
        line_total, parts_total, MechanicWorkload, NewRepairOrder, NewRepairSparePart,
        RepairOrder, RepairOrderDetail, RepairOrderFilter, RepairSparePart, RepairStats,
        RepairStatsFilter, RepairStatus,
    },
    user::{UserRole, UserSummary},
    vehicle::{Vehicle, VehicleStatus, VehicleSummary},
};
use crate::repositories::{Persistence, UnitOfWork};
use crate::utils::codes::{self, MAX_CODE_ATTEMPTS};
use crate::utils::errors::{not_found_error, AppError, AppResult};

#[derive(Clone)]
pub struct RepairService {
    store: Arc<dyn Persistence>,
    enforce_mechanic_role: bool,
}

impl RepairService {
    pub fn new(store: Arc<dyn Persistence>, enforce_mechanic_role: bool) -> Self {
        Self {
            store,
            enforce_mechanic_role,
        }
    }

    /// Abrir una orden de reparación; el vehículo pasa a `in_repair`
    pub async fn open(
        &self,
        assigned_by: i32,
        request: CreateRepairOrderRequest,
    ) -> AppResult<RepairOrderDetail> {
        let mut uow = self.store.begin().await?;

        // 1. Vehículo bloqueado y no vendido
        let vehicle = uow
            .lock_vehicle(request.vehicle_id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", request.vehicle_id))?;
        if vehicle.status == VehicleStatus::Sold {
            warn!("⚠️ Vehículo {} ya vendido, no se abre reparación", vehicle.id);
            return Err(AppError::Conflict(format!(
                "Vehicle {} has been sold",
                vehicle.code
            )));
        }

        // 2. Mecánico y asignador
        let mechanic = uow
            .find_user(request.mechanic_id)
            .await?
            .ok_or_else(|| not_found_error("Mechanic", request.mechanic_id))?;
        if mechanic.role != UserRole::Mechanic {
            if self.enforce_mechanic_role {
                return Err(AppError::Conflict(format!(
                    "User {} is not a mechanic",
                    mechanic.username
                )));
            }
            warn!(
                "⚠️ Usuario {} ({}) asignado como mecánico",
                mechanic.username, mechanic.role
            );
        }
        if uow.find_user(assigned_by).await?.is_none() {
            return Err(not_found_error("User", assigned_by));
        }

        // 3. Código único
        let today = Utc::now().date_naive();
        let mut code = None;
        for _ in 0..MAX_CODE_ATTEMPTS {
            let candidate = codes::repair_code(today);
            if !uow.repair_code_exists(&candidate).await? {
                code = Some(candidate);
                break;
            }
        }
        let code = code.ok_or_else(|| {
            AppError::Conflict("Could not generate a unique repair code".to_string())
        })?;

        // 4. Orden pendiente + vehículo en reparación
        let order = uow
            .insert_repair_order(NewRepairOrder {
                code,
                vehicle_id: vehicle.id,
                mechanic_id: mechanic.id,
                assigned_by,
                description: request.description,
                estimated_cost: request.estimated_cost.unwrap_or(Decimal::ZERO),
                notes: request.notes,
            })
            .await?;
        uow.update_vehicle_status(vehicle.id, VehicleStatus::InRepair)
            .await?;

        let detail = load_detail(uow.as_mut(), order).await?;
        uow.commit().await?;

        info!(
            "✅ Orden {} abierta para vehículo {} (mecánico {})",
            detail.order.code, vehicle.code, mechanic.username
        );
        Ok(detail)
    }

    /// Avanzar el estado de una orden, adjuntando repuestos si vienen en la petición
    pub async fn update_progress(
        &self,
        id: i32,
        request: UpdateRepairProgressRequest,
    ) -> AppResult<RepairOrderDetail> {
        let mut uow = self.store.begin().await?;

        let mut order = uow
            .lock_repair_order(id)
            .await?
            .ok_or_else(|| not_found_error("Repair order", id))?;

        let from = order.status;
        let to = request.status;
        if !from.can_transition_to(to) {
            warn!("⚠️ Transición inválida {} -> {} en orden {}", from, to, order.code);
            return Err(AppError::InvalidTransition {
                from: from.to_string(),
                to: to.to_string(),
            });
        }

        let vehicle = uow
            .lock_vehicle(order.vehicle_id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", order.vehicle_id))?;
        if matches!(to, RepairStatus::Pending | RepairStatus::InProgress)
            && vehicle.status == VehicleStatus::Sold
        {
            warn!("⚠️ Vehículo {} vendido, orden {} no puede reactivarse", vehicle.code, order.code);
            return Err(AppError::Conflict(format!(
                "Vehicle {} has been sold",
                vehicle.code
            )));
        }

        // Repuestos antes de recalcular costos
        for usage in &request.spare_parts {
            attach_in(uow.as_mut(), &order, usage.spare_part_id, usage.quantity).await?;
        }

        if let Some(notes) = request.notes {
            order.notes = Some(notes);
        }
        if let Some(actual_cost) = request.actual_cost {
            order.actual_cost = actual_cost;
        }

        let now = Utc::now();
        match to {
            RepairStatus::InProgress => {
                if order.started_at.is_none() {
                    order.started_at = Some(now);
                }
                uow.update_vehicle_status(vehicle.id, VehicleStatus::InRepair)
                    .await?;
            }
            RepairStatus::Completed => {
                order.completed_at = Some(now);
                let lines = uow.list_repair_parts(order.id).await?;
                let total = parts_total(&lines);
                uow.update_vehicle_repair_cost(vehicle.id, total).await?;
                release_vehicle(uow.as_mut(), &vehicle).await?;
                if request.actual_cost.is_none() {
                    order.actual_cost = total;
                }
            }
            RepairStatus::Cancelled => {
                release_vehicle(uow.as_mut(), &vehicle).await?;
            }
            RepairStatus::Pending => {}
        }

        order.status = to;
        let updated = uow.update_repair_order(&order).await?;
        let detail = load_detail(uow.as_mut(), updated).await?;
        uow.commit().await?;

        info!("✅ Orden {}: {} -> {}", detail.order.code, from, to);
        Ok(detail)
    }

    /// Borrar una orden pendiente o cancelada, devolviendo el stock consumido
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let mut uow = self.store.begin().await?;

        let order = uow
            .lock_repair_order(id)
            .await?
            .ok_or_else(|| not_found_error("Repair order", id))?;
        if !order.status.is_deletable() {
            warn!("⚠️ Orden {} en estado {} no se puede borrar", order.code, order.status);
            return Err(AppError::InvalidState(format!(
                "Repair order {} is {} and cannot be deleted",
                order.code, order.status
            )));
        }

        for line in uow.list_repair_parts(order.id).await? {
            uow.adjust_spare_part_stock(line.spare_part_id, line.quantity_used)
                .await?;
        }
        uow.delete_repair_order(order.id).await?;

        if order.status == RepairStatus::Pending {
            let vehicle = uow
                .lock_vehicle(order.vehicle_id)
                .await?
                .ok_or_else(|| not_found_error("Vehicle", order.vehicle_id))?;
            release_vehicle(uow.as_mut(), &vehicle).await?;
        }

        uow.commit().await?;
        info!("🗑️ Orden {} eliminada", order.code);
        Ok(())
    }

    /// Adjuntar un repuesto a la orden descontando stock
    pub async fn attach_spare_part(
        &self,
        repair_order_id: i32,
        usage: SparePartUsage,
    ) -> AppResult<RepairSparePart> {
        let mut uow = self.store.begin().await?;

        let order = uow
            .lock_repair_order(repair_order_id)
            .await?
            .ok_or_else(|| not_found_error("Repair order", repair_order_id))?;
        let line = attach_in(uow.as_mut(), &order, usage.spare_part_id, usage.quantity).await?;

        uow.commit().await?;
        info!(
            "🔧 Repuesto {} x{} en orden {}",
            usage.spare_part_id, usage.quantity, order.code
        );
        Ok(line)
    }

    /// Quitar un repuesto de la orden devolviendo su cantidad al stock
    pub async fn detach_spare_part(&self, repair_order_id: i32, spare_part_id: i32) -> AppResult<()> {
        let mut uow = self.store.begin().await?;

        let order = uow
            .lock_repair_order(repair_order_id)
            .await?
            .ok_or_else(|| not_found_error("Repair order", repair_order_id))?;
        if order.status == RepairStatus::Completed {
            return Err(AppError::InvalidState(format!(
                "Repair order {} is completed",
                order.code
            )));
        }

        let line = uow
            .find_repair_part(order.id, spare_part_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Spare part {} is not attached to repair order {}",
                    spare_part_id, order.code
                ))
            })?;
        uow.delete_repair_part(line.id).await?;
        uow.adjust_spare_part_stock(spare_part_id, line.quantity_used)
            .await?;

        uow.commit().await?;
        info!(
            "↩️ Repuesto {} retirado de orden {} (+{} stock)",
            spare_part_id, order.code, line.quantity_used
        );
        Ok(())
    }

    pub async fn get(&self, id: i32) -> AppResult<RepairOrderDetail> {
        let mut uow = self.store.begin().await?;
        let order = uow
            .find_repair_order(id)
            .await?
            .ok_or_else(|| not_found_error("Repair order", id))?;
        let detail = load_detail(uow.as_mut(), order).await?;
        uow.commit().await?;
        Ok(detail)
    }

    pub async fn get_by_code(&self, code: &str) -> AppResult<RepairOrderDetail> {
        let mut uow = self.store.begin().await?;
        let order = uow
            .find_repair_order_by_code(code)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Repair order with code '{}' not found", code)))?;
        let detail = load_detail(uow.as_mut(), order).await?;
        uow.commit().await?;
        Ok(detail)
    }

    pub async fn list(
        &self,
        filter: &RepairOrderFilter,
        page: Page,
    ) -> AppResult<Paginated<RepairOrder>> {
        let mut uow = self.store.begin().await?;
        let (items, total) = uow.list_repair_orders(filter, page).await?;
        uow.commit().await?;
        Ok(Paginated::new(items, total, page))
    }

    pub async fn list_spare_parts(&self, repair_order_id: i32) -> AppResult<Vec<RepairSparePart>> {
        let mut uow = self.store.begin().await?;
        if uow.find_repair_order(repair_order_id).await?.is_none() {
            return Err(not_found_error("Repair order", repair_order_id));
        }
        let lines = uow.list_repair_parts(repair_order_id).await?;
        uow.commit().await?;
        Ok(lines)
    }

    pub async fn stats(&self, filter: &RepairStatsFilter) -> AppResult<RepairStats> {
        let mut uow = self.store.begin().await?;
        let stats = uow.repair_stats(filter).await?;
        uow.commit().await?;
        Ok(stats)
    }

    pub async fn workload(&self) -> AppResult<Vec<MechanicWorkload>> {
        let mut uow = self.store.begin().await?;
        let workload = uow.mechanic_workload().await?;
        uow.commit().await?;
        Ok(workload)
    }
}

/// Adjunta dentro de una unidad de trabajo abierta. Si el repuesto ya está en
/// la orden, suma la cantidad a la línea existente y conserva su precio.
async fn attach_in(
    uow: &mut dyn UnitOfWork,
    order: &RepairOrder,
    spare_part_id: i32,
    quantity: i32,
) -> AppResult<RepairSparePart> {
    if order.status == RepairStatus::Completed {
        return Err(AppError::InvalidState(format!(
            "Repair order {} is completed",
            order.code
        )));
    }

    let part = uow
        .lock_spare_part(spare_part_id)
        .await?
        .ok_or_else(|| not_found_error("Spare part", spare_part_id))?;
    if !part.has_stock_for(quantity) {
        warn!(
            "⚠️ Stock insuficiente de {}: {} disponibles, {} pedidos",
            part.code, part.stock_quantity, quantity
        );
        return Err(AppError::InsufficientStock {
            available: part.stock_quantity,
            requested: quantity,
        });
    }

    let line = match uow.find_repair_part(order.id, part.id).await? {
        Some(existing) => {
            let merged = existing.quantity_used.checked_add(quantity).ok_or_else(|| {
                AppError::InvalidAmount(format!("Quantity of {} out of range", part.code))
            })?;
            uow.update_repair_part_quantity(
                existing.id,
                merged,
                line_total(existing.unit_price, merged),
            )
            .await?
        }
        None => {
            uow.insert_repair_part(NewRepairSparePart {
                repair_order_id: order.id,
                spare_part_id: part.id,
                quantity_used: quantity,
                unit_price: part.selling_price,
            })
            .await?
        }
    };
    uow.adjust_spare_part_stock(part.id, -quantity).await?;

    Ok(line)
}

/// Devuelve el vehículo a `available` salvo que ya se haya vendido
async fn release_vehicle(uow: &mut dyn UnitOfWork, vehicle: &Vehicle) -> AppResult<()> {
    if vehicle.status == VehicleStatus::Sold {
        warn!("⚠️ Vehículo {} vendido, se mantiene su estado", vehicle.code);
        return Ok(());
    }
    uow.update_vehicle_status(vehicle.id, VehicleStatus::Available)
        .await
}

async fn load_detail(uow: &mut dyn UnitOfWork, order: RepairOrder) -> AppResult<RepairOrderDetail> {
    let vehicle = uow
        .find_vehicle(order.vehicle_id)
        .await?
        .ok_or_else(|| not_found_error("Vehicle", order.vehicle_id))?;
    let mechanic = uow
        .find_user(order.mechanic_id)
        .await?
        .ok_or_else(|| not_found_error("User", order.mechanic_id))?;
    let assigner = uow
        .find_user(order.assigned_by)
        .await?
        .ok_or_else(|| not_found_error("User", order.assigned_by))?;
    let spare_parts = uow.list_repair_parts(order.id).await?;

    Ok(RepairOrderDetail {
        parts_total: parts_total(&spare_parts),
        vehicle: VehicleSummary::from(&vehicle),
        mechanic: UserSummary::from(&mechanic),
        assigner: UserSummary::from(&assigner),
        spare_parts,
        order,
    })
}
