//! Servicio de vehículos: alta, consulta, datos descriptivos y precio de venta.
//! Estado y costos solo cambian a través de reparaciones y ventas.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::dto::{
    vehicle_dto::{CreateVehicleRequest, UpdateVehicleRequest},
    Page, Paginated,
};
use crate::models::vehicle::{
    SourceType, Vehicle, VehicleDetailsUpdate, VehicleFilter, VehicleStatus,
};
use crate::repositories::Persistence;
use crate::utils::errors::{conflict_error, not_found_error, AppError, AppResult};

#[derive(Clone)]
pub struct VehicleService {
    store: Arc<dyn Persistence>,
}

impl VehicleService {
    pub fn new(store: Arc<dyn Persistence>) -> Self {
        Self { store }
    }

    pub async fn create(&self, created_by: i32, request: CreateVehicleRequest) -> AppResult<Vehicle> {
        let vehicle = request.into_new_vehicle(created_by);
        let mut uow = self.store.begin().await?;

        if uow.vehicle_code_exists(&vehicle.code).await? {
            warn!("⚠️ Código de vehículo duplicado: {}", vehicle.code);
            return Err(conflict_error("Vehicle", "code", &vehicle.code));
        }

        if let Some(source_id) = vehicle.source_id {
            let exists = match vehicle.source_type {
                SourceType::Customer => uow.find_customer(source_id).await?.is_some(),
                SourceType::Supplier => uow.find_supplier(source_id).await?.is_some(),
            };
            if !exists {
                let resource = match vehicle.source_type {
                    SourceType::Customer => "Customer",
                    SourceType::Supplier => "Supplier",
                };
                return Err(not_found_error(resource, source_id));
            }
        }

        let created = uow.insert_vehicle(vehicle).await?;
        uow.commit().await?;

        info!(
            "🚗 Vehículo {} registrado ({} {} {}) HPP {}",
            created.code, created.brand, created.model, created.year, created.hpp_price
        );
        Ok(created)
    }

    pub async fn get(&self, id: i32) -> AppResult<Vehicle> {
        let mut uow = self.store.begin().await?;
        let vehicle = uow
            .find_vehicle(id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", id))?;
        uow.commit().await?;
        Ok(vehicle)
    }

    pub async fn list(&self, filter: &VehicleFilter, page: Page) -> AppResult<Paginated<Vehicle>> {
        let mut uow = self.store.begin().await?;
        let (items, total) = uow.list_vehicles(filter, page).await?;
        uow.commit().await?;
        Ok(Paginated::new(items, total, page))
    }

    pub async fn update(&self, id: i32, request: UpdateVehicleRequest) -> AppResult<Vehicle> {
        let changes = VehicleDetailsUpdate::from(request);
        let mut uow = self.store.begin().await?;

        if uow.lock_vehicle(id).await?.is_none() {
            return Err(not_found_error("Vehicle", id));
        }
        let updated = uow.update_vehicle_details(id, &changes).await?;
        uow.commit().await?;

        info!("✅ Vehículo {} actualizado", updated.code);
        Ok(updated)
    }

    /// Fijar el precio de venta; solo con el vehículo disponible y nunca bajo el HPP
    pub async fn set_selling_price(&self, id: i32, price: Decimal) -> AppResult<Vehicle> {
        let mut uow = self.store.begin().await?;

        let vehicle = uow
            .lock_vehicle(id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", id))?;
        if vehicle.status != VehicleStatus::Available {
            return Err(AppError::InvalidState(format!(
                "Vehicle {} is {}; selling price can only be set while available",
                vehicle.code, vehicle.status
            )));
        }
        if price < vehicle.hpp_price {
            warn!(
                "⚠️ Precio {} menor al HPP {} del vehículo {}",
                price, vehicle.hpp_price, vehicle.code
            );
            return Err(AppError::InvalidAmount(format!(
                "Selling price {} is below HPP {}",
                price, vehicle.hpp_price
            )));
        }

        let updated = uow.set_vehicle_selling_price(id, price).await?;
        uow.commit().await?;

        info!("🏷️ Vehículo {} con precio de venta {}", updated.code, price);
        Ok(updated)
    }

    /// Borrar un vehículo disponible sin reparaciones ni transacciones
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let mut uow = self.store.begin().await?;

        let vehicle = uow
            .lock_vehicle(id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", id))?;
        if vehicle.status != VehicleStatus::Available {
            return Err(AppError::InvalidState(format!(
                "Vehicle {} is {} and cannot be deleted",
                vehicle.code, vehicle.status
            )));
        }
        if uow.vehicle_has_history(id).await? {
            return Err(AppError::InvalidState(format!(
                "Vehicle {} has repair or transaction history",
                vehicle.code
            )));
        }

        uow.delete_vehicle(id).await?;
        uow.commit().await?;

        info!("🗑️ Vehículo {} eliminado", vehicle.code);
        Ok(())
    }
}
