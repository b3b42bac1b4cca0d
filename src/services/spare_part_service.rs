//! Servicio de repuestos
//!
//! El stock solo se mueve por ajustes explícitos o por reparaciones y nunca
//! queda negativo.

use std::sync::Arc;

use tracing::{info, warn};

use crate::dto::{
    spare_part_dto::{CreateSparePartRequest, StockAdjustmentRequest, UpdateSparePartRequest},
    Page, Paginated,
};
use crate::models::spare_part::{
    NewSparePart, SparePart, SparePartFilter, SparePartUpdate, StockOperation,
};
use crate::repositories::Persistence;
use crate::utils::errors::{conflict_error, not_found_error, AppError, AppResult};

#[derive(Clone)]
pub struct SparePartService {
    store: Arc<dyn Persistence>,
}

fn check_prices(part: &SparePart) -> AppResult<()> {
    if part.selling_price < part.purchase_price {
        return Err(AppError::InvalidAmount(format!(
            "Selling price {} is below purchase price {}",
            part.selling_price, part.purchase_price
        )));
    }
    Ok(())
}

impl SparePartService {
    pub fn new(store: Arc<dyn Persistence>) -> Self {
        Self { store }
    }

    pub async fn create(&self, request: CreateSparePartRequest) -> AppResult<SparePart> {
        let part = NewSparePart::from(request);
        if part.selling_price < part.purchase_price {
            return Err(AppError::InvalidAmount(format!(
                "Selling price {} is below purchase price {}",
                part.selling_price, part.purchase_price
            )));
        }

        let mut uow = self.store.begin().await?;
        if uow.spare_part_code_exists(&part.code).await? {
            warn!("⚠️ Código de repuesto duplicado: {}", part.code);
            return Err(conflict_error("Spare part", "code", &part.code));
        }
        let created = uow.insert_spare_part(part).await?;
        uow.commit().await?;

        info!(
            "📦 Repuesto {} creado con stock {}",
            created.code, created.stock_quantity
        );
        Ok(created)
    }

    pub async fn get(&self, id: i32) -> AppResult<SparePart> {
        let mut uow = self.store.begin().await?;
        let part = uow
            .find_spare_part(id)
            .await?
            .ok_or_else(|| not_found_error("Spare part", id))?;
        uow.commit().await?;
        Ok(part)
    }

    pub async fn list(
        &self,
        filter: &SparePartFilter,
        page: Page,
    ) -> AppResult<Paginated<SparePart>> {
        let mut uow = self.store.begin().await?;
        let (items, total) = uow.list_spare_parts(filter, page).await?;
        uow.commit().await?;
        Ok(Paginated::new(items, total, page))
    }

    pub async fn low_stock(&self) -> AppResult<Vec<SparePart>> {
        let mut uow = self.store.begin().await?;
        let parts = uow.list_low_stock_parts().await?;
        uow.commit().await?;
        Ok(parts)
    }

    /// Actualizar datos; la regla de precios se comprueba sobre los valores combinados
    pub async fn update(&self, id: i32, request: UpdateSparePartRequest) -> AppResult<SparePart> {
        let changes = SparePartUpdate::from(request);
        let mut uow = self.store.begin().await?;

        let mut part = uow
            .lock_spare_part(id)
            .await?
            .ok_or_else(|| not_found_error("Spare part", id))?;
        changes.apply_to(&mut part);
        check_prices(&part)?;

        let updated = uow.update_spare_part(&part).await?;
        uow.commit().await?;

        info!("✅ Repuesto {} actualizado", updated.code);
        Ok(updated)
    }

    pub async fn adjust_stock(
        &self,
        id: i32,
        request: StockAdjustmentRequest,
    ) -> AppResult<SparePart> {
        let mut uow = self.store.begin().await?;

        let part = uow
            .lock_spare_part(id)
            .await?
            .ok_or_else(|| not_found_error("Spare part", id))?;
        let delta = match request.operation {
            StockOperation::Add => {
                if part.stock_quantity.checked_add(request.quantity).is_none() {
                    warn!(
                        "⚠️ Ajuste rechazado en {}: stock {} + {} fuera de rango",
                        part.code, part.stock_quantity, request.quantity
                    );
                    return Err(AppError::InvalidAmount(format!(
                        "Adding {} units to {} exceeds the maximum stock",
                        request.quantity, part.code
                    )));
                }
                request.quantity
            }
            StockOperation::Subtract => {
                if !part.has_stock_for(request.quantity) {
                    warn!(
                        "⚠️ Ajuste rechazado en {}: stock {}, se pidió restar {}",
                        part.code, part.stock_quantity, request.quantity
                    );
                    return Err(AppError::InsufficientStock {
                        available: part.stock_quantity,
                        requested: request.quantity,
                    });
                }
                -request.quantity
            }
        };

        let updated = uow.adjust_spare_part_stock(id, delta).await?;
        uow.commit().await?;

        info!(
            "📦 Stock de {}: {} -> {}",
            updated.code, part.stock_quantity, updated.stock_quantity
        );
        Ok(updated)
    }

    /// Borrar un repuesto que ninguna orden de reparación haya usado
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let mut uow = self.store.begin().await?;

        let part = uow
            .lock_spare_part(id)
            .await?
            .ok_or_else(|| not_found_error("Spare part", id))?;
        if uow.spare_part_in_use(id).await? {
            warn!("⚠️ Repuesto {} usado en reparaciones, no se borra", part.code);
            return Err(AppError::InvalidState(format!(
                "Spare part {} is used by repair orders; deactivate it instead",
                part.code
            )));
        }

        uow.delete_spare_part(id).await?;
        uow.commit().await?;

        info!("🗑️ Repuesto {} eliminado", part.code);
        Ok(())
    }

    pub async fn check_stock_availability(&self, id: i32, quantity: i32) -> AppResult<bool> {
        let part = self.get(id).await?;
        Ok(part.has_stock_for(quantity))
    }
}
