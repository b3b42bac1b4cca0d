//! Servicio de compras y ventas de vehículos
//!
//! Una venta marca el vehículo como vendido en la misma unidad de trabajo en
//! la que se registra. El beneficio se calcula una vez y queda guardado.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::dto::{
    transaction_dto::{CreatePurchaseRequest, CreateSalesRequest, PaymentUpdateRequest},
    Page, Paginated,
};
use crate::models::{
    transaction::{
        NewPurchaseTransaction, NewSalesTransaction, PaymentStatus, PurchaseTransaction,
        SalesTransaction, TransactionFilter,
    },
    vehicle::{SourceType, VehicleStatus},
};
use crate::repositories::{Persistence, UnitOfWork};
use crate::utils::codes::{self, InvoiceKind, MAX_CODE_ATTEMPTS};
use crate::utils::errors::{not_found_error, AppError, AppResult};

#[derive(Clone)]
pub struct TransactionService {
    store: Arc<dyn Persistence>,
}

impl TransactionService {
    pub fn new(store: Arc<dyn Persistence>) -> Self {
        Self { store }
    }

    /// Registrar la compra de un vehículo (no cambia su estado)
    pub async fn create_purchase(
        &self,
        processed_by: i32,
        request: CreatePurchaseRequest,
    ) -> AppResult<PurchaseTransaction> {
        let mut uow = self.store.begin().await?;

        let vehicle = uow
            .lock_vehicle(request.vehicle_id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", request.vehicle_id))?;
        if vehicle.status == VehicleStatus::Sold {
            warn!("⚠️ Compra rechazada: vehículo {} ya vendido", vehicle.code);
            return Err(AppError::Conflict(format!(
                "Vehicle {} has been sold",
                vehicle.code
            )));
        }

        let source_exists = match request.source_type {
            SourceType::Customer => uow.find_customer(request.source_id).await?.is_some(),
            SourceType::Supplier => uow.find_supplier(request.source_id).await?.is_some(),
        };
        if !source_exists {
            let resource = match request.source_type {
                SourceType::Customer => "Customer",
                SourceType::Supplier => "Supplier",
            };
            return Err(not_found_error(resource, request.source_id));
        }

        let invoice_number = unique_invoice_number(uow.as_mut(), InvoiceKind::Purchase).await?;
        let purchase = uow
            .insert_purchase(NewPurchaseTransaction {
                invoice_number,
                source_type: request.source_type,
                source_id: request.source_id,
                vehicle_id: vehicle.id,
                purchase_price: request.purchase_price,
                payment_method: request.payment_method,
                payment_status: request.payment_status.unwrap_or(PaymentStatus::Pending),
                notes: request.notes,
                processed_by,
            })
            .await?;

        uow.commit().await?;
        info!(
            "✅ Compra {} registrada para vehículo {}",
            purchase.invoice_number, vehicle.code
        );
        Ok(purchase)
    }

    /// Registrar una venta y marcar el vehículo como vendido
    pub async fn create_sales(
        &self,
        processed_by: i32,
        request: CreateSalesRequest,
    ) -> AppResult<SalesTransaction> {
        let mut uow = self.store.begin().await?;

        // 1. Vehículo disponible
        let vehicle = uow
            .lock_vehicle(request.vehicle_id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", request.vehicle_id))?;
        if vehicle.status != VehicleStatus::Available {
            warn!(
                "⚠️ Venta rechazada: vehículo {} en estado {}",
                vehicle.code, vehicle.status
            );
            return Err(AppError::Conflict(format!(
                "Vehicle {} is {} and cannot be sold",
                vehicle.code, vehicle.status
            )));
        }

        // 2. Cliente
        let customer = uow
            .find_customer(request.customer_id)
            .await?
            .ok_or_else(|| not_found_error("Customer", request.customer_id))?;

        // 3. Importes
        if request.selling_price < vehicle.hpp_price {
            warn!(
                "⚠️ Precio {} menor al HPP {} del vehículo {}",
                request.selling_price, vehicle.hpp_price, vehicle.code
            );
            return Err(AppError::InvalidAmount(format!(
                "Selling price {} is below HPP {}",
                request.selling_price, vehicle.hpp_price
            )));
        }
        let down_payment = request.down_payment.unwrap_or(Decimal::ZERO);
        if down_payment > request.selling_price {
            return Err(AppError::InvalidAmount(format!(
                "Down payment {} exceeds selling price {}",
                down_payment, request.selling_price
            )));
        }
        let payment_status = request
            .payment_status
            .unwrap_or_else(|| PaymentStatus::from_amounts(down_payment, request.selling_price));

        // 4. Registro + vehículo vendido
        let invoice_number = unique_invoice_number(uow.as_mut(), InvoiceKind::Sales).await?;
        let sales = uow
            .insert_sales(NewSalesTransaction {
                invoice_number,
                customer_id: customer.id,
                vehicle_id: vehicle.id,
                hpp_price: vehicle.hpp_price,
                selling_price: request.selling_price,
                profit: request.selling_price - vehicle.hpp_price,
                payment_method: request.payment_method,
                payment_status,
                down_payment,
                remaining_payment: request.selling_price - down_payment,
                notes: request.notes,
                processed_by,
            })
            .await?;
        uow.mark_vehicle_sold(vehicle.id, sales.selling_price, sales.transaction_date)
            .await?;

        uow.commit().await?;
        info!(
            "💰 Venta {}: vehículo {} a {} (beneficio {})",
            sales.invoice_number, vehicle.code, customer.name, sales.profit
        );
        Ok(sales)
    }

    pub async fn get_purchase(&self, id: i32) -> AppResult<PurchaseTransaction> {
        let mut uow = self.store.begin().await?;
        let purchase = uow
            .find_purchase(id)
            .await?
            .ok_or_else(|| not_found_error("Purchase transaction", id))?;
        uow.commit().await?;
        Ok(purchase)
    }

    pub async fn get_sales(&self, id: i32) -> AppResult<SalesTransaction> {
        let mut uow = self.store.begin().await?;
        let sales = uow
            .find_sales(id)
            .await?
            .ok_or_else(|| not_found_error("Sales transaction", id))?;
        uow.commit().await?;
        Ok(sales)
    }

    pub async fn list_purchases(
        &self,
        filter: &TransactionFilter,
        page: Page,
    ) -> AppResult<Paginated<PurchaseTransaction>> {
        let mut uow = self.store.begin().await?;
        let (items, total) = uow.list_purchases(filter, page).await?;
        uow.commit().await?;
        Ok(Paginated::new(items, total, page))
    }

    pub async fn list_sales(
        &self,
        filter: &TransactionFilter,
        page: Page,
    ) -> AppResult<Paginated<SalesTransaction>> {
        let mut uow = self.store.begin().await?;
        let (items, total) = uow.list_sales(filter, page).await?;
        uow.commit().await?;
        Ok(Paginated::new(items, total, page))
    }

    pub async fn update_purchase_payment(
        &self,
        id: i32,
        request: PaymentUpdateRequest,
    ) -> AppResult<PurchaseTransaction> {
        let mut uow = self.store.begin().await?;
        let mut purchase = uow
            .find_purchase(id)
            .await?
            .ok_or_else(|| not_found_error("Purchase transaction", id))?;

        purchase.payment_status = request.payment_status;
        if request.notes.is_some() {
            purchase.notes = request.notes;
        }
        let updated = uow.update_purchase(&purchase).await?;

        uow.commit().await?;
        info!(
            "✅ Pago de compra {} actualizado a {:?}",
            updated.invoice_number, updated.payment_status
        );
        Ok(updated)
    }

    pub async fn update_sales_payment(
        &self,
        id: i32,
        request: PaymentUpdateRequest,
    ) -> AppResult<SalesTransaction> {
        let mut uow = self.store.begin().await?;
        let mut sales = uow
            .lock_sales(id)
            .await?
            .ok_or_else(|| not_found_error("Sales transaction", id))?;

        let (down_payment, remaining_payment) = reconcile_payment(
            sales.selling_price,
            sales.down_payment,
            sales.remaining_payment,
            request.down_payment,
            request.remaining_payment,
        )
        .map_err(|e| {
            warn!("⚠️ Pago rechazado en venta {}: {}", sales.invoice_number, e);
            e
        })?;

        sales.down_payment = down_payment;
        sales.remaining_payment = remaining_payment;
        sales.payment_status = request.payment_status;
        if request.notes.is_some() {
            sales.notes = request.notes;
        }
        let updated = uow.update_sales(&sales).await?;

        uow.commit().await?;
        info!(
            "✅ Pago de venta {} actualizado a {:?}",
            updated.invoice_number, updated.payment_status
        );
        Ok(updated)
    }
}

async fn unique_invoice_number(uow: &mut dyn UnitOfWork, kind: InvoiceKind) -> AppResult<String> {
    let today = Utc::now().date_naive();
    for _ in 0..MAX_CODE_ATTEMPTS {
        let candidate = codes::invoice_number(kind, today);
        if !uow.invoice_number_exists(&candidate).await? {
            return Ok(candidate);
        }
    }
    Err(AppError::Conflict(
        "Could not generate a unique invoice number".to_string(),
    ))
}

/// Nuevo par (anticipo, saldo) de una venta.
///
/// Con ambos importes la suma debe coincidir con el precio; con uno solo el
/// otro se deduce; sin ninguno se conservan los actuales.
pub fn reconcile_payment(
    selling_price: Decimal,
    current_down: Decimal,
    current_remaining: Decimal,
    down_payment: Option<Decimal>,
    remaining_payment: Option<Decimal>,
) -> AppResult<(Decimal, Decimal)> {
    match (down_payment, remaining_payment) {
        (Some(down), Some(remaining)) => {
            if down + remaining != selling_price {
                return Err(AppError::InvalidAmount(format!(
                    "Down payment {} plus remaining {} must equal selling price {}",
                    down, remaining, selling_price
                )));
            }
            Ok((down, remaining))
        }
        (Some(down), None) => {
            if down > selling_price {
                return Err(AppError::InvalidAmount(format!(
                    "Down payment {} exceeds selling price {}",
                    down, selling_price
                )));
            }
            Ok((down, selling_price - down))
        }
        (None, Some(remaining)) => {
            if remaining > selling_price {
                return Err(AppError::InvalidAmount(format!(
                    "Remaining payment {} exceeds selling price {}",
                    remaining, selling_price
                )));
            }
            Ok((selling_price - remaining, remaining))
        }
        (None, None) => Ok((current_down, current_remaining)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_both_amounts_must_add_up() {
        assert_eq!(
            reconcile_payment(dec!(100), dec!(0), dec!(100), Some(dec!(40)), Some(dec!(60)))
                .unwrap(),
            (dec!(40), dec!(60))
        );
        assert!(matches!(
            reconcile_payment(dec!(100), dec!(0), dec!(100), Some(dec!(40)), Some(dec!(50))),
            Err(AppError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_single_amount_derives_the_other() {
        assert_eq!(
            reconcile_payment(dec!(100), dec!(0), dec!(100), Some(dec!(30)), None).unwrap(),
            (dec!(30), dec!(70))
        );
        assert_eq!(
            reconcile_payment(dec!(100), dec!(0), dec!(100), None, Some(dec!(25))).unwrap(),
            (dec!(75), dec!(25))
        );
        assert!(reconcile_payment(dec!(100), dec!(0), dec!(100), Some(dec!(101)), None).is_err());
        assert!(reconcile_payment(dec!(100), dec!(0), dec!(100), None, Some(dec!(101))).is_err());
    }

    #[test]
    fn test_no_amounts_keeps_current() {
        assert_eq!(
            reconcile_payment(dec!(100), dec!(20), dec!(80), None, None).unwrap(),
            (dec!(20), dec!(80))
        );
    }
}
