//! Servicio de clientes y proveedores

use std::sync::Arc;

use tracing::{info, warn};

use crate::dto::{
    party_dto::{
        CreateCustomerRequest, CreateSupplierRequest, UpdateCustomerRequest,
        UpdateSupplierRequest,
    },
    Page, Paginated,
};
use crate::models::party::{
    Customer, CustomerUpdate, NewCustomer, NewSupplier, PartyFilter, Supplier, SupplierUpdate,
};
use crate::repositories::Persistence;
use crate::utils::errors::{not_found_error, AppError, AppResult};

#[derive(Clone)]
pub struct PartyService {
    store: Arc<dyn Persistence>,
}

impl PartyService {
    pub fn new(store: Arc<dyn Persistence>) -> Self {
        Self { store }
    }

    pub async fn create_customer(&self, request: CreateCustomerRequest) -> AppResult<Customer> {
        let mut uow = self.store.begin().await?;
        let customer = uow.insert_customer(NewCustomer::from(request)).await?;
        uow.commit().await?;
        info!("👤 Cliente {} creado ({})", customer.id, customer.name);
        Ok(customer)
    }

    pub async fn get_customer(&self, id: i32) -> AppResult<Customer> {
        let mut uow = self.store.begin().await?;
        let customer = uow
            .find_customer(id)
            .await?
            .ok_or_else(|| not_found_error("Customer", id))?;
        uow.commit().await?;
        Ok(customer)
    }

    pub async fn find_customer_by_phone(&self, phone: &str) -> AppResult<Customer> {
        let mut uow = self.store.begin().await?;
        let customer = uow
            .find_customer_by_phone(phone.trim())
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Customer with phone '{}' not found", phone))
            })?;
        uow.commit().await?;
        Ok(customer)
    }

    pub async fn find_customer_by_email(&self, email: &str) -> AppResult<Customer> {
        let mut uow = self.store.begin().await?;
        let customer = uow
            .find_customer_by_email(email.trim())
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Customer with email '{}' not found", email))
            })?;
        uow.commit().await?;
        Ok(customer)
    }

    pub async fn list_customers(
        &self,
        filter: &PartyFilter,
        page: Page,
    ) -> AppResult<Paginated<Customer>> {
        let mut uow = self.store.begin().await?;
        let (items, total) = uow.list_customers(filter, page).await?;
        uow.commit().await?;
        Ok(Paginated::new(items, total, page))
    }

    pub async fn update_customer(
        &self,
        id: i32,
        request: UpdateCustomerRequest,
    ) -> AppResult<Customer> {
        let mut uow = self.store.begin().await?;
        let mut customer = uow
            .find_customer(id)
            .await?
            .ok_or_else(|| not_found_error("Customer", id))?;
        CustomerUpdate::from(request).apply_to(&mut customer);
        let updated = uow.update_customer(&customer).await?;
        uow.commit().await?;
        info!("✅ Cliente {} actualizado", updated.id);
        Ok(updated)
    }

    /// Solo clientes sin ventas y que no figuren como origen de vehículos o compras
    pub async fn delete_customer(&self, id: i32) -> AppResult<()> {
        let mut uow = self.store.begin().await?;
        let customer = uow
            .find_customer(id)
            .await?
            .ok_or_else(|| not_found_error("Customer", id))?;
        if uow.customer_has_history(id).await? {
            warn!("⚠️ Cliente {} con historial, no se borra", id);
            return Err(AppError::InvalidState(format!(
                "Customer {} has sales or vehicle history",
                customer.name
            )));
        }
        uow.delete_customer(id).await?;
        uow.commit().await?;
        info!("🗑️ Cliente {} eliminado", id);
        Ok(())
    }

    pub async fn create_supplier(&self, request: CreateSupplierRequest) -> AppResult<Supplier> {
        let mut uow = self.store.begin().await?;
        let supplier = uow.insert_supplier(NewSupplier::from(request)).await?;
        uow.commit().await?;
        info!("🏢 Proveedor {} creado ({})", supplier.id, supplier.name);
        Ok(supplier)
    }

    pub async fn get_supplier(&self, id: i32) -> AppResult<Supplier> {
        let mut uow = self.store.begin().await?;
        let supplier = uow
            .find_supplier(id)
            .await?
            .ok_or_else(|| not_found_error("Supplier", id))?;
        uow.commit().await?;
        Ok(supplier)
    }

    pub async fn list_suppliers(
        &self,
        filter: &PartyFilter,
        page: Page,
    ) -> AppResult<Paginated<Supplier>> {
        let mut uow = self.store.begin().await?;
        let (items, total) = uow.list_suppliers(filter, page).await?;
        uow.commit().await?;
        Ok(Paginated::new(items, total, page))
    }

    pub async fn update_supplier(
        &self,
        id: i32,
        request: UpdateSupplierRequest,
    ) -> AppResult<Supplier> {
        let mut uow = self.store.begin().await?;
        let mut supplier = uow
            .find_supplier(id)
            .await?
            .ok_or_else(|| not_found_error("Supplier", id))?;
        SupplierUpdate::from(request).apply_to(&mut supplier);
        let updated = uow.update_supplier(&supplier).await?;
        uow.commit().await?;
        info!("✅ Proveedor {} actualizado", updated.id);
        Ok(updated)
    }

    pub async fn delete_supplier(&self, id: i32) -> AppResult<()> {
        let mut uow = self.store.begin().await?;
        let supplier = uow
            .find_supplier(id)
            .await?
            .ok_or_else(|| not_found_error("Supplier", id))?;
        if uow.supplier_has_history(id).await? {
            warn!("⚠️ Proveedor {} con historial, no se borra", id);
            return Err(AppError::InvalidState(format!(
                "Supplier {} is the source of vehicles or purchases; deactivate it instead",
                supplier.name
            )));
        }
        uow.delete_supplier(id).await?;
        uow.commit().await?;
        info!("🗑️ Proveedor {} eliminado", id);
        Ok(())
    }
}
