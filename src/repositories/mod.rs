//! Capa de persistencia
//!
//! Cada operación de negocio abre una unidad de trabajo (`Persistence::begin`)
//! y la confirma con `commit`. Si la unidad se descarta sin confirmar, todos
//! sus cambios se revierten.
//!
//! `UnitOfWork` agrupa un store por entidad. Hay dos implementaciones:
//! PostgreSQL (`PgPersistence`, una transacción sqlx por unidad) y memoria
//! (`MemoryPersistence`, usada por los tests y por `STORAGE_BACKEND=memory`).

pub mod dashboard_repository;
pub mod memory;
pub mod party_repository;
pub mod postgres;
pub mod repair_repository;
pub mod spare_part_repository;
pub mod transaction_repository;
pub mod user_repository;
pub mod vehicle_repository;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::dto::Page;
use crate::models::{
    dashboard::{
        BrandPerformance, DashboardMetrics, MechanicPerformance, PurchaseSummary, SalesSummary,
    },
    party::{Customer, NewCustomer, NewSupplier, PartyFilter, Supplier},
    repair::{
        MechanicWorkload, NewRepairOrder, NewRepairSparePart, RepairOrder, RepairOrderFilter,
        RepairSparePart, RepairStats, RepairStatsFilter, RepairStatus,
    },
    spare_part::{NewSparePart, SparePart, SparePartFilter},
    transaction::{
        NewPurchaseTransaction, NewSalesTransaction, PurchaseTransaction, SalesTransaction,
        TransactionFilter,
    },
    user::{NewUser, User, UserFilter},
    vehicle::{NewVehicle, Vehicle, VehicleDetailsUpdate, VehicleFilter, VehicleStatus},
    DateRange,
};
use crate::utils::errors::AppResult;

pub use memory::MemoryPersistence;
pub use postgres::PgPersistence;

/// Punto de entrada a la persistencia
#[async_trait]
pub trait Persistence: Send + Sync {
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>>;
}

/// Transacción abierta con acceso a todos los stores
#[async_trait]
pub trait UnitOfWork:
    VehicleStore
    + SparePartStore
    + RepairStore
    + UserStore
    + PartyStore
    + TransactionStore
    + DashboardStore
    + Send
{
    async fn commit(&mut self) -> AppResult<()>;
    async fn rollback(&mut self) -> AppResult<()>;
}

#[async_trait]
pub trait VehicleStore: Send {
    async fn find_vehicle(&mut self, id: i32) -> AppResult<Option<Vehicle>>;
    /// Lee el vehículo bloqueando la fila hasta el fin de la unidad de trabajo
    async fn lock_vehicle(&mut self, id: i32) -> AppResult<Option<Vehicle>>;
    async fn vehicle_code_exists(&mut self, code: &str) -> AppResult<bool>;
    async fn insert_vehicle(&mut self, vehicle: NewVehicle) -> AppResult<Vehicle>;
    async fn list_vehicles(
        &mut self,
        filter: &VehicleFilter,
        page: Page,
    ) -> AppResult<(Vec<Vehicle>, i64)>;
    async fn update_vehicle_details(
        &mut self,
        id: i32,
        changes: &VehicleDetailsUpdate,
    ) -> AppResult<Vehicle>;
    async fn update_vehicle_status(&mut self, id: i32, status: VehicleStatus) -> AppResult<()>;
    /// Fija repair_cost y recalcula hpp_price = purchase_price + repair_cost
    async fn update_vehicle_repair_cost(&mut self, id: i32, repair_cost: Decimal)
        -> AppResult<()>;
    async fn set_vehicle_selling_price(&mut self, id: i32, price: Decimal) -> AppResult<Vehicle>;
    async fn mark_vehicle_sold(
        &mut self,
        id: i32,
        sold_price: Decimal,
        sold_date: DateTime<Utc>,
    ) -> AppResult<()>;
    /// true si el vehículo tiene órdenes de reparación o transacciones
    async fn vehicle_has_history(&mut self, id: i32) -> AppResult<bool>;
    async fn delete_vehicle(&mut self, id: i32) -> AppResult<()>;
}

#[async_trait]
pub trait SparePartStore: Send {
    async fn find_spare_part(&mut self, id: i32) -> AppResult<Option<SparePart>>;
    async fn lock_spare_part(&mut self, id: i32) -> AppResult<Option<SparePart>>;
    async fn spare_part_code_exists(&mut self, code: &str) -> AppResult<bool>;
    async fn insert_spare_part(&mut self, part: NewSparePart) -> AppResult<SparePart>;
    /// Guarda los campos editables (no el stock)
    async fn update_spare_part(&mut self, part: &SparePart) -> AppResult<SparePart>;
    /// Suma `delta` (positivo o negativo) al stock actual
    async fn adjust_spare_part_stock(&mut self, id: i32, delta: i32) -> AppResult<SparePart>;
    async fn list_spare_parts(
        &mut self,
        filter: &SparePartFilter,
        page: Page,
    ) -> AppResult<(Vec<SparePart>, i64)>;
    async fn list_low_stock_parts(&mut self) -> AppResult<Vec<SparePart>>;
    /// true si alguna orden de reparación tiene líneas con este repuesto
    async fn spare_part_in_use(&mut self, id: i32) -> AppResult<bool>;
    async fn delete_spare_part(&mut self, id: i32) -> AppResult<()>;
}

#[async_trait]
pub trait RepairStore: Send {
    async fn repair_code_exists(&mut self, code: &str) -> AppResult<bool>;
    async fn insert_repair_order(&mut self, order: NewRepairOrder) -> AppResult<RepairOrder>;
    async fn find_repair_order(&mut self, id: i32) -> AppResult<Option<RepairOrder>>;
    async fn find_repair_order_by_code(&mut self, code: &str) -> AppResult<Option<RepairOrder>>;
    async fn lock_repair_order(&mut self, id: i32) -> AppResult<Option<RepairOrder>>;
    /// Guarda status, actual_cost, notes, started_at y completed_at
    async fn update_repair_order(&mut self, order: &RepairOrder) -> AppResult<RepairOrder>;
    /// Borra la orden junto con sus líneas de repuestos
    async fn delete_repair_order(&mut self, id: i32) -> AppResult<()>;
    async fn list_repair_orders(
        &mut self,
        filter: &RepairOrderFilter,
        page: Page,
    ) -> AppResult<(Vec<RepairOrder>, i64)>;
    async fn repair_stats(&mut self, filter: &RepairStatsFilter) -> AppResult<RepairStats>;
    async fn mechanic_workload(&mut self) -> AppResult<Vec<MechanicWorkload>>;

    async fn list_repair_parts(&mut self, repair_order_id: i32)
        -> AppResult<Vec<RepairSparePart>>;
    async fn find_repair_part(
        &mut self,
        repair_order_id: i32,
        spare_part_id: i32,
    ) -> AppResult<Option<RepairSparePart>>;
    async fn insert_repair_part(&mut self, line: NewRepairSparePart)
        -> AppResult<RepairSparePart>;
    async fn update_repair_part_quantity(
        &mut self,
        line_id: i32,
        quantity_used: i32,
        total_price: Decimal,
    ) -> AppResult<RepairSparePart>;
    async fn delete_repair_part(&mut self, line_id: i32) -> AppResult<()>;
}

#[async_trait]
pub trait UserStore: Send {
    async fn find_user(&mut self, id: i32) -> AppResult<Option<User>>;
    async fn find_user_by_username(&mut self, username: &str) -> AppResult<Option<User>>;
    async fn user_exists(&mut self, username: &str, email: &str) -> AppResult<bool>;
    async fn insert_user(&mut self, user: NewUser) -> AppResult<User>;
    /// Ordenados por nombre completo
    async fn list_users(&mut self, filter: &UserFilter) -> AppResult<Vec<User>>;
}

#[async_trait]
pub trait PartyStore: Send {
    async fn find_customer(&mut self, id: i32) -> AppResult<Option<Customer>>;
    async fn find_customer_by_phone(&mut self, phone: &str) -> AppResult<Option<Customer>>;
    async fn find_customer_by_email(&mut self, email: &str) -> AppResult<Option<Customer>>;
    async fn insert_customer(&mut self, customer: NewCustomer) -> AppResult<Customer>;
    async fn update_customer(&mut self, customer: &Customer) -> AppResult<Customer>;
    async fn list_customers(
        &mut self,
        filter: &PartyFilter,
        page: Page,
    ) -> AppResult<(Vec<Customer>, i64)>;
    /// true si el cliente tiene ventas o es origen de un vehículo o compra
    async fn customer_has_history(&mut self, id: i32) -> AppResult<bool>;
    async fn delete_customer(&mut self, id: i32) -> AppResult<()>;

    async fn find_supplier(&mut self, id: i32) -> AppResult<Option<Supplier>>;
    async fn insert_supplier(&mut self, supplier: NewSupplier) -> AppResult<Supplier>;
    async fn update_supplier(&mut self, supplier: &Supplier) -> AppResult<Supplier>;
    async fn list_suppliers(
        &mut self,
        filter: &PartyFilter,
        page: Page,
    ) -> AppResult<(Vec<Supplier>, i64)>;
    /// true si el proveedor es origen de un vehículo o compra
    async fn supplier_has_history(&mut self, id: i32) -> AppResult<bool>;
    async fn delete_supplier(&mut self, id: i32) -> AppResult<()>;
}

#[async_trait]
pub trait TransactionStore: Send {
    async fn invoice_number_exists(&mut self, invoice_number: &str) -> AppResult<bool>;

    async fn insert_purchase(
        &mut self,
        purchase: NewPurchaseTransaction,
    ) -> AppResult<PurchaseTransaction>;
    async fn find_purchase(&mut self, id: i32) -> AppResult<Option<PurchaseTransaction>>;
    async fn update_purchase(
        &mut self,
        purchase: &PurchaseTransaction,
    ) -> AppResult<PurchaseTransaction>;
    async fn list_purchases(
        &mut self,
        filter: &TransactionFilter,
        page: Page,
    ) -> AppResult<(Vec<PurchaseTransaction>, i64)>;

    async fn insert_sales(&mut self, sales: NewSalesTransaction) -> AppResult<SalesTransaction>;
    async fn find_sales(&mut self, id: i32) -> AppResult<Option<SalesTransaction>>;
    async fn lock_sales(&mut self, id: i32) -> AppResult<Option<SalesTransaction>>;
    /// Guarda estado de pago, montos y notas
    async fn update_sales(&mut self, sales: &SalesTransaction) -> AppResult<SalesTransaction>;
    async fn list_sales(
        &mut self,
        filter: &TransactionFilter,
        page: Page,
    ) -> AppResult<(Vec<SalesTransaction>, i64)>;
}

/// Consultas de solo lectura para los dashboards
#[async_trait]
pub trait DashboardStore: Send {
    async fn count_vehicles_by_status(&mut self, status: VehicleStatus) -> AppResult<i64>;
    async fn count_repairs_by_status(&mut self, status: RepairStatus) -> AppResult<i64>;
    async fn count_low_stock_parts(&mut self) -> AppResult<i64>;
    async fn count_repairs_completed(&mut self, range: DateRange) -> AppResult<i64>;
    async fn sales_summary(&mut self, range: DateRange) -> AppResult<SalesSummary>;
    async fn purchase_summary(&mut self, range: DateRange) -> AppResult<PurchaseSummary>;
    /// Ventas más recientes primero
    async fn recent_sales(&mut self, range: DateRange, limit: i64)
        -> AppResult<Vec<SalesTransaction>>;
    async fn recent_purchases(
        &mut self,
        range: DateRange,
        limit: i64,
    ) -> AppResult<Vec<PurchaseTransaction>>;
    async fn sales_with_pending_payment(&mut self, limit: i64)
        -> AppResult<Vec<SalesTransaction>>;
    async fn list_vehicles_by_status(
        &mut self,
        status: VehicleStatus,
        limit: i64,
    ) -> AppResult<Vec<Vehicle>>;
    async fn top_brand(&mut self, range: DateRange) -> AppResult<Option<BrandPerformance>>;
    async fn top_mechanic(&mut self, range: DateRange) -> AppResult<Option<MechanicPerformance>>;
    async fn top_sale(&mut self, range: DateRange) -> AppResult<Option<SalesTransaction>>;
    /// Órdenes abiertas (pending/in_progress) de un mecánico, o de todos si es None
    async fn open_repairs(
        &mut self,
        mechanic_id: Option<i32>,
        limit: i64,
    ) -> AppResult<Vec<RepairOrder>>;
    async fn repairs_completed_by(
        &mut self,
        mechanic_id: i32,
        range: DateRange,
    ) -> AppResult<Vec<RepairOrder>>;
    /// Repuestos con stock bajo usados en las órdenes abiertas del mecánico
    async fn low_stock_parts_for_mechanic(&mut self, mechanic_id: i32)
        -> AppResult<Vec<SparePart>>;
    async fn upsert_metrics(&mut self, metrics: &DashboardMetrics) -> AppResult<DashboardMetrics>;
}
