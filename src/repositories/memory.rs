//! Persistencia en memoria
//!
//! `begin` toma el mutex del estado y trabaja sobre una copia; `commit` la
//! vuelca de vuelta. Las unidades de trabajo quedan serializadas, así que los
//! bloqueos de fila son lecturas normales.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{
    DashboardStore, PartyStore, Persistence, RepairStore, SparePartStore, TransactionStore,
    UnitOfWork, UserStore, VehicleStore,
};
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
        NewPurchaseTransaction, NewSalesTransaction, PaymentStatus, PurchaseTransaction,
        SalesTransaction, TransactionFilter,
    },
    user::{NewUser, User, UserFilter, UserRole},
    vehicle::{
        NewVehicle, SourceType, Vehicle, VehicleDetailsUpdate, VehicleFilter, VehicleStatus,
    },
    DateRange,
};
use crate::utils::errors::{conflict_error, not_found_error, AppError, AppResult};

#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    sequences: HashMap<&'static str, i32>,
    users: BTreeMap<i32, User>,
    customers: BTreeMap<i32, Customer>,
    suppliers: BTreeMap<i32, Supplier>,
    vehicles: BTreeMap<i32, Vehicle>,
    spare_parts: BTreeMap<i32, SparePart>,
    repair_orders: BTreeMap<i32, RepairOrder>,
    repair_parts: BTreeMap<i32, RepairSparePart>,
    purchases: BTreeMap<i32, PurchaseTransaction>,
    sales: BTreeMap<i32, SalesTransaction>,
    metrics: BTreeMap<NaiveDate, DashboardMetrics>,
}

impl MemoryState {
    fn next_id(&mut self, table: &'static str) -> i32 {
        let id = self.sequences.entry(table).or_insert(0);
        *id += 1;
        *id
    }

    /// Vehículos o compras cuyo origen es este cliente/proveedor
    fn has_source(&self, source_type: SourceType, id: i32) -> bool {
        self.vehicles
            .values()
            .any(|v| v.source_type == source_type && v.source_id == Some(id))
            || self
                .purchases
                .values()
                .any(|p| p.source_type == source_type && p.source_id == id)
    }
}

/// Ordena de más nuevo a más viejo y pagina
fn newest_first<T: Clone>(
    mut items: Vec<T>,
    key: impl Fn(&T) -> (DateTime<Utc>, i32),
    page: Page,
) -> (Vec<T>, i64) {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
    let total = items.len() as i64;
    (page.slice(&items), total)
}

#[derive(Clone, Default)]
pub struct MemoryPersistence {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Persistence for MemoryPersistence {
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>> {
        let guard = self.state.clone().lock_owned().await;
        let work = guard.clone();
        Ok(Box::new(MemoryUnitOfWork {
            guard: Some(guard),
            work,
        }))
    }
}

pub struct MemoryUnitOfWork {
    guard: Option<OwnedMutexGuard<MemoryState>>,
    work: MemoryState,
}

impl MemoryUnitOfWork {
    fn state(&mut self) -> AppResult<&mut MemoryState> {
        if self.guard.is_none() {
            return Err(AppError::Internal("Unidad de trabajo ya finalizada".to_string()));
        }
        Ok(&mut self.work)
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn commit(&mut self) -> AppResult<()> {
        if let Some(mut guard) = self.guard.take() {
            *guard = std::mem::take(&mut self.work);
        }
        Ok(())
    }

    async fn rollback(&mut self) -> AppResult<()> {
        self.guard.take();
        Ok(())
    }
}

#[async_trait]
impl VehicleStore for MemoryUnitOfWork {
    async fn find_vehicle(&mut self, id: i32) -> AppResult<Option<Vehicle>> {
        Ok(self.state()?.vehicles.get(&id).cloned())
    }

    async fn lock_vehicle(&mut self, id: i32) -> AppResult<Option<Vehicle>> {
        self.find_vehicle(id).await
    }

    async fn vehicle_code_exists(&mut self, code: &str) -> AppResult<bool> {
        Ok(self.state()?.vehicles.values().any(|v| v.code == code))
    }

    async fn insert_vehicle(&mut self, vehicle: NewVehicle) -> AppResult<Vehicle> {
        let state = self.state()?;
        if state.vehicles.values().any(|v| v.code == vehicle.code) {
            return Err(conflict_error("Vehicle", "code", &vehicle.code));
        }
        let now = Utc::now();
        let created = Vehicle {
            id: state.next_id("vehicles"),
            code: vehicle.code,
            brand: vehicle.brand,
            model: vehicle.model,
            year: vehicle.year,
            color: vehicle.color,
            license_plate: vehicle.license_plate,
            chassis_number: vehicle.chassis_number,
            odometer: vehicle.odometer,
            source_type: vehicle.source_type,
            source_id: vehicle.source_id,
            purchase_price: vehicle.purchase_price,
            condition_status: vehicle.condition_status,
            status: VehicleStatus::Available,
            repair_cost: Decimal::ZERO,
            hpp_price: vehicle.purchase_price,
            selling_price: None,
            sold_price: None,
            sold_date: None,
            notes: vehicle.notes,
            created_by: vehicle.created_by,
            created_at: now,
            updated_at: now,
        };
        state.vehicles.insert(created.id, created.clone());
        Ok(created)
    }

    async fn list_vehicles(
        &mut self,
        filter: &VehicleFilter,
        page: Page,
    ) -> AppResult<(Vec<Vehicle>, i64)> {
        let items = self
            .state()?
            .vehicles
            .values()
            .filter(|v| filter.matches(v))
            .cloned()
            .collect();
        Ok(newest_first(items, |v: &Vehicle| (v.created_at, v.id), page))
    }

    async fn update_vehicle_details(
        &mut self,
        id: i32,
        changes: &VehicleDetailsUpdate,
    ) -> AppResult<Vehicle> {
        let vehicle = self
            .state()?
            .vehicles
            .get_mut(&id)
            .ok_or_else(|| not_found_error("Vehicle", id))?;
        changes.apply_to(vehicle);
        vehicle.updated_at = Utc::now();
        Ok(vehicle.clone())
    }

    async fn update_vehicle_status(&mut self, id: i32, status: VehicleStatus) -> AppResult<()> {
        let vehicle = self
            .state()?
            .vehicles
            .get_mut(&id)
            .ok_or_else(|| not_found_error("Vehicle", id))?;
        vehicle.status = status;
        vehicle.updated_at = Utc::now();
        Ok(())
    }

    async fn update_vehicle_repair_cost(
        &mut self,
        id: i32,
        repair_cost: Decimal,
    ) -> AppResult<()> {
        let vehicle = self
            .state()?
            .vehicles
            .get_mut(&id)
            .ok_or_else(|| not_found_error("Vehicle", id))?;
        vehicle.repair_cost = repair_cost;
        vehicle.hpp_price = vehicle.purchase_price + repair_cost;
        vehicle.updated_at = Utc::now();
        Ok(())
    }

    async fn set_vehicle_selling_price(&mut self, id: i32, price: Decimal) -> AppResult<Vehicle> {
        let vehicle = self
            .state()?
            .vehicles
            .get_mut(&id)
            .ok_or_else(|| not_found_error("Vehicle", id))?;
        vehicle.selling_price = Some(price);
        vehicle.updated_at = Utc::now();
        Ok(vehicle.clone())
    }

    async fn mark_vehicle_sold(
        &mut self,
        id: i32,
        sold_price: Decimal,
        sold_date: DateTime<Utc>,
    ) -> AppResult<()> {
        let vehicle = self
            .state()?
            .vehicles
            .get_mut(&id)
            .ok_or_else(|| not_found_error("Vehicle", id))?;
        vehicle.status = VehicleStatus::Sold;
        vehicle.sold_price = Some(sold_price);
        vehicle.sold_date = Some(sold_date);
        vehicle.updated_at = Utc::now();
        Ok(())
    }

    async fn vehicle_has_history(&mut self, id: i32) -> AppResult<bool> {
        let state = self.state()?;
        Ok(state.repair_orders.values().any(|r| r.vehicle_id == id)
            || state.sales.values().any(|s| s.vehicle_id == id)
            || state.purchases.values().any(|p| p.vehicle_id == id))
    }

    async fn delete_vehicle(&mut self, id: i32) -> AppResult<()> {
        self.state()?
            .vehicles
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found_error("Vehicle", id))
    }
}

#[async_trait]
impl SparePartStore for MemoryUnitOfWork {
    async fn find_spare_part(&mut self, id: i32) -> AppResult<Option<SparePart>> {
        Ok(self.state()?.spare_parts.get(&id).cloned())
    }

    async fn lock_spare_part(&mut self, id: i32) -> AppResult<Option<SparePart>> {
        self.find_spare_part(id).await
    }

    async fn spare_part_code_exists(&mut self, code: &str) -> AppResult<bool> {
        Ok(self.state()?.spare_parts.values().any(|p| p.code == code))
    }

    async fn insert_spare_part(&mut self, part: NewSparePart) -> AppResult<SparePart> {
        let state = self.state()?;
        if state.spare_parts.values().any(|p| p.code == part.code) {
            return Err(conflict_error("Spare part", "code", &part.code));
        }
        let now = Utc::now();
        let created = SparePart {
            id: state.next_id("spare_parts"),
            code: part.code,
            name: part.name,
            description: part.description,
            category: part.category,
            unit: part.unit,
            purchase_price: part.purchase_price,
            selling_price: part.selling_price,
            stock_quantity: part.stock_quantity,
            minimum_stock: part.minimum_stock,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        state.spare_parts.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_spare_part(&mut self, part: &SparePart) -> AppResult<SparePart> {
        let stored = self
            .state()?
            .spare_parts
            .get_mut(&part.id)
            .ok_or_else(|| not_found_error("Spare part", part.id))?;
        let stock_quantity = stored.stock_quantity;
        *stored = SparePart {
            stock_quantity,
            updated_at: Utc::now(),
            ..part.clone()
        };
        Ok(stored.clone())
    }

    async fn adjust_spare_part_stock(&mut self, id: i32, delta: i32) -> AppResult<SparePart> {
        let part = self
            .state()?
            .spare_parts
            .get_mut(&id)
            .ok_or_else(|| not_found_error("Spare part", id))?;
        let next = part.stock_quantity.checked_add(delta).ok_or_else(|| {
            AppError::InvalidAmount(format!("Stock of {} out of range", part.code))
        })?;
        if next < 0 {
            // Mismo resultado que el CHECK (stock_quantity >= 0) de PostgreSQL
            return Err(AppError::InsufficientStock {
                available: part.stock_quantity,
                requested: -delta,
            });
        }
        part.stock_quantity = next;
        part.updated_at = Utc::now();
        Ok(part.clone())
    }

    async fn list_spare_parts(
        &mut self,
        filter: &SparePartFilter,
        page: Page,
    ) -> AppResult<(Vec<SparePart>, i64)> {
        let mut items: Vec<SparePart> = self
            .state()?
            .spare_parts
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        items.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        let total = items.len() as i64;
        Ok((page.slice(&items), total))
    }

    async fn list_low_stock_parts(&mut self) -> AppResult<Vec<SparePart>> {
        let mut items: Vec<SparePart> = self
            .state()?
            .spare_parts
            .values()
            .filter(|p| p.is_active && p.is_low_stock())
            .cloned()
            .collect();
        items.sort_by(|a, b| a.stock_quantity.cmp(&b.stock_quantity).then(a.id.cmp(&b.id)));
        Ok(items)
    }

    async fn spare_part_in_use(&mut self, id: i32) -> AppResult<bool> {
        Ok(self
            .state()?
            .repair_parts
            .values()
            .any(|line| line.spare_part_id == id))
    }

    async fn delete_spare_part(&mut self, id: i32) -> AppResult<()> {
        self.state()?
            .spare_parts
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found_error("Spare part", id))
    }
}

#[async_trait]
impl RepairStore for MemoryUnitOfWork {
    async fn repair_code_exists(&mut self, code: &str) -> AppResult<bool> {
        Ok(self.state()?.repair_orders.values().any(|r| r.code == code))
    }

    async fn insert_repair_order(&mut self, order: NewRepairOrder) -> AppResult<RepairOrder> {
        let state = self.state()?;
        if state.repair_orders.values().any(|r| r.code == order.code) {
            return Err(conflict_error("Repair order", "code", &order.code));
        }
        let now = Utc::now();
        let created = RepairOrder {
            id: state.next_id("repair_orders"),
            code: order.code,
            vehicle_id: order.vehicle_id,
            mechanic_id: order.mechanic_id,
            assigned_by: order.assigned_by,
            description: order.description,
            estimated_cost: order.estimated_cost,
            actual_cost: Decimal::ZERO,
            status: RepairStatus::Pending,
            started_at: None,
            completed_at: None,
            notes: order.notes,
            created_at: now,
            updated_at: now,
        };
        state.repair_orders.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_repair_order(&mut self, id: i32) -> AppResult<Option<RepairOrder>> {
        Ok(self.state()?.repair_orders.get(&id).cloned())
    }

    async fn find_repair_order_by_code(&mut self, code: &str) -> AppResult<Option<RepairOrder>> {
        Ok(self
            .state()?
            .repair_orders
            .values()
            .find(|r| r.code == code)
            .cloned())
    }

    async fn lock_repair_order(&mut self, id: i32) -> AppResult<Option<RepairOrder>> {
        self.find_repair_order(id).await
    }

    async fn update_repair_order(&mut self, order: &RepairOrder) -> AppResult<RepairOrder> {
        let stored = self
            .state()?
            .repair_orders
            .get_mut(&order.id)
            .ok_or_else(|| not_found_error("Repair order", order.id))?;
        stored.status = order.status;
        stored.actual_cost = order.actual_cost;
        stored.notes = order.notes.clone();
        stored.started_at = order.started_at;
        stored.completed_at = order.completed_at;
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn delete_repair_order(&mut self, id: i32) -> AppResult<()> {
        let state = self.state()?;
        state
            .repair_orders
            .remove(&id)
            .ok_or_else(|| not_found_error("Repair order", id))?;
        state.repair_parts.retain(|_, line| line.repair_order_id != id);
        Ok(())
    }

    async fn list_repair_orders(
        &mut self,
        filter: &RepairOrderFilter,
        page: Page,
    ) -> AppResult<(Vec<RepairOrder>, i64)> {
        let items = self
            .state()?
            .repair_orders
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        Ok(newest_first(items, |r: &RepairOrder| (r.created_at, r.id), page))
    }

    async fn repair_stats(&mut self, filter: &RepairStatsFilter) -> AppResult<RepairStats> {
        let filter = filter.as_order_filter();
        Ok(RepairStats::from_orders(
            self.state()?
                .repair_orders
                .values()
                .filter(|r| filter.matches(r)),
        ))
    }

    async fn mechanic_workload(&mut self) -> AppResult<Vec<MechanicWorkload>> {
        let state = self.state()?;
        Ok(state
            .users
            .values()
            .filter(|u| u.role == UserRole::Mechanic && u.is_active)
            .map(|u| {
                let count = |status: RepairStatus| {
                    state
                        .repair_orders
                        .values()
                        .filter(|r| r.mechanic_id == u.id && r.status == status)
                        .count() as i64
                };
                MechanicWorkload {
                    mechanic_id: u.id,
                    full_name: u.full_name.clone(),
                    pending: count(RepairStatus::Pending),
                    in_progress: count(RepairStatus::InProgress),
                }
            })
            .collect())
    }

    async fn list_repair_parts(
        &mut self,
        repair_order_id: i32,
    ) -> AppResult<Vec<RepairSparePart>> {
        Ok(self
            .state()?
            .repair_parts
            .values()
            .filter(|line| line.repair_order_id == repair_order_id)
            .cloned()
            .collect())
    }

    async fn find_repair_part(
        &mut self,
        repair_order_id: i32,
        spare_part_id: i32,
    ) -> AppResult<Option<RepairSparePart>> {
        Ok(self
            .state()?
            .repair_parts
            .values()
            .find(|line| {
                line.repair_order_id == repair_order_id && line.spare_part_id == spare_part_id
            })
            .cloned())
    }

    async fn insert_repair_part(
        &mut self,
        line: NewRepairSparePart,
    ) -> AppResult<RepairSparePart> {
        let state = self.state()?;
        if state.repair_parts.values().any(|l| {
            l.repair_order_id == line.repair_order_id && l.spare_part_id == line.spare_part_id
        }) {
            return Err(AppError::Conflict(format!(
                "Spare part {} already attached to repair order {}",
                line.spare_part_id, line.repair_order_id
            )));
        }
        let created = RepairSparePart {
            id: state.next_id("repair_spare_parts"),
            repair_order_id: line.repair_order_id,
            spare_part_id: line.spare_part_id,
            quantity_used: line.quantity_used,
            unit_price: line.unit_price,
            total_price: line.total_price(),
            created_at: Utc::now(),
        };
        state.repair_parts.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_repair_part_quantity(
        &mut self,
        line_id: i32,
        quantity_used: i32,
        total_price: Decimal,
    ) -> AppResult<RepairSparePart> {
        let line = self
            .state()?
            .repair_parts
            .get_mut(&line_id)
            .ok_or_else(|| not_found_error("Repair spare part", line_id))?;
        line.quantity_used = quantity_used;
        line.total_price = total_price;
        Ok(line.clone())
    }

    async fn delete_repair_part(&mut self, line_id: i32) -> AppResult<()> {
        self.state()?
            .repair_parts
            .remove(&line_id)
            .map(|_| ())
            .ok_or_else(|| not_found_error("Repair spare part", line_id))
    }
}

#[async_trait]
impl UserStore for MemoryUnitOfWork {
    async fn find_user(&mut self, id: i32) -> AppResult<Option<User>> {
        Ok(self.state()?.users.get(&id).cloned())
    }

    async fn find_user_by_username(&mut self, username: &str) -> AppResult<Option<User>> {
        Ok(self
            .state()?
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn user_exists(&mut self, username: &str, email: &str) -> AppResult<bool> {
        Ok(self
            .state()?
            .users
            .values()
            .any(|u| u.username == username || u.email == email))
    }

    async fn insert_user(&mut self, user: NewUser) -> AppResult<User> {
        let state = self.state()?;
        if state.users.values().any(|u| u.username == user.username) {
            return Err(conflict_error("User", "username", &user.username));
        }
        let now = Utc::now();
        let created = User {
            id: state.next_id("users"),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            full_name: user.full_name,
            phone: user.phone,
            role: user.role,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn list_users(&mut self, filter: &UserFilter) -> AppResult<Vec<User>> {
        let mut users: Vec<User> = self
            .state()?
            .users
            .values()
            .filter(|u| filter.matches(u))
            .cloned()
            .collect();
        users.sort_by(|a, b| a.full_name.cmp(&b.full_name).then(a.id.cmp(&b.id)));
        Ok(users)
    }
}

#[async_trait]
impl PartyStore for MemoryUnitOfWork {
    async fn find_customer(&mut self, id: i32) -> AppResult<Option<Customer>> {
        Ok(self.state()?.customers.get(&id).cloned())
    }

    async fn find_customer_by_phone(&mut self, phone: &str) -> AppResult<Option<Customer>> {
        Ok(self
            .state()?
            .customers
            .values()
            .find(|c| c.phone.as_deref() == Some(phone))
            .cloned())
    }

    async fn find_customer_by_email(&mut self, email: &str) -> AppResult<Option<Customer>> {
        Ok(self
            .state()?
            .customers
            .values()
            .find(|c| {
                c.email
                    .as_deref()
                    .is_some_and(|e| e.eq_ignore_ascii_case(email))
            })
            .cloned())
    }

    async fn insert_customer(&mut self, customer: NewCustomer) -> AppResult<Customer> {
        let state = self.state()?;
        let now = Utc::now();
        let created = Customer {
            id: state.next_id("customers"),
            name: customer.name,
            phone: customer.phone,
            email: customer.email,
            address: customer.address,
            id_card_number: customer.id_card_number,
            created_at: now,
            updated_at: now,
        };
        state.customers.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_customer(&mut self, customer: &Customer) -> AppResult<Customer> {
        let stored = self
            .state()?
            .customers
            .get_mut(&customer.id)
            .ok_or_else(|| not_found_error("Customer", customer.id))?;
        *stored = Customer {
            updated_at: Utc::now(),
            ..customer.clone()
        };
        Ok(stored.clone())
    }

    async fn list_customers(
        &mut self,
        filter: &PartyFilter,
        page: Page,
    ) -> AppResult<(Vec<Customer>, i64)> {
        let mut items: Vec<Customer> = self
            .state()?
            .customers
            .values()
            .filter(|c| filter.matches(&c.name, c.phone.as_deref()))
            .cloned()
            .collect();
        items.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        let total = items.len() as i64;
        Ok((page.slice(&items), total))
    }

    async fn customer_has_history(&mut self, id: i32) -> AppResult<bool> {
        let state = self.state()?;
        Ok(state.sales.values().any(|s| s.customer_id == id)
            || state.has_source(SourceType::Customer, id))
    }

    async fn delete_customer(&mut self, id: i32) -> AppResult<()> {
        self.state()?
            .customers
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found_error("Customer", id))
    }

    async fn find_supplier(&mut self, id: i32) -> AppResult<Option<Supplier>> {
        Ok(self.state()?.suppliers.get(&id).cloned())
    }

    async fn insert_supplier(&mut self, supplier: NewSupplier) -> AppResult<Supplier> {
        let state = self.state()?;
        let now = Utc::now();
        let created = Supplier {
            id: state.next_id("suppliers"),
            name: supplier.name,
            contact_person: supplier.contact_person,
            phone: supplier.phone,
            email: supplier.email,
            address: supplier.address,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        state.suppliers.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_supplier(&mut self, supplier: &Supplier) -> AppResult<Supplier> {
        let stored = self
            .state()?
            .suppliers
            .get_mut(&supplier.id)
            .ok_or_else(|| not_found_error("Supplier", supplier.id))?;
        *stored = Supplier {
            updated_at: Utc::now(),
            ..supplier.clone()
        };
        Ok(stored.clone())
    }

    async fn list_suppliers(
        &mut self,
        filter: &PartyFilter,
        page: Page,
    ) -> AppResult<(Vec<Supplier>, i64)> {
        let mut items: Vec<Supplier> = self
            .state()?
            .suppliers
            .values()
            .filter(|s| filter.matches(&s.name, s.phone.as_deref()))
            .cloned()
            .collect();
        items.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        let total = items.len() as i64;
        Ok((page.slice(&items), total))
    }

    async fn supplier_has_history(&mut self, id: i32) -> AppResult<bool> {
        Ok(self.state()?.has_source(SourceType::Supplier, id))
    }

    async fn delete_supplier(&mut self, id: i32) -> AppResult<()> {
        self.state()?
            .suppliers
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found_error("Supplier", id))
    }
}

#[async_trait]
impl TransactionStore for MemoryUnitOfWork {
    async fn invoice_number_exists(&mut self, invoice_number: &str) -> AppResult<bool> {
        let state = self.state()?;
        Ok(state.sales.values().any(|s| s.invoice_number == invoice_number)
            || state
                .purchases
                .values()
                .any(|p| p.invoice_number == invoice_number))
    }

    async fn insert_purchase(
        &mut self,
        purchase: NewPurchaseTransaction,
    ) -> AppResult<PurchaseTransaction> {
        let state = self.state()?;
        let now = Utc::now();
        let created = PurchaseTransaction {
            id: state.next_id("purchase_transactions"),
            invoice_number: purchase.invoice_number,
            transaction_date: now,
            source_type: purchase.source_type,
            source_id: purchase.source_id,
            vehicle_id: purchase.vehicle_id,
            purchase_price: purchase.purchase_price,
            payment_method: purchase.payment_method,
            payment_status: purchase.payment_status,
            notes: purchase.notes,
            processed_by: purchase.processed_by,
            created_at: now,
            updated_at: now,
        };
        state.purchases.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_purchase(&mut self, id: i32) -> AppResult<Option<PurchaseTransaction>> {
        Ok(self.state()?.purchases.get(&id).cloned())
    }

    async fn update_purchase(
        &mut self,
        purchase: &PurchaseTransaction,
    ) -> AppResult<PurchaseTransaction> {
        let stored = self
            .state()?
            .purchases
            .get_mut(&purchase.id)
            .ok_or_else(|| not_found_error("Purchase transaction", purchase.id))?;
        stored.payment_status = purchase.payment_status;
        stored.notes = purchase.notes.clone();
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn list_purchases(
        &mut self,
        filter: &TransactionFilter,
        page: Page,
    ) -> AppResult<(Vec<PurchaseTransaction>, i64)> {
        let range = filter.range();
        let items = self
            .state()?
            .purchases
            .values()
            .filter(|p| range.contains(p.transaction_date))
            .cloned()
            .collect();
        Ok(newest_first(
            items,
            |p: &PurchaseTransaction| (p.transaction_date, p.id),
            page,
        ))
    }

    async fn insert_sales(&mut self, sales: NewSalesTransaction) -> AppResult<SalesTransaction> {
        let state = self.state()?;
        let now = Utc::now();
        let created = SalesTransaction {
            id: state.next_id("sales_transactions"),
            invoice_number: sales.invoice_number,
            transaction_date: now,
            customer_id: sales.customer_id,
            vehicle_id: sales.vehicle_id,
            hpp_price: sales.hpp_price,
            selling_price: sales.selling_price,
            profit: sales.profit,
            payment_method: sales.payment_method,
            payment_status: sales.payment_status,
            down_payment: sales.down_payment,
            remaining_payment: sales.remaining_payment,
            notes: sales.notes,
            processed_by: sales.processed_by,
            created_at: now,
            updated_at: now,
        };
        state.sales.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_sales(&mut self, id: i32) -> AppResult<Option<SalesTransaction>> {
        Ok(self.state()?.sales.get(&id).cloned())
    }

    async fn lock_sales(&mut self, id: i32) -> AppResult<Option<SalesTransaction>> {
        self.find_sales(id).await
    }

    async fn update_sales(&mut self, sales: &SalesTransaction) -> AppResult<SalesTransaction> {
        let stored = self
            .state()?
            .sales
            .get_mut(&sales.id)
            .ok_or_else(|| not_found_error("Sales transaction", sales.id))?;
        stored.payment_status = sales.payment_status;
        stored.down_payment = sales.down_payment;
        stored.remaining_payment = sales.remaining_payment;
        stored.notes = sales.notes.clone();
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn list_sales(
        &mut self,
        filter: &TransactionFilter,
        page: Page,
    ) -> AppResult<(Vec<SalesTransaction>, i64)> {
        let range = filter.range();
        let items = self
            .state()?
            .sales
            .values()
            .filter(|s| range.contains(s.transaction_date))
            .cloned()
            .collect();
        Ok(newest_first(
            items,
            |s: &SalesTransaction| (s.transaction_date, s.id),
            page,
        ))
    }
}

fn take_newest<T: Clone>(
    items: Vec<T>,
    key: impl Fn(&T) -> (DateTime<Utc>, i32),
    limit: i64,
) -> Vec<T> {
    let page = Page {
        page: 1,
        page_size: limit.max(0),
    };
    newest_first(items, key, page).0
}

#[async_trait]
impl DashboardStore for MemoryUnitOfWork {
    async fn count_vehicles_by_status(&mut self, status: VehicleStatus) -> AppResult<i64> {
        Ok(self
            .state()?
            .vehicles
            .values()
            .filter(|v| v.status == status)
            .count() as i64)
    }

    async fn count_repairs_by_status(&mut self, status: RepairStatus) -> AppResult<i64> {
        Ok(self
            .state()?
            .repair_orders
            .values()
            .filter(|r| r.status == status)
            .count() as i64)
    }

    async fn count_low_stock_parts(&mut self) -> AppResult<i64> {
        Ok(self.list_low_stock_parts().await?.len() as i64)
    }

    async fn count_repairs_completed(&mut self, range: DateRange) -> AppResult<i64> {
        Ok(self
            .state()?
            .repair_orders
            .values()
            .filter(|r| r.status == RepairStatus::Completed)
            .filter(|r| r.completed_at.is_some_and(|at| range.contains(at)))
            .count() as i64)
    }

    async fn sales_summary(&mut self, range: DateRange) -> AppResult<SalesSummary> {
        Ok(self
            .state()?
            .sales
            .values()
            .filter(|s| range.contains(s.transaction_date))
            .fold(SalesSummary::default(), |mut acc, s| {
                acc.count += 1;
                acc.revenue += s.selling_price;
                acc.profit += s.profit;
                acc
            }))
    }

    async fn purchase_summary(&mut self, range: DateRange) -> AppResult<PurchaseSummary> {
        Ok(self
            .state()?
            .purchases
            .values()
            .filter(|p| range.contains(p.transaction_date))
            .fold(PurchaseSummary::default(), |mut acc, p| {
                acc.count += 1;
                acc.total += p.purchase_price;
                acc
            }))
    }

    async fn recent_sales(
        &mut self,
        range: DateRange,
        limit: i64,
    ) -> AppResult<Vec<SalesTransaction>> {
        let items = self
            .state()?
            .sales
            .values()
            .filter(|s| range.contains(s.transaction_date))
            .cloned()
            .collect();
        Ok(take_newest(
            items,
            |s: &SalesTransaction| (s.transaction_date, s.id),
            limit,
        ))
    }

    async fn recent_purchases(
        &mut self,
        range: DateRange,
        limit: i64,
    ) -> AppResult<Vec<PurchaseTransaction>> {
        let items = self
            .state()?
            .purchases
            .values()
            .filter(|p| range.contains(p.transaction_date))
            .cloned()
            .collect();
        Ok(take_newest(
            items,
            |p: &PurchaseTransaction| (p.transaction_date, p.id),
            limit,
        ))
    }

    async fn sales_with_pending_payment(
        &mut self,
        limit: i64,
    ) -> AppResult<Vec<SalesTransaction>> {
        let items = self
            .state()?
            .sales
            .values()
            .filter(|s| s.payment_status != PaymentStatus::Paid)
            .cloned()
            .collect();
        Ok(take_newest(
            items,
            |s: &SalesTransaction| (s.transaction_date, s.id),
            limit,
        ))
    }

    async fn list_vehicles_by_status(
        &mut self,
        status: VehicleStatus,
        limit: i64,
    ) -> AppResult<Vec<Vehicle>> {
        let items = self
            .state()?
            .vehicles
            .values()
            .filter(|v| v.status == status)
            .cloned()
            .collect();
        Ok(take_newest(items, |v: &Vehicle| (v.created_at, v.id), limit))
    }

    async fn top_brand(&mut self, range: DateRange) -> AppResult<Option<BrandPerformance>> {
        let state = self.state()?;
        let mut brands: BTreeMap<String, BrandPerformance> = BTreeMap::new();
        for sale in state.sales.values().filter(|s| range.contains(s.transaction_date)) {
            let Some(vehicle) = state.vehicles.get(&sale.vehicle_id) else {
                continue;
            };
            let entry = brands
                .entry(vehicle.brand.clone())
                .or_insert_with(|| BrandPerformance {
                    brand: vehicle.brand.clone(),
                    units_sold: 0,
                    revenue: Decimal::ZERO,
                });
            entry.units_sold += 1;
            entry.revenue += sale.selling_price;
        }
        // Empate: más ingresos, luego orden alfabético
        Ok(brands.into_values().min_by(|a, b| {
            b.units_sold
                .cmp(&a.units_sold)
                .then(b.revenue.cmp(&a.revenue))
                .then(a.brand.cmp(&b.brand))
        }))
    }

    async fn top_mechanic(&mut self, range: DateRange) -> AppResult<Option<MechanicPerformance>> {
        let state = self.state()?;
        let mut counts: BTreeMap<i32, i64> = BTreeMap::new();
        for order in state.repair_orders.values() {
            if order.status == RepairStatus::Completed
                && order.completed_at.is_some_and(|at| range.contains(at))
            {
                *counts.entry(order.mechanic_id).or_insert(0) += 1;
            }
        }
        let best = counts
            .into_iter()
            .min_by(|(id_a, a), (id_b, b)| b.cmp(a).then(id_a.cmp(id_b)));
        Ok(best.and_then(|(mechanic_id, completed_repairs)| {
            state.users.get(&mechanic_id).map(|u| MechanicPerformance {
                mechanic_id,
                full_name: u.full_name.clone(),
                completed_repairs,
            })
        }))
    }

    async fn top_sale(&mut self, range: DateRange) -> AppResult<Option<SalesTransaction>> {
        Ok(self
            .state()?
            .sales
            .values()
            .filter(|s| range.contains(s.transaction_date))
            .min_by(|a, b| b.profit.cmp(&a.profit).then(a.id.cmp(&b.id)))
            .cloned())
    }

    async fn open_repairs(
        &mut self,
        mechanic_id: Option<i32>,
        limit: i64,
    ) -> AppResult<Vec<RepairOrder>> {
        let mut items: Vec<RepairOrder> = self
            .state()?
            .repair_orders
            .values()
            .filter(|r| r.status.is_open())
            .filter(|r| mechanic_id.map_or(true, |id| r.mechanic_id == id))
            .cloned()
            .collect();
        items.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        items.truncate(limit.max(0) as usize);
        Ok(items)
    }

    async fn repairs_completed_by(
        &mut self,
        mechanic_id: i32,
        range: DateRange,
    ) -> AppResult<Vec<RepairOrder>> {
        let mut items: Vec<RepairOrder> = self
            .state()?
            .repair_orders
            .values()
            .filter(|r| r.mechanic_id == mechanic_id && r.status == RepairStatus::Completed)
            .filter(|r| r.completed_at.is_some_and(|at| range.contains(at)))
            .cloned()
            .collect();
        items.sort_by(|a, b| (b.completed_at, b.id).cmp(&(a.completed_at, a.id)));
        Ok(items)
    }

    async fn low_stock_parts_for_mechanic(
        &mut self,
        mechanic_id: i32,
    ) -> AppResult<Vec<SparePart>> {
        let state = self.state()?;
        let open_orders: Vec<i32> = state
            .repair_orders
            .values()
            .filter(|r| r.mechanic_id == mechanic_id && r.status.is_open())
            .map(|r| r.id)
            .collect();
        let mut items: Vec<SparePart> = state
            .spare_parts
            .values()
            .filter(|p| p.is_active && p.is_low_stock())
            .filter(|p| {
                state.repair_parts.values().any(|line| {
                    line.spare_part_id == p.id && open_orders.contains(&line.repair_order_id)
                })
            })
            .cloned()
            .collect();
        items.sort_by(|a, b| a.stock_quantity.cmp(&b.stock_quantity).then(a.id.cmp(&b.id)));
        Ok(items)
    }

    async fn upsert_metrics(&mut self, metrics: &DashboardMetrics) -> AppResult<DashboardMetrics> {
        let saved = DashboardMetrics {
            updated_at: Utc::now(),
            ..metrics.clone()
        };
        self.state()?
            .metrics
            .insert(saved.metric_date, saved.clone());
        Ok(saved)
    }
}
