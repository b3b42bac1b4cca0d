//! Fixtures compartidas por los tests de integración: estado completo sobre
//! persistencia en memoria con usuarios, cliente y proveedor ya creados.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use rust_decimal::Decimal;

use showroom_pos::config::EnvironmentConfig;
use showroom_pos::dto::{
    auth_dto::RegisterUserRequest,
    party_dto::{CreateCustomerRequest, CreateSupplierRequest},
    repair_dto::CreateRepairOrderRequest,
    spare_part_dto::CreateSparePartRequest,
    vehicle_dto::CreateVehicleRequest,
};
use showroom_pos::models::{
    party::{Customer, Supplier},
    repair::RepairOrderDetail,
    spare_part::SparePart,
    user::{User, UserRole},
    vehicle::{ConditionStatus, SourceType, Vehicle},
};
use showroom_pos::repositories::MemoryPersistence;
use showroom_pos::utils::jwt::generate_token;
use showroom_pos::{create_app, AppState};

pub const PASSWORD: &str = "secret123";

pub struct TestContext {
    pub state: AppState,
    pub admin: User,
    pub cashier: User,
    pub mechanic: User,
    pub customer: Customer,
    pub supplier: Supplier,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::with_config(EnvironmentConfig::for_tests()).await
    }

    pub async fn with_config(config: EnvironmentConfig) -> Self {
        let state = AppState::new(Arc::new(MemoryPersistence::new()), config);

        let admin = register(&state, "admin", UserRole::Admin).await;
        let cashier = register(&state, "cashier", UserRole::Cashier).await;
        let mechanic = register(&state, "mechanic", UserRole::Mechanic).await;

        let customer = state
            .parties
            .create_customer(CreateCustomerRequest {
                name: "Budi Santoso".to_string(),
                phone: Some("+62 812 5555 0101".to_string()),
                email: Some("budi@example.com".to_string()),
                address: None,
                id_card_number: Some("3174-0000-1111".to_string()),
            })
            .await
            .unwrap();
        let supplier = state
            .parties
            .create_supplier(CreateSupplierRequest {
                name: "Auction House".to_string(),
                contact_person: Some("Rina".to_string()),
                phone: None,
                email: None,
                address: None,
            })
            .await
            .unwrap();

        Self {
            state,
            admin,
            cashier,
            mechanic,
            customer,
            supplier,
        }
    }

    pub fn app(&self) -> Router {
        create_app(self.state.clone())
    }

    pub fn token(&self, user: &User) -> String {
        generate_token(user, &self.state.jwt).unwrap()
    }

    pub async fn register_user(&self, username: &str, role: UserRole) -> User {
        register(&self.state, username, role).await
    }

    /// Vehículo disponible comprado al proveedor por `purchase_price`
    pub async fn vehicle(&self, code: &str, brand: &str, purchase_price: Decimal) -> Vehicle {
        self.state
            .vehicles
            .create(
                self.admin.id,
                CreateVehicleRequest {
                    code: code.to_string(),
                    brand: brand.to_string(),
                    model: "Avanza".to_string(),
                    year: 2019,
                    color: Some("silver".to_string()),
                    license_plate: None,
                    chassis_number: None,
                    odometer: Some(45_000),
                    source_type: SourceType::Supplier,
                    source_id: Some(self.supplier.id),
                    purchase_price,
                    condition_status: ConditionStatus::Good,
                    notes: None,
                },
            )
            .await
            .unwrap()
    }

    pub async fn spare_part(
        &self,
        code: &str,
        selling_price: Decimal,
        stock: i32,
        minimum: i32,
    ) -> SparePart {
        self.state
            .spare_parts
            .create(CreateSparePartRequest {
                code: code.to_string(),
                name: format!("Part {}", code),
                description: None,
                category: "engine".to_string(),
                unit: "pcs".to_string(),
                purchase_price: selling_price / Decimal::from(2),
                selling_price,
                stock_quantity: Some(stock),
                minimum_stock: Some(minimum),
            })
            .await
            .unwrap()
    }

    /// Orden pendiente asignada al mecánico por el cajero
    pub async fn open_repair(&self, vehicle_id: i32) -> RepairOrderDetail {
        self.state
            .repairs
            .open(
                self.cashier.id,
                CreateRepairOrderRequest {
                    vehicle_id,
                    mechanic_id: self.mechanic.id,
                    description: Some("Engine noise".to_string()),
                    estimated_cost: Some(Decimal::from(500_000)),
                    notes: None,
                },
            )
            .await
            .unwrap()
    }
}

async fn register(state: &AppState, username: &str, role: UserRole) -> User {
    state
        .auth
        .register(RegisterUserRequest {
            username: username.to_string(),
            email: format!("{}@showroom.test", username),
            password: PASSWORD.to_string(),
            full_name: format!("{} user", username),
            phone: None,
            role,
        })
        .await
        .unwrap()
}
