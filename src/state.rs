//! Shared application state
//!
//! Estado compartido que se pasa a través del router de Axum: la
//! persistencia, la configuración y un servicio por área de negocio.

use std::sync::Arc;

use crate::config::environment::EnvironmentConfig;
use crate::repositories::Persistence;
use crate::services::{
    AuthService, DashboardService, PartyService, RepairService, SparePartService,
    TransactionService, VehicleService,
};
use crate::utils::jwt::JwtConfig;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Persistence>,
    pub config: Arc<EnvironmentConfig>,
    pub jwt: JwtConfig,
    pub auth: AuthService,
    pub vehicles: VehicleService,
    pub spare_parts: SparePartService,
    pub parties: PartyService,
    pub repairs: RepairService,
    pub transactions: TransactionService,
    pub dashboard: DashboardService,
}

impl AppState {
    pub fn new(store: Arc<dyn Persistence>, config: EnvironmentConfig) -> Self {
        let jwt = JwtConfig::from(&config);
        Self {
            auth: AuthService::new(store.clone(), jwt.clone(), config.bcrypt_cost),
            vehicles: VehicleService::new(store.clone()),
            spare_parts: SparePartService::new(store.clone()),
            parties: PartyService::new(store.clone()),
            repairs: RepairService::new(store.clone(), config.enforce_mechanic_role),
            transactions: TransactionService::new(store.clone()),
            dashboard: DashboardService::new(store.clone()),
            store,
            config: Arc::new(config),
            jwt,
        }
    }
}
