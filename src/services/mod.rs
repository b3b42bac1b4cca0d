//! Services module
//!
//! Lógica de negocio del showroom. Cada servicio recibe la persistencia como
//! `Arc<dyn Persistence>` y ejecuta cada operación en una unidad de trabajo.

pub mod auth_service;
pub mod dashboard_service;
pub mod party_service;
pub mod repair_service;
pub mod spare_part_service;
pub mod transaction_service;
pub mod vehicle_service;

pub use auth_service::AuthService;
pub use dashboard_service::DashboardService;
pub use party_service::PartyService;
pub use repair_service::RepairService;
pub use spare_part_service::SparePartService;
pub use transaction_service::TransactionService;
pub use vehicle_service::VehicleService;
