//! Showroom POS
//!
//! Backend de punto de venta para un concesionario de vehículos usados:
//! inventario de vehículos y repuestos, órdenes de reparación, compras,
//! ventas y paneles por rol.

pub mod config;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

pub use routes::create_app;
pub use state::AppState;
