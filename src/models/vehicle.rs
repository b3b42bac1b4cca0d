//! Modelo de Vehicle
//!
//! Este módulo contiene el struct Vehicle y sus enums.
//! Mapea exactamente a la tabla `vehicles` del schema PostgreSQL.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use std::fmt;

/// Estado del vehículo - mapea al ENUM vehicle_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "vehicle_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VehicleStatus {
    Available,
    InRepair,
    Sold,
    Reserved,
}

impl VehicleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleStatus::Available => "available",
            VehicleStatus::InRepair => "in_repair",
            VehicleStatus::Sold => "sold",
            VehicleStatus::Reserved => "reserved",
        }
    }
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Origen del vehículo - mapea al ENUM source_type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "source_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Customer,
    Supplier,
}

/// Condición física al momento de la compra
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "condition_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ConditionStatus {
    Excellent,
    Good,
    Fair,
    Poor,
    NeedsRepair,
}

/// Vehicle principal - mapea exactamente a la tabla vehicles
///
/// `status`, `repair_cost`, `hpp_price`, `sold_price` y `sold_date` solo cambian
/// por los flujos de reparación y venta.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Vehicle {
    pub id: i32,
    pub code: String,
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub color: Option<String>,
    pub license_plate: Option<String>,
    pub chassis_number: Option<String>,
    pub odometer: i32,
    pub source_type: SourceType,
    pub source_id: Option<i32>,
    pub purchase_price: Decimal,
    pub condition_status: ConditionStatus,
    pub status: VehicleStatus,
    pub repair_cost: Decimal,
    pub hpp_price: Decimal,
    pub selling_price: Option<Decimal>,
    pub sold_price: Option<Decimal>,
    pub sold_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_by: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Datos para insertar un vehículo nuevo (intake)
#[derive(Debug, Clone)]
pub struct NewVehicle {
    pub code: String,
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub color: Option<String>,
    pub license_plate: Option<String>,
    pub chassis_number: Option<String>,
    pub odometer: i32,
    pub source_type: SourceType,
    pub source_id: Option<i32>,
    pub purchase_price: Decimal,
    pub condition_status: ConditionStatus,
    pub notes: Option<String>,
    pub created_by: i32,
}

/// Cambios descriptivos permitidos en una actualización general
#[derive(Debug, Clone, Default)]
pub struct VehicleDetailsUpdate {
    pub model: Option<String>,
    pub year: Option<i32>,
    pub color: Option<String>,
    pub license_plate: Option<String>,
    pub chassis_number: Option<String>,
    pub odometer: Option<i32>,
    pub condition_status: Option<ConditionStatus>,
    pub notes: Option<String>,
}

impl VehicleDetailsUpdate {
    /// Aplica los cambios sobre una copia del vehículo
    pub fn apply_to(&self, vehicle: &mut Vehicle) {
        if let Some(model) = &self.model {
            vehicle.model = model.clone();
        }
        if let Some(year) = self.year {
            vehicle.year = year;
        }
        if self.color.is_some() {
            vehicle.color = self.color.clone();
        }
        if self.license_plate.is_some() {
            vehicle.license_plate = self.license_plate.clone();
        }
        if self.chassis_number.is_some() {
            vehicle.chassis_number = self.chassis_number.clone();
        }
        if let Some(odometer) = self.odometer {
            vehicle.odometer = odometer;
        }
        if let Some(condition) = self.condition_status {
            vehicle.condition_status = condition;
        }
        if self.notes.is_some() {
            vehicle.notes = self.notes.clone();
        }
    }
}

/// Filtros para búsqueda de vehículos
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VehicleFilter {
    pub status: Option<VehicleStatus>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub year_min: Option<i32>,
    pub year_max: Option<i32>,
    pub price_min: Option<Decimal>,
    pub price_max: Option<Decimal>,
}

impl VehicleFilter {
    pub fn with_status(status: VehicleStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn matches(&self, vehicle: &Vehicle) -> bool {
        if let Some(status) = self.status {
            if vehicle.status != status {
                return false;
            }
        }
        if let Some(brand) = &self.brand {
            if !vehicle.brand.eq_ignore_ascii_case(brand) {
                return false;
            }
        }
        if let Some(model) = &self.model {
            if !vehicle
                .model
                .to_lowercase()
                .contains(&model.to_lowercase())
            {
                return false;
            }
        }
        if self.year_min.is_some_and(|min| vehicle.year < min) {
            return false;
        }
        if self.year_max.is_some_and(|max| vehicle.year > max) {
            return false;
        }
        if self.price_min.is_some_and(|min| vehicle.hpp_price < min) {
            return false;
        }
        if self.price_max.is_some_and(|max| vehicle.hpp_price > max) {
            return false;
        }
        true
    }
}

/// Resumen de vehículo embebido en otras respuestas
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VehicleSummary {
    pub id: i32,
    pub code: String,
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub license_plate: Option<String>,
    pub status: VehicleStatus,
}

impl From<&Vehicle> for VehicleSummary {
    fn from(vehicle: &Vehicle) -> Self {
        Self {
            id: vehicle.id,
            code: vehicle.code.clone(),
            brand: vehicle.brand.clone(),
            model: vehicle.model.clone(),
            year: vehicle.year,
            license_plate: vehicle.license_plate.clone(),
            status: vehicle.status,
        }
    }
}
