//! Modelo de RepairOrder
//!
//! Órdenes de reparación, sus líneas de repuestos y la máquina de estados
//! que gobierna su ciclo de vida:
//!
//! | Desde        | Hacia permitido          |
//! |--------------|--------------------------|
//! | pending      | in_progress, cancelled   |
//! | in_progress  | completed, cancelled     |
//! | completed    | (ninguno)                |
//! | cancelled    | pending (reactivación)   |

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use std::fmt;

use super::{
    user::UserSummary,
    vehicle::VehicleSummary,
    DateRange,
};

/// Estado de la orden - mapea al ENUM repair_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "repair_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RepairStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl RepairStatus {
    pub const ALL: [RepairStatus; 4] = [
        RepairStatus::Pending,
        RepairStatus::InProgress,
        RepairStatus::Completed,
        RepairStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RepairStatus::Pending => "pending",
            RepairStatus::InProgress => "in_progress",
            RepairStatus::Completed => "completed",
            RepairStatus::Cancelled => "cancelled",
        }
    }

    /// Estados alcanzables desde el estado actual
    pub fn allowed_transitions(&self) -> &'static [RepairStatus] {
        match self {
            RepairStatus::Pending => &[RepairStatus::InProgress, RepairStatus::Cancelled],
            RepairStatus::InProgress => &[RepairStatus::Completed, RepairStatus::Cancelled],
            RepairStatus::Completed => &[],
            RepairStatus::Cancelled => &[RepairStatus::Pending],
        }
    }

    pub fn can_transition_to(&self, next: RepairStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }

    /// Solo las órdenes pendientes o canceladas pueden borrarse
    pub fn is_deletable(&self) -> bool {
        matches!(self, RepairStatus::Pending | RepairStatus::Cancelled)
    }

    pub fn is_open(&self) -> bool {
        matches!(self, RepairStatus::Pending | RepairStatus::InProgress)
    }
}

impl fmt::Display for RepairStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// RepairOrder - mapea exactamente a la tabla repair_orders
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct RepairOrder {
    pub id: i32,
    pub code: String,
    pub vehicle_id: i32,
    pub mechanic_id: i32,
    pub assigned_by: i32,
    pub description: Option<String>,
    pub estimated_cost: Decimal,
    pub actual_cost: Decimal,
    pub status: RepairStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewRepairOrder {
    pub code: String,
    pub vehicle_id: i32,
    pub mechanic_id: i32,
    pub assigned_by: i32,
    pub description: Option<String>,
    pub estimated_cost: Decimal,
    pub notes: Option<String>,
}

/// Línea de repuesto consumido por una orden (tabla repair_spare_parts)
///
/// `unit_price` es una foto del precio de venta del repuesto al momento de usarlo.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct RepairSparePart {
    pub id: i32,
    pub repair_order_id: i32,
    pub spare_part_id: i32,
    pub quantity_used: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewRepairSparePart {
    pub repair_order_id: i32,
    pub spare_part_id: i32,
    pub quantity_used: i32,
    pub unit_price: Decimal,
}

impl NewRepairSparePart {
    pub fn total_price(&self) -> Decimal {
        line_total(self.unit_price, self.quantity_used)
    }
}

pub fn line_total(unit_price: Decimal, quantity: i32) -> Decimal {
    unit_price * Decimal::from(quantity)
}

/// Suma de `unit_price × quantity_used` sobre las líneas de una orden
pub fn parts_total(lines: &[RepairSparePart]) -> Decimal {
    lines
        .iter()
        .map(|line| line_total(line.unit_price, line.quantity_used))
        .sum()
}

/// Filtros para listar órdenes (rango de fechas sobre created_at)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RepairOrderFilter {
    pub status: Option<RepairStatus>,
    pub mechanic_id: Option<i32>,
    pub vehicle_id: Option<i32>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl RepairOrderFilter {
    pub fn range(&self) -> DateRange {
        DateRange::from_dates(self.date_from, self.date_to)
    }

    pub fn matches(&self, order: &RepairOrder) -> bool {
        if self.status.is_some_and(|status| order.status != status) {
            return false;
        }
        if self.mechanic_id.is_some_and(|id| order.mechanic_id != id) {
            return false;
        }
        if self.vehicle_id.is_some_and(|id| order.vehicle_id != id) {
            return false;
        }
        self.range().contains(order.created_at)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RepairStatsFilter {
    pub mechanic_id: Option<i32>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl RepairStatsFilter {
    pub fn as_order_filter(&self) -> RepairOrderFilter {
        RepairOrderFilter {
            mechanic_id: self.mechanic_id,
            date_from: self.date_from,
            date_to: self.date_to,
            ..RepairOrderFilter::default()
        }
    }
}

/// Estadísticas agregadas de reparaciones
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RepairStats {
    pub total_orders: i64,
    pub pending: i64,
    pub in_progress: i64,
    pub completed: i64,
    pub cancelled: i64,
    pub total_estimated_cost: Decimal,
    pub total_actual_cost: Decimal,
    /// Promedio en horas entre started_at y completed_at; None si ninguna orden tiene ambos
    pub avg_completion_hours: Option<f64>,
}

impl RepairStats {
    pub fn from_orders<'a>(orders: impl IntoIterator<Item = &'a RepairOrder>) -> Self {
        let mut stats = RepairStats::default();
        let mut durations = Vec::new();

        for order in orders {
            stats.total_orders += 1;
            match order.status {
                RepairStatus::Pending => stats.pending += 1,
                RepairStatus::InProgress => stats.in_progress += 1,
                RepairStatus::Completed => stats.completed += 1,
                RepairStatus::Cancelled => stats.cancelled += 1,
            }
            stats.total_estimated_cost += order.estimated_cost;
            stats.total_actual_cost += order.actual_cost;

            if let (Some(started), Some(completed)) = (order.started_at, order.completed_at) {
                durations.push((completed - started).num_seconds() as f64 / 3600.0);
            }
        }

        if !durations.is_empty() {
            stats.avg_completion_hours =
                Some(durations.iter().sum::<f64>() / durations.len() as f64);
        }
        stats
    }
}

/// Carga de trabajo abierta por mecánico
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct MechanicWorkload {
    pub mechanic_id: i32,
    pub full_name: String,
    pub pending: i64,
    pub in_progress: i64,
}

/// Orden con sus referencias resueltas
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RepairOrderDetail {
    #[serde(flatten)]
    pub order: RepairOrder,
    pub vehicle: VehicleSummary,
    pub mechanic: UserSummary,
    pub assigner: UserSummary,
    pub spare_parts: Vec<RepairSparePart>,
    pub parts_total: Decimal,
}
