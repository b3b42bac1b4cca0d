//! Modelos de los dashboards por rol
//!
//! Agregados de solo lectura sobre vehículos, reparaciones, repuestos y ventas.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{
    repair::RepairOrder,
    spare_part::SparePart,
    transaction::{SalesTransaction, TransactionRecord},
    vehicle::Vehicle,
};

/// Foto diaria de métricas (tabla dashboard_metrics), se sobrescribe por fecha
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct DashboardMetrics {
    pub metric_date: NaiveDate,
    pub vehicles_available: i64,
    pub vehicles_in_repair: i64,
    pub vehicles_sold_today: i64,
    pub revenue_today: Decimal,
    pub profit_today: Decimal,
    pub pending_repairs: i64,
    pub low_stock_items: i64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OverviewMetrics {
    pub vehicles_available: i64,
    pub vehicles_in_repair: i64,
    pub vehicles_sold_today: i64,
    pub revenue_today: Decimal,
    pub profit_today: Decimal,
    pub pending_repairs: i64,
    pub low_stock_items: i64,
}

impl OverviewMetrics {
    pub fn into_snapshot(self, metric_date: NaiveDate) -> DashboardMetrics {
        DashboardMetrics {
            metric_date,
            vehicles_available: self.vehicles_available,
            vehicles_in_repair: self.vehicles_in_repair,
            vehicles_sold_today: self.vehicles_sold_today,
            revenue_today: self.revenue_today,
            profit_today: self.profit_today,
            pending_repairs: self.pending_repairs,
            low_stock_items: self.low_stock_items,
            updated_at: Utc::now(),
        }
    }
}

/// Totales de ventas en un rango
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow, PartialEq)]
pub struct SalesSummary {
    pub count: i64,
    pub revenue: Decimal,
    pub profit: Decimal,
}

/// Totales de compras en un rango
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow, PartialEq)]
pub struct PurchaseSummary {
    pub count: i64,
    pub total: Decimal,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MonthSummary {
    pub sales: SalesSummary,
    pub purchases: PurchaseSummary,
    pub repairs_completed: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct BrandPerformance {
    pub brand: String,
    pub units_sold: i64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct MechanicPerformance {
    pub mechanic_id: i32,
    pub full_name: String,
    pub completed_repairs: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TopPerformers {
    pub best_selling_brand: Option<BrandPerformance>,
    pub top_mechanic: Option<MechanicPerformance>,
    pub highest_profit_sale: Option<SalesTransaction>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdminDashboard {
    pub overview: OverviewMetrics,
    pub recent_transactions: Vec<TransactionRecord>,
    /// Órdenes pending e in_progress; el overview cuenta solo las pending
    pub open_repairs: Vec<RepairOrder>,
    pub low_stock_parts: Vec<SparePart>,
    pub available_vehicles: Vec<Vehicle>,
    pub month_summary: MonthSummary,
    pub top_performers: TopPerformers,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CashierDashboard {
    pub overview: OverviewMetrics,
    pub recent_transactions: Vec<TransactionRecord>,
    pub today_transactions: Vec<TransactionRecord>,
    pub pending_payments: Vec<SalesTransaction>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MechanicDashboard {
    pub assigned_repairs: Vec<RepairOrder>,
    pub completed_today: Vec<RepairOrder>,
    pub low_stock_parts: Vec<SparePart>,
}
