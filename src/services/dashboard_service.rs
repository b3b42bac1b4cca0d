//! Servicio de dashboards
//!
//! Agregados de solo lectura por rol y la instantánea diaria en
//! `dashboard_metrics`, que se sobrescribe en cada refresco.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::models::{
    dashboard::{
        AdminDashboard, CashierDashboard, DashboardMetrics, MechanicDashboard, MonthSummary,
        OverviewMetrics, TopPerformers,
    },
    repair::RepairStatus,
    transaction::{merge_recent, TransactionRecord},
    vehicle::VehicleStatus,
    DateRange,
};
use crate::repositories::{Persistence, UnitOfWork};
use crate::utils::errors::AppResult;

const RECENT_LIMIT: i64 = 10;
const PANEL_LIMIT: i64 = 5;

#[derive(Clone)]
pub struct DashboardService {
    store: Arc<dyn Persistence>,
}

impl DashboardService {
    pub fn new(store: Arc<dyn Persistence>) -> Self {
        Self { store }
    }

    pub async fn admin(&self) -> AppResult<AdminDashboard> {
        let mut uow = self.store.begin().await?;
        let month = DateRange::month_to_date();

        let overview = overview(uow.as_mut()).await?;
        let recent_transactions = recent_transactions(uow.as_mut(), DateRange::default()).await?;
        let open_repairs = uow.open_repairs(None, PANEL_LIMIT).await?;
        let mut low_stock_parts = uow.list_low_stock_parts().await?;
        low_stock_parts.truncate(PANEL_LIMIT as usize);
        let available_vehicles = uow
            .list_vehicles_by_status(VehicleStatus::Available, PANEL_LIMIT)
            .await?;

        let month_summary = MonthSummary {
            sales: uow.sales_summary(month).await?,
            purchases: uow.purchase_summary(month).await?,
            repairs_completed: uow.count_repairs_completed(month).await?,
        };
        let top_performers = TopPerformers {
            best_selling_brand: uow.top_brand(month).await?,
            top_mechanic: uow.top_mechanic(month).await?,
            highest_profit_sale: uow.top_sale(month).await?,
        };

        uow.commit().await?;
        Ok(AdminDashboard {
            overview,
            recent_transactions,
            open_repairs,
            low_stock_parts,
            available_vehicles,
            month_summary,
            top_performers,
        })
    }

    pub async fn cashier(&self) -> AppResult<CashierDashboard> {
        let mut uow = self.store.begin().await?;

        let overview = overview(uow.as_mut()).await?;
        let recent_transactions = recent_transactions(uow.as_mut(), DateRange::default()).await?;
        let today_transactions = today_transactions(uow.as_mut()).await?;
        let pending_payments = uow.sales_with_pending_payment(RECENT_LIMIT).await?;

        uow.commit().await?;
        Ok(CashierDashboard {
            overview,
            recent_transactions,
            today_transactions,
            pending_payments,
        })
    }

    pub async fn mechanic(&self, mechanic_id: i32) -> AppResult<MechanicDashboard> {
        let mut uow = self.store.begin().await?;

        let assigned_repairs = uow.open_repairs(Some(mechanic_id), i64::from(i32::MAX)).await?;
        let completed_today = uow
            .repairs_completed_by(mechanic_id, DateRange::today())
            .await?;
        let low_stock_parts = uow.low_stock_parts_for_mechanic(mechanic_id).await?;

        uow.commit().await?;
        Ok(MechanicDashboard {
            assigned_repairs,
            completed_today,
            low_stock_parts,
        })
    }

    /// Recalcular y guardar la instantánea del día
    pub async fn refresh_metrics(&self) -> AppResult<DashboardMetrics> {
        let mut uow = self.store.begin().await?;
        let snapshot = overview(uow.as_mut())
            .await?
            .into_snapshot(Utc::now().date_naive());
        let saved = uow.upsert_metrics(&snapshot).await?;
        uow.commit().await?;

        info!(
            "📊 Métricas del {} actualizadas: {} disponibles, {} en reparación",
            saved.metric_date, saved.vehicles_available, saved.vehicles_in_repair
        );
        Ok(saved)
    }

    /// Refresco periódico de la instantánea; el primer tick es inmediato
    pub fn spawn_metrics_refresher(self, period: Duration) -> JoinHandle<()> {
        info!("⏱️ Refresco de métricas cada {}s", period.as_secs());
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                if let Err(e) = self.refresh_metrics().await {
                    error!("❌ Error refrescando métricas: {}", e);
                }
            }
        })
    }
}

async fn overview(uow: &mut dyn UnitOfWork) -> AppResult<OverviewMetrics> {
    let today = uow.sales_summary(DateRange::today()).await?;
    Ok(OverviewMetrics {
        vehicles_available: uow.count_vehicles_by_status(VehicleStatus::Available).await?,
        vehicles_in_repair: uow.count_vehicles_by_status(VehicleStatus::InRepair).await?,
        vehicles_sold_today: today.count,
        revenue_today: today.revenue,
        profit_today: today.profit,
        pending_repairs: uow.count_repairs_by_status(RepairStatus::Pending).await?,
        low_stock_items: uow.count_low_stock_parts().await?,
    })
}

async fn recent_transactions(
    uow: &mut dyn UnitOfWork,
    range: DateRange,
) -> AppResult<Vec<TransactionRecord>> {
    let sales = uow.recent_sales(range, RECENT_LIMIT).await?;
    let purchases = uow.recent_purchases(range, RECENT_LIMIT).await?;
    Ok(merge_recent(sales, purchases, RECENT_LIMIT as usize))
}

async fn today_transactions(
    uow: &mut dyn UnitOfWork,
) -> AppResult<Vec<TransactionRecord>> {
    let range = DateRange::today();
    let limit = i64::from(i32::MAX);
    let sales = uow.recent_sales(range, limit).await?;
    let purchases = uow.recent_purchases(range, limit).await?;
    Ok(merge_recent(sales, purchases, usize::MAX))
}
