mod common;

use rust_decimal_macros::dec;

use common::TestContext;
use showroom_pos::config::EnvironmentConfig;
use showroom_pos::dto::{
    repair_dto::{CreateRepairOrderRequest, SparePartUsage, UpdateRepairProgressRequest},
    transaction_dto::CreateSalesRequest,
    PageRequest,
};
use showroom_pos::models::{
    repair::{RepairOrderFilter, RepairStatsFilter, RepairStatus},
    user::UserRole,
    vehicle::VehicleStatus,
};
use showroom_pos::utils::errors::AppError;

fn usage(spare_part_id: i32, quantity: i32) -> SparePartUsage {
    SparePartUsage {
        spare_part_id,
        quantity,
    }
}

#[tokio::test]
async fn test_open_repair_puts_vehicle_in_repair() {
    let ctx = TestContext::new().await;
    let vehicle = ctx.vehicle("VH-001", "Toyota", dec!(100000000)).await;

    let detail = ctx.open_repair(vehicle.id).await;

    assert_eq!(detail.order.status, RepairStatus::Pending);
    assert!(detail.order.code.starts_with("RPR-"));
    assert_eq!(detail.mechanic.id, ctx.mechanic.id);
    assert_eq!(detail.assigner.id, ctx.cashier.id);
    assert_eq!(detail.parts_total, dec!(0));
    assert!(detail.order.started_at.is_none());

    let vehicle = ctx.state.vehicles.get(vehicle.id).await.unwrap();
    assert_eq!(vehicle.status, VehicleStatus::InRepair);

    let by_code = ctx.state.repairs.get_by_code(&detail.order.code).await.unwrap();
    assert_eq!(by_code.order.id, detail.order.id);
}

#[tokio::test]
async fn test_open_repair_on_missing_vehicle_is_not_found() {
    let ctx = TestContext::new().await;
    let result = ctx
        .state
        .repairs
        .open(
            ctx.cashier.id,
            CreateRepairOrderRequest {
                vehicle_id: 999,
                mechanic_id: ctx.mechanic.id,
                description: None,
                estimated_cost: None,
                notes: None,
            },
        )
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_full_lifecycle_completes_with_parts_cost() {
    let ctx = TestContext::new().await;
    let vehicle = ctx.vehicle("VH-002", "Honda", dec!(80000000)).await;
    let filter = ctx.spare_part("SP-OIL", dec!(150000), 10, 2).await;
    let pads = ctx.spare_part("SP-PAD", dec!(400000), 5, 1).await;
    let order = ctx.open_repair(vehicle.id).await.order;

    let started = ctx
        .state
        .repairs
        .update_progress(order.id, UpdateRepairProgressRequest::to_status(RepairStatus::InProgress))
        .await
        .unwrap();
    let started_at = started.order.started_at.expect("started_at set");

    ctx.state
        .repairs
        .attach_spare_part(order.id, usage(filter.id, 2))
        .await
        .unwrap();

    let completed = ctx
        .state
        .repairs
        .update_progress(
            order.id,
            UpdateRepairProgressRequest {
                status: RepairStatus::Completed,
                actual_cost: None,
                notes: Some("Done".to_string()),
                spare_parts: vec![usage(pads.id, 1)],
            },
        )
        .await
        .unwrap();

    // 2 × 150.000 + 1 × 400.000
    assert_eq!(completed.parts_total, dec!(700000));
    assert_eq!(completed.order.actual_cost, dec!(700000));
    assert_eq!(completed.order.status, RepairStatus::Completed);
    assert_eq!(completed.order.started_at, Some(started_at));
    assert!(completed.order.completed_at.is_some());
    assert_eq!(completed.order.notes.as_deref(), Some("Done"));

    let vehicle = ctx.state.vehicles.get(vehicle.id).await.unwrap();
    assert_eq!(vehicle.status, VehicleStatus::Available);
    assert_eq!(vehicle.repair_cost, dec!(700000));
    assert_eq!(vehicle.hpp_price, dec!(80700000));

    assert_eq!(ctx.state.spare_parts.get(filter.id).await.unwrap().stock_quantity, 8);
    assert_eq!(ctx.state.spare_parts.get(pads.id).await.unwrap().stock_quantity, 4);
}

#[tokio::test]
async fn test_explicit_actual_cost_is_kept_on_completion() {
    let ctx = TestContext::new().await;
    let vehicle = ctx.vehicle("VH-003", "Suzuki", dec!(50000000)).await;
    let part = ctx.spare_part("SP-BELT", dec!(200000), 3, 0).await;
    let order = ctx.open_repair(vehicle.id).await.order;

    ctx.state
        .repairs
        .update_progress(order.id, UpdateRepairProgressRequest::to_status(RepairStatus::InProgress))
        .await
        .unwrap();
    ctx.state
        .repairs
        .attach_spare_part(order.id, usage(part.id, 1))
        .await
        .unwrap();
    let completed = ctx
        .state
        .repairs
        .update_progress(
            order.id,
            UpdateRepairProgressRequest {
                actual_cost: Some(dec!(350000)),
                ..UpdateRepairProgressRequest::to_status(RepairStatus::Completed)
            },
        )
        .await
        .unwrap();

    assert_eq!(completed.order.actual_cost, dec!(350000));
    // El costo de reparación del vehículo sigue siendo el de los repuestos
    let vehicle = ctx.state.vehicles.get(vehicle.id).await.unwrap();
    assert_eq!(vehicle.repair_cost, dec!(200000));
}

#[tokio::test]
async fn test_invalid_transitions_are_rejected() {
    let ctx = TestContext::new().await;
    let vehicle = ctx.vehicle("VH-004", "Daihatsu", dec!(60000000)).await;
    let order = ctx.open_repair(vehicle.id).await.order;

    let result = ctx
        .state
        .repairs
        .update_progress(order.id, UpdateRepairProgressRequest::to_status(RepairStatus::Completed))
        .await;
    assert!(matches!(result, Err(AppError::InvalidTransition { .. })));

    let unchanged = ctx.state.repairs.get(order.id).await.unwrap();
    assert_eq!(unchanged.order.status, RepairStatus::Pending);
}

#[tokio::test]
async fn test_completed_order_is_terminal() {
    let ctx = TestContext::new().await;
    let vehicle = ctx.vehicle("VH-005", "Toyota", dec!(60000000)).await;
    let part = ctx.spare_part("SP-PLUG", dec!(50000), 4, 0).await;
    let order = ctx.open_repair(vehicle.id).await.order;

    for status in [RepairStatus::InProgress, RepairStatus::Completed] {
        ctx.state
            .repairs
            .update_progress(order.id, UpdateRepairProgressRequest::to_status(status))
            .await
            .unwrap();
    }

    for status in RepairStatus::ALL {
        let result = ctx
            .state
            .repairs
            .update_progress(order.id, UpdateRepairProgressRequest::to_status(status))
            .await;
        assert!(matches!(result, Err(AppError::InvalidTransition { .. })), "{status}");
    }

    assert!(matches!(
        ctx.state.repairs.attach_spare_part(order.id, usage(part.id, 1)).await,
        Err(AppError::InvalidState(_))
    ));
    assert!(matches!(
        ctx.state.repairs.delete(order.id).await,
        Err(AppError::InvalidState(_))
    ));
}

#[tokio::test]
async fn test_cancel_releases_vehicle_and_reactivation_takes_it_back() {
    let ctx = TestContext::new().await;
    let vehicle = ctx.vehicle("VH-006", "Mitsubishi", dec!(70000000)).await;
    let order = ctx.open_repair(vehicle.id).await.order;

    ctx.state
        .repairs
        .update_progress(order.id, UpdateRepairProgressRequest::to_status(RepairStatus::Cancelled))
        .await
        .unwrap();
    assert_eq!(
        ctx.state.vehicles.get(vehicle.id).await.unwrap().status,
        VehicleStatus::Available
    );

    let reactivated = ctx
        .state
        .repairs
        .update_progress(order.id, UpdateRepairProgressRequest::to_status(RepairStatus::Pending))
        .await
        .unwrap();
    assert_eq!(reactivated.order.status, RepairStatus::Pending);

    ctx.state
        .repairs
        .update_progress(order.id, UpdateRepairProgressRequest::to_status(RepairStatus::InProgress))
        .await
        .unwrap();
    assert_eq!(
        ctx.state.vehicles.get(vehicle.id).await.unwrap().status,
        VehicleStatus::InRepair
    );
}

#[tokio::test]
async fn test_started_at_survives_cancel_and_restart() {
    let ctx = TestContext::new().await;
    let vehicle = ctx.vehicle("VH-007", "Nissan", dec!(70000000)).await;
    let order = ctx.open_repair(vehicle.id).await.order;

    let first = ctx
        .state
        .repairs
        .update_progress(order.id, UpdateRepairProgressRequest::to_status(RepairStatus::InProgress))
        .await
        .unwrap()
        .order
        .started_at;

    for status in [
        RepairStatus::Cancelled,
        RepairStatus::Pending,
        RepairStatus::InProgress,
    ] {
        ctx.state
            .repairs
            .update_progress(order.id, UpdateRepairProgressRequest::to_status(status))
            .await
            .unwrap();
    }

    let order = ctx.state.repairs.get(order.id).await.unwrap().order;
    assert!(first.is_some());
    assert_eq!(order.started_at, first);
}

#[tokio::test]
async fn test_attach_without_stock_changes_nothing() {
    let ctx = TestContext::new().await;
    let vehicle = ctx.vehicle("VH-008", "Toyota", dec!(90000000)).await;
    let plenty = ctx.spare_part("SP-A", dec!(10000), 10, 0).await;
    let scarce = ctx.spare_part("SP-B", dec!(20000), 1, 0).await;
    let order = ctx.open_repair(vehicle.id).await.order;

    let result = ctx
        .state
        .repairs
        .update_progress(
            order.id,
            UpdateRepairProgressRequest {
                spare_parts: vec![usage(plenty.id, 3), usage(scarce.id, 2)],
                ..UpdateRepairProgressRequest::to_status(RepairStatus::InProgress)
            },
        )
        .await;
    assert!(matches!(
        result,
        Err(AppError::InsufficientStock {
            available: 1,
            requested: 2
        })
    ));

    // Ni la primera línea ni el cambio de estado quedaron aplicados
    assert_eq!(ctx.state.spare_parts.get(plenty.id).await.unwrap().stock_quantity, 10);
    assert_eq!(ctx.state.spare_parts.get(scarce.id).await.unwrap().stock_quantity, 1);
    let detail = ctx.state.repairs.get(order.id).await.unwrap();
    assert_eq!(detail.order.status, RepairStatus::Pending);
    assert!(detail.spare_parts.is_empty());
}

#[tokio::test]
async fn test_attaching_same_part_merges_the_line() {
    let ctx = TestContext::new().await;
    let vehicle = ctx.vehicle("VH-009", "Honda", dec!(90000000)).await;
    let part = ctx.spare_part("SP-FLT", dec!(75000), 10, 0).await;
    let order = ctx.open_repair(vehicle.id).await.order;

    ctx.state
        .repairs
        .attach_spare_part(order.id, usage(part.id, 2))
        .await
        .unwrap();

    // Un cambio de precio posterior no afecta a la línea existente
    ctx.state
        .spare_parts
        .update(
            part.id,
            showroom_pos::dto::spare_part_dto::UpdateSparePartRequest {
                selling_price: Some(dec!(90000)),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let line = ctx
        .state
        .repairs
        .attach_spare_part(order.id, usage(part.id, 3))
        .await
        .unwrap();

    assert_eq!(line.quantity_used, 5);
    assert_eq!(line.unit_price, dec!(75000));
    assert_eq!(line.total_price, dec!(375000));

    let lines = ctx.state.repairs.list_spare_parts(order.id).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(ctx.state.spare_parts.get(part.id).await.unwrap().stock_quantity, 5);
}

#[tokio::test]
async fn test_detach_restores_stock() {
    let ctx = TestContext::new().await;
    let vehicle = ctx.vehicle("VH-010", "Honda", dec!(90000000)).await;
    let part = ctx.spare_part("SP-CLT", dec!(300000), 4, 0).await;
    let order = ctx.open_repair(vehicle.id).await.order;

    ctx.state
        .repairs
        .attach_spare_part(order.id, usage(part.id, 3))
        .await
        .unwrap();
    ctx.state
        .repairs
        .detach_spare_part(order.id, part.id)
        .await
        .unwrap();

    assert_eq!(ctx.state.spare_parts.get(part.id).await.unwrap().stock_quantity, 4);
    assert!(ctx.state.repairs.list_spare_parts(order.id).await.unwrap().is_empty());
    assert!(matches!(
        ctx.state.repairs.detach_spare_part(order.id, part.id).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_delete_pending_order_restores_stock_and_vehicle() {
    let ctx = TestContext::new().await;
    let vehicle = ctx.vehicle("VH-011", "Kia", dec!(65000000)).await;
    let part = ctx.spare_part("SP-HOSE", dec!(40000), 6, 0).await;
    let order = ctx.open_repair(vehicle.id).await.order;
    ctx.state
        .repairs
        .attach_spare_part(order.id, usage(part.id, 4))
        .await
        .unwrap();

    ctx.state.repairs.delete(order.id).await.unwrap();

    assert_eq!(ctx.state.spare_parts.get(part.id).await.unwrap().stock_quantity, 6);
    assert_eq!(
        ctx.state.vehicles.get(vehicle.id).await.unwrap().status,
        VehicleStatus::Available
    );
    assert!(matches!(
        ctx.state.repairs.get(order.id).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_in_progress_order_cannot_be_deleted() {
    let ctx = TestContext::new().await;
    let vehicle = ctx.vehicle("VH-012", "Kia", dec!(65000000)).await;
    let order = ctx.open_repair(vehicle.id).await.order;
    ctx.state
        .repairs
        .update_progress(order.id, UpdateRepairProgressRequest::to_status(RepairStatus::InProgress))
        .await
        .unwrap();

    assert!(matches!(
        ctx.state.repairs.delete(order.id).await,
        Err(AppError::InvalidState(_))
    ));
}

#[tokio::test]
async fn test_sold_vehicle_blocks_new_repairs_and_stays_sold() {
    let ctx = TestContext::new().await;
    let vehicle = ctx.vehicle("VH-013", "Toyota", dec!(100000000)).await;
    let order = ctx.open_repair(vehicle.id).await.order;
    ctx.state
        .repairs
        .update_progress(order.id, UpdateRepairProgressRequest::to_status(RepairStatus::Cancelled))
        .await
        .unwrap();

    ctx.state
        .transactions
        .create_sales(
            ctx.cashier.id,
            CreateSalesRequest {
                customer_id: ctx.customer.id,
                vehicle_id: vehicle.id,
                selling_price: dec!(120000000),
                payment_method: Some("cash".to_string()),
                payment_status: None,
                down_payment: Some(dec!(120000000)),
                notes: None,
            },
        )
        .await
        .unwrap();

    let reopened = ctx
        .state
        .repairs
        .update_progress(order.id, UpdateRepairProgressRequest::to_status(RepairStatus::Pending))
        .await;
    assert!(matches!(reopened, Err(AppError::Conflict(_))));

    let new_order = ctx
        .state
        .repairs
        .open(
            ctx.cashier.id,
            CreateRepairOrderRequest {
                vehicle_id: vehicle.id,
                mechanic_id: ctx.mechanic.id,
                description: None,
                estimated_cost: None,
                notes: None,
            },
        )
        .await;
    assert!(matches!(new_order, Err(AppError::Conflict(_))));

    // Borrar la orden cancelada no devuelve el vehículo a disponible
    ctx.state.repairs.delete(order.id).await.unwrap();
    assert_eq!(
        ctx.state.vehicles.get(vehicle.id).await.unwrap().status,
        VehicleStatus::Sold
    );
}

#[tokio::test]
async fn test_non_mechanic_assignment_depends_on_config() {
    let lenient = TestContext::new().await;
    let vehicle = lenient.vehicle("VH-014", "Toyota", dec!(50000000)).await;
    let request = CreateRepairOrderRequest {
        vehicle_id: vehicle.id,
        mechanic_id: lenient.cashier.id,
        description: None,
        estimated_cost: None,
        notes: None,
    };
    assert!(lenient.state.repairs.open(lenient.admin.id, request).await.is_ok());

    let strict = TestContext::with_config(EnvironmentConfig {
        enforce_mechanic_role: true,
        ..EnvironmentConfig::for_tests()
    })
    .await;
    let vehicle = strict.vehicle("VH-015", "Toyota", dec!(50000000)).await;
    let result = strict
        .state
        .repairs
        .open(
            strict.admin.id,
            CreateRepairOrderRequest {
                vehicle_id: vehicle.id,
                mechanic_id: strict.cashier.id,
                description: None,
                estimated_cost: None,
                notes: None,
            },
        )
        .await;
    assert!(matches!(result, Err(AppError::Conflict(_))));
    assert_eq!(
        strict.state.vehicles.get(vehicle.id).await.unwrap().status,
        VehicleStatus::Available
    );
}

#[tokio::test]
async fn test_listing_stats_and_workload() {
    let ctx = TestContext::new().await;
    let second = ctx.register_user("mechanic2", UserRole::Mechanic).await;
    let a = ctx.vehicle("VH-020", "Toyota", dec!(50000000)).await;
    let b = ctx.vehicle("VH-021", "Honda", dec!(50000000)).await;
    let c = ctx.vehicle("VH-022", "Honda", dec!(50000000)).await;

    let first = ctx.open_repair(a.id).await.order;
    ctx.open_repair(b.id).await;
    ctx.state
        .repairs
        .open(
            ctx.admin.id,
            CreateRepairOrderRequest {
                vehicle_id: c.id,
                mechanic_id: second.id,
                description: None,
                estimated_cost: Some(dec!(100000)),
                notes: None,
            },
        )
        .await
        .unwrap();
    ctx.state
        .repairs
        .update_progress(first.id, UpdateRepairProgressRequest::to_status(RepairStatus::InProgress))
        .await
        .unwrap();

    let pending = ctx
        .state
        .repairs
        .list(
            &RepairOrderFilter {
                status: Some(RepairStatus::Pending),
                ..Default::default()
            },
            PageRequest::default().normalize(),
        )
        .await
        .unwrap();
    assert_eq!(pending.total, 2);

    let page = ctx
        .state
        .repairs
        .list(&RepairOrderFilter::default(), PageRequest::new(2, 2).normalize())
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.items.len(), 1);

    let beyond = ctx
        .state
        .repairs
        .list(&RepairOrderFilter::default(), PageRequest::new(i64::MAX, 10).normalize())
        .await
        .unwrap();
    assert_eq!(beyond.total, 3);
    assert!(beyond.items.is_empty());

    let stats = ctx
        .state
        .repairs
        .stats(&RepairStatsFilter {
            mechanic_id: Some(ctx.mechanic.id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(stats.total_orders, 2);
    assert_eq!(stats.pending, 1);
    assert_eq!(stats.in_progress, 1);
    assert_eq!(stats.total_estimated_cost, dec!(1000000));
    assert_eq!(stats.avg_completion_hours, None);

    let workload = ctx.state.repairs.workload().await.unwrap();
    let mine = workload
        .iter()
        .find(|w| w.mechanic_id == ctx.mechanic.id)
        .unwrap();
    assert_eq!((mine.pending, mine.in_progress), (1, 1));
    let theirs = workload.iter().find(|w| w.mechanic_id == second.id).unwrap();
    assert_eq!((theirs.pending, theirs.in_progress), (1, 0));
}
