mod common;

use rust_decimal_macros::dec;

use common::TestContext;
use showroom_pos::dto::{
    party_dto::{CreateCustomerRequest, CreateSupplierRequest, UpdateSupplierRequest},
    repair_dto::SparePartUsage,
    spare_part_dto::{CreateSparePartRequest, StockAdjustmentRequest, UpdateSparePartRequest},
    transaction_dto::CreateSalesRequest,
    vehicle_dto::{CreateVehicleRequest, UpdateVehicleRequest},
    PageRequest,
};
use showroom_pos::models::{
    party::PartyFilter,
    spare_part::{SparePartFilter, StockOperation},
    user::{UserFilter, UserRole},
    vehicle::{ConditionStatus, SourceType, VehicleFilter, VehicleStatus},
};
use showroom_pos::utils::errors::AppError;

fn vehicle_request(code: &str, source_type: SourceType, source_id: Option<i32>) -> CreateVehicleRequest {
    CreateVehicleRequest {
        code: code.to_string(),
        brand: "Toyota".to_string(),
        model: "Innova".to_string(),
        year: 2020,
        color: None,
        license_plate: Some("B 1234 XYZ".to_string()),
        chassis_number: None,
        odometer: None,
        source_type,
        source_id,
        purchase_price: dec!(150000000),
        condition_status: ConditionStatus::Excellent,
        notes: None,
    }
}

#[tokio::test]
async fn test_new_vehicle_starts_available_with_hpp_at_purchase_price() {
    let ctx = TestContext::new().await;
    let vehicle = ctx
        .state
        .vehicles
        .create(
            ctx.admin.id,
            vehicle_request("  VH-200 ", SourceType::Customer, Some(ctx.customer.id)),
        )
        .await
        .unwrap();

    assert_eq!(vehicle.code, "VH-200");
    assert_eq!(vehicle.status, VehicleStatus::Available);
    assert_eq!(vehicle.hpp_price, dec!(150000000));
    assert_eq!(vehicle.repair_cost, dec!(0));
    assert_eq!(vehicle.odometer, 0);
    assert_eq!(vehicle.selling_price, None);
    assert_eq!(vehicle.created_by, ctx.admin.id);
}

#[tokio::test]
async fn test_vehicle_code_is_unique_and_source_must_exist() {
    let ctx = TestContext::new().await;
    ctx.vehicle("VH-201", "Toyota", dec!(1000)).await;

    let duplicate = ctx
        .state
        .vehicles
        .create(ctx.admin.id, vehicle_request("VH-201", SourceType::Supplier, None))
        .await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    let orphan = ctx
        .state
        .vehicles
        .create(ctx.admin.id, vehicle_request("VH-202", SourceType::Supplier, Some(999)))
        .await;
    assert!(matches!(orphan, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_selling_price_rules() {
    let ctx = TestContext::new().await;
    let vehicle = ctx.vehicle("VH-203", "Honda", dec!(90000000)).await;

    assert!(matches!(
        ctx.state.vehicles.set_selling_price(vehicle.id, dec!(89000000)).await,
        Err(AppError::InvalidAmount(_))
    ));
    let priced = ctx
        .state
        .vehicles
        .set_selling_price(vehicle.id, dec!(99000000))
        .await
        .unwrap();
    assert_eq!(priced.selling_price, Some(dec!(99000000)));

    ctx.open_repair(vehicle.id).await;
    assert!(matches!(
        ctx.state.vehicles.set_selling_price(vehicle.id, dec!(99500000)).await,
        Err(AppError::InvalidState(_))
    ));
}

#[tokio::test]
async fn test_vehicle_delete_requires_clean_history() {
    let ctx = TestContext::new().await;
    let clean = ctx.vehicle("VH-204", "Honda", dec!(1000)).await;
    let repaired = ctx.vehicle("VH-205", "Honda", dec!(1000)).await;

    ctx.state.vehicles.delete(clean.id).await.unwrap();
    assert!(matches!(
        ctx.state.vehicles.get(clean.id).await,
        Err(AppError::NotFound(_))
    ));

    let order = ctx.open_repair(repaired.id).await.order;
    assert!(matches!(
        ctx.state.vehicles.delete(repaired.id).await,
        Err(AppError::InvalidState(_))
    ));

    ctx.state.repairs.delete(order.id).await.unwrap();
    ctx.state.vehicles.delete(repaired.id).await.unwrap();
}

#[tokio::test]
async fn test_vehicle_update_and_filtering() {
    let ctx = TestContext::new().await;
    let toyota = ctx.vehicle("VH-206", "Toyota", dec!(100)).await;
    ctx.vehicle("VH-207", "Honda", dec!(200)).await;
    let repairing = ctx.vehicle("VH-208", "Toyota", dec!(300)).await;
    ctx.open_repair(repairing.id).await;

    let updated = ctx
        .state
        .vehicles
        .update(
            toyota.id,
            UpdateVehicleRequest {
                odometer: Some(52000),
                color: Some("black".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.odometer, 52000);
    assert_eq!(updated.color.as_deref(), Some("black"));
    assert_eq!(updated.status, VehicleStatus::Available);

    let toyotas = ctx
        .state
        .vehicles
        .list(
            &VehicleFilter {
                brand: Some("toyota".to_string()),
                ..Default::default()
            },
            PageRequest::default().normalize(),
        )
        .await
        .unwrap();
    assert_eq!(toyotas.total, 2);

    let available = ctx
        .state
        .vehicles
        .list(
            &VehicleFilter::with_status(VehicleStatus::Available),
            PageRequest::default().normalize(),
        )
        .await
        .unwrap();
    assert_eq!(available.total, 2);
    assert!(available.items.iter().all(|v| v.id != repairing.id));
}

#[tokio::test]
async fn test_spare_part_create_rules() {
    let ctx = TestContext::new().await;
    ctx.spare_part("SP-300", dec!(100), 5, 1).await;

    let request = |code: &str, purchase, selling| CreateSparePartRequest {
        code: code.to_string(),
        name: "Radiator".to_string(),
        description: None,
        category: "cooling".to_string(),
        unit: "pcs".to_string(),
        purchase_price: purchase,
        selling_price: selling,
        stock_quantity: None,
        minimum_stock: None,
    };

    assert!(matches!(
        ctx.state.spare_parts.create(request("SP-300", dec!(10), dec!(20))).await,
        Err(AppError::Conflict(_))
    ));
    assert!(matches!(
        ctx.state.spare_parts.create(request("SP-301", dec!(30), dec!(20))).await,
        Err(AppError::InvalidAmount(_))
    ));

    let created = ctx
        .state
        .spare_parts
        .create(request("SP-302", dec!(10), dec!(20)))
        .await
        .unwrap();
    assert_eq!(created.stock_quantity, 0);
    assert_eq!(created.minimum_stock, 0);
    assert!(created.is_active);
}

#[tokio::test]
async fn test_spare_part_update_rechecks_prices() {
    let ctx = TestContext::new().await;
    let part = ctx.spare_part("SP-303", dec!(100), 5, 1).await;

    let result = ctx
        .state
        .spare_parts
        .update(
            part.id,
            UpdateSparePartRequest {
                selling_price: Some(dec!(10)),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(AppError::InvalidAmount(_))));

    let updated = ctx
        .state
        .spare_parts
        .update(
            part.id,
            UpdateSparePartRequest {
                name: Some("Oil filter".to_string()),
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Oil filter");
    assert!(!updated.is_active);
    assert_eq!(updated.stock_quantity, 5);
}

#[tokio::test]
async fn test_stock_adjustments_never_go_negative() {
    let ctx = TestContext::new().await;
    let part = ctx.spare_part("SP-304", dec!(100), 3, 2).await;

    let added = ctx
        .state
        .spare_parts
        .adjust_stock(
            part.id,
            StockAdjustmentRequest {
                quantity: 4,
                operation: StockOperation::Add,
            },
        )
        .await
        .unwrap();
    assert_eq!(added.stock_quantity, 7);

    let too_many = ctx
        .state
        .spare_parts
        .adjust_stock(
            part.id,
            StockAdjustmentRequest {
                quantity: 8,
                operation: StockOperation::Subtract,
            },
        )
        .await;
    assert!(matches!(
        too_many,
        Err(AppError::InsufficientStock {
            available: 7,
            requested: 8
        })
    ));

    let emptied = ctx
        .state
        .spare_parts
        .adjust_stock(
            part.id,
            StockAdjustmentRequest {
                quantity: 7,
                operation: StockOperation::Subtract,
            },
        )
        .await
        .unwrap();
    assert_eq!(emptied.stock_quantity, 0);

    let restocked = ctx
        .state
        .spare_parts
        .adjust_stock(
            part.id,
            StockAdjustmentRequest {
                quantity: 5,
                operation: StockOperation::Add,
            },
        )
        .await
        .unwrap();
    let overflow = ctx
        .state
        .spare_parts
        .adjust_stock(
            part.id,
            StockAdjustmentRequest {
                quantity: i32::MAX,
                operation: StockOperation::Add,
            },
        )
        .await;
    assert!(matches!(overflow, Err(AppError::InvalidAmount(_))));
    assert_eq!(
        ctx.state.spare_parts.get(part.id).await.unwrap().stock_quantity,
        restocked.stock_quantity
    );
}

#[tokio::test]
async fn test_low_stock_and_availability() {
    let ctx = TestContext::new().await;
    let low = ctx.spare_part("SP-305", dec!(100), 2, 2).await;
    let fine = ctx.spare_part("SP-306", dec!(100), 10, 2).await;

    let low_stock = ctx.state.spare_parts.low_stock().await.unwrap();
    assert_eq!(low_stock.len(), 1);
    assert_eq!(low_stock[0].id, low.id);

    assert!(ctx.state.spare_parts.check_stock_availability(fine.id, 10).await.unwrap());
    assert!(!ctx.state.spare_parts.check_stock_availability(fine.id, 11).await.unwrap());
    assert!(matches!(
        ctx.state.spare_parts.check_stock_availability(999, 1).await,
        Err(AppError::NotFound(_))
    ));

    let engine = ctx
        .state
        .spare_parts
        .list(
            &SparePartFilter {
                search: Some("sp-30".to_string()),
                ..Default::default()
            },
            PageRequest::default().normalize(),
        )
        .await
        .unwrap();
    assert_eq!(engine.total, 2);
}

#[tokio::test]
async fn test_parties_search_and_update() {
    let ctx = TestContext::new().await;
    ctx.state
        .parties
        .create_customer(CreateCustomerRequest {
            name: "Siti Rahma".to_string(),
            phone: Some("0813 2222 3333".to_string()),
            email: None,
            address: None,
            id_card_number: None,
        })
        .await
        .unwrap();

    let found = ctx
        .state
        .parties
        .list_customers(
            &PartyFilter {
                search: Some("siti".to_string()),
            },
            PageRequest::default().normalize(),
        )
        .await
        .unwrap();
    assert_eq!(found.total, 1);
    assert_eq!(found.items[0].name, "Siti Rahma");

    let by_phone = ctx
        .state
        .parties
        .list_customers(
            &PartyFilter {
                search: Some("2222".to_string()),
            },
            PageRequest::default().normalize(),
        )
        .await
        .unwrap();
    assert_eq!(by_phone.total, 1);

    let supplier = ctx
        .state
        .parties
        .update_supplier(
            ctx.supplier.id,
            UpdateSupplierRequest {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(!supplier.is_active);
    assert_eq!(supplier.name, ctx.supplier.name);

    assert!(matches!(
        ctx.state.parties.get_customer(999).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_spare_part_delete_only_when_unused() {
    let ctx = TestContext::new().await;
    let spare = ctx.spare_part("SP-310", dec!(100), 5, 1).await;
    let used = ctx.spare_part("SP-311", dec!(100), 5, 1).await;
    let vehicle = ctx.vehicle("VH-210", "Toyota", dec!(1000)).await;
    let order = ctx.open_repair(vehicle.id).await.order;
    ctx.state
        .repairs
        .attach_spare_part(
            order.id,
            SparePartUsage {
                spare_part_id: used.id,
                quantity: 1,
            },
        )
        .await
        .unwrap();

    ctx.state.spare_parts.delete(spare.id).await.unwrap();
    assert!(matches!(
        ctx.state.spare_parts.get(spare.id).await,
        Err(AppError::NotFound(_))
    ));

    assert!(matches!(
        ctx.state.spare_parts.delete(used.id).await,
        Err(AppError::InvalidState(_))
    ));
    assert_eq!(ctx.state.spare_parts.get(used.id).await.unwrap().stock_quantity, 4);

    assert!(matches!(
        ctx.state.spare_parts.delete(999).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_customer_lookup_by_phone_and_email() {
    let ctx = TestContext::new().await;

    let by_phone = ctx
        .state
        .parties
        .find_customer_by_phone("+62 812 5555 0101")
        .await
        .unwrap();
    assert_eq!(by_phone.id, ctx.customer.id);

    let by_email = ctx
        .state
        .parties
        .find_customer_by_email("BUDI@example.com")
        .await
        .unwrap();
    assert_eq!(by_email.id, ctx.customer.id);

    assert!(matches!(
        ctx.state.parties.find_customer_by_phone("0000").await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        ctx.state.parties.find_customer_by_email("nobody@example.com").await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_customer_with_sales_cannot_be_deleted() {
    let ctx = TestContext::new().await;
    let walk_in = ctx
        .state
        .parties
        .create_customer(CreateCustomerRequest {
            name: "Walk-in".to_string(),
            phone: None,
            email: None,
            address: None,
            id_card_number: None,
        })
        .await
        .unwrap();
    let vehicle = ctx.vehicle("VH-211", "Toyota", dec!(1000)).await;
    ctx.state
        .transactions
        .create_sales(
            ctx.cashier.id,
            CreateSalesRequest {
                customer_id: ctx.customer.id,
                vehicle_id: vehicle.id,
                selling_price: dec!(1500),
                payment_method: None,
                payment_status: None,
                down_payment: None,
                notes: None,
            },
        )
        .await
        .unwrap();

    assert!(matches!(
        ctx.state.parties.delete_customer(ctx.customer.id).await,
        Err(AppError::InvalidState(_))
    ));
    assert!(ctx.state.parties.get_customer(ctx.customer.id).await.is_ok());

    ctx.state.parties.delete_customer(walk_in.id).await.unwrap();
    assert!(matches!(
        ctx.state.parties.get_customer(walk_in.id).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_supplier_that_sourced_vehicles_cannot_be_deleted() {
    let ctx = TestContext::new().await;
    ctx.vehicle("VH-212", "Honda", dec!(1000)).await;
    let unused = ctx
        .state
        .parties
        .create_supplier(CreateSupplierRequest {
            name: "Dealer Jaya".to_string(),
            contact_person: None,
            phone: None,
            email: None,
            address: None,
        })
        .await
        .unwrap();

    assert!(matches!(
        ctx.state.parties.delete_supplier(ctx.supplier.id).await,
        Err(AppError::InvalidState(_))
    ));

    ctx.state.parties.delete_supplier(unused.id).await.unwrap();
    assert!(matches!(
        ctx.state.parties.delete_supplier(unused.id).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_users_are_listed_by_role() {
    let ctx = TestContext::new().await;
    ctx.register_user("mechanic2", UserRole::Mechanic).await;

    let mechanics = ctx
        .state
        .auth
        .list_users(&UserFilter {
            role: Some(UserRole::Mechanic),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(mechanics.len(), 2);
    assert!(mechanics.iter().all(|u| u.role == UserRole::Mechanic));
    assert_eq!(mechanics[0].username, "mechanic");

    let everyone = ctx.state.auth.list_users(&UserFilter::default()).await.unwrap();
    assert_eq!(everyone.len(), 4);
}
