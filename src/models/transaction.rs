//! Transacciones de compra y venta de vehículos

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};

use super::{vehicle::SourceType, DateRange};

/// Estado de pago - mapea al ENUM payment_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Partial,
    Paid,
}

impl PaymentStatus {
    /// Estado derivado del anticipo frente al precio total
    pub fn from_amounts(down_payment: Decimal, total: Decimal) -> Self {
        if down_payment.is_zero() {
            PaymentStatus::Pending
        } else if down_payment < total {
            PaymentStatus::Partial
        } else {
            PaymentStatus::Paid
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct PurchaseTransaction {
    pub id: i32,
    pub invoice_number: String,
    pub transaction_date: DateTime<Utc>,
    pub source_type: SourceType,
    pub source_id: i32,
    pub vehicle_id: i32,
    pub purchase_price: Decimal,
    pub payment_method: Option<String>,
    pub payment_status: PaymentStatus,
    pub notes: Option<String>,
    pub processed_by: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPurchaseTransaction {
    pub invoice_number: String,
    pub source_type: SourceType,
    pub source_id: i32,
    pub vehicle_id: i32,
    pub purchase_price: Decimal,
    pub payment_method: Option<String>,
    pub payment_status: PaymentStatus,
    pub notes: Option<String>,
    pub processed_by: i32,
}

/// Venta de un vehículo; `profit` se calcula una sola vez al registrarla
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct SalesTransaction {
    pub id: i32,
    pub invoice_number: String,
    pub transaction_date: DateTime<Utc>,
    pub customer_id: i32,
    pub vehicle_id: i32,
    pub hpp_price: Decimal,
    pub selling_price: Decimal,
    pub profit: Decimal,
    pub payment_method: Option<String>,
    pub payment_status: PaymentStatus,
    pub down_payment: Decimal,
    pub remaining_payment: Decimal,
    pub notes: Option<String>,
    pub processed_by: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSalesTransaction {
    pub invoice_number: String,
    pub customer_id: i32,
    pub vehicle_id: i32,
    pub hpp_price: Decimal,
    pub selling_price: Decimal,
    pub profit: Decimal,
    pub payment_method: Option<String>,
    pub payment_status: PaymentStatus,
    pub down_payment: Decimal,
    pub remaining_payment: Decimal,
    pub notes: Option<String>,
    pub processed_by: i32,
}

/// Filtro de listados por fecha de transacción
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionFilter {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl TransactionFilter {
    pub fn range(&self) -> DateRange {
        DateRange::from_dates(self.date_from, self.date_to)
    }
}

/// Fila de transacción mixta para los dashboards
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransactionRecord {
    Sales(SalesTransaction),
    Purchase(PurchaseTransaction),
}

impl TransactionRecord {
    pub fn id(&self) -> i32 {
        match self {
            TransactionRecord::Sales(t) => t.id,
            TransactionRecord::Purchase(t) => t.id,
        }
    }

    pub fn invoice_number(&self) -> &str {
        match self {
            TransactionRecord::Sales(t) => &t.invoice_number,
            TransactionRecord::Purchase(t) => &t.invoice_number,
        }
    }

    pub fn transaction_date(&self) -> DateTime<Utc> {
        match self {
            TransactionRecord::Sales(t) => t.transaction_date,
            TransactionRecord::Purchase(t) => t.transaction_date,
        }
    }

    pub fn vehicle_id(&self) -> i32 {
        match self {
            TransactionRecord::Sales(t) => t.vehicle_id,
            TransactionRecord::Purchase(t) => t.vehicle_id,
        }
    }

    /// Precio de venta o de compra según el tipo
    pub fn amount(&self) -> Decimal {
        match self {
            TransactionRecord::Sales(t) => t.selling_price,
            TransactionRecord::Purchase(t) => t.purchase_price,
        }
    }

    pub fn payment_status(&self) -> PaymentStatus {
        match self {
            TransactionRecord::Sales(t) => t.payment_status,
            TransactionRecord::Purchase(t) => t.payment_status,
        }
    }
}

/// Une ventas y compras ordenadas de la más reciente a la más antigua
pub fn merge_recent(
    sales: Vec<SalesTransaction>,
    purchases: Vec<PurchaseTransaction>,
    limit: usize,
) -> Vec<TransactionRecord> {
    let mut records: Vec<TransactionRecord> = sales
        .into_iter()
        .map(TransactionRecord::Sales)
        .chain(purchases.into_iter().map(TransactionRecord::Purchase))
        .collect();
    records.sort_by(|a, b| b.transaction_date().cmp(&a.transaction_date()));
    records.truncate(limit);
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_payment_status_from_amounts() {
        assert_eq!(PaymentStatus::from_amounts(dec!(0), dec!(100)), PaymentStatus::Pending);
        assert_eq!(PaymentStatus::from_amounts(dec!(40), dec!(100)), PaymentStatus::Partial);
        assert_eq!(PaymentStatus::from_amounts(dec!(100), dec!(100)), PaymentStatus::Paid);
    }

    #[test]
    fn test_record_serializes_with_type_tag() {
        let now = Utc::now();
        let record = TransactionRecord::Purchase(PurchaseTransaction {
            id: 4,
            invoice_number: "INV-PUR-20240101-0001".into(),
            transaction_date: now,
            source_type: SourceType::Supplier,
            source_id: 1,
            vehicle_id: 2,
            purchase_price: dec!(5000),
            payment_method: None,
            payment_status: PaymentStatus::Paid,
            notes: None,
            processed_by: 1,
            created_at: now,
            updated_at: now,
        });

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "purchase");
        assert_eq!(json["invoice_number"], "INV-PUR-20240101-0001");
        assert_eq!(record.amount(), dec!(5000));
    }
}
