//! Modelo de SparePart
//!
//! Repuestos del taller con su stock y precios.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct SparePart {
    pub id: i32,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub unit: String,
    pub purchase_price: Decimal,
    pub selling_price: Decimal,
    pub stock_quantity: i32,
    pub minimum_stock: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SparePart {
    /// Stock bajo: en o por debajo del mínimo configurado
    pub fn is_low_stock(&self) -> bool {
        self.stock_quantity <= self.minimum_stock
    }

    pub fn has_stock_for(&self, quantity: i32) -> bool {
        self.stock_quantity >= quantity
    }
}

#[derive(Debug, Clone)]
pub struct NewSparePart {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub unit: String,
    pub purchase_price: Decimal,
    pub selling_price: Decimal,
    pub stock_quantity: i32,
    pub minimum_stock: i32,
}

#[derive(Debug, Clone, Default)]
pub struct SparePartUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub unit: Option<String>,
    pub purchase_price: Option<Decimal>,
    pub selling_price: Option<Decimal>,
    pub minimum_stock: Option<i32>,
    pub is_active: Option<bool>,
}

impl SparePartUpdate {
    pub fn apply_to(&self, part: &mut SparePart) {
        if let Some(name) = &self.name {
            part.name = name.clone();
        }
        if self.description.is_some() {
            part.description = self.description.clone();
        }
        if let Some(category) = &self.category {
            part.category = category.clone();
        }
        if let Some(unit) = &self.unit {
            part.unit = unit.clone();
        }
        if let Some(price) = self.purchase_price {
            part.purchase_price = price;
        }
        if let Some(price) = self.selling_price {
            part.selling_price = price;
        }
        if let Some(minimum) = self.minimum_stock {
            part.minimum_stock = minimum;
        }
        if let Some(active) = self.is_active {
            part.is_active = active;
        }
    }
}

/// Operación de ajuste directo de stock
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StockOperation {
    Add,
    Subtract,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SparePartFilter {
    pub search: Option<String>,
    pub category: Option<String>,
    pub is_active: Option<bool>,
}

impl SparePartFilter {
    pub fn matches(&self, part: &SparePart) -> bool {
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            if !part.code.to_lowercase().contains(&needle)
                && !part.name.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if !part.category.eq_ignore_ascii_case(category) {
                return false;
            }
        }
        if self.is_active.is_some_and(|active| part.is_active != active) {
            return false;
        }
        true
    }
}
