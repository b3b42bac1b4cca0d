//! Clientes y proveedores
//!
//! Los clientes compran vehículos; los proveedores los venden al showroom.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Customer {
    pub id: i32,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub id_card_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewCustomer {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub id_card_number: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CustomerUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub id_card_number: Option<String>,
}

impl CustomerUpdate {
    pub fn apply_to(&self, customer: &mut Customer) {
        if let Some(name) = &self.name {
            customer.name = name.clone();
        }
        if self.phone.is_some() {
            customer.phone = self.phone.clone();
        }
        if self.email.is_some() {
            customer.email = self.email.clone();
        }
        if self.address.is_some() {
            customer.address = self.address.clone();
        }
        if self.id_card_number.is_some() {
            customer.id_card_number = self.id_card_number.clone();
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Supplier {
    pub id: i32,
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewSupplier {
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SupplierUpdate {
    pub name: Option<String>,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub is_active: Option<bool>,
}

impl SupplierUpdate {
    pub fn apply_to(&self, supplier: &mut Supplier) {
        if let Some(name) = &self.name {
            supplier.name = name.clone();
        }
        if self.contact_person.is_some() {
            supplier.contact_person = self.contact_person.clone();
        }
        if self.phone.is_some() {
            supplier.phone = self.phone.clone();
        }
        if self.email.is_some() {
            supplier.email = self.email.clone();
        }
        if self.address.is_some() {
            supplier.address = self.address.clone();
        }
        if let Some(active) = self.is_active {
            supplier.is_active = active;
        }
    }
}

/// Búsqueda por nombre o teléfono
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartyFilter {
    pub search: Option<String>,
}

impl PartyFilter {
    pub fn matches(&self, name: &str, phone: Option<&str>) -> bool {
        match &self.search {
            None => true,
            Some(search) => {
                let needle = search.to_lowercase();
                name.to_lowercase().contains(&needle)
                    || phone.is_some_and(|p| p.contains(search.as_str()))
            }
        }
    }
}
