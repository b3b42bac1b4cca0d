//! Utilidades del sistema
//!
//! Manejo de errores, validación, JWT y generación de códigos.

pub mod codes;
pub mod errors;
pub mod jwt;
pub mod validation;
