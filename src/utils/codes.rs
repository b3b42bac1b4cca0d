//! Generación de códigos legibles
//!
//! Órdenes de reparación `RPR-YYYYMMDD-NNN` y facturas
//! `INV-SAL-YYYYMMDD-NNNN` / `INV-PUR-YYYYMMDD-NNNN`. El sufijo es aleatorio;
//! quien llama comprueba la unicidad y reintenta hasta `MAX_CODE_ATTEMPTS`.

use chrono::NaiveDate;
use rand::Rng;

pub const MAX_CODE_ATTEMPTS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvoiceKind {
    Sales,
    Purchase,
}

impl InvoiceKind {
    fn prefix(&self) -> &'static str {
        match self {
            InvoiceKind::Sales => "INV-SAL",
            InvoiceKind::Purchase => "INV-PUR",
        }
    }
}

pub fn repair_code(date: NaiveDate) -> String {
    let suffix = rand::thread_rng().gen_range(0..1000);
    format!("RPR-{}-{:03}", date.format("%Y%m%d"), suffix)
}

pub fn invoice_number(kind: InvoiceKind, date: NaiveDate) -> String {
    let suffix = rand::thread_rng().gen_range(0..10000);
    format!("{}-{}-{:04}", kind.prefix(), date.format("%Y%m%d"), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
    }

    #[test]
    fn test_repair_code_format() {
        let code = repair_code(date());
        assert!(code.starts_with("RPR-20240309-"));
        let suffix = &code["RPR-20240309-".len()..];
        assert_eq!(suffix.len(), 3);
        assert!(suffix.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_invoice_number_format() {
        let sales = invoice_number(InvoiceKind::Sales, date());
        let purchase = invoice_number(InvoiceKind::Purchase, date());
        assert!(sales.starts_with("INV-SAL-20240309-"));
        assert!(purchase.starts_with("INV-PUR-20240309-"));
        assert_eq!(sales.len(), "INV-SAL-20240309-0000".len());
        assert_eq!(purchase.len(), "INV-PUR-20240309-0000".len());
    }
}
