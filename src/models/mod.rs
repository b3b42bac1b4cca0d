//! Modelos de datos del sistema
//!
//! Este módulo contiene todos los structs que mapean a las tablas
//! de la base de datos PostgreSQL.

pub mod dashboard;
pub mod party;
pub mod repair;
pub mod spare_part;
pub mod transaction;
pub mod user;
pub mod vehicle;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};

/// Rango semiabierto `[from, to)` de instantes UTC
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    /// Fechas inclusivas: `date_to` cubre el día completo
    pub fn from_dates(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self {
            from: from.map(start_of_day),
            to: to.map(|date| start_of_day(date) + Duration::days(1)),
        }
    }

    pub fn day(date: NaiveDate) -> Self {
        Self::from_dates(Some(date), Some(date))
    }

    pub fn today() -> Self {
        Self::day(Utc::now().date_naive())
    }

    /// Desde el primer día del mes actual hasta el final de hoy
    pub fn month_to_date() -> Self {
        let today = Utc::now().date_naive();
        let first = today.with_day(1).unwrap_or(today);
        Self::from_dates(Some(first), Some(today))
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.from.map_or(true, |from| instant >= from) && self.to.map_or(true, |to| instant < to)
    }
}

pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::default()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_range_is_inclusive_of_last_day() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let range = DateRange::day(date);
        assert!(range.contains(start_of_day(date)));
        assert!(range.contains(start_of_day(date) + Duration::hours(23)));
        assert!(!range.contains(start_of_day(date) + Duration::days(1)));
        assert!(!range.contains(start_of_day(date) - Duration::seconds(1)));
    }

    #[test]
    fn test_open_range_contains_everything() {
        assert!(DateRange::default().contains(Utc::now()));
    }
}
