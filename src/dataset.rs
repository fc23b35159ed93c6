//! The immutable in-memory bookings table.

use crate::error::{LoadError, Result};
use crate::types::{BookingRecord, DateRange};

/// Bookings in file order plus the observed date bounds. Built once at
/// startup and only ever borrowed afterwards.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Vec<BookingRecord>,
    bounds: DateRange,
}

impl Dataset {
    /// Wrap already-validated records. Fails on an empty table because
    /// there is no date range to offer.
    pub fn from_records(records: Vec<BookingRecord>) -> Result<Self> {
        let mut dates = records.iter().map(|r| r.date);
        let first = dates.next().ok_or(LoadError::NoRecords)?;
        let (start, end) = dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));
        Ok(Dataset {
            records,
            bounds: DateRange { start, end },
        })
    }

    pub fn records(&self) -> &[BookingRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Earliest and latest booking date.
    pub fn bounds(&self) -> DateRange {
        self.bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(date: NaiveDate) -> BookingRecord {
        BookingRecord {
            date,
            booking_status: Some("Completed".into()),
            vehicle_type: Some("Auto".into()),
            booking_value: Some(10.0),
            customer_rating: None,
            driver_rating: None,
            cancelled_by_driver: false,
            cancelled_by_customer: false,
            issue_reason: String::new(),
        }
    }

    #[test]
    fn test_bounds_ignore_file_order() {
        let mid = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let early = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let late = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let ds = Dataset::from_records(vec![record(mid), record(late), record(early)]).unwrap();
        assert_eq!(ds.bounds(), DateRange { start: early, end: late });
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.records()[1].date, late);
    }

    #[test]
    fn test_empty_dataset_is_rejected() {
        assert!(matches!(
            Dataset::from_records(Vec::new()),
            Err(LoadError::NoRecords)
        ));
    }
}
