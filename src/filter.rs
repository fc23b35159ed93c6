//! Filtered views over the bookings table.
//!
//! A view is a list of row indices into the borrowed [`Dataset`]; records are
//! never copied or mutated. Indices are ascending, so iteration follows the
//! file order.

use std::rc::Rc;

use crate::dataset::Dataset;
use crate::types::{BookingRecord, DateRange, FilterSelection, VehicleSelection};

#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    dataset: &'a Dataset,
    rows: Rc<[usize]>,
}

impl<'a> FilteredView<'a> {
    pub(crate) fn from_rows(dataset: &'a Dataset, rows: Rc<[usize]>) -> Self {
        FilteredView { dataset, rows }
    }

    /// A view over every record.
    #[cfg(test)]
    pub(crate) fn all(dataset: &'a Dataset) -> Self {
        Self::from_rows(dataset, (0..dataset.len()).collect())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Positions of the matching records in the dataset.
    pub fn row_indices(&self) -> &[usize] {
        &self.rows
    }

    pub(crate) fn shared_rows(&self) -> Rc<[usize]> {
        Rc::clone(&self.rows)
    }

    pub fn records(&self) -> impl Iterator<Item = &'a BookingRecord> + '_ {
        let records = self.dataset.records();
        self.rows.iter().map(move |&i| &records[i])
    }

    /// Narrow this view by vehicle type, keeping order.
    pub fn with_vehicles(&self, vehicles: &VehicleSelection) -> FilteredView<'a> {
        if vehicles.is_all() {
            return self.clone();
        }
        let records = self.dataset.records();
        let rows: Rc<[usize]> = self
            .rows
            .iter()
            .copied()
            .filter(|&i| vehicles.matches(records[i].vehicle_type.as_deref()))
            .collect();
        Self::from_rows(self.dataset, rows)
    }
}

/// Records with `start <= date <= end`.
pub fn filter_by_date<'a>(dataset: &'a Dataset, range: DateRange) -> FilteredView<'a> {
    let rows: Rc<[usize]> = dataset
        .records()
        .iter()
        .enumerate()
        .filter(|(_, r)| range.contains(r.date))
        .map(|(i, _)| i)
        .collect();
    FilteredView::from_rows(dataset, rows)
}

/// Date range AND vehicle selection.
pub fn filter_bookings<'a>(dataset: &'a Dataset, selection: &FilterSelection) -> FilteredView<'a> {
    filter_by_date(dataset, selection.date_range).with_vehicles(&selection.vehicles)
}

/// Distinct vehicle labels in first-appearance order.
pub fn vehicle_choices(view: &FilteredView<'_>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    view.records()
        .filter_map(|r| r.vehicle_type.as_deref())
        .filter(|v| seen.insert(*v))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn booking(day: u32, vehicle: &str) -> BookingRecord {
        BookingRecord {
            date: d(day),
            booking_status: Some("Completed".into()),
            vehicle_type: Some(vehicle.into()),
            booking_value: Some(day as f64),
            customer_rating: None,
            driver_rating: None,
            cancelled_by_driver: false,
            cancelled_by_customer: false,
            issue_reason: String::new(),
        }
    }

    fn dataset() -> Dataset {
        Dataset::from_records(vec![
            booking(3, "Auto"),
            booking(1, "Bike"),
            booking(2, "Auto"),
            booking(5, "Go Mini"),
            booking(4, "Bike"),
        ])
        .unwrap()
    }

    #[test]
    fn test_date_filter_inclusive_and_stable() {
        let ds = dataset();
        let view = filter_by_date(&ds, DateRange { start: d(2), end: d(4) });
        assert_eq!(view.row_indices(), &[0, 2, 4]);
        let dates: Vec<NaiveDate> = view.records().map(|r| r.date).collect();
        assert_eq!(dates, vec![d(3), d(2), d(4)]);
    }

    #[test]
    fn test_vehicle_filter_is_intersection() {
        let ds = dataset();
        let selection = FilterSelection {
            date_range: DateRange { start: d(1), end: d(3) },
            vehicles: VehicleSelection::from_labels(["Bike"]),
        };
        let view = filter_bookings(&ds, &selection);
        assert_eq!(view.row_indices(), &[1]);
    }

    #[test]
    fn test_all_sentinel_is_noop() {
        let ds = dataset();
        let range = DateRange { start: d(2), end: d(5) };
        let date_only = filter_by_date(&ds, range);
        let with_all = filter_bookings(&ds, &FilterSelection { date_range: range, vehicles: VehicleSelection::All });
        assert_eq!(date_only.row_indices(), with_all.row_indices());
    }

    #[test]
    fn test_empty_view() {
        let ds = dataset();
        let selection = FilterSelection {
            date_range: ds.bounds(),
            vehicles: VehicleSelection::from_labels(["Premier Sedan"]),
        };
        let view = filter_bookings(&ds, &selection);
        assert!(view.is_empty());
        assert_eq!(view.records().count(), 0);
    }

    #[test]
    fn test_vehicle_choices_first_appearance() {
        let ds = dataset();
        let choices = vehicle_choices(&FilteredView::all(&ds));
        assert_eq!(choices, vec!["Auto", "Bike", "Go Mini"]);
        let narrowed = filter_by_date(&ds, DateRange { start: d(1), end: d(2) });
        assert_eq!(vehicle_choices(&narrowed), vec!["Bike", "Auto"]);
    }
}
