use crate::filter::FilteredView;
use crate::types::{
    RatingByVehicleRow, RatingColumn, RevenueByDateRow, RevenueByVehicleRow, StatusBreakdownRow,
};
use crate::util::mean_present;
use chrono::NaiveDate;
use std::collections::BTreeMap;

pub fn total_bookings(view: &FilteredView<'_>) -> usize {
    view.len()
}

/// Sum of `Booking_Value`; missing values count as zero. An empty view is
/// `+0.0`, never `-0.0`.
pub fn total_revenue(view: &FilteredView<'_>) -> f64 {
    view.records()
        .filter_map(|r| r.booking_value)
        .fold(0.0, |acc, v| acc + v)
}

/// Driver cancellations plus customer cancellations. A row with both flags
/// set is counted twice.
pub fn canceled_bookings(view: &FilteredView<'_>) -> usize {
    let by_driver = view.records().filter(|r| r.cancelled_by_driver).count();
    let by_customer = view.records().filter(|r| r.cancelled_by_customer).count();
    by_driver + by_customer
}

/// Mean rating per vehicle type, sorted by label. Only vehicle types present
/// in the view appear; a group with no ratings at all reports `NaN`.
pub fn rating_by_vehicle(view: &FilteredView<'_>, column: RatingColumn) -> Vec<RatingByVehicleRow> {
    let mut groups: BTreeMap<&str, Vec<Option<f64>>> = BTreeMap::new();
    for r in view.records() {
        if let Some(vehicle) = r.vehicle_type.as_deref() {
            groups.entry(vehicle).or_default().push(column.value(r));
        }
    }
    groups
        .into_iter()
        .map(|(vehicle, ratings)| {
            let (mean_rating, rated_rides) = mean_present(ratings);
            RatingByVehicleRow {
                vehicle_type: vehicle.to_string(),
                mean_rating,
                rated_rides,
            }
        })
        .collect()
}

/// Daily booking value, ascending by date. Days without bookings are absent.
pub fn revenue_over_time(view: &FilteredView<'_>) -> Vec<RevenueByDateRow> {
    let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for r in view.records() {
        *by_date.entry(r.date).or_insert(0.0) += r.booking_value.unwrap_or(0.0);
    }
    by_date
        .into_iter()
        .map(|(date, booking_value)| RevenueByDateRow { date, booking_value })
        .collect()
}

pub fn revenue_by_vehicle(view: &FilteredView<'_>) -> Vec<RevenueByVehicleRow> {
    let mut by_vehicle: BTreeMap<&str, f64> = BTreeMap::new();
    for r in view.records() {
        if let Some(vehicle) = r.vehicle_type.as_deref() {
            *by_vehicle.entry(vehicle).or_insert(0.0) += r.booking_value.unwrap_or(0.0);
        }
    }
    by_vehicle
        .into_iter()
        .map(|(vehicle, booking_value)| RevenueByVehicleRow {
            vehicle_type: vehicle.to_string(),
            booking_value,
        })
        .collect()
}

/// Count per (status, issue reason). The empty reason is its own group.
pub fn status_breakdown(view: &FilteredView<'_>) -> Vec<StatusBreakdownRow> {
    let mut counts: BTreeMap<(&str, &str), usize> = BTreeMap::new();
    for r in view.records() {
        if let Some(status) = r.booking_status.as_deref() {
            *counts.entry((status, r.issue_reason.as_str())).or_insert(0) += 1;
        }
    }
    counts
        .into_iter()
        .map(|((status, reason), count)| StatusBreakdownRow {
            booking_status: status.to_string(),
            issue_reason: reason.to_string(),
            count,
        })
        .collect()
}
