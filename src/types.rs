use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tabled::Tabled;

/// Label of the vehicle selection sentinel meaning "no restriction".
pub const ALL_VEHICLES: &str = "All";

/// One CSV row after header normalization. Every cell is read as text and
/// converted by the loader so null tokens and bad values can be reported.
#[derive(Debug, Deserialize)]
pub struct RawRow {
    #[serde(rename = "Date")]
    pub date: Option<String>,
    #[serde(rename = "Booking_Status")]
    pub booking_status: Option<String>,
    #[serde(rename = "Vehicle_Type")]
    pub vehicle_type: Option<String>,
    #[serde(rename = "Booking_Value")]
    pub booking_value: Option<String>,
    #[serde(rename = "Customer_Rating")]
    pub customer_rating: Option<String>,
    #[serde(rename = "Driver_Ratings")]
    pub driver_ratings: Option<String>,
    #[serde(rename = "Cancelled_Rides_by_Driver")]
    pub cancelled_by_driver: Option<String>,
    #[serde(rename = "Cancelled_Rides_by_Customer")]
    pub cancelled_by_customer: Option<String>,
    #[serde(rename = "Reason_for_cancelling_by_Customer")]
    pub customer_cancel_reason: Option<String>,
    #[serde(rename = "Driver_Cancellation_Reason")]
    pub driver_cancel_reason: Option<String>,
    #[serde(rename = "Incomplete_Rides_Reason")]
    pub incomplete_reason: Option<String>,
}

/// A validated booking. Optional fields were null in the source file.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingRecord {
    pub date: NaiveDate,
    pub booking_status: Option<String>,
    pub vehicle_type: Option<String>,
    pub booking_value: Option<f64>,
    pub customer_rating: Option<f64>,
    pub driver_rating: Option<f64>,
    pub cancelled_by_driver: bool,
    pub cancelled_by_customer: bool,
    /// First non-empty of the customer, driver and incomplete-ride reasons.
    pub issue_reason: String,
}

/// Which rating column the rating-by-vehicle chart averages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingColumn {
    #[default]
    Customer,
    Driver,
}

impl RatingColumn {
    pub fn value(self, record: &BookingRecord) -> Option<f64> {
        match self {
            RatingColumn::Customer => record.customer_rating,
            RatingColumn::Driver => record.driver_rating,
        }
    }

    pub fn column_name(self) -> &'static str {
        match self {
            RatingColumn::Customer => "Customer_Rating",
            RatingColumn::Driver => "Driver_Ratings",
        }
    }
}

/// Inclusive calendar date range with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Build a range from two picker values, clamped into `bounds`.
    /// Reversed endpoints are swapped.
    pub fn clamped(a: NaiveDate, b: NaiveDate, bounds: DateRange) -> Self {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        DateRange {
            start: lo.clamp(bounds.start, bounds.end),
            end: hi.clamp(bounds.start, bounds.end),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// Vehicle-type selection: either the "All" sentinel or an explicit set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum VehicleSelection {
    #[default]
    All,
    Only(BTreeSet<String>),
}

impl VehicleSelection {
    /// Empty input, or any label equal to the sentinel, selects everything.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = BTreeSet::new();
        for label in labels {
            let label = label.as_ref().trim();
            if label.is_empty() {
                continue;
            }
            if label.eq_ignore_ascii_case(ALL_VEHICLES) {
                return VehicleSelection::All;
            }
            set.insert(label.to_string());
        }
        if set.is_empty() {
            VehicleSelection::All
        } else {
            VehicleSelection::Only(set)
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, VehicleSelection::All)
    }

    pub fn matches(&self, vehicle_type: Option<&str>) -> bool {
        match self {
            VehicleSelection::All => true,
            VehicleSelection::Only(set) => vehicle_type.is_some_and(|v| set.contains(v)),
        }
    }
}

impl fmt::Display for VehicleSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VehicleSelection::All => f.write_str(ALL_VEHICLES),
            VehicleSelection::Only(set) => {
                let labels: Vec<&str> = set.iter().map(String::as_str).collect();
                f.write_str(&labels.join(", "))
            }
        }
    }
}

impl Serialize for VehicleSelection {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            VehicleSelection::All => serializer.collect_seq([ALL_VEHICLES]),
            VehicleSelection::Only(set) => serializer.collect_seq(set),
        }
    }
}

/// The pair of user inputs every filtered view is derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterSelection {
    pub date_range: DateRange,
    pub vehicles: VehicleSelection,
}

impl FilterSelection {
    /// Full observed range and the "All" sentinel.
    pub fn defaults(bounds: DateRange) -> Self {
        FilterSelection {
            date_range: bounds,
            vehicles: VehicleSelection::All,
        }
    }
}

fn display_rating(v: &f64) -> String {
    format!("{:.2}", v)
}

fn display_money(v: &f64) -> String {
    crate::util::format_currency(*v)
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct RatingByVehicleRow {
    #[serde(rename = "Vehicle_Type")]
    #[tabled(rename = "Vehicle Type")]
    pub vehicle_type: String,
    /// `NaN` when every rating in the group is missing.
    #[serde(rename = "Mean_Rating")]
    #[tabled(rename = "Avg Rating", display_with = "display_rating")]
    pub mean_rating: f64,
    #[serde(rename = "Rated_Rides")]
    #[tabled(rename = "Rated Rides")]
    pub rated_rides: usize,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct RevenueByDateRow {
    #[serde(rename = "Date")]
    #[tabled(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Booking_Value")]
    #[tabled(rename = "Total Booking Value", display_with = "display_money")]
    pub booking_value: f64,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct RevenueByVehicleRow {
    #[serde(rename = "Vehicle_Type")]
    #[tabled(rename = "Vehicle Type")]
    pub vehicle_type: String,
    #[serde(rename = "Booking_Value")]
    #[tabled(rename = "Revenue", display_with = "display_money")]
    pub booking_value: f64,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq, Eq)]
pub struct StatusBreakdownRow {
    #[serde(rename = "Booking_Status")]
    #[tabled(rename = "Booking Status")]
    pub booking_status: String,
    #[serde(rename = "Issue_Reason")]
    #[tabled(rename = "Issue Reason")]
    pub issue_reason: String,
    #[serde(rename = "Count")]
    #[tabled(rename = "Count")]
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_date_range_clamps_and_orders() {
        let bounds = DateRange { start: d(2024, 1, 1), end: d(2024, 12, 31) };
        let r = DateRange::clamped(d(2025, 3, 1), d(2023, 6, 1), bounds);
        assert_eq!(r, bounds);

        let r = DateRange::clamped(d(2024, 5, 2), d(2024, 5, 1), bounds);
        assert_eq!(r.start, d(2024, 5, 1));
        assert_eq!(r.end, d(2024, 5, 2));
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let r = DateRange { start: d(2024, 1, 1), end: d(2024, 1, 2) };
        assert!(r.contains(d(2024, 1, 1)));
        assert!(r.contains(d(2024, 1, 2)));
        assert!(!r.contains(d(2024, 1, 3)));
    }

    #[test]
    fn test_vehicle_selection_sentinel() {
        assert!(VehicleSelection::from_labels(Vec::<String>::new()).is_all());
        assert!(VehicleSelection::from_labels(["", "  "]).is_all());
        assert!(VehicleSelection::from_labels(["Bike", "all"]).is_all());

        let sel = VehicleSelection::from_labels(["Bike", " Auto "]);
        assert!(sel.matches(Some("Auto")));
        assert!(!sel.matches(Some("Car")));
        assert!(!sel.matches(None));
        assert_eq!(sel.to_string(), "Auto, Bike");
    }

    #[test]
    fn test_all_selection_matches_missing_vehicle() {
        assert!(VehicleSelection::All.matches(None));
    }
}
