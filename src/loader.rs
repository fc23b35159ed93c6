use crate::dataset::Dataset;
use crate::error::{LoadError, Result};
use crate::types::{BookingRecord, DateRange, RawRow};
use crate::util::{non_null, normalize_column, parse_date_cell, parse_f64_cell, parse_flag_cell};
use csv::{ReaderBuilder, StringRecord};
use log::{debug, info};
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Columns that must be present after spaces are turned into underscores.
pub const REQUIRED_COLUMNS: &[&str] = &[
    "Date",
    "Booking_Status",
    "Vehicle_Type",
    "Booking_Value",
    "Customer_Rating",
    "Driver_Ratings",
    "Cancelled_Rides_by_Driver",
    "Cancelled_Rides_by_Customer",
    "Reason_for_cancelling_by_Customer",
    "Driver_Cancellation_Reason",
    "Incomplete_Rides_Reason",
];

#[derive(Debug, Clone)]
pub struct LoadReport {
    pub total_rows: usize,
    pub vehicle_types: usize,
    pub rows_with_issue: usize,
    pub bounds: DateRange,
}

/// Load the bookings export at `path`.
pub fn load_bookings(path: &Path) -> Result<(Dataset, LoadReport)> {
    if !path.is_file() {
        return Err(LoadError::MissingFile(path.to_path_buf()));
    }
    let file = File::open(path)?;
    info!("Loading bookings from {}", path.display());
    load_from_reader(file)
}

/// Parse bookings from any CSV source with a header row.
pub fn load_from_reader<R: Read>(reader: R) -> Result<(Dataset, LoadReport)> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(reader);

    let headers: StringRecord = rdr.headers()?.iter().map(normalize_column).collect();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !headers.iter().any(|h| h == **col))
        .map(|col| col.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(LoadError::MissingColumns(missing));
    }
    debug!("Normalized headers: {:?}", headers);

    let mut records = Vec::new();
    let mut row = StringRecord::new();
    while rdr.read_record(&mut row)? {
        let line = row.position().map(|p| p.line()).unwrap_or(0);
        let raw: RawRow = row.deserialize(Some(&headers))?;
        records.push(clean_row(raw, line)?);
    }

    let vehicle_types: HashSet<&str> = records
        .iter()
        .filter_map(|r| r.vehicle_type.as_deref())
        .collect();
    let vehicle_types = vehicle_types.len();
    let rows_with_issue = records.iter().filter(|r| !r.issue_reason.is_empty()).count();
    let total_rows = records.len();

    let dataset = Dataset::from_records(records)?;
    let report = LoadReport {
        total_rows,
        vehicle_types,
        rows_with_issue,
        bounds: dataset.bounds(),
    };
    info!(
        "Loaded {} bookings ({} vehicle types) dated {}",
        report.total_rows, report.vehicle_types, report.bounds
    );
    Ok((dataset, report))
}

fn clean_row(raw: RawRow, line: u64) -> Result<BookingRecord> {
    let date = parse_date_cell(raw.date.as_deref()).ok_or_else(|| LoadError::InvalidDate {
        line,
        value: raw.date.clone().unwrap_or_default(),
    })?;

    let number = |value: &Option<String>, column: &'static str| {
        parse_f64_cell(value.as_deref()).map_err(|_| LoadError::InvalidNumber {
            line,
            column,
            value: value.clone().unwrap_or_default(),
        })
    };
    let flag = |value: &Option<String>, column: &'static str| {
        parse_flag_cell(value.as_deref()).map_err(|_| LoadError::InvalidNumber {
            line,
            column,
            value: value.clone().unwrap_or_default(),
        })
    };

    let booking_value = number(&raw.booking_value, "Booking_Value")?;
    let customer_rating = number(&raw.customer_rating, "Customer_Rating")?;
    let driver_rating = number(&raw.driver_ratings, "Driver_Ratings")?;
    let cancelled_by_driver = flag(&raw.cancelled_by_driver, "Cancelled_Rides_by_Driver")?;
    let cancelled_by_customer = flag(&raw.cancelled_by_customer, "Cancelled_Rides_by_Customer")?;

    let issue_reason = issue_reason(&raw);

    Ok(BookingRecord {
        date,
        booking_status: non_null(raw.booking_status.as_deref()).map(str::to_string),
        vehicle_type: non_null(raw.vehicle_type.as_deref()).map(str::to_string),
        booking_value,
        customer_rating,
        driver_rating,
        cancelled_by_driver,
        cancelled_by_customer,
        issue_reason,
    })
}

/// Customer reason, then driver reason, then incomplete-ride reason; the
/// first one present wins, empty when all three are null.
pub fn issue_reason(raw: &RawRow) -> String {
    [
        &raw.customer_cancel_reason,
        &raw.driver_cancel_reason,
        &raw.incomplete_reason,
    ]
    .into_iter()
    .find_map(|reason| non_null(reason.as_deref()))
    .unwrap_or_default()
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const HEADER: &str = "Date,Time,Booking ID,Booking Status,Vehicle Type,Cancelled Rides by Customer,Reason for cancelling by Customer,Cancelled Rides by Driver,Driver Cancellation Reason,Incomplete Rides,Incomplete Rides Reason,Booking Value,Driver Ratings,Customer Rating";

    fn load(body: &str) -> Result<(Dataset, LoadReport)> {
        let text = format!("{}\n{}", HEADER, body);
        load_from_reader(text.as_bytes())
    }

    #[test]
    fn test_load_normalizes_and_types_rows() {
        let (ds, report) = load(
            "2024-03-23,12:29:38,\"CNR5884300\",No Driver Found,eBike,null,null,null,null,null,null,null,null,null\n\
             2024-11-29 18:01:39,18:01:39,\"CNR1326809\",Incomplete,Go Sedan,null,null,null,null,1,Vehicle Breakdown,237,4.3,4.9\n\
             2024-08-23,08:56:10,\"CNR8494506\",Cancelled by Driver,Auto,null,null,1,Personal & Car related issues,null,null,null,null,null\n",
        )
        .unwrap();

        assert_eq!(ds.len(), 3);
        assert_eq!(report.total_rows, 3);
        assert_eq!(report.vehicle_types, 3);
        assert_eq!(report.rows_with_issue, 2);
        assert_eq!(report.bounds.start, NaiveDate::from_ymd_opt(2024, 3, 23).unwrap());
        assert_eq!(report.bounds.end, NaiveDate::from_ymd_opt(2024, 11, 29).unwrap());

        let r = &ds.records()[1];
        assert_eq!(r.date, NaiveDate::from_ymd_opt(2024, 11, 29).unwrap());
        assert_eq!(r.vehicle_type.as_deref(), Some("Go Sedan"));
        assert_eq!(r.booking_value, Some(237.0));
        assert_eq!(r.customer_rating, Some(4.9));
        assert_eq!(r.driver_rating, Some(4.3));
        assert_eq!(r.issue_reason, "Vehicle Breakdown");

        let r = &ds.records()[2];
        assert!(r.cancelled_by_driver);
        assert!(!r.cancelled_by_customer);
        assert_eq!(r.booking_value, None);
        assert_eq!(r.issue_reason, "Personal & Car related issues");

        assert_eq!(ds.records()[0].issue_reason, "");
    }

    #[test]
    fn test_issue_reason_first_non_empty_wins() {
        let raw = RawRow {
            date: None,
            booking_status: None,
            vehicle_type: None,
            booking_value: None,
            customer_rating: None,
            driver_ratings: None,
            cancelled_by_driver: None,
            cancelled_by_customer: None,
            customer_cancel_reason: Some("".into()),
            driver_cancel_reason: Some("More than permitted people in there".into()),
            incomplete_reason: Some("Other Issue".into()),
        };
        assert_eq!(issue_reason(&raw), "More than permitted people in there");
    }

    #[test]
    fn test_missing_columns_are_reported() {
        let err = load_from_reader("Date,Booking Value\n2024-01-01,10\n".as_bytes()).unwrap_err();
        match err {
            LoadError::MissingColumns(cols) => {
                assert!(cols.contains(&"Vehicle_Type".to_string()));
                assert!(!cols.contains(&"Booking_Value".to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unparseable_date_is_fatal() {
        let err = load("someday,,,Completed,Auto,null,null,null,null,null,null,10,4,4\n").unwrap_err();
        assert!(matches!(err, LoadError::InvalidDate { line: 2, .. }));
    }

    #[test]
    fn test_non_numeric_value_is_fatal() {
        let err = load("2024-01-01,,,Completed,Auto,null,null,null,null,null,null,ten,4,4\n").unwrap_err();
        match err {
            LoadError::InvalidNumber { column, value, .. } => {
                assert_eq!(column, "Booking_Value");
                assert_eq!(value, "ten");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_ragged_row_is_fatal() {
        let err = load("2024-01-01,Completed\n").unwrap_err();
        assert!(matches!(err, LoadError::Csv(_)));
    }

    #[test]
    fn test_header_only_file() {
        assert!(matches!(load(""), Err(LoadError::NoRecords)));
    }

    #[test]
    fn test_missing_file() {
        let err = load_bookings(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, LoadError::MissingFile(_)));
        assert!(err.to_string().contains("/definitely/not/here.csv"));
    }
}
