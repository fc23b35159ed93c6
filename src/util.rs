// Parsing and formatting helpers.
//
// All the forgiving CSV cell handling lives here so the loader can work with
// typed values and the aggregations never see raw text.
use chrono::{NaiveDate, NaiveDateTime};
use num_format::{Locale, ToFormattedString};

/// Cell values read as missing: the default NA spellings of pandas'
/// `read_csv`, which produced the bookings exports.
const NULL_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND",
    "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// A non-null cell whose text is not a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidCell;

/// Trim a cell and drop it if it is one of the null tokens.
pub fn non_null(s: Option<&str>) -> Option<&str> {
    let s = s?.trim();
    if NULL_TOKENS.contains(&s) {
        None
    } else {
        Some(s)
    }
}

/// Parse an optional numeric cell.
///
/// - `Ok(None)` for a missing/null cell.
/// - Thousands separators (`,`) and surrounding quotes are stripped.
/// - `Err(InvalidCell)` when a non-null cell is not a number, so the caller can
///   attach line and column context.
pub fn parse_f64_cell(s: Option<&str>) -> Result<Option<f64>, InvalidCell> {
    let Some(s) = non_null(s) else {
        return Ok(None);
    };
    let cleaned = s.trim_matches('"').replace(',', "");
    cleaned.trim().parse::<f64>().map(Some).map_err(|_| InvalidCell)
}

/// A 0/1 flag column. Anything numerically equal to 1 is set.
pub fn parse_flag_cell(s: Option<&str>) -> Result<bool, InvalidCell> {
    Ok(parse_f64_cell(s)? == Some(1.0))
}

/// Parse a date cell, discarding any time-of-day component.
pub fn parse_date_cell(s: Option<&str>) -> Option<NaiveDate> {
    let s = non_null(s)?.trim_matches('"');
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    None
}

/// Parse a `YYYY-MM-DD` date typed by the user.
pub fn parse_user_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| format!("invalid date '{}' (expected YYYY-MM-DD): {}", s.trim(), e))
}

/// Header normalization: spaces become underscores.
pub fn normalize_column(name: &str) -> String {
    name.trim().replace(' ', "_")
}

/// Arithmetic mean of the present values; `NaN` when none are present.
pub fn mean_present(values: impl IntoIterator<Item = Option<f64>>) -> (f64, usize) {
    let (sum, n) = values
        .into_iter()
        .flatten()
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        (f64::NAN, 0)
    } else {
        (sum / n as f64, n)
    }
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus `en` thousands separators, e.g. `1,234,567.89`.
    if !n.is_finite() {
        return n.to_string();
    }
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    // Beyond u64 the digits are shown without separators.
    let mut res = match int_part.parse::<u64>() {
        Ok(int_val) => int_val.to_formatted_string(&Locale::en),
        Err(_) => int_part.to_string(),
    };
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_currency(n: f64) -> String {
    let s = format_number(n, 2);
    match s.strip_prefix('-') {
        Some(rest) => format!("-${}", rest),
        None => format!("${}", s),
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_tokens() {
        assert_eq!(non_null(None), None);
        assert_eq!(non_null(Some("  ")), None);
        assert_eq!(non_null(Some("null")), None);
        assert_eq!(non_null(Some("NaN")), None);
        assert_eq!(non_null(Some("#NA")), None);
        assert_eq!(non_null(Some("-nan")), None);
        assert_eq!(non_null(Some("1.#QNAN")), None);
        assert_eq!(non_null(Some("Null")), Some("Null"));
        assert_eq!(non_null(Some(" Vehicle Breakdown ")), Some("Vehicle Breakdown"));
    }

    #[test]
    fn test_parse_f64_cell() {
        assert_eq!(parse_f64_cell(Some("1,234.5")), Ok(Some(1234.5)));
        assert_eq!(parse_f64_cell(Some("null")), Ok(None));
        assert_eq!(parse_f64_cell(Some("4.9")), Ok(Some(4.9)));
        assert!(parse_f64_cell(Some("abc")).is_err());
    }

    #[test]
    fn test_parse_flag_cell() {
        assert_eq!(parse_flag_cell(Some("1")), Ok(true));
        assert_eq!(parse_flag_cell(Some("1.0")), Ok(true));
        assert_eq!(parse_flag_cell(Some("0")), Ok(false));
        assert_eq!(parse_flag_cell(Some("null")), Ok(false));
        assert!(parse_flag_cell(Some("yes")).is_err());
    }

    #[test]
    fn test_parse_date_cell_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 23).unwrap();
        assert_eq!(parse_date_cell(Some("2024-03-23")), Some(expected));
        assert_eq!(parse_date_cell(Some("2024/03/23")), Some(expected));
        assert_eq!(parse_date_cell(Some("03/23/2024")), Some(expected));
        assert_eq!(parse_date_cell(Some("2024-03-23 12:29:38")), Some(expected));
        assert_eq!(parse_date_cell(Some("2024-03-23T23:59:00")), Some(expected));
        assert_eq!(parse_date_cell(Some("yesterday")), None);
        assert_eq!(parse_date_cell(Some("null")), None);
    }

    #[test]
    fn test_normalize_column() {
        assert_eq!(normalize_column("Booking Value"), "Booking_Value");
        assert_eq!(
            normalize_column("Reason for cancelling by Customer"),
            "Reason_for_cancelling_by_Customer"
        );
    }

    #[test]
    fn test_mean_present() {
        let (m, n) = mean_present([Some(4.0), None, Some(5.0)]);
        assert_eq!(m, 4.5);
        assert_eq!(n, 2);
        let (m, n) = mean_present([None, None]);
        assert!(m.is_nan());
        assert_eq!(n, 0);
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(150.0), "$150.00");
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(1234567.891), "$1,234,567.89");
        assert_eq!(format_currency(-12.5), "-$12.50");
        assert_eq!(format_int(12345usize), "12,345");
    }

    #[test]
    fn test_format_number_beyond_u64() {
        assert_eq!(format_currency(1e20), "$100000000000000000000.00");
        assert_eq!(format_number(-2e19, 0), "-20000000000000000000");
    }
}
