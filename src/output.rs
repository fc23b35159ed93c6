use crate::session::DashboardSnapshot;
use crate::util::format_int;
use serde::Serialize;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), Box<dyn Error>> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), Box<dyn Error>> {
    let s = serde_json::to_string_pretty(value)?;
    fs::write(path, s)?;
    Ok(())
}

/// Markdown table of the first `max_rows` rows, or a placeholder when empty.
pub fn render_table<T>(rows: &[T], max_rows: usize) -> String
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        return "(no rows)".to_string();
    }
    let mut out = Table::new(slice).with(Style::markdown()).to_string();
    if rows.len() > max_rows {
        out.push_str(&format!("\n({} more rows)", format_int(rows.len() - max_rows)));
    }
    out
}

pub fn preview_table<T>(title: &str, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("{}\n", title);
    println!("{}\n", render_table(rows, max_rows));
}

pub fn print_dashboard(snap: &DashboardSnapshot, max_rows: usize) {
    println!("Ride Bookings Dashboard");
    println!(
        "Date range: {} | Vehicle type: {}\n",
        snap.selection.date_range, snap.selection.vehicles
    );
    println!("Total Bookings:    {}", snap.headline.total_bookings);
    println!("Total Revenue:     {}", snap.headline.total_revenue);
    println!("Canceled Bookings: {}\n", snap.headline.canceled_bookings);
    if let Some(w) = &snap.warning {
        println!("Note: {}\n", w);
    }
    println!("Vehicle types: {}\n", snap.vehicle_options.join(", "));

    preview_table(
        &format!("Average {} by Vehicle Type", snap.rating_column.column_name()),
        &snap.rating_by_vehicle,
        max_rows,
    );
    preview_table("Total Booking Value Over Time", &snap.revenue_over_time, max_rows);
    preview_table("Revenue by Vehicle Type (date range only)", &snap.revenue_by_vehicle, max_rows);
    preview_table("Booking Status Breakdown", &snap.status_breakdown, max_rows);
}

/// Write each table as CSV plus the whole snapshot as JSON into `dir`.
/// Returns the files written.
pub fn export_snapshot(dir: &Path, snap: &DashboardSnapshot) -> Result<Vec<PathBuf>, Box<dyn Error>> {
    fs::create_dir_all(dir)?;
    let files = [
        "rating_by_vehicle.csv",
        "revenue_over_time.csv",
        "revenue_by_vehicle.csv",
        "status_breakdown.csv",
        "snapshot.json",
    ]
    .map(|name| dir.join(name));

    write_csv(&files[0], &snap.rating_by_vehicle)?;
    write_csv(&files[1], &snap.revenue_over_time)?;
    write_csv(&files[2], &snap.revenue_by_vehicle)?;
    write_csv(&files[3], &snap.status_breakdown)?;
    write_json(&files[4], snap)?;
    Ok(files.to_vec())
}
