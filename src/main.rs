// Entry point and CLI flow.
//
// The bookings file is loaded exactly once, before any session starts. A
// failed load exits with the loader's diagnostic. After that:
// - without `--interactive`, the filters given on the command line are
//   applied, the dashboard is printed (or emitted as JSON) and optionally
//   exported;
// - with `--interactive`, a menu loop edits the filters and re-renders.
use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use log::info;
use once_cell::sync::OnceCell;
use ride_dashboard::util::{format_int, parse_user_date};
use ride_dashboard::{config, loader, output, Dataset, RatingColumn, Session, VehicleSelection};
use std::io::{self, Write};
use std::path::PathBuf;

// Set once in `main`, then only borrowed.
static DATASET: OnceCell<Dataset> = OnceCell::new();

#[derive(Clone, Copy, ValueEnum)]
enum RatingArg {
    Customer,
    Driver,
}

impl From<RatingArg> for RatingColumn {
    fn from(arg: RatingArg) -> Self {
        match arg {
            RatingArg::Customer => RatingColumn::Customer,
            RatingArg::Driver => RatingColumn::Driver,
        }
    }
}

#[derive(Parser)]
#[command(
    name = "ride_dashboard",
    version,
    about = "Ride bookings analytics dashboard"
)]
struct Cli {
    /// Bookings CSV (default: ../data/raw/ncr_ride_bookings.csv beside the binary)
    #[arg(long, env = config::DATA_ENV_VAR)]
    data: Option<PathBuf>,

    /// First day to include (YYYY-MM-DD)
    #[arg(long, value_parser = parse_user_date)]
    from: Option<NaiveDate>,

    /// Last day to include (YYYY-MM-DD)
    #[arg(long, value_parser = parse_user_date)]
    to: Option<NaiveDate>,

    /// Vehicle type to include; repeat for several, "All" for no restriction
    #[arg(long = "vehicle", value_name = "LABEL")]
    vehicles: Vec<String>,

    /// Rating column averaged per vehicle type
    #[arg(long, value_enum, default_value = "customer")]
    rating: RatingArg,

    /// Write the tables as CSV and the snapshot as JSON into this directory
    #[arg(long, value_name = "DIR")]
    export: Option<PathBuf>,

    /// Print the snapshot as JSON instead of tables
    #[arg(long)]
    json: bool,

    /// Menu-driven session
    #[arg(long, short)]
    interactive: bool,

    /// Rows shown per table
    #[arg(long, default_value_t = 10)]
    preview_rows: usize,
}

/// Print `label` and read one trimmed line. `None` on end of input.
fn prompt(label: &str) -> Option<String> {
    print!("{}", label);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match io::stdin().read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

fn apply_cli_filters(session: &mut Session<'_>, cli: &Cli) {
    let bounds = session.dataset().bounds();
    if cli.from.is_some() || cli.to.is_some() {
        let range = session.set_date_range(
            cli.from.unwrap_or(bounds.start),
            cli.to.unwrap_or(bounds.end),
        );
        info!("Date range set to {}", range);
    }
    session.set_vehicles(VehicleSelection::from_labels(&cli.vehicles));
    session.set_rating_column(cli.rating.into());
}

fn export(session: &mut Session<'_>, dir: &std::path::Path) {
    let snap = session.snapshot();
    match output::export_snapshot(dir, &snap) {
        Ok(files) => {
            for f in files {
                println!("Wrote {}", f.display());
            }
            println!();
        }
        Err(e) => eprintln!("Export failed: {}\n", e),
    }
}

fn handle_date_range(session: &mut Session<'_>) {
    let current = session.selection().date_range;
    let Some(from) = prompt(&format!("From [{}]: ", current.start)) else {
        return;
    };
    let Some(to) = prompt(&format!("To [{}]: ", current.end)) else {
        return;
    };
    let parse = |s: &str, fallback: NaiveDate| {
        if s.is_empty() {
            Ok(fallback)
        } else {
            parse_user_date(s)
        }
    };
    match (parse(&from, current.start), parse(&to, current.end)) {
        (Ok(a), Ok(b)) => {
            let range = session.set_date_range(a, b);
            println!("Date range: {}\n", range);
        }
        (Err(e), _) | (_, Err(e)) => println!("{}\n", e),
    }
}

fn handle_vehicles(session: &mut Session<'_>) {
    println!("Available: {}", session.vehicle_choices().join(", "));
    let Some(line) = prompt("Vehicle types (comma separated, empty or All for every type): ") else {
        return;
    };
    session.set_vehicles(VehicleSelection::from_labels(line.split(',')));
    println!("Vehicle type: {}\n", session.selection().vehicles);
}

fn run_interactive(session: &mut Session<'_>, cli: &Cli) {
    loop {
        println!("Select an action:");
        println!("[1] Set date range");
        println!("[2] Select vehicle types");
        println!("[3] Reset filter");
        println!("[4] Show dashboard");
        println!("[5] Export");
        println!("[6] Toggle rating column");
        println!("[0] Exit\n");
        let Some(choice) = prompt("Enter choice: ") else {
            break;
        };
        match choice.as_str() {
            "1" => handle_date_range(session),
            "2" => handle_vehicles(session),
            "3" => {
                session.reset();
                println!("Filter reset.\n");
            }
            "4" => {
                let snap = session.snapshot();
                println!();
                output::print_dashboard(&snap, cli.preview_rows);
            }
            "5" => {
                let dir = cli.export.clone().unwrap_or_else(|| PathBuf::from("dashboard_export"));
                export(session, &dir);
            }
            "6" => {
                let next = match session.rating_column() {
                    RatingColumn::Customer => RatingColumn::Driver,
                    RatingColumn::Driver => RatingColumn::Customer,
                };
                session.set_rating_column(next);
                println!("Rating column: {}\n", next.column_name());
            }
            "0" => break,
            _ => println!("Invalid choice. Please enter 0-6.\n"),
        }
    }
    println!("Exiting the program.");
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let path = config::resolve_data_path(cli.data.as_deref())
        .context("Could not locate the running executable to find the data file")?;
    let dataset = DATASET.get_or_try_init(|| -> Result<Dataset> {
        let (dataset, report) = loader::load_bookings(&path)
            .with_context(|| format!("Failed to load bookings from {}", path.display()))?;
        println!(
            "Loaded {} bookings, {} vehicle types, {} ({} with an issue reason).\n",
            format_int(report.total_rows),
            report.vehicle_types,
            report.bounds,
            format_int(report.rows_with_issue)
        );
        Ok(dataset)
    })?;

    let mut session = Session::new(dataset);
    apply_cli_filters(&mut session, &cli);

    if cli.interactive {
        run_interactive(&mut session, &cli);
        return Ok(());
    }

    let snap = session.snapshot();
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&snap)?);
    } else {
        output::print_dashboard(&snap, cli.preview_rows);
    }
    if let Some(dir) = &cli.export {
        let files = output::export_snapshot(dir, &snap)
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("Failed to export to {}", dir.display()))?;
        info!("Exported {} files to {}", files.len(), dir.display());
    }
    Ok(())
}
