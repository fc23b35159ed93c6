//! Ride bookings dashboard: load a bookings export once, filter it by date
//! range and vehicle type, and derive the dashboard's counts and tables.
//!
//! [`loader`] builds the immutable [`dataset::Dataset`]; a [`session::Session`]
//! borrows it, holds the user's filter selection, and lazily recomputes only
//! the outputs whose inputs changed.

pub mod aggregate;
pub mod config;
pub mod dataset;
pub mod error;
pub mod filter;
pub mod loader;
pub mod output;
pub mod session;
pub mod types;
pub mod util;

pub use dataset::Dataset;
pub use error::{EmptyResultWarning, LoadError};
pub use session::{DashboardSnapshot, Session};
pub use types::{BookingRecord, DateRange, FilterSelection, RatingColumn, VehicleSelection};
