//! Dashboard session: user inputs, the dependency graph of derived values,
//! and their memoized results.
//!
//! Each derived [`Node`] declares the inputs and nodes it reads. Changing an
//! input clears every node downstream of it; a cleared node is recomputed the
//! next time it is read, and nodes that were not cleared keep their value.
//! Reads take `&mut self`, so a selection change can never land in the
//! middle of a [`Session::snapshot`].

use chrono::NaiveDate;
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::rc::Rc;

use crate::aggregate;
use crate::dataset::Dataset;
use crate::error::EmptyResultWarning;
use crate::filter::{self, FilteredView};
use crate::types::{
    DateRange, FilterSelection, RatingByVehicleRow, RatingColumn, RevenueByDateRow,
    RevenueByVehicleRow, StatusBreakdownRow, VehicleSelection, ALL_VEHICLES,
};
use crate::util::{format_currency, format_int};

/// Values set directly by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Input {
    DateRange,
    Vehicles,
    RatingColumn,
}

/// Derived values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Node {
    /// Date filter only; feeds the pie chart and the vehicle picker.
    DateView,
    /// Date and vehicle filters.
    FilteredView,
    TotalBookings,
    TotalRevenue,
    CanceledBookings,
    VehicleChoices,
    RatingByVehicle,
    RevenueOverTime,
    RevenueByVehicle,
    StatusBreakdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Input(Input),
    Node(Node),
}

impl Node {
    pub const ALL: [Node; 10] = [
        Node::DateView,
        Node::FilteredView,
        Node::TotalBookings,
        Node::TotalRevenue,
        Node::CanceledBookings,
        Node::VehicleChoices,
        Node::RatingByVehicle,
        Node::RevenueOverTime,
        Node::RevenueByVehicle,
        Node::StatusBreakdown,
    ];

    /// What this node reads. The graph is acyclic: nodes only read nodes
    /// listed before them in [`Node::ALL`].
    pub fn sources(self) -> &'static [Source] {
        use Source::{Input as I, Node as N};
        match self {
            Node::DateView => &[I(Input::DateRange)],
            Node::FilteredView => &[N(Node::DateView), I(Input::Vehicles)],
            Node::TotalBookings
            | Node::TotalRevenue
            | Node::CanceledBookings
            | Node::RevenueOverTime
            | Node::StatusBreakdown => &[N(Node::FilteredView)],
            Node::RatingByVehicle => &[N(Node::FilteredView), I(Input::RatingColumn)],
            Node::VehicleChoices | Node::RevenueByVehicle => &[N(Node::DateView)],
        }
    }

    fn reads(self, source: Source) -> bool {
        self.sources().contains(&source)
    }
}

/// Every node that transitively reads `input`, in breadth-first order.
pub fn dependents(input: Input) -> Vec<Node> {
    let mut seen = BTreeSet::new();
    let mut order = Vec::new();
    let mut queue = VecDeque::from([Source::Input(input)]);
    while let Some(source) = queue.pop_front() {
        for node in Node::ALL {
            if node.reads(source) && seen.insert(node) {
                order.push(node);
                queue.push_back(Source::Node(node));
            }
        }
    }
    order
}

#[derive(Debug, Default)]
struct Cache {
    date_view: Option<Rc<[usize]>>,
    filtered_view: Option<Rc<[usize]>>,
    total_bookings: Option<usize>,
    total_revenue: Option<f64>,
    canceled_bookings: Option<usize>,
    vehicle_choices: Option<Vec<String>>,
    rating_by_vehicle: Option<Vec<RatingByVehicleRow>>,
    revenue_over_time: Option<Vec<RevenueByDateRow>>,
    revenue_by_vehicle: Option<Vec<RevenueByVehicleRow>>,
    status_breakdown: Option<Vec<StatusBreakdownRow>>,
}

impl Cache {
    fn clear(&mut self, node: Node) {
        match node {
            Node::DateView => self.date_view = None,
            Node::FilteredView => self.filtered_view = None,
            Node::TotalBookings => self.total_bookings = None,
            Node::TotalRevenue => self.total_revenue = None,
            Node::CanceledBookings => self.canceled_bookings = None,
            Node::VehicleChoices => self.vehicle_choices = None,
            Node::RatingByVehicle => self.rating_by_vehicle = None,
            Node::RevenueOverTime => self.revenue_over_time = None,
            Node::RevenueByVehicle => self.revenue_by_vehicle = None,
            Node::StatusBreakdown => self.status_breakdown = None,
        }
    }

    fn is_fresh(&self, node: Node) -> bool {
        match node {
            Node::DateView => self.date_view.is_some(),
            Node::FilteredView => self.filtered_view.is_some(),
            Node::TotalBookings => self.total_bookings.is_some(),
            Node::TotalRevenue => self.total_revenue.is_some(),
            Node::CanceledBookings => self.canceled_bookings.is_some(),
            Node::VehicleChoices => self.vehicle_choices.is_some(),
            Node::RatingByVehicle => self.rating_by_vehicle.is_some(),
            Node::RevenueOverTime => self.revenue_over_time.is_some(),
            Node::RevenueByVehicle => self.revenue_by_vehicle.is_some(),
            Node::StatusBreakdown => self.status_breakdown.is_some(),
        }
    }
}

/// One user's view of the shared dataset.
#[derive(Debug)]
pub struct Session<'a> {
    dataset: &'a Dataset,
    selection: FilterSelection,
    rating_column: RatingColumn,
    cache: Cache,
    recomputes: BTreeMap<Node, usize>,
}

impl<'a> Session<'a> {
    pub fn new(dataset: &'a Dataset) -> Self {
        Session {
            dataset,
            selection: FilterSelection::defaults(dataset.bounds()),
            rating_column: RatingColumn::default(),
            cache: Cache::default(),
            recomputes: BTreeMap::new(),
        }
    }

    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    pub fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    pub fn rating_column(&self) -> RatingColumn {
        self.rating_column
    }

    /// Set the date range from two picker values. The range is clamped to
    /// the dataset's dates and reordered if reversed; the stored range is
    /// returned. Nothing is invalidated if the range is unchanged.
    pub fn set_date_range(&mut self, a: NaiveDate, b: NaiveDate) -> DateRange {
        let range = DateRange::clamped(a, b, self.dataset.bounds());
        if range != self.selection.date_range {
            debug!("Date range {} -> {}", self.selection.date_range, range);
            self.selection.date_range = range;
            self.invalidate(Input::DateRange);
        }
        range
    }

    pub fn set_vehicles(&mut self, vehicles: VehicleSelection) {
        if vehicles != self.selection.vehicles {
            debug!("Vehicle selection {} -> {}", self.selection.vehicles, vehicles);
            self.selection.vehicles = vehicles;
            self.invalidate(Input::Vehicles);
        }
    }

    pub fn set_rating_column(&mut self, column: RatingColumn) {
        if column != self.rating_column {
            self.rating_column = column;
            self.invalidate(Input::RatingColumn);
        }
    }

    /// Restore the full date range and the "All" vehicle selection. Always
    /// invalidates, even when the selection already had its defaults.
    pub fn reset(&mut self) {
        self.selection = FilterSelection::defaults(self.dataset.bounds());
        self.invalidate(Input::DateRange);
        self.invalidate(Input::Vehicles);
        info!("Filter reset to {} / {}", self.selection.date_range, ALL_VEHICLES);
    }

    fn invalidate(&mut self, input: Input) {
        for node in dependents(input) {
            if self.cache.is_fresh(node) {
                debug!("Invalidate {:?} ({:?} changed)", node, input);
            }
            self.cache.clear(node);
        }
    }

    fn note_recompute(&mut self, node: Node) {
        debug!("Recompute {:?}", node);
        *self.recomputes.entry(node).or_insert(0) += 1;
    }

    /// How many times `node` has been computed in this session.
    pub fn recompute_count(&self, node: Node) -> usize {
        self.recomputes.get(&node).copied().unwrap_or(0)
    }

    /// Whether `node` currently holds a value that is up to date.
    pub fn is_fresh(&self, node: Node) -> bool {
        self.cache.is_fresh(node)
    }

    pub fn date_view(&mut self) -> FilteredView<'a> {
        if let Some(rows) = &self.cache.date_view {
            return FilteredView::from_rows(self.dataset, Rc::clone(rows));
        }
        self.note_recompute(Node::DateView);
        let view = filter::filter_by_date(self.dataset, self.selection.date_range);
        self.cache.date_view = Some(view.shared_rows());
        view
    }

    pub fn filtered_view(&mut self) -> FilteredView<'a> {
        if let Some(rows) = &self.cache.filtered_view {
            return FilteredView::from_rows(self.dataset, Rc::clone(rows));
        }
        let date_view = self.date_view();
        self.note_recompute(Node::FilteredView);
        let view = date_view.with_vehicles(&self.selection.vehicles);
        self.cache.filtered_view = Some(view.shared_rows());
        view
    }

    pub fn total_bookings(&mut self) -> usize {
        if let Some(v) = self.cache.total_bookings {
            return v;
        }
        let view = self.filtered_view();
        self.note_recompute(Node::TotalBookings);
        let v = aggregate::total_bookings(&view);
        self.cache.total_bookings = Some(v);
        v
    }

    pub fn total_revenue(&mut self) -> f64 {
        if let Some(v) = self.cache.total_revenue {
            return v;
        }
        let view = self.filtered_view();
        self.note_recompute(Node::TotalRevenue);
        let v = aggregate::total_revenue(&view);
        self.cache.total_revenue = Some(v);
        v
    }

    pub fn canceled_bookings(&mut self) -> usize {
        if let Some(v) = self.cache.canceled_bookings {
            return v;
        }
        let view = self.filtered_view();
        self.note_recompute(Node::CanceledBookings);
        let v = aggregate::canceled_bookings(&view);
        self.cache.canceled_bookings = Some(v);
        v
    }

    /// Vehicle labels available under the current date range.
    pub fn vehicle_choices(&mut self) -> &[String] {
        if self.cache.vehicle_choices.is_none() {
            let view = self.date_view();
            self.note_recompute(Node::VehicleChoices);
            self.cache.vehicle_choices = Some(filter::vehicle_choices(&view));
        }
        self.cache.vehicle_choices.as_deref().unwrap_or_default()
    }

    pub fn rating_by_vehicle(&mut self) -> &[RatingByVehicleRow] {
        if self.cache.rating_by_vehicle.is_none() {
            let view = self.filtered_view();
            self.note_recompute(Node::RatingByVehicle);
            self.cache.rating_by_vehicle =
                Some(aggregate::rating_by_vehicle(&view, self.rating_column));
        }
        self.cache.rating_by_vehicle.as_deref().unwrap_or_default()
    }

    pub fn revenue_over_time(&mut self) -> &[RevenueByDateRow] {
        if self.cache.revenue_over_time.is_none() {
            let view = self.filtered_view();
            self.note_recompute(Node::RevenueOverTime);
            self.cache.revenue_over_time = Some(aggregate::revenue_over_time(&view));
        }
        self.cache.revenue_over_time.as_deref().unwrap_or_default()
    }

    /// Revenue split by vehicle type. Reads the date-only view, so the
    /// vehicle selection does not narrow it.
    pub fn revenue_by_vehicle(&mut self) -> &[RevenueByVehicleRow] {
        if self.cache.revenue_by_vehicle.is_none() {
            let view = self.date_view();
            self.note_recompute(Node::RevenueByVehicle);
            self.cache.revenue_by_vehicle = Some(aggregate::revenue_by_vehicle(&view));
        }
        self.cache.revenue_by_vehicle.as_deref().unwrap_or_default()
    }

    pub fn status_breakdown(&mut self) -> &[StatusBreakdownRow] {
        if self.cache.status_breakdown.is_none() {
            let view = self.filtered_view();
            self.note_recompute(Node::StatusBreakdown);
            self.cache.status_breakdown = Some(aggregate::status_breakdown(&view));
        }
        self.cache.status_breakdown.as_deref().unwrap_or_default()
    }

    /// Read every output against the current selection.
    pub fn snapshot(&mut self) -> DashboardSnapshot {
        let total_bookings = self.total_bookings();
        let total_revenue = self.total_revenue();
        let canceled_bookings = self.canceled_bookings();

        let warning = if total_bookings == 0 {
            let w = EmptyResultWarning {
                selection: self.selection.clone(),
            };
            warn!("{}", w);
            Some(w)
        } else {
            None
        };

        let mut vehicle_options = vec![ALL_VEHICLES.to_string()];
        vehicle_options.extend(self.vehicle_choices().iter().cloned());

        DashboardSnapshot {
            selection: self.selection.clone(),
            rating_column: self.rating_column,
            headline: Headline {
                total_bookings: format_int(total_bookings),
                total_revenue: format_currency(total_revenue),
                canceled_bookings: format_int(canceled_bookings),
            },
            total_bookings,
            total_revenue,
            canceled_bookings,
            vehicle_options,
            rating_by_vehicle: self.rating_by_vehicle().to_vec(),
            revenue_over_time: self.revenue_over_time().to_vec(),
            revenue_by_vehicle: self.revenue_by_vehicle().to_vec(),
            status_breakdown: self.status_breakdown().to_vec(),
            warning,
        }
    }
}

/// Value-box text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Headline {
    pub total_bookings: String,
    pub total_revenue: String,
    pub canceled_bookings: String,
}

/// Every output of one recompute cycle, all taken from the same selection.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub selection: FilterSelection,
    pub rating_column: RatingColumn,
    pub headline: Headline,
    pub total_bookings: usize,
    pub total_revenue: f64,
    pub canceled_bookings: usize,
    /// "All" followed by the labels present in the date range.
    pub vehicle_options: Vec<String>,
    pub rating_by_vehicle: Vec<RatingByVehicleRow>,
    pub revenue_over_time: Vec<RevenueByDateRow>,
    pub revenue_by_vehicle: Vec<RevenueByVehicleRow>,
    pub status_breakdown: Vec<StatusBreakdownRow>,
    /// Empty-result note, `null` when the selection matched bookings.
    pub warning: Option<EmptyResultWarning>,
}
