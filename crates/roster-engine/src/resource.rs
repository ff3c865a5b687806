//! A schedulable resource: identity, price list, and booking calendar.
//!
//! The calendar is a list of non-overlapping bookings kept sorted by UTC
//! start, so availability queries are a single sweep. All comparisons happen
//! in UTC; results are re-expressed in the caller's frame.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScheduleError};
use crate::interval::TimeInterval;
use crate::run::{Run, RunId};

/// Static description of a resource: identity, type, capacity, prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceInfo {
    pub id: i64,
    pub name: String,
    pub resource_type: u8,
    /// How many units of per-type demand one booking of this resource
    /// covers (an apartment with two rooms serves 2, a room serves 1).
    pub served_quantity: u16,
    /// Price per load unit, keyed by load-unit tag.
    pub cost_per_load_unit: BTreeMap<u8, f32>,
}

/// Validated construction parameters for [`Resource`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceSpec {
    pub id: i64,
    pub name: String,
    pub resource_type: u8,
    pub served_quantity: u16,
    pub cost_per_load_unit: BTreeMap<u8, f32>,
}

impl ResourceSpec {
    /// Spec with `served_quantity` 1, the common case.
    pub fn new(
        id: i64,
        name: impl Into<String>,
        resource_type: u8,
        cost_per_load_unit: BTreeMap<u8, f32>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            resource_type,
            served_quantity: 1,
            cost_per_load_unit,
        }
    }

    pub fn with_served_quantity(mut self, served_quantity: u16) -> Self {
        self.served_quantity = served_quantity;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(ScheduleError::validation("name", "must not be empty"));
        }

        if self.resource_type == 0 {
            return Err(ScheduleError::validation(
                "resource type",
                "0 is reserved; types start at 1",
            ));
        }

        if self.cost_per_load_unit.is_empty() {
            return Err(ScheduleError::validation(
                "cost per load unit",
                "at least one priced load unit is required",
            ));
        }

        for (unit, price) in &self.cost_per_load_unit {
            if *price < 0.0 || !price.is_finite() {
                return Err(ScheduleError::validation(
                    "cost per load unit",
                    format!("price for unit {unit} must be a non-negative number"),
                ));
            }
        }

        if self.served_quantity == 0 {
            return Err(ScheduleError::validation(
                "served quantity",
                "a resource must cover at least one unit of demand",
            ));
        }

        Ok(())
    }
}

/// Result of an availability query over a search window.
#[derive(Debug, Clone, PartialEq)]
pub enum Availability {
    /// No booking intersects the window.
    Free,
    /// At least one booking intersects; holds the free sub-intervals of the
    /// window, in the window's frame. Empty means fully booked.
    Partial(Vec<TimeInterval>),
}

impl Availability {
    pub fn is_free(&self) -> bool {
        matches!(self, Self::Free)
    }

    pub fn free_intervals(&self) -> &[TimeInterval] {
        match self {
            Self::Free => &[],
            Self::Partial(free) => free,
        }
    }
}

/// One calendar entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Booking {
    pub interval: TimeInterval,
    pub run_id: RunId,
}

/// Persisted form of a calendar entry. Field names are the durable contract
/// with the persistence layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BookingRecord {
    #[serde(rename = "TimeStart")]
    pub time_start: i64,
    #[serde(rename = "TimeEnd")]
    pub time_end: i64,
    #[serde(rename = "SecondsOffset")]
    pub seconds_offset: i64,
    #[serde(rename = "RunID")]
    pub run_id: i64,
}

/// The active booking at a queried instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveRun {
    pub id: RunId,
    /// When the booking releases the resource, in the caller's frame.
    pub busy_until: i64,
}

/// A resource with its booking calendar.
///
/// Calendar mutation on a fleet member must go through the owning
/// [`Location`](crate::location::Location); a standalone `&mut Resource` is
/// exclusive by construction and may be mutated directly (typically to
/// pre-book maintenance before the fleet is assembled).
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    info: ResourceInfo,
    /// Sorted by UTC start; entries never overlap in UTC.
    calendar: Vec<Booking>,
}

impl Resource {
    pub fn new(spec: ResourceSpec) -> Result<Self> {
        spec.validate()?;

        Ok(Self {
            info: ResourceInfo {
                id: spec.id,
                name: spec.name,
                resource_type: spec.resource_type,
                served_quantity: spec.served_quantity,
                cost_per_load_unit: spec.cost_per_load_unit,
            },
            calendar: Vec::new(),
        })
    }

    pub fn info(&self) -> &ResourceInfo {
        &self.info
    }

    pub fn id(&self) -> i64 {
        self.info.id
    }

    pub fn resource_type(&self) -> u8 {
        self.info.resource_type
    }

    /// Price for the ranking load unit, used when ordering candidates.
    pub(crate) fn ranking_price(&self, unit: u8) -> f32 {
        self.info.cost_per_load_unit.get(&unit).copied().unwrap_or(0.0)
    }

    pub(crate) fn bookings(&self) -> &[Booking] {
        &self.calendar
    }

    /// Free sub-intervals of `search`, computed in UTC and re-expressed in
    /// the search window's frame.
    pub fn availability(&self, search: &TimeInterval) -> Availability {
        let search_start = search.utc_start();
        let search_end = search.utc_end();

        let mut free = Vec::new();
        let mut cursor = search_start;
        let mut has_overlap = false;

        for booking in &self.calendar {
            let busy_start = booking.interval.utc_start();
            let busy_end = booking.interval.utc_end();

            if busy_end <= cursor {
                continue;
            }

            if busy_start >= search_end {
                break;
            }

            has_overlap = true;

            if busy_start > cursor {
                free.push(TimeInterval::new(
                    cursor + search.seconds_offset,
                    busy_start + search.seconds_offset,
                    search.seconds_offset,
                ));
            }

            cursor = cursor.max(busy_end);
        }

        if !has_overlap {
            return Availability::Free;
        }

        if cursor < search_end {
            free.push(TimeInterval::new(
                cursor + search.seconds_offset,
                search_end + search.seconds_offset,
                search.seconds_offset,
            ));
        }

        Availability::Partial(free)
    }

    /// Book `run_id` over `interval`. Maintenance bookings are written
    /// through the owning location, not here.
    ///
    /// # Errors
    ///
    /// `Validation` for an inverted interval or a maintenance id,
    /// `DuplicateRun` when the id is already on this calendar, `SlotBusy`
    /// (carrying the remaining free gaps) when the slot overlaps a booking.
    pub fn add_run(&mut self, interval: TimeInterval, run_id: RunId) -> Result<()> {
        if interval.time_start >= interval.time_end {
            return Err(ScheduleError::validation(
                "interval",
                "time start must precede time end",
            ));
        }

        if run_id.is_maintenance() {
            return Err(ScheduleError::validation(
                "run id",
                "maintenance bookings are written through the location",
            ));
        }

        self.insert_booking(interval, run_id)
    }

    /// Insertion used by both the public path and the location-level
    /// maintenance writer. Keeps the calendar sorted by UTC start.
    pub(crate) fn insert_booking(&mut self, interval: TimeInterval, run_id: RunId) -> Result<()> {
        if !run_id.is_maintenance()
            && self.calendar.iter().any(|booking| booking.run_id == run_id)
        {
            return Err(ScheduleError::DuplicateRun(run_id.encode()));
        }

        match self.availability(&interval) {
            Availability::Free => {}
            Availability::Partial(free) => {
                return Err(ScheduleError::SlotBusy { free });
            }
        }

        let position = self
            .calendar
            .partition_point(|booking| booking.interval.utc_start() < interval.utc_start());

        self.calendar.insert(position, Booking { interval, run_id });

        Ok(())
    }

    /// The booking active at `at_timestamp` (given in a frame with `offset`
    /// from UTC). The comparison happens in UTC; a booking is active through
    /// its end instant inclusive.
    pub fn run_at(&self, at_timestamp: i64, offset: i64) -> Result<ActiveRun> {
        let probe = at_timestamp - offset;

        for booking in &self.calendar {
            if booking.interval.utc_start() <= probe && probe <= booking.interval.utc_end() {
                return Ok(ActiveRun {
                    id: booking.run_id,
                    busy_until: booking.interval.utc_end() + offset,
                });
            }
        }

        Err(ScheduleError::NothingScheduled(at_timestamp))
    }

    /// Delete the booking carrying `run_id`. On a fleet member this must be
    /// reached through the owning location.
    pub fn remove_run(&mut self, run_id: RunId) -> Result<()> {
        let position = self
            .calendar
            .iter()
            .position(|booking| booking.run_id == run_id)
            .ok_or(ScheduleError::RunNotFound(run_id.encode()))?;

        self.calendar.remove(position);

        Ok(())
    }

    /// Billable cost of running `run` on this resource:
    /// `load * price[load_unit]`.
    pub fn run_cost(&self, run: &Run) -> Result<f32> {
        let price = self
            .info
            .cost_per_load_unit
            .get(&run.load_unit)
            .ok_or(ScheduleError::UnsupportedLoadUnit(run.load_unit))?;

        Ok(run.load * price)
    }

    /// Durable form of the calendar, sorted by UTC start.
    pub fn snapshot(&self) -> Vec<BookingRecord> {
        self.calendar
            .iter()
            .map(|booking| BookingRecord {
                time_start: booking.interval.time_start,
                time_end: booking.interval.time_end,
                seconds_offset: booking.interval.seconds_offset,
                run_id: booking.run_id.encode(),
            })
            .collect()
    }

    /// Rebuild a resource from its spec and persisted calendar. Records may
    /// arrive in any order; overlaps and duplicate run ids are rejected.
    pub fn restore(spec: ResourceSpec, records: &[BookingRecord]) -> Result<Self> {
        let mut resource = Self::new(spec)?;

        let mut sorted: Vec<&BookingRecord> = records.iter().collect();
        sorted.sort_by_key(|record| record.time_start - record.seconds_offset);

        for record in sorted {
            let interval =
                TimeInterval::new(record.time_start, record.time_end, record.seconds_offset);

            if interval.time_start >= interval.time_end {
                return Err(ScheduleError::validation(
                    "calendar record",
                    format!("inverted interval for run {}", record.run_id),
                ));
            }

            resource.insert_booking(interval, RunId::decode(record.run_id)?)?;
        }

        Ok(resource)
    }
}
