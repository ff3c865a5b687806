//! # roster-engine
//!
//! Resource-scheduling core. Given a work item (a time window, a duration,
//! typed resource requirements) and a fleet whose calendars are already
//! partially booked, it answers when (and with which resources) the work can
//! start, at what cost, and commits the booking when the answer is the
//! requested start.
//!
//! The fleet is partitioned by [`Location`]; each location owns its
//! resources and serializes planners through one lock. All timestamps are
//! integer seconds with an explicit wall-clock offset carried on every
//! interval; comparisons happen in UTC.
//!
//! ## Modules
//!
//! - [`interval`] — half-open intervals, UTC views, slicing
//! - [`resource`] — per-resource calendars, availability, booking, pricing
//! - [`finder`] — earliest/latest feasible-start search on one calendar
//! - [`location`] — the planner: possibilities, ranking, commit, fallback
//! - [`render`] — display wrappers for calendars and options
//! - [`error`] — error types

pub mod error;
pub mod finder;
pub mod interval;
pub mod location;
pub mod render;
pub mod resource;
pub mod run;

mod combinations;
mod possibilities;
mod ranking;

pub use error::{Result, ScheduleError};
pub use finder::{SearchDirection, StartSearch};
pub use interval::TimeInterval;
pub use location::{
    Location, LocationSnapshot, LocationSpec, PlannedStart, Possibilities, ResourceState,
    ScheduleDecision, ScheduleRequest, SchedulingOption, SCHEDULED_FOR_START,
};
pub use render::{CalendarDisplay, OptionsDisplay};
pub use resource::{
    ActiveRun, Availability, BookingRecord, Resource, ResourceInfo, ResourceSpec,
};
pub use run::{Run, RunDependency, RunId};
