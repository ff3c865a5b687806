//! Error types for scheduling operations.

use thiserror::Error;

use crate::interval::TimeInterval;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScheduleError {
    /// A malformed request, resource spec, or location spec. No side effects.
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// The requested slot overlaps an existing booking. Carries the free
    /// sub-intervals of the requested window so the caller can retry.
    #[error("requested time slot is busy ({} free sub-interval(s) remain)", .free.len())]
    SlotBusy { free: Vec<TimeInterval> },

    /// The run id is already booked on this resource.
    #[error("run {0} already exists on this resource")]
    DuplicateRun(i64),

    /// No booking is active at the queried instant.
    #[error("no run scheduled at timestamp {0}")]
    NothingScheduled(i64),

    /// The run id appears nowhere in the calendar.
    #[error("run {0} not found in schedule")]
    RunNotFound(i64),

    /// The resource does not price the run's load unit.
    #[error("unsupported load unit {0}")]
    UnsupportedLoadUnit(u8),

    /// Lookup by resource id against a fleet that has no such member.
    #[error("resource {0} not found at this location")]
    ResourceNotFound(i64),
}

impl ScheduleError {
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }
}

/// Convenience alias used throughout roster-engine.
pub type Result<T> = std::result::Result<T, ScheduleError>;
