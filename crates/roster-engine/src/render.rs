//! Human-readable rendering of calendars and scheduling options.
//!
//! Domain types stay free of formatting concerns; these wrappers implement
//! `Display` over borrowed data.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::location::SchedulingOption;
use crate::resource::Resource;

/// Renders a resource's calendar, one line per booking, sorted by start.
pub struct CalendarDisplay<'a> {
    resource: &'a Resource,
}

impl Resource {
    pub fn display_calendar(&self) -> CalendarDisplay<'_> {
        CalendarDisplay { resource: self }
    }
}

fn utc_label(timestamp: i64) -> String {
    match DateTime::<Utc>::from_timestamp(timestamp, 0) {
        Some(instant) => instant.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        None => timestamp.to_string(),
    }
}

impl fmt::Display for CalendarDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bookings = self.resource.bookings();

        if bookings.is_empty() {
            return write!(f, "schedule: (empty)");
        }

        writeln!(f, "schedule:")?;

        for booking in bookings {
            let interval = booking.interval;

            writeln!(
                f,
                "- [{}-{}] (UTC {} .. {}) offset {:.1}h -> run {}",
                interval.time_start,
                interval.time_end,
                utc_label(interval.utc_start()),
                utc_label(interval.utc_end()),
                interval.seconds_offset as f64 / 3600.0,
                booking.run_id,
            )?;
        }

        Ok(())
    }
}

/// Renders a list of scheduling options with their bundles and prices.
pub struct OptionsDisplay<'a> {
    options: &'a [SchedulingOption],
}

impl<'a> OptionsDisplay<'a> {
    pub fn new(options: &'a [SchedulingOption]) -> Self {
        Self { options }
    }
}

impl fmt::Display for OptionsDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.options.is_empty() {
            return write!(f, "options: (none)");
        }

        writeln!(f, "options:")?;

        for (position, option) in self.options.iter().enumerate() {
            let names: Vec<String> = option
                .resources
                .iter()
                .map(|info| format!("{} ({})", info.name, info.id))
                .collect();

            writeln!(
                f,
                "{}. start {} cost {:.2} via [{}]",
                position + 1,
                option.when_can_start,
                option.cost,
                names.join(", "),
            )?;
        }

        Ok(())
    }
}
