//! Earliest/latest feasible-start search on a single resource's calendar.

use crate::interval::TimeInterval;
use crate::resource::{Availability, Resource};

/// Which end of the feasible range the caller wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchDirection {
    #[default]
    Earliest,
    Latest,
}

/// Parameters for [`Resource::find_available_time`]. `time_start` and
/// `max_start` are in the caller's (task) frame; the result comes back in
/// the same frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StartSearch {
    pub time_start: i64,
    pub max_start: i64,
    pub duration: i64,
    pub task_offset: i64,
    pub location_offset: i64,
    pub direction: SearchDirection,
}

impl Resource {
    /// Earliest (or latest) start `t` with `time_start <= t <= max_start`
    /// such that the resource is free on `[t, t + duration)`. `None` when no
    /// such start exists. The earliest walk jumps over busy intervals
    /// instead of stepping; the latest walk probes downward from
    /// `max_start`, which is itself a permitted result.
    pub fn find_available_time(&self, search: &StartSearch) -> Option<i64> {
        if search.time_start > search.max_start || search.duration <= 0 {
            return None;
        }

        let offset_difference = search.task_offset - search.location_offset;

        match search.direction {
            SearchDirection::Earliest => self.find_earliest_start(search, offset_difference),
            SearchDirection::Latest => self.find_latest_start(search, offset_difference),
        }
    }

    fn find_earliest_start(&self, search: &StartSearch, offset_difference: i64) -> Option<i64> {
        let mut cursor = search.time_start + offset_difference;
        let max_cursor = search.max_start + offset_difference;

        while cursor <= max_cursor {
            let probe_end = cursor + search.duration;
            let probe = TimeInterval::new(cursor, probe_end, offset_difference);

            match self.availability(&probe) {
                Availability::Free => return Some(cursor - offset_difference),
                Availability::Partial(free) => {
                    // A free gap inside the probe window is the next worth
                    // trying; otherwise jump past the earliest busy end.
                    if let Some(first_free) = free.first() {
                        let next = first_free.time_start;
                        if next > cursor && next <= max_cursor {
                            cursor = next;
                            continue;
                        }
                    }
                }
            }

            let mut next_busy_end = max_cursor + 1;
            for booking in self.bookings() {
                let busy_start = booking.interval.utc_start();
                let busy_end = booking.interval.utc_end();

                if busy_start <= probe_end && busy_end > cursor && busy_end < next_busy_end {
                    next_busy_end = busy_end;
                }
            }

            if next_busy_end > cursor && next_busy_end <= max_cursor {
                cursor = next_busy_end;
            } else {
                cursor += search.duration;
            }
        }

        None
    }

    fn find_latest_start(&self, search: &StartSearch, offset_difference: i64) -> Option<i64> {
        let min_cursor = search.time_start + offset_difference;
        let mut cursor = search.max_start + offset_difference;

        while cursor >= min_cursor {
            let probe = TimeInterval::new(cursor, cursor + search.duration, offset_difference);

            if self.availability(&probe).is_free() {
                return Some(cursor - offset_difference);
            }

            // Slide left so the probe ends before the earliest booking that
            // overlaps it.
            let earliest_overlap_start = self
                .bookings()
                .iter()
                .filter(|booking| {
                    booking.interval.utc_start() < cursor + search.duration
                        && booking.interval.utc_end() > cursor
                })
                .map(|booking| booking.interval.utc_start())
                .min()?;

            cursor = earliest_overlap_start - search.duration;
        }

        None
    }
}
