//! Half-open time intervals with a carried wall-clock offset.
//!
//! All timestamps are integer seconds since the epoch. An interval stores the
//! local wall-clock instants plus `seconds_offset`, the local offset from
//! UTC; the UTC view subtracts the offset. The offset is carried verbatim so
//! downstream consumers can render results in the frame the caller used.

use serde::{Deserialize, Serialize};

/// A half-open range `[time_start, time_end)` in some wall-clock frame.
///
/// Ordering is lexicographic on `(time_start, time_end, seconds_offset)`,
/// which gives map keys a stable, deterministic order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct TimeInterval {
    pub time_start: i64,
    pub time_end: i64,
    pub seconds_offset: i64,
}

impl TimeInterval {
    pub fn new(time_start: i64, time_end: i64, seconds_offset: i64) -> Self {
        Self {
            time_start,
            time_end,
            seconds_offset,
        }
    }

    /// Interval in UTC seconds, start side.
    pub fn utc_start(&self) -> i64 {
        self.time_start - self.seconds_offset
    }

    /// Interval in UTC seconds, end side.
    pub fn utc_end(&self) -> i64 {
        self.time_end - self.seconds_offset
    }

    pub fn duration(&self) -> i64 {
        self.time_end - self.time_start
    }

    /// Number of full `slice`-length sub-intervals that fit; `0` when the
    /// slice length is non-positive or the interval is empty or inverted.
    pub fn slice_count(&self, slice: i64) -> i64 {
        if slice <= 0 || self.time_end <= self.time_start {
            return 0;
        }

        (self.time_end - self.time_start) / slice
    }

    /// Divide `[time_start, time_end)` into consecutive sub-intervals of
    /// length `slice`, starting at `time_start`. A final shorter sub-interval
    /// is emitted when the length is not an exact multiple, so the pieces
    /// concatenate back to the original range. Empty for `slice <= 0`.
    pub fn break_down(&self, slice: i64) -> Vec<TimeInterval> {
        if slice <= 0 || self.time_end <= self.time_start {
            return Vec::new();
        }

        let mut pieces = Vec::with_capacity(((self.duration() + slice - 1) / slice) as usize);
        let mut cursor = self.time_start;

        while cursor < self.time_end {
            let piece_end = (cursor + slice).min(self.time_end);
            pieces.push(TimeInterval::new(cursor, piece_end, self.seconds_offset));
            cursor = piece_end;
        }

        pieces
    }

    /// True when the UTC views of the two intervals overlap. Adjacent
    /// intervals (one ends exactly where the other starts) do not overlap.
    pub fn overlaps_utc(&self, other: &TimeInterval) -> bool {
        self.utc_start() < other.utc_end() && other.utc_start() < self.utc_end()
    }
}
