//! Property-based tests for the interval algebra and calendar queries.
//!
//! These verify invariants that should hold for *any* input, not just the
//! worked examples in the scenario tests.

use std::collections::BTreeMap;

use proptest::prelude::*;
use roster_engine::{
    Availability, BookingRecord, Resource, ResourceSpec, RunId, SearchDirection, StartSearch,
    TimeInterval,
};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// Whole-hour offsets from UTC-12 to UTC+14.
fn arb_offset() -> impl Strategy<Value = i64> {
    (-12i64..=14).prop_map(|hours| hours * 3_600)
}

fn arb_interval() -> impl Strategy<Value = TimeInterval> {
    (0i64..1_000_000, 1i64..100_000, arb_offset())
        .prop_map(|(start, length, offset)| TimeInterval::new(start, start + length, offset))
}

/// Non-overlapping maintenance spans: (gap, length) pairs laid out left to
/// right from the window start.
fn arb_busy_spans() -> impl Strategy<Value = Vec<(i64, i64)>> {
    prop::collection::vec((1i64..2_000, 1i64..2_000), 0..8)
}

fn booked_resource(spans: &[(i64, i64)], base: i64) -> Resource {
    let mut cursor = base;
    let mut records = Vec::new();

    for &(gap, length) in spans {
        cursor += gap;
        records.push(BookingRecord {
            time_start: cursor,
            time_end: cursor + length,
            seconds_offset: 0,
            run_id: 0,
        });
        cursor += length;
    }

    Resource::restore(
        ResourceSpec::new(1, "res", 1, BTreeMap::from([(1, 1.0)])),
        &records,
    )
    .unwrap()
}

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Property 1: break_down concatenates back to the original interval
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn break_down_concatenates_exactly(
        interval in arb_interval(),
        slice in 1i64..5_000,
    ) {
        let pieces = interval.break_down(slice);

        prop_assert!(!pieces.is_empty());
        prop_assert_eq!(pieces.first().unwrap().time_start, interval.time_start);
        prop_assert_eq!(pieces.last().unwrap().time_end, interval.time_end);

        for window in pieces.windows(2) {
            prop_assert_eq!(window[0].time_end, window[1].time_start);
        }
    }
}

// ---------------------------------------------------------------------------
// Property 2: every piece is slice-long except a shorter tail
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn break_down_piece_lengths(
        interval in arb_interval(),
        slice in 1i64..5_000,
    ) {
        let pieces = interval.break_down(slice);

        for piece in &pieces[..pieces.len() - 1] {
            prop_assert_eq!(piece.duration(), slice);
        }

        let tail = pieces.last().unwrap();
        prop_assert!(tail.duration() <= slice);
        prop_assert!(tail.duration() > 0);

        // slice_count counts exactly the full pieces.
        let full = pieces.iter().filter(|piece| piece.duration() == slice).count();
        prop_assert_eq!(interval.slice_count(slice) as usize, full);
    }
}

// ---------------------------------------------------------------------------
// Property 3: free intervals never overlap a booking and stay in the window
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn availability_is_disjoint_from_bookings(
        spans in arb_busy_spans(),
        window_length in 1i64..20_000,
        offset in arb_offset(),
    ) {
        let resource = booked_resource(&spans, 0);
        let window = TimeInterval::new(offset, offset + window_length, offset);

        if let Availability::Partial(free) = resource.availability(&window) {
            for gap in &free {
                prop_assert!(gap.utc_start() >= window.utc_start());
                prop_assert!(gap.utc_end() <= window.utc_end());
                prop_assert!(gap.time_start < gap.time_end);
                prop_assert_eq!(gap.seconds_offset, window.seconds_offset);

                for record in resource.snapshot() {
                    let busy = TimeInterval::new(
                        record.time_start,
                        record.time_end,
                        record.seconds_offset,
                    );
                    prop_assert!(!gap.overlaps_utc(&busy));
                }
            }

            // Free gaps are sorted and non-overlapping among themselves.
            for pair in free.windows(2) {
                prop_assert!(pair[0].time_end <= pair[1].time_start);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Property 4: add then remove restores the availability answer
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn add_remove_round_trip(
        spans in arb_busy_spans(),
        window_length in 10i64..20_000,
    ) {
        let mut resource = booked_resource(&spans, 0);
        let window = TimeInterval::new(0, window_length, 0);

        let before = resource.availability(&window);

        // Book the first free gap of at least 2 seconds, if any.
        let target = match &before {
            Availability::Free => Some(window),
            Availability::Partial(free) => {
                free.iter().find(|gap| gap.duration() >= 2).copied()
            }
        };

        if let Some(gap) = target {
            let run_id = RunId::work(777).unwrap();
            resource.add_run(gap, run_id).unwrap();

            prop_assert_eq!(resource.run_at(gap.time_start, 0).unwrap().id, run_id);

            resource.remove_run(run_id).unwrap();
            prop_assert_eq!(resource.availability(&window), before);
        }
    }
}

// ---------------------------------------------------------------------------
// Property 5: an earliest-found start is inside bounds and actually free
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn earliest_found_start_is_free(
        spans in arb_busy_spans(),
        duration in 1i64..3_000,
        horizon in 1_000i64..40_000,
    ) {
        let resource = booked_resource(&spans, 0);

        let found = resource.find_available_time(&StartSearch {
            time_start: 0,
            max_start: horizon,
            duration,
            task_offset: 0,
            location_offset: 0,
            direction: SearchDirection::Earliest,
        });

        if let Some(start) = found {
            prop_assert!(start >= 0);
            prop_assert!(start <= horizon);
            prop_assert!(resource
                .availability(&TimeInterval::new(start, start + duration, 0))
                .is_free());
        }
    }
}

// ---------------------------------------------------------------------------
// Property 6: a latest-found start is free and no later one exists nearby
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn latest_found_start_is_free_and_maximal(
        spans in arb_busy_spans(),
        duration in 1i64..3_000,
        horizon in 1_000i64..40_000,
    ) {
        let resource = booked_resource(&spans, 0);

        let found = resource.find_available_time(&StartSearch {
            time_start: 0,
            max_start: horizon,
            duration,
            task_offset: 0,
            location_offset: 0,
            direction: SearchDirection::Latest,
        });

        if let Some(start) = found {
            prop_assert!(start <= horizon);
            prop_assert!(resource
                .availability(&TimeInterval::new(start, start + duration, 0))
                .is_free());

            // No strictly later start within bounds is free.
            for later in (start + 1)..=(start + 3).min(horizon) {
                let free = resource
                    .availability(&TimeInterval::new(later, later + duration, 0))
                    .is_free();
                prop_assert!(!free || later == start);
            }
        }
    }
}
