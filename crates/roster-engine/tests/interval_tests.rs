//! Tests for the interval algebra: UTC views, slicing, breakdown.

use roster_engine::TimeInterval;

#[test]
fn utc_view_subtracts_the_offset() {
    let interval = TimeInterval::new(10_000, 13_600, 7_200);

    assert_eq!(interval.utc_start(), 2_800);
    assert_eq!(interval.utc_end(), 6_400);
    assert_eq!(interval.duration(), 3_600);
}

#[test]
fn zero_offset_is_already_utc() {
    let interval = TimeInterval::new(1_000, 2_000, 0);

    assert_eq!(interval.utc_start(), 1_000);
    assert_eq!(interval.utc_end(), 2_000);
}

#[test]
fn break_down_exact_multiple() {
    let interval = TimeInterval::new(0, 3_000, 0);

    let pieces = interval.break_down(1_000);

    assert_eq!(
        pieces,
        vec![
            TimeInterval::new(0, 1_000, 0),
            TimeInterval::new(1_000, 2_000, 0),
            TimeInterval::new(2_000, 3_000, 0),
        ]
    );
}

#[test]
fn break_down_emits_a_shorter_tail() {
    let interval = TimeInterval::new(0, 2_500, 0);

    let pieces = interval.break_down(1_000);

    assert_eq!(pieces.len(), 3);
    assert_eq!(pieces[2], TimeInterval::new(2_000, 2_500, 0));
}

#[test]
fn break_down_preserves_the_offset() {
    let interval = TimeInterval::new(100, 300, 3_600);

    for piece in interval.break_down(100) {
        assert_eq!(piece.seconds_offset, 3_600);
    }
}

#[test]
fn break_down_of_zero_or_negative_slice_is_empty() {
    let interval = TimeInterval::new(0, 1_000, 0);

    assert!(interval.break_down(0).is_empty());
    assert!(interval.break_down(-60).is_empty());
}

#[test]
fn window_equal_to_slice_yields_one_piece() {
    let interval = TimeInterval::new(10_000, 13_600, 0);

    let pieces = interval.break_down(3_600);

    assert_eq!(pieces, vec![interval]);
    assert_eq!(interval.slice_count(3_600), 1);
}

#[test]
fn slice_count_floors() {
    let interval = TimeInterval::new(0, 2_500, 0);

    assert_eq!(interval.slice_count(1_000), 2);
}

#[test]
fn slice_count_of_degenerate_inputs_is_zero() {
    assert_eq!(TimeInterval::new(0, 1_000, 0).slice_count(0), 0);
    assert_eq!(TimeInterval::new(0, 1_000, 0).slice_count(-5), 0);
    assert_eq!(TimeInterval::new(1_000, 1_000, 0).slice_count(100), 0);
    assert_eq!(TimeInterval::new(2_000, 1_000, 0).slice_count(100), 0);
}

#[test]
fn overlap_is_computed_in_utc() {
    // Same wall-clock instants, two hours apart in UTC.
    let a = TimeInterval::new(1_000, 2_000, 7_200);
    let b = TimeInterval::new(1_000, 2_000, 0);

    assert!(!a.overlaps_utc(&b));

    // Shift b onto a's UTC span.
    let c = TimeInterval::new(-6_000, -5_000, 0);
    assert!(a.overlaps_utc(&c));
}

#[test]
fn adjacent_intervals_do_not_overlap() {
    let a = TimeInterval::new(0, 1_000, 0);
    let b = TimeInterval::new(1_000, 2_000, 0);

    assert!(!a.overlaps_utc(&b));
}
