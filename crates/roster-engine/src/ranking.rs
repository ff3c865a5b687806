//! Bundle cost ranking and slot selection.

use std::collections::BTreeMap;

use crate::interval::TimeInterval;
use crate::possibilities::SlotBundle;
use crate::resource::Resource;

/// Load unit used when ordering candidates and ranking slots. The true
/// per-run cost uses the run's own load unit.
pub(crate) const RANKING_LOAD_UNIT: u8 = 1;

/// Pick the cheapest feasible slot; ties break toward the earliest start.
///
/// Slots whose bundle cannot seat `needed_count` resources are skipped. The
/// returned start is shifted back into the task frame by
/// `offset_difference`. Slot iteration order is the interval order, so the
/// outcome is deterministic.
pub(crate) fn find_earliest_slot(
    fleet: &[Resource],
    possibilities: &BTreeMap<TimeInterval, SlotBundle>,
    needed_count: usize,
    offset_difference: i64,
) -> Option<(i64, Vec<usize>)> {
    let mut best: Option<(f32, i64, Vec<usize>)> = None;

    for (slot, bundle) in possibilities {
        if bundle.cheapest.len() < needed_count {
            continue;
        }

        let start = slot.time_start - offset_difference;
        let selection = &bundle.cheapest[..needed_count];

        let total_cost: f32 = selection
            .iter()
            .map(|&index| fleet[index].ranking_price(RANKING_LOAD_UNIT))
            .sum();

        let better = match &best {
            None => true,
            Some((best_cost, best_start, _)) => {
                total_cost < *best_cost || (total_cost == *best_cost && start < *best_start)
            }
        };

        if better {
            best = Some((total_cost, start, selection.to_vec()));
        }
    }

    best.map(|(_, start, selection)| (start, selection))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::resource::{Resource, ResourceSpec};

    const NOW: i64 = 10_000;
    const ONE_HOUR: i64 = 3_600;

    fn fleet() -> Vec<Resource> {
        vec![
            Resource::new(ResourceSpec::new(
                1,
                "low cost",
                1,
                BTreeMap::from([(1, 2.0)]),
            ))
            .unwrap(),
            Resource::new(ResourceSpec::new(
                2,
                "high cost",
                1,
                BTreeMap::from([(1, 3.0)]),
            ))
            .unwrap(),
        ]
    }

    fn bundle(indices: Vec<usize>) -> SlotBundle {
        SlotBundle {
            by_type: BTreeMap::from([(1u8, indices.clone())]),
            cheapest: indices,
        }
    }

    #[test]
    fn cheaper_later_slot_beats_expensive_now() {
        let fleet = fleet();
        let possibilities = BTreeMap::from([
            (
                TimeInterval::new(NOW, NOW + ONE_HOUR, 0),
                bundle(vec![1]), // only the expensive resource right now
            ),
            (
                TimeInterval::new(NOW + ONE_HOUR, NOW + 2 * ONE_HOUR, 0),
                bundle(vec![0, 1]),
            ),
        ]);

        let (start, selection) = find_earliest_slot(&fleet, &possibilities, 1, 0).unwrap();

        assert_eq!(start, NOW + ONE_HOUR);
        assert_eq!(selection, vec![0]);
    }

    #[test]
    fn single_slot_takes_cheapest_needed() {
        let fleet = fleet();
        let possibilities = BTreeMap::from([(
            TimeInterval::new(NOW + ONE_HOUR, NOW + 2 * ONE_HOUR, 0),
            bundle(vec![0, 1]),
        )]);

        let (start, selection) = find_earliest_slot(&fleet, &possibilities, 1, 0).unwrap();

        assert_eq!(start, NOW + ONE_HOUR);
        assert_eq!(selection, vec![0]);
    }

    #[test]
    fn undersized_slots_are_skipped() {
        let fleet = fleet();
        let possibilities = BTreeMap::from([(
            TimeInterval::new(NOW, NOW + ONE_HOUR, 0),
            bundle(vec![0]),
        )]);

        assert!(find_earliest_slot(&fleet, &possibilities, 2, 0).is_none());
    }

    #[test]
    fn offset_difference_shifts_result_into_task_frame() {
        let fleet = fleet();
        let shift = 2 * ONE_HOUR;
        let possibilities = BTreeMap::from([(
            TimeInterval::new(NOW + shift, NOW + shift + ONE_HOUR, shift),
            bundle(vec![0]),
        )]);

        let (start, _) = find_earliest_slot(&fleet, &possibilities, 1, shift).unwrap();

        assert_eq!(start, NOW);
    }
}
