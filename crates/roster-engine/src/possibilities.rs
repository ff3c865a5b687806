//! Enumeration of feasible start slots over a fleet and a search window.
//!
//! A slot is an aligned sub-interval of the window, exactly one run-duration
//! long. Each slot maps to the candidate resources (per type) free for the
//! whole slot; slots that cannot meet every type's quantity are dropped.

use std::collections::BTreeMap;

use crate::interval::TimeInterval;
use crate::ranking::RANKING_LOAD_UNIT;
use crate::resource::{Availability, Resource};

/// Candidates for one feasible slot. `by_type` holds every candidate sorted
/// by ranking price then id; `cheapest` is the ready-to-commit bundle (the
/// `needed[type]` cheapest of each type, types ascending).
#[derive(Debug, Clone, Default)]
pub(crate) struct SlotBundle {
    pub by_type: BTreeMap<u8, Vec<usize>>,
    pub cheapest: Vec<usize>,
}

/// Build the `slot -> candidates` map for `duration`-long slots inside
/// `window`. `candidates` holds fleet indices per needed resource type;
/// quantity requirements come from `needed_per_type`. Candidates count as
/// capacity 1 here; served quantities matter only to the combination
/// enumerator.
pub(crate) fn build_possibilities(
    fleet: &[Resource],
    candidates: &BTreeMap<u8, Vec<usize>>,
    needed_per_type: &BTreeMap<u8, u16>,
    window: &TimeInterval,
    duration: i64,
) -> BTreeMap<TimeInterval, SlotBundle> {
    let mut slot_candidates: BTreeMap<TimeInterval, BTreeMap<u8, Vec<usize>>> = BTreeMap::new();

    for (&resource_type, indices) in candidates {
        for &index in indices {
            match fleet[index].availability(window) {
                Availability::Free => {
                    // Fully free: every aligned slot of the window fits.
                    for slice in 0..window.slice_count(duration) {
                        let slot_start = window.time_start + slice * duration;
                        let slot = TimeInterval::new(
                            slot_start,
                            slot_start + duration,
                            window.seconds_offset,
                        );

                        slot_candidates
                            .entry(slot)
                            .or_default()
                            .entry(resource_type)
                            .or_default()
                            .push(index);
                    }
                }
                Availability::Partial(free) => {
                    for gap in free {
                        for piece in gap.break_down(duration) {
                            // The trailing remainder of a gap is too short
                            // to host the run.
                            if piece.duration() != duration {
                                continue;
                            }

                            let slot = TimeInterval::new(
                                piece.time_start,
                                piece.time_end,
                                window.seconds_offset,
                            );

                            slot_candidates
                                .entry(slot)
                                .or_default()
                                .entry(resource_type)
                                .or_default()
                                .push(index);
                        }
                    }
                }
            }
        }
    }

    let mut result = BTreeMap::new();

    'slots: for (slot, mut by_type) in slot_candidates {
        for (&resource_type, &needed) in needed_per_type {
            let available = by_type
                .get(&resource_type)
                .map(Vec::len)
                .unwrap_or_default();

            if available < needed as usize {
                continue 'slots;
            }
        }

        let mut cheapest = Vec::new();

        for (&resource_type, &needed) in needed_per_type {
            let list = by_type.entry(resource_type).or_default();

            list.sort_by(|&a, &b| {
                let price_a = fleet[a].ranking_price(RANKING_LOAD_UNIT);
                let price_b = fleet[b].ranking_price(RANKING_LOAD_UNIT);

                price_a
                    .partial_cmp(&price_b)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| fleet[a].id().cmp(&fleet[b].id()))
            });

            cheapest.extend_from_slice(&list[..needed as usize]);
        }

        result.insert(slot, SlotBundle { by_type, cheapest });
    }

    result
}
