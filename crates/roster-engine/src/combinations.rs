//! Backtracking enumeration of type-satisfying resource bundles.
//!
//! Used when a caller wants every way to satisfy a request, not only the
//! cheapest. Served quantities are honored here: a resource covering two
//! units can satisfy a quantity-two requirement alone.

use std::collections::BTreeMap;

use crate::resource::Resource;

/// Subsets of `candidates` (fleet indices, in their stored order) whose
/// served quantities sum to exactly `needed`. A candidate whose served
/// quantity exceeds the remaining need is never included. `cap > 0` bounds
/// the number of subsets produced; `0` means unlimited.
pub(crate) fn resource_combinations(
    fleet: &[Resource],
    candidates: &[usize],
    needed: u16,
    cap: usize,
) -> Vec<Vec<usize>> {
    let mut results = Vec::new();
    let mut current = Vec::new();

    fill_combinations(fleet, candidates, needed, cap, 0, &mut current, &mut results);

    results
}

fn fill_combinations(
    fleet: &[Resource],
    candidates: &[usize],
    remaining: u16,
    cap: usize,
    from: usize,
    current: &mut Vec<usize>,
    results: &mut Vec<Vec<usize>>,
) {
    if cap > 0 && results.len() >= cap {
        return;
    }

    if remaining == 0 {
        results.push(current.clone());
        return;
    }

    if from >= candidates.len() {
        return;
    }

    for position in from..candidates.len() {
        let index = candidates[position];
        let served = fleet[index].info().served_quantity;

        if served <= remaining {
            current.push(index);
            fill_combinations(
                fleet,
                candidates,
                remaining - served,
                cap,
                position + 1,
                current,
                results,
            );
            current.pop();
        }
    }
}

/// Cartesian product across resource types of the per-type subsets above:
/// every bundle satisfying all quantity requirements at once. Types are
/// processed in ascending numeric order and candidates in their stored
/// order, so the output order is deterministic. `cap > 0` bounds the total
/// number of bundles; `0` means unlimited.
pub(crate) fn all_valid_combinations(
    fleet: &[Resource],
    available_by_type: &BTreeMap<u8, Vec<usize>>,
    needed_per_type: &BTreeMap<u8, u16>,
    cap: usize,
) -> Vec<BTreeMap<u8, Vec<usize>>> {
    let types: Vec<u8> = available_by_type.keys().copied().collect();

    let mut results = Vec::new();
    let mut current = BTreeMap::new();

    fill_cross_product(
        fleet,
        available_by_type,
        needed_per_type,
        &types,
        cap,
        0,
        &mut current,
        &mut results,
    );

    results
}

#[allow(clippy::too_many_arguments)]
fn fill_cross_product(
    fleet: &[Resource],
    available_by_type: &BTreeMap<u8, Vec<usize>>,
    needed_per_type: &BTreeMap<u8, u16>,
    types: &[u8],
    cap: usize,
    type_index: usize,
    current: &mut BTreeMap<u8, Vec<usize>>,
    results: &mut Vec<BTreeMap<u8, Vec<usize>>>,
) {
    if cap > 0 && results.len() >= cap {
        return;
    }

    if type_index >= types.len() {
        results.push(current.clone());
        return;
    }

    let resource_type = types[type_index];
    let needed = needed_per_type
        .get(&resource_type)
        .copied()
        .unwrap_or_default();
    let empty = Vec::new();
    let candidates = available_by_type.get(&resource_type).unwrap_or(&empty);

    for subset in resource_combinations(fleet, candidates, needed, cap) {
        if cap > 0 && results.len() >= cap {
            return;
        }

        current.insert(resource_type, subset);

        fill_cross_product(
            fleet,
            available_by_type,
            needed_per_type,
            types,
            cap,
            type_index + 1,
            current,
            results,
        );

        current.remove(&resource_type);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::resource::{Resource, ResourceSpec};

    fn resource(id: i64, served: u16) -> Resource {
        Resource::new(
            ResourceSpec::new(id, format!("res {id}"), 1, BTreeMap::from([(1, 1.0)]))
                .with_served_quantity(served),
        )
        .unwrap()
    }

    #[test]
    fn subsets_sum_to_needed_quantity() {
        let fleet = vec![resource(1, 1), resource(2, 1), resource(3, 2)];
        let candidates = vec![0, 1, 2];

        let combos = resource_combinations(&fleet, &candidates, 2, 0);

        // {1,2} and {3}: every subset's served quantities sum to exactly 2.
        assert_eq!(combos, vec![vec![0, 1], vec![2]]);
    }

    #[test]
    fn oversized_resource_is_pruned() {
        let fleet = vec![resource(1, 3), resource(2, 1)];
        let candidates = vec![0, 1];

        let combos = resource_combinations(&fleet, &candidates, 1, 0);

        assert_eq!(combos, vec![vec![1]]);
    }

    #[test]
    fn cap_bounds_subset_count() {
        let fleet: Vec<Resource> = (1..=5).map(|id| resource(id, 1)).collect();
        let candidates: Vec<usize> = (0..5).collect();

        let unbounded = resource_combinations(&fleet, &candidates, 2, 0);
        let bounded = resource_combinations(&fleet, &candidates, 2, 3);

        assert_eq!(unbounded.len(), 10);
        assert_eq!(bounded.len(), 3);
        // The cap truncates the same deterministic enumeration.
        assert_eq!(bounded[..], unbounded[..3]);
    }

    #[test]
    fn cross_product_covers_all_types() {
        let fleet = vec![resource(1, 1), resource(2, 1), resource(3, 1)];
        let available = BTreeMap::from([(1u8, vec![0, 1]), (2u8, vec![2])]);
        let needed = BTreeMap::from([(1u8, 1u16), (2u8, 1u16)]);

        let bundles = all_valid_combinations(&fleet, &available, &needed, 0);

        assert_eq!(bundles.len(), 2);
        assert_eq!(bundles[0][&1], vec![0]);
        assert_eq!(bundles[0][&2], vec![2]);
        assert_eq!(bundles[1][&1], vec![1]);
        assert_eq!(bundles[1][&2], vec![2]);
    }

    #[test]
    fn cross_product_respects_cap() {
        let fleet: Vec<Resource> = (1..=6).map(|id| resource(id, 1)).collect();
        let available = BTreeMap::from([(1u8, vec![0, 1, 2]), (2u8, vec![3, 4, 5])]);
        let needed = BTreeMap::from([(1u8, 1u16), (2u8, 1u16)]);

        let bundles = all_valid_combinations(&fleet, &available, &needed, 4);

        assert_eq!(bundles.len(), 4);
    }

    #[test]
    fn served_quantity_satisfies_demand_alone() {
        let fleet = vec![resource(1, 2), resource(2, 1), resource(3, 1)];
        let available = BTreeMap::from([(1u8, vec![0, 1, 2])]);
        let needed = BTreeMap::from([(1u8, 2u16)]);

        let bundles = all_valid_combinations(&fleet, &available, &needed, 0);

        // The two-unit resource alone, or the two singles together.
        assert_eq!(bundles.len(), 2);
        assert_eq!(bundles[0][&1], vec![0]);
        assert_eq!(bundles[1][&1], vec![1, 2]);
    }
}
