//! Group-aware reordering of a fused ranking.

use std::collections::HashMap;

use localrag_core::types::{GroupId, ItemId};

/// Reorder `fused` so that items of frequent groups come first.
///
/// Groups are ranked by how many of the given ids they hold (ties: the group
/// seen first in `fused`); ids are sorted by `(group rank, fused rank)`. With
/// `select_amount`, the first `select_amount` ids are kept, followed by any
/// later id of `overflow_group`. Ids `group_of` cannot resolve are dropped.
pub fn rerank_by_group<F>(
    fused: &[ItemId],
    group_of: F,
    select_amount: Option<usize>,
    overflow_group: Option<GroupId>,
) -> Vec<ItemId>
where
    F: Fn(&str) -> Option<GroupId>,
{
    let mut known: Vec<(usize, &ItemId, GroupId)> = Vec::with_capacity(fused.len());
    for (rank, id) in fused.iter().enumerate() {
        match group_of(id) {
            Some(group) => known.push((rank, id, group)),
            None => tracing::warn!(id = %id, "no group metadata; dropping from rerank"),
        }
    }

    let mut frequency: HashMap<GroupId, usize> = HashMap::new();
    let mut first_seen: Vec<GroupId> = Vec::new();
    for (_, _, group) in &known {
        let count = frequency.entry(*group).or_insert(0);
        if *count == 0 {
            first_seen.push(*group);
        }
        *count += 1;
    }
    // Stable: equal frequencies keep first-seen order.
    first_seen.sort_by(|a, b| frequency[b].cmp(&frequency[a]));
    let group_rank: HashMap<GroupId, usize> = first_seen.iter().enumerate().map(|(rank, g)| (*g, rank)).collect();

    known.sort_by_key(|(rank, _, group)| (group_rank[group], *rank));

    let Some(limit) = select_amount else {
        return known.into_iter().map(|(_, id, _)| id.clone()).collect();
    };
    let split = limit.min(known.len());
    let (head, tail) = known.split_at(split);
    head.iter()
        .chain(tail.iter().filter(|(_, _, group)| Some(*group) == overflow_group))
        .map(|(_, id, _)| (*id).clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> Vec<ItemId> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    fn groups(pairs: &[(&str, GroupId)]) -> HashMap<String, GroupId> {
        pairs.iter().map(|(id, g)| (id.to_string(), *g)).collect()
    }

    #[test]
    fn frequent_groups_first_keeping_fused_order() {
        let fused = ids(&["a", "b", "c", "d", "e"]);
        let g = groups(&[("a", 1), ("b", 2), ("c", 2), ("d", 3), ("e", 2)]);
        let out = rerank_by_group(&fused, |id| g.get(id).copied(), None, None);
        assert_eq!(out, ids(&["b", "c", "e", "a", "d"]));
    }

    #[test]
    fn equal_frequency_groups_keep_first_seen_order() {
        let fused = ids(&["x", "y", "z", "w"]);
        let g = groups(&[("x", 9), ("y", 4), ("z", 4), ("w", 9)]);
        let out = rerank_by_group(&fused, |id| g.get(id).copied(), None, None);
        assert_eq!(out, ids(&["x", "w", "y", "z"]));
    }

    #[test]
    fn overflow_group_survives_the_cutoff() {
        let fused = ids(&["a", "b", "c", "d"]);
        let g = groups(&[("a", 1), ("b", 1), ("c", 1), ("d", 17)]);
        let out = rerank_by_group(&fused, |id| g.get(id).copied(), Some(2), Some(17));
        assert_eq!(out, ids(&["a", "b", "d"]));
        let without = rerank_by_group(&fused, |id| g.get(id).copied(), Some(2), None);
        assert_eq!(without, ids(&["a", "b"]));
    }

    #[test]
    fn overflow_items_inside_the_cutoff_are_not_duplicated() {
        let fused = ids(&["a", "b", "c"]);
        let g = groups(&[("a", 17), ("b", 17), ("c", 17)]);
        let out = rerank_by_group(&fused, |id| g.get(id).copied(), Some(1), Some(17));
        assert_eq!(out, ids(&["a", "b", "c"]));
    }

    #[test]
    fn ids_without_metadata_are_dropped() {
        let fused = ids(&["ghost", "a", "b"]);
        let g = groups(&[("a", 1), ("b", 2)]);
        let out = rerank_by_group(&fused, |id| g.get(id).copied(), Some(5), None);
        assert_eq!(out, ids(&["a", "b"]));
    }

    #[test]
    fn select_amount_larger_than_input() {
        let fused = ids(&["a"]);
        let out = rerank_by_group(&fused, |_| Some(1), Some(8), Some(17));
        assert_eq!(out, ids(&["a"]));
        assert!(rerank_by_group(&[], |_| Some(1), Some(8), Some(17)).is_empty());
    }
}
