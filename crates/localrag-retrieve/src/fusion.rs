//! Reciprocal rank fusion.

use std::collections::HashMap;

use localrag_core::types::{ItemId, RankedList};

/// Fused score of every item, in first-appearance order (list by list, best
/// rank first).
///
/// `score(item) = Σ 1 / (K + rank)` over the lists containing it, with
/// 0-based ranks and `K` equal to the number of lists. Only the first
/// occurrence of an item within a list counts.
pub fn fusion_scores(lists: &[RankedList]) -> Vec<(ItemId, f64)> {
    let k = lists.len() as f64;
    let mut order: Vec<(ItemId, f64)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for list in lists {
        let mut seen_here: Vec<&str> = Vec::with_capacity(list.len());
        for (rank, item) in list.iter().enumerate() {
            if seen_here.contains(&item.as_str()) {
                continue;
            }
            seen_here.push(item);
            let contribution = 1.0 / (k + rank as f64);
            match index.get(item.as_str()) {
                Some(&i) => order[i].1 += contribution,
                None => {
                    index.insert(item, order.len());
                    order.push((item.clone(), contribution));
                }
            }
        }
    }
    order
}

/// Items of `lists` by descending fused score, ties kept in first-appearance
/// order, truncated to `top_k`.
pub fn fuse(lists: &[RankedList], top_k: usize) -> RankedList {
    let mut scored = fusion_scores(lists);
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.into_iter().take(top_k).map(|(id, _)| id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn list(ids: &[&str]) -> RankedList {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn two_list_example() {
        let lists = vec![list(&["A", "B", "C"]), list(&["B", "C", "A"])];
        let scores: HashMap<_, _> = fusion_scores(&lists).into_iter().collect();
        assert!((scores["A"] - 0.75).abs() < 1e-12);
        assert!((scores["B"] - (1.0 / 3.0 + 0.5)).abs() < 1e-12);
        assert!((scores["C"] - (0.25 + 1.0 / 3.0)).abs() < 1e-12);
        assert_eq!(fuse(&lists, 10), list(&["B", "A", "C"]));
    }

    #[test]
    fn truncates_to_top_k() {
        let lists = vec![list(&["A", "B", "C"]), list(&["B", "C", "A"])];
        assert_eq!(fuse(&lists, 1), list(&["B"]));
        assert!(fuse(&lists, 0).is_empty());
    }

    #[test]
    fn empty_inputs() {
        assert!(fuse(&[], 5).is_empty());
        assert!(fuse(&[Vec::new(), Vec::new()], 5).is_empty());
    }

    #[test]
    fn ties_keep_first_appearance_order() {
        // Single list, K = 1: strictly decreasing, so order is preserved.
        assert_eq!(fuse(&[list(&["x", "y", "z"])], 3), list(&["x", "y", "z"]));
        // "q" and "p" tie at 1/2 + 1/3; "q" appears first.
        let lists = vec![list(&["q", "p"]), list(&["p", "q"])];
        assert_eq!(fuse(&lists, 2), list(&["q", "p"]));
    }

    #[test]
    fn repeated_item_in_one_list_counts_once() {
        let lists = vec![list(&["A", "A", "B"])];
        let scores: HashMap<_, _> = fusion_scores(&lists).into_iter().collect();
        assert!((scores["A"] - 1.0).abs() < 1e-12);
        assert!((scores["B"] - 1.0 / 3.0).abs() < 1e-12);
    }

    fn ranked_lists() -> impl Strategy<Value = Vec<RankedList>> {
        prop::collection::vec(
            prop::sample::subsequence((0..12).map(|i| format!("id{i}")).collect::<Vec<_>>(), 0..12).prop_shuffle(),
            1..5,
        )
    }

    proptest! {
        #[test]
        fn fusion_is_deterministic(lists in ranked_lists()) {
            prop_assert_eq!(fuse(&lists, 8), fuse(&lists, 8));
        }

        #[test]
        fn dominating_item_never_scores_lower(lists in ranked_lists()) {
            // An item at a better-or-equal rank in every list that holds the
            // other, and present wherever the other is, scores at least as high.
            let scores: HashMap<_, _> = fusion_scores(&lists).into_iter().collect();
            let ids: Vec<&String> = scores.keys().collect();
            for a in &ids {
                for b in &ids {
                    let dominates = lists.iter().all(|l| {
                        match (l.iter().position(|x| x == *a), l.iter().position(|x| x == *b)) {
                            (_, None) => true,
                            (Some(ra), Some(rb)) => ra <= rb,
                            (None, Some(_)) => false,
                        }
                    });
                    if dominates {
                        prop_assert!(scores[*a] >= scores[*b]);
                    }
                }
            }
        }

        #[test]
        fn output_is_a_prefix_of_the_full_fusion(lists in ranked_lists(), k in 0usize..15) {
            let full = fuse(&lists, usize::MAX);
            let cut = fuse(&lists, k);
            prop_assert_eq!(&full[..cut.len()], &cut[..]);
            prop_assert_eq!(cut.len(), k.min(full.len()));
        }
    }
}
