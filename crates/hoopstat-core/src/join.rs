// Inner join with an accounting of what fell out.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::hash::Hash;
use tracing::{debug, warn};

/// Result of an inner join: the matched pairs plus the keys that had no
/// counterpart on the other side.
#[derive(Debug, Clone)]
pub struct JoinOutcome<L, R, K> {
    pub matched: Vec<(L, R)>,
    /// Distinct left keys absent from the right input.
    pub unmatched_left: BTreeSet<K>,
    /// Distinct right keys absent from the left input.
    pub unmatched_right: BTreeSet<K>,
    /// Left rows dropped (counting duplicates).
    pub dropped_left_rows: usize,
    /// Right rows dropped (counting duplicates).
    pub dropped_right_rows: usize,
}

impl<L, R, K> JoinOutcome<L, R, K> {
    pub fn is_complete(&self) -> bool {
        self.dropped_left_rows == 0 && self.dropped_right_rows == 0
    }
}

/// Relational inner join of `left` and `right`.
///
/// A key occurring `m` times on the left and `n` times on the right yields
/// `m * n` pairs. Output follows left input order, then right input order
/// within a key. Unmatched rows are dropped and reported.
pub fn inner_join<L, R, K, FL, FR>(
    left: &[L],
    right: &[R],
    key_left: FL,
    key_right: FR,
) -> JoinOutcome<L, R, K>
where
    L: Clone,
    R: Clone,
    K: Eq + Hash + Ord + Clone,
    FL: Fn(&L) -> K,
    FR: Fn(&R) -> K,
{
    let mut right_index: HashMap<K, Vec<usize>> = HashMap::new();
    for (i, r) in right.iter().enumerate() {
        right_index.entry(key_right(r)).or_default().push(i);
    }

    let mut matched = Vec::new();
    let mut seen_left: HashSet<K> = HashSet::new();
    let mut unmatched_left = BTreeSet::new();
    let mut dropped_left_rows = 0;

    for l in left {
        let k = key_left(l);
        match right_index.get(&k) {
            Some(rows) => {
                for &i in rows {
                    matched.push((l.clone(), right[i].clone()));
                }
                seen_left.insert(k);
            }
            None => {
                dropped_left_rows += 1;
                unmatched_left.insert(k);
            }
        }
    }

    let mut unmatched_right = BTreeSet::new();
    let mut dropped_right_rows = 0;
    for (k, rows) in right_index {
        if !seen_left.contains(&k) {
            dropped_right_rows += rows.len();
            unmatched_right.insert(k);
        }
    }

    JoinOutcome {
        matched,
        unmatched_left,
        unmatched_right,
        dropped_left_rows,
        dropped_right_rows,
    }
}

/// Log the rows a join dropped. `what` names the join for the log line.
pub fn log_unmatched<L, R, K: std::fmt::Debug>(what: &str, outcome: &JoinOutcome<L, R, K>) {
    if outcome.is_complete() {
        debug!("{what}: all rows matched ({} pairs)", outcome.matched.len());
        return;
    }
    warn!(
        "{what}: {} pairs matched; dropped {} left rows ({} keys) and {} right rows ({} keys)",
        outcome.matched.len(),
        outcome.dropped_left_rows,
        outcome.unmatched_left.len(),
        outcome.dropped_right_rows,
        outcome.unmatched_right.len()
    );
    debug!(
        "{what}: sample unmatched left keys {:?}",
        outcome.unmatched_left.iter().take(10).collect::<Vec<_>>()
    );
    debug!(
        "{what}: sample unmatched right keys {:?}",
        outcome.unmatched_right.iter().take(10).collect::<Vec<_>>()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn left_rows() -> Vec<(&'static str, i32)> {
        vec![("a", 1), ("b", 2), ("c", 3)]
    }

    #[test]
    fn only_shared_keys_survive() {
        let right = vec![("b", "B"), ("c", "C"), ("d", "D")];
        let out = inner_join(&left_rows(), &right, |l| l.0, |r| r.0);

        let keys: Vec<&str> = out.matched.iter().map(|(l, _)| l.0).collect();
        assert_eq!(keys, vec!["b", "c"]);
        assert!(out.matched.iter().all(|(l, r)| l.0 == r.0));
        assert_eq!(out.unmatched_left.iter().copied().collect::<Vec<_>>(), vec!["a"]);
        assert_eq!(out.unmatched_right.iter().copied().collect::<Vec<_>>(), vec!["d"]);
        assert_eq!(out.dropped_left_rows, 1);
        assert_eq!(out.dropped_right_rows, 1);
        assert!(!out.is_complete());
    }

    #[test]
    fn keys_missing_from_right_never_appear() {
        let right = vec![("c", "C")];
        let out = inner_join(&left_rows(), &right, |l| l.0, |r| r.0);
        assert!(out.matched.iter().all(|(l, _)| l.0 == "c"));
        assert!(out.matched.len() <= right.len().min(left_rows().len()));
    }

    #[test]
    fn duplicates_produce_cross_product() {
        let left = vec![("a", 1), ("a", 2), ("b", 3)];
        let right = vec![("a", "x"), ("a", "y"), ("b", "z")];
        let out = inner_join(&left, &right, |l| l.0, |r| r.0);

        assert_eq!(out.matched.len(), 5);
        let pairs: Vec<(i32, &str)> = out.matched.iter().map(|(l, r)| (l.1, r.1)).collect();
        assert_eq!(pairs, vec![(1, "x"), (1, "y"), (2, "x"), (2, "y"), (3, "z")]);
        assert!(out.is_complete());
    }

    #[test]
    fn duplicate_dropped_rows_are_counted() {
        let left = vec![("a", 1)];
        let right = vec![("z", "x"), ("z", "y")];
        let out = inner_join(&left, &right, |l| l.0, |r| r.0);
        assert!(out.matched.is_empty());
        assert_eq!(out.dropped_right_rows, 2);
        assert_eq!(out.unmatched_right.len(), 1);
    }

    #[test]
    fn empty_sides() {
        let empty: Vec<(&str, i32)> = Vec::new();
        let right = vec![("a", "A")];
        let out = inner_join(&empty, &right, |l| l.0, |r| r.0);
        assert!(out.matched.is_empty());
        assert_eq!(out.dropped_right_rows, 1);
    }
}
