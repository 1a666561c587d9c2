use crate::space::{Point, PointSet};
use crate::types::{PointIdx, Value};

/// Rearranges list into the next lexicographically greater permutation.
/// Returns false (and leaves list sorted ascending) if list was the last permutation.
/// Starting from a sorted list, repeated calls enumerate every permutation exactly once.
pub(crate) fn next_permutation<E: Ord>(list: &mut [E]) -> bool {
    if list.len() < 2 {
        return false;
    }
    // find the longest non-increasing suffix
    let mut i = list.len() - 1;
    while i > 0 && list[i - 1] >= list[i] {
        i -= 1;
    }
    if i == 0 {
        list.reverse();
        return false;
    }
    // list[i-1] is the pivot; swap it with the rightmost element bigger than it
    let mut j = list.len() - 1;
    while list[j] <= list[i - 1] {
        j -= 1;
    }
    list.swap(i - 1, j);
    list[i..].reverse();
    true
}

/// Returns n! or None on overflow.
pub(crate) fn factorial(n: usize) -> Option<usize> {
    (1..=n).try_fold(1usize, |acc, x| acc.checked_mul(x))
}

/// Computes the per-dimension arithmetic mean of the points with the given indices.
///
/// # Panics
///
/// Panics in debug builds if members is empty.
pub(crate) fn mean_of(points: &PointSet, members: &[PointIdx]) -> Point {
    #[cfg(debug_assertions)]
    assert!(
        !members.is_empty(),
        "mean of an empty cluster requested; empty clusters must be healed first"
    );

    let mut sum: Point = vec!(0.0; points.dim());
    for &p in members {
        for (s, x) in sum.iter_mut().zip(points.get(p).iter()) {
            *s += x;
        }
    }
    let count = members.len() as Value;
    sum.into_iter().map(|s| s / count).collect()
}
