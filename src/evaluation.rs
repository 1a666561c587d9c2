//! Scores a clustering against ground-truth labels.
//!
//! Cluster ids carry no meaning, so the evaluator first searches the relabeling of cluster ids
//! that agrees with the ground truth on the most samples, and scores the relabeled prediction.
//! The search enumerates every permutation of the labels and is therefore factorial in the number
//! of distinct labels; inputs with more than [MAX_LABELS_FOR_MATCHING] labels are rejected.

use crate::error::{EngineError, Result};
use crate::types::{ClusterIdx, PointCount, Value};
use crate::utilities::{factorial, next_permutation};

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::trace;

/// Largest number of distinct labels for which the exhaustive matching is run (10! permutations).
pub const MAX_LABELS_FOR_MATCHING: usize = 10;

/// Precision, recall and F1 of a single class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassScore<L> {
    pub label: L,
    pub precision: Value,
    pub recall: Value,
    pub f1: Value,
    /// number of samples whose true label is this class
    pub support: PointCount,
}

/// The outcome of matching a cluster assignment to ground-truth labels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation<L> {
    /// fraction of samples whose translated cluster equals their label
    pub accuracy: Value,
    /// macro-averaged precision
    pub precision: Value,
    /// macro-averaged recall
    pub recall: Value,
    /// macro-averaged F1
    pub f1: Value,
    /// number of samples the winning relabeling gets right
    pub matches: PointCount,
    /// the winning relabeling, ordered by cluster id
    pub mapping: Vec<(ClusterIdx, L)>,
    /// scores of every distinct ground-truth label, in label order
    pub per_class: Vec<ClassScore<L>>,
    /// translated assignment; None for cluster ids without a label
    pub predictions: Vec<Option<L>>,
}

/// Finds the bijection of cluster ids onto labels that maximizes the number of agreeing samples,
/// translates the assignment through it and computes accuracy plus per-class and macro-averaged
/// precision, recall and F1.
///
/// The cluster ids are the distinct ids of the assignment in ascending order, padded with the
/// smallest missing ids in 0..k if fewer than k = #labels ids occur. Permutations of the sorted
/// labels are visited in lexicographic order and the first one with the highest agreement wins.
///
/// # Errors
///
/// * EmptyDataset if there are no samples;
/// * DimensionMismatch if assignment and ground_truth have different lengths;
/// * TooManyLabels if there are more than [MAX_LABELS_FOR_MATCHING] distinct labels.
pub fn evaluate<L: Ord + Clone>(
    assignment: &[ClusterIdx],
    ground_truth: &[L],
) -> Result<Evaluation<L>> {
    if ground_truth.is_empty() {
        return Err(EngineError::EmptyDataset);
    }
    if assignment.len() != ground_truth.len() {
        return Err(EngineError::DimensionMismatch {
            expected: ground_truth.len(),
            got: assignment.len(),
        });
    }

    let classes: Vec<L> =
        ground_truth.iter().cloned().collect::<BTreeSet<L>>().into_iter().collect();
    let k = classes.len();
    if k > MAX_LABELS_FOR_MATCHING {
        return Err(EngineError::TooManyLabels { labels: k, limit: MAX_LABELS_FOR_MATCHING });
    }
    let ids = cluster_ids(assignment, k);

    // label index of every sample (classes is sorted, so the search always succeeds)
    let truth: Vec<usize> = ground_truth
        .iter()
        .map(|l| {
            classes
                .binary_search(l)
                .unwrap_or_else(|_| unreachable!("label not in its own set"))
        })
        .collect();
    let position_of: BTreeMap<ClusterIdx, usize> =
        ids.iter().enumerate().map(|(pos, &c)| (c, pos)).collect();

    // contingency[pos][l] = number of samples in cluster ids[pos] with label l
    let mut contingency: Vec<Vec<PointCount>> = vec!(vec!(0; k); ids.len());
    for (c, &l) in assignment.iter().zip(truth.iter()) {
        contingency[position_of[c]][l] += 1;
    }

    let mapped = ids.len().min(k);
    let mut permutation: Vec<usize> = (0..k).collect();
    let mut best_permutation = permutation.clone();
    let mut best_matches: PointCount = 0;
    let mut first = true;
    loop {
        let matches: PointCount = (0..mapped).map(|pos| contingency[pos][permutation[pos]]).sum();
        if first || matches > best_matches {
            best_matches = matches;
            best_permutation.copy_from_slice(&permutation);
            first = false;
        }
        if !next_permutation(&mut permutation) {
            break;
        }
    }
    trace!(permutations = ?factorial(k), best_matches, "label matching done");

    // label index for every mapped cluster id
    let label_of: BTreeMap<ClusterIdx, usize> =
        (0..mapped).map(|pos| (ids[pos], best_permutation[pos])).collect();
    let predicted: Vec<Option<usize>> =
        assignment.iter().map(|c| label_of.get(c).copied()).collect();

    let mut true_positives = vec!(0; k);
    let mut false_positives = vec!(0; k);
    let mut false_negatives = vec!(0; k);
    for (&t, p) in truth.iter().zip(predicted.iter()) {
        if *p == Some(t) {
            true_positives[t] += 1;
        } else {
            false_negatives[t] += 1;
            if let Some(p) = p {
                false_positives[*p] += 1;
            }
        }
    }

    let per_class: Vec<ClassScore<L>> = classes
        .iter()
        .enumerate()
        .map(|(l, label)| {
            let precision = ratio(true_positives[l], true_positives[l] + false_positives[l]);
            let recall = ratio(true_positives[l], true_positives[l] + false_negatives[l]);
            ClassScore {
                label: label.clone(),
                precision,
                recall,
                f1: harmonic_mean(precision, recall),
                support: true_positives[l] + false_negatives[l],
            }
        })
        .collect();

    let number_of_classes = k as Value;
    Ok(Evaluation {
        accuracy: best_matches as Value / ground_truth.len() as Value,
        precision: per_class.iter().map(|s| s.precision).sum::<Value>() / number_of_classes,
        recall: per_class.iter().map(|s| s.recall).sum::<Value>() / number_of_classes,
        f1: per_class.iter().map(|s| s.f1).sum::<Value>() / number_of_classes,
        matches: best_matches,
        mapping: label_of.iter().map(|(&c, &l)| (c, classes[l].clone())).collect(),
        per_class,
        predictions: predicted.into_iter().map(|p| p.map(|l| classes[l].clone())).collect(),
    })
}

/// Distinct cluster ids in ascending order, padded with the smallest ids of 0..k not present
/// until there are k of them.
fn cluster_ids(assignment: &[ClusterIdx], k: usize) -> Vec<ClusterIdx> {
    let present: BTreeSet<ClusterIdx> = assignment.iter().copied().collect();
    let mut ids: Vec<ClusterIdx> = present.iter().copied().collect();
    for c in (0..k).filter(|c| !present.contains(c)) {
        if ids.len() >= k {
            break;
        }
        ids.push(c);
    }
    ids.sort_unstable();
    ids
}

fn ratio(numerator: PointCount, denominator: PointCount) -> Value {
    if denominator == 0 {
        0.0
    } else {
        numerator as Value / denominator as Value
    }
}

fn harmonic_mean(precision: Value, recall: Value) -> Value {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swapped_ids_are_matched() {
        let evaluation = evaluate(&[1, 1, 0, 0], &["A", "A", "B", "B"]).unwrap();
        assert_eq!(evaluation.accuracy, 1.0);
        assert_eq!(evaluation.f1, 1.0);
        assert_eq!(evaluation.mapping, vec!((0, "B"), (1, "A")));
        assert_eq!(evaluation.predictions, vec!(Some("A"), Some("A"), Some("B"), Some("B")));
    }

    #[test]
    fn metrics_of_one_mistake() {
        // cluster 0 = {A, A, B}, cluster 1 = {B}
        let evaluation = evaluate(&[0, 0, 0, 1], &["A", "A", "B", "B"]).unwrap();
        assert_eq!(evaluation.matches, 3);
        assert_eq!(evaluation.accuracy, 0.75);
        let a = &evaluation.per_class[0];
        assert_eq!((a.precision, a.recall), (2.0 / 3.0, 1.0));
        assert!((a.f1 - 0.8).abs() < 1e-12);
        let b = &evaluation.per_class[1];
        assert_eq!((b.precision, b.recall), (1.0, 0.5));
        assert!((b.f1 - 2.0 / 3.0).abs() < 1e-12);
        assert!((evaluation.f1 - (0.8 + 2.0 / 3.0) / 2.0).abs() < 1e-12);
        assert_eq!(a.support + b.support, 4);
    }

    #[test]
    fn single_cluster_is_padded() {
        // only cluster 0 is used; id 1 is padded in so that both labels are permuted
        let evaluation = evaluate(&[0, 0, 0], &["x", "y", "y"]).unwrap();
        assert_eq!(evaluation.matches, 2);
        assert_eq!(evaluation.mapping, vec!((0, "y"), (1, "x")));
        let x = &evaluation.per_class[0];
        assert_eq!((x.precision, x.recall, x.f1), (0.0, 0.0, 0.0));
        assert!(evaluation.f1 < 1.0);
    }

    #[test]
    fn extra_cluster_ids_translate_to_unknown() {
        let evaluation = evaluate(&[0, 1, 2, 2], &[1u8, 2, 2, 2]).unwrap();
        assert_eq!(evaluation.mapping.len(), 2);
        assert!(evaluation.predictions.iter().any(|p| p.is_none()));
    }

    #[test]
    fn first_maximizer_wins_ties() {
        // every relabeling gets exactly one sample right
        let evaluation = evaluate(&[0, 1], &["a", "a"]).unwrap();
        assert_eq!(evaluation.matches, 1);
        assert_eq!(evaluation.mapping, vec!((0, "a")));
    }

    #[test]
    fn three_labels() {
        let assignment = [2, 2, 0, 0, 1, 1, 1];
        let truth = ["a", "a", "b", "b", "c", "c", "b"];
        let evaluation = evaluate(&assignment, &truth).unwrap();
        assert_eq!(evaluation.mapping, vec!((0, "b"), (1, "c"), (2, "a")));
        assert_eq!(evaluation.matches, 6);
    }

    #[test]
    fn input_errors() {
        assert!(matches!(evaluate::<&str>(&[], &[]), Err(EngineError::EmptyDataset)));
        assert!(matches!(
            evaluate(&[0], &["a", "b"]),
            Err(EngineError::DimensionMismatch { expected: 2, got: 1 })
        ));
        let labels: Vec<usize> = (0..11).collect();
        let assignment: Vec<usize> = (0..11).collect();
        assert!(matches!(
            evaluate(&assignment, &labels),
            Err(EngineError::TooManyLabels { labels: 11, limit: 10 })
        ));
    }
}
