//! Clusters every 2d projection of a labeled dataset and ranks the projections by how well the
//! clusters recover the labels.
//!
//! For each unordered pair of feature columns the samples are projected into the plane, seeded by
//! k-means++ and partitioned by Lloyd's iteration into k clusters, k being the number of distinct
//! labels. The clusters are then matched to the labels by the best relabeling and scored by
//! macro-averaged precision, recall and F1. The pairs are ranked by macro-F1.
//!
//! ```rust
//! use feature_pair_kmeans::{analyze, OptionalParameters};
//! let features = vec!(
//!     vec!(0.0, 0.0, 5.0),
//!     vec!(0.0, 1.0, 5.0),
//!     vec!(10.0, 10.0, 5.0),
//!     vec!(10.0, 11.0, 5.0),
//! );
//! let labels = vec!("A", "A", "B", "B");
//! let optional = OptionalParameters { seed: Some(42), ..Default::default() };
//! let ranking = analyze(&features, &labels, Some(optional)).unwrap();
//! assert_eq!(ranking.len(), 3);
//! assert_eq!(ranking.best().unwrap().evaluation.f1, 1.0);
//! ```

pub mod types;
pub use types::{DurationInSec, FeatureIdx, IterationCount, PointCount, Value};

pub mod error;
pub use error::{EngineError, Result};

pub mod space;
pub use space::PointSet;

pub mod clustering;
use clustering::Clustering;

pub mod seeding;
use seeding::kmeans_plus_plus;

pub mod partition;
use partition::lloyd;

pub mod evaluation;
use evaluation::{evaluate, Evaluation};

pub mod dataset;
pub use dataset::Dataset;

pub mod report;
pub use report::AnalysisReport;

mod assertions;
use assertions::{assert_input, assert_parameters};

mod utilities;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use serde::Serialize;
use tracing::{debug, info};

/// Lloyd iteration cap used when none is given.
pub const DEFAULT_MAX_ITERATIONS: IterationCount = 999;

/// Optional parameters of a run; None means default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionalParameters {
    /// cap on the Lloyd iterations per run (default: 999)
    pub max_iterations: Option<IterationCount>,
    /// independent seeding + partition runs per feature pair, the best by macro-F1 is kept
    /// (default: 1)
    pub restarts: Option<usize>,
    /// makes all random draws reproducible (default: drawn from entropy)
    pub seed: Option<u64>,
    /// number of threads working on feature pairs (default: number of cores)
    pub thread_count: Option<usize>,
}

/// Parameters with all defaults filled in.
#[derive(Debug, Clone, Copy)]
struct Parameters {
    max_iterations: IterationCount,
    restarts: usize,
    seed: Option<u64>,
    thread_count: usize,
}

impl Parameters {
    fn resolve(optional: Option<OptionalParameters>) -> Result<Parameters> {
        let optional = optional.unwrap_or_default();
        assert_parameters(&optional)?;
        Ok(Parameters {
            max_iterations: optional.max_iterations.unwrap_or(DEFAULT_MAX_ITERATIONS),
            restarts: optional.restarts.unwrap_or(1),
            seed: optional.seed,
            thread_count: optional.thread_count.unwrap_or_else(num_cpus::get),
        })
    }
}


/// The full outcome for one feature pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult<L> {
    /// the projected columns (i, j) with i < j
    pub feature_indices: [FeatureIdx; 2],
    /// 1-based display names of the columns
    pub feature_names: [String; 2],
    /// final centroids, raw assignment and iterations
    #[serde(flatten)]
    pub clustering: Clustering,
    /// metrics and translated assignment
    #[serde(flatten)]
    pub evaluation: Evaluation<L>,
}

/// All match results sorted by macro-F1, best first. Ties keep the enumeration order of the pairs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Ranking<L> {
    results: Vec<MatchResult<L>>,
}

impl<L> Ranking<L> {
    /// Returns the best-ranked result, if there is any pair at all.
    pub fn best(&self) -> Option<&MatchResult<L>> {
        self.results.first()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<MatchResult<L>> {
        self.results.iter()
    }
}


/// Clusters every pair of feature columns and ranks the pairs.
///
/// # Inputs
/// * features: one row per sample, every row of the same width (at least 2);
/// * labels: the ground-truth label of every sample; k is the number of distinct labels;
/// * optional: see [OptionalParameters].
///
/// # Errors
/// * EmptyDataset if there are no samples;
/// * DimensionMismatch if the number of labels differs from the number of rows or rows are ragged;
/// * TooFewFeatures if there are less than two columns;
/// * DegenerateK if there is only one distinct label;
/// * TooManyLabels if the label matching would be too expensive;
/// * ValueOutOfRange if a feature is too large for the squared distances to stay finite;
/// * InvalidParameter if an optional parameter is 0.
pub fn analyze<L>(
    features: &[Vec<Value>],
    labels: &[L],
    optional: Option<OptionalParameters>,
) -> Result<Ranking<L>>
where
    L: Ord + Clone + Send + Sync,
{
    let params = Parameters::resolve(optional)?;
    let k = assert_input(features, labels)?;
    let number_of_features = features[0].len();

    // every unordered pair (i, j) with i < j, numbered in enumeration order
    let pairs: Vec<(usize, FeatureIdx, FeatureIdx)> = (0..number_of_features)
        .flat_map(|i| (i + 1..number_of_features).map(move |j| (i, j)))
        .enumerate()
        .map(|(index, (i, j))| (index, i, j))
        .collect();

    info!(
        "Clustering {} samples into k = {} clusters for {} feature pairs on {} threads.",
        features.len(),
        k,
        pairs.len(),
        params.thread_count
    );

    let thread_pool = ThreadPoolBuilder::new().num_threads(params.thread_count).build()?;
    let mut results: Vec<MatchResult<L>> = thread_pool.install(|| {
        pairs
            .into_par_iter()
            .map(|(index, i, j)| analyze_pair(features, labels, k, index, (i, j), &params))
            .collect::<Result<Vec<MatchResult<L>>>>()
    })?;

    // stable, so ties stay in enumeration order; f1 is never NaN
    results.sort_by(|a, b| {
        b.evaluation.f1.partial_cmp(&a.evaluation.f1).unwrap_or(std::cmp::Ordering::Equal)
    });

    if let Some(best) = results.first() {
        info!(
            "Best feature pair: {:?} with macro-F1 = {:.4} and accuracy = {:.4}.",
            best.feature_indices, best.evaluation.f1, best.evaluation.accuracy
        );
    }
    Ok(Ranking { results })
}

/// Runs seeding, partition and evaluation on the projection of one feature pair, restarting
/// params.restarts times and keeping the run with the highest macro-F1.
fn analyze_pair<L: Ord + Clone>(
    features: &[Vec<Value>],
    labels: &[L],
    k: PointCount,
    pair_index: usize,
    (i, j): (FeatureIdx, FeatureIdx),
    params: &Parameters,
) -> Result<MatchResult<L>> {
    let points = PointSet::by_projection(features, i, j);
    let mut rng = pair_rng(params.seed, pair_index);

    let mut best: Option<(Clustering, Evaluation<L>)> = None;
    for restart in 0..params.restarts {
        /////////////////////////////////////////////
        // phase 1: pick k spread-out centroids    //
        /////////////////////////////////////////////
        let centroids = kmeans_plus_plus(&points, k, &mut rng)?;
        debug!("Pair ({}, {}), run {}: seeded centroids {:?}", i, j, restart, centroids.as_slice());

        /////////////////////////////////////////////
        // phase 2: Lloyd's iteration              //
        /////////////////////////////////////////////
        let clustering = lloyd(&points, centroids, params.max_iterations, &mut rng)?;

        /////////////////////////////////////////////
        // phase 3: match clusters to labels       //
        /////////////////////////////////////////////
        let evaluation = evaluate(&clustering.assignment, labels)?;
        debug!(
            "Pair ({}, {}), run {}: {} iterations; accuracy = {:.4}, precision = {:.4}, \
             recall = {:.4}, f1 = {:.4}",
            i,
            j,
            restart,
            clustering.iterations,
            evaluation.accuracy,
            evaluation.precision,
            evaluation.recall,
            evaluation.f1
        );

        let improves = match &best {
            None => true,
            Some((_, current)) => evaluation.f1 > current.f1,
        };
        if improves {
            best = Some((clustering, evaluation));
        }
    }

    let (clustering, evaluation) = best
        .ok_or_else(|| EngineError::InvalidParameter("restarts must be at least 1".to_string()))?;
    Ok(MatchResult {
        feature_indices: [i, j],
        feature_names: [format!("Feature {}", i + 1), format!("Feature {}", j + 1)],
        clustering,
        evaluation,
    })
}

/// Every pair draws from its own stream, so results do not depend on the scheduling of the pairs.
fn pair_rng(seed: Option<u64>, pair_index: usize) -> ChaCha8Rng {
    match seed {
        Some(seed) => {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            rng.set_stream(pair_index as u64);
            rng
        }
        None => ChaCha8Rng::from_entropy(),
    }
}

/// Analyzes a parsed [Dataset] and joins the best pair's predictions with the input rows.
/// The running time of the analysis is stored in the report.
pub fn analyze_dataset(
    dataset: &Dataset,
    optional: Option<OptionalParameters>,
) -> Result<AnalysisReport> {
    let start = std::time::Instant::now();
    let ranking = analyze(dataset.features(), dataset.labels(), optional)?;
    let running_time: DurationInSec = start.elapsed().as_secs_f64();
    info!("Analysis of {} feature pairs took {:.3} s.", ranking.len(), running_time);
    AnalysisReport::new(dataset, ranking, running_time)
}


#[cfg(test)]
mod tests {
    use super::*;

    fn four_points() -> (Vec<Vec<Value>>, Vec<&'static str>) {
        (
            vec!(vec!(0.0, 0.0), vec!(0.0, 1.0), vec!(10.0, 10.0), vec!(10.0, 11.0)),
            vec!("A", "A", "B", "B"),
        )
    }

    #[test]
    fn pair_rng_streams_differ() {
        use rand::Rng;
        let a: u64 = pair_rng(Some(1), 0).gen();
        let b: u64 = pair_rng(Some(1), 1).gen();
        let c: u64 = pair_rng(Some(1), 0).gen();
        assert_ne!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn restarts_keep_a_perfect_run() {
        let (features, labels) = four_points();
        let optional =
            OptionalParameters { restarts: Some(5), seed: Some(3), ..Default::default() };
        let ranking = analyze(&features, &labels, Some(optional)).unwrap();
        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking.best().unwrap().evaluation.f1, 1.0);
    }

    #[test]
    fn feature_names_are_one_based() {
        let (features, labels) = four_points();
        let optional =
            OptionalParameters { seed: Some(0), thread_count: Some(1), ..Default::default() };
        let ranking = analyze(&features, &labels, Some(optional)).unwrap();
        let best = ranking.best().unwrap();
        assert_eq!(best.feature_indices, [0, 1]);
        assert_eq!(best.feature_names, ["Feature 1".to_string(), "Feature 2".to_string()]);
    }

    #[test]
    fn zero_restarts_are_rejected() {
        let (features, labels) = four_points();
        let optional = OptionalParameters { restarts: Some(0), ..Default::default() };
        let result = analyze(&features, &labels, Some(optional));
        assert!(matches!(result, Err(EngineError::InvalidParameter(_))));
    }

    #[test]
    fn match_result_serializes_flat() {
        let (features, labels) = four_points();
        let optional = OptionalParameters { seed: Some(5), ..Default::default() };
        let ranking = analyze(&features, &labels, Some(optional)).unwrap();
        let json = serde_json::to_value(&ranking).unwrap();
        let entry = &json[0];
        let keys = [
            "feature_indices",
            "feature_names",
            "centroids",
            "assignment",
            "iterations",
            "accuracy",
            "precision",
            "recall",
            "f1",
            "predictions",
            "mapping",
            "per_class",
        ];
        for key in keys {
            assert!(entry.get(key).is_some(), "missing key {}", key);
        }
    }
}
