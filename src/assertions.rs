use crate::evaluation::MAX_LABELS_FOR_MATCHING;
use crate::error::{EngineError, Result};
use crate::types::{PointCount, Value};
use crate::OptionalParameters;

use std::collections::BTreeSet;

/// Checks the optional parameters of a run.
///
/// # Errors
/// Returns InvalidParameter if one of the following is violated:
/// * max_iterations must be at least 1;
/// * restarts must be at least 1;
/// * thread_count must be at least 1.
pub(crate) fn assert_parameters(optional: &OptionalParameters) -> Result<()> {
    if optional.max_iterations == Some(0) {
        return Err(EngineError::InvalidParameter("max_iterations must be at least 1".to_string()));
    }
    if optional.restarts == Some(0) {
        return Err(EngineError::InvalidParameter("restarts must be at least 1".to_string()));
    }
    if optional.thread_count == Some(0) {
        return Err(EngineError::InvalidParameter("thread_count must be at least 1".to_string()));
    }
    Ok(())
}

/// Checks that the feature matrix and the labels can be analyzed and returns k, the number of
/// distinct labels.
///
/// # Errors
/// * EmptyDataset if there is no row;
/// * DimensionMismatch if the number of labels differs from the number of rows, or a row has a
/// different width than the first one;
/// * TooFewFeatures if the rows have less than two columns;
/// * DegenerateK if there are less than two distinct labels;
/// * TooManyLabels if there are more distinct labels than the label matching handles;
/// * ValueOutOfRange if a feature exceeds magnitude_limit.
pub(crate) fn assert_input<L: Ord>(features: &[Vec<Value>], labels: &[L]) -> Result<PointCount> {
    let first = features.first().ok_or(EngineError::EmptyDataset)?;
    if labels.len() != features.len() {
        return Err(EngineError::DimensionMismatch { expected: features.len(), got: labels.len() });
    }
    let width = first.len();
    if let Some(row) = features.iter().find(|row| row.len() != width) {
        return Err(EngineError::DimensionMismatch { expected: width, got: row.len() });
    }
    if width < 2 {
        return Err(EngineError::TooFewFeatures { got: width });
    }
    let limit = magnitude_limit(features.len());
    for (i, row) in features.iter().enumerate() {
        if let Some(&value) = row.iter().find(|v| !(v.abs() <= limit)) {
            return Err(EngineError::ValueOutOfRange { row: i + 1, value, limit });
        }
    }

    let k = labels.iter().collect::<BTreeSet<&L>>().len();
    if k < 2 {
        return Err(EngineError::DegenerateK { labels: k });
    }
    if k > MAX_LABELS_FOR_MATCHING {
        return Err(EngineError::TooManyLabels { labels: k, limit: MAX_LABELS_FOR_MATCHING });
    }
    Ok(k)
}

/// Largest feature magnitude for n points such that the squared distances of a 2d projection,
/// summed over all points, stay finite: each one is at most 2 * (2 * limit)^2.
pub(crate) fn magnitude_limit(n: PointCount) -> Value {
    (Value::MAX / (8.0 * n.max(1) as Value)).sqrt()
}
