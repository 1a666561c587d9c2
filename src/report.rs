use crate::dataset::Dataset;
use crate::error::{EngineError, Result};
use crate::types::{DurationInSec, FeatureIdx, PointCount, Value};
use crate::{MatchResult, Ranking};

use serde::Serialize;

/// One input row joined with the prediction of the best feature pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub features: Vec<Value>,
    pub class: String,
    /// translated cluster of the best pair; None if the cluster has no label
    pub prediction: Option<String>,
}

/// Everything a caller needs to answer an analysis request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub total_samples: PointCount,
    pub number_of_classes: usize,
    pub classes: Vec<String>,
    pub ranking: Ranking<String>,
    pub best_pair: [FeatureIdx; 2],
    pub table_data: Vec<TableRow>,
    pub running_time: DurationInSec,
}

impl AnalysisReport {
    /// Builds the report from a dataset and the ranking computed on it.
    ///
    /// # Errors
    /// TooFewFeatures if the ranking is empty; DimensionMismatch if the best result does not have
    /// one prediction per row.
    pub fn new(
        dataset: &Dataset,
        ranking: Ranking<String>,
        running_time: DurationInSec,
    ) -> Result<AnalysisReport> {
        let best = ranking
            .best()
            .ok_or(EngineError::TooFewFeatures { got: dataset.number_of_features() })?;
        if best.evaluation.predictions.len() != dataset.n() {
            return Err(EngineError::DimensionMismatch {
                expected: dataset.n(),
                got: best.evaluation.predictions.len(),
            });
        }

        let table_data = dataset
            .features()
            .iter()
            .zip(dataset.labels().iter())
            .zip(best.evaluation.predictions.iter())
            .map(|((features, class), prediction)| TableRow {
                features: features.clone(),
                class: class.clone(),
                prediction: prediction.clone(),
            })
            .collect();
        let best_pair = best.feature_indices;
        let classes = dataset.classes();

        Ok(AnalysisReport {
            total_samples: dataset.n(),
            number_of_classes: classes.len(),
            classes,
            best_pair,
            table_data,
            ranking,
            running_time,
        })
    }

    /// Returns the best-ranked result.
    pub fn best(&self) -> Option<&MatchResult<String>> {
        self.ranking.best()
    }
}


#[cfg(test)]
mod tests {
    use crate::{analyze_dataset, Dataset, OptionalParameters};

    #[test]
    fn table_joins_rows_with_best_predictions() {
        let dataset = Dataset::from_text("0,0,A\n0,1,A\n10,10,B\n10,11,B\n").unwrap();
        let optional = OptionalParameters { seed: Some(9), ..Default::default() };
        let report = analyze_dataset(&dataset, Some(optional)).unwrap();
        assert_eq!(report.total_samples, 4);
        assert_eq!(report.number_of_classes, 2);
        assert_eq!(report.best_pair, [0, 1]);
        assert_eq!(report.table_data.len(), 4);
        for row in report.table_data.iter() {
            assert_eq!(row.prediction.as_ref(), Some(&row.class));
        }
        assert_eq!(report.best().unwrap().evaluation.accuracy, 1.0);
    }

    #[test]
    fn report_serializes_to_json() {
        let dataset = Dataset::from_text("1,2,3,x\n1,2,4,y\n5,6,7,x\n").unwrap();
        let optional = OptionalParameters { seed: Some(1), ..Default::default() };
        let report = analyze_dataset(&dataset, Some(optional)).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["total_samples"], 3);
        assert_eq!(json["ranking"].as_array().unwrap().len(), 3);
        assert_eq!(json["table_data"][0]["class"], "x");
        assert!(json["running_time"].as_f64().unwrap() >= 0.0);
    }
}
