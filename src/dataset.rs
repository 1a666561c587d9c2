//! Reading a labeled dataset from comma-delimited text.

use crate::error::{EngineError, Result};
use crate::types::{PointCount, Value};

use std::collections::BTreeSet;
use std::fs;
use tracing::{debug, info};

/// A feature matrix with one ground-truth label per row.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    features: Vec<Vec<Value>>,
    labels: Vec<String>,
}

impl Dataset {
    /// Parses comma-delimited text. Every non-blank line is one sample: all tokens but the last are
    /// numeric features, the last one is the label. Tokens are trimmed; blank lines are skipped.
    ///
    /// # Errors
    /// * MalformedInput if a row has less than 3 columns (two features and a label), a different
    /// number of columns than the first row, or a feature that is not a finite number;
    /// * EmptyDataset if there is no row at all.
    ///
    /// # Example
    /// ```rust
    /// use feature_pair_kmeans::Dataset;
    /// let dataset = Dataset::from_text("5.1,3.5,1.4,setosa\n7.0,3.2,4.7,versicolor\n").unwrap();
    /// assert_eq!(dataset.n(), 2);
    /// assert_eq!(dataset.number_of_features(), 3);
    /// assert_eq!(dataset.labels()[1], "versicolor");
    /// ```
    pub fn from_text(text: &str) -> Result<Dataset> {
        let mut features: Vec<Vec<Value>> = Vec::new();
        let mut labels: Vec<String> = Vec::new();
        let mut width: Option<usize> = None;

        for (line_number, line) in text.lines().enumerate() {
            let row = line_number + 1;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let tokens: Vec<&str> = line.split(',').map(|t| t.trim()).collect();
            if tokens.len() < 3 {
                return Err(EngineError::MalformedInput {
                    row,
                    reason: format!(
                        "found {} column(s), need at least two features and a label",
                        tokens.len()
                    ),
                });
            }
            match width {
                None => width = Some(tokens.len()),
                Some(w) if w != tokens.len() => {
                    return Err(EngineError::MalformedInput {
                        row,
                        reason: format!(
                            "found {} columns, but the first row has {}",
                            tokens.len(),
                            w
                        ),
                    });
                }
                _ => {}
            }

            let (label, values) = match tokens.split_last() {
                Some(split) => split,
                None => unreachable!("rows have at least 3 tokens"),
            };
            let values = values
                .iter()
                .map(|t| parse_feature(t, row))
                .collect::<Result<Vec<Value>>>()?;
            features.push(values);
            labels.push(label.to_string());
        }

        if features.is_empty() {
            return Err(EngineError::EmptyDataset);
        }
        let dataset = Dataset { features, labels };
        debug!("Parsed {} rows with {} features each.", dataset.n(), dataset.number_of_features());
        Ok(dataset)
    }

    /// Loads a dataset from a text-file, see [Dataset::from_text] for the format.
    ///
    /// Example:
    /// ```txt
    /// -8.19,-7.88,0.3,red
    /// -8.06,-6.58,0.1,red
    /// 7.3,6.9,0.2,blue
    /// ```
    pub fn by_file(file_path: &str) -> Result<Dataset> {
        let text = fs::read_to_string(file_path)?;
        let dataset = Dataset::from_text(&text)?;
        info!(
            "Successfully loaded {} samples with {} features from '{}'.",
            dataset.n(),
            dataset.number_of_features(),
            file_path
        );
        Ok(dataset)
    }

    /// Creates a dataset from already parsed parts.
    ///
    /// # Errors
    /// EmptyDataset if there are no rows; DimensionMismatch if the lengths differ.
    pub fn new(features: Vec<Vec<Value>>, labels: Vec<String>) -> Result<Dataset> {
        if features.is_empty() {
            return Err(EngineError::EmptyDataset);
        }
        if features.len() != labels.len() {
            return Err(EngineError::DimensionMismatch {
                expected: features.len(),
                got: labels.len(),
            });
        }
        Ok(Dataset { features, labels })
    }

    /// Return the number of samples.
    pub fn n(&self) -> PointCount {
        self.features.len()
    }

    /// Return the number of feature columns.
    pub fn number_of_features(&self) -> usize {
        self.features.first().map_or(0, |row| row.len())
    }

    pub fn features(&self) -> &[Vec<Value>] {
        &self.features
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// The distinct labels in ascending order.
    pub fn classes(&self) -> Vec<String> {
        self.labels.iter().cloned().collect::<BTreeSet<String>>().into_iter().collect()
    }
}

fn parse_feature(token: &str, row: usize) -> Result<Value> {
    match token.parse::<Value>() {
        Ok(v) if v.is_finite() => Ok(v),
        Ok(_) => Err(EngineError::MalformedInput {
            row,
            reason: format!("feature '{}' is not finite", token),
        }),
        Err(_) => Err(EngineError::MalformedInput {
            row,
            reason: format!("cannot parse '{}' as a number", token),
        }),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rows_and_skips_blank_lines() {
        let dataset = Dataset::from_text("0, 0, 1, A\n\n  0,1,2,A \r\n10,10,3,B\n").unwrap();
        assert_eq!(dataset.n(), 3);
        assert_eq!(dataset.features()[1], vec!(0.0, 1.0, 2.0));
        assert_eq!(dataset.labels(), &["A".to_string(), "A".to_string(), "B".to_string()]);
        assert_eq!(dataset.classes(), vec!("A".to_string(), "B".to_string()));
    }

    #[test]
    fn short_rows_are_rejected() {
        let result = Dataset::from_text("1,2,A\n3,B\n");
        assert!(matches!(result, Err(EngineError::MalformedInput { row: 2, .. })));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let result = Dataset::from_text("1,2,A\n3,4,5,B\n");
        assert!(matches!(result, Err(EngineError::MalformedInput { row: 2, .. })));
    }

    #[test]
    fn non_numeric_features_are_rejected() {
        let result = Dataset::from_text("1,2,A\n3,x,B\n");
        match result {
            Err(EngineError::MalformedInput { row, reason }) => {
                assert_eq!(row, 2);
                assert!(reason.contains("'x'"));
            }
            other => panic!("unexpected result {:?}", other),
        }
        assert!(matches!(
            Dataset::from_text("1,NaN,A\n"),
            Err(EngineError::MalformedInput { row: 1, .. })
        ));
    }

    #[test]
    fn empty_text_is_an_empty_dataset() {
        assert!(matches!(Dataset::from_text(""), Err(EngineError::EmptyDataset)));
        assert!(matches!(Dataset::from_text("\n  \n"), Err(EngineError::EmptyDataset)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let missing = Dataset::by_file("/nonexistent/feature_pair_kmeans.csv");
        assert!(matches!(missing, Err(EngineError::Io(_))));
    }
}
