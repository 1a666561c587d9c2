/// Type of a single coordinate (feature value).
pub type Value = f64;
/// Type of the number of points (samples).
pub type PointCount = usize;
/// Type of the number of Lloyd iterations.
pub type IterationCount = usize;
/// Index of a feature column in the input matrix.
pub type FeatureIdx = usize;
/// Running time in seconds.
pub type DurationInSec = f64;

pub(crate) type PointIdx = usize;
pub(crate) type ClusterIdx = usize;
