///////////////////////////////////////////////////////////////
///////////////////// module: space ///////////////////////////
///////////////////////////////////////////////////////////////

/// Module space maintains the point sets the engine clusters and the geometry on them.
///
/// - Squared distances can be obtained by squared_distance(a: &[Value], b: &[Value]) -> Value
/// - The closest centroid of a point can be obtained by
///   nearest_centroid(p, centroids) -> ClusterIdx
/// - A 2d point set for a feature pair is created by PointSet::by_projection
///
/// The distance functions are dimension-generic; the engine itself only ever clusters
/// 2d projections.

use crate::types::{ClusterIdx, FeatureIdx, PointCount, PointIdx, Value};
use crate::error::{EngineError, Result};

/// A point is a list of coordinates of the dimension of its [PointSet].
pub type Point = Vec<Value>;

/// Returns the squared euclidean distance between a and b.
/// No square root is taken, as the engine only compares distances.
///
/// # Example
/// ```rust
/// use feature_pair_kmeans::space::squared_distance;
/// assert_eq!(squared_distance(&[0.0, 0.0], &[3.0, 4.0]), 25.0);
/// ```
pub fn squared_distance(a: &[Value], b: &[Value]) -> Value {
    debug_assert_eq!(a.len(), b.len(), "points of different dimension");
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Returns the index of the centroid closest to p. Ties are broken by the first minimizer.
///
/// # Panics
///
/// Panics if centroids is empty.
pub fn nearest_centroid<C: AsRef<[Value]>>(p: &[Value], centroids: &[C]) -> ClusterIdx {
    assert!(!centroids.is_empty(), "nearest_centroid needs at least one centroid");
    let mut nearest = 0;
    let mut current_distance = Value::INFINITY;
    for (c, centroid) in centroids.iter().enumerate() {
        let d = squared_distance(p, centroid.as_ref());
        if d < current_distance {
            current_distance = d;
            nearest = c;
        }
    }
    nearest
}

/// Returns the squared distance between p and the closest point of a set of centroids.
pub fn squared_distance_to_set<C: AsRef<[Value]>>(p: &[Value], centroids: &[C]) -> Value {
    centroids
        .iter()
        .map(|c| squared_distance(p, c.as_ref()))
        .fold(Value::INFINITY, Value::min)
}


/////////////////////////// PointSet ///////////////////////////

/// An ordered, read-only set of points of equal dimension.
/// The index of a point is the identity of the sample it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct PointSet {
    positions: Vec<Point>,
    dim: usize,
}

impl PointSet {
    /// Creates a new [PointSet] from a vector of positions.
    ///
    /// # Errors
    ///
    /// Returns DimensionMismatch if the positions do not all have the same dimension.
    ///
    /// # Example
    /// ```rust
    /// use feature_pair_kmeans::space::PointSet;
    /// let positions = vec!(vec!(0.0, 0.0), vec!(1.5, 1.1), vec!(1.0, 0.5));
    /// let points = PointSet::by_points(positions).unwrap();
    /// assert_eq!(points.n(), 3);
    /// assert_eq!(points.dim(), 2);
    /// assert_eq!(points.get(1), &[1.5, 1.1]);
    /// ```
    pub fn by_points(positions: Vec<Point>) -> Result<PointSet> {
        let dim = positions.first().map_or(0, |p| p.len());
        if let Some(p) = positions.iter().find(|p| p.len() != dim) {
            return Err(EngineError::DimensionMismatch { expected: dim, got: p.len() });
        }
        Ok(PointSet { positions, dim })
    }

    /// Projects every row of a feature matrix onto the columns (x_feature, y_feature).
    /// The i-th point of the result is the i-th row of the matrix.
    ///
    /// # Panics
    ///
    /// Panics if one of the feature indices is out of bounds for a row.
    pub fn by_projection(
        matrix: &[Vec<Value>],
        x_feature: FeatureIdx,
        y_feature: FeatureIdx,
    ) -> PointSet {
        PointSet {
            positions: matrix.iter().map(|row| vec!(row[x_feature], row[y_feature])).collect(),
            dim: 2,
        }
    }

    /// Return the number of points.
    pub fn n(&self) -> PointCount {
        self.positions.len()
    }

    /// Return the dimension of the points.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Return the position of the point with index idx.
    pub fn get(&self, idx: PointIdx) -> &[Value] {
        &self.positions[idx]
    }

    /// Provides an iterator over all positions in index order.
    pub fn point_iter(&self) -> std::slice::Iter<Point> {
        self.positions.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
