use crate::clustering::Centroids;
use crate::error::{EngineError, Result};
use crate::space::{squared_distance, squared_distance_to_set, PointSet};
use crate::types::{PointCount, PointIdx, Value};

use rand::Rng;

/// Picks k initial centroids by the k-means++ rule.
///
/// The first centroid is a uniformly random point. Every further centroid is a point drawn with
/// probability proportional to its squared distance to the closest centroid chosen so far. If all
/// remaining weight is zero (every point coincides with a centroid) the draw falls back to a
/// uniformly random point.
///
/// Every returned centroid is a copy of a point of the set.
///
/// # Errors
///
/// Returns InvalidParameter if k is larger than the number of points.
pub fn kmeans_plus_plus<R: Rng + ?Sized>(
    points: &PointSet,
    k: PointCount,
    rng: &mut R,
) -> Result<Centroids> {
    if k > points.n() {
        return Err(EngineError::InvalidParameter(format!(
            "cannot seed k = {} centroids from {} points",
            k,
            points.n()
        )));
    }

    let mut centroids = Centroids::with_capacity(k);
    if k == 0 {
        return Ok(centroids);
    }

    let first = rng.gen_range(0..points.n());
    centroids.push(points.get(first).to_vec());

    // current squared distance of each point to the set of already chosen centroids
    let mut dist_x_center: Vec<Value> = points
        .point_iter()
        .map(|p| squared_distance_to_set(p, centroids.as_slice()))
        .collect();

    for i in 1..k {
        let chosen = weighted_draw(&dist_x_center, rng);
        centroids.push(points.get(chosen).to_vec());

        // as the distance to centroids 0..i-1 is known, we only need to measure the newest one.
        for (j, p) in points.point_iter().enumerate() {
            let dist_to_newest = squared_distance(p, centroids.get(i));
            if dist_to_newest < dist_x_center[j] {
                dist_x_center[j] = dist_to_newest;
            }
        }
    }
    Ok(centroids)
}

/// Draws an index with probability proportional to its weight (cumulative sum against a uniform
/// draw in [0, total)). Uniform over all indices if the total weight is zero or undefined.
/// If the weights overflow to infinity, the draw is uniform over the infinite ones.
fn weighted_draw<R: Rng + ?Sized>(weights: &[Value], rng: &mut R) -> PointIdx {
    let total: Value = weights.iter().sum();
    if total == Value::INFINITY {
        let infinite: Vec<PointIdx> =
            (0..weights.len()).filter(|&i| weights[i] == Value::INFINITY).collect();
        if !infinite.is_empty() {
            return infinite[rng.gen_range(0..infinite.len())];
        }
        // finite weights whose sum overflowed
        return rng.gen_range(0..weights.len());
    }
    if !(total > 0.0) {
        return rng.gen_range(0..weights.len());
    }

    let threshold = rng.gen_range(0.0..total);
    let mut cumulative = 0.0;
    let mut last_positive = 0;
    for (i, &w) in weights.iter().enumerate() {
        if w > 0.0 {
            last_positive = i;
        }
        cumulative += w;
        if cumulative > threshold {
            return i;
        }
    }
    // rounding can leave the threshold just above the accumulated sum
    last_positive
}
