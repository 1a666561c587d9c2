use crate::clustering::{group_by_cluster, Centroids, Clustering};
use crate::error::{EngineError, Result};
use crate::space::{nearest_centroid, PointSet};
use crate::types::{ClusterIdx, IterationCount};
use crate::utilities::mean_of;

use rand::Rng;
use tracing::trace;

/// Runs Lloyd's iteration on points, starting from the given centroids.
///
/// Each iteration assigns every point to its nearest centroid, groups the points by cluster and
/// recomputes every centroid as the mean of its members. A cluster without members gets a
/// uniformly random point of the set as its new centroid, so there are always k live centroids.
///
/// The loop stops as soon as the recomputed centroids equal the previous ones exactly and no
/// cluster had to be healed in that iteration, or after max_iterations iterations. The returned
/// clustering holds the last assignment, the centroids that produced it and the number of
/// iterations executed.
///
/// # Errors
///
/// Returns InvalidParameter if max_iterations is 0, or if there are no initial centroids for a
/// non-empty point set.
pub fn lloyd<R: Rng + ?Sized>(
    points: &PointSet,
    initial_centroids: Centroids,
    max_iterations: IterationCount,
    rng: &mut R,
) -> Result<Clustering> {
    if max_iterations == 0 {
        return Err(EngineError::InvalidParameter("max_iterations must be at least 1".to_string()));
    }
    let k = initial_centroids.m();
    if k == 0 && !points.is_empty() {
        return Err(EngineError::InvalidParameter(
            "cannot partition points into 0 clusters".to_string(),
        ));
    }

    let mut centroids = initial_centroids;
    let mut assignment: Vec<ClusterIdx> = vec!(0; points.n());

    for iteration in 1..=max_iterations {
        // step 1: assignment
        for (x, p) in points.point_iter().enumerate() {
            assignment[x] = nearest_centroid(p, centroids.as_slice());
        }

        // step 2 and 3: group and average; step 4: heal empty clusters
        let clusters = group_by_cluster(&assignment, k);
        let mut new_centroids = Centroids::with_capacity(k);
        let mut healed = false;
        for (c, members) in clusters.iter().enumerate() {
            if members.is_empty() {
                healed = true;
                let replacement = rng.gen_range(0..points.n());
                trace!(cluster = c, replacement, "empty cluster re-seeded");
                new_centroids.push(points.get(replacement).to_vec());
            } else {
                new_centroids.push(mean_of(points, members));
            }
        }

        // step 5: exact convergence or iteration cap
        // a healed centroid may coincide with the old one, so that is no fixed point
        if (!healed && new_centroids == centroids) || iteration == max_iterations {
            return Ok(Clustering { centroids, assignment, iterations: iteration });
        }
        centroids = new_centroids;
    }
    unreachable!("the loop returns in its last iteration")
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::seeding::kmeans_plus_plus;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn two_groups() -> PointSet {
        let positions = vec!(vec!(0.0, 0.0), vec!(0.0, 1.0), vec!(10.0, 10.0), vec!(10.0, 11.0));
        PointSet::by_points(positions).unwrap()
    }

    #[test]
    fn separates_two_groups() {
        let points = two_groups();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let centroids = Centroids::from(vec!(vec!(0.0, 0.0), vec!(10.0, 10.0)));
        let clustering = lloyd(&points, centroids, 100, &mut rng).unwrap();
        assert_eq!(clustering.assignment, vec!(0, 0, 1, 1));
        assert_eq!(clustering.centroids.as_slice(), &[vec!(0.0, 0.5), vec!(10.0, 10.5)]);
        // one iteration to move, one to confirm
        assert_eq!(clustering.iterations, 2);
    }

    #[test]
    fn stops_at_iteration_cap() {
        let points = two_groups();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let centroids = Centroids::from(vec!(vec!(0.0, 0.0), vec!(10.0, 10.0)));
        let clustering = lloyd(&points, centroids.clone(), 1, &mut rng).unwrap();
        assert_eq!(clustering.iterations, 1);
        // centroids returned are the ones that produced the assignment
        assert_eq!(clustering.centroids, centroids);
        assert_eq!(clustering.assignment, vec!(0, 0, 1, 1));
    }

    #[test]
    fn empty_cluster_is_healed() {
        let points = two_groups();
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        // centroid 1 is far away from everything and loses all points in the first iteration
        let centroids = Centroids::from(vec!(vec!(5.0, 5.0), vec!(1000.0, 1000.0)));
        let clustering = lloyd(&points, centroids, 100, &mut rng).unwrap();
        assert_eq!(clustering.get_centroids().m(), 2);
        assert!(clustering.get_cluster_sizes().iter().all(|&s| s > 0));
        assert!(clustering.iterations >= 2);
    }

    #[test]
    fn duplicate_centroids_do_not_converge_with_an_empty_cluster() {
        // both centroids sit on point 0; cluster 1 loses every tie and is empty after step 1
        let positions = vec!(vec!(0.0, 0.0), vec!(0.0, 1.0), vec!(0.0, 2.0));
        let points = PointSet::by_points(positions).unwrap();
        for seed in 0..20 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let centroids = Centroids::from(vec!(vec!(0.0, 0.0), vec!(0.0, 0.0)));
            let clustering = lloyd(&points, centroids, 100, &mut rng).unwrap();
            assert!(clustering.iterations < 100);
            assert!(clustering.get_cluster_sizes().iter().all(|&s| s > 0));
        }
    }

    #[test]
    fn identical_points_run_to_the_cap() {
        let points = PointSet::by_points(vec!(vec!(3.0, 3.0); 4)).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let centroids = Centroids::from(vec!(vec!(3.0, 3.0), vec!(3.0, 3.0)));
        let clustering = lloyd(&points, centroids, 7, &mut rng).unwrap();
        assert_eq!(clustering.iterations, 7);
        assert_eq!(clustering.assignment, vec!(0, 0, 0, 0));
    }

    #[test]
    fn assignment_is_in_range_and_aligned() {
        let positions: Vec<Vec<f64>> =
            (0..30).map(|i| vec!((i % 7) as f64, (i * i % 11) as f64)).collect();
        let points = PointSet::by_points(positions).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let centroids = kmeans_plus_plus(&points, 4, &mut rng).unwrap();
        let clustering = lloyd(&points, centroids, 50, &mut rng).unwrap();
        assert_eq!(clustering.assignment.len(), 30);
        assert!(clustering.assignment.iter().all(|&c| c < 4));
        assert!(clustering.iterations >= 1 && clustering.iterations <= 50);
    }

    #[test]
    fn zero_iterations_are_rejected() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let centroids = Centroids::from(vec!(vec!(0.0, 0.0)));
        let result = lloyd(&two_groups(), centroids, 0, &mut rng);
        assert!(matches!(result, Err(EngineError::InvalidParameter(_))));
    }
}
