//////////////////////////////////////////////////////////////
//////////////////// module: clustering //////////////////////
//////////////////////////////////////////////////////////////

/// Contains two structs (both are only meaningful together with the point set they were
/// computed on)
///
/// centroids: a list of centroid positions
/// clustering: centroids, the assignment of points to centroids and the number of iterations used
///
use crate::error::Result;
use crate::space::Point;
use crate::types::{ClusterIdx, IterationCount, PointCount, PointIdx, Value};

use serde::Serialize;
use std::fs::File;
use std::io::prelude::*;

/// A list of centroids. Each centroid is an owned position, so moving it never touches the point
/// set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Centroids {
    centroids: Vec<Point>,
}

impl Centroids {
    /// Creates a new empty list of centroids. The capacity is used to allocate enough storage on
    /// the heap.
    pub fn with_capacity(capacity: PointCount) -> Centroids {
        Centroids { centroids: Vec::with_capacity(capacity) }
    }

    /// Returns the number of centroids m.
    pub fn m(&self) -> PointCount {
        self.centroids.len()
    }

    /// Return the centroid of index i (from 0 to m-1)
    pub fn get(&self, i: ClusterIdx) -> &[Value] {
        &self.centroids[i]
    }

    /// Adds a new centroid to the list.
    pub fn push(&mut self, c: Point) {
        self.centroids.push(c);
    }

    /// Provides an iterator of the centroids.
    pub fn iter(&self) -> std::slice::Iter<Point> {
        self.centroids.iter()
    }

    pub fn as_slice(&self) -> &[Point] {
        &self.centroids
    }
}

impl From<Vec<Point>> for Centroids {
    fn from(centroids: Vec<Point>) -> Self {
        Centroids { centroids }
    }
}


/// A clustering of a point set into m clusters, as returned by Lloyd's iteration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Clustering {
    /// the centroids that produced the assignment
    pub centroids: Centroids,
    /// for each point the id (0..m) of the cluster it is assigned to
    pub assignment: Vec<ClusterIdx>,
    /// number of iterations executed (1-based)
    pub iterations: IterationCount,
}

impl Clustering {
    pub fn get_centroids(&self) -> &Centroids {
        &self.centroids
    }

    /// Returns the number of points in each cluster.
    pub fn get_cluster_sizes(&self) -> Vec<PointCount> {
        let mut sizes = vec!(0; self.centroids.m());
        for &c in self.assignment.iter() {
            sizes[c] += 1;
        }
        sizes
    }

    /// Groups the point indices by cluster id (ascending within each cluster).
    pub fn clusters(&self) -> Vec<Vec<PointIdx>> {
        group_by_cluster(&self.assignment, self.centroids.m())
    }

    /// Saves the clustering to the text-file specified by file_path.
    /// The output is as follows:
    /// For each cluster we have one line in the output file of the form
    /// cluster_id:point_1,point_2,...
    ///
    /// Example:
    /// ```txt
    /// 0:0,1,2,3,4
    /// 1:5,6,8
    /// 2:7,9
    /// ```
    pub fn save_to_file(&self, file_path: &str) -> Result<()> {
        let mut f = File::create(file_path)?;
        let mut text = String::new();
        for (c, members) in self.clusters().iter().enumerate() {
            let members: Vec<String> = members.iter().map(|p| p.to_string()).collect();
            text = text + &format!("{}:{}\n", c, members.join(","));
        }
        text.pop(); // delete last newline
        f.write_all(text.as_bytes())?;
        Ok(())
    }
}

/// Groups point indices by their cluster id; the result has exactly k entries, some possibly empty.
pub(crate) fn group_by_cluster(assignment: &[ClusterIdx], k: PointCount) -> Vec<Vec<PointIdx>> {
    let mut clusters: Vec<Vec<PointIdx>> = (0..k).map(|_| Vec::new()).collect();
    for (p, &c) in assignment.iter().enumerate() {
        clusters[c].push(p);
    }
    clusters
}
