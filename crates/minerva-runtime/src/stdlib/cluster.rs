//! Clustering algorithms
//!
//! K-means with deterministic initialization (evenly-spaced samples, no
//! RNG), DBSCAN with the usual -1 noise label, and agglomerative
//! hierarchical clustering with three linkage criteria. Inertia and
//! silhouette score back the `evaluate` command for unlabeled data.

use crate::value::{Model, RuntimeError};

pub fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

fn check_data(data: &[Vec<f64>]) -> Result<(), RuntimeError> {
    if data.is_empty() || data[0].is_empty() {
        return Err(RuntimeError::DimensionMismatch(
            "clustering needs at least one sample".to_string(),
        ));
    }
    let width = data[0].len();
    if data.iter().any(|row| row.len() != width) {
        return Err(RuntimeError::DimensionMismatch(
            "samples have unequal feature counts".to_string(),
        ));
    }
    Ok(())
}

fn mean_point(data: &[Vec<f64>], members: &[usize]) -> Vec<f64> {
    let width = data[0].len();
    let mut center = vec![0.0; width];
    for &i in members {
        for (c, v) in center.iter_mut().zip(&data[i]) {
            *c += v;
        }
    }
    for c in &mut center {
        *c /= members.len() as f64;
    }
    center
}

// ============================================================================
// K-means
// ============================================================================

const KMEANS_TOLERANCE: f64 = 0.0001;

/// Lloyd's algorithm. Initial centroids are evenly spaced over the samples
/// so identical inputs always produce identical clusterings. Returns the
/// model, the number of iterations run and whether the centroids converged
/// within tolerance before the iteration cap.
pub fn kmeans(
    data: &[Vec<f64>],
    k: usize,
    max_iter: usize,
) -> Result<(Model, usize, bool), RuntimeError> {
    check_data(data)?;
    let n = data.len();
    if k == 0 || k > n {
        return Err(RuntimeError::DimensionMismatch(format!(
            "cannot split {n} samples into {k} clusters"
        )));
    }

    let mut centroids: Vec<Vec<f64>> = (0..k).map(|i| data[i * n / k].clone()).collect();
    let mut assignments = vec![0i64; n];
    let mut iterations = 0;
    let mut converged = false;

    while iterations < max_iter {
        iterations += 1;

        for (i, sample) in data.iter().enumerate() {
            let mut best = 0;
            let mut best_distance = euclidean(sample, &centroids[0]);
            for (c, centroid) in centroids.iter().enumerate().skip(1) {
                let distance = euclidean(sample, centroid);
                if distance < best_distance {
                    best = c;
                    best_distance = distance;
                }
            }
            assignments[i] = best as i64;
        }

        let mut shift = 0.0;
        for (c, centroid) in centroids.iter_mut().enumerate() {
            let members: Vec<usize> = (0..n).filter(|&i| assignments[i] == c as i64).collect();
            // An emptied cluster keeps its centroid.
            if members.is_empty() {
                continue;
            }
            let updated = mean_point(data, &members);
            shift += euclidean(centroid, &updated);
            *centroid = updated;
        }

        if shift < KMEANS_TOLERANCE {
            converged = true;
            break;
        }
    }

    let model = Model::KMeans {
        centroids,
        assignments,
        k,
    };
    Ok((model, iterations, converged))
}

/// Assigns each sample to its nearest centroid.
pub fn kmeans_predict(centroids: &[Vec<f64>], data: &[Vec<f64>]) -> Vec<i64> {
    data.iter()
        .map(|sample| {
            let mut best = 0;
            let mut best_distance = euclidean(sample, &centroids[0]);
            for (c, centroid) in centroids.iter().enumerate().skip(1) {
                let distance = euclidean(sample, centroid);
                if distance < best_distance {
                    best = c;
                    best_distance = distance;
                }
            }
            best as i64
        })
        .collect()
}

/// Sum of squared distances from each sample to its assigned centroid.
pub fn inertia(data: &[Vec<f64>], centroids: &[Vec<f64>], assignments: &[i64]) -> f64 {
    data.iter()
        .zip(assignments)
        .map(|(sample, &c)| {
            let d = euclidean(sample, &centroids[c as usize]);
            d * d
        })
        .sum()
}

// ============================================================================
// DBSCAN
// ============================================================================

const UNVISITED: i64 = -2;
pub const NOISE: i64 = -1;

fn region_query(data: &[Vec<f64>], point: usize, eps: f64) -> Vec<usize> {
    (0..data.len())
        .filter(|&other| euclidean(&data[point], &data[other]) <= eps)
        .collect()
}

/// Density-based clustering. Returns the label per sample (`-1` = noise)
/// and the number of clusters found.
pub fn dbscan(
    data: &[Vec<f64>],
    eps: f64,
    min_points: usize,
) -> Result<(Vec<i64>, usize), RuntimeError> {
    check_data(data)?;
    if eps <= 0.0 {
        return Err(RuntimeError::DimensionMismatch(
            "eps must be positive".to_string(),
        ));
    }

    let n = data.len();
    let mut labels = vec![UNVISITED; n];
    let mut cluster = 0i64;

    for point in 0..n {
        if labels[point] != UNVISITED {
            continue;
        }
        let neighbors = region_query(data, point, eps);
        if neighbors.len() < min_points {
            labels[point] = NOISE;
            continue;
        }

        labels[point] = cluster;
        let mut queue = neighbors;
        let mut head = 0;
        while head < queue.len() {
            let current = queue[head];
            head += 1;
            if labels[current] == NOISE {
                // Border point: reachable but not a core point.
                labels[current] = cluster;
            }
            if labels[current] != UNVISITED {
                continue;
            }
            labels[current] = cluster;
            let current_neighbors = region_query(data, current, eps);
            if current_neighbors.len() >= min_points {
                queue.extend(current_neighbors);
            }
        }
        cluster += 1;
    }

    Ok((labels, cluster as usize))
}

// ============================================================================
// Hierarchical (agglomerative)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Linkage {
    Single,
    Complete,
    Average,
}

impl Linkage {
    pub fn from_name(name: &str) -> Option<Linkage> {
        Some(match name {
            "single" => Linkage::Single,
            "complete" => Linkage::Complete,
            "average" => Linkage::Average,
            _ => return None,
        })
    }
}

fn cluster_distance(data: &[Vec<f64>], a: &[usize], b: &[usize], linkage: Linkage) -> f64 {
    let mut min = f64::INFINITY;
    let mut max = 0.0f64;
    let mut sum = 0.0;
    for &i in a {
        for &j in b {
            let d = euclidean(&data[i], &data[j]);
            min = min.min(d);
            max = max.max(d);
            sum += d;
        }
    }
    match linkage {
        Linkage::Single => min,
        Linkage::Complete => max,
        Linkage::Average => sum / (a.len() * b.len()) as f64,
    }
}

/// Bottom-up merging: every sample starts as its own cluster, the closest
/// pair (per linkage) merges, until `clusters` remain.
pub fn hierarchical(
    data: &[Vec<f64>],
    clusters: usize,
    linkage: Linkage,
) -> Result<Vec<i64>, RuntimeError> {
    check_data(data)?;
    let n = data.len();
    if clusters == 0 || clusters > n {
        return Err(RuntimeError::DimensionMismatch(format!(
            "cannot split {n} samples into {clusters} clusters"
        )));
    }

    let mut groups: Vec<Vec<usize>> = (0..n).map(|i| vec![i]).collect();
    while groups.len() > clusters {
        let mut best = (0, 1);
        let mut best_distance = f64::INFINITY;
        for a in 0..groups.len() {
            for b in a + 1..groups.len() {
                let d = cluster_distance(data, &groups[a], &groups[b], linkage);
                if d < best_distance {
                    best_distance = d;
                    best = (a, b);
                }
            }
        }
        let merged = groups.remove(best.1);
        groups[best.0].extend(merged);
    }

    let mut labels = vec![0i64; n];
    for (c, group) in groups.iter().enumerate() {
        for &i in group {
            labels[i] = c as i64;
        }
    }
    Ok(labels)
}

// ============================================================================
// Cluster quality
// ============================================================================

/// Mean silhouette coefficient over all samples. Noise labels (`-1`) are
/// skipped; degenerate clusterings (fewer than two clusters, or singleton
/// samples only) score 0.
pub fn silhouette(data: &[Vec<f64>], labels: &[i64]) -> Result<f64, RuntimeError> {
    check_data(data)?;
    if labels.len() != data.len() {
        return Err(RuntimeError::DimensionMismatch(format!(
            "{} samples but {} labels",
            data.len(),
            labels.len()
        )));
    }

    let mut clusters: Vec<i64> = labels.iter().copied().filter(|&l| l >= 0).collect();
    clusters.sort_unstable();
    clusters.dedup();
    if clusters.len() < 2 {
        return Ok(0.0);
    }

    let mut total = 0.0;
    let mut counted = 0;
    for (i, sample) in data.iter().enumerate() {
        if labels[i] < 0 {
            continue;
        }
        let own: Vec<usize> = (0..data.len())
            .filter(|&j| j != i && labels[j] == labels[i])
            .collect();
        if own.is_empty() {
            continue;
        }
        let a = own
            .iter()
            .map(|&j| euclidean(sample, &data[j]))
            .sum::<f64>()
            / own.len() as f64;

        let mut b = f64::INFINITY;
        for &other in &clusters {
            if other == labels[i] {
                continue;
            }
            let members: Vec<usize> = (0..data.len()).filter(|&j| labels[j] == other).collect();
            let mean = members
                .iter()
                .map(|&j| euclidean(sample, &data[j]))
                .sum::<f64>()
                / members.len() as f64;
            b = b.min(mean);
        }

        total += (b - a) / a.max(b);
        counted += 1;
    }

    if counted == 0 {
        Ok(0.0)
    } else {
        Ok(total / counted as f64)
    }
}
