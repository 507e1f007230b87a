//! K-Means package partitioning
//!
//! Constructions are clustered on their total quantity only. Weight is not a
//! clustering feature, so packages balance item counts rather than mass.

use linfa::prelude::*;
use linfa_clustering::KMeans;
use linfa_nn::distance::L2Dist;
use ndarray::{Array1, Array2};
use rand_xoshiro::rand_core::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use tracing::{debug, info, warn};

use crate::aggregate::{ordered_sum, ConstructionAggregate};
use crate::error::PackagingError;

pub const MIN_PACKAGES: usize = 2;
pub const MAX_PACKAGES: usize = 10;

/// Seed for centroid initialisation; fixed so that re-running the same input
/// yields the same packages
pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_MAX_ITERS: u64 = 300;
pub const DEFAULT_TOLERANCE: f64 = 1e-4;
pub const DEFAULT_N_RUNS: usize = 10;

/// Clustering parameters for one partitioning run
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionParams {
    /// Requested number of packages (K)
    pub n_packages: usize,
    /// Iteration cap per K-Means run
    pub max_iters: u64,
    /// Convergence tolerance on centroid movement
    pub tolerance: f64,
    /// Number of restarts; the run with the lowest inertia wins
    pub n_runs: usize,
    pub seed: u64,
}

impl PartitionParams {
    pub fn new(n_packages: usize) -> Self {
        Self {
            n_packages,
            max_iters: DEFAULT_MAX_ITERS,
            tolerance: DEFAULT_TOLERANCE,
            n_runs: DEFAULT_N_RUNS,
            seed: DEFAULT_SEED,
        }
    }

    pub fn validate(&self) -> crate::Result<()> {
        if !(MIN_PACKAGES..=MAX_PACKAGES).contains(&self.n_packages) {
            return Err(PackagingError::InvalidParameter(format!(
                "number of packages must be between {MIN_PACKAGES} and {MAX_PACKAGES}, got {}",
                self.n_packages
            )));
        }
        if self.max_iters == 0 || self.n_runs == 0 {
            return Err(PackagingError::InvalidParameter(
                "max iterations and number of runs must be positive".to_string(),
            ));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(PackagingError::InvalidParameter(format!(
                "tolerance must be a positive number, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}

/// Package chosen for one construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageAssignment {
    pub construction: String,
    pub package_id: usize,
}

/// Fitted partition of constructions into packages
#[derive(Debug, Clone)]
pub struct PackageModel {
    /// Requested number of packages; ids are in `0..n_packages`
    pub n_packages: usize,
    /// Number of clusters actually fitted (at most `n_packages`)
    pub effective_packages: usize,
    /// Package id per construction, aligned with the aggregates passed to `fit_packages`
    pub labels: Array1<usize>,
    /// Quantity centroid per fitted package, ascending
    pub centroids: Array1<f64>,
    /// Within-package sum of squared quantity deviations
    pub inertia: f64,
}

impl PackageModel {
    /// Number of constructions per package id, empty packages included
    pub fn package_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.n_packages];
        for &label in self.labels.iter() {
            if label < self.n_packages {
                sizes[label] += 1;
            }
        }
        sizes
    }

    /// Pair each aggregate with its package id
    pub fn assignments(&self, aggregates: &[ConstructionAggregate]) -> Vec<PackageAssignment> {
        aggregates
            .iter()
            .zip(self.labels.iter())
            .map(|(aggregate, &package_id)| PackageAssignment {
                construction: aggregate.construction.clone(),
                package_id,
            })
            .collect()
    }

    /// Mean silhouette coefficient over all constructions
    pub fn silhouette_score(&self, features: &Array2<f64>) -> f64 {
        let n_samples = features.nrows().min(self.labels.len());
        if n_samples < 2 {
            return 0.0;
        }

        let mut silhouette_sum = 0.0;

        for i in 0..n_samples {
            let label = self.labels[i];
            let mut same_package = Vec::new();
            let mut other_packages: Vec<Vec<f64>> = vec![Vec::new(); self.n_packages];

            for j in 0..n_samples {
                if i == j {
                    continue;
                }
                let distance = (features[[i, 0]] - features[[j, 0]]).abs();
                let other_label = self.labels[j];
                if other_label == label {
                    same_package.push(distance);
                } else if other_label < self.n_packages {
                    other_packages[other_label].push(distance);
                }
            }

            // Singleton packages score zero
            if same_package.is_empty() {
                continue;
            }
            let a_i = same_package.iter().sum::<f64>() / same_package.len() as f64;
            let b_i = other_packages
                .iter()
                .filter(|distances| !distances.is_empty())
                .map(|distances| distances.iter().sum::<f64>() / distances.len() as f64)
                .fold(f64::INFINITY, f64::min);

            if b_i.is_finite() && a_i.max(b_i) > 0.0 {
                silhouette_sum += (b_i - a_i) / a_i.max(b_i);
            }
        }

        silhouette_sum / n_samples as f64
    }
}

/// One-column feature matrix of construction quantities
pub fn quantity_features(aggregates: &[ConstructionAggregate]) -> Array2<f64> {
    Array2::from_shape_fn((aggregates.len(), 1), |(i, _)| {
        aggregates[i].total_quantity
    })
}

/// Partition constructions into packages by quantity
///
/// # Arguments
/// * `aggregates` - Per-construction totals; labels follow this order
/// * `params` - Package count and K-Means settings
///
/// # Behaviour
/// * At most as many constructions as packages: each construction gets its
///   own package, ranked by quantity; the remaining ids stay empty.
/// * Fewer distinct quantities than packages: the number of fitted clusters
///   is reduced to the distinct count; the remaining ids stay empty.
/// * Package ids are ordered by ascending centroid.
pub fn fit_packages(
    aggregates: &[ConstructionAggregate],
    params: &PartitionParams,
) -> crate::Result<PackageModel> {
    params.validate()?;

    if aggregates.is_empty() {
        return Err(PackagingError::InvalidParameter(
            "no constructions to partition: the component selection matched no rows".to_string(),
        ));
    }

    let features = quantity_features(aggregates);
    let n_samples = aggregates.len();

    let (labels, centroids) = if n_samples <= params.n_packages {
        debug!(
            n_samples,
            n_packages = params.n_packages,
            "one construction per package"
        );
        one_package_each(aggregates)
    } else {
        let distinct = distinct_quantities(aggregates);
        let n_clusters = params.n_packages.min(distinct);
        if n_clusters < params.n_packages {
            warn!(
                requested = params.n_packages,
                fitted = n_clusters,
                "fewer distinct quantities than packages, some packages stay empty"
            );
        }

        if n_clusters == 1 {
            let mean = features.column(0).mean().unwrap_or_default();
            (Array1::zeros(n_samples), Array1::from_elem(1, mean))
        } else {
            run_kmeans(&features, n_clusters, params)?
        }
    };

    let inertia = compute_inertia(&features, &labels, &centroids);
    let model = PackageModel {
        n_packages: params.n_packages,
        effective_packages: centroids.len(),
        labels,
        centroids,
        inertia,
    };

    info!(
        constructions = n_samples,
        packages = model.n_packages,
        fitted = model.effective_packages,
        inertia = model.inertia,
        "partition fitted"
    );
    Ok(model)
}

fn run_kmeans(
    features: &Array2<f64>,
    n_clusters: usize,
    params: &PartitionParams,
) -> crate::Result<(Array1<usize>, Array1<f64>)> {
    let dataset = Dataset::new(
        features.clone(),
        Array1::<usize>::zeros(features.nrows()),
    );
    let rng = Xoshiro256Plus::seed_from_u64(params.seed);

    let model = KMeans::params_with(n_clusters, rng, L2Dist)
        .max_n_iterations(params.max_iters)
        .tolerance(params.tolerance)
        .n_runs(params.n_runs)
        .fit(&dataset)
        .map_err(|e| PackagingError::Clustering(e.to_string()))?;

    let labels: Array1<usize> = model.predict(features);
    let fitted = model.centroids().column(0).to_owned();
    let centroids = assigned_means(features, &labels, &fitted);

    Ok(relabel_by_centroid(&labels, &centroids))
}

/// Mean quantity of each cluster's members after the final assignment.
///
/// The fitted centroids are only as close to these means as the tolerance
/// allows. A cluster with no members keeps its fitted centroid.
fn assigned_means(
    features: &Array2<f64>,
    labels: &Array1<usize>,
    fitted: &Array1<f64>,
) -> Array1<f64> {
    let mut members: Vec<Vec<f64>> = vec![Vec::new(); fitted.len()];
    for (&label, &quantity) in labels.iter().zip(features.column(0)) {
        if let Some(values) = members.get_mut(label) {
            values.push(quantity);
        }
    }

    members
        .into_iter()
        .zip(fitted.iter())
        .map(|(values, &centroid)| {
            if values.is_empty() {
                centroid
            } else {
                let count = values.len() as f64;
                ordered_sum(values) / count
            }
        })
        .collect()
}

/// Renumber clusters so that package 0 has the smallest centroid
fn relabel_by_centroid(
    labels: &Array1<usize>,
    centroids: &Array1<f64>,
) -> (Array1<usize>, Array1<f64>) {
    let mut order: Vec<usize> = (0..centroids.len()).collect();
    order.sort_by(|&a, &b| centroids[a].total_cmp(&centroids[b]));

    let mut rank = vec![0; centroids.len()];
    for (new_id, &old_id) in order.iter().enumerate() {
        rank[old_id] = new_id;
    }

    let labels = labels.mapv(|label| rank[label]);
    let centroids = order.iter().map(|&old_id| centroids[old_id]).collect();
    (labels, centroids)
}

fn one_package_each(aggregates: &[ConstructionAggregate]) -> (Array1<usize>, Array1<f64>) {
    let mut order: Vec<usize> = (0..aggregates.len()).collect();
    order.sort_by(|&a, &b| {
        aggregates[a]
            .total_quantity
            .total_cmp(&aggregates[b].total_quantity)
            .then_with(|| aggregates[a].construction.cmp(&aggregates[b].construction))
    });

    let mut labels = Array1::zeros(aggregates.len());
    for (package_id, &idx) in order.iter().enumerate() {
        labels[idx] = package_id;
    }
    let centroids = order
        .iter()
        .map(|&idx| aggregates[idx].total_quantity)
        .collect();
    (labels, centroids)
}

fn distinct_quantities(aggregates: &[ConstructionAggregate]) -> usize {
    let mut quantities: Vec<f64> = aggregates.iter().map(|a| a.total_quantity).collect();
    quantities.sort_by(f64::total_cmp);
    quantities.dedup();
    quantities.len()
}

/// Within-package sum of squares
fn compute_inertia(
    features: &Array2<f64>,
    labels: &Array1<usize>,
    centroids: &Array1<f64>,
) -> f64 {
    labels
        .iter()
        .zip(features.column(0))
        .filter(|(label, _)| **label < centroids.len())
        .map(|(&label, &quantity)| (quantity - centroids[label]).powi(2))
        .sum()
}
