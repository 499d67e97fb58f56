//! Baseline Model: fitted normal region and nearest-neighbour membership test

use crate::dbscan::{count_clusters, euclidean, ClusterLabel, Dbscan};
use crate::scaler::StandardScaler;
use crate::ModelError;
use feature_engine::{FeatureDataset, FeatureVector};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// Version tag written in front of every persisted model
pub const MODEL_FORMAT_VERSION: u32 = 1;

/// Which clusters of the baseline count as normal movement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalRegionPolicy {
    /// Every non-noise cluster, so rare but legitimate patterns stay normal
    #[default]
    AllClusters,
    /// Only the most populous cluster (ties go to the lowest cluster id)
    LargestCluster,
}

/// Baseline model configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaselineConfig {
    /// Neighbourhood radius in standardized feature space (default: 1.5)
    pub eps: f64,
    /// Explicit density threshold; derived from the feature count when unset
    pub min_samples: Option<usize>,
    /// `min_samples = min_samples_multiplier * num_features` (default: 2)
    pub min_samples_multiplier: usize,
    /// Clusters kept as the normal region
    pub normal_region: NormalRegionPolicy,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            eps: 1.5,
            min_samples: None,
            min_samples_multiplier: 2,
            normal_region: NormalRegionPolicy::AllClusters,
        }
    }
}

impl BaselineConfig {
    /// Density threshold for a dataset with `num_features` columns
    pub fn min_samples_for(&self, num_features: usize) -> usize {
        self.min_samples
            .unwrap_or(self.min_samples_multiplier * num_features)
            .max(1)
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if !(self.eps.is_finite() && self.eps > 0.0) {
            return Err(ModelError::InvalidInput(format!("eps must be positive, got {}", self.eps)));
        }
        if self.min_samples.is_none() && self.min_samples_multiplier == 0 {
            return Err(ModelError::InvalidInput(
                "min_samples_multiplier must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Per-row classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Normal,
    Anomaly,
}

impl Verdict {
    /// Lowercase label used in reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Normal => "normal",
            Verdict::Anomaly => "anomaly",
        }
    }

    pub fn is_anomaly(&self) -> bool {
        matches!(self, Verdict::Anomaly)
    }

    fn from_anomalous(anomalous: bool) -> Self {
        if anomalous {
            Verdict::Anomaly
        } else {
            Verdict::Normal
        }
    }
}

/// Outcome of a `fit` call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FitSummary {
    /// Baseline rows seen by the fit
    pub n_points: usize,
    /// Distinct non-noise clusters
    pub n_clusters: usize,
    /// Rows labelled noise
    pub n_noise: usize,
    /// Points kept as the normal region
    pub normal_region_size: usize,
    /// Density threshold actually used
    pub min_samples: usize,
}

/// State produced by `fit`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct FittedState {
    /// Column order the scaler and region were built under
    columns: Vec<String>,
    scaler: StandardScaler,
    /// Standardized baseline points that belong to the normal region
    normal_region: Vec<Vec<f64>>,
    /// Density threshold actually used
    min_samples: usize,
}

#[derive(Serialize, Deserialize)]
struct PersistedModel {
    format_version: u32,
    model: BaselineModel,
}

/// Density-based movement baseline.
///
/// `fit` learns a normal region from baseline feature vectors; predictions
/// flag a vector as anomalous when its standardized distance to every
/// normal-region point exceeds `eps`.
///
/// `fit` takes `&mut self` and predictions take `&self`: one writer, then any
/// number of readers. Callers sharing a model across threads serialize `fit`
/// themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineModel {
    config: BaselineConfig,
    state: Option<FittedState>,
}

impl Default for BaselineModel {
    fn default() -> Self {
        Self::new(BaselineConfig::default())
    }
}

impl BaselineModel {
    /// Create an untrained model
    pub fn new(config: BaselineConfig) -> Self {
        Self { config, state: None }
    }

    /// Configuration of the current (or next) fit
    pub fn config(&self) -> &BaselineConfig {
        &self.config
    }

    /// Neighbourhood radius in standardized space
    pub fn eps(&self) -> f64 {
        self.config.eps
    }

    /// Whether `fit` has succeeded at least once
    pub fn is_fitted(&self) -> bool {
        self.state.is_some()
    }

    /// Density threshold used by the last fit
    pub fn min_samples(&self) -> Option<usize> {
        self.state.as_ref().map(|s| s.min_samples)
    }

    /// Column order learned at fit time
    pub fn columns(&self) -> Option<&[String]> {
        self.state.as_ref().map(|s| s.columns.as_slice())
    }

    /// Standardization learned at fit time
    pub fn scaler(&self) -> Option<&StandardScaler> {
        self.state.as_ref().map(|s| &s.scaler)
    }

    /// Stored normal-region points (standardized)
    pub fn normal_region(&self) -> Option<&[Vec<f64>]> {
        self.state.as_ref().map(|s| s.normal_region.as_slice())
    }

    /// Override `eps` and `min_samples`, then fit.
    ///
    /// The overrides are kept only when the fit succeeds; an invalid
    /// combination leaves configuration and fitted state untouched.
    pub fn fit_with(
        &mut self,
        dataset: &FeatureDataset,
        eps: f64,
        min_samples: Option<usize>,
    ) -> Result<FitSummary, ModelError> {
        let candidate = BaselineConfig {
            eps,
            min_samples,
            ..self.config
        };
        self.fit_under(candidate, dataset)
    }

    /// Learn the normal region from a baseline dataset, replacing any
    /// previous fit.
    ///
    /// An empty dataset, or one where every point is noise, leaves the model
    /// trained with an empty normal region: every later prediction is an
    /// anomaly.
    pub fn fit(&mut self, dataset: &FeatureDataset) -> Result<FitSummary, ModelError> {
        self.fit_under(self.config, dataset)
    }

    /// Fit under `config`, committing config and state together on success
    fn fit_under(&mut self, config: BaselineConfig, dataset: &FeatureDataset) -> Result<FitSummary, ModelError> {
        config.validate()?;
        let (summary, state) = Self::train(&config, dataset);
        self.config = config;
        self.state = Some(state);
        Ok(summary)
    }

    fn train(config: &BaselineConfig, dataset: &FeatureDataset) -> (FitSummary, FittedState) {
        let num_features = dataset.num_features();
        let min_samples = config.min_samples_for(num_features);
        let columns = dataset.columns().to_vec();

        if dataset.is_empty() {
            warn!("Empty baseline dataset: every prediction will be anomalous");
            let summary = FitSummary {
                n_points: 0,
                n_clusters: 0,
                n_noise: 0,
                normal_region_size: 0,
                min_samples,
            };
            let state = FittedState {
                columns,
                scaler: StandardScaler::identity(num_features),
                normal_region: Vec::new(),
                min_samples,
            };
            return (summary, state);
        }

        let scaler = StandardScaler::fit(dataset.rows(), num_features);
        let scaled = scaler.transform(dataset.rows());

        info!(
            "Fitting baseline on {} points x {} features (eps={}, min_samples={})",
            scaled.len(),
            num_features,
            config.eps,
            min_samples
        );
        let labels = Dbscan::new(config.eps, min_samples).fit_predict(&scaled);
        let (n_clusters, n_noise) = count_clusters(&labels);

        let keep = normal_clusters(config.normal_region, &labels);
        let normal_region: Vec<Vec<f64>> = scaled
            .into_iter()
            .zip(&labels)
            .filter(|(_, label)| keep(*label))
            .map(|(point, _)| point)
            .collect();

        if normal_region.is_empty() {
            warn!(
                "All {} baseline points are noise: every prediction will be anomalous",
                labels.len()
            );
        }

        let summary = FitSummary {
            n_points: labels.len(),
            n_clusters,
            n_noise,
            normal_region_size: normal_region.len(),
            min_samples,
        };
        info!(
            "Baseline trained: {} clusters, {} noise points, normal region of {} points",
            summary.n_clusters, summary.n_noise, summary.normal_region_size
        );

        let state = FittedState {
            columns,
            scaler,
            normal_region,
            min_samples,
        };
        (summary, state)
    }

    fn fitted(&self) -> Result<&FittedState, ModelError> {
        self.state.as_ref().ok_or(ModelError::NotFitted)
    }

    /// Distance from a raw feature row to the nearest normal-region point,
    /// in standardized space. `None` when the normal region is empty.
    pub fn nearest_distance(&self, row: &[f64]) -> Result<Option<f64>, ModelError> {
        let state = self.fitted()?;
        if row.len() != state.columns.len() {
            return Err(ModelError::InvalidInput(format!(
                "expected {} feature values, got {}",
                state.columns.len(),
                row.len()
            )));
        }

        let point = state.scaler.transform_row(row);
        Ok(state
            .normal_region
            .iter()
            .map(|normal| euclidean(normal, &point))
            .min_by(f64::total_cmp))
    }

    /// Whether a raw feature row lies farther than `eps` from the normal region
    pub fn predict_row(&self, row: &[f64]) -> Result<bool, ModelError> {
        Ok(match self.nearest_distance(row)? {
            Some(distance) => distance > self.config.eps,
            None => true,
        })
    }

    /// Whether a feature vector is anomalous relative to the baseline
    pub fn predict_is_anomalous(&self, features: &FeatureVector) -> Result<bool, ModelError> {
        let state = self.fitted()?;
        let row = state
            .columns
            .iter()
            .map(|column| {
                features
                    .value_of(column)
                    .ok_or_else(|| ModelError::MissingFeature(column.clone()))
            })
            .collect::<Result<Vec<f64>, _>>()?;
        self.predict_row(&row)
    }

    /// Classify every row of a dataset whose columns match the fitted schema
    pub fn predict_batch(&self, dataset: &FeatureDataset) -> Result<Vec<Verdict>, ModelError> {
        let state = self.fitted()?;
        if dataset.columns() != state.columns.as_slice() {
            return Err(ModelError::SchemaMismatch {
                expected: state.columns.clone(),
                actual: dataset.columns().to_vec(),
            });
        }

        let verdicts = dataset
            .rows()
            .iter()
            .map(|row| self.predict_row(row).map(Verdict::from_anomalous))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            "Classified {} rows, {} anomalous",
            verdicts.len(),
            verdicts.iter().filter(|v| v.is_anomaly()).count()
        );
        Ok(verdicts)
    }

    /// Serialize configuration and fitted state
    pub fn to_bytes(&self) -> Result<Vec<u8>, ModelError> {
        let persisted = PersistedModel {
            format_version: MODEL_FORMAT_VERSION,
            model: self.clone(),
        };
        postcard::to_allocvec(&persisted).map_err(|e| ModelError::Serialization(e.to_string()))
    }

    /// Restore a model written by `to_bytes`
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ModelError> {
        let persisted: PersistedModel =
            postcard::from_bytes(bytes).map_err(|e| ModelError::Serialization(e.to_string()))?;
        if persisted.format_version != MODEL_FORMAT_VERSION {
            return Err(ModelError::Serialization(format!(
                "unsupported model format version {}",
                persisted.format_version
            )));
        }
        Ok(persisted.model)
    }

    /// Write the persisted form to `path`, replacing any existing file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ModelError> {
        let path = path.as_ref();
        std::fs::write(path, self.to_bytes()?)?;
        info!("Model saved to {}", path.display());
        Ok(())
    }

    /// Read a model written by `save`
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let model = Self::from_bytes(&std::fs::read(path)?)?;
        info!("Model loaded from {}", path.display());
        Ok(model)
    }
}

/// Predicate selecting the clusters kept by `policy`
fn normal_clusters(policy: NormalRegionPolicy, labels: &[ClusterLabel]) -> impl Fn(&ClusterLabel) -> bool {
    let largest = match policy {
        NormalRegionPolicy::AllClusters => None,
        NormalRegionPolicy::LargestCluster => {
            let mut sizes: HashMap<usize, usize> = HashMap::new();
            for label in labels {
                if let ClusterLabel::Cluster(id) = label {
                    *sizes.entry(*id).or_default() += 1;
                }
            }
            // Largest size first, lowest id on ties
            sizes
                .into_iter()
                .max_by(|(id_a, size_a), (id_b, size_b)| size_a.cmp(size_b).then(id_b.cmp(id_a)))
                .map(|(id, _)| id)
        }
    };

    move |label: &ClusterLabel| match (policy, label) {
        (_, ClusterLabel::Noise) => false,
        (NormalRegionPolicy::AllClusters, ClusterLabel::Cluster(_)) => true,
        (NormalRegionPolicy::LargestCluster, ClusterLabel::Cluster(id)) => Some(*id) == largest,
    }
}
