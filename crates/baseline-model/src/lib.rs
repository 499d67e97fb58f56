//! Movement Baseline Model
//!
//! Learns a "normal movement" region from baseline feature vectors with
//! density-reachability clustering and flags new vectors that fall outside it.

mod dbscan;
mod diagnostics;
mod model;
mod scaler;

pub use dbscan::{euclidean, ClusterLabel, Dbscan};
pub use diagnostics::{cluster_report, k_distance, project_2d, ClusterReport};
pub use model::{
    BaselineConfig, BaselineModel, FitSummary, NormalRegionPolicy, Verdict, MODEL_FORMAT_VERSION,
};
pub use scaler::StandardScaler;

use thiserror::Error;

/// Errors from fitting, predicting and persisting a baseline model
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Model has not been fitted; call fit() before predicting")]
    NotFitted,

    #[error("Feature schema mismatch: model expects {expected:?}, got {actual:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("Feature vector has no column named {0}")]
    MissingFeature(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Model serialization failed: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
