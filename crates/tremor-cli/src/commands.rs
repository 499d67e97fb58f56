//! Subcommand implementations. Each returns a serializable report.

use crate::settings::Settings;
use crate::Commands;
use anyhow::{bail, Context, Result};
use baseline_model::{cluster_report, k_distance, BaselineModel, FitSummary, Verdict};
use feature_engine::{FeatureDataset, SessionProcessor};
use serde::Serialize;
use signal_window::{SampleTable, Windower};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainReport {
    pub session: PathBuf,
    pub model: PathBuf,
    pub windows: usize,
    pub eps: f64,
    pub summary: FitSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowVerdict {
    pub window: usize,
    /// Offset of the window start from the session start (s)
    pub start_sec: f64,
    pub verdict: Verdict,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckReport {
    pub session: PathBuf,
    pub windows: usize,
    pub anomalies: usize,
    pub anomaly_ratio: f64,
    pub verdicts: Vec<WindowVerdict>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KDistanceReport {
    pub k: usize,
    pub points: usize,
    pub curve: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyzeReport {
    pub eps: f64,
    pub min_samples: usize,
    pub n_clusters: usize,
    pub n_noise: usize,
    /// -1 marks noise
    pub labels: Vec<i64>,
    pub projection: Option<Vec<(f64, f64)>>,
}

/// Per-window features of a recorded session CSV
pub fn session_features(session: &Path, settings: &Settings) -> Result<FeatureDataset> {
    let table = SampleTable::from_path(session)
        .with_context(|| format!("Failed to read session {}", session.display()))?;
    let mut processor = SessionProcessor::new(settings.window, settings.extractor)?;
    let dataset = processor
        .process_table(&table)
        .with_context(|| format!("Failed to process session {}", session.display()))?;
    Ok(dataset)
}

pub fn train(session: &Path, model_path: &Path, settings: &Settings) -> Result<TrainReport> {
    let dataset = session_features(session, settings)?;
    if dataset.is_empty() {
        bail!(
            "No analysis window could be extracted from {} ({} s windows at {} Hz)",
            session.display(),
            settings.window.window_size_sec,
            settings.window.sample_rate_hz
        );
    }

    let mut model = BaselineModel::new(settings.model);
    let summary = model.fit(&dataset)?;
    model
        .save(model_path)
        .with_context(|| format!("Failed to save model to {}", model_path.display()))?;
    info!("Baseline model saved to {}", model_path.display());

    Ok(TrainReport {
        session: session.to_path_buf(),
        model: model_path.to_path_buf(),
        windows: dataset.len(),
        eps: model.eps(),
        summary,
    })
}

pub fn check(session: &Path, model_path: &Path, settings: &Settings) -> Result<CheckReport> {
    let model = BaselineModel::load(model_path)
        .with_context(|| format!("Failed to load model from {}", model_path.display()))?;
    let dataset = session_features(session, settings)?;
    if dataset.is_empty() {
        warn!("Session {} is shorter than one analysis window", session.display());
    }

    let step_sec = Windower::new(&settings.window)?.step() as f64 / settings.window.sample_rate_hz;
    let verdicts: Vec<WindowVerdict> = model
        .predict_batch(&dataset)?
        .into_iter()
        .enumerate()
        .map(|(window, verdict)| WindowVerdict {
            window,
            start_sec: window as f64 * step_sec,
            verdict,
        })
        .collect();

    let anomalies = verdicts.iter().filter(|v| v.verdict.is_anomaly()).count();
    let anomaly_ratio = if verdicts.is_empty() {
        0.0
    } else {
        anomalies as f64 / verdicts.len() as f64
    };
    info!(
        "{} of {} windows outside the baseline ({:.1}%)",
        anomalies,
        verdicts.len(),
        anomaly_ratio * 100.0
    );

    Ok(CheckReport {
        session: session.to_path_buf(),
        windows: verdicts.len(),
        anomalies,
        anomaly_ratio,
        verdicts,
    })
}

pub fn k_distance_curve(session: &Path, k: Option<usize>, settings: &Settings) -> Result<KDistanceReport> {
    let dataset = session_features(session, settings)?;
    let k = k.unwrap_or_else(|| settings.model.min_samples_for(dataset.num_features()));
    Ok(KDistanceReport {
        k,
        points: dataset.len(),
        curve: k_distance(&dataset, k),
    })
}

pub fn analyze(session: &Path, settings: &Settings) -> Result<AnalyzeReport> {
    let dataset = session_features(session, settings)?;
    let min_samples = settings.model.min_samples_for(dataset.num_features());
    let report = cluster_report(&dataset, settings.model.eps, min_samples);

    Ok(AnalyzeReport {
        eps: settings.model.eps,
        min_samples,
        n_clusters: report.n_clusters,
        n_noise: report.n_noise,
        labels: report.labels.iter().map(|l| l.as_i64()).collect(),
        projection: report.projection,
    })
}

/// Run a command and render its report as pretty JSON
pub fn execute(command: &Commands, settings: &Settings) -> Result<String> {
    let session_or_default = |session: &Option<PathBuf>| {
        session.clone().unwrap_or_else(|| settings.session_path.clone())
    };
    let model_or_default = |model: &Option<PathBuf>| model.clone().unwrap_or_else(|| settings.model_path.clone());

    let rendered = match command {
        Commands::Train { session, model } => serde_json::to_string_pretty(&train(
            &session_or_default(session),
            &model_or_default(model),
            settings,
        )?)?,
        Commands::Check { session, model } => serde_json::to_string_pretty(&check(
            &session_or_default(session),
            &model_or_default(model),
            settings,
        )?)?,
        Commands::KDistance { session, k } => {
            serde_json::to_string_pretty(&k_distance_curve(&session_or_default(session), *k, settings)?)?
        }
        Commands::Analyze { session } => {
            serde_json::to_string_pretty(&analyze(&session_or_default(session), settings)?)?
        }
    };
    Ok(rendered)
}
