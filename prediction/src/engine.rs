//! Training, persistence and batch prediction for the profit model.

use crate::dataset::Dataset;
use crate::features::{check_names, check_shape, feature_vector, outcome_feature_vector, FEATURE_NAMES};
use crate::forest::{ForestConfig, RandomForest};
use crate::outcomes::OutcomeRecord;
use crate::scaler::StandardScaler;
use anyhow::{bail, Context, Result};
use chrono::Utc;
use common::{ScanError, ScannerConfig};
use scanner::ScanResult;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

pub const MODEL_FILE: &str = "prediction_model.json";
pub const SCALER_FILE: &str = "scaler.json";

const SPLIT_SEED: u64 = 42;
const TEST_RATIO: f64 = 0.2;
const STRONG_CONFIDENCE: f64 = 0.75;

/// Summary of one training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainReport {
    pub samples: usize,
    pub positive: usize,
    pub test_accuracy: f64,
    /// (feature name, importance), most important first.
    pub top_features: Vec<(String, f64)>,
}

/// One scored candidate from a prediction run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub symbol: String,
    pub score_long: i32,
    pub score_short: i32,
    pub rsi14: f64,
    pub ibs: f64,
    pub risk_level: String,
    /// Probability of a profitable next day, in [0, 1].
    pub probability: f64,
    /// Probability scaled to 0-100, one decimal.
    pub prediction_score: f64,
    pub recommendation: String,
}

pub struct PredictionEngine {
    config: ScannerConfig,
    model: Option<RandomForest>,
    scaler: Option<StandardScaler>,
}

impl PredictionEngine {
    pub fn new(config: ScannerConfig) -> Self {
        Self {
            config,
            model: None,
            scaler: None,
        }
    }

    fn models_dir(&self) -> PathBuf {
        PathBuf::from(&self.config.models_dir)
    }

    /// Trains the forest on labeled history. Below the minimum sample
    /// count training is refused: no model is fitted, nothing is written,
    /// and `None` is returned so the caller can report and move on.
    pub fn train(&mut self, records: &[OutcomeRecord]) -> Result<Option<TrainReport>> {
        let required = self.config.min_training_samples;
        if records.len() < required {
            warn!(
                "Insufficient data for training: {}",
                ScanError::InsufficientSamples {
                    available: records.len(),
                    required,
                }
            );
            info!("Run the scanner for more days to accumulate history");
            return Ok(None);
        }

        let feature_names: Vec<String> = FEATURE_NAMES.iter().map(|s| s.to_string()).collect();
        let mut dataset = Dataset::new(feature_names);
        for record in records {
            let label = if record.profitable { 1.0 } else { 0.0 };
            dataset.add_sample(outcome_feature_vector(record), label);
        }

        let positive = dataset.labels.iter().filter(|&&l| l > 0.0).count();
        info!(
            "Training with {} samples, {} profitable ({:.1}%)",
            dataset.n_samples(),
            positive,
            positive as f64 / dataset.n_samples() as f64 * 100.0
        );

        let split = dataset.stratified_split(TEST_RATIO, SPLIT_SEED);
        let scaler = StandardScaler::fit(&split.train);
        let train_scaled = scaler.transform(&split.train);
        let test_scaled = scaler.transform(&split.test);

        let mut forest = RandomForest::new(ForestConfig::default());
        forest.fit(&train_scaled);

        let test_accuracy = forest.accuracy(&test_scaled);
        info!("Model accuracy on holdout: {:.2}%", test_accuracy * 100.0);

        let top_features: Vec<(String, f64)> = forest
            .feature_importance_ranking()
            .into_iter()
            .take(10)
            .map(|(n, i)| (n.to_string(), i))
            .collect();
        for (name, importance) in &top_features {
            info!("  {}: {:.4}", name, importance);
        }

        self.save_artifacts(&forest, &scaler)?;
        let report = TrainReport {
            samples: records.len(),
            positive,
            test_accuracy,
            top_features,
        };
        self.model = Some(forest);
        self.scaler = Some(scaler);
        Ok(Some(report))
    }

    /// Stages each artifact next to its target and renames it into place,
    /// so a reader never observes a half-written model.
    fn save_artifacts(&self, forest: &RandomForest, scaler: &StandardScaler) -> Result<()> {
        let dir = self.models_dir();
        fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
        write_json_atomic(&dir.join(MODEL_FILE), forest)?;
        write_json_atomic(&dir.join(SCALER_FILE), scaler)?;
        info!("Model saved to {}", dir.join(MODEL_FILE).display());
        Ok(())
    }

    /// Loads persisted artifacts as-is. Returns false when no trained
    /// model exists yet.
    pub fn load(&mut self) -> Result<bool> {
        let dir = self.models_dir();
        let model_path = dir.join(MODEL_FILE);
        let scaler_path = dir.join(SCALER_FILE);
        if !model_path.exists() || !scaler_path.exists() {
            warn!("No pre-trained model found in {}", dir.display());
            return Ok(false);
        }

        let forest: RandomForest = read_json(&model_path)?;
        let scaler: StandardScaler = read_json(&scaler_path)?;

        // a model trained against a different feature list must not predict
        check_names(forest.feature_names())?;
        check_shape(FEATURE_NAMES.len(), scaler.n_features())?;

        info!("Loaded pre-trained model from {}", dir.display());
        self.model = Some(forest);
        self.scaler = Some(scaler);
        Ok(true)
    }

    /// Scores a batch of fresh scan records, highest confidence first.
    pub fn predict(&self, signals: &[ScanResult]) -> Result<Vec<PredictionRecord>> {
        let (Some(model), Some(scaler)) = (&self.model, &self.scaler) else {
            bail!("model not available; train or load first");
        };

        let mut predictions = Vec::with_capacity(signals.len());
        for signal in signals {
            let features = feature_vector(signal);
            check_shape(scaler.n_features(), features.len())?;
            let scaled = scaler.transform_row(&features);
            let probability = model.predict_proba_one(&scaled);

            let prediction_score = (probability * 1000.0).round() / 10.0;
            let recommendation = recommendation(
                probability,
                self.config.confidence_threshold,
                signal.score_short > signal.score_long,
            );

            predictions.push(PredictionRecord {
                symbol: signal.symbol.clone(),
                score_long: signal.score_long,
                score_short: signal.score_short,
                rsi14: signal.rsi14,
                ibs: signal.ibs,
                risk_level: signal.risk_level.clone(),
                probability,
                prediction_score,
                recommendation,
            });
        }

        predictions.sort_by(|a, b| b.prediction_score.total_cmp(&a.prediction_score));
        Ok(predictions)
    }

    /// Writes the full prediction set plus a high-confidence subset to the
    /// output directory and logs the top picks.
    pub fn write_report(&self, predictions: &[PredictionRecord]) -> Result<()> {
        if predictions.is_empty() {
            warn!("No predictions to report");
            return Ok(());
        }

        let threshold = self.config.confidence_threshold;
        let high_conf: Vec<&PredictionRecord> = predictions
            .iter()
            .filter(|p| p.probability >= threshold)
            .collect();

        info!("Total signals analyzed: {}", predictions.len());
        info!(
            "High confidence predictions (>={:.0}%): {}",
            threshold * 100.0,
            high_conf.len()
        );
        for (idx, p) in high_conf.iter().take(10).enumerate() {
            info!(
                "{}. {} - {} ({:.1}%, long={}, short={}, risk={})",
                idx + 1,
                p.symbol,
                p.recommendation,
                p.prediction_score,
                p.score_long,
                p.score_short,
                p.risk_level
            );
        }

        let output_dir = PathBuf::from(&self.config.output_dir);
        fs::create_dir_all(&output_dir)?;
        write_predictions_atomic(&output_dir.join("tomorrow_predictions.csv"), predictions)?;

        if !high_conf.is_empty() {
            let tag = Utc::now().format("%Y-%m-%d_%H%M");
            let top_path = output_dir.join(format!("top_predictions_{}.csv", tag));
            let owned: Vec<PredictionRecord> = high_conf.into_iter().cloned().collect();
            write_predictions_atomic(&top_path, &owned)?;
        }
        Ok(())
    }
}

/// Recommendation label from probability and direction. SELL variants are
/// used when the short score dominates the long score.
fn recommendation(probability: f64, threshold: f64, short_dominant: bool) -> String {
    let positive = probability > 0.5;
    let label = if positive && probability >= STRONG_CONFIDENCE {
        if short_dominant {
            "STRONG SELL"
        } else {
            "STRONG BUY"
        }
    } else if positive && probability >= threshold {
        if short_dominant {
            "SELL"
        } else {
            "BUY"
        }
    } else if positive {
        "HOLD"
    } else {
        "AVOID"
    };
    label.to_string()
}

fn write_json_atomic<T: Serialize>(target: &Path, value: &T) -> Result<()> {
    let temp = target.with_extension(format!("tmp-{}", Uuid::new_v4().simple()));
    let json = serde_json::to_vec(value)?;
    fs::write(&temp, json).with_context(|| format!("writing {}", temp.display()))?;
    fs::rename(&temp, target)
        .with_context(|| format!("moving {} to {}", temp.display(), target.display()))?;
    Ok(())
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parsing {}", path.display()))
}

fn write_predictions_atomic(target: &Path, predictions: &[PredictionRecord]) -> Result<()> {
    let temp = target.with_extension(format!("tmp-{}", Uuid::new_v4().simple()));
    let mut writer =
        csv::Writer::from_path(&temp).with_context(|| format!("opening {}", temp.display()))?;
    for p in predictions {
        writer.serialize(p)?;
    }
    writer.flush()?;
    drop(writer);
    match fs::rename(&temp, target) {
        Ok(()) => info!("Predictions saved to {}", target.display()),
        Err(e) => warn!(
            "Could not move {} to {}: {}. Leaving temp file in place",
            temp.display(),
            target.display(),
            e
        ),
    }
    Ok(())
}
