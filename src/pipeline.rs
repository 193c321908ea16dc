//! End-to-end position classification pipeline
//!
//! Each stage is a function from the previous stage's artifact to a new one:
//! `Dataset → (FeatureMatrix, LabelVector) → Selection → Training →
//! Evaluation`. [`run`] chains them and persists the final model.

use crate::api::{ClassWeight, SVCParams, TrainedModel, SVC};
use crate::core::{Classifier, Result, SVMError};
use crate::data::{engineer, Dataset, FeatureConfig, FeatureMatrix, LabelVector};
use crate::evaluation::{accuracy_score, ConfusionMatrix};
use crate::kernel::KernelKind;
use crate::model_selection::{
    cross_val_score, take, train_test_split, GridPoint, GridSearch, StratifiedKFold,
    TrainTestSplit,
};
use crate::persistence::{ModelStore, SerializableModel};
use crate::selection::{FeatureSelector, MiScores, MutualInfo, Selection};
use crate::utils::scaling::StandardScaler;
use crate::utils::stats::mean;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Which classifier is fitted and persisted after the grid search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FinalModel {
    /// `final_params`, regardless of the grid search outcome
    #[default]
    Fixed,
    /// The best grid point
    Tuned,
}

/// Pipeline settings; every field has a default
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub data_path: PathBuf,
    pub model_path: PathBuf,
    pub features: FeatureConfig,
    /// Columns need a mutual information strictly above this
    pub mi_threshold: f64,
    pub mi_neighbors: usize,
    /// Seed for the estimator jitter, the split and the CV shuffle
    pub seed: u64,
    pub train_size: f64,
    pub grid: GridSearch,
    pub final_params: SVCParams,
    pub final_model: FinalModel,
    pub cv_folds: usize,
    /// Standardize inside each evaluation fold instead of using raw features
    pub scale_cv: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("nba2021.csv"),
            model_path: PathBuf::from("svm_model.json"),
            features: FeatureConfig::default(),
            mi_threshold: 0.1,
            mi_neighbors: 3,
            seed: 0,
            train_size: 0.75,
            grid: GridSearch::default(),
            final_params: SVCParams {
                kernel: KernelKind::Linear,
                c: 0.3,
                class_weight: ClassWeight::Balanced,
                ..SVCParams::default()
            },
            final_model: FinalModel::Fixed,
            cv_folds: 10,
            scale_cv: false,
        }
    }
}

impl PipelineConfig {
    /// Load settings from a JSON file; absent fields keep their defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        serde_json::from_reader(BufReader::new(file))
            .map_err(|e| SVMError::ParseError(format!("Invalid pipeline config: {e}")))
    }
}

/// Output of the trainer stage
pub struct Training {
    pub split: TrainTestSplit,
    pub scaler: StandardScaler,
    pub x_train: Vec<Vec<f64>>,
    pub x_test: Vec<Vec<f64>>,
    pub y_train: Vec<u8>,
    pub y_test: Vec<u8>,
    pub grid: GridPoint,
    pub final_params: SVCParams,
    pub model: TrainedModel,
}

/// Output of the evaluator stage
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub train_accuracy: f64,
    pub test_accuracy: f64,
    pub cv_scores: Vec<f64>,
    pub cv_mean: f64,
    pub confusion: ConfusionMatrix,
}

/// Everything a run reports
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub n_records: usize,
    pub n_rows: usize,
    pub mi_scores: MiScores,
    pub selected_features: Vec<String>,
    pub best: GridPoint,
    pub final_params: SVCParams,
    pub evaluation: Evaluation,
    /// Test accuracy of the model file found before this run overwrote it
    pub previous_test_accuracy: Option<f64>,
    pub model_path: PathBuf,
}

/// Feature selection stage
pub fn select_features(
    x: &FeatureMatrix,
    y: &LabelVector,
    config: &PipelineConfig,
) -> Result<Selection> {
    FeatureSelector::new(
        config.mi_threshold,
        MutualInfo::new(config.mi_neighbors, config.seed),
    )
    .select(x, y)
}

/// Split, scale, grid-search and fit the final classifier
pub fn train(x: &FeatureMatrix, y: &LabelVector, config: &PipelineConfig) -> Result<Training> {
    let codes = y.codes();
    let split = train_test_split(x.n_rows(), config.train_size, config.seed)?;

    let scaler = StandardScaler::fit(&take(x.rows(), &split.train))?;
    let x_train = scaler.transform(&take(x.rows(), &split.train))?;
    let x_test = scaler.transform(&take(x.rows(), &split.test))?;
    let y_train = take(&codes, &split.train);
    let y_test = take(&codes, &split.test);

    let grid = config.grid.fit(&x_train, &y_train)?;
    let best = grid.best().clone();

    let final_params = match config.final_model {
        FinalModel::Fixed => config.final_params,
        FinalModel::Tuned => best.params,
    };
    info!("Fitting final model {final_params}");
    let model = SVC::from_params(final_params).fit(&x_train, &y_train)?;

    Ok(Training {
        split,
        scaler,
        x_train,
        x_test,
        y_train,
        y_test,
        grid: best,
        final_params,
        model,
    })
}

/// Accuracy on both splits, cross-validation on the whole selected matrix
/// and the test-split confusion matrix
pub fn evaluate(
    training: &Training,
    x: &FeatureMatrix,
    y: &LabelVector,
    config: &PipelineConfig,
) -> Result<Evaluation> {
    let train_pred = training.model.predict_classes(&training.x_train);
    let test_pred = training.model.predict_classes(&training.x_test);

    let cv = StratifiedKFold::shuffled(config.cv_folds, config.seed);
    let cv_scores = cross_val_score(
        &training.final_params,
        x.rows(),
        &y.codes(),
        &cv,
        config.scale_cv,
    )?;
    let cv_mean = mean(cv_scores.iter().copied());

    Ok(Evaluation {
        train_accuracy: accuracy_score(&training.y_train, &train_pred),
        test_accuracy: accuracy_score(&training.y_test, &test_pred),
        cv_scores,
        cv_mean,
        confusion: ConfusionMatrix::from_codes(&training.y_test, &test_pred),
    })
}

/// Score the model file from an earlier run on this run's test split
///
/// Missing, unreadable or incompatible files are skipped.
pub fn previous_model_accuracy(
    store: &ModelStore,
    features: &[String],
    training: &Training,
    x: &FeatureMatrix,
    y: &LabelVector,
) -> Option<f64> {
    let previous = match store.load_optional() {
        Ok(Some(previous)) => previous,
        Ok(None) => return None,
        Err(e) => {
            warn!("Ignoring unreadable model at {}: {e}", store.path().display());
            return None;
        }
    };
    if previous.features != features {
        info!(
            "Previous model uses features [{}], skipping comparison",
            previous.features.join(", ")
        );
        return None;
    }

    let model = match previous.to_trained_model() {
        Ok(model) => model,
        Err(e) => {
            warn!("Ignoring invalid model at {}: {e}", store.path().display());
            return None;
        }
    };
    let x_test = previous
        .scaler
        .transform(&take(x.rows(), &training.split.test))
        .ok()?;
    let y_test = take(&y.codes(), &training.split.test);
    let accuracy = model.accuracy(&x_test, &y_test);
    info!("Previous model test accuracy: {accuracy:.3}");
    Some(accuracy)
}

/// Run every stage with the given settings
pub fn run(config: &PipelineConfig) -> Result<PipelineReport> {
    let dataset = Dataset::from_file(&config.data_path)?;
    info!(
        "Loaded {} records from {}",
        dataset.len(),
        config.data_path.display()
    );
    run_dataset(&dataset, config)
}

/// Run every stage after loading
pub fn run_dataset(dataset: &Dataset, config: &PipelineConfig) -> Result<PipelineReport> {
    let (x, y) = engineer(dataset, &config.features)?;
    let selection = select_features(&x, &y, config)?;
    let selected = &selection.features;

    let training = train(selected, &y, config)?;
    let evaluation = evaluate(&training, selected, &y, config)?;

    let store = ModelStore::new(&config.model_path);
    let previous_test_accuracy =
        previous_model_accuracy(&store, selected.columns(), &training, selected, &y);

    let serializable = SerializableModel::from_trained_model(
        &training.model,
        &training.scaler,
        selected.columns(),
        Some(evaluation.test_accuracy),
    )?;
    store.save(&serializable)?;

    Ok(PipelineReport {
        n_records: dataset.len(),
        n_rows: x.n_rows(),
        selected_features: selected.columns().to_vec(),
        mi_scores: selection.scores,
        best: training.grid,
        final_params: training.final_params,
        evaluation,
        previous_test_accuracy,
        model_path: config.model_path.clone(),
    })
}

impl fmt::Display for PipelineReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Selected features: {}",
            self.selected_features.join(", ")
        )?;
        writeln!(
            f,
            "Best Model: {} (mean CV accuracy {:.3})",
            self.best.params, self.best.mean_score
        )?;
        writeln!(f, "Final Model: {}", self.final_params)?;
        if let Some(previous) = self.previous_test_accuracy {
            writeln!(f, "Previous model test accuracy: {previous:.3}")?;
        }
        writeln!(
            f,
            "Training set accuracy: {:.3}",
            self.evaluation.train_accuracy
        )?;
        writeln!(f, "Test set accuracy: {:.3}", self.evaluation.test_accuracy)?;
        let scores: Vec<String> = self
            .evaluation
            .cv_scores
            .iter()
            .map(|s| format!("{s:.2}"))
            .collect();
        writeln!(f, "Cross-validation scores: [{}]", scores.join(", "))?;
        writeln!(
            f,
            "Average Cross-Validation Score: {:.2}",
            self.evaluation.cv_mean
        )?;
        writeln!(f, "Confusion Matrix:")?;
        write!(f, "{}", self.evaluation.confusion)
    }
}
