//! Model serialization and persistence
//!
//! A model file bundles the one-vs-one classifier with the scaler it was
//! trained behind and the names of the selected features, so inputs can
//! be rebuilt the same way before prediction.

use crate::api::{BinaryMachine, SVCParams, TrainedModel};
use crate::core::{Result, SVMError, SVMModel};
use crate::kernel::KernelType;
use crate::optimizer::TrainedSVM;
use crate::utils::scaling::StandardScaler;
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Serializable representation of a trained classifier and its inputs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializableModel {
    /// Hyperparameters the classifier was fitted with
    pub params: SVCParams,
    /// Kernel with gamma already resolved
    pub kernel: KernelType,
    /// Sorted class codes
    pub classes: Vec<u8>,
    /// Pairwise machines in (i, j), i < j order
    pub machines: Vec<SerializableMachine>,
    /// Scaler fitted on the training split
    pub scaler: StandardScaler,
    /// Selected feature names, in column order
    pub features: Vec<String>,
    /// Model metadata
    pub metadata: ModelMetadata,
}

/// One binary machine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializableMachine {
    pub positive: u8,
    pub negative: u8,
    pub support_vectors: Vec<Vec<f64>>,
    /// Alpha values times labels (alpha_i * y_i)
    pub dual_coef: Vec<f64>,
    pub bias: f64,
}

/// Model metadata for tracking and validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Library version used to create the model
    pub library_version: String,
    /// Support vectors summed over machines
    pub n_support_vectors: usize,
    /// Accuracy on the held-out split at training time
    pub test_accuracy: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl From<&BinaryMachine> for SerializableMachine {
    fn from(machine: &BinaryMachine) -> Self {
        Self {
            positive: machine.positive(),
            negative: machine.negative(),
            support_vectors: machine.svm().support_vectors().to_vec(),
            dual_coef: machine.svm().dual_coef().to_vec(),
            bias: machine.svm().bias(),
        }
    }
}

impl SerializableModel {
    /// Create a serializable model from a trained classifier
    pub fn from_trained_model(
        model: &TrainedModel,
        scaler: &StandardScaler,
        features: &[String],
        test_accuracy: Option<f64>,
    ) -> Result<Self> {
        if scaler.n_features() != model.n_features() || features.len() != model.n_features() {
            return Err(SVMError::DimensionMismatch {
                expected: model.n_features(),
                actual: scaler.n_features().min(features.len()),
            });
        }
        let info = model.info();

        Ok(Self {
            params: *model.params(),
            kernel: *model.kernel(),
            classes: model.classes().to_vec(),
            machines: model.machines().iter().map(SerializableMachine::from).collect(),
            scaler: scaler.clone(),
            features: features.to_vec(),
            metadata: ModelMetadata {
                library_version: crate::VERSION.to_string(),
                n_support_vectors: info.n_support_vectors,
                test_accuracy,
                created_at: Utc::now(),
            },
        })
    }

    /// Save model to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| SVMError::SerializationError(e.to_string()))?;
        Ok(())
    }

    /// Load model from file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let model = serde_json::from_reader(reader)
            .map_err(|e| SVMError::SerializationError(e.to_string()))?;
        Ok(model)
    }

    /// Rebuild the classifier
    pub fn to_trained_model(&self) -> Result<TrainedModel> {
        let kernel = Arc::new(self.kernel);
        let machines = self
            .machines
            .iter()
            .map(|m| {
                let svm = TrainedSVM::from_parts(
                    Arc::clone(&kernel),
                    m.support_vectors.clone(),
                    m.dual_coef.clone(),
                    m.bias,
                )?;
                Ok(BinaryMachine::new(m.positive, m.negative, svm))
            })
            .collect::<Result<Vec<_>>>()?;

        TrainedModel::from_parts(
            self.params,
            self.kernel,
            self.classes.clone(),
            self.scaler.n_features(),
            machines,
        )
    }

    /// Model summary for display
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "=== SVM Model Summary ===".to_string(),
            format!("Classifier: {}", self.params),
            format!("Kernel: {:?}", self.kernel),
            format!("Classes: {:?}", self.classes),
            format!("Pairwise Machines: {}", self.machines.len()),
            format!("Support Vectors: {}", self.metadata.n_support_vectors),
            format!("Features: {}", self.features.join(", ")),
        ];
        if let Some(acc) = self.metadata.test_accuracy {
            lines.push(format!("Test Accuracy: {acc:.3}"));
        }
        lines.push(format!("Library Version: {}", self.metadata.library_version));
        lines.push(format!("Created: {}", self.metadata.created_at.to_rfc3339()));
        lines.join("\n")
    }
}

/// Model file at a fixed location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelStore {
    path: PathBuf,
}

impl ModelStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the model, replacing any earlier file
    pub fn save(&self, model: &SerializableModel) -> Result<()> {
        model.save_to_file(&self.path)?;
        info!("Saved model to {}", self.path.display());
        Ok(())
    }

    /// Read the model; a missing file is [`SVMError::ModelNotFound`]
    pub fn load(&self) -> Result<SerializableModel> {
        if !self.path.exists() {
            return Err(SVMError::ModelNotFound(self.path.clone()));
        }
        SerializableModel::load_from_file(&self.path)
    }

    /// Read the model if one has been saved
    pub fn load_optional(&self) -> Result<Option<SerializableModel>> {
        match self.load() {
            Ok(model) => Ok(Some(model)),
            Err(SVMError::ModelNotFound(path)) => {
                info!("No previous model at {}", path.display());
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
