use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::classifier::{ClassifierHandle, ModelKind, OnnxClassifier};
use crate::config::Config;
use crate::labels::LabelSet;
use crate::preprocess::PreprocessConfig;

/// Read-only state shared by every request.
#[derive(Debug, Clone)]
pub struct AppState {
    pub flower: ClassifierHandle,
    pub animal: ClassifierHandle,
    pub max_content_length: usize,
}

impl AppState {
    pub fn new(flower: ClassifierHandle, animal: ClassifierHandle, max_content_length: usize) -> Self {
        Self {
            flower,
            animal,
            max_content_length,
        }
    }

    /// Load both models and label sets from disk.
    pub fn load(config: &Config) -> Result<Self> {
        let flower = load_handle(
            ModelKind::Flower,
            &config.flower_model,
            &config.flower_labels,
            PreprocessConfig::flower(config.flower_layout),
        )?;
        let animal = load_handle(
            ModelKind::Animal,
            &config.animal_model,
            &config.animal_labels,
            PreprocessConfig::animal(config.animal_layout),
        )?;
        Ok(Self::new(flower, animal, config.max_content_length))
    }
}

fn load_handle(
    kind: ModelKind,
    model_path: &Path,
    labels_path: &Path,
    preprocess: PreprocessConfig,
) -> Result<ClassifierHandle> {
    let labels = LabelSet::load(labels_path)
        .with_context(|| format!("loading {} labels from {}", kind, labels_path.display()))?;

    info!(
        model = %kind,
        path = %model_path.display(),
        labels_path = %labels_path.display(),
        input_shape = ?preprocess.input_shape(),
        "loading classifier"
    );
    let classifier = OnnxClassifier::load(model_path, preprocess.input_shape())
        .with_context(|| format!("loading {}", kind))?;

    info!(model = %kind, labels = labels.len(), "classifier ready");
    Ok(ClassifierHandle::new(kind, Arc::new(classifier), labels, preprocess))
}
