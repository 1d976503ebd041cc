use image::RgbImage;
use ndarray::Array4;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tract_onnx::prelude::*;
use tracing::debug;

use crate::labels::LabelSet;
use crate::preprocess::PreprocessConfig;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("failed to load model {path}: {message}")]
    Load { path: String, message: String },
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("model returned an empty distribution")]
    EmptyOutput,
    #[error("model returned a non-finite probability at index {0}")]
    NonFinite(usize),
    #[error("model returned {0} classes, at least 3 are required")]
    TooFewClasses(usize),
}

/// Scores one batched image tensor and returns the probability of every class.
pub trait Classifier: Send + Sync {
    fn classify(&self, input: Array4<f32>) -> Result<Vec<f32>, ClassifierError>;
}

type OnnxPlan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// An ONNX model optimized once with tract and shared read-only afterwards.
pub struct OnnxClassifier {
    model: OnnxPlan,
    input_shape: [usize; 4],
}

impl OnnxClassifier {
    pub fn load(path: impl AsRef<Path>, input_shape: [usize; 4]) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        let load_error = |e: TractError| ClassifierError::Load {
            path: path.display().to_string(),
            message: format!("{:#}", e),
        };

        let model = tract_onnx::onnx()
            .model_for_path(path)
            .map_err(load_error)?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(f32::datum_type(), tvec!(
                    input_shape[0],
                    input_shape[1],
                    input_shape[2],
                    input_shape[3]
                )),
            )
            .map_err(load_error)?
            .into_optimized()
            .map_err(load_error)?
            .into_runnable()
            .map_err(load_error)?;

        Ok(Self { model, input_shape })
    }
}

impl Classifier for OnnxClassifier {
    fn classify(&self, input: Array4<f32>) -> Result<Vec<f32>, ClassifierError> {
        if input.shape() != self.input_shape {
            return Err(ClassifierError::Inference(format!(
                "expected input shape {:?}, got {:?}",
                self.input_shape,
                input.shape()
            )));
        }

        let data = input.as_standard_layout().iter().copied().collect::<Vec<f32>>();
        let tensor = tract_ndarray::Array::from_shape_vec(
            tract_ndarray::IxDyn(&self.input_shape),
            data,
        )
        .map_err(|e| ClassifierError::Inference(e.to_string()))?
        .into_tensor();

        let result = self
            .model
            .run(tvec!(tensor.into()))
            .map_err(|e| ClassifierError::Inference(format!("{:#}", e)))?;

        let output = result
            .first()
            .ok_or(ClassifierError::EmptyOutput)?
            .to_array_view::<f32>()
            .map_err(|e| ClassifierError::Inference(format!("{:#}", e)))?;

        Ok(output.iter().copied().collect())
    }
}

/// Which of the two domain models produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    Flower,
    Animal,
}

impl ModelKind {
    pub fn display_name(self) -> &'static str {
        match self {
            ModelKind::Flower => "Flower Model",
            ModelKind::Animal => "Animal Model",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Everything needed to score an image for one domain.
#[derive(Clone)]
pub struct ClassifierHandle {
    pub kind: ModelKind,
    pub classifier: Arc<dyn Classifier>,
    pub labels: LabelSet,
    pub preprocess: PreprocessConfig,
}

impl ClassifierHandle {
    pub fn new(
        kind: ModelKind,
        classifier: Arc<dyn Classifier>,
        labels: LabelSet,
        preprocess: PreprocessConfig,
    ) -> Self {
        Self {
            kind,
            classifier,
            labels,
            preprocess,
        }
    }

    pub fn score(&self, image: &RgbImage) -> Result<Vec<f32>, ClassifierError> {
        let input = self.preprocess.to_tensor(image);
        let probabilities = self.classifier.classify(input)?;

        if probabilities.is_empty() {
            return Err(ClassifierError::EmptyOutput);
        }
        if let Some(index) = probabilities.iter().position(|p| !p.is_finite()) {
            return Err(ClassifierError::NonFinite(index));
        }

        debug!(
            model = %self.kind,
            classes = probabilities.len(),
            "scored image"
        );
        Ok(probabilities)
    }
}

impl fmt::Debug for ClassifierHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassifierHandle")
            .field("kind", &self.kind)
            .field("labels", &self.labels.len())
            .field("preprocess", &self.preprocess)
            .finish()
    }
}
