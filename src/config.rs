use clap::Parser;
use std::path::PathBuf;

use crate::preprocess::TensorLayout;

/// 50 MiB, the largest upload accepted on `/predict`.
pub const DEFAULT_MAX_CONTENT_LENGTH: usize = 50 * 1024 * 1024;

#[derive(Debug, Clone, Parser)]
#[command(name = "classifier-backend", about = "Flower and animal image classification API")]
pub struct Config {
    #[arg(long, env = "CLASSIFIER_HOST", default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, env = "CLASSIFIER_PORT", default_value_t = 5001)]
    pub port: u16,

    /// Maximum upload size in bytes.
    #[arg(long, env = "CLASSIFIER_MAX_CONTENT_LENGTH", default_value_t = DEFAULT_MAX_CONTENT_LENGTH)]
    pub max_content_length: usize,

    #[arg(long, env = "CLASSIFIER_FLOWER_MODEL", default_value = "models/flower_classifier.onnx")]
    pub flower_model: PathBuf,

    #[arg(long, env = "CLASSIFIER_ANIMAL_MODEL", default_value = "models/animal_classifier.onnx")]
    pub animal_model: PathBuf,

    #[arg(long, env = "CLASSIFIER_FLOWER_LABELS", default_value = "class_names_plants.json")]
    pub flower_labels: PathBuf,

    #[arg(long, env = "CLASSIFIER_ANIMAL_LABELS", default_value = "class_names_animals.json")]
    pub animal_labels: PathBuf,

    #[arg(long, env = "CLASSIFIER_FLOWER_LAYOUT", value_enum, default_value_t = TensorLayout::Nhwc)]
    pub flower_layout: TensorLayout,

    #[arg(long, env = "CLASSIFIER_ANIMAL_LAYOUT", value_enum, default_value_t = TensorLayout::Nhwc)]
    pub animal_layout: TensorLayout,

    /// HTTP worker threads, actix picks one per core when unset.
    #[arg(long, env = "CLASSIFIER_WORKERS")]
    pub workers: Option<usize>,

    /// Ignored when RUST_LOG is set.
    #[arg(long, env = "CLASSIFIER_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[arg(long, env = "CLASSIFIER_LOG_JSON")]
    pub log_json: bool,
}
