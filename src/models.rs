use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TopPrediction {
    pub class_name: String,
    pub confidence: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PredictionResponse {
    pub model_used: String,
    pub predicted_class: String,
    pub confidence: String,
    pub top3: Vec<TopPrediction>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}
