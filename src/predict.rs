use std::cmp::Ordering;
use tracing::{debug, info};

use crate::classifier::{ClassifierError, ClassifierHandle, ModelKind};
use crate::error::PredictError;
use crate::labels::LabelSet;
use crate::models::{PredictionResponse, TopPrediction};
use crate::preprocess;
use crate::state::AppState;

pub const TOP_K: usize = 3;

/// Decode an upload, score it with both models and describe the more
/// confident one.
pub fn classify_upload(state: &AppState, bytes: &[u8]) -> Result<PredictionResponse, PredictError> {
    let image = preprocess::decode(bytes)?;
    debug!(width = image.width(), height = image.height(), "decoded upload");

    let flower = state.flower.score(&image)?;
    let animal = state.animal.score(&image)?;

    let (winner, probabilities) = select_winner(&state.flower, &flower, &state.animal, &animal);
    let response = build_response(winner.kind, &winner.labels, probabilities)?;

    info!(
        model = %winner.kind,
        class = %response.predicted_class,
        confidence = %response.confidence,
        "prediction complete"
    );
    Ok(response)
}

/// The flower model only wins with a strictly higher peak; equal peaks go to
/// the animal model.
pub fn select_winner<'a>(
    flower: &'a ClassifierHandle,
    flower_probs: &'a [f32],
    animal: &'a ClassifierHandle,
    animal_probs: &'a [f32],
) -> (&'a ClassifierHandle, &'a [f32]) {
    match pick(max_probability(flower_probs), max_probability(animal_probs)) {
        ModelKind::Flower => (flower, flower_probs),
        ModelKind::Animal => (animal, animal_probs),
    }
}

pub fn pick(flower_confidence: f32, animal_confidence: f32) -> ModelKind {
    if flower_confidence > animal_confidence {
        ModelKind::Flower
    } else {
        ModelKind::Animal
    }
}

pub fn max_probability(probabilities: &[f32]) -> f32 {
    probabilities
        .iter()
        .copied()
        .fold(f32::NEG_INFINITY, f32::max)
}

/// Index of the first maximum.
pub fn argmax(probabilities: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (index, &value) in probabilities.iter().enumerate() {
        match best {
            Some((_, current)) if value <= current => {}
            _ => best = Some((index, value)),
        }
    }
    best.map(|(index, _)| index)
}

/// The `k` largest entries with their indices, descending. Equal values keep
/// index order.
pub fn top_k(probabilities: &[f32], k: usize) -> Vec<(usize, f32)> {
    let mut ranked: Vec<(usize, f32)> = probabilities.iter().copied().enumerate().collect();
    ranked.sort_by(|(_, a), (_, b)| b.partial_cmp(a).unwrap_or(Ordering::Equal));
    ranked.truncate(k);
    ranked
}

pub fn format_confidence(probability: f32) -> String {
    format!("{:.2}%", probability * 100.0)
}

pub fn build_response(
    kind: ModelKind,
    labels: &LabelSet,
    probabilities: &[f32],
) -> Result<PredictionResponse, PredictError> {
    if probabilities.len() < TOP_K {
        return Err(ClassifierError::TooFewClasses(probabilities.len()).into());
    }
    let predicted = argmax(probabilities).ok_or(ClassifierError::EmptyOutput)?;

    let top3 = top_k(probabilities, TOP_K)
        .into_iter()
        .map(|(index, probability)| {
            Ok::<_, PredictError>(TopPrediction {
                class_name: labels.resolve(index)?.to_string(),
                confidence: format_confidence(probability),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PredictionResponse {
        model_used: kind.display_name().to_string(),
        predicted_class: labels.resolve(predicted)?.to_string(),
        confidence: format_confidence(probabilities[predicted]),
        top3,
    })
}
