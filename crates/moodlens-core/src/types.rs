use crate::emotion::EmotionLabel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Bounding box for a detected face, in source-image pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub confidence: f32,
}

/// Integer face region as reported alongside an emotion result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceRegion {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// Emotion scores for one face.
///
/// The serialized field names follow the widely used `{"emotion": {...},
/// "dominant_emotion": "..."}` response shape, so external classifiers can
/// emit it directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Label → confidence score in [0, 100].
    #[serde(rename = "emotion", default)]
    pub scores: BTreeMap<String, f32>,
    /// Label the classifier declares most likely. Trusted as-is, never recomputed.
    /// Missing in the response means neutral.
    #[serde(rename = "dominant_emotion", default = "neutral_label")]
    pub dominant: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<FaceRegion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face_confidence: Option<f32>,
}

fn neutral_label() -> String {
    EmotionLabel::Neutral.as_str().to_string()
}

impl AnalysisResult {
    /// Build a result whose dominant label is the highest-scoring entry.
    ///
    /// Returns `None` for an empty score map.
    pub fn from_scores(scores: BTreeMap<String, f32>) -> Option<Self> {
        let dominant = scores
            .iter()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(label, _)| label.clone())?;
        Some(Self {
            scores,
            dominant,
            region: None,
            face_confidence: None,
        })
    }
}

/// Raw classifier output: one record, or one record per detected face.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClassifierResponse {
    PerFace(Vec<AnalysisResult>),
    Single(AnalysisResult),
}

impl ClassifierResponse {
    /// Collapse to a single record. Per-face responses keep only the first face.
    pub fn into_first(self) -> Option<AnalysisResult> {
        match self {
            ClassifierResponse::Single(result) => Some(result),
            ClassifierResponse::PerFace(faces) => faces.into_iter().next(),
        }
    }

    pub fn face_count(&self) -> usize {
        match self {
            ClassifierResponse::Single(_) => 1,
            ClassifierResponse::PerFace(faces) => faces.len(),
        }
    }
}
