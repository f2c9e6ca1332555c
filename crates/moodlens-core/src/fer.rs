//! In-process emotion classifier: SCRFD face detection followed by a 48×48
//! grayscale facial-expression model, both via ONNX Runtime.

use crate::classifier::{AnalyzeRequest, ClassifierError, DetectorBackend, EmotionClassifier};
use crate::detector::FaceDetector;
use crate::types::{AnalysisResult, BoundingBox, ClassifierResponse, FaceRegion};
use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, RgbImage};
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

const FER_INPUT_SIZE: u32 = 48;

/// Output order of the expression model.
pub const FER_LABELS: [&str; 7] = ["angry", "disgust", "fear", "happy", "sad", "surprise", "neutral"];

/// Tensor layout the expression model was exported with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FerLayout {
    /// `[1, 48, 48, 1]`, the layout of Keras exports.
    #[default]
    Nhwc,
    /// `[1, 1, 48, 48]`.
    Nchw,
}

/// Face detector plus expression model.
pub struct OnnxEmotionClassifier {
    detector: Option<FaceDetector>,
    session: Session,
    layout: FerLayout,
}

impl OnnxEmotionClassifier {
    /// Load the expression model, and the SCRFD detector when a path is given.
    ///
    /// Without a detector only [`DetectorBackend::Skip`] requests succeed.
    pub fn load(
        fer_model: &Path,
        detector_model: Option<&Path>,
        layout: FerLayout,
    ) -> Result<Self, ClassifierError> {
        if !fer_model.exists() {
            return Err(ClassifierError::ModelNotFound(fer_model.display().to_string()));
        }

        let detector = detector_model.map(FaceDetector::load).transpose()?;

        let session = Session::builder()?
            .with_intra_threads(2)?
            .commit_from_file(fer_model)?;

        tracing::info!(
            path = %fer_model.display(),
            ?layout,
            detector = detector.is_some(),
            "loaded expression model"
        );

        Ok(Self {
            detector,
            session,
            layout,
        })
    }

    /// Score one face crop. Returns label → percentage.
    fn classify(&mut self, face: &RgbImage) -> Result<BTreeMap<String, f32>, ClassifierError> {
        let input = fer_tensor(face, self.layout);
        let outputs = self
            .session
            .run(ort::inputs![TensorRef::from_array_view(input.view())?])?;

        let (_, raw) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| ClassifierError::InferenceFailed(format!("expression scores: {e}")))?;

        scores_from_output(raw)
    }
}

impl EmotionClassifier for OnnxEmotionClassifier {
    fn analyze(
        &mut self,
        image_path: &Path,
        request: &AnalyzeRequest,
    ) -> Result<ClassifierResponse, ClassifierError> {
        if request.actions.is_empty() {
            return Err(ClassifierError::NoAction);
        }

        let image = image::open(image_path)?.to_rgb8();

        let faces: Vec<Option<BoundingBox>> = match request.detector_backend {
            DetectorBackend::Skip => vec![None],
            DetectorBackend::Scrfd => {
                let detector = self
                    .detector
                    .as_mut()
                    .ok_or(ClassifierError::BackendUnavailable(DetectorBackend::Scrfd))?;
                let found = detector.detect(&image)?;
                if found.is_empty() {
                    if request.enforce_detection {
                        return Err(ClassifierError::NoFaceDetected);
                    }
                    tracing::debug!("no face found, analyzing whole image");
                    vec![None]
                } else {
                    found.into_iter().map(Some).collect()
                }
            }
        };

        let mut results = Vec::with_capacity(faces.len());
        for face in faces {
            let region = clamp_region(face.as_ref(), image.width(), image.height());
            let crop = imageops::crop_imm(&image, region.x, region.y, region.w, region.h).to_image();
            let scores = self.classify(&crop)?;

            let mut result = AnalysisResult::from_scores(scores)
                .ok_or_else(|| ClassifierError::InferenceFailed("empty score vector".into()))?;
            result.region = Some(region);
            result.face_confidence = Some(face.map_or(0.0, |f| f.confidence));
            results.push(result);
        }

        Ok(ClassifierResponse::PerFace(results))
    }
}

/// Convert a detector box to an in-bounds integer region. `None` covers the whole image.
fn clamp_region(face: Option<&BoundingBox>, width: u32, height: u32) -> FaceRegion {
    let Some(face) = face else {
        return FaceRegion { x: 0, y: 0, w: width, h: height };
    };

    let x1 = face.x.floor().clamp(0.0, width.saturating_sub(1) as f32) as u32;
    let y1 = face.y.floor().clamp(0.0, height.saturating_sub(1) as f32) as u32;
    let x2 = (face.x + face.width).ceil().clamp(0.0, width as f32) as u32;
    let y2 = (face.y + face.height).ceil().clamp(0.0, height as f32) as u32;

    FaceRegion {
        x: x1,
        y: y1,
        w: x2.saturating_sub(x1).max(1),
        h: y2.saturating_sub(y1).max(1),
    }
}

/// Grayscale (BT.601 weights), resize to 48×48 and scale to [0, 1].
fn fer_tensor(face: &RgbImage, layout: FerLayout) -> Array4<f32> {
    let gray = GrayImage::from_fn(face.width(), face.height(), |x, y| {
        let [r, g, b] = face.get_pixel(x, y).0;
        let luma = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
        Luma([luma.round().clamp(0.0, 255.0) as u8])
    });
    let resized = imageops::resize(&gray, FER_INPUT_SIZE, FER_INPUT_SIZE, FilterType::Triangle);

    let size = FER_INPUT_SIZE as usize;
    let mut tensor = match layout {
        FerLayout::Nhwc => Array4::<f32>::zeros((1, size, size, 1)),
        FerLayout::Nchw => Array4::<f32>::zeros((1, 1, size, size)),
    };
    for (x, y, pixel) in resized.enumerate_pixels() {
        let value = pixel[0] as f32 / 255.0;
        let (x, y) = (x as usize, y as usize);
        match layout {
            FerLayout::Nhwc => tensor[[0, y, x, 0]] = value,
            FerLayout::Nchw => tensor[[0, 0, y, x]] = value,
        }
    }
    tensor
}

/// Map raw model output to percentages keyed by label.
///
/// Outputs that already form a probability vector are used as-is; anything
/// else is treated as logits and softmaxed.
fn scores_from_output(raw: &[f32]) -> Result<BTreeMap<String, f32>, ClassifierError> {
    if raw.len() != FER_LABELS.len() {
        return Err(ClassifierError::InferenceFailed(format!(
            "expected {} expression scores, got {}",
            FER_LABELS.len(),
            raw.len()
        )));
    }

    let is_probability = raw.iter().all(|p| (0.0..=1.0).contains(p))
        && (raw.iter().sum::<f32>() - 1.0).abs() < 1e-3;

    let probabilities: Vec<f32> = if is_probability {
        raw.to_vec()
    } else {
        let max = raw.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let exp: Vec<f32> = raw.iter().map(|&x| (x - max).exp()).collect();
        let sum: f32 = exp.iter().sum();
        exp.into_iter().map(|e| e / sum).collect()
    };

    Ok(FER_LABELS
        .iter()
        .zip(probabilities)
        .map(|(label, p)| (label.to_string(), p * 100.0))
        .collect())
}
