//! Analysis adapter: hands an in-memory image to a classifier and normalizes
//! the answer.
//!
//! The classifier works on files, so each call writes the image to a scoped
//! temporary JPEG. The file is removed before [`Analyzer::analyze`] returns on
//! every path, and by `Drop` if the classifier panics.

use crate::classifier::{AnalyzeRequest, ClassifierError, DetectorBackend, EmotionClassifier};
use crate::types::AnalysisResult;
use image::{DynamicImage, ImageFormat, RgbImage};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("failed to create temporary image: {0}")]
    TempFile(#[source] std::io::Error),
    #[error("failed to encode image: {0}")]
    Encode(#[from] image::ImageError),
    #[error(transparent)]
    Classifier(#[from] ClassifierError),
    #[error("classifier returned no faces")]
    EmptyResponse,
}

/// Owns a classifier and the fixed request options used for every call.
pub struct Analyzer<C> {
    classifier: C,
    request: AnalyzeRequest,
    temp_dir: Option<PathBuf>,
}

impl<C: EmotionClassifier> Analyzer<C> {
    pub fn new(classifier: C, detector_backend: DetectorBackend) -> Self {
        Self {
            classifier,
            request: AnalyzeRequest::emotion(detector_backend),
            temp_dir: None,
        }
    }

    /// Place temporary images in `dir` instead of the system temp directory.
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    pub fn request(&self) -> &AnalyzeRequest {
        &self.request
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Classify the emotion of the (first) face in `image`.
    pub fn analyze(&mut self, image: &DynamicImage) -> Result<AnalysisResult, AnalysisError> {
        let rgb = to_classifier_rgb(image);

        let mut builder = tempfile::Builder::new();
        builder.prefix("moodlens-").suffix(".jpg");
        let mut file = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(AnalysisError::TempFile)?;

        rgb.write_to(file.as_file_mut(), ImageFormat::Jpeg)?;
        tracing::debug!(
            path = %file.path().display(),
            width = rgb.width(),
            height = rgb.height(),
            backend = %self.request.detector_backend,
            "invoking classifier"
        );

        let response = self.classifier.analyze(file.path(), &self.request);

        if let Err(e) = file.close() {
            tracing::warn!(error = %e, "failed to remove temporary image");
        }

        let response = response?;
        let faces = response.face_count();
        let result = response.into_first().ok_or(AnalysisError::EmptyResponse)?;
        if faces > 1 {
            tracing::debug!(faces, "multiple faces returned, using the first");
        }

        tracing::info!(dominant = %result.dominant, "analysis finished");
        Ok(result)
    }
}

/// Normalize any color model to the 8-bit, 3-channel RGB layout classifiers
/// read. Alpha is dropped and grayscale is expanded.
pub fn to_classifier_rgb(image: &DynamicImage) -> RgbImage {
    image.to_rgb8()
}
