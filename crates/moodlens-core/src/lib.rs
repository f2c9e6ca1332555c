//! moodlens-core — emotion feedback for a face photo.
//!
//! A classifier (SCRFD + a FER model via ONNX Runtime, or an external command)
//! scores the photo; the adapter hides the file round-trip, the renderer maps
//! scores to localized feedback, and the page controller keeps the session
//! state for the camera and upload surfaces.

pub mod adapter;
pub mod classifier;
pub mod detector;
pub mod emotion;
pub mod fer;
pub mod page;
pub mod render;
pub mod text;
pub mod types;

use std::path::PathBuf;

pub use adapter::{AnalysisError, Analyzer};
pub use classifier::{AnalyzeRequest, ClassifierError, CommandClassifier, DetectorBackend, EmotionClassifier};
pub use emotion::{EmotionFeedback, EmotionLabel, Locale};
pub use fer::{FerLayout, OnnxEmotionClassifier};
pub use page::{Notice, PageController, PageEvent, PageView, SessionState, Sidebar, UploadedFile};
pub use render::{render, ResultView};
pub use text::UiText;
pub use types::{AnalysisResult, BoundingBox, ClassifierResponse, FaceRegion};

/// File name of the SCRFD detector inside the model directory.
pub const DETECTOR_MODEL_FILE: &str = "det_10g.onnx";
/// File name of the expression model inside the model directory.
pub const FER_MODEL_FILE: &str = "facial_expression.onnx";

/// `$XDG_DATA_HOME/moodlens/models`, or `~/.local/share/moodlens/models`.
pub fn default_model_dir() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local/share")
        })
        .join("moodlens")
        .join("models")
}
