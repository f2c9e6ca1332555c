//! Classifier boundary: the request shape, the error taxonomy and the
//! external-command implementation.
//!
//! A classifier receives the path of an image file and returns either a single
//! emotion record or one record per detected face.

use crate::detector::DetectorError;
use crate::types::ClassifierResponse;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::process::Command;
use std::str::FromStr;
use thiserror::Error;

/// Analysis requested from the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Emotion,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Emotion => "emotion",
        }
    }
}

/// Face detector used ahead of emotion classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectorBackend {
    #[default]
    Scrfd,
    /// No detection: the whole image is treated as one face.
    Skip,
}

impl DetectorBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            DetectorBackend::Scrfd => "scrfd",
            DetectorBackend::Skip => "skip",
        }
    }
}

impl fmt::Display for DetectorBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DetectorBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scrfd" => Ok(DetectorBackend::Scrfd),
            "skip" => Ok(DetectorBackend::Skip),
            other => Err(format!("unknown detector backend: {other} (expected scrfd or skip)")),
        }
    }
}

/// Options passed with every classifier call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzeRequest {
    pub actions: Vec<Action>,
    /// When false, an image without a detectable face is analyzed as a whole.
    pub enforce_detection: bool,
    pub detector_backend: DetectorBackend,
}

impl AnalyzeRequest {
    /// Emotion-only request with face enforcement disabled.
    pub fn emotion(detector_backend: DetectorBackend) -> Self {
        Self {
            actions: vec![Action::Emotion],
            enforce_detection: false,
            detector_backend,
        }
    }
}

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("model file not found: {0}")]
    ModelNotFound(String),
    #[error("image: {0}")]
    Image(#[from] image::ImageError),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("detector: {0}")]
    Detector(#[from] DetectorError),
    #[error("ort: {0}")]
    Ort(#[from] ort::Error),
    #[error("inference failed: {0}")]
    InferenceFailed(String),
    #[error("no face detected")]
    NoFaceDetected,
    #[error("request has no supported action")]
    NoAction,
    #[error("detector backend {0} is not available")]
    BackendUnavailable(DetectorBackend),
    #[error("classifier command exited with {status}: {stderr}")]
    CommandFailed { status: String, stderr: String },
    #[error("malformed classifier response: {0}")]
    MalformedResponse(#[from] serde_json::Error),
}

/// Something that turns an image file into emotion scores.
pub trait EmotionClassifier {
    fn analyze(
        &mut self,
        image_path: &Path,
        request: &AnalyzeRequest,
    ) -> Result<ClassifierResponse, ClassifierError>;
}

impl<C: EmotionClassifier + ?Sized> EmotionClassifier for Box<C> {
    fn analyze(
        &mut self,
        image_path: &Path,
        request: &AnalyzeRequest,
    ) -> Result<ClassifierResponse, ClassifierError> {
        (**self).analyze(image_path, request)
    }
}

/// Runs an external program per call and parses its stdout as JSON.
///
/// The image path is appended as the last argument. Request options travel in
/// `MOODLENS_ACTIONS`, `MOODLENS_ENFORCE_DETECTION` and
/// `MOODLENS_DETECTOR_BACKEND`. Stdout must hold a single object or an array
/// of per-face objects in the `{"emotion": {...}, "dominant_emotion": ...}`
/// shape.
#[derive(Debug, Clone)]
pub struct CommandClassifier {
    program: String,
    args: Vec<String>,
}

impl CommandClassifier {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Split a whitespace-separated command line into program and arguments.
    pub fn from_command_line(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect()))
    }
}

impl EmotionClassifier for CommandClassifier {
    fn analyze(
        &mut self,
        image_path: &Path,
        request: &AnalyzeRequest,
    ) -> Result<ClassifierResponse, ClassifierError> {
        if request.actions.is_empty() {
            return Err(ClassifierError::NoAction);
        }
        let actions: Vec<&str> = request.actions.iter().map(|a| a.as_str()).collect();

        tracing::debug!(program = %self.program, path = %image_path.display(), "running classifier command");
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(image_path)
            .env("MOODLENS_ACTIONS", actions.join(","))
            .env(
                "MOODLENS_ENFORCE_DETECTION",
                if request.enforce_detection { "1" } else { "0" },
            )
            .env("MOODLENS_DETECTOR_BACKEND", request.detector_backend.as_str())
            .output()?;

        if !output.status.success() {
            return Err(ClassifierError::CommandFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let response: ClassifierResponse = serde_json::from_slice(&output.stdout)?;
        tracing::debug!(faces = response.face_count(), "classifier command finished");
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emotion_request_defaults() {
        let request = AnalyzeRequest::emotion(DetectorBackend::Scrfd);
        assert_eq!(request.actions, vec![Action::Emotion]);
        assert!(!request.enforce_detection);
    }

    #[test]
    fn test_detector_backend_parse() {
        assert_eq!("skip".parse(), Ok(DetectorBackend::Skip));
        assert_eq!("scrfd".parse(), Ok(DetectorBackend::Scrfd));
        assert!("opencv".parse::<DetectorBackend>().is_err());
    }

    #[test]
    fn test_from_command_line() {
        let cmd = CommandClassifier::from_command_line("python3  classify.py --fast").unwrap();
        assert_eq!(cmd.program, "python3");
        assert_eq!(cmd.args, vec!["classify.py", "--fast"]);
        assert!(CommandClassifier::from_command_line("   ").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_command_classifier_parses_array_response() {
        let script = r#"printf '[{"emotion":{"happy":70.0,"sad":30.0},"dominant_emotion":"happy"}]'"#;
        let mut cmd = CommandClassifier::new("sh", vec!["-c".into(), script.into(), "sh".into()]);
        let response = cmd
            .analyze(Path::new("/nonexistent.jpg"), &AnalyzeRequest::emotion(DetectorBackend::Skip))
            .unwrap();
        assert_eq!(response.face_count(), 1);
        assert_eq!(response.into_first().unwrap().dominant, "happy");
    }

    #[cfg(unix)]
    #[test]
    fn test_command_classifier_receives_path_and_options() {
        // Echo the inputs back inside a valid response.
        let script = r#"printf '{"emotion":{"neutral":100.0},"dominant_emotion":"%s|%s|%s|%s"}' "$1" "$MOODLENS_ACTIONS" "$MOODLENS_ENFORCE_DETECTION" "$MOODLENS_DETECTOR_BACKEND""#;
        let mut cmd = CommandClassifier::new("sh", vec!["-c".into(), script.into(), "sh".into()]);
        let response = cmd
            .analyze(Path::new("/tmp/face.jpg"), &AnalyzeRequest::emotion(DetectorBackend::Scrfd))
            .unwrap();
        assert_eq!(
            response.into_first().unwrap().dominant,
            "/tmp/face.jpg|emotion|0|scrfd"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_command_classifier_without_dominant_label() {
        let script = r#"printf '{"emotion":{"happy":80.0,"sad":20.0}}'"#;
        let mut cmd = CommandClassifier::new("sh", vec!["-c".into(), script.into(), "sh".into()]);
        let result = cmd
            .analyze(Path::new("x.jpg"), &AnalyzeRequest::emotion(DetectorBackend::Skip))
            .unwrap()
            .into_first()
            .unwrap();
        assert_eq!(result.dominant, "neutral");
        assert_eq!(result.scores.len(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn test_command_classifier_reports_failure() {
        let mut cmd = CommandClassifier::new(
            "sh",
            vec!["-c".into(), "echo model exploded >&2; exit 3".into(), "sh".into()],
        );
        let err = cmd
            .analyze(Path::new("x.jpg"), &AnalyzeRequest::emotion(DetectorBackend::Skip))
            .unwrap_err();
        match err {
            ClassifierError::CommandFailed { stderr, .. } => assert_eq!(stderr, "model exploded"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_command_classifier_rejects_garbage() {
        let mut cmd = CommandClassifier::new("sh", vec!["-c".into(), "echo not json".into(), "sh".into()]);
        let err = cmd
            .analyze(Path::new("x.jpg"), &AnalyzeRequest::emotion(DetectorBackend::Skip))
            .unwrap_err();
        assert!(matches!(err, ClassifierError::MalformedResponse(_)));
    }
}
