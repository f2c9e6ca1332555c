use anyhow::{Context, Result};
use clap::ValueEnum;
use moodlens_core::{DetectorBackend, FerLayout, Locale};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Which classifier implementation scores the photos.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierKind {
    /// SCRFD + expression model via ONNX Runtime.
    #[default]
    Onnx,
    /// External program printing JSON.
    Command,
}

impl FromStr for ClassifierKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Self as ValueEnum>::from_str(s, true)
    }
}

/// Runtime configuration.
///
/// Built from defaults, then `moodlens.toml` (if present), then `MOODLENS_*`
/// environment variables, then command-line flags.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub locale: Locale,
    pub classifier: ClassifierKind,
    /// Directory containing the ONNX model files.
    pub model_dir: PathBuf,
    pub detector_backend: DetectorBackend,
    pub fer_layout: FerLayout,
    /// Command line for `classifier = "command"`.
    pub command: Option<String>,
    /// V4L2 device path.
    pub camera_device: String,
    pub camera_width: u32,
    pub camera_height: u32,
    /// Frames discarded before each snapshot (auto-exposure settling).
    pub warmup_frames: usize,
    /// Where transient analysis images go; system temp dir when unset.
    pub temp_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: Locale::default(),
            classifier: ClassifierKind::default(),
            model_dir: moodlens_core::default_model_dir(),
            detector_backend: DetectorBackend::default(),
            fer_layout: FerLayout::default(),
            command: None,
            camera_device: "/dev/video0".to_string(),
            camera_width: 640,
            camera_height: 480,
            warmup_frames: 4,
            temp_dir: None,
        }
    }
}

impl Config {
    /// Load from `path`, or from the default config file when it exists,
    /// then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default = default_config_path();
                if default.exists() {
                    Self::from_file(&default)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    /// Apply `MOODLENS_*` overrides. Unparseable values are ignored with a warning.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = env_parse(&lookup, "MOODLENS_LOCALE") {
            self.locale = v;
        }
        if let Some(v) = env_parse(&lookup, "MOODLENS_CLASSIFIER") {
            self.classifier = v;
        }
        if let Some(v) = lookup("MOODLENS_MODEL_DIR") {
            self.model_dir = PathBuf::from(v);
        }
        if let Some(v) = env_parse(&lookup, "MOODLENS_DETECTOR_BACKEND") {
            self.detector_backend = v;
        }
        if let Some(v) = lookup("MOODLENS_CLASSIFIER_COMMAND") {
            self.command = Some(v);
        }
        if let Some(v) = lookup("MOODLENS_CAMERA_DEVICE") {
            self.camera_device = v;
        }
        if let Some(v) = env_parse(&lookup, "MOODLENS_WARMUP_FRAMES") {
            self.warmup_frames = v;
        }
        if let Some(v) = lookup("MOODLENS_TEMP_DIR") {
            self.temp_dir = Some(PathBuf::from(v));
        }
    }

    /// Path to the SCRFD detection model.
    pub fn detector_model_path(&self) -> PathBuf {
        self.model_dir.join(moodlens_core::DETECTOR_MODEL_FILE)
    }

    /// Path to the facial-expression model.
    pub fn fer_model_path(&self) -> PathBuf {
        self.model_dir.join(moodlens_core::FER_MODEL_FILE)
    }
}

/// `$XDG_CONFIG_HOME/moodlens/moodlens.toml`, or `~/.config/moodlens/moodlens.toml`.
pub fn default_config_path() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        })
        .join("moodlens")
        .join("moodlens.toml")
}

fn env_parse<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparseable environment override");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.locale, Locale::Ko);
        assert_eq!(config.classifier, ClassifierKind::Onnx);
        assert_eq!(config.detector_backend, DetectorBackend::Scrfd);
        assert!(config.detector_model_path().ends_with("det_10g.onnx"));
    }

    #[test]
    fn test_toml_partial_file() {
        let config: Config = toml::from_str(
            r#"
            locale = "en"
            classifier = "command"
            command = "python3 classify.py"
            detector_backend = "skip"
            fer_layout = "nchw"
            camera_width = 1280
            "#,
        )
        .unwrap();
        assert_eq!(config.locale, Locale::En);
        assert_eq!(config.classifier, ClassifierKind::Command);
        assert_eq!(config.command.as_deref(), Some("python3 classify.py"));
        assert_eq!(config.detector_backend, DetectorBackend::Skip);
        assert_eq!(config.fer_layout, FerLayout::Nchw);
        assert_eq!(config.camera_width, 1280);
        assert_eq!(config.camera_height, 480);
    }

    #[test]
    fn test_toml_rejects_unknown_keys() {
        assert!(toml::from_str::<Config>("colour = \"red\"").is_err());
    }

    #[test]
    fn test_from_file_and_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("moodlens.toml");
        std::fs::write(&path, "warmup_frames = 9\n").unwrap();
        assert_eq!(Config::from_file(&path).unwrap().warmup_frames, 9);
        assert!(Config::from_file(&dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_env(lookup(&[
            ("MOODLENS_LOCALE", "en"),
            ("MOODLENS_CLASSIFIER", "command"),
            ("MOODLENS_MODEL_DIR", "/opt/models"),
            ("MOODLENS_DETECTOR_BACKEND", "skip"),
            ("MOODLENS_CAMERA_DEVICE", "/dev/video4"),
            ("MOODLENS_WARMUP_FRAMES", "2"),
        ]));
        assert_eq!(config.locale, Locale::En);
        assert_eq!(config.classifier, ClassifierKind::Command);
        assert_eq!(config.fer_model_path(), PathBuf::from("/opt/models/facial_expression.onnx"));
        assert_eq!(config.detector_backend, DetectorBackend::Skip);
        assert_eq!(config.camera_device, "/dev/video4");
        assert_eq!(config.warmup_frames, 2);
    }

    #[test]
    fn test_bad_env_values_are_ignored() {
        let mut config = Config::default();
        config.apply_env(lookup(&[("MOODLENS_WARMUP_FRAMES", "lots"), ("MOODLENS_LOCALE", "fr")]));
        assert_eq!(config.warmup_frames, 4);
        assert_eq!(config.locale, Locale::Ko);
    }
}
