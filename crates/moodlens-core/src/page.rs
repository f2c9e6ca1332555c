//! Page controller: session state for the camera and upload surfaces.
//!
//! Every user interaction is one [`PageEvent`]. The controller applies it to
//! the [`SessionState`], runs the analyzer when the event calls for it, and
//! returns the [`PageView`] to paint.
//!
//! States: camera off; camera on and not captured; camera on and captured.
//! Turning the camera on or off always clears the captured flag.

use crate::adapter::Analyzer;
use crate::classifier::EmotionClassifier;
use crate::emotion::{EmotionLabel, Locale};
use crate::render::{render, ResultView};
use crate::text::UiText;
use image::DynamicImage;
use std::path::Path;
use thiserror::Error;

/// File extensions accepted by the upload surface (lowercase).
pub const UPLOAD_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionState {
    pub camera_enabled: bool,
    pub capture_confirmed: bool,
}

/// A file handed to the upload surface.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug)]
pub enum PageEvent {
    CameraOn,
    CameraOff,
    /// A still from the camera widget. Ignored while the camera is off.
    Snapshot(DynamicImage),
    ClearSnapshot,
    ConfirmCapture,
    Upload(UploadedFile),
    /// The camera surface could not produce a still.
    CameraFailed(String),
}

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("unsupported file type: {0:?}")]
    UnsupportedExtension(String),
    #[error("cannot decode image: {0}")]
    Decode(#[from] image::ImageError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

/// The image shown next to the results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShownImage {
    pub caption: &'static str,
    pub width: u32,
    pub height: u32,
}

/// Everything one interaction produces.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageView {
    pub notices: Vec<Notice>,
    pub image: Option<ShownImage>,
    pub result: Option<ResultView>,
    /// True when the analyzer ran during this interaction.
    pub analyzed: bool,
}

impl PageView {
    fn info(message: &str) -> Self {
        Self {
            notices: vec![Notice::Info(message.to_string())],
            ..Self::default()
        }
    }

    fn error(message: String) -> Self {
        Self {
            notices: vec![Notice::Error(message)],
            ..Self::default()
        }
    }
}

/// Static help panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sidebar {
    pub heading: &'static str,
    pub steps: Vec<&'static str>,
    pub emotions_heading: &'static str,
    pub emotions: Vec<String>,
    pub tips_heading: &'static str,
    pub tips: Vec<&'static str>,
    pub footer: &'static str,
}

impl Sidebar {
    pub fn new(locale: Locale) -> Self {
        let text = UiText::for_locale(locale);
        let emotions = EmotionLabel::ALL
            .iter()
            .map(|label| {
                let local = label.feedback(locale);
                let english = label.feedback(Locale::En);
                if locale == Locale::En {
                    format!("{} {}", local.emoji, local.name)
                } else {
                    format!("{} {} ({})", local.emoji, local.name, english.name)
                }
            })
            .collect();

        Self {
            heading: text.help_heading,
            steps: text.help_steps.to_vec(),
            emotions_heading: text.emotions_heading,
            emotions,
            tips_heading: text.tips_heading,
            tips: text.tips.to_vec(),
            footer: text.footer,
        }
    }
}

/// Check an upload's file name against [`UPLOAD_EXTENSIONS`].
pub fn validate_upload_name(name: &str) -> Result<(), UploadError> {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if UPLOAD_EXTENSIONS.contains(&ext.as_str()) {
        Ok(())
    } else {
        Err(UploadError::UnsupportedExtension(ext))
    }
}

/// Validate and decode an upload.
pub fn decode_upload(file: &UploadedFile) -> Result<DynamicImage, UploadError> {
    validate_upload_name(&file.name)?;
    Ok(image::load_from_memory(&file.bytes)?)
}

pub struct PageController<C> {
    analyzer: Analyzer<C>,
    locale: Locale,
    state: SessionState,
    snapshot: Option<DynamicImage>,
}

impl<C: EmotionClassifier> PageController<C> {
    pub fn new(analyzer: Analyzer<C>, locale: Locale) -> Self {
        Self {
            analyzer,
            locale,
            state: SessionState::default(),
            snapshot: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn text(&self) -> &'static UiText {
        UiText::for_locale(self.locale)
    }

    pub fn has_snapshot(&self) -> bool {
        self.snapshot.is_some()
    }

    pub fn analyzer(&self) -> &Analyzer<C> {
        &self.analyzer
    }

    pub fn sidebar(&self) -> Sidebar {
        Sidebar::new(self.locale)
    }

    /// Apply one interaction and return what to show.
    pub fn handle(&mut self, event: PageEvent) -> PageView {
        let text = self.text();
        match event {
            PageEvent::CameraOn => {
                if !self.state.camera_enabled {
                    self.snapshot = None;
                }
                self.state = SessionState {
                    camera_enabled: true,
                    capture_confirmed: false,
                };
                tracing::debug!(state = ?self.state, "camera on");
                PageView::info(text.camera_info)
            }
            PageEvent::CameraOff => {
                self.state = SessionState::default();
                self.snapshot = None;
                tracing::debug!(state = ?self.state, "camera off");
                PageView::info(text.camera_disabled)
            }
            PageEvent::Snapshot(image) => {
                if !self.state.camera_enabled {
                    tracing::debug!("snapshot ignored, camera is off");
                    return PageView::info(text.camera_disabled);
                }
                self.snapshot = Some(image);
                if self.state.capture_confirmed {
                    self.analyze_snapshot()
                } else {
                    PageView::info(text.snapshot_taken)
                }
            }
            PageEvent::ClearSnapshot => {
                self.snapshot = None;
                PageView::info(text.snapshot_cleared)
            }
            PageEvent::ConfirmCapture => {
                if !self.state.camera_enabled {
                    return PageView::info(text.camera_disabled);
                }
                if self.snapshot.is_none() {
                    return PageView::info(text.no_snapshot);
                }
                self.state.capture_confirmed = true;
                self.analyze_snapshot()
            }
            PageEvent::Upload(file) => match decode_upload(&file) {
                Ok(image) => analyze_view(&mut self.analyzer, self.locale, &image, text.uploaded_caption),
                Err(UploadError::UnsupportedExtension(ext)) => {
                    tracing::info!(name = %file.name, ext = %ext, "upload rejected");
                    PageView::error(text.unsupported_upload.to_string())
                }
                Err(UploadError::Decode(e)) => {
                    tracing::warn!(name = %file.name, error = %e, "upload could not be decoded");
                    PageView::error(format!("{}: {e}", text.unreadable_upload))
                }
            },
            PageEvent::CameraFailed(detail) => {
                tracing::warn!(error = %detail, "camera snapshot failed");
                PageView::error(format!("{}: {detail}", text.camera_error))
            }
        }
    }

    fn analyze_snapshot(&mut self) -> PageView {
        let caption = self.text().captured_caption;
        match &self.snapshot {
            Some(image) => analyze_view(&mut self.analyzer, self.locale, image, caption),
            None => PageView::default(),
        }
    }
}

fn analyze_view<C: EmotionClassifier>(
    analyzer: &mut Analyzer<C>,
    locale: Locale,
    image: &DynamicImage,
    caption: &'static str,
) -> PageView {
    let text = UiText::for_locale(locale);
    let mut view = PageView {
        image: Some(ShownImage {
            caption,
            width: image.width(),
            height: image.height(),
        }),
        analyzed: true,
        ..PageView::default()
    };

    match analyzer.analyze(image) {
        Ok(result) => view.result = Some(render(&result, locale)),
        Err(e) => {
            tracing::error!(error = %e, "emotion analysis failed");
            view.notices.push(Notice::Error(text.analysis_failed(&e.to_string())));
        }
    }
    view
}
