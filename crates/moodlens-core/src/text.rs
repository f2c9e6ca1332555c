//! Localized user-facing strings for the page.

use crate::emotion::Locale;

/// Every fixed string the page shows, for one locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiText {
    pub page_title: &'static str,
    pub page_intro: &'static str,
    pub camera_tab: &'static str,
    pub upload_tab: &'static str,
    pub camera_heading: &'static str,
    pub camera_info: &'static str,
    pub camera_on: &'static str,
    pub camera_off: &'static str,
    pub camera_disabled: &'static str,
    pub take_photo: &'static str,
    pub snapshot_taken: &'static str,
    pub snapshot_cleared: &'static str,
    pub no_snapshot: &'static str,
    pub analyze_button: &'static str,
    pub upload_heading: &'static str,
    pub upload_info: &'static str,
    pub upload_label: &'static str,
    pub captured_caption: &'static str,
    pub uploaded_caption: &'static str,
    pub analyzing: &'static str,
    pub dominant_label: &'static str,
    pub scores_heading: &'static str,
    /// Prefix for analysis failures; the error detail follows.
    pub analysis_error: &'static str,
    pub unsupported_upload: &'static str,
    pub unreadable_upload: &'static str,
    pub camera_error: &'static str,
    pub help_heading: &'static str,
    pub help_steps: [&'static str; 3],
    pub emotions_heading: &'static str,
    pub tips_heading: &'static str,
    pub tips: [&'static str; 3],
    pub footer: &'static str,
}

impl UiText {
    pub fn for_locale(locale: Locale) -> &'static UiText {
        match locale {
            Locale::Ko => &TEXT_KO,
            Locale::En => &TEXT_EN,
        }
    }

    /// Localized message for a failed analysis.
    pub fn analysis_failed(&self, detail: &str) -> String {
        format!("{}: {detail}", self.analysis_error)
    }
}

static TEXT_KO: UiText = UiText {
    page_title: "😊 감정 인식 앱",
    page_intro: "얼굴 사진을 통해 감정을 분석하고 피드백을 제공합니다.",
    camera_tab: "📷 카메라로 촬영",
    upload_tab: "📁 이미지 업로드",
    camera_heading: "카메라로 얼굴 사진 촬영",
    camera_info: "카메라를 활성화하고 촬영 버튼을 클릭하세요.",
    camera_on: "📷 카메라 켜기",
    camera_off: "❌ 카메라 끄기",
    camera_disabled: "카메라가 꺼져 있습니다.",
    take_photo: "사진 촬영",
    snapshot_taken: "사진이 촬영되었습니다.",
    snapshot_cleared: "사진이 지워졌습니다.",
    no_snapshot: "먼저 사진을 촬영하세요.",
    analyze_button: "🔍 감정 분석하기",
    upload_heading: "이미지 파일 업로드",
    upload_info: "JPG, JPEG, PNG 형식의 얼굴 사진을 업로드하세요.",
    upload_label: "이미지 선택",
    captured_caption: "촬영된 이미지",
    uploaded_caption: "업로드된 이미지",
    analyzing: "감정 분석 중...",
    dominant_label: "주요 감정",
    scores_heading: "📊 감정 분석 결과",
    analysis_error: "감정 분석 중 오류가 발생했습니다",
    unsupported_upload: "지원하지 않는 파일 형식입니다. JPG, JPEG, PNG 파일만 업로드할 수 있습니다.",
    unreadable_upload: "이미지를 열 수 없습니다",
    camera_error: "카메라 오류가 발생했습니다",
    help_heading: "ℹ️ 사용 방법",
    help_steps: [
        "카메라로 촬영(on, snap, analyze) 또는 이미지 업로드(upload <파일>)를 선택하세요.",
        "얼굴이 잘 보이도록 사진을 촬영하거나 업로드하세요.",
        "자동으로 감정이 분석되고 결과가 표시됩니다.",
    ],
    emotions_heading: "인식 가능한 감정",
    tips_heading: "📝 팁",
    tips: [
        "얼굴이 정면을 향하도록 촬영하세요",
        "조명이 적절한 환경에서 촬영하세요",
        "얼굴이 가려지지 않도록 하세요",
    ],
    footer: "Powered by ONNX Runtime & moodlens",
};

static TEXT_EN: UiText = UiText {
    page_title: "😊 Emotion Recognition",
    page_intro: "Analyzes the emotion in a face photo and gives you feedback.",
    camera_tab: "📷 Take a photo",
    upload_tab: "📁 Upload an image",
    camera_heading: "Take a face photo with the camera",
    camera_info: "Turn the camera on and press the capture button.",
    camera_on: "📷 Camera on",
    camera_off: "❌ Camera off",
    camera_disabled: "The camera is off.",
    take_photo: "Take photo",
    snapshot_taken: "Photo taken.",
    snapshot_cleared: "Photo cleared.",
    no_snapshot: "Take a photo first.",
    analyze_button: "🔍 Analyze emotion",
    upload_heading: "Upload an image file",
    upload_info: "Upload a JPG, JPEG or PNG face photo.",
    upload_label: "Choose image",
    captured_caption: "Captured image",
    uploaded_caption: "Uploaded image",
    analyzing: "Analyzing emotion...",
    dominant_label: "Dominant emotion",
    scores_heading: "📊 Emotion scores",
    analysis_error: "An error occurred during emotion analysis",
    unsupported_upload: "Unsupported file type. Only JPG, JPEG and PNG files can be uploaded.",
    unreadable_upload: "Could not open the image",
    camera_error: "Camera error",
    help_heading: "ℹ️ How to use",
    help_steps: [
        "Use the camera (on, snap, analyze) or upload an image (upload <file>).",
        "Take or upload a photo where your face is clearly visible.",
        "The emotion is analyzed automatically and the result is shown.",
    ],
    emotions_heading: "Recognizable emotions",
    tips_heading: "📝 Tips",
    tips: [
        "Face the camera directly",
        "Use good lighting",
        "Keep your face uncovered",
    ],
    footer: "Powered by ONNX Runtime & moodlens",
};
