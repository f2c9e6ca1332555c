//! Emotion labels and their display metadata.
//!
//! The feedback tables are plain `static` data: one row per label and locale,
//! built at compile time and never mutated.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Emoji used in the ranked list for labels outside [`EmotionLabel::ALL`].
pub const UNKNOWN_EMOJI: &str = "😶";

/// The closed set of emotions the feedback table knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionLabel {
    Happy,
    Sad,
    Angry,
    Surprise,
    Fear,
    Disgust,
    Neutral,
}

impl EmotionLabel {
    /// All labels in display order.
    pub const ALL: [EmotionLabel; 7] = [
        EmotionLabel::Happy,
        EmotionLabel::Sad,
        EmotionLabel::Angry,
        EmotionLabel::Surprise,
        EmotionLabel::Fear,
        EmotionLabel::Disgust,
        EmotionLabel::Neutral,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EmotionLabel::Happy => "happy",
            EmotionLabel::Sad => "sad",
            EmotionLabel::Angry => "angry",
            EmotionLabel::Surprise => "surprise",
            EmotionLabel::Fear => "fear",
            EmotionLabel::Disgust => "disgust",
            EmotionLabel::Neutral => "neutral",
        }
    }

    /// Parse a classifier label. Matching is exact, as classifiers emit lowercase names.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.as_str() == label)
    }

    /// Display metadata for this label in the given locale.
    pub fn feedback(self, locale: Locale) -> &'static EmotionFeedback {
        let table = match locale {
            Locale::Ko => &FEEDBACK_KO,
            Locale::En => &FEEDBACK_EN,
        };
        &table[self as usize]
    }
}

impl fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display language for all user-facing text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Ko,
    En,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ko" | "ko-kr" | "korean" => Ok(Locale::Ko),
            "en" | "en-us" | "english" => Ok(Locale::En),
            other => Err(format!("unsupported locale: {other} (expected ko or en)")),
        }
    }
}

/// Immutable display record for one emotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmotionFeedback {
    pub emoji: &'static str,
    /// Localized display name.
    pub name: &'static str,
    /// Localized feedback sentence.
    pub message: &'static str,
    /// Display color as `#RRGGBB`.
    pub color: &'static str,
}

/// Look up the feedback record for a raw classifier label.
///
/// Labels outside the known set resolve to the neutral record.
pub fn feedback_for(label: &str, locale: Locale) -> &'static EmotionFeedback {
    EmotionLabel::from_label(label)
        .unwrap_or(EmotionLabel::Neutral)
        .feedback(locale)
}

// Rows follow the declaration order of `EmotionLabel`.
static FEEDBACK_KO: [EmotionFeedback; 7] = [
    EmotionFeedback {
        emoji: "😊",
        name: "행복",
        message: "행복해 보이시네요! 긍정적인 에너지가 느껴집니다.",
        color: "#FFD700",
    },
    EmotionFeedback {
        emoji: "😢",
        name: "슬픔",
        message: "슬퍼 보이시네요. 힘내세요! 좋은 일이 생길 거예요.",
        color: "#4169E1",
    },
    EmotionFeedback {
        emoji: "😠",
        name: "화남",
        message: "화가 나 보이시네요. 심호흡을 하고 진정하세요.",
        color: "#DC143C",
    },
    EmotionFeedback {
        emoji: "😲",
        name: "놀람",
        message: "놀라신 것 같네요! 무슨 일이 있으셨나요?",
        color: "#FF8C00",
    },
    EmotionFeedback {
        emoji: "😨",
        name: "두려움",
        message: "두려워 보이시네요. 괜찮으실 거예요.",
        color: "#9370DB",
    },
    EmotionFeedback {
        emoji: "🤢",
        name: "혐오",
        message: "불쾌해 보이시네요. 기분 전환이 필요할 것 같아요.",
        color: "#228B22",
    },
    EmotionFeedback {
        emoji: "😐",
        name: "무표정",
        message: "평온한 상태시네요. 안정적인 감정 상태입니다.",
        color: "#808080",
    },
];

static FEEDBACK_EN: [EmotionFeedback; 7] = [
    EmotionFeedback {
        emoji: "😊",
        name: "Happy",
        message: "You look happy! There's a lot of positive energy here.",
        color: "#FFD700",
    },
    EmotionFeedback {
        emoji: "😢",
        name: "Sad",
        message: "You look sad. Hang in there, something good is coming.",
        color: "#4169E1",
    },
    EmotionFeedback {
        emoji: "😠",
        name: "Angry",
        message: "You look angry. Take a deep breath and calm down.",
        color: "#DC143C",
    },
    EmotionFeedback {
        emoji: "😲",
        name: "Surprised",
        message: "You look surprised! Did something happen?",
        color: "#FF8C00",
    },
    EmotionFeedback {
        emoji: "😨",
        name: "Fear",
        message: "You look afraid. It's going to be okay.",
        color: "#9370DB",
    },
    EmotionFeedback {
        emoji: "🤢",
        name: "Disgust",
        message: "You look uncomfortable. Maybe it's time for a change of mood.",
        color: "#228B22",
    },
    EmotionFeedback {
        emoji: "😐",
        name: "Neutral",
        message: "You look calm. Your emotional state is steady.",
        color: "#808080",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_label_roundtrips_every_label() {
        for label in EmotionLabel::ALL {
            assert_eq!(EmotionLabel::from_label(label.as_str()), Some(label));
        }
    }

    #[test]
    fn test_unknown_label_falls_back_to_neutral() {
        let neutral = EmotionLabel::Neutral.feedback(Locale::Ko);
        assert_eq!(feedback_for("contempt", Locale::Ko), neutral);
        assert_eq!(feedback_for("", Locale::Ko), neutral);
        assert_eq!(feedback_for("HAPPY", Locale::Ko), neutral);
    }

    #[test]
    fn test_table_rows_match_label_order() {
        assert_eq!(EmotionLabel::Happy.feedback(Locale::Ko).name, "행복");
        assert_eq!(EmotionLabel::Disgust.feedback(Locale::Ko).emoji, "🤢");
        assert_eq!(EmotionLabel::Neutral.feedback(Locale::En).name, "Neutral");
        assert_eq!(EmotionLabel::Angry.feedback(Locale::En).color, "#DC143C");
    }

    #[test]
    fn test_locales_share_emoji_and_color() {
        for label in EmotionLabel::ALL {
            let ko = label.feedback(Locale::Ko);
            let en = label.feedback(Locale::En);
            assert_eq!(ko.emoji, en.emoji, "{label}");
            assert_eq!(ko.color, en.color, "{label}");
        }
    }

    #[test]
    fn test_colors_are_hex_triplets() {
        for label in EmotionLabel::ALL {
            let color = label.feedback(Locale::Ko).color;
            assert_eq!(color.len(), 7);
            assert!(color.starts_with('#'));
            assert!(u32::from_str_radix(&color[1..], 16).is_ok(), "{color}");
        }
    }

    #[test]
    fn test_locale_parse() {
        assert_eq!("ko".parse::<Locale>(), Ok(Locale::Ko));
        assert_eq!("EN".parse::<Locale>(), Ok(Locale::En));
        assert!("fr".parse::<Locale>().is_err());
    }
}
