//! Result renderer: turns an [`AnalysisResult`] into a display model.
//!
//! The view is plain data so any front-end can paint it; the CLI paints it
//! with ANSI colors.

use crate::emotion::{feedback_for, EmotionLabel, Locale, UNKNOWN_EMOJI};
use crate::types::AnalysisResult;
use serde::Serialize;

/// Dominant-emotion banner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Headline {
    /// Label as declared by the classifier, even when it fell back to neutral.
    pub label: String,
    pub emoji: &'static str,
    pub name: &'static str,
    pub message: &'static str,
    pub color: &'static str,
}

/// One line of the ranked score list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreRow {
    pub label: String,
    pub emoji: &'static str,
    pub name: String,
    pub score: f32,
    /// Bar fill in [0, 1].
    pub fraction: f32,
    /// Two-decimal percentage, e.g. `"80.00%"`.
    pub caption: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultView {
    pub headline: Headline,
    /// Sorted by descending score.
    pub rows: Vec<ScoreRow>,
}

/// Build the display model for one result.
pub fn render(result: &AnalysisResult, locale: Locale) -> ResultView {
    let feedback = feedback_for(&result.dominant, locale);
    let headline = Headline {
        label: result.dominant.clone(),
        emoji: feedback.emoji,
        name: feedback.name,
        message: feedback.message,
        color: feedback.color,
    };

    let mut rows: Vec<ScoreRow> = result
        .scores
        .iter()
        .map(|(label, &score)| score_row(label, score, locale))
        .collect();
    // Stable: equal scores keep the map's label order.
    rows.sort_by(|a, b| b.score.total_cmp(&a.score));

    ResultView { headline, rows }
}

fn score_row(label: &str, score: f32, locale: Locale) -> ScoreRow {
    let (emoji, name) = match EmotionLabel::from_label(label) {
        Some(known) => {
            let fb = known.feedback(locale);
            (fb.emoji, fb.name.to_string())
        }
        None => (UNKNOWN_EMOJI, label.to_string()),
    };

    let fraction = if score.is_finite() {
        (score / 100.0).clamp(0.0, 1.0)
    } else {
        0.0
    };

    ScoreRow {
        label: label.to_string(),
        emoji,
        name,
        score,
        fraction,
        caption: format!("{score:.2}%"),
    }
}

/// Parse `#RRGGBB` into its components.
pub fn parse_hex_color(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn result(dominant: &str, pairs: &[(&str, f32)]) -> AnalysisResult {
        AnalysisResult {
            scores: pairs
                .iter()
                .map(|(l, s)| (l.to_string(), *s))
                .collect::<BTreeMap<_, _>>(),
            dominant: dominant.to_string(),
            region: None,
            face_confidence: None,
        }
    }

    #[test]
    fn test_happy_ranked_before_sad() {
        let view = render(&result("happy", &[("happy", 80.0), ("sad", 20.0)]), Locale::Ko);
        let labels: Vec<&str> = view.rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["happy", "sad"]);

        let happy = EmotionLabel::Happy.feedback(Locale::Ko);
        assert_eq!(view.headline.emoji, happy.emoji);
        assert_eq!(view.headline.message, happy.message);
        assert_eq!(view.headline.color, happy.color);
    }

    #[test]
    fn test_rows_sorted_descending() {
        let view = render(
            &result(
                "surprise",
                &[("angry", 5.0), ("surprise", 60.0), ("fear", 30.0), ("neutral", 5.0)],
            ),
            Locale::En,
        );
        let scores: Vec<f32> = view.rows.iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![60.0, 30.0, 5.0, 5.0]);
        // Tie keeps alphabetical label order.
        assert_eq!(view.rows[2].label, "angry");
        assert_eq!(view.rows[3].label, "neutral");
    }

    #[test]
    fn test_unknown_dominant_falls_back_to_neutral() {
        let view = render(&result("contempt", &[("contempt", 90.0), ("happy", 10.0)]), Locale::Ko);
        let neutral = EmotionLabel::Neutral.feedback(Locale::Ko);
        assert_eq!(view.headline.emoji, neutral.emoji);
        assert_eq!(view.headline.name, neutral.name);
        assert_eq!(view.headline.label, "contempt");
    }

    #[test]
    fn test_unknown_row_uses_placeholder() {
        let view = render(&result("happy", &[("contempt", 12.0)]), Locale::Ko);
        assert_eq!(view.rows[0].emoji, UNKNOWN_EMOJI);
        assert_eq!(view.rows[0].name, "contempt");
    }

    #[test]
    fn test_declared_dominant_wins_over_argmax() {
        let view = render(&result("sad", &[("happy", 95.0), ("sad", 5.0)]), Locale::En);
        assert_eq!(view.headline.name, "Sad");
        assert_eq!(view.rows[0].label, "happy");
    }

    #[test]
    fn test_caption_and_fraction() {
        let view = render(&result("happy", &[("happy", 80.0), ("sad", 12.3456)]), Locale::Ko);
        assert_eq!(view.rows[0].caption, "80.00%");
        assert_eq!(view.rows[1].caption, "12.35%");
        assert!((view.rows[0].fraction - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_fraction_is_clamped() {
        let view = render(&result("happy", &[("happy", 120.0), ("sad", -3.0)]), Locale::Ko);
        assert_eq!(view.rows[0].fraction, 1.0);
        assert_eq!(view.rows[1].fraction, 0.0);
    }

    #[test]
    fn test_empty_scores_render_headline_only() {
        let view = render(&result("neutral", &[]), Locale::Ko);
        assert!(view.rows.is_empty());
        assert_eq!(view.headline.name, "무표정");
    }

    #[test]
    fn test_nan_score_keeps_a_total_order() {
        let scores = &[("angry", f32::NAN), ("happy", 50.0), ("sad", 20.0), ("fear", 35.0)];
        let view = render(&result("happy", scores), Locale::En);
        let finite: Vec<&str> = view
            .rows
            .iter()
            .filter(|r| r.score.is_finite())
            .map(|r| r.label.as_str())
            .collect();
        assert_eq!(finite, vec!["happy", "fear", "sad"]);
        let angry = view.rows.iter().find(|r| r.label == "angry").unwrap();
        assert_eq!(angry.fraction, 0.0);
        let again = render(&result("happy", scores), Locale::En);
        let labels = |v: &ResultView| v.rows.iter().map(|r| r.label.clone()).collect::<Vec<_>>();
        assert_eq!(labels(&view), labels(&again));
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#FFD700"), Some((255, 215, 0)));
        assert_eq!(parse_hex_color("#808080"), Some((128, 128, 128)));
        assert_eq!(parse_hex_color("FFD700"), None);
        assert_eq!(parse_hex_color("#FFF"), None);
        assert_eq!(parse_hex_color("#GG0000"), None);
    }
}
