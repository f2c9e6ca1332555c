//! Paints page views to a terminal.

use moodlens_core::page::ShownImage;
use moodlens_core::render::{parse_hex_color, ResultView};
use moodlens_core::{Notice, PageView, Sidebar, UiText};
use std::io::{self, Write};

const BAR_WIDTH: usize = 30;
const NAME_WIDTH: usize = 12;

pub struct Painter<W> {
    out: W,
    color: bool,
}

impl<W: Write> Painter<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self { out, color }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn header(&mut self, text: &UiText) -> io::Result<()> {
        writeln!(self.out, "{}", self.bold(text.page_title))?;
        writeln!(self.out, "{}", text.page_intro)?;
        writeln!(self.out)?;
        writeln!(self.out, "[{}] {}", text.camera_tab, text.camera_heading)?;
        writeln!(self.out, "  {} : on", text.camera_on)?;
        writeln!(self.out, "  {} : off", text.camera_off)?;
        writeln!(self.out, "  {} : snap [file], clear", text.take_photo)?;
        writeln!(self.out, "  {} : analyze", text.analyze_button)?;
        writeln!(self.out, "[{}] {}", text.upload_tab, text.upload_heading)?;
        writeln!(self.out, "  {}: upload <file>", text.upload_label)?;
        writeln!(self.out, "  {}", text.upload_info)?;
        writeln!(self.out)
    }

    pub fn sidebar(&mut self, sidebar: &Sidebar) -> io::Result<()> {
        writeln!(self.out, "{}", self.bold(sidebar.heading))?;
        for (i, step) in sidebar.steps.iter().enumerate() {
            writeln!(self.out, "  {}. {step}", i + 1)?;
        }
        writeln!(self.out, "---")?;
        writeln!(self.out, "{}", self.bold(sidebar.emotions_heading))?;
        for emotion in &sidebar.emotions {
            writeln!(self.out, "  - {emotion}")?;
        }
        writeln!(self.out, "---")?;
        writeln!(self.out, "{}", self.bold(sidebar.tips_heading))?;
        for tip in &sidebar.tips {
            writeln!(self.out, "  - {tip}")?;
        }
        writeln!(self.out, "---")?;
        writeln!(self.out, "{}", self.dim(sidebar.footer))?;
        writeln!(self.out)
    }

    pub fn view(&mut self, view: &PageView, text: &UiText) -> io::Result<()> {
        for notice in &view.notices {
            match notice {
                Notice::Info(msg) => writeln!(self.out, "ℹ️  {msg}")?,
                Notice::Error(msg) => writeln!(self.out, "{}", self.paint(&format!("⛔ {msg}"), (220, 20, 60)))?,
            }
        }
        if let Some(image) = &view.image {
            self.image(image)?;
        }
        if let Some(result) = &view.result {
            self.result(result, text)?;
        }
        self.out.flush()
    }

    /// Progress line shown while the classifier runs.
    pub fn analyzing(&mut self, text: &UiText) -> io::Result<()> {
        writeln!(self.out, "⏳ {}", self.dim(text.analyzing))?;
        self.out.flush()
    }

    fn image(&mut self, image: &ShownImage) -> io::Result<()> {
        writeln!(self.out, "🖼️  {} ({}×{})", image.caption, image.width, image.height)
    }

    fn result(&mut self, result: &ResultView, text: &UiText) -> io::Result<()> {
        let head = &result.headline;
        writeln!(self.out)?;
        writeln!(
            self.out,
            "{} {}: {}",
            head.emoji,
            text.dominant_label,
            self.bold(head.name)
        )?;
        let rgb = parse_hex_color(head.color).unwrap_or((128, 128, 128));
        writeln!(self.out, "{}", self.paint(head.message, rgb))?;
        writeln!(self.out, "---")?;
        writeln!(self.out, "{}", self.bold(text.scores_heading))?;

        for row in &result.rows {
            writeln!(
                self.out,
                "{} {}  {}  {}",
                row.emoji,
                pad(&row.name, NAME_WIDTH),
                bar(row.fraction),
                row.caption
            )?;
        }
        writeln!(self.out)
    }

    fn paint(&self, s: &str, (r, g, b): (u8, u8, u8)) -> String {
        if self.color {
            format!("\x1b[38;2;{r};{g};{b}m{s}\x1b[0m")
        } else {
            s.to_string()
        }
    }

    fn bold(&self, s: &str) -> String {
        if self.color {
            format!("\x1b[1m{s}\x1b[0m")
        } else {
            s.to_string()
        }
    }

    fn dim(&self, s: &str) -> String {
        if self.color {
            format!("\x1b[2m{s}\x1b[0m")
        } else {
            s.to_string()
        }
    }
}

/// Proportional bar of `BAR_WIDTH` cells.
fn bar(fraction: f32) -> String {
    let filled = ((fraction.clamp(0.0, 1.0) * BAR_WIDTH as f32).round() as usize).min(BAR_WIDTH);
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

/// Right-pad to `width` display columns, counting wide (Hangul/CJK) characters as two.
fn pad(s: &str, width: usize) -> String {
    let cols: usize = s.chars().map(|c| if is_wide(c) { 2 } else { 1 }).sum();
    format!("{s}{}", " ".repeat(width.saturating_sub(cols)))
}

fn is_wide(c: char) -> bool {
    matches!(c as u32,
        0x1100..=0x115F | 0x2E80..=0xA4CF | 0xAC00..=0xD7A3 | 0xF900..=0xFAFF | 0xFF00..=0xFF60)
}
