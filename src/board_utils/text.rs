use time::{Date, Duration};
use time::macros::format_description;

pub const MAX_TITLE_LINES: usize = 3;

/// Width of a run of text at a given font size, supplied by whatever renders it.
pub trait TextMeasure {
    fn text_width(&self, text: &str, font_size: f32) -> f32;
}

/// Measures every character as the same fraction of the font size. Good enough
/// for headless use and deterministic in tests.
#[derive(Copy, Clone, Debug)]
pub struct MonospaceMeasure {
    pub advance: f32,
}

impl Default for MonospaceMeasure {
    fn default() -> Self {
        Self { advance: 0.6 }
    }
}

impl TextMeasure for MonospaceMeasure {
    fn text_width(&self, text: &str, font_size: f32) -> f32 {
        text.chars().count() as f32 * font_size * self.advance
    }
}

/// Greedy word wrap capped at `max_lines`.
///
/// Words are packed while the measured line stays within `max_width`. Once the
/// last permitted line starts, every remaining word is appended to it verbatim,
/// so overflowing titles are never truncated, just left unwrapped.
pub fn wrap_text(
    measure: &dyn TextMeasure,
    text: &str,
    max_width: f32,
    font_size: f32,
    max_lines: usize,
) -> Vec<String> {
    if max_lines <= 1 {
        return vec![text.trim().to_string()];
    }
    let words: Vec<&str> = text.split(' ').collect();
    let mut lines: Vec<String> = Vec::new();
    let mut line = String::new();
    for (n, word) in words.iter().enumerate() {
        let candidate = format!("{line}{word} ");
        if n > 0 && measure.text_width(&candidate, font_size) > max_width {
            lines.push(line.trim().to_string());
            if lines.len() >= max_lines - 1 {
                lines.push(words[n..].join(" ").trim().to_string());
                return lines;
            }
            line = format!("{word} ");
        } else {
            line = candidate;
        }
    }
    lines.push(line.trim().to_string());
    lines
}

/// Splits a `YYYY-MM-DDTHH:MM` value into a day label and the remaining time parts.
/// The day reads "Today" or "Tomorrow" relative to `today`, otherwise `YYYY.MM.DD`.
pub fn date_label_lines(date: &str, today: Date) -> Vec<String> {
    if date.is_empty() {
        return Vec::new();
    }
    let dotted = |d: Date| {
        let fmt = format_description!("[year].[month].[day]");
        d.format(&fmt).unwrap_or_default()
    };
    let mut parts = date.split('T');
    let day = parts.next().unwrap_or_default().replace('-', ".");
    let label = if day == dotted(today) {
        "Today".to_string()
    } else if today.checked_add(Duration::days(1)).map(dotted).as_deref() == Some(day.as_str()) {
        "Tomorrow".to_string()
    } else {
        day
    };
    std::iter::once(label).chain(parts.map(str::to_string)).collect()
}
