use ratatui::style::Color;

use punchcard::color::hsl_to_rgb;

use super::theme::Theme;

pub fn clamp_name(value: &str, width: usize) -> String {
    let value_len = value.chars().count();
    if value_len <= width {
        return format!("{value:<width$}", width = width);
    }
    let trimmed = value
        .chars()
        .take(width.saturating_sub(2))
        .collect::<String>();
    format!("{trimmed}..")
}

/// Terminal color for a stored `hsl(...)` token; unknown tokens fall back to the accent.
pub fn project_color(token: &str) -> Color {
    match hsl_to_rgb(token) {
        Some((r, g, b)) => Color::Rgb(r, g, b),
        None => Theme::accent(),
    }
}
