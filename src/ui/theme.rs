use ratatui::style::Color;

/// Unified color theme for the application
pub struct Theme;

impl Theme {
    /// Primary branding color
    pub fn primary() -> Color {
        Color::Magenta
    }

    /// Borders
    pub fn secondary() -> Color {
        Color::Cyan
    }

    /// Running timer
    pub fn active() -> Color {
        Color::LightGreen
    }

    /// Status messages and rejected input
    pub fn warn() -> Color {
        Color::Yellow
    }

    pub fn highlight() -> Color {
        Color::Cyan
    }

    pub fn selection_marker() -> Color {
        Color::Green
    }

    pub fn dim() -> Color {
        Color::DarkGray
    }

    pub fn text() -> Color {
        Color::White
    }

    /// Durations and totals
    pub fn accent() -> Color {
        Color::LightBlue
    }
}
