use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span, Text},
};

use super::theme::Theme;

pub fn build_help_text() -> Text<'static> {
    let mut lines = Vec::new();

    lines.push(Line::from(Span::styled(
        "Key bindings",
        Style::default()
            .fg(Theme::accent())
            .add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(""));

    lines.push(section_title("Global"));
    lines.extend(section_lines(&[
        "q: Quit",
        "?: Toggle help",
        "Up/Down: Move selection",
        "esc: Back",
    ]));

    lines.push(Line::from(""));
    lines.push(section_title("Projects"));
    lines.extend(section_lines(&[
        "Enter: Open sessions",
        "space: Start/Stop timer",
        "s: Stop the running timer with a note",
        "n: New project",
        "r: Rename project",
        "d: Delete project",
        "v: Drop a cut session onto this project",
        "C: Clear all sessions",
        "X: Delete all projects",
    ]));

    lines.push(Line::from(""));
    lines.push(section_title("Sessions"));
    lines.extend(section_lines(&[
        "space: Stop running session / resume a finished one",
        "a: Add a manual entry",
        "e: Edit start, end and note",
        "n: Edit note",
        "d: Delete session",
        "x: Cut session (move it with v on another project)",
    ]));

    lines.push(Line::from(""));
    lines.push(section_title("Popups"));
    lines.extend(section_lines(&[
        "Type to edit, Enter save, Esc cancel",
        "Entry form: Tab switch field, times as YYYY-MM-DD HH:MM:SS",
        "Confirm: y to confirm, n or Esc to cancel",
    ]));

    Text::from(lines)
}

fn section_title(title: &str) -> Line<'static> {
    Line::from(Span::styled(
        format!("  {title}"),
        Style::default()
            .fg(Theme::secondary())
            .add_modifier(Modifier::BOLD),
    ))
}

fn section_lines(items: &[&str]) -> Vec<Line<'static>> {
    items
        .iter()
        .map(|item| {
            Line::from(Span::styled(
                format!("  - {item}"),
                Style::default().fg(Theme::text()),
            ))
        })
        .collect()
}
