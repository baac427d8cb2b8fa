use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span, Text},
};

use punchcard::timeutil::{format_date, format_duration, format_time, running_elapsed, total_time};

use super::helpers::clamp_name;
use super::theme::Theme;
use crate::app::App;

/// Session list of the selected project, newest first.
pub fn build_sessions_text(app: &App) -> Text<'_> {
    let mut lines = Vec::new();
    let Some(project) = app.selected_project() else {
        lines.push(Line::from("No project selected."));
        return Text::from(lines);
    };

    let sessions = app.visible_sessions();
    if sessions.is_empty() {
        lines.push(Line::from(
            "No time sessions yet. Press space to start or 'a' to add an entry.",
        ));
        return Text::from(lines);
    }

    lines.push(Line::from(Span::styled(
        format!(
            "  {:<7} {:<11}   {:<11} {:>10}  {}",
            "Date", "Start", "End", "Duration", "Note"
        ),
        Style::default()
            .fg(Theme::secondary())
            .add_modifier(Modifier::BOLD),
    )));

    for (index, session) in sessions.iter().enumerate() {
        let selected = index == app.selected_session_index;
        let running = session.is_running();
        let marker_style = if selected {
            Style::default().fg(Theme::selection_marker())
        } else {
            Style::default().fg(Theme::dim())
        };
        let line_style = if selected {
            Style::default()
                .fg(Theme::highlight())
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let end = match &session.end_time {
            Some(end) => format_time(end),
            None => "In progress".to_string(),
        };
        let duration_style = if running {
            Style::default()
                .fg(Theme::active())
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Theme::accent())
        };
        let moving = app
            .pending_move
            .as_ref()
            .is_some_and(|payload| payload.session_id == session.id);

        lines.push(Line::from(vec![
            Span::styled(if selected { "> " } else { "  " }, marker_style),
            Span::styled(
                format!(
                    "{:<7} {:<11} - {:<11} ",
                    format_date(&session.start_time),
                    format_time(&session.start_time),
                    end
                ),
                line_style,
            ),
            Span::styled(
                format!("{:>10}", format_duration(running_elapsed(session, &app.now))),
                duration_style,
            ),
            Span::raw("  "),
            Span::styled(clamp_name(&session.note, 32), Style::default().fg(Theme::text())),
            Span::styled(
                if moving { " [cut]" } else { "" },
                Style::default().fg(Theme::warn()),
            ),
        ]));
    }

    let total = if app.store.is_active(&project.id) {
        total_time(&project.sessions, &app.now)
    } else {
        project.total_time
    };
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("  Total: ", Style::default().fg(Theme::dim())),
        Span::styled(
            format_duration(total),
            Style::default()
                .fg(Theme::accent())
                .add_modifier(Modifier::BOLD),
        ),
    ]));
    Text::from(lines)
}
