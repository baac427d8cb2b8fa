use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span, Text},
};

use punchcard::timeutil::{format_duration, total_time};

use super::helpers::{clamp_name, project_color};
use super::theme::Theme;
use crate::app::App;

pub fn build_projects_text(app: &App) -> Text<'_> {
    let mut lines = Vec::new();
    let projects = app.store.projects();

    if projects.is_empty() {
        lines.push(Line::from("No projects yet. Press 'n' to create one."));
        return Text::from(lines);
    }

    lines.push(Line::from(Span::styled(
        format!("    {:<24} {:>10} {:>8}", "Project", "Total", "Sessions"),
        Style::default()
            .fg(Theme::secondary())
            .add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(Span::styled(
        format!(
            "    {:<24} {:>10} {:>8}",
            "------------------------", "----------", "--------"
        ),
        Style::default().fg(Theme::dim()),
    )));

    let project_lines = projects
        .iter()
        .enumerate()
        .map(|(index, project)| {
            let selected = index == app.selected_project_index;
            let active = app.store.is_active(&project.id);
            // The stored total only moves on stop, so the running one is recomputed per frame.
            let total = if active {
                total_time(&project.sessions, &app.now)
            } else {
                project.total_time
            };
            let name_style = if selected {
                Style::default()
                    .fg(Theme::highlight())
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let marker_style = if selected {
                Style::default().fg(Theme::selection_marker())
            } else {
                Style::default().fg(Theme::dim())
            };
            let total_style = if active {
                Style::default()
                    .fg(Theme::active())
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Theme::accent())
            };
            Line::from(vec![
                Span::styled(if selected { "> " } else { "  " }, marker_style),
                Span::styled("■ ", Style::default().fg(project_color(&project.color))),
                Span::styled(clamp_name(project.name.as_str(), 24), name_style),
                Span::raw(" "),
                Span::styled(format!("{:>10}", format_duration(total)), total_style),
                Span::raw(" "),
                Span::styled(
                    format!("{:>8}", project.sessions.len()),
                    Style::default().fg(Theme::dim()),
                ),
                Span::styled(
                    if active { "  ● running" } else { "" },
                    Style::default().fg(Theme::active()),
                ),
            ])
        })
        .collect::<Vec<_>>();
    lines.extend(project_lines);
    Text::from(lines)
}

pub fn build_sessions_title(app: &App) -> String {
    match app.selected_project() {
        Some(project) => format!(" {} ", project.name),
        None => " Sessions ".to_string(),
    }
}
