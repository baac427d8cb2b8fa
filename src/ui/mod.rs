mod help;
mod helpers;
mod projects;
mod sessions;
mod theme;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    prelude::Alignment,
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
};

use punchcard::timeutil::{format_duration, running_elapsed};

use crate::app::{App, AppView, ConfirmPopup, EntryField, EntryMode, EntryPopup, InputPopup};
use helpers::project_color;
use theme::Theme;

/// Renders the entire UI for a single frame.
pub fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let (title, body_text) = match app.view {
        AppView::Projects => (" Projects ".to_string(), projects::build_projects_text(app)),
        AppView::Sessions => (
            projects::build_sessions_title(app),
            sessions::build_sessions_text(app),
        ),
        AppView::Help => (" Help ".to_string(), help::build_help_text()),
    };

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(3),
        ])
        .split(area);

    let header_lines = vec![Line::from(vec![
        Span::styled(
            "  Punchcard  ",
            Style::default().fg(Color::Black).bg(Theme::primary()),
        ),
        Span::raw(" "),
        Span::styled(
            "project time tracker",
            Style::default()
                .fg(Theme::secondary())
                .add_modifier(Modifier::BOLD),
        ),
    ])];
    let header = Paragraph::new(Text::from(header_lines))
        .alignment(Alignment::Left)
        .block(rounded_block());
    frame.render_widget(header, layout[0]);

    let mut body_lines = vec![
        Line::from(Span::styled(
            format!("  {title}"),
            Style::default()
                .fg(Theme::accent())
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    body_lines.extend(body_text.lines);
    body_lines.push(Line::from(""));
    if let Some(status) = &app.status {
        body_lines.push(Line::from(Span::styled(
            format!("  {status}"),
            Style::default().fg(Theme::warn()),
        )));
    }
    body_lines.push(Line::from(Span::styled(
        "----------------------------------------",
        Style::default().fg(Theme::dim()),
    )));
    body_lines.extend(keybinds_lines(app));
    let body = Paragraph::new(Text::from(body_lines))
        .style(Style::default().fg(Theme::text()))
        .alignment(Alignment::Left)
        .block(rounded_block());
    frame.render_widget(body, layout[1]);

    let footer = Paragraph::new(Text::from(running_line(app)))
        .alignment(Alignment::Left)
        .block(rounded_block());
    frame.render_widget(footer, layout[2]);

    if let Some(popup) = &app.input_popup {
        render_input_popup(frame, popup);
    }
    if let Some(popup) = &app.entry_popup {
        render_entry_popup(frame, popup);
    }
    if let Some(popup) = &app.confirm_popup {
        render_confirm_popup(frame, popup);
    }
}

fn rounded_block() -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .style(Style::default().fg(Theme::secondary()))
}

fn render_input_popup(frame: &mut Frame, popup: &InputPopup) {
    let area = centered_rect(60, 30, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled(format!("{}: ", popup.label()), Style::default().fg(Theme::dim())),
            Span::styled(
                popup.value.as_str(),
                Style::default()
                    .fg(Theme::highlight())
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled("_", Style::default().fg(Theme::highlight())),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "Type to edit. Enter: save. Esc: cancel.",
            Style::default().fg(Theme::dim()),
        )),
    ];

    let widget = Paragraph::new(Text::from(lines))
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: false })
        .block(rounded_block().title(popup.title()));
    frame.render_widget(widget, area);
}

fn render_entry_popup(frame: &mut Frame, popup: &EntryPopup) {
    let area = centered_rect(70, 45, frame.area());
    frame.render_widget(Clear, area);

    let title = match popup.mode {
        EntryMode::Add(_) => " Manual Entry ",
        EntryMode::Edit(..) => " Edit Session ",
    };
    let field_line = |label: &'static str, value: &str, field: EntryField| {
        let active = popup.field == field;
        let arrow_style = Style::default()
            .fg(Theme::selection_marker())
            .add_modifier(Modifier::BOLD);
        let (title_style, value_style) = if active {
            let style = Style::default()
                .fg(Theme::highlight())
                .add_modifier(Modifier::BOLD);
            (style, style)
        } else {
            (Style::default().fg(Theme::dim()), Style::default().fg(Theme::text()))
        };
        Line::from(vec![
            Span::styled(if active { "> " } else { "  " }, arrow_style),
            Span::styled(label, title_style),
            Span::styled(value.to_string(), value_style),
        ])
    };

    let end_hint = match popup.mode {
        EntryMode::Edit(..) if popup.end.is_empty() => "  (running)",
        _ => "",
    };
    let mut end_line = field_line("End:   ", &popup.end, EntryField::End);
    end_line.spans.push(Span::styled(end_hint, Style::default().fg(Theme::active())));

    let lines = vec![
        Line::from(""),
        field_line("Start: ", &popup.start, EntryField::Start),
        end_line,
        field_line("Note:  ", &popup.note, EntryField::Note),
        Line::from(""),
        Line::from(Span::styled(
            "Times as YYYY-MM-DD HH:MM:SS. Tab: switch field. Enter: save. Esc: cancel.",
            Style::default().fg(Theme::dim()),
        )),
    ];

    let widget = Paragraph::new(Text::from(lines))
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: false })
        .block(rounded_block().title(title));
    frame.render_widget(widget, area);
}

fn render_confirm_popup(frame: &mut Frame, popup: &ConfirmPopup) {
    let area = centered_rect(60, 30, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(Span::styled(
            "Confirm Action",
            Style::default()
                .fg(Theme::accent())
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            popup.message.as_str(),
            Style::default().fg(Theme::text()),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("Press ", Style::default().fg(Theme::dim())),
            Span::styled("Y", Style::default().fg(Theme::highlight()).add_modifier(Modifier::BOLD)),
            Span::styled(" to confirm or ", Style::default().fg(Theme::dim())),
            Span::styled("N", Style::default().fg(Theme::highlight()).add_modifier(Modifier::BOLD)),
            Span::styled("/", Style::default().fg(Theme::dim())),
            Span::styled("ESC", Style::default().fg(Theme::highlight()).add_modifier(Modifier::BOLD)),
            Span::styled(" to cancel", Style::default().fg(Theme::dim())),
        ]),
    ];

    let widget = Paragraph::new(Text::from(lines))
        .alignment(Alignment::Center)
        .block(rounded_block().title(" Confirm "));
    frame.render_widget(widget, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn running_line(app: &App) -> Line<'_> {
    let Some((project, session)) = app.store.running() else {
        return Line::from(Span::styled(
            "● No timer running",
            Style::default().fg(Theme::dim()),
        ));
    };

    let elapsed = format_duration(running_elapsed(session, &app.now));
    // Spinner advances once per second
    let animation_chars = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
    let anim_index = app.now.timestamp().rem_euclid(animation_chars.len() as i64) as usize;

    let mut spans = vec![
        Span::styled(
            format!("{} ", animation_chars[anim_index]),
            Style::default()
                .fg(Theme::active())
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("{} > ", project.name),
            Style::default()
                .fg(project_color(&project.color))
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("Running {elapsed}"),
            Style::default()
                .fg(Theme::active())
                .add_modifier(Modifier::BOLD),
        ),
    ];
    if !session.note.is_empty() {
        spans.push(Span::styled(
            format!("  {}", session.note),
            Style::default().fg(Theme::dim()),
        ));
    }
    Line::from(spans)
}

fn keybinds_lines(app: &App) -> Vec<Line<'static>> {
    let (primary, secondary) = match app.view {
        AppView::Projects => (
            "Up/Down: Select  Enter: Sessions  space: Start/Stop  s: Stop with note",
            "n: New  r: Rename  d: Delete  v: Drop  C/X: Clear  ?: Help  q: Quit",
        ),
        AppView::Sessions => (
            "Up/Down: Select  space: Stop/Resume  a: Add entry  e: Edit  n: Note",
            "d: Delete  x: Cut  v: Drop  esc: Back  ?: Help  q: Quit",
        ),
        AppView::Help => ("Press ? or ESC to close this help screen", ""),
    };
    vec![
        Line::from(Span::styled(primary, Style::default().fg(Theme::dim()))),
        Line::from(Span::styled(secondary, Style::default().fg(Theme::dim()))),
    ]
}
