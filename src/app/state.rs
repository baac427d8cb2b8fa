use chrono::{DateTime, Local};
use crossterm::event::KeyCode;

use punchcard::timeutil::{format_input, parse_instant};
use punchcard::{DragPayload, NewSession, Project, Session, SessionPatch, Store, StoreResult};

use super::{
    AppEvent, AppView, ConfirmAction, ConfirmPopup, EntryMode, EntryPopup, InputPopup,
    InputPurpose,
};

/// The top-level application state.
pub struct App {
    pub running: bool,
    pub store: Store,
    pub view: AppView,
    view_history: Vec<AppView>,
    pub selected_project_index: usize,
    pub selected_session_index: usize,
    pub status: Option<String>,
    /// Instant the elapsed-time displays are computed against.
    pub now: DateTime<Local>,
    pub input_popup: Option<InputPopup>,
    pub entry_popup: Option<EntryPopup>,
    pub confirm_popup: Option<ConfirmPopup>,
    pub pending_move: Option<DragPayload>,
}

impl App {
    pub fn new(mut store: Store) -> Self {
        let status = store.take_notice();
        let now = store.now();
        Self {
            running: true,
            store,
            view: AppView::Projects,
            view_history: Vec::new(),
            selected_project_index: 0,
            selected_session_index: 0,
            status,
            now,
            input_popup: None,
            entry_popup: None,
            confirm_popup: None,
            pending_move: None,
        }
    }

    /// Central update function - process an event and mutate state.
    pub fn update(&mut self, event: AppEvent) {
        match event {
            // The tick only moves the display clock; stored durations change on stop.
            AppEvent::Tick => {}
            AppEvent::KeyPress(key) => self.handle_key(key),
        }
        self.now = self.store.now();
    }

    pub fn selected_project(&self) -> Option<&Project> {
        self.store.projects().get(self.selected_project_index)
    }

    /// Sessions of the selected project, newest first.
    pub fn visible_sessions(&self) -> Vec<&Session> {
        let Some(project) = self.selected_project() else {
            return Vec::new();
        };
        let mut sessions: Vec<_> = project.sessions.iter().collect();
        sessions.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        sessions
    }

    pub fn selected_session(&self) -> Option<&Session> {
        self.visible_sessions()
            .get(self.selected_session_index)
            .copied()
    }

    fn handle_key(&mut self, key: KeyCode) {
        if self.confirm_popup.is_some() {
            self.handle_confirm_key(key);
            return;
        }
        if self.entry_popup.is_some() {
            self.handle_entry_key(key);
            return;
        }
        if self.input_popup.is_some() {
            self.handle_input_key(key);
            return;
        }

        match key {
            KeyCode::Char('q') => self.running = false,
            KeyCode::Char('?') => {
                if self.view == AppView::Help {
                    self.go_back();
                } else {
                    self.navigate_to(AppView::Help);
                }
            }
            KeyCode::Esc => self.go_back(),
            KeyCode::Up => self.move_selection_up(),
            KeyCode::Down => self.move_selection_down(),
            _ => match self.view {
                AppView::Projects => self.handle_projects_key(key),
                AppView::Sessions => self.handle_sessions_key(key),
                AppView::Help => {}
            },
        }
    }

    fn handle_projects_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Enter => {
                if self.selected_project().is_some() {
                    self.selected_session_index = 0;
                    self.navigate_to(AppView::Sessions);
                }
            }
            KeyCode::Char(' ') => self.toggle_selected_project(),
            KeyCode::Char('s') => self.open_stop_popup(),
            KeyCode::Char('n') => {
                self.input_popup = Some(InputPopup::new(InputPurpose::NewProject, ""));
            }
            KeyCode::Char('r') => {
                if let Some(project) = self.selected_project() {
                    let popup = InputPopup::new(
                        InputPurpose::RenameProject(project.id.clone()),
                        project.name.clone(),
                    );
                    self.input_popup = Some(popup);
                }
            }
            KeyCode::Char('d') => {
                if let Some(project) = self.selected_project() {
                    self.confirm_popup = Some(ConfirmPopup {
                        message: format!("Delete project \"{}\" and all its sessions?", project.name),
                        action: ConfirmAction::DeleteProject(project.id.clone()),
                    });
                }
            }
            KeyCode::Char('v') => self.paste_session(),
            KeyCode::Char('C') => {
                self.confirm_popup = Some(ConfirmPopup {
                    message: "Clear every session of every project?".to_string(),
                    action: ConfirmAction::ClearSessions,
                });
            }
            KeyCode::Char('X') => {
                self.confirm_popup = Some(ConfirmPopup {
                    message: "Delete all projects?".to_string(),
                    action: ConfirmAction::ClearProjects,
                });
            }
            _ => {}
        }
    }

    fn handle_sessions_key(&mut self, key: KeyCode) {
        let Some(project_id) = self.selected_project().map(|p| p.id.clone()) else {
            return;
        };
        match key {
            KeyCode::Char(' ') => self.toggle_selected_session(&project_id),
            KeyCode::Char('s') => self.open_stop_popup(),
            KeyCode::Char('a') => {
                let now = self.store.now();
                self.entry_popup = Some(EntryPopup::new(
                    EntryMode::Add(project_id),
                    format_input(&now),
                    format_input(&now),
                    String::new(),
                ));
            }
            KeyCode::Char('e') => {
                if let Some(session) = self.selected_session() {
                    let popup = EntryPopup::new(
                        EntryMode::Edit(project_id, session.id.clone()),
                        format_input(&session.start_time),
                        session.end_time.as_ref().map(format_input).unwrap_or_default(),
                        session.note.clone(),
                    );
                    self.entry_popup = Some(popup);
                }
            }
            KeyCode::Char('n') => {
                if let Some(session) = self.selected_session() {
                    let popup = InputPopup::new(
                        InputPurpose::EditNote(project_id, session.id.clone()),
                        session.note.clone(),
                    );
                    self.input_popup = Some(popup);
                }
            }
            KeyCode::Char('d') => {
                if let Some(session) = self.selected_session() {
                    self.confirm_popup = Some(ConfirmPopup {
                        message: "Are you sure you want to delete this time session?".to_string(),
                        action: ConfirmAction::DeleteSession(project_id, session.id.clone()),
                    });
                }
            }
            KeyCode::Char('x') => {
                if let Some(session) = self.selected_session() {
                    self.pending_move = Some(DragPayload {
                        session_id: session.id.clone(),
                        source_project_id: project_id,
                    });
                    self.status =
                        Some("Session picked up. Press v on another project to drop it.".to_string());
                }
            }
            KeyCode::Char('v') => self.paste_session(),
            _ => {}
        }
    }

    fn handle_confirm_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                let Some(popup) = self.confirm_popup.take() else {
                    return;
                };
                match popup.action {
                    ConfirmAction::DeleteProject(id) => {
                        let result = self.store.delete_project(&id);
                        self.report(result, "Project deleted");
                    }
                    ConfirmAction::DeleteSession(project_id, session_id) => {
                        let result = self.store.delete_session(&project_id, &session_id);
                        self.report(result, "Session deleted");
                    }
                    ConfirmAction::ClearSessions => {
                        let result = self.store.clear_all_sessions();
                        self.report(result, "All sessions cleared");
                    }
                    ConfirmAction::ClearProjects => {
                        let result = self.store.clear_all_projects();
                        self.report(result, "All projects cleared");
                    }
                }
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.confirm_popup = None;
                self.clear_status();
            }
            _ => {}
        }
    }

    fn handle_input_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                self.input_popup = None;
                self.clear_status();
            }
            KeyCode::Enter => self.apply_input_popup(),
            _ => {
                if let Some(popup) = self.input_popup.as_mut() {
                    popup.edit(key);
                }
            }
        }
    }

    fn handle_entry_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                self.entry_popup = None;
                self.clear_status();
            }
            KeyCode::Enter => self.apply_entry_popup(),
            KeyCode::Tab => {
                if let Some(popup) = self.entry_popup.as_mut() {
                    popup.next_field();
                }
            }
            _ => {
                if let Some(popup) = self.entry_popup.as_mut() {
                    popup.edit(key);
                }
            }
        }
    }

    fn apply_input_popup(&mut self) {
        let Some(popup) = self.input_popup.take() else {
            return;
        };
        let result = match &popup.purpose {
            InputPurpose::NewProject => {
                let name = popup.value.trim().to_string();
                self.store
                    .add_project(&popup.value)
                    .map(|_| format!("Added project: {name}"))
            }
            InputPurpose::RenameProject(id) => self
                .store
                .rename_project(id, &popup.value)
                .map(|_| "Project renamed".to_string()),
            InputPurpose::StopWithNote(id) => self
                .store
                .stop_session(id, Some(&popup.value))
                .map(|_| "Timer stopped".to_string()),
            InputPurpose::EditNote(project_id, session_id) => self
                .store
                .update_session_note(project_id, session_id, &popup.value)
                .map(|_| "Note saved".to_string()),
        };
        match result {
            Ok(message) => {
                self.status = Some(message);
                self.clamp_selection();
            }
            Err(err) => {
                log::warn!("input rejected: {err}");
                self.status = Some(err.to_string());
                self.input_popup = Some(popup);
            }
        }
    }

    fn apply_entry_popup(&mut self) {
        let Some(popup) = self.entry_popup.take() else {
            return;
        };
        // An edit only moves the times the user actually changed.
        let editing = matches!(popup.mode, EntryMode::Edit(..));
        let start_time = if editing && !popup.start_edited() {
            None
        } else {
            match parse_instant(&popup.start) {
                Some(start) => Some(start),
                None => {
                    self.status = Some("Start must look like YYYY-MM-DD HH:MM:SS.".to_string());
                    self.entry_popup = Some(popup);
                    return;
                }
            }
        };
        let end_time = if (editing && !popup.end_edited()) || popup.end.trim().is_empty() {
            None
        } else {
            match parse_instant(&popup.end) {
                Some(end) => Some(end),
                None => {
                    self.status = Some("End must look like YYYY-MM-DD HH:MM:SS.".to_string());
                    self.entry_popup = Some(popup);
                    return;
                }
            }
        };

        let result = match popup.mode.clone() {
            EntryMode::Add(project_id) => {
                let (Some(start_time), Some(end_time)) = (start_time, end_time) else {
                    self.status = Some("End time is required.".to_string());
                    self.entry_popup = Some(popup);
                    return;
                };
                let entry = NewSession {
                    start_time,
                    end_time,
                    note: popup.note.clone(),
                };
                self.store
                    .add_session(&project_id, entry)
                    .map(|_| "Entry added".to_string())
            }
            EntryMode::Edit(project_id, session_id) => {
                let patch = SessionPatch {
                    start_time,
                    end_time,
                    note: Some(popup.note.clone()),
                };
                self.store
                    .update_session(&project_id, &session_id, patch)
                    .map(|_| "Session updated".to_string())
            }
        };
        match result {
            Ok(message) => {
                self.status = Some(message);
                self.clamp_selection();
            }
            Err(err) => {
                log::warn!("entry rejected: {err}");
                self.status = Some(err.to_string());
                self.entry_popup = Some(popup);
            }
        }
    }

    fn toggle_selected_project(&mut self) {
        let Some(id) = self.selected_project().map(|p| p.id.clone()) else {
            self.status = Some("No project selected.".to_string());
            return;
        };
        if self.store.is_active(&id) {
            let result = self.store.stop_session(&id, None);
            self.report(result, "Timer stopped");
        } else {
            let result = self.store.start_session(&id);
            self.report(result, "Timer started");
        }
    }

    fn toggle_selected_session(&mut self, project_id: &str) {
        let Some(session) = self.selected_session() else {
            self.status = Some("No session selected.".to_string());
            return;
        };
        if session.is_running() {
            let result = self.store.stop_session(project_id, None);
            self.report(result, "Timer stopped");
        } else {
            let session_id = session.id.clone();
            let result = self.store.resume_session(project_id, &session_id);
            self.report(result, "Session resumed");
            self.selected_session_index = 0;
        }
    }

    fn open_stop_popup(&mut self) {
        match self.store.running() {
            Some((project, session)) => {
                let popup = InputPopup::new(
                    InputPurpose::StopWithNote(project.id.clone()),
                    session.note.clone(),
                );
                self.input_popup = Some(popup);
            }
            None => self.status = Some("No timer running.".to_string()),
        }
    }

    fn paste_session(&mut self) {
        let Some(payload) = self.pending_move.take() else {
            self.status = Some("Nothing picked up. Press x on a session first.".to_string());
            return;
        };
        let Some(target) = self.selected_project().map(|p| p.id.clone()) else {
            self.pending_move = Some(payload);
            return;
        };
        if payload.source_project_id == target {
            self.status = Some("Session is already in this project, nothing moved.".to_string());
            return;
        }
        let result = self.store.drop_payload(&payload, &target);
        self.report(result, "Session moved");
    }

    fn report<T>(&mut self, result: StoreResult<T>, success: &str) {
        match result {
            Ok(_) => self.status = Some(success.to_string()),
            Err(err) => {
                log::warn!("operation rejected: {err}");
                self.status = Some(err.to_string());
            }
        }
        self.clamp_selection();
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    fn navigate_to(&mut self, view: AppView) {
        if self.view != view {
            self.view_history.push(self.view.clone());
            self.view = view;
            self.clear_status();
        }
    }

    fn go_back(&mut self) {
        if let Some(prev_view) = self.view_history.pop() {
            self.view = prev_view;
        }
        self.clear_status();
    }

    fn clamp_selection(&mut self) {
        let projects = self.store.projects().len();
        if self.selected_project_index >= projects {
            self.selected_project_index = projects.saturating_sub(1);
        }
        let sessions = self.visible_sessions().len();
        if self.selected_session_index >= sessions {
            self.selected_session_index = sessions.saturating_sub(1);
        }
    }

    fn move_selection_up(&mut self) {
        let len = self.selection_len();
        if len == 0 {
            return;
        }
        if let Some(index) = self.selection_mut() {
            *index = if *index == 0 { len - 1 } else { *index - 1 };
        }
    }

    fn move_selection_down(&mut self) {
        let len = self.selection_len();
        if len == 0 {
            return;
        }
        if let Some(index) = self.selection_mut() {
            *index = (*index + 1) % len;
        }
    }

    fn selection_len(&self) -> usize {
        match self.view {
            AppView::Projects => self.store.projects().len(),
            AppView::Sessions => self.visible_sessions().len(),
            AppView::Help => 0,
        }
    }

    fn selection_mut(&mut self) -> Option<&mut usize> {
        match self.view {
            AppView::Projects => Some(&mut self.selected_project_index),
            AppView::Sessions => Some(&mut self.selected_session_index),
            AppView::Help => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use punchcard::ManualClock;
    use punchcard::db::MemorySlot;

    fn app() -> (App, ManualClock) {
        let clock = ManualClock::new(Local.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap());
        let store = Store::open(Box::new(MemorySlot::default()), Box::new(clock.clone())).unwrap();
        (App::new(store), clock)
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            app.update(AppEvent::KeyPress(KeyCode::Char(ch)));
        }
    }

    fn press(app: &mut App, key: KeyCode) {
        app.update(AppEvent::KeyPress(key));
    }

    #[test]
    fn creating_and_timing_a_project() {
        let (mut app, clock) = app();
        press(&mut app, KeyCode::Char('n'));
        type_text(&mut app, "Writing");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.store.projects()[0].name, "Writing");

        press(&mut app, KeyCode::Char(' '));
        clock.advance(Duration::seconds(65));
        app.update(AppEvent::Tick);
        assert_eq!(app.now, clock_now(&clock));
        press(&mut app, KeyCode::Char(' '));
        assert_eq!(app.store.projects()[0].total_time, 65_000);
    }

    #[test]
    fn empty_project_name_keeps_the_popup_open() {
        let (mut app, _) = app();
        press(&mut app, KeyCode::Char('n'));
        type_text(&mut app, "   ");
        press(&mut app, KeyCode::Enter);
        assert!(app.input_popup.is_some());
        assert_eq!(app.status.as_deref(), Some("Project name cannot be empty"));
        assert!(app.store.projects().is_empty());
    }

    #[test]
    fn invalid_manual_entry_is_blocked() {
        let (mut app, _) = app();
        app.store.add_project("A").unwrap();
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.view, AppView::Sessions);
        press(&mut app, KeyCode::Char('a'));
        let popup = app.entry_popup.as_mut().unwrap();
        popup.start = "2024-05-01 17:00:00".into();
        popup.end = "2024-05-01 09:00:00".into();
        press(&mut app, KeyCode::Enter);
        assert!(app.entry_popup.is_some());
        assert_eq!(app.status.as_deref(), Some("End time must be after start time"));

        let popup = app.entry_popup.as_mut().unwrap();
        popup.start = "2024-05-01 08:00:00".into();
        press(&mut app, KeyCode::Enter);
        assert!(app.entry_popup.is_none());
        assert_eq!(app.store.projects()[0].total_time, 3_600_000);
    }

    #[test]
    fn cut_and_paste_moves_a_session() {
        let (mut app, clock) = app();
        let a = app.store.add_project("A").unwrap();
        app.store.add_project("B").unwrap();
        app.store.start_session(&a).unwrap();
        clock.advance(Duration::seconds(4));
        app.store.stop_session(&a, None).unwrap();

        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('x'));
        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Char('v'));
        assert!(app.store.projects()[0].sessions.is_empty());
        assert_eq!(app.store.projects()[1].total_time, 4_000);
        assert!(app.pending_move.is_none());
    }

    #[test]
    fn deleting_requires_confirmation() {
        let (mut app, _) = app();
        app.store.add_project("A").unwrap();
        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.store.projects().len(), 1);
        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('y'));
        assert!(app.store.projects().is_empty());
        assert_eq!(app.view, AppView::Projects);
        assert_eq!(app.status.as_deref(), Some("Project deleted"));
    }

    #[test]
    fn editing_only_the_note_keeps_the_times() {
        let (mut app, clock) = app();
        let a = app.store.add_project("A").unwrap();
        clock.advance(Duration::milliseconds(500));
        app.store.start_session(&a).unwrap();
        clock.advance(Duration::milliseconds(65_200));
        app.store.stop_session(&a, None).unwrap();
        clock.advance(Duration::seconds(1));
        app.store.start_session(&a).unwrap();
        clock.advance(Duration::milliseconds(700));
        app.store.stop_session(&a, None).unwrap();
        let before = app.store.projects()[0].clone();

        press(&mut app, KeyCode::Enter);
        for index in 0..2 {
            app.selected_session_index = index;
            press(&mut app, KeyCode::Char('e'));
            press(&mut app, KeyCode::Tab);
            press(&mut app, KeyCode::Tab);
            type_text(&mut app, "x");
            press(&mut app, KeyCode::Enter);
            assert!(app.entry_popup.is_none(), "{:?}", app.status);
        }

        let after = &app.store.projects()[0];
        assert_eq!(after.total_time, before.total_time);
        assert_eq!(after.total_time, 65_900);
        for (old, new) in before.sessions.iter().zip(&after.sessions) {
            assert_eq!(new.start_time, old.start_time);
            assert_eq!(new.end_time, old.end_time);
            assert_eq!(new.duration, old.duration);
            assert_eq!(new.note, "x");
        }
    }

    #[test]
    fn editing_the_start_moves_only_the_start() {
        let (mut app, clock) = app();
        let a = app.store.add_project("A").unwrap();
        app.store.start_session(&a).unwrap();
        clock.advance(Duration::seconds(60));
        app.store.stop_session(&a, None).unwrap();

        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('e'));
        app.entry_popup.as_mut().unwrap().start = "2024-05-01 08:59:00".into();
        press(&mut app, KeyCode::Enter);
        assert!(app.entry_popup.is_none());
        assert_eq!(app.store.projects()[0].total_time, 120_000);
    }

    #[test]
    fn dropping_onto_the_same_project_reports_no_move() {
        let (mut app, clock) = app();
        let a = app.store.add_project("A").unwrap();
        app.store.start_session(&a).unwrap();
        clock.advance(Duration::seconds(4));
        app.store.stop_session(&a, None).unwrap();

        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('x'));
        press(&mut app, KeyCode::Char('v'));
        assert_eq!(
            app.status.as_deref(),
            Some("Session is already in this project, nothing moved.")
        );
        assert!(app.pending_move.is_none());
        assert_eq!(app.store.projects()[0].sessions.len(), 1);
    }

    fn clock_now(clock: &ManualClock) -> DateTime<Local> {
        use punchcard::Clock;
        clock.now()
    }
}
