/// Popup state: single-line inputs, the time-entry form, and confirmations.
use crossterm::event::KeyCode;

use punchcard::{ProjectId, SessionId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputPurpose {
    NewProject,
    RenameProject(ProjectId),
    StopWithNote(ProjectId),
    EditNote(ProjectId, SessionId),
}

#[derive(Clone, Debug)]
pub struct InputPopup {
    pub purpose: InputPurpose,
    pub value: String,
}

impl InputPopup {
    pub fn new(purpose: InputPurpose, value: impl Into<String>) -> Self {
        Self {
            purpose,
            value: value.into(),
        }
    }

    pub fn title(&self) -> &'static str {
        match self.purpose {
            InputPurpose::NewProject => " New Project ",
            InputPurpose::RenameProject(_) => " Rename Project ",
            InputPurpose::StopWithNote(_) => " Stop Timer ",
            InputPurpose::EditNote(..) => " Session Note ",
        }
    }

    pub fn label(&self) -> &'static str {
        match self.purpose {
            InputPurpose::NewProject | InputPurpose::RenameProject(_) => "Name",
            InputPurpose::StopWithNote(_) | InputPurpose::EditNote(..) => "Note",
        }
    }

    pub fn edit(&mut self, key: KeyCode) {
        edit_text(&mut self.value, key);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryField {
    Start,
    End,
    Note,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntryMode {
    Add(ProjectId),
    Edit(ProjectId, SessionId),
}

/// Start/end/note form for manual entries and for editing a session.
#[derive(Clone, Debug)]
pub struct EntryPopup {
    pub mode: EntryMode,
    pub start: String,
    pub end: String,
    pub note: String,
    pub field: EntryField,
    opened_start: String,
    opened_end: String,
}

impl EntryPopup {
    pub fn new(mode: EntryMode, start: String, end: String, note: String) -> Self {
        Self {
            mode,
            opened_start: start.clone(),
            opened_end: end.clone(),
            start,
            end,
            note,
            field: EntryField::Start,
        }
    }

    /// Whether the start text differs from what the form opened with.
    pub fn start_edited(&self) -> bool {
        self.start != self.opened_start
    }

    pub fn end_edited(&self) -> bool {
        self.end != self.opened_end
    }

    pub fn next_field(&mut self) {
        self.field = match self.field {
            EntryField::Start => EntryField::End,
            EntryField::End => EntryField::Note,
            EntryField::Note => EntryField::Start,
        };
    }

    pub fn edit(&mut self, key: KeyCode) {
        let value = match self.field {
            EntryField::Start => &mut self.start,
            EntryField::End => &mut self.end,
            EntryField::Note => &mut self.note,
        };
        edit_text(value, key);
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfirmAction {
    DeleteProject(ProjectId),
    DeleteSession(ProjectId, SessionId),
    ClearSessions,
    ClearProjects,
}

#[derive(Clone, Debug)]
pub struct ConfirmPopup {
    pub message: String,
    pub action: ConfirmAction,
}

fn edit_text(value: &mut String, key: KeyCode) {
    match key {
        KeyCode::Backspace | KeyCode::Delete => {
            value.pop();
        }
        KeyCode::Char(ch) if !ch.is_control() => value.push(ch),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_fields_cycle_and_edit_independently() {
        let mut popup = EntryPopup::new(
            EntryMode::Add("1".into()),
            String::new(),
            String::new(),
            String::new(),
        );
        popup.edit(KeyCode::Char('9'));
        popup.next_field();
        popup.edit(KeyCode::Char('5'));
        popup.edit(KeyCode::Char('6'));
        popup.edit(KeyCode::Backspace);
        popup.next_field();
        popup.edit(KeyCode::Char('x'));
        popup.next_field();
        assert_eq!(popup.field, EntryField::Start);
        assert_eq!((popup.start.as_str(), popup.end.as_str(), popup.note.as_str()), ("9", "5", "x"));
        assert!(popup.start_edited() && popup.end_edited());
    }

    #[test]
    fn untouched_times_are_not_edited() {
        let mut popup = EntryPopup::new(
            EntryMode::Edit("1".into(), "2".into()),
            "2024-05-01 09:00:00".into(),
            String::new(),
            String::new(),
        );
        popup.edit(KeyCode::Backspace);
        popup.edit(KeyCode::Char('0'));
        assert!(!popup.start_edited());
        assert!(!popup.end_edited());
    }
}
