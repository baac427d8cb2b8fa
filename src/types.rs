use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

pub type ProjectId = String;
pub type SessionId = String;

/// One contiguous (or still open) interval of tracked time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: SessionId,
    pub project_id: ProjectId,
    #[serde(with = "crate::persist::instant")]
    pub start_time: DateTime<Local>,
    #[serde(with = "crate::persist::optional_instant", default)]
    pub end_time: Option<DateTime<Local>>,
    #[serde(default)]
    pub note: String,
    /// Milliseconds, set once the session has an end.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
}

impl Session {
    pub fn is_running(&self) -> bool {
        self.end_time.is_none()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub color: String,
    /// Insertion order, not time order.
    #[serde(default)]
    pub sessions: Vec<Session>,
    /// Cached sum of session durations in milliseconds.
    #[serde(default)]
    pub total_time: i64,
}

impl Project {
    pub fn session(&self, session_id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == session_id)
    }

    pub fn running_session(&self) -> Option<&Session> {
        self.sessions.iter().find(|s| s.is_running())
    }
}

/// A manually entered, already finished session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewSession {
    pub start_time: DateTime<Local>,
    pub end_time: DateTime<Local>,
    pub note: String,
}

/// Field edits for an existing session. `None` leaves a field untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionPatch {
    pub start_time: Option<DateTime<Local>>,
    pub end_time: Option<DateTime<Local>>,
    pub note: Option<String>,
}

/// What a drop target receives when a session is dragged onto it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DragPayload {
    pub session_id: SessionId,
    pub source_project_id: ProjectId,
}

impl DragPayload {
    /// Malformed payloads are logged and dropped.
    pub fn parse(raw: &str) -> Option<Self> {
        match serde_json::from_str(raw) {
            Ok(payload) => Some(payload),
            Err(err) => {
                log::warn!("ignoring malformed drag payload: {err}");
                None
            }
        }
    }

    pub fn to_json(&self) -> String {
        // Two plain string fields cannot fail to serialize.
        serde_json::to_string(self).unwrap_or_default()
    }
}
